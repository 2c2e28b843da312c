use crate::basin::tidylon;
use crate::grid::GridAxes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DATASET_ID: &str = "kg21_ohc15to300";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GeoJSONPoint {
    #[serde(rename = "type")]
    pub location_type: String,
    pub coordinates: [f64; 2],
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SourceDoc {
    pub source: Vec<String>,
    pub doi: String,
    pub url: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LatticeDoc {
    pub center: [f64; 2],
    pub spacing: [f64; 2],
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

/// One descriptive document per dataset, written once to the grid metadata
/// collection.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MetaDoc {
    pub _id: String,
    pub data_type: String,
    pub date_updated_argovis: bson::DateTime,
    pub source: Vec<SourceDoc>,
    pub levels: Vec<i32>,
    pub level_units: String,
    pub data_info: (Vec<String>, Vec<String>, Vec<Vec<String>>),
    pub lattice: LatticeDoc,
}

/// One document per populated lattice point. `data` holds one value list per
/// contributing dataset and stays index-aligned with `metadata`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PointDoc {
    pub _id: String,
    pub metadata: Vec<String>,
    pub geolocation: GeoJSONPoint,
    pub basin: i32,
    pub timestamp: bson::DateTime,
    pub data: Vec<Vec<f64>>,
}

/// Metadata record for the Kuusela-Giglio 2022 OHC product, lattice bounds
/// computed from the axis sequences.
pub fn kg21_metadata(axes: &GridAxes) -> MetaDoc {
    let tidied: Vec<f64> = axes.lon.iter().map(|&x| tidylon(x)).collect();
    let min_lon = tidied.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_lon = tidied.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min_lat = axes.lat.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_lat = axes.lat.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    MetaDoc {
        _id: DATASET_ID.to_string(),
        data_type: String::from("ocean_heat_content"),
        date_updated_argovis: bson::DateTime::now(),
        source: vec![SourceDoc {
            source: vec![String::from("Kuusela_Giglio2022")],
            doi: String::from("10.5281/zenodo.6131625"),
            url: String::from("https://doi.org/10.5281/zenodo.6131625"),
        }],
        levels: vec![15], // really anywhere from 15-300
        level_units: String::from("integral from 15 dbar to 300 dbar"),
        data_info: (
            vec![String::from(DATASET_ID)],
            vec![String::from("units")],
            vec![vec![String::from("J/m^2")]],
        ),
        lattice: LatticeDoc {
            center: [0.5, 0.5],
            spacing: [1.0, 1.0],
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        },
    }
}

/// Lattice point id: timestamp to the second, then normalized longitude and
/// latitude, underscore separated.
pub fn point_id(timestamp: &DateTime<Utc>, longitude: f64, latitude: f64) -> String {
    format!("{}_{}_{}", timestamp.format("%Y%m%d%H%M%S"), longitude, latitude)
}

/// Grid values keep at most 6 decimal places in the store.
pub fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

impl PointDoc {
    /// Single-dataset candidate record for one lattice point. `longitude`
    /// must already be normalized; `value` must be a real observation, NaN
    /// cells are skipped before a candidate is built.
    pub fn candidate(
        dataset_id: &str,
        timestamp: &DateTime<Utc>,
        longitude: f64,
        latitude: f64,
        basin: i32,
        value: f64,
    ) -> PointDoc {
        PointDoc {
            _id: point_id(timestamp, longitude, latitude),
            metadata: vec![dataset_id.to_string()],
            geolocation: GeoJSONPoint {
                location_type: String::from("Point"),
                coordinates: [longitude, latitude],
            },
            basin,
            timestamp: bson::DateTime::from_chrono(*timestamp),
            // grid data is packed as [[grid 1's levels], [grid 2's levels], ...]
            data: vec![vec![round6(value)]],
        }
    }
}
