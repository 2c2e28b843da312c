use crate::error::{Error, Result};
use std::path::Path;

/// Map longitude on [0,360) to [-180,180), required for mongo indexing.
pub fn tidylon(longitude: f64) -> f64 {
    if longitude < 180.0 {
        longitude
    } else {
        longitude - 360.0
    }
}

/// Read-only handle on the basin mask reference grid (`BASIN_TAG` in
/// basinmask_01.nc): half-degree cell centers, latitude -77.5..77.5,
/// longitude -179.5..179.5.
pub struct BasinMask {
    file: netcdf::File,
}

const MASK_VAR: &str = "BASIN_TAG";
const MASK_MIN_LAT: f64 = -77.5;
const MASK_MIN_LON: f64 = -179.5;

impl BasinMask {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<BasinMask> {
        let file = netcdf::open(path)?;
        if file.variable(MASK_VAR).is_none() {
            return Err(Error::VariableNotFound {
                var: MASK_VAR.to_string(),
            });
        }
        Ok(BasinMask { file })
    }

    /// Basin tag at the mask cell nearest to (longitude, latitude).
    /// Longitude must already be normalized to [-180,180).
    pub fn lookup(&self, longitude: f64, latitude: f64) -> Result<i32> {
        let lonplus = (longitude - 0.5).ceil() + 0.5;
        let lonminus = (longitude - 0.5).floor() + 0.5;
        let latplus = (latitude - 0.5).ceil() + 0.5;
        let latminus = (latitude - 0.5).floor() + 0.5;

        let lonplus_idx = (lonplus - MASK_MIN_LON) as usize;
        let lonminus_idx = (lonminus - MASK_MIN_LON) as usize;
        let latplus_idx = (latplus - MASK_MIN_LAT) as usize;
        let latminus_idx = (latminus - MASK_MIN_LAT) as usize;

        let corners_idx = [
            // bottom left corner, clockwise
            [latminus_idx, lonminus_idx],
            [latplus_idx, lonminus_idx],
            [latplus_idx, lonplus_idx],
            [latminus_idx, lonplus_idx],
        ];

        let distances = [
            (f64::powi(longitude - lonminus, 2) + f64::powi(latitude - latminus, 2)).sqrt(),
            (f64::powi(longitude - lonminus, 2) + f64::powi(latitude - latplus, 2)).sqrt(),
            (f64::powi(longitude - lonplus, 2) + f64::powi(latitude - latplus, 2)).sqrt(),
            (f64::powi(longitude - lonplus, 2) + f64::powi(latitude - latminus, 2)).sqrt(),
        ];

        let mut closecorner_idx = corners_idx[0];
        let mut closedist = distances[0];
        for i in 1..4 {
            if distances[i] < closedist {
                closecorner_idx = corners_idx[i];
                closedist = distances[i];
            }
        }

        let variable = self.file.variable(MASK_VAR).ok_or(Error::VariableNotFound {
            var: MASK_VAR.to_string(),
        })?;
        let tag = variable.get_value::<i64, _>(closecorner_idx)?;
        Ok(tag as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tidylon_maps_into_half_open_range() {
        assert_eq!(tidylon(20.5), 20.5);
        assert_eq!(tidylon(179.5), 179.5);
        assert_eq!(tidylon(180.0), -180.0);
        assert_eq!(tidylon(200.5), -159.5);
        assert_eq!(tidylon(379.5), 19.5);
        for i in 0..360 {
            let raw = 20.5 + i as f64;
            let tidied = tidylon(raw);
            assert!((-180.0..180.0).contains(&tidied), "raw {raw} -> {tidied}");
        }
    }
}
