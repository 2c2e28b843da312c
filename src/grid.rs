use chrono::{DateTime, TimeZone, Utc};

/// The fixed lattice a gridded product is sampled on: ordered longitude,
/// latitude and time sequences.
pub struct GridAxes {
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    pub time: Vec<DateTime<Utc>>,
}

impl GridAxes {
    /// The Kuusela-Giglio 2022 OHC lattice: one degree cells centered on the
    /// half degree, longitude 20.5..379.5, latitude -64.5..64.5, and 192
    /// monthly timestamps starting January 2005, stamped mid-month.
    pub fn kg21() -> GridAxes {
        let lon = (0..360).map(|i| 20.5 + i as f64).collect();
        let lat = (0..130).map(|j| -64.5 + j as f64).collect();
        let time = (0..192)
            .map(|k| {
                let year = 2005 + (k / 12) as i32;
                let month = (k % 12) as u32 + 1;
                Utc.with_ymd_and_hms(year, month, 15, 0, 0, 0).unwrap()
            })
            .collect();
        GridAxes { lon, lat, time }
    }

    /// Cube shape in (time, latitude, longitude) order.
    pub fn shape(&self) -> [usize; 3] {
        [self.time.len(), self.lat.len(), self.lon.len()]
    }
}
