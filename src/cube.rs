use crate::error::{Error, Result};
use crate::grid::GridAxes;
use ndarray::Array3;
use std::path::Path;

/// A labeled 3-D data cube: the gridded variable in (time, latitude,
/// longitude) order together with its axis sequences.
pub struct Cube {
    pub axes: GridAxes,
    values: Array3<f64>,
}

impl Cube {
    /// Read `var` from the NetCDF file at `path` and label it with `axes`.
    ///
    /// The raw variable is laid out (longitude, latitude, time); it is
    /// permuted to (time, latitude, longitude) here. The dimensions are
    /// checked against the axis lengths before anything is read, so a
    /// truncated or mislabeled source file fails up front rather than
    /// mid-load.
    pub fn open<P: AsRef<Path>>(path: P, var: &str, axes: GridAxes) -> Result<Cube> {
        let file = netcdf::open(path)?;
        let variable = file.variable(var).ok_or(Error::VariableNotFound {
            var: var.to_string(),
        })?;

        let found: Vec<usize> = variable.dimensions().iter().map(|d| d.len()).collect();
        let expected = [axes.lon.len(), axes.lat.len(), axes.time.len()];
        if found != expected {
            return Err(Error::GridShapeMismatch {
                var: var.to_string(),
                expected,
                found,
            });
        }

        let flat: Vec<f64> = variable.get_values(netcdf::Extents::All)?;
        let raw = Array3::from_shape_vec((expected[0], expected[1], expected[2]), flat)?;
        let values = raw.permuted_axes([2, 1, 0]);

        Ok(Cube { axes, values })
    }

    /// Value at (time index, latitude index, longitude index).
    pub fn value(&self, time: usize, lat: usize, lon: usize) -> f64 {
        self.values[(time, lat, lon)]
    }
}
