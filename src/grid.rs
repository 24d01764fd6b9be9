//! Uniform coordinate axes and the value to grid-index mapping
//!
//! Latitude and longitude coordinate variables of the templates are regular:
//! strictly monotonic with a constant step. [`GridAxis`] captures the first
//! coordinate and the step, and maps any coordinate value onto an integer
//! cell index with `floor((value - origin) / resolution)`.

use crate::errors::{GridSpliceError, Result};
use netcdf::File;

/// Relative tolerance when checking that every step matches the first one
const UNIFORMITY_TOLERANCE: f64 = 1e-4;

/// Fraction of a step absorbed before flooring, so `origin + k * resolution`
/// lands on `k` despite float rounding.
const INDEX_TOLERANCE: f64 = 1e-6;

/// A regularly spaced coordinate axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridAxis {
    /// Value of the first coordinate
    pub origin: f64,
    /// Signed step between consecutive coordinates
    pub resolution: f64,
    /// Number of coordinates
    pub len: usize,
}

impl GridAxis {
    /// Build an axis from coordinate values, checking that they are uniform.
    pub fn from_coordinates(name: &str, coords: &[f64]) -> Result<Self> {
        if coords.len() < 2 {
            return Err(GridSpliceError::InvalidGrid {
                message: format!(
                    "axis '{}' needs at least two coordinates, found {}",
                    name,
                    coords.len()
                ),
            });
        }

        let resolution = coords[1] - coords[0];
        if resolution == 0.0 || !resolution.is_finite() {
            return Err(GridSpliceError::InvalidGrid {
                message: format!("axis '{}' has a zero or non-finite step", name),
            });
        }

        for (i, pair) in coords.windows(2).enumerate() {
            let step = pair[1] - pair[0];
            if ((step - resolution) / resolution).abs() > UNIFORMITY_TOLERANCE {
                return Err(GridSpliceError::InvalidGrid {
                    message: format!(
                        "axis '{}' is not uniform: step {} at position {} differs from {}",
                        name, step, i, resolution
                    ),
                });
            }
        }

        Ok(Self {
            origin: coords[0],
            resolution,
            len: coords.len(),
        })
    }

    /// Read a one-dimensional coordinate variable and build its axis
    pub fn from_variable(file: &File, var_name: &str) -> Result<Self> {
        let var = file
            .variable(var_name)
            .ok_or_else(|| GridSpliceError::VariableNotFound {
                var: var_name.to_string(),
            })?;
        if var.dimensions().len() != 1 {
            return Err(GridSpliceError::InvalidGrid {
                message: format!("coordinate variable '{}' must be one-dimensional", var_name),
            });
        }
        let coords = var.get_values::<f64, _>(..)?;
        Self::from_coordinates(var_name, &coords)
    }

    /// Grid index of `value`; may be negative or past the end of the axis.
    /// `None` for NaN or infinite values, which have no cell.
    pub fn index(&self, value: f64) -> Option<i64> {
        let position = ((value - self.origin) / self.resolution + INDEX_TOLERANCE).floor();
        position.is_finite().then_some(position as i64)
    }

    /// Coordinate value at `index`
    pub fn value_at(&self, index: usize) -> f64 {
        self.origin + index as f64 * self.resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_degree_latitudes() {
        let axis = GridAxis::from_coordinates("latitude", &[10.0, 10.5, 11.0]).unwrap();
        assert_eq!(axis.resolution, 0.5);
        assert_eq!(axis.index(10.5), Some(1));
        assert_eq!(axis.index(11.5), Some(3));
        assert_eq!(axis.index(9.9), Some(-1));
    }

    #[test]
    fn index_of_multiples_is_exact() {
        let coords: Vec<f64> = (0..500).map(|k| 25.05 + k as f64 * 0.1).collect();
        let axis = GridAxis::from_coordinates("latitude", &coords).unwrap();
        for k in 0..500 {
            assert_eq!(axis.index(axis.origin + k as f64 * axis.resolution), Some(k));
            assert_eq!(axis.index(coords[k as usize]), Some(k));
        }
    }

    #[test]
    fn values_inside_a_cell_floor_to_it() {
        let axis = GridAxis::from_coordinates("longitude", &[-10.0, -9.0, -8.0]).unwrap();
        assert_eq!(axis.index(-9.5), Some(0));
        assert_eq!(axis.index(-8.01), Some(1));
    }

    #[test]
    fn decreasing_axis() {
        let axis = GridAxis::from_coordinates("latitude", &[60.0, 59.5, 59.0, 58.5]).unwrap();
        assert_eq!(axis.resolution, -0.5);
        assert_eq!(axis.index(60.0), Some(0));
        assert_eq!(axis.index(58.5), Some(3));
        assert_eq!(axis.value_at(2), 59.0);
    }

    #[test]
    fn non_finite_values_have_no_index() {
        let axis = GridAxis::from_coordinates("latitude", &[10.0, 10.5, 11.0]).unwrap();
        assert_eq!(axis.index(f64::NAN), None);
        assert_eq!(axis.index(f64::INFINITY), None);
        assert_eq!(axis.index(f64::NEG_INFINITY), None);
    }

    #[test]
    fn rejects_irregular_axes() {
        assert!(GridAxis::from_coordinates("lat", &[1.0]).is_err());
        assert!(GridAxis::from_coordinates("lat", &[1.0, 1.0, 1.0]).is_err());
        let err = GridAxis::from_coordinates("lat", &[0.0, 1.0, 3.0]).unwrap_err();
        assert!(matches!(err, GridSpliceError::InvalidGrid { .. }));
    }
}
