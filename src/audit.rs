//! Touched-cell bookkeeping and the operator audit file

use crate::errors::Result;
use crate::grid::GridAxis;
use crate::utils::prepare_output_path;
use std::collections::HashSet;
use std::path::Path;

/// Distinct (lat_index, lon_index) cells, kept in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TouchedCells {
    order: Vec<(usize, usize)>,
    seen: HashSet<(usize, usize)>,
}

impl TouchedCells {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cell; returns false if it was already present
    pub fn insert(&mut self, lat_index: usize, lon_index: usize) -> bool {
        let cell = (lat_index, lon_index);
        if self.seen.insert(cell) {
            self.order.push(cell);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn cells(&self) -> &[(usize, usize)] {
        &self.order
    }

    pub fn into_cells(self) -> Vec<(usize, usize)> {
        self.order
    }
}

/// Write the coordinate values of touched cells as `latitude,longitude` rows.
/// Any previous file at `path` is replaced.
pub fn write_audit_csv(
    path: &Path,
    cells: &[(usize, usize)],
    lats: &GridAxis,
    lons: &GridAxis,
) -> Result<()> {
    prepare_output_path(path, true)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["latitude", "longitude"])?;
    for &(lat_index, lon_index) in cells {
        writer.write_record([
            lats.value_at(lat_index).to_string(),
            lons.value_at(lon_index).to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
