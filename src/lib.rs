//! grid_splice: splicing weather observations into NetCDF climate grids
//!
//! A Rust library and command-line tool for preparing agronomic and climate
//! simulation inputs. Its centre is the grid splice: a new NetCDF file is
//! built from a template grid (such as an EObs monthly series) with a
//! rectangular sub-region of one variable overwritten by seasonal
//! observations, while every other variable is copied unchanged.
//!
//! ## Key Features
//!
//! - **Grid Splicing**: Copy-then-patch of one variable with all-or-nothing commit
//! - **Coordinate Indexing**: Uniform latitude/longitude axes mapped to grid indices
//! - **Time Anchors**: Calendar dates resolved against CF `units` of the time axis
//! - **Observation Tables**: Typed loading and filtering of observation CSVs
//! - **Simulation Inputs**: Country code tables and empty summary result grids
//!
//! ## Module Organization
//!
//! - [`splice`]: The four-phase splice and in-memory patching
//! - [`netcdf_io`]: Structural cloning of NetCDF files
//! - [`grid`]: Uniform coordinate axes
//! - [`time_axis`]: Calendar dates on CF time axes
//! - [`season`]: Season codes and their months
//! - [`observations`]: Observation CSV loading
//! - [`audit`]: Touched-cell bookkeeping
//! - [`prepare`]: Filtering raw observation workbooks
//! - [`eobs`]: Observation file to EObs template conversion
//! - [`codes`]: Country code extraction from run manifests
//! - [`summary_grid`]: Empty summary grids for simulation results
//! - [`metadata`]: Template inspection
//! - [`settings`]: JSON settings file
//! - [`errors`]: Centralized error handling
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use grid_splice::prelude::*;
//! use std::path::Path;
//!
//! let observations = ObservationTable::from_csv_path(Path::new("Europe_Tg.csv")).unwrap();
//! let config = SpliceConfig::new("tg_0.25deg_reg_v17.0Monthly.nc", "Europe_Tg.nc", "tg")
//!     .with_overwrite(true);
//! let report = splice(&config, &observations).unwrap();
//! println!("spliced {} values", report.spliced);
//! ```

pub mod audit;
pub mod cli;
pub mod codes;
pub mod eobs;
pub mod errors;
pub mod grid;
pub mod metadata;
pub mod netcdf_io;
pub mod observations;
pub mod prepare;
pub mod season;
pub mod settings;
pub mod splice;
pub mod summary_grid;
pub mod time_axis;

mod utils;

pub use errors::{ErrorCategory, GridSpliceError, Result};
pub use splice::{splice, SpliceConfig, SpliceReport, TimeAnchor};

// High-level convenience API
pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::errors::{ErrorCategory, GridSpliceError, Result};
    pub use crate::grid::GridAxis;
    pub use crate::observations::{ObservationRecord, ObservationTable};
    pub use crate::season::Season;
    pub use crate::splice::{splice, SpliceConfig, SpliceReport, TimeAnchor};
}
