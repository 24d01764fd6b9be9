//! Centralized error handling for grid_splice
//!
//! Every fallible operation in the crate returns [`Result`], whose error type
//! groups failures into the categories an operator cares about: bad setup,
//! bad observation data, patch indices falling off the grid, and plain I/O.

use std::fmt;
use std::path::PathBuf;

/// Broad classification of a [`GridSpliceError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing inputs, unusable template, output path conflicts
    Configuration,
    /// Observation records that cannot be placed on the grid
    DataValidation,
    /// A computed time/lat/lon index outside the target block
    IndexOutOfRange,
    /// Underlying file, NetCDF or CSV failures
    Io,
}

/// Main error type for grid_splice operations
#[derive(Debug)]
pub enum GridSpliceError {
    /// NetCDF file operation errors
    NetCDFError(netcdf::Error),

    /// I/O operation errors
    IoError(std::io::Error),

    /// CSV read/write errors
    CsvError(csv::Error),

    /// Settings file could not be parsed
    SettingsError(serde_json::Error),

    /// Array shape or dimension error
    ArrayError(ndarray::ShapeError),

    /// Template grid file does not exist
    TemplateNotFound { path: PathBuf },

    /// Variable not found in NetCDF file
    VariableNotFound { var: String },

    /// Variable exists but cannot be copied or patched
    UnsupportedVariable { var: String, reason: String },

    /// Coordinate axis is unusable for index arithmetic
    InvalidGrid { message: String },

    /// Anchor date has no matching entry in the time axis
    AnchorNotFound { message: String },

    /// Output path exists and overwriting was not requested
    OutputExists { path: PathBuf },

    /// Existing output could not be removed
    DeleteFailed { path: PathBuf, source: std::io::Error },

    /// A row of an input table could not be parsed
    InvalidRecord { line: usize, message: String },

    /// Observation rows are not ordered by latitude, longitude and date
    UnsortedObservations { record: usize },

    /// Season code outside 1..=4
    InvalidSeason { record: usize, season: i64 },

    /// Month does not belong to the record's season
    MonthOutsideSeason {
        record: usize,
        month: u32,
        season: i64,
    },

    /// Computed grid index falls outside the target block
    IndexOutOfRange {
        record: usize,
        index: [i64; 3],
        shape: [usize; 3],
    },

    /// Record coordinates are NaN or infinite and map to no cell
    NonFiniteCoordinate {
        record: usize,
        latitude: f64,
        longitude: f64,
    },

    /// Observation workbook could not be read
    SpreadsheetError(calamine::Error),

    /// Observation file name does not identify a known metric
    UnknownMetric { name: String },

    /// Patch phase failed; the output holds every variable except the target
    PatchAborted {
        output: PathBuf,
        reason: Box<GridSpliceError>,
    },

    /// Generic error for everything else
    Generic(String),
}

impl GridSpliceError {
    /// Classify the error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NetCDFError(_)
            | Self::IoError(_)
            | Self::CsvError(_)
            | Self::ArrayError(_)
            | Self::SpreadsheetError(_) => ErrorCategory::Io,
            Self::InvalidRecord { .. }
            | Self::UnsortedObservations { .. }
            | Self::InvalidSeason { .. }
            | Self::MonthOutsideSeason { .. } => ErrorCategory::DataValidation,
            Self::IndexOutOfRange { .. } | Self::NonFiniteCoordinate { .. } => {
                ErrorCategory::IndexOutOfRange
            }
            Self::PatchAborted { reason, .. } => reason.category(),
            _ => ErrorCategory::Configuration,
        }
    }
}

impl fmt::Display for GridSpliceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetCDFError(e) => write!(f, "NetCDF error: {}", e),
            Self::IoError(e) => write!(f, "I/O error: {}", e),
            Self::CsvError(e) => write!(f, "CSV error: {}", e),
            Self::SettingsError(e) => write!(f, "Settings error: {}", e),
            Self::ArrayError(e) => write!(f, "Array error: {}", e),
            Self::TemplateNotFound { path } => {
                write!(f, "Template grid file '{}' does not exist", path.display())
            }
            Self::VariableNotFound { var } => write!(f, "Variable '{}' not found in file", var),
            Self::UnsupportedVariable { var, reason } => {
                write!(f, "Variable '{}' cannot be processed: {}", var, reason)
            }
            Self::InvalidGrid { message } => write!(f, "Invalid grid: {}", message),
            Self::AnchorNotFound { message } => write!(f, "Time anchor not found: {}", message),
            Self::OutputExists { path } => write!(
                f,
                "Output '{}' already exists and overwrite is not enabled",
                path.display()
            ),
            Self::DeleteFailed { path, source } => {
                write!(f, "Could not delete '{}': {}", path.display(), source)
            }
            Self::InvalidRecord { line, message } => {
                write!(f, "Invalid record on line {}: {}", line, message)
            }
            Self::UnsortedObservations { record } => write!(
                f,
                "Record {} is out of latitude/longitude/date order",
                record
            ),
            Self::InvalidSeason { record, season } => write!(
                f,
                "Season error in record {}: season {} is not one of 1, 2, 3, 4",
                record, season
            ),
            Self::MonthOutsideSeason {
                record,
                month,
                season,
            } => write!(
                f,
                "Month {} is not a valid month for season {} in record {}",
                month, season, record
            ),
            Self::IndexOutOfRange {
                record,
                index,
                shape,
            } => write!(
                f,
                "Record {} maps to [time={}, lat={}, lon={}] outside block of shape {:?}",
                record, index[0], index[1], index[2], shape
            ),
            Self::NonFiniteCoordinate {
                record,
                latitude,
                longitude,
            } => write!(
                f,
                "Record {} has coordinates ({}, {}) that map to no grid cell",
                record, latitude, longitude
            ),
            Self::SpreadsheetError(e) => write!(f, "Spreadsheet error: {}", e),
            Self::UnknownMetric { name } => write!(
                f,
                "Metric name '{}' not recognised - must be one of Tg, Precip",
                name
            ),
            Self::PatchAborted { output, reason } => write!(
                f,
                "Splice aborted, '{}' left without target variable: {}",
                output.display(),
                reason
            ),
            Self::Generic(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for GridSpliceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NetCDFError(e) => Some(e),
            Self::IoError(e) => Some(e),
            Self::CsvError(e) => Some(e),
            Self::SettingsError(e) => Some(e),
            Self::ArrayError(e) => Some(e),
            Self::SpreadsheetError(e) => Some(e),
            Self::DeleteFailed { source, .. } => Some(source),
            Self::PatchAborted { reason, .. } => Some(reason.as_ref()),
            _ => None,
        }
    }
}

impl From<netcdf::Error> for GridSpliceError {
    fn from(error: netcdf::Error) -> Self {
        GridSpliceError::NetCDFError(error)
    }
}

impl From<std::io::Error> for GridSpliceError {
    fn from(error: std::io::Error) -> Self {
        GridSpliceError::IoError(error)
    }
}

impl From<csv::Error> for GridSpliceError {
    fn from(error: csv::Error) -> Self {
        GridSpliceError::CsvError(error)
    }
}

impl From<serde_json::Error> for GridSpliceError {
    fn from(error: serde_json::Error) -> Self {
        GridSpliceError::SettingsError(error)
    }
}

impl From<ndarray::ShapeError> for GridSpliceError {
    fn from(error: ndarray::ShapeError) -> Self {
        GridSpliceError::ArrayError(error)
    }
}

impl From<calamine::Error> for GridSpliceError {
    fn from(error: calamine::Error) -> Self {
        GridSpliceError::SpreadsheetError(error)
    }
}

impl From<String> for GridSpliceError {
    fn from(error: String) -> Self {
        GridSpliceError::Generic(error)
    }
}

impl From<&str> for GridSpliceError {
    fn from(error: &str) -> Self {
        GridSpliceError::Generic(error.to_string())
    }
}

/// Result type alias for grid_splice operations
pub type Result<T> = std::result::Result<T, GridSpliceError>;
