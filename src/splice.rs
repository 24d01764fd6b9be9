//! Splicing seasonal observations into a copy of a gridded time series
//!
//! The splice builds a new NetCDF file modelled on a template: every global
//! attribute, dimension and variable is copied, except that the target
//! variable has a sub-region overwritten by the observations. The work runs
//! in four phases:
//!
//! 1. structural clone of everything but the target,
//! 2. coordinate indexing from the uniform latitude/longitude axes,
//! 3. patching the target's full data block in memory,
//! 4. committing the patched block in a single write.
//!
//! Any failure in phase 3 aborts before the target is created, so a failed
//! splice leaves a valid file that simply lacks the target variable.

use crate::audit::{write_audit_csv, TouchedCells};
use crate::errors::{GridSpliceError, Result};
use crate::grid::GridAxis;
use crate::netcdf_io::{
    clone_structure, dimension_names, is_float_variable, write_float_block, CloneSummary,
};
use crate::observations::ObservationTable;
use crate::season::{Season, MONTHS_PER_SEASON};
use crate::time_axis::time_index_for_date;
use crate::utils::prepare_output_path;
use chrono::NaiveDate;
use log::{info, warn};
use ndarray::{ArrayD, IxDyn};
use netcdf::{File, Variable};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Audit file written next to the output unless another path is configured
pub const AUDIT_FILE_NAME: &str = "results.csv";

/// Where the time cursor starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeAnchor {
    /// A known index of the template's time axis
    Index(usize),
    /// A calendar date resolved against the template's time axis
    Date(NaiveDate),
}

impl TimeAnchor {
    /// 31 December 2000, the start of the EObs splice window
    pub const DEFAULT_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2000, 12, 31) {
        Some(date) => date,
        None => panic!("invalid default anchor date"),
    };
}

impl Default for TimeAnchor {
    fn default() -> Self {
        Self::Date(Self::DEFAULT_DATE)
    }
}

/// Inputs of a splice run
#[derive(Debug, Clone)]
pub struct SpliceConfig {
    pub template: PathBuf,
    pub output: PathBuf,
    /// Variable to patch
    pub variable: String,
    pub latitude_var: String,
    pub longitude_var: String,
    pub time_var: String,
    pub anchor: TimeAnchor,
    /// Replace an existing output
    pub overwrite: bool,
    /// Where to write the touched-cell audit; `None` turns it off
    pub audit_csv: Option<PathBuf>,
    /// Refuse observations not ordered by latitude, longitude and date
    pub require_sorted: bool,
    pub progress_interval: Duration,
}

impl SpliceConfig {
    /// Configuration with the default anchor and the audit file beside the output
    pub fn new(template: impl Into<PathBuf>, output: impl Into<PathBuf>, variable: &str) -> Self {
        let output = output.into();
        let audit_csv = output.with_file_name(AUDIT_FILE_NAME);
        Self {
            template: template.into(),
            output,
            variable: variable.to_string(),
            latitude_var: "latitude".to_string(),
            longitude_var: "longitude".to_string(),
            time_var: "time".to_string(),
            anchor: TimeAnchor::default(),
            overwrite: false,
            audit_csv: Some(audit_csv),
            require_sorted: false,
            progress_interval: Duration::from_millis(3500),
        }
    }

    pub fn with_anchor(mut self, anchor: TimeAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_audit_csv(mut self, path: impl Into<PathBuf>) -> Self {
        self.audit_csv = Some(path.into());
        self
    }

    pub fn without_audit(mut self) -> Self {
        self.audit_csv = None;
        self
    }

    pub fn with_require_sorted(mut self, require_sorted: bool) -> Self {
        self.require_sorted = require_sorted;
        self
    }
}

/// Positions of the time, latitude and longitude axes in the target block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    pub time: usize,
    pub lat: usize,
    pub lon: usize,
}

impl BlockLayout {
    /// Layout for a block declared as `(time, latitude, longitude)`
    pub const TIME_LAT_LON: Self = Self {
        time: 0,
        lat: 1,
        lon: 2,
    };

    fn resolve(file: &File, target: &Variable, config: &SpliceConfig) -> Result<Self> {
        let target_dims = dimension_names(target);
        let unsupported = |reason: String| GridSpliceError::UnsupportedVariable {
            var: config.variable.clone(),
            reason,
        };
        if target_dims.len() != 3 {
            return Err(unsupported(format!(
                "expected 3 dimensions (time, latitude, longitude), found [{}]",
                target_dims.join(", ")
            )));
        }

        let position = |coord_var: &str| -> Result<usize> {
            let var = file
                .variable(coord_var)
                .ok_or_else(|| GridSpliceError::VariableNotFound {
                    var: coord_var.to_string(),
                })?;
            let dim = dimension_names(&var)
                .into_iter()
                .next()
                .ok_or_else(|| GridSpliceError::InvalidGrid {
                    message: format!("coordinate variable '{}' has no dimension", coord_var),
                })?;
            target_dims.iter().position(|d| *d == dim).ok_or_else(|| {
                unsupported(format!("not indexed by the '{}' dimension", dim))
            })
        };

        Ok(Self {
            time: position(&config.time_var)?,
            lat: position(&config.latitude_var)?,
            lon: position(&config.longitude_var)?,
        })
    }

    fn shape_of(&self, block: &ArrayD<f64>) -> [usize; 3] {
        let shape = block.shape();
        [shape[self.time], shape[self.lat], shape[self.lon]]
    }
}

/// Index bounds of the patch, as `(first, last)` per axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchBounds {
    pub lat: (i64, i64),
    pub lon: (i64, i64),
}

/// Result of patching a block in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub spliced: usize,
    pub skipped_missing: usize,
    pub start_index: usize,
    pub end_index: usize,
    pub touched: TouchedCells,
}

/// Overwrite `block` at the cells addressed by `observations`.
///
/// The time cursor starts at `start_index` and moves forward by one season
/// (three steps) whenever the season code differs from the previous usable
/// record's, however many seasons apart the two codes are. The first
/// validation or range failure stops the walk and is returned; the caller
/// must then discard `block`.
pub fn patch_block(
    block: &mut ArrayD<f64>,
    layout: BlockLayout,
    lats: &GridAxis,
    lons: &GridAxis,
    observations: &ObservationTable,
    start_index: usize,
    progress_interval: Duration,
) -> Result<PatchOutcome> {
    let shape = layout.shape_of(block);
    let num_recs = observations.len();
    let mut cursor = start_index;
    let mut last_season = observations.records.first().map(|r| r.season);
    let mut touched = TouchedCells::new();
    let mut spliced = 0;
    let mut skipped_missing = 0;
    let mut index = vec![0usize; block.ndim()];
    let mut last_report = Instant::now();

    for (ic, record) in observations.records.iter().enumerate() {
        let Some(value) = record.usable_value() else {
            skipped_missing += 1;
            continue;
        };

        let season = Season::from_code(record.season).ok_or(GridSpliceError::InvalidSeason {
            record: ic,
            season: record.season,
        })?;

        if last_season != Some(record.season) {
            cursor += MONTHS_PER_SEASON;
            last_season = Some(record.season);
        }

        let month = record.month();
        let sub_index = season
            .month_offset(month)
            .ok_or(GridSpliceError::MonthOutsideSeason {
                record: ic,
                month,
                season: record.season,
            })?;

        let time_index = cursor + sub_index;
        let (Some(lat_index), Some(lon_index)) =
            (lats.index(record.latitude), lons.index(record.longitude))
        else {
            return Err(GridSpliceError::NonFiniteCoordinate {
                record: ic,
                latitude: record.latitude,
                longitude: record.longitude,
            });
        };

        let in_range = time_index < shape[0]
            && (0..shape[1] as i64).contains(&lat_index)
            && (0..shape[2] as i64).contains(&lon_index);
        if !in_range {
            return Err(GridSpliceError::IndexOutOfRange {
                record: ic,
                index: [time_index as i64, lat_index, lon_index],
                shape,
            });
        }

        index[layout.time] = time_index;
        index[layout.lat] = lat_index as usize;
        index[layout.lon] = lon_index as usize;
        block[IxDyn(&index)] = value;
        spliced += 1;
        touched.insert(lat_index as usize, lon_index as usize);

        if last_report.elapsed() > progress_interval {
            info!(
                "have spliced {} values, number remaining: {}",
                spliced,
                num_recs - ic - 1
            );
            last_report = Instant::now();
        }
    }

    Ok(PatchOutcome {
        spliced,
        skipped_missing,
        start_index,
        end_index: cursor,
        touched,
    })
}

/// What a successful splice produced
#[derive(Debug, Clone)]
pub struct SpliceReport {
    pub output: PathBuf,
    pub variable: String,
    pub records: usize,
    pub spliced: usize,
    pub skipped_missing: usize,
    pub start_index: usize,
    pub end_index: usize,
    pub bounds: Option<PatchBounds>,
    pub touched_cells: Vec<(usize, usize)>,
    pub cloned: CloneSummary,
    pub audit_written: bool,
}

fn patch_bounds(
    observations: &ObservationTable,
    lats: &GridAxis,
    lons: &GridAxis,
) -> Option<PatchBounds> {
    let (lat_min, lat_max, lon_min, lon_max) = observations.extent()?;
    Some(PatchBounds {
        lat: (lats.index(lat_min)?, lats.index(lat_max)?),
        lon: (lons.index(lon_min)?, lons.index(lon_max)?),
    })
}

/// Build `config.output` from `config.template` with the observations spliced
/// into `config.variable`.
///
/// # Errors
///
/// Setup problems (missing template or variable, unusable axes, unresolvable
/// anchor, output conflicts) fail before anything is written. Validation and
/// range failures during patching return [`GridSpliceError::PatchAborted`];
/// the output then exists with every variable except the target.
pub fn splice(config: &SpliceConfig, observations: &ObservationTable) -> Result<SpliceReport> {
    if !config.template.is_file() {
        return Err(GridSpliceError::TemplateNotFound {
            path: config.template.clone(),
        });
    }

    info!("Opening the {} input NetCDF file {}", config.variable, config.template.display());
    let template = netcdf::open(&config.template)?;

    let target = template
        .variable(&config.variable)
        .ok_or_else(|| GridSpliceError::VariableNotFound {
            var: config.variable.clone(),
        })?;
    if !is_float_variable(&target) {
        return Err(GridSpliceError::UnsupportedVariable {
            var: config.variable.clone(),
            reason: format!("type {:?} is not a float type", target.vartype()),
        });
    }
    let layout = BlockLayout::resolve(&template, &target, config)?;

    // Coordinates are copied verbatim, so the template's axes are the output's
    let lats = GridAxis::from_variable(&template, &config.latitude_var)?;
    let lons = GridAxis::from_variable(&template, &config.longitude_var)?;

    let start_index = match config.anchor {
        TimeAnchor::Index(index) => index,
        TimeAnchor::Date(date) => time_index_for_date(&template, &config.time_var, date)?,
    };
    info!("Time cursor starts at index {}", start_index);

    if config.require_sorted {
        if let Some(record) = observations.first_unsorted() {
            return Err(GridSpliceError::UnsortedObservations { record });
        }
    }

    prepare_output_path(&config.output, config.overwrite)?;

    info!("Creating the {} output NetCDF file {}", config.variable, config.output.display());
    let mut output = netcdf::create(&config.output)?;
    let cloned = clone_structure(&template, &mut output, &config.variable)?;
    info!(
        "Copied {} attributes, {} dimensions and {} variables",
        cloned.attributes,
        cloned.dimensions,
        cloned.variables.len()
    );

    let bounds = patch_bounds(observations, &lats, &lons);
    if let Some(b) = bounds {
        info!(
            "Will replace patch with lat indices: {} {}\tlong indices: {} {}",
            b.lat.0, b.lat.1, b.lon.0, b.lon.1
        );
    }

    let shape: Vec<usize> = target.dimensions().iter().map(|d| d.len()).collect();
    let values = target.get_values::<f64, _>(..)?;
    let mut block = ArrayD::from_shape_vec(IxDyn(&shape), values)?;

    let outcome = match patch_block(
        &mut block,
        layout,
        &lats,
        &lons,
        observations,
        start_index,
        config.progress_interval,
    ) {
        Ok(outcome) => outcome,
        Err(reason) => {
            warn!(
                "Splice of {} aborted, {} left without it: {}",
                config.variable,
                config.output.display(),
                reason
            );
            return Err(GridSpliceError::PatchAborted {
                output: config.output.clone(),
                reason: Box::new(reason),
            });
        }
    };

    write_float_block(&mut output, &target, &block)?;
    info!(
        "Copied variable {} to {} having spliced {} values from {} records",
        config.variable,
        config.output.display(),
        outcome.spliced,
        observations.len()
    );
    info!(
        "start and end time indices: {} {}",
        outcome.start_index, outcome.end_index
    );
    if outcome.skipped_missing > 0 {
        info!("Skipped {} records with missing values", outcome.skipped_missing);
    }

    // Output closes (and flushes) before the template
    drop(output);
    drop(target);
    drop(template);

    let cells = outcome.touched.into_cells();
    let audit_written = match &config.audit_csv {
        Some(path) => match write_audit_csv(path, &cells, &lats, &lons) {
            Ok(()) => {
                info!("Wrote {} lat/long pairs to {}", cells.len(), path.display());
                true
            }
            Err(e) => {
                warn!("Could not write audit file {}: {}", path.display(), e);
                false
            }
        },
        None => false,
    };

    Ok(SpliceReport {
        output: config.output.clone(),
        variable: config.variable.clone(),
        records: observations.len(),
        spliced: outcome.spliced,
        skipped_missing: outcome.skipped_missing,
        start_index: outcome.start_index,
        end_index: outcome.end_index,
        bounds,
        touched_cells: cells,
        cloned,
        audit_written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observations::ObservationRecord;
    use ndarray::Array3;

    fn record(season: i64, lat: f64, lon: f64, date: (i32, u32, u32), value: Option<f64>) -> ObservationRecord {
        ObservationRecord {
            season,
            latitude: lat,
            longitude: lon,
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            value,
            secondary: 0.0,
        }
    }

    fn axes() -> (GridAxis, GridAxis) {
        (
            GridAxis::from_coordinates("latitude", &[10.0, 10.5, 11.0]).unwrap(),
            GridAxis::from_coordinates("longitude", &[20.0, 20.5]).unwrap(),
        )
    }

    fn block(times: usize) -> ArrayD<f64> {
        Array3::<f64>::zeros((times, 3, 2)).into_dyn()
    }

    fn run(block: &mut ArrayD<f64>, records: Vec<ObservationRecord>, start: usize) -> Result<PatchOutcome> {
        let (lats, lons) = axes();
        patch_block(
            block,
            BlockLayout::TIME_LAT_LON,
            &lats,
            &lons,
            &ObservationTable::new(records),
            start,
            Duration::from_secs(60),
        )
    }

    #[test]
    fn default_anchor_is_end_of_2000() {
        assert_eq!(
            TimeAnchor::default(),
            TimeAnchor::Date(NaiveDate::from_ymd_opt(2000, 12, 31).unwrap())
        );
    }

    #[test]
    fn audit_file_defaults_beside_output() {
        let config = SpliceConfig::new("eobs/tg.nc", "out/Europe_Tg.nc", "tg");
        assert_eq!(config.audit_csv, Some(PathBuf::from("out/results.csv")));
        let config = config.with_audit_csv("/tmp/touched.csv");
        assert_eq!(config.audit_csv, Some(PathBuf::from("/tmp/touched.csv")));
        assert_eq!(config.without_audit().audit_csv, None);
        assert_eq!(
            SpliceConfig::new("tg.nc", "out.nc", "tg").audit_csv,
            Some(PathBuf::from(AUDIT_FILE_NAME))
        );
    }

    #[test]
    fn same_season_keeps_cursor() {
        let mut data = block(12);
        let outcome = run(
            &mut data,
            vec![
                record(1, 10.5, 20.0, (2000, 12, 1), Some(1.0)),
                record(1, 10.5, 20.0, (2001, 1, 1), Some(2.0)),
            ],
            4,
        )
        .unwrap();
        assert_eq!(outcome.end_index, 4);
        assert_eq!(data[[4, 1, 0]], 1.0);
        assert_eq!(data[[5, 1, 0]], 2.0);
        assert_eq!(outcome.touched.cells(), &[(1, 0)]);
    }

    #[test]
    fn season_jump_still_advances_by_three() {
        let mut data = block(12);
        let outcome = run(
            &mut data,
            vec![
                record(1, 10.0, 20.0, (2001, 2, 1), Some(1.0)),
                record(3, 10.0, 20.0, (2001, 6, 1), Some(3.0)),
            ],
            0,
        )
        .unwrap();
        assert_eq!(outcome.end_index, 3);
        assert_eq!(data[[2, 0, 0]], 1.0);
        assert_eq!(data[[3, 0, 0]], 3.0);
    }

    #[test]
    fn missing_values_are_skipped() {
        let mut data = block(12);
        let outcome = run(
            &mut data,
            vec![
                record(1, 10.0, 20.0, (2000, 12, 1), None),
                record(1, 10.0, 20.0, (2001, 1, 1), Some(f64::NAN)),
            ],
            0,
        )
        .unwrap();
        assert_eq!(outcome.skipped_missing, 2);
        assert_eq!(outcome.spliced, 0);
        assert!(outcome.touched.is_empty());
        assert!(data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn validation_failures_stop_the_walk() {
        let mut data = block(12);
        let err = run(&mut data, vec![record(7, 10.0, 20.0, (2001, 1, 1), Some(1.0))], 0).unwrap_err();
        assert!(matches!(err, GridSpliceError::InvalidSeason { record: 0, season: 7 }));

        let err = run(&mut data, vec![record(2, 10.0, 20.0, (2001, 1, 1), Some(1.0))], 0).unwrap_err();
        assert!(matches!(err, GridSpliceError::MonthOutsideSeason { month: 1, season: 2, .. }));

        let err = run(&mut data, vec![record(1, 12.0, 20.0, (2001, 1, 1), Some(1.0))], 0).unwrap_err();
        assert!(matches!(err, GridSpliceError::IndexOutOfRange { index: [1, 4, 0], .. }));

        let err = run(&mut data, vec![record(1, 10.0, 20.0, (2001, 1, 1), Some(1.0))], 11).unwrap_err();
        assert!(matches!(err, GridSpliceError::IndexOutOfRange { .. }));
    }

    #[test]
    fn nan_coordinates_are_not_placed() {
        let mut data = block(12);
        let err = run(
            &mut data,
            vec![
                record(1, 10.0, 20.0, (2000, 12, 1), Some(1.0)),
                record(1, f64::NAN, 20.0, (2001, 1, 1), Some(2.0)),
            ],
            0,
        )
        .unwrap_err();
        assert!(matches!(err, GridSpliceError::NonFiniteCoordinate { record: 1, .. }));
        assert_eq!(err.category(), crate::errors::ErrorCategory::IndexOutOfRange);
        // cell 0 of the first record's month 1 must stay untouched
        assert_eq!(data[[1, 0, 0]], 0.0);

        let err = run(&mut data, vec![record(1, 10.0, f64::INFINITY, (2001, 1, 1), Some(1.0))], 0).unwrap_err();
        assert!(matches!(err, GridSpliceError::NonFiniteCoordinate { record: 0, .. }));
    }

    #[test]
    fn cursor_advances_once_per_transition() {
        let mut data = block(24);
        let mut records = Vec::new();
        for (season, months) in [(1, [12, 1, 2]), (2, [3, 4, 5]), (3, [6, 7, 8]), (4, [9, 10, 11])] {
            for month in months {
                records.push(record(season, 11.0, 20.5, (2001, month, 1), Some(month as f64)));
            }
        }
        let outcome = run(&mut data, records, 0).unwrap();
        assert_eq!(outcome.end_index, 9);
        assert_eq!(outcome.spliced, 12);
        // season 1 occupies 0..3, season 2 3..6, and so on
        assert_eq!(data[[0, 2, 1]], 12.0);
        assert_eq!(data[[3, 2, 1]], 3.0);
        assert_eq!(data[[11, 2, 1]], 11.0);
    }
}
