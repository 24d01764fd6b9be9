//! Converting observation CSVs into EObs-modelled NetCDF files
//!
//! File naming carries the metadata: an observation file `<study>_Tg.csv`
//! holds mean temperatures and is spliced into the `tg` variable of the EObs
//! monthly template `tg*0Monthly.nc`, producing `<study>_Tg.nc` next to it.

use crate::errors::{GridSpliceError, Result};
use crate::observations::ObservationTable;
use crate::splice::{splice, SpliceConfig, SpliceReport, TimeAnchor};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// File-name suffixes and the EObs variables they map to
pub const METRICS: [(&str, &str); 2] = [("Tg", "tg"), ("Precip", "rr")];

/// Suffix of EObs monthly template file names
const TEMPLATE_SUFFIX: &str = "0Monthly.nc";

/// EObs variable for an observation file, from the last `_` token of its stem
pub fn metric_for_file(path: &Path) -> Result<&'static str> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let name = stem.rsplit('_').next().unwrap_or(stem);
    METRICS
        .iter()
        .find(|(suffix, _)| *suffix == name)
        .map(|(_, metric)| *metric)
        .ok_or_else(|| GridSpliceError::UnknownMetric {
            name: name.to_string(),
        })
}

/// First `<metric>*0Monthly.nc` file in `eobs_dir`, by name
pub fn find_template(eobs_dir: &Path, metric: &str) -> Result<PathBuf> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(eobs_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(metric) && n.ends_with(TEMPLATE_SUFFIX))
        })
        .collect();
    candidates.sort();
    candidates
        .into_iter()
        .next()
        .ok_or_else(|| GridSpliceError::TemplateNotFound {
            path: eobs_dir.join(format!("{}*{}", metric, TEMPLATE_SUFFIX)),
        })
}

/// NetCDF output path for an observation CSV
pub fn output_path_for(csv_path: &Path) -> PathBuf {
    csv_path.with_extension("nc")
}

/// Splice settings shared by conversions
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub anchor: TimeAnchor,
    /// Audit path; `None` keeps the default beside the output
    pub audit_csv: Option<PathBuf>,
    pub require_sorted: bool,
}

/// Read `csv_path`, locate its EObs template and splice into a new NetCDF file.
/// The output is always recreated.
pub fn convert_observations(
    csv_path: &Path,
    eobs_dir: &Path,
    options: &ConvertOptions,
) -> Result<SpliceReport> {
    if !csv_path.is_file() {
        return Err(GridSpliceError::Generic(format!(
            "Observation file {} does not exist",
            csv_path.display()
        )));
    }
    let metric = metric_for_file(csv_path)?;
    let template = find_template(eobs_dir, metric)?;

    info!("Reading csv file {}", csv_path.display());
    let observations = ObservationTable::from_csv_path(csv_path)?;

    let output = output_path_for(csv_path);
    info!("Creating {}...", output.display());

    let mut config = SpliceConfig::new(template, output, metric)
        .with_anchor(options.anchor)
        .with_overwrite(true)
        .with_require_sorted(options.require_sorted);
    if let Some(path) = &options.audit_csv {
        config = config.with_audit_csv(path);
    }
    splice(&config, &observations)
}
