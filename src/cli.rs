//! Defines command-line interface options using `clap` for the grid_splice application.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// A CLI tool for preparing climate grids and simulation inputs
#[derive(Parser, Debug)]
#[command(
    version,
    name = "grid_splice",
    about = "Splice weather observations into NetCDF grids and prepare simulation inputs"
)]
pub struct Args {
    /// JSON settings file with directories and defaults
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, default_value_t = false, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Splice an observation CSV into a copy of a template grid
    Splice(SpliceArgs),

    /// Convert an observation CSV named <study>_<Tg|Precip>.csv using its EObs template
    Convert(ConvertArgs),

    /// Filter a raw observation workbook into the splice CSV schema
    Prepare(PrepareArgs),

    /// Extract a country,code table from a run manifest
    Codes(CodesArgs),

    /// Create an empty summary grid from a study manifest
    Summary(SummaryArgs),

    /// Describe the dimensions, variables and attributes of a grid file
    Inspect(InspectArgs),
}

#[derive(ClapArgs, Debug)]
pub struct SpliceArgs {
    /// Template NetCDF file
    #[arg(long)]
    pub template: PathBuf,

    /// Observation CSV (season, latitude, longitude, date, value, seasdif)
    #[arg(long)]
    pub observations: PathBuf,

    /// Output NetCDF file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Variable to patch
    #[arg(long)]
    pub variable: String,

    /// Date (dd/mm/yyyy) whose time index starts the splice
    #[arg(long, conflicts_with = "anchor_index")]
    pub anchor_date: Option<String>,

    /// Time index that starts the splice
    #[arg(long)]
    pub anchor_index: Option<usize>,

    /// Replace an existing output file
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,

    /// Write the touched latitude/longitude pairs here [default: results.csv beside the output]
    #[arg(long)]
    pub audit_csv: Option<PathBuf>,

    /// Reject observations not ordered by latitude, longitude and date
    #[arg(long, default_value_t = false)]
    pub check_sorted: bool,
}

#[derive(ClapArgs, Debug)]
pub struct ConvertArgs {
    /// Observation CSV, e.g. Europe_Tg.csv
    #[arg(long)]
    pub observations: PathBuf,

    /// Directory holding the EObs monthly templates
    #[arg(long)]
    pub eobs_dir: Option<PathBuf>,

    /// Write the touched latitude/longitude pairs here [default: results.csv beside the output]
    #[arg(long)]
    pub audit_csv: Option<PathBuf>,

    /// Reject observations not ordered by latitude, longitude and date
    #[arg(long, default_value_t = false)]
    pub check_sorted: bool,
}

#[derive(ClapArgs, Debug)]
pub struct PrepareArgs {
    /// Observation workbook or its CSV export
    /// (latitude, longitude, date, year, season, tg, seasdif)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Filtered observation CSV to create [default: <input stem>_filtered.csv]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Drop rows dated in this year or earlier
    #[arg(long)]
    pub cutoff_year: Option<i32>,

    /// Replace an existing output file
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}

#[derive(ClapArgs, Debug)]
pub struct CodesArgs {
    /// Run manifest CSV
    #[arg(long)]
    pub run_file: PathBuf,

    /// Country codes CSV to create
    #[arg(short, long)]
    pub output: PathBuf,

    /// Country to leave out; may be repeated
    #[arg(long = "exclude")]
    pub excluded: Vec<String>,
}

#[derive(ClapArgs, Debug)]
pub struct SummaryArgs {
    /// Tab-separated study manifest
    #[arg(long)]
    pub manifest: PathBuf,

    /// Summary NetCDF file to create
    #[arg(short, long)]
    pub output: PathBuf,

    #[arg(long)]
    pub start_year: i32,

    #[arg(long)]
    pub end_year: i32,

    /// Summary metric to create; may be repeated
    #[arg(long = "metric", required = true)]
    pub metrics: Vec<String>,

    /// Future climate scenario recorded in the global attributes
    #[arg(long, default_value = "CRU")]
    pub scenario: String,

    /// Land use change recorded in the global attributes
    #[arg(long, default_value = "none")]
    pub land_use: String,
}

#[derive(ClapArgs, Debug)]
pub struct InspectArgs {
    /// Path to the NetCDF file
    #[arg(short, long)]
    pub file: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splice_arguments() {
        let args = Args::try_parse_from([
            "grid_splice",
            "splice",
            "--template",
            "tg.nc",
            "--observations",
            "obs.csv",
            "-o",
            "out.nc",
            "--variable",
            "tg",
            "--anchor-index",
            "611",
            "--overwrite",
        ])
        .unwrap();
        match args.command {
            Command::Splice(s) => {
                assert_eq!(s.variable, "tg");
                assert_eq!(s.anchor_index, Some(611));
                assert!(s.overwrite);
                assert!(!s.check_sorted);
            }
            other => panic!("Expected splice, got {:?}", other),
        }
    }

    #[test]
    fn prepare_output_is_optional() {
        let args = Args::try_parse_from(["grid_splice", "prepare", "-i", "Europe.xlsx"]).unwrap();
        match args.command {
            Command::Prepare(p) => {
                assert_eq!(p.input, PathBuf::from("Europe.xlsx"));
                assert_eq!(p.output, None);
            }
            other => panic!("Expected prepare, got {:?}", other),
        }
    }

    #[test]
    fn anchors_are_exclusive() {
        let result = Args::try_parse_from([
            "grid_splice",
            "splice",
            "--template",
            "t.nc",
            "--observations",
            "o.csv",
            "-o",
            "out.nc",
            "--variable",
            "tg",
            "--anchor-index",
            "1",
            "--anchor-date",
            "31/12/2000",
        ]);
        assert!(result.is_err());
    }
}
