//! Entry point for the grid_splice application.
//! Handles CLI parsing and settings, then dispatches to the batch operations.

use clap::Parser;
use grid_splice::cli::{Args, Command, ConvertArgs, SpliceArgs};
use grid_splice::codes::extract_country_codes;
use grid_splice::eobs::{convert_observations, ConvertOptions};
use grid_splice::errors::GridSpliceError;
use grid_splice::metadata::{describe_grid, print_grid_description};
use grid_splice::observations::{parse_date, ObservationTable};
use grid_splice::prepare::{filter_raw_observations, filtered_path_for, FilterOptions};
use grid_splice::settings::Settings;
use grid_splice::summary_grid::{create_summary_grid, read_manifest_bbox, SummaryGridSpec};
use grid_splice::{splice, SpliceConfig, SpliceReport, TimeAnchor};
use log::debug;

fn anchor_from(
    args_date: Option<&str>,
    args_index: Option<usize>,
    settings: &Settings,
) -> Result<TimeAnchor, GridSpliceError> {
    if let Some(index) = args_index {
        return Ok(TimeAnchor::Index(index));
    }
    if let Some(text) = args_date {
        return parse_date(text)
            .map(TimeAnchor::Date)
            .ok_or_else(|| {
                GridSpliceError::Generic(format!("'{}' is not a dd/mm/yyyy date", text))
            });
    }
    Ok(settings
        .anchor_date()?
        .map(TimeAnchor::Date)
        .unwrap_or_default())
}

fn print_report(report: &SpliceReport) {
    println!("✅ Saved {} to {}", report.variable, report.output.display());
    println!(
        "   Spliced {} values from {} records ({} skipped as missing)",
        report.spliced, report.records, report.skipped_missing
    );
    println!(
        "   Time indices: {} -> {}, {} grid cells touched",
        report.start_index,
        report.end_index,
        report.touched_cells.len()
    );
    if let Some(bounds) = report.bounds {
        println!(
            "   Patch lat indices: {} {}  lon indices: {} {}",
            bounds.lat.0, bounds.lat.1, bounds.lon.0, bounds.lon.1
        );
    }
}

fn run_splice(args: SpliceArgs, settings: &Settings) -> Result<(), GridSpliceError> {
    let anchor = anchor_from(args.anchor_date.as_deref(), args.anchor_index, settings)?;
    let observations = ObservationTable::from_csv_path(&args.observations)?;
    println!(
        "Read {} observation records from {}",
        observations.len(),
        args.observations.display()
    );

    let mut config = SpliceConfig::new(args.template, args.output, &args.variable)
        .with_anchor(anchor)
        .with_overwrite(args.overwrite)
        .with_require_sorted(args.check_sorted);
    if let Some(path) = args.audit_csv.or_else(|| settings.audit_csv.clone()) {
        config = config.with_audit_csv(path);
    }
    debug!("Splice configuration: {:?}", config);

    let report = splice(&config, &observations)?;
    print_report(&report);
    Ok(())
}

fn run_convert(args: ConvertArgs, settings: &Settings) -> Result<(), GridSpliceError> {
    let eobs_dir = args
        .eobs_dir
        .or_else(|| settings.eobs_dir.clone())
        .ok_or_else(|| {
            GridSpliceError::Generic("no EObs directory given (--eobs-dir or settings)".to_string())
        })?;
    let options = ConvertOptions {
        anchor: anchor_from(None, None, settings)?,
        audit_csv: args.audit_csv.or_else(|| settings.audit_csv.clone()),
        require_sorted: args.check_sorted,
    };
    let report = convert_observations(&args.observations, &eobs_dir, &options)?;
    print_report(&report);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let settings = Settings::load_optional(args.settings.as_deref())?;
    debug!("Settings: {:?}", settings);

    match args.command {
        Command::Splice(splice_args) => run_splice(splice_args, &settings)?,
        Command::Convert(convert_args) => run_convert(convert_args, &settings)?,
        Command::Prepare(prepare_args) => {
            let options = FilterOptions {
                cutoff_year: prepare_args.cutoff_year.unwrap_or_else(|| settings.cutoff_year()),
                overwrite: prepare_args.overwrite,
            };
            let output = prepare_args
                .output
                .unwrap_or_else(|| filtered_path_for(&prepare_args.input));
            let summary = filter_raw_observations(&prepare_args.input, &output, options)?;
            println!(
                "✅ Wrote {} of {} rows to {}",
                summary.written,
                summary.rows,
                output.display()
            );
            println!(
                "   Number of bad tgs: {}\tseasons: {}\tyears: {}\tdates: {}",
                summary.bad_value, summary.bad_season, summary.bad_year, summary.bad_date
            );
        }
        Command::Codes(codes_args) => {
            let excluded = if codes_args.excluded.is_empty() {
                settings.excluded_countries()
            } else {
                codes_args.excluded
            };
            let summary =
                extract_country_codes(&codes_args.run_file, &codes_args.output, &excluded)?;
            println!(
                "✅ Wrote {} country codes to {}",
                summary.codes.len(),
                codes_args.output.display()
            );
        }
        Command::Summary(summary_args) => {
            let bbox = read_manifest_bbox(&summary_args.manifest)?;
            let study = summary_args
                .manifest
                .file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.trim_end_matches("_summary_manifest").to_string())
                .unwrap_or_default();
            let spec = SummaryGridSpec {
                output: summary_args.output,
                study,
                bbox,
                start_year: summary_args.start_year,
                end_year: summary_args.end_year,
                metrics: summary_args.metrics,
                climate_scenario: summary_args.scenario,
                land_use: summary_args.land_use,
            };
            let shape = create_summary_grid(&spec)?;
            println!(
                "✅ Created {} with {} rows, {} columns, {} months",
                spec.output.display(),
                shape.lats,
                shape.lons,
                shape.months
            );
        }
        Command::Inspect(inspect_args) => {
            let file = netcdf::open(&inspect_args.file)?;
            println!("Successfully opened NetCDF file: {}", inspect_args.file.display());
            let description = describe_grid(&file)?;
            print_grid_description(&description);
        }
    }

    Ok(())
}
