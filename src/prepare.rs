//! Filtering raw observation workbooks into the splice schema
//!
//! The observation workbook has the columns
//! `latitude, longitude, date, year, season, tg, seasdif` on its first sheet.
//! It is read directly (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`) or from a
//! CSV export of that sheet. Rows from the cutoff year or earlier are
//! dropped, as are rows whose numeric fields do not parse; the rest are
//! rewritten in [`CSV_HEADERS`] order.

use crate::errors::{GridSpliceError, Result};
use crate::observations::{parse_date, parse_optional_float, CSV_HEADERS};
use crate::utils::prepare_output_path;
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Datelike, Days, NaiveDate};
use log::info;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Extensions read as workbooks; anything else is read as CSV
const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Sheet column holding the observation date
const DATE_COLUMN: usize = 2;

/// One data row of the observation sheet as text, in sheet column order
type RawRow = Vec<String>;

/// Options for [`filter_raw_observations`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOptions {
    /// Rows dated in this year or earlier are dropped
    pub cutoff_year: i32,
    pub overwrite: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            cutoff_year: 2000,
            overwrite: true,
        }
    }
}

/// Counts gathered while filtering
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSummary {
    pub rows: usize,
    pub written: usize,
    pub before_cutoff: usize,
    pub bad_date: usize,
    pub bad_value: usize,
    pub bad_season: usize,
    pub bad_year: usize,
    pub bad_season_difference: usize,
    pub distinct_latitudes: usize,
    pub distinct_longitudes: usize,
}

/// Default output for `input`: `<stem>_filtered.csv` alongside it
pub fn filtered_path_for(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("observations");
    input.with_file_name(format!("{}_filtered.csv", stem))
}

/// Whether `path` is read as a workbook rather than CSV
pub fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| WORKBOOK_EXTENSIONS.iter().any(|w| e.eq_ignore_ascii_case(w)))
}

/// Date of an Excel serial day number (1900 date system)
pub fn excel_serial_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.floor() as u64))
}

fn serial_date_text(serial: f64) -> String {
    excel_serial_date(serial)
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}

/// Text of a sheet cell. Date cells, and numbers in the date column, are
/// decoded as Excel serial dates; error and boolean cells are empty.
fn cell_text(cell: &Data, column: usize) -> String {
    match cell {
        Data::DateTime(dt) => serial_date_text(dt.as_f64()),
        Data::Float(v) if column == DATE_COLUMN => serial_date_text(*v),
        Data::Int(v) if column == DATE_COLUMN => serial_date_text(*v as f64),
        Data::DateTimeIso(s) => s.split('T').next().unwrap_or_default().to_string(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::String(s) => s.clone(),
        _ => String::new(),
    }
}

/// Data rows of the first sheet of a workbook, header row excluded
fn read_workbook_rows(input: &Path) -> Result<Vec<RawRow>> {
    let mut workbook = open_workbook_auto(input)?;
    let range = workbook.worksheet_range_at(0).ok_or_else(|| {
        GridSpliceError::Generic(format!("workbook {} has no sheets", input.display()))
    })??;
    info!("Identified {} rows of data in Excel file", range.height().saturating_sub(1));

    Ok(range
        .rows()
        .skip(1)
        .map(|row| row.iter().enumerate().map(|(col, cell)| cell_text(cell, col)).collect())
        .collect())
}

/// Read the raw observations at `input` and write the filtered splice CSV to `output`.
pub fn filter_raw_observations(
    input: &Path,
    output: &Path,
    options: FilterOptions,
) -> Result<FilterSummary> {
    if !input.is_file() {
        return Err(GridSpliceError::Generic(format!(
            "Observation file {} does not exist",
            input.display()
        )));
    }
    prepare_output_path(output, options.overwrite)?;

    if is_workbook(input) {
        info!("Reading Excel file {} - this may take several minutes...", input.display());
        let rows = read_workbook_rows(input)?;
        filter_rows(rows.into_iter().map(Ok), output, options)
    } else {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(input)?;
        let rows = reader.into_records().map(|row| {
            row.map(|r| r.iter().map(str::to_string).collect::<RawRow>())
                .map_err(GridSpliceError::from)
        });
        filter_rows(rows, output, options)
    }
}

fn filter_rows<I>(rows: I, output: &Path, options: FilterOptions) -> Result<FilterSummary>
where
    I: IntoIterator<Item = Result<RawRow>>,
{
    let mut writer = csv::Writer::from_path(output)?;
    writer.write_record(CSV_HEADERS)?;

    let mut summary = FilterSummary::default();
    // bit patterns, since f64 is not Hash
    let mut latitudes = HashSet::new();
    let mut longitudes = HashSet::new();

    for row in rows {
        let row = row?;
        summary.rows += 1;
        let field = |i: usize| row.get(i).map(|f| f.trim()).unwrap_or("");

        let Some(date) = parse_date(field(DATE_COLUMN)) else {
            summary.bad_date += 1;
            continue;
        };
        if date.year() <= options.cutoff_year {
            summary.before_cutoff += 1;
            continue;
        }

        let latitude = parse_optional_float(field(0));
        let longitude = parse_optional_float(field(1));
        if let Some(lat) = latitude {
            latitudes.insert(lat.to_bits());
        }
        if let Some(lon) = longitude {
            longitudes.insert(lon.to_bits());
        }

        let season = field(4);
        if season.parse::<i64>().is_err() {
            summary.bad_season += 1;
        }

        let Some(season_difference) = parse_optional_float(field(6)) else {
            summary.bad_season_difference += 1;
            continue;
        };
        let Some(value) = parse_optional_float(field(5)) else {
            summary.bad_value += 1;
            continue;
        };
        if parse_optional_float(field(3)).is_none() {
            summary.bad_year += 1;
            continue;
        }
        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            summary.bad_value += 1;
            continue;
        };

        writer.write_record([
            season.to_string(),
            latitude.to_string(),
            longitude.to_string(),
            date.format("%d/%m/%Y").to_string(),
            value.to_string(),
            season_difference.to_string(),
        ])?;
        summary.written += 1;
        if summary.written % 1000 == 0 {
            info!("have generated {} values", summary.written);
        }
    }
    writer.flush()?;

    summary.distinct_latitudes = latitudes.len();
    summary.distinct_longitudes = longitudes.len();
    info!(
        "Number of bad tgs: {}\tseasons: {}\tyears: {}",
        summary.bad_value, summary.bad_season, summary.bad_year
    );
    info!(
        "Wrote {} of {} rows to {} ({} latitudes, {} longitudes)",
        summary.written,
        summary.rows,
        output.display(),
        summary.distinct_latitudes,
        summary.distinct_longitudes
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_dates_use_the_1900_system() {
        assert_eq!(excel_serial_date(36892.0), NaiveDate::from_ymd_opt(2001, 1, 1));
        // time of day is dropped
        assert_eq!(excel_serial_date(36906.75), NaiveDate::from_ymd_opt(2001, 1, 15));
        assert_eq!(excel_serial_date(0.0), None);
        assert_eq!(excel_serial_date(f64::NAN), None);
    }

    #[test]
    fn sheet_cells_become_fields() {
        assert_eq!(cell_text(&Data::Float(36906.0), DATE_COLUMN), "15/01/2001");
        assert_eq!(cell_text(&Data::Int(36906), DATE_COLUMN), "15/01/2001");
        assert_eq!(cell_text(&Data::String("15/01/2001".into()), DATE_COLUMN), "15/01/2001");
        assert_eq!(
            cell_text(&Data::DateTimeIso("2001-01-15T00:00:00".into()), DATE_COLUMN),
            "2001-01-15"
        );
        assert_eq!(cell_text(&Data::Float(51.25), 0), "51.25");
        assert_eq!(cell_text(&Data::Int(2001), 3), "2001");
        assert_eq!(cell_text(&Data::Empty, 5), "");
        assert_eq!(cell_text(&Data::Bool(true), 5), "");
    }

    #[test]
    fn workbook_detection_and_default_output() {
        assert!(is_workbook(Path::new("obs/Europe.xlsx")));
        assert!(is_workbook(Path::new("obs/Europe.XLS")));
        assert!(!is_workbook(Path::new("obs/Europe.csv")));
        assert_eq!(
            filtered_path_for(Path::new("obs/Europe.xlsx")),
            PathBuf::from("obs/Europe_filtered.csv")
        );
    }

    #[test]
    fn unreadable_workbook_is_a_spreadsheet_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.xlsx");
        std::fs::write(&input, "not a zip archive").unwrap();
        let output = dir.path().join("out.csv");
        let err = filter_raw_observations(&input, &output, FilterOptions::default()).unwrap_err();
        assert!(matches!(err, GridSpliceError::SpreadsheetError(_)));
    }
}
