//! Seasonal observation tables
//!
//! Observations arrive as CSV with one header row and positional columns
//! `season, latitude, longitude, date, rr_tg, seasdif`. The primary value may
//! be missing; such records are carried through and skipped at splice time.

use crate::errors::{GridSpliceError, Result};
use chrono::{Datelike, NaiveDate};
use std::io::Read;
use std::path::Path;

/// Column headers of the splice CSV schema
pub const CSV_HEADERS: [&str; 6] = ["season", "latitude", "longitude", "date", "rr_tg", "seasdif"];

/// One observation row
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRecord {
    /// Raw season code; only 1-4 are valid
    pub season: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub date: NaiveDate,
    /// Temperature or precipitation value, absent when missing or NaN
    pub value: Option<f64>,
    /// Seasonal difference; NaN when missing
    pub secondary: f64,
}

impl ObservationRecord {
    pub fn month(&self) -> u32 {
        self.date.month()
    }

    /// Primary value, if present and not NaN
    pub fn usable_value(&self) -> Option<f64> {
        self.value.filter(|v| !v.is_nan())
    }
}

/// Ordered observation records, as read
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationTable {
    pub records: Vec<ObservationRecord>,
}

/// Parse `dd/mm/yyyy`, falling back to ISO `yyyy-mm-dd`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y-%m-%d"))
        .ok()
}

/// Parse an optional float; empty strings and NA markers are `None`.
pub fn parse_optional_float(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("na") {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| !v.is_nan())
}

fn required<T: std::str::FromStr>(
    record: &csv::StringRecord,
    column: usize,
    line: usize,
) -> Result<T> {
    let field = record.get(column).unwrap_or("").trim();
    field.parse::<T>().map_err(|_| GridSpliceError::InvalidRecord {
        line,
        message: format!("column '{}' has unparseable value '{}'", CSV_HEADERS[column], field),
    })
}

/// Latitudes and longitudes must be finite to map onto a grid cell
fn coordinate(record: &csv::StringRecord, column: usize, line: usize) -> Result<f64> {
    let value: f64 = required(record, column, line)?;
    if !value.is_finite() {
        return Err(GridSpliceError::InvalidRecord {
            line,
            message: format!(
                "column '{}' is not a finite coordinate: {}",
                CSV_HEADERS[column], value
            ),
        });
    }
    Ok(value)
}

/// Season codes may be written as floats by spreadsheet exports ("3.0")
fn parse_season(record: &csv::StringRecord, line: usize) -> Result<i64> {
    let field = record.get(0).unwrap_or("").trim();
    if let Ok(code) = field.parse::<i64>() {
        return Ok(code);
    }
    match field.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v.is_finite() => Ok(v as i64),
        _ => Err(GridSpliceError::InvalidRecord {
            line,
            message: format!("column 'season' has unparseable value '{}'", field),
        }),
    }
}

impl ObservationTable {
    pub fn new(records: Vec<ObservationRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Read observations from any CSV source
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut records = Vec::new();
        for (i, row) in csv_reader.records().enumerate() {
            let row = row?;
            // header is line 1
            let line = i + 2;
            if row.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            if row.len() < CSV_HEADERS.len() - 1 {
                return Err(GridSpliceError::InvalidRecord {
                    line,
                    message: format!(
                        "expected {} columns, found {}",
                        CSV_HEADERS.len(),
                        row.len()
                    ),
                });
            }

            let date_field = row.get(3).unwrap_or("");
            let date = parse_date(date_field).ok_or_else(|| GridSpliceError::InvalidRecord {
                line,
                message: format!("column 'date' has unparseable value '{}'", date_field),
            })?;

            records.push(ObservationRecord {
                season: parse_season(&row, line)?,
                latitude: coordinate(&row, 1, line)?,
                longitude: coordinate(&row, 2, line)?,
                date,
                value: parse_optional_float(row.get(4).unwrap_or("")),
                secondary: parse_optional_float(row.get(5).unwrap_or("")).unwrap_or(f64::NAN),
            });
        }

        Ok(Self { records })
    }

    /// Read observations from a CSV file
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Position of the first record that breaks (latitude, longitude, date) order
    pub fn first_unsorted(&self) -> Option<usize> {
        self.records
            .windows(2)
            .position(|pair| {
                let a = (pair[0].latitude, pair[0].longitude, pair[0].date);
                let b = (pair[1].latitude, pair[1].longitude, pair[1].date);
                a.partial_cmp(&b) == Some(std::cmp::Ordering::Greater)
            })
            .map(|i| i + 1)
    }

    /// Latitude and longitude extents as `(lat_min, lat_max, lon_min, lon_max)`
    pub fn extent(&self) -> Option<(f64, f64, f64, f64)> {
        let first = self.records.first()?;
        let init = (first.latitude, first.latitude, first.longitude, first.longitude);
        Some(self.records.iter().fold(init, |(a, b, c, d), r| {
            (
                a.min(r.latitude),
                b.max(r.latitude),
                c.min(r.longitude),
                d.max(r.longitude),
            )
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
season,latitude,longitude,date,rr_tg,seasdif
1,50.125,10.375,01/12/2000,1.5,0.2
1,50.125,10.375,15/01/2001,,0.1
2,50.125,10.375,2001-03-15,NaN,
3.0,50.125,10.375,15/06/2001,17.25,-0.4
";

    #[test]
    fn reads_values_and_missing_markers() {
        let table = ObservationTable::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.len(), 4);

        let first = &table.records[0];
        assert_eq!(first.season, 1);
        assert_eq!(first.month(), 12);
        assert_eq!(first.usable_value(), Some(1.5));

        assert_eq!(table.records[1].value, None);
        assert_eq!(table.records[2].value, None);
        assert!(table.records[2].secondary.is_nan());
        assert_eq!(table.records[2].month(), 3);
        assert_eq!(table.records[3].season, 3);
    }

    #[test]
    fn bad_rows_report_their_line() {
        let data = "season,latitude,longitude,date,rr_tg,seasdif\n1,north,10.0,01/12/2000,1.0,0\n";
        match ObservationTable::from_reader(data.as_bytes()) {
            Err(GridSpliceError::InvalidRecord { line, message }) => {
                assert_eq!(line, 2);
                assert!(message.contains("latitude"));
            }
            other => panic!("Expected InvalidRecord, got {:?}", other),
        }

        let data = "season,latitude,longitude,date,rr_tg,seasdif\n1,50.0,10.0,31/02/2001,1.0,0\n";
        assert!(ObservationTable::from_reader(data.as_bytes()).is_err());
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        for row in ["1,NaN,10.0,01/12/2000,1.0,0", "1,50.0,inf,01/12/2000,1.0,0"] {
            let data = format!("season,latitude,longitude,date,rr_tg,seasdif\n{}\n", row);
            match ObservationTable::from_reader(data.as_bytes()) {
                Err(GridSpliceError::InvalidRecord { line, message }) => {
                    assert_eq!(line, 2);
                    assert!(message.contains("finite"));
                }
                other => panic!("Expected InvalidRecord, got {:?}", other),
            }
        }
    }

    #[test]
    fn detects_order_breaks() {
        let mut table = ObservationTable::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.first_unsorted(), None);
        table.records.swap(1, 2);
        assert_eq!(table.first_unsorted(), Some(2));
        table.records.swap(1, 2);
        table.records.swap(0, 3);
        assert_eq!(table.first_unsorted(), Some(1));
    }

    #[test]
    fn extent_covers_all_records() {
        let table = ObservationTable::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.extent(), Some((50.125, 50.125, 10.375, 10.375)));
        assert_eq!(ObservationTable::default().extent(), None);
    }
}
