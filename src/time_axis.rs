//! Calendar dates on CF-style time axes
//!
//! The splice starts writing at the time index of a known calendar date.
//! That index is found by decoding the `units` attribute of the template's
//! time variable (`days since 1950-01-01 00:00` and friends) and looking for
//! an exact match among the stored offsets.

use crate::errors::{GridSpliceError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use netcdf::{AttributeValue, File};

/// Calendars whose dates are plain proleptic Gregorian for our purposes
const SUPPORTED_CALENDARS: [&str; 3] = ["standard", "gregorian", "proleptic_gregorian"];

/// Time unit of a CF time axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl TimeUnit {
    fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "days" | "day" | "d" => Some(Self::Days),
            "hours" | "hour" | "h" | "hr" | "hrs" => Some(Self::Hours),
            "minutes" | "minute" | "min" | "mins" => Some(Self::Minutes),
            "seconds" | "second" | "s" | "sec" | "secs" => Some(Self::Seconds),
            _ => None,
        }
    }

    const fn seconds(self) -> f64 {
        match self {
            Self::Days => 86_400.0,
            Self::Hours => 3_600.0,
            Self::Minutes => 60.0,
            Self::Seconds => 1.0,
        }
    }
}

/// Decoded `units` attribute of a time variable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeUnits {
    pub unit: TimeUnit,
    pub epoch: NaiveDateTime,
}

impl TimeUnits {
    /// Parse `<unit> since <date>[ <time>]`; the date and time may also be joined by `T`.
    pub fn parse(units: &str) -> Result<Self> {
        let invalid = || GridSpliceError::AnchorNotFound {
            message: format!("unsupported time units '{}'", units),
        };

        let mut parts = units.split_whitespace();
        let unit = parts.next().and_then(TimeUnit::parse).ok_or_else(invalid)?;
        if !parts.next().is_some_and(|w| w.eq_ignore_ascii_case("since")) {
            return Err(invalid());
        }
        let reference = parts.next().ok_or_else(invalid)?;
        let (date_part, mut time_part) = match reference.split_once('T') {
            Some((d, t)) => (d, Some(t)),
            None => (reference, None),
        };
        if time_part.is_none() {
            time_part = parts.next();
        }

        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| invalid())?;
        let time = match time_part {
            Some(t) => parse_clock(t.trim_end_matches('Z')).ok_or_else(invalid)?,
            None => NaiveTime::MIN,
        };

        Ok(Self {
            unit,
            epoch: date.and_time(time),
        })
    }

    /// Offset of `when` from the epoch, in this axis' unit
    pub fn offset_of(&self, when: NaiveDateTime) -> f64 {
        let delta = when - self.epoch;
        delta.num_seconds() as f64 / self.unit.seconds()
    }
}

fn parse_clock(token: &str) -> Option<NaiveTime> {
    // Fractional seconds such as "00:00:0.0" are dropped
    let whole = token.split('.').next()?;
    NaiveTime::parse_from_str(whole, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(whole, "%H:%M"))
        .ok()
}

fn string_attribute(file: &File, var_name: &str, attr_name: &str) -> Result<Option<String>> {
    let var = file
        .variable(var_name)
        .ok_or_else(|| GridSpliceError::VariableNotFound {
            var: var_name.to_string(),
        })?;
    match var.attribute(attr_name) {
        Some(attr) => match attr.value()? {
            AttributeValue::Str(s) => Ok(Some(s)),
            other => Err(GridSpliceError::AnchorNotFound {
                message: format!(
                    "attribute '{}' of '{}' is not a string: {:?}",
                    attr_name, var_name, other
                ),
            }),
        },
        None => Ok(None),
    }
}

/// Position of `target` in `offsets`, matched to within a millionth of a unit.
pub fn find_offset(offsets: &[f64], target: f64) -> Option<usize> {
    let tolerance = 1e-6 * target.abs().max(1.0);
    offsets.iter().position(|&t| (t - target).abs() <= tolerance)
}

/// Index of `date` (at midnight) in the time variable `time_var` of `file`.
pub fn time_index_for_date(file: &File, time_var: &str, date: NaiveDate) -> Result<usize> {
    let units = string_attribute(file, time_var, "units")?.ok_or_else(|| {
        GridSpliceError::AnchorNotFound {
            message: format!("time variable '{}' has no units attribute", time_var),
        }
    })?;

    if let Some(calendar) = string_attribute(file, time_var, "calendar")? {
        if !SUPPORTED_CALENDARS.contains(&calendar.to_ascii_lowercase().as_str()) {
            return Err(GridSpliceError::AnchorNotFound {
                message: format!("calendar '{}' is not supported", calendar),
            });
        }
    }

    let units = TimeUnits::parse(&units)?;
    let target = units.offset_of(date.and_time(NaiveTime::MIN));

    let var = file
        .variable(time_var)
        .ok_or_else(|| GridSpliceError::VariableNotFound {
            var: time_var.to_string(),
        })?;
    let offsets = var.get_values::<f64, _>(..)?;

    find_offset(&offsets, target).ok_or_else(|| GridSpliceError::AnchorNotFound {
        message: format!(
            "{} (offset {} {:?}) is not a value of '{}'",
            date, target, units.unit, time_var
        ),
    })
}
