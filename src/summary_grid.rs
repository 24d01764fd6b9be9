//! Empty result grids for spatial simulation summaries
//!
//! A study manifest records the bounding box of a simulation run. From it a
//! NetCDF file is laid out on the HWSD grid (120 cells per degree) with one
//! monthly series per cell for each summary metric, all initially missing.
//! Simulation results are later written one cell at a time.

use crate::errors::{GridSpliceError, Result};
use crate::utils::prepare_output_path;
use chrono::Local;
use log::info;
use netcdf::FileMut;
use std::path::{Path, PathBuf};

/// HWSD cells per degree
pub const GRANULARITY: f64 = 120.0;

/// Fill and missing value of summary metrics
pub const MISSING_VALUE: f32 = -999.0;

/// Degrees the lower-left latitude is pushed south so edge cells are included
const SOUTHERN_ADJUSTMENT: f64 = 0.1;

const MONTHS_PER_YEAR: usize = 12;

/// Geographic extent in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub ll_lon: f64,
    pub ll_lat: f64,
    pub ur_lon: f64,
    pub ur_lat: f64,
}

/// Parse the first line of a tab-separated study manifest.
pub fn parse_manifest_line(line: &str) -> Result<BoundingBox> {
    let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
    if fields.len() < 10 {
        return Err(GridSpliceError::InvalidRecord {
            line: 1,
            message: format!("manifest must have 10 elements, {} found", fields.len()),
        });
    }

    let number = |i: usize| -> Result<f64> {
        fields[i].trim().parse::<f64>().map_err(|_| GridSpliceError::InvalidRecord {
            line: 1,
            message: format!("manifest field {} is not a number: '{}'", i, fields[i]),
        })
    };

    Ok(BoundingBox {
        ll_lon: number(3)?,
        ll_lat: number(2)? - SOUTHERN_ADJUSTMENT,
        ur_lon: number(7)?,
        ur_lat: number(6)?,
    })
}

/// Read the bounding box from the first line of a study manifest file
pub fn read_manifest_bbox(path: &Path) -> Result<BoundingBox> {
    if !path.is_file() {
        return Err(GridSpliceError::Generic(format!(
            "study manifest file {} does not exist - cannot proceed",
            path.display()
        )));
    }
    let text = std::fs::read_to_string(path)?;
    parse_manifest_line(text.lines().next().unwrap_or(""))
}

/// Granular (HWSD row, column) of a point
pub fn granular_lat_lon(latitude: f64, longitude: f64) -> (i64, i64) {
    let gran_lat = ((90.0 - latitude) * GRANULARITY).round() as i64;
    let gran_lon = ((180.0 + longitude) * GRANULARITY).round() as i64;
    (gran_lat, gran_lon)
}

/// Grid (lat, lon) index of a granular cell within `bbox`
pub fn cell_index(gran_lat: i64, gran_lon: i64, bbox: &BoundingBox) -> (i64, i64) {
    let lat = 90.0 - gran_lat as f64 / GRANULARITY;
    let lon = gran_lon as f64 / GRANULARITY - 180.0;
    let lat_index = ((lat - bbox.ll_lat) * GRANULARITY).round() as i64;
    let lon_index = ((lon - bbox.ll_lon) * GRANULARITY).round() as i64;
    (lat_index, lon_index)
}

/// Coordinates from `start` up to (excluding) `stop` in steps of one cell
fn cell_coordinates(start: f64, stop: f64) -> Vec<f32> {
    let count = ((stop - start) * GRANULARITY).ceil().max(0.0) as usize;
    (0..count)
        .map(|i| (start + i as f64 / GRANULARITY) as f32)
        .collect()
}

/// Description of a summary grid to create
#[derive(Debug, Clone)]
pub struct SummaryGridSpec {
    pub output: PathBuf,
    pub study: String,
    pub bbox: BoundingBox,
    pub start_year: i32,
    pub end_year: i32,
    pub metrics: Vec<String>,
    pub climate_scenario: String,
    pub land_use: String,
}

/// Shape of a created summary grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryGridShape {
    pub lats: usize,
    pub lons: usize,
    pub months: usize,
}

/// Create the summary grid; an existing file at the output path is replaced.
pub fn create_summary_grid(spec: &SummaryGridSpec) -> Result<SummaryGridShape> {
    if spec.end_year < spec.start_year {
        return Err(GridSpliceError::Generic(format!(
            "end year {} precedes start year {}",
            spec.end_year, spec.start_year
        )));
    }

    let bbox = spec.bbox;
    let alats = cell_coordinates(bbox.ll_lat, bbox.ur_lat);
    let alons = cell_coordinates(bbox.ll_lon, bbox.ur_lon);
    let nyears = (spec.end_year - spec.start_year + 1) as usize;
    let num_months = nyears * MONTHS_PER_YEAR;
    if num_months > i16::MAX as usize {
        return Err(GridSpliceError::Generic(format!(
            "{} months do not fit the time axis",
            num_months
        )));
    }
    info!("Number of rows: {} and columns: {}", alats.len(), alons.len());

    prepare_output_path(&spec.output, true)?;
    let mut file = netcdf::create(&spec.output)?;

    file.add_attribute("history", format!("{} consisting of {} study", spec.study, spec.study))?;
    let date_stamp = Local::now().format("%H:%M %d-%m-%Y");
    file.add_attribute("attribution", format!("Created at {} from Spatial Ecosse", date_stamp))?;
    file.add_attribute("future_climate_scenario", spec.climate_scenario.as_str())?;
    file.add_attribute("land_use_change", spec.land_use.as_str())?;
    let data_used = if spec.climate_scenario == "CORDEX" {
        format!(
            "Data used: HWSD soil, {0} past weather and {0} future climate",
            spec.climate_scenario
        )
    } else {
        format!(
            "Data used: HWSD soil, CRU past weather and CRU future climate, scenario: {}",
            spec.climate_scenario
        )
    };
    file.add_attribute("dataUsed", data_used)?;

    file.add_dimension("lat", alats.len())?;
    file.add_dimension("lon", alons.len())?;
    file.add_dimension("time", num_months)?;

    {
        let mut lats = file.add_variable::<f32>("latitude", &["lat"])?;
        lats.put_attribute("units", "degrees of latitude North to South in 30 arc seconds steps")?;
        lats.put_attribute("long_name", "latitude")?;
        if !alats.is_empty() {
            lats.put_values(&alats, ..)?;
        }
    }
    {
        let mut lons = file.add_variable::<f32>("longitude", &["lon"])?;
        lons.put_attribute("units", "degrees of longitude West to East in 30 arc seconds steps")?;
        lons.put_attribute("long_name", "longitude")?;
        if !alons.is_empty() {
            lons.put_values(&alons, ..)?;
        }
    }
    {
        let months: Vec<i16> = (0..num_months).map(|m| m as i16).collect();
        let mut times = file.add_variable::<i16>("time", &["time"])?;
        times.put_attribute(
            "units",
            format!("months from January {} - {} years", spec.start_year, nyears),
        )?;
        times.put_values(&months, ..)?;
    }

    for metric in &spec.metrics {
        let mut var = file.add_variable::<f32>(metric, &["lat", "lon", "time"])?;
        var.put_attribute("_FillValue", MISSING_VALUE)?;
        var.put_attribute("units", "kg/ha")?;
        var.put_attribute("missing_value", MISSING_VALUE)?;
    }

    drop(file);
    info!("Closed {} netCDF file", spec.output.display());

    Ok(SummaryGridShape {
        lats: alats.len(),
        lons: alons.len(),
        months: num_months,
    })
}

/// Write one cell's monthly series of `var_name`.
pub fn write_cell_series(
    file: &mut FileMut,
    var_name: &str,
    lat_index: usize,
    lon_index: usize,
    values: &[f32],
) -> Result<()> {
    let mut var = file
        .variable_mut(var_name)
        .ok_or_else(|| GridSpliceError::VariableNotFound {
            var: var_name.to_string(),
        })?;
    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    if shape.len() != 3
        || lat_index >= shape[0]
        || lon_index >= shape[1]
        || values.len() != shape[2]
    {
        return Err(GridSpliceError::Generic(format!(
            "cannot write {} values at [{}, {}] of '{}' with shape {:?}",
            values.len(),
            lat_index,
            lon_index,
            var_name,
            shape
        )));
    }
    let extents = [lat_index..lat_index + 1, lon_index..lon_index + 1, 0..values.len()];
    var.put_values(values, extents.as_slice())?;
    Ok(())
}
