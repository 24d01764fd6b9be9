//! Shared fixtures: a small EObs-like monthly template and observation CSVs

#![allow(dead_code)]

use chrono::NaiveDate;
use grid_splice::errors::Result;
use ndarray::{Array2, Array3};
use netcdf::create;
use std::path::Path;

pub const TIMES: usize = 24;
pub const LATS: [f64; 3] = [10.0, 10.5, 11.0];
pub const LONS: [f64; 4] = [20.0, 20.5, 21.0, 21.5];

/// Index of 31/12/2000 in the template time axis
pub const ANCHOR_INDEX: usize = 11;

/// Days since 1950-01-01 of the last day of each month, Jan 2000 to Dec 2001
pub fn month_end_offsets() -> Vec<f64> {
    let epoch = NaiveDate::from_ymd_opt(1950, 1, 1).unwrap();
    (0..TIMES)
        .map(|i| {
            let year = 2000 + (i / 12) as i32;
            let month = (i % 12) as u32 + 1;
            let next = if month == 12 {
                NaiveDate::from_ymd_opt(year + 1, 1, 1).unwrap()
            } else {
                NaiveDate::from_ymd_opt(year, month + 1, 1).unwrap()
            };
            let last = next.pred_opt().unwrap();
            (last - epoch).num_days() as f64
        })
        .collect()
}

/// Template values of `tg`: the flat position as a float
pub fn template_tg() -> Array3<f32> {
    let n = TIMES * LATS.len() * LONS.len();
    Array3::from_shape_vec((TIMES, LATS.len(), LONS.len()), (0..n).map(|i| i as f32).collect())
        .unwrap()
}

/// Layout choices for [`create_template_with`]
pub struct TemplateLayout {
    /// Declare `time` as the unlimited record dimension, as EObs files do
    pub unlimited_time: bool,
    pub latitudes: Vec<f64>,
}

impl Default for TemplateLayout {
    fn default() -> Self {
        Self {
            unlimited_time: false,
            latitudes: LATS.to_vec(),
        }
    }
}

/// Create the template grid at `path`
pub fn create_template(path: &Path) -> Result<()> {
    create_template_with(path, &TemplateLayout::default())
}

/// Create a template grid at `path` with the given layout
pub fn create_template_with(path: &Path, layout: &TemplateLayout) -> Result<()> {
    let nlat = layout.latitudes.len();
    let mut file = create(path)?;

    file.add_attribute("title", "Test EObs monthly means")?;
    file.add_attribute("Conventions", "CF-1.4")?;
    file.add_attribute("version", 17i32)?;

    if layout.unlimited_time {
        file.add_unlimited_dimension("time")?;
    } else {
        file.add_dimension("time", TIMES)?;
    }
    file.add_dimension("latitude", nlat)?;
    file.add_dimension("longitude", LONS.len())?;

    {
        let mut time = file.add_variable::<f64>("time", &["time"])?;
        time.put_attribute("units", "days since 1950-01-01 00:00")?;
        time.put_attribute("calendar", "standard")?;
        let extents = [0..TIMES];
        time.put_values(&month_end_offsets(), extents.as_slice())?;
    }
    {
        let mut lat = file.add_variable::<f64>("latitude", &["latitude"])?;
        lat.put_attribute("units", "degrees_north")?;
        lat.put_values(&layout.latitudes, ..)?;
    }
    {
        let mut lon = file.add_variable::<f64>("longitude", &["longitude"])?;
        lon.put_attribute("units", "degrees_east")?;
        lon.put_values(&LONS, ..)?;
    }
    {
        let n = TIMES * nlat * LONS.len();
        let values: Vec<f32> = (0..n).map(|i| i as f32).collect();
        let mut tg = file.add_variable::<f32>("tg", &["time", "latitude", "longitude"])?;
        tg.put_attribute("_FillValue", -9999.0f32)?;
        tg.put_attribute("units", "Celsius")?;
        tg.put_attribute("long_name", "mean temperature")?;
        let extents = [0..TIMES, 0..nlat, 0..LONS.len()];
        tg.put_values(&values, extents.as_slice())?;
    }
    {
        let elevation: Vec<i16> = (0..(nlat * LONS.len()) as i16).map(|i| i * 10).collect();
        let elevation = Array2::from_shape_vec((nlat, LONS.len()), elevation)?;
        let mut elev = file.add_variable::<i16>("elevation", &["latitude", "longitude"])?;
        elev.put_attribute("units", "m")?;
        elev.put(elevation.view(), ..)?;
    }

    Ok(())
}

pub const OBSERVATION_HEADER: &str = "season,latitude,longitude,date,rr_tg,seasdif\n";

/// Observation CSV text from data rows
pub fn observation_csv(rows: &[&str]) -> String {
    let mut text = OBSERVATION_HEADER.to_string();
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    text
}
