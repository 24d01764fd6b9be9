//! Template grid inspection
//!
//! Before splicing, operators check that a template has the expected
//! coordinate variables and that the target variable is laid out over
//! time, latitude and longitude. This module gathers that information.

use crate::errors::Result;
use netcdf::{AttributeValue, File};

/// Information about a dimension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionInfo {
    pub name: String,
    pub length: usize,
    pub is_unlimited: bool,
}

/// Structured metadata for a NetCDF variable
#[derive(Debug, Clone)]
pub struct VariableInfo {
    pub name: String,
    pub data_type: String,
    pub dimensions: Vec<String>,
    pub shape: Vec<usize>,
    pub attributes: Vec<(String, AttributeValue)>,
}

/// Everything `inspect` reports about a grid file
#[derive(Debug, Clone)]
pub struct GridDescription {
    pub global_attributes: Vec<(String, AttributeValue)>,
    pub dimensions: Vec<DimensionInfo>,
    pub variables: Vec<VariableInfo>,
}

impl GridDescription {
    pub fn variable(&self, name: &str) -> Option<&VariableInfo> {
        self.variables.iter().find(|v| v.name == name)
    }
}

/// Gather global attributes, dimensions and variables of `file`.
pub fn describe_grid(file: &File) -> Result<GridDescription> {
    let mut global_attributes = Vec::new();
    for attr in file.attributes() {
        global_attributes.push((attr.name().to_string(), attr.value()?));
    }

    let dimensions = file
        .dimensions()
        .map(|d| DimensionInfo {
            name: d.name().to_string(),
            length: d.len(),
            is_unlimited: d.is_unlimited(),
        })
        .collect();

    let mut variables = Vec::new();
    for var in file.variables() {
        let mut attributes = Vec::new();
        for attr in var.attributes() {
            attributes.push((attr.name().to_string(), attr.value()?));
        }
        variables.push(VariableInfo {
            name: var.name().to_string(),
            data_type: format!("{:?}", var.vartype()).to_lowercase(),
            dimensions: var.dimensions().iter().map(|d| d.name().to_string()).collect(),
            shape: var.dimensions().iter().map(|d| d.len()).collect(),
            attributes,
        });
    }

    Ok(GridDescription {
        global_attributes,
        dimensions,
        variables,
    })
}

fn format_value(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Str(s) => format!("\"{}\"", s),
        AttributeValue::Float(v) => v.to_string(),
        AttributeValue::Double(v) => v.to_string(),
        AttributeValue::Int(v) => v.to_string(),
        AttributeValue::Short(v) => v.to_string(),
        other => format!("{:?}", other),
    }
}

/// Print a description in a clean, organized format.
pub fn print_grid_description(description: &GridDescription) {
    println!("\n===== Global Attributes =====");
    for (name, value) in &description.global_attributes {
        println!("- {}: {}", name, format_value(value));
    }

    println!("\n Dimensions");
    println!("==============");
    if description.dimensions.is_empty() {
        println!("   (No dimensions found)");
    }
    for dim in &description.dimensions {
        let unlimited = if dim.is_unlimited { " (unlimited)" } else { "" };
        println!("    {} = {}{}", dim.name, dim.length, unlimited);
    }

    println!("\n Variables");
    println!("=============");
    for var in &description.variables {
        if var.dimensions.is_empty() {
            println!("    {} ({}): scalar", var.name, var.data_type);
        } else {
            let shape: Vec<String> = var.shape.iter().map(|s| s.to_string()).collect();
            println!(
                "    {} ({}): [{}] = ({})",
                var.name,
                var.data_type,
                var.dimensions.join(", "),
                shape.join(" × ")
            );
        }
        for (name, value) in &var.attributes {
            println!("      • {}: {}", name, format_value(value));
        }
    }
}
