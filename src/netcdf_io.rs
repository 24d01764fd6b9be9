//! NetCDF structural cloning
//!
//! Functions for copying global attributes, dimensions and variables from a
//! template file into a freshly created output, and for writing a patched
//! float block back under the template's name, type and attributes.

use crate::errors::{GridSpliceError, Result};
use log::debug;
use ndarray::ArrayD;
use netcdf::types::{FloatType, IntType, NcTypeDescriptor, NcVariableType};
use netcdf::{File, FileMut, Variable, VariableMut};
use std::ops::Range;

/// What a structural clone copied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloneSummary {
    pub attributes: usize,
    pub dimensions: usize,
    pub variables: Vec<String>,
}

/// Copy every global attribute verbatim. Returns the number copied.
pub fn copy_global_attributes(src: &File, dst: &mut FileMut) -> Result<usize> {
    let mut copied = 0;
    for attr in src.attributes() {
        dst.add_attribute(attr.name(), attr.value()?)?;
        copied += 1;
    }
    Ok(copied)
}

/// Create every dimension of `src` in `dst` with the same name and extent.
/// Unlimited dimensions stay unlimited; their length follows from the data written.
pub fn copy_dimensions(src: &File, dst: &mut FileMut) -> Result<usize> {
    let mut copied = 0;
    for dim in src.dimensions() {
        if dim.is_unlimited() {
            dst.add_unlimited_dimension(&dim.name())?;
        } else {
            dst.add_dimension(&dim.name(), dim.len())?;
        }
        copied += 1;
    }
    Ok(copied)
}

/// Copy every attribute of a variable. Returns the number copied.
pub fn copy_variable_attributes(src: &Variable, dst: &mut VariableMut) -> Result<usize> {
    let mut copied = 0;
    for attr in src.attributes() {
        dst.put_attribute(attr.name(), attr.value()?)?;
        copied += 1;
    }
    Ok(copied)
}

/// Full-extent ranges of a variable, one per dimension
pub fn variable_extents(var: &Variable) -> Vec<Range<usize>> {
    var.dimensions().iter().map(|d| 0..d.len()).collect()
}

/// Dimension names of a variable in declaration order
pub fn dimension_names(var: &Variable) -> Vec<String> {
    var.dimensions().iter().map(|d| d.name().to_string()).collect()
}

fn copy_typed<T: NcTypeDescriptor + Copy>(
    src: &Variable,
    dst: &mut FileMut,
    dims: &[&str],
    extents: &[Range<usize>],
) -> Result<()> {
    let mut out = dst.add_variable::<T>(&src.name(), dims)?;
    copy_variable_attributes(src, &mut out)?;
    if extents.iter().all(|r| !r.is_empty()) {
        let values = src.get_values::<T, _>(..)?;
        out.put_values(&values, extents)?;
    }
    Ok(())
}

/// Create `name` in `dst` with the template's type, dimensions and attributes
/// and copy its full data block unmodified.
pub fn copy_variable(src: &File, dst: &mut FileMut, name: &str) -> Result<()> {
    let var = src
        .variable(name)
        .ok_or_else(|| GridSpliceError::VariableNotFound {
            var: name.to_string(),
        })?;
    let dims = dimension_names(&var);
    let dim_refs: Vec<&str> = dims.iter().map(String::as_str).collect();
    let extents = variable_extents(&var);

    debug!("\tProcessing var: {} [{}]", name, dims.join(", "));

    match var.vartype() {
        NcVariableType::Int(IntType::I8) => copy_typed::<i8>(&var, dst, &dim_refs, &extents),
        NcVariableType::Int(IntType::U8) => copy_typed::<u8>(&var, dst, &dim_refs, &extents),
        NcVariableType::Int(IntType::I16) => copy_typed::<i16>(&var, dst, &dim_refs, &extents),
        NcVariableType::Int(IntType::U16) => copy_typed::<u16>(&var, dst, &dim_refs, &extents),
        NcVariableType::Int(IntType::I32) => copy_typed::<i32>(&var, dst, &dim_refs, &extents),
        NcVariableType::Int(IntType::U32) => copy_typed::<u32>(&var, dst, &dim_refs, &extents),
        NcVariableType::Int(IntType::I64) => copy_typed::<i64>(&var, dst, &dim_refs, &extents),
        NcVariableType::Int(IntType::U64) => copy_typed::<u64>(&var, dst, &dim_refs, &extents),
        NcVariableType::Float(FloatType::F32) => {
            copy_typed::<f32>(&var, dst, &dim_refs, &extents)
        }
        NcVariableType::Float(FloatType::F64) => {
            copy_typed::<f64>(&var, dst, &dim_refs, &extents)
        }
        other => Err(GridSpliceError::UnsupportedVariable {
            var: name.to_string(),
            reason: format!("type {:?} cannot be copied", other),
        }),
    }
}

/// Copy global attributes, dimensions and every variable except `skip`.
pub fn clone_structure(src: &File, dst: &mut FileMut, skip: &str) -> Result<CloneSummary> {
    let attributes = copy_global_attributes(src, dst)?;
    debug!("Copied {} global attributes", attributes);

    let dimensions = copy_dimensions(src, dst)?;
    debug!("Created {} dimensions", dimensions);

    let names: Vec<String> = src
        .variables()
        .map(|v| v.name().to_string())
        .filter(|n| n != skip)
        .collect();
    for name in &names {
        copy_variable(src, dst, name)?;
    }

    Ok(CloneSummary {
        attributes,
        dimensions,
        variables: names,
    })
}

/// Whether a variable holds floating point data that can be patched in memory
pub fn is_float_variable(var: &Variable) -> bool {
    matches!(var.vartype(), NcVariableType::Float(_))
}

/// Create `template_var` in `dst` (same name, type, dimensions, attributes)
/// and write `block` as its complete data in a single call.
pub fn write_float_block(
    dst: &mut FileMut,
    template_var: &Variable,
    block: &ArrayD<f64>,
) -> Result<()> {
    let name = template_var.name().to_string();
    let dims = dimension_names(template_var);
    let dim_refs: Vec<&str> = dims.iter().map(String::as_str).collect();
    let extents = variable_extents(template_var);

    let expected: Vec<usize> = extents.iter().map(|r| r.end).collect();
    if block.shape() != expected.as_slice() {
        return Err(GridSpliceError::UnsupportedVariable {
            var: name,
            reason: format!(
                "patched block has shape {:?}, template has {:?}",
                block.shape(),
                expected
            ),
        });
    }

    match template_var.vartype() {
        NcVariableType::Float(FloatType::F32) => {
            let values: Vec<f32> = block.iter().map(|&v| v as f32).collect();
            let mut out = dst.add_variable::<f32>(&name, &dim_refs)?;
            copy_variable_attributes(template_var, &mut out)?;
            out.put_values(&values, extents.as_slice())?;
        }
        NcVariableType::Float(FloatType::F64) => {
            let values: Vec<f64> = block.iter().copied().collect();
            let mut out = dst.add_variable::<f64>(&name, &dim_refs)?;
            copy_variable_attributes(template_var, &mut out)?;
            out.put_values(&values, extents.as_slice())?;
        }
        other => {
            return Err(GridSpliceError::UnsupportedVariable {
                var: name,
                reason: format!("type {:?} is not a float type", other),
            })
        }
    }

    Ok(())
}
