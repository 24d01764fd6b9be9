//! Small file helpers shared by the batch operations

use crate::errors::{GridSpliceError, Result};
use log::info;
use std::{fs, path::Path};

/// Make `path` available for a freshly created output.
///
/// An existing file is removed when `overwrite` is set and refused otherwise.
/// Nothing on disk is touched when the call fails with `OutputExists`.
pub fn prepare_output_path(path: &Path, overwrite: bool) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    if !overwrite {
        return Err(GridSpliceError::OutputExists {
            path: path.to_path_buf(),
        });
    }
    fs::remove_file(path).map_err(|source| GridSpliceError::DeleteFailed {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Deleted: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_path_is_ready() {
        let dir = tempdir().unwrap();
        assert!(prepare_output_path(&dir.path().join("new.nc"), false).is_ok());
    }

    #[test]
    fn existing_path_needs_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("old.csv");
        fs::write(&path, "keep me").unwrap();

        let err = prepare_output_path(&path, false).unwrap_err();
        assert!(matches!(err, GridSpliceError::OutputExists { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep me");

        prepare_output_path(&path, true).unwrap();
        assert!(!path.exists());
    }
}
