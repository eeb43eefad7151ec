//! Image selection from the local filesystem
//!
//! Stands in for the camera/gallery picker: turns a path into an
//! [`ImageReference`] after checking that the photo can actually be read.

use std::io::ErrorKind;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::ImageReference;

/// Select a photo by path.
///
/// Access refusals surface as [`Error::PermissionDenied`] so the caller can
/// show a one-time notice; they never reach the workflow.
pub fn select_from_path(path: &Path) -> Result<ImageReference> {
    let metadata = std::fs::metadata(path).map_err(|e| access_error(path, e))?;
    if !metadata.is_file() {
        return Err(Error::Io(std::io::Error::new(
            ErrorKind::InvalidInput,
            format!("{} is not a file", path.display()),
        )));
    }

    // Opening proves read access; metadata alone does not
    std::fs::File::open(path).map_err(|e| access_error(path, e))?;

    Ok(ImageReference::new(path))
}

fn access_error(path: &Path, e: std::io::Error) -> Error {
    if e.kind() == ErrorKind::PermissionDenied {
        Error::PermissionDenied(format!(
            "photo library access is required to read {}",
            path.display()
        ))
    } else {
        Error::Io(e)
    }
}
