use std::path::Path;

use crate::collection::RouteCollectionError;

/// make sure the artifact destination exists and is a directory, creating
/// missing path components. an existing non-directory at the path is a
/// user-input error.
pub fn create_dirs<P>(path: P) -> Result<(), RouteCollectionError>
where
    P: AsRef<Path>,
{
    let dir = path.as_ref();
    if dir.is_dir() {
        return Ok(());
    }
    if dir.exists() {
        return Err(RouteCollectionError::InvalidUserInput(format!(
            "output path '{}' exists but is not a directory",
            dir.display()
        )));
    }
    std::fs::create_dir_all(dir).map_err(|e| {
        RouteCollectionError::InvalidUserInput(format!(
            "error building output directory '{}': {e}",
            dir.display()
        ))
    })
}
