pub mod config_cmd;
pub mod transform;
pub mod validate;

use std::path::Path;

/// Read a file, naming it in the error.
pub(crate) fn read_file(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    std::fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()).into())
}
