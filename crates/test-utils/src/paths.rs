//! Path utilities for locating shipped scenario files.

use std::path::PathBuf;

/// Returns the workspace root directory.
///
/// This is determined by walking up from the test-utils manifest directory.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// Directory holding the load-test scenario YAML files.
pub fn scenarios_dir() -> PathBuf {
    workspace_root()
        .join("validation")
        .join("load-test")
        .join("scenarios")
}

/// Path to a named scenario file, if it exists.
pub fn find_scenario(name: &str) -> Option<PathBuf> {
    let path = scenarios_dir().join(name);
    if path.exists() {
        Some(path)
    } else {
        None
    }
}
