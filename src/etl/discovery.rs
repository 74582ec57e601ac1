use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Every file under `root` whose extension matches `extension`
/// (case-insensitive), sorted by path. A missing root holds no files.
pub fn discover_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if !root.exists() {
        tracing::warn!(root = %root.display(), "Input directory does not exist");
        return Ok(files);
    }

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        let path = entry.path();

        if entry.file_type().is_file() {
            if let Some(ext) = path.extension() {
                if ext.to_string_lossy().eq_ignore_ascii_case(extension) {
                    files.push(path.to_path_buf());
                }
            }
        }
    }

    files.sort();

    Ok(files)
}
