use std::collections::BTreeSet;
use std::io;
use std::path::Path;
use tracing::warn;
use walkdir::WalkDir;

use crate::db::{CatalogError, Result};

/// Split a comma separated extension list such as `.png,.jpg`.
///
/// Entries are trimmed and empty ones dropped; case is left alone.
pub fn parse_extensions(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect()
}

/// True if the file's lowercased extension, with its leading dot, is one of
/// `extensions`. The allow-list itself is matched as given.
pub fn has_allowed_extension(file_name: &str, extensions: &[String]) -> bool {
    let Some(ext) = Path::new(file_name).extension() else {
        return false;
    };
    let ext = format!(".{}", ext.to_string_lossy().to_lowercase());
    extensions.iter().any(|e| *e == ext)
}

/// Names of the image files directly under `directory`.
///
/// Only regular files (symlinks are followed) with an allowed extension are
/// kept. Subdirectories are not descended into.
pub fn discover_images(directory: &Path, extensions: &[String]) -> Result<BTreeSet<String>> {
    let access_error = |source: io::Error| CatalogError::DirectoryAccess {
        path: directory.to_path_buf(),
        source,
    };

    let metadata = std::fs::metadata(directory).map_err(access_error)?;
    if !metadata.is_dir() {
        return Err(access_error(io::Error::other("not a directory")));
    }
    std::fs::read_dir(directory).map_err(access_error)?;

    let mut images = BTreeSet::new();

    for entry in WalkDir::new(directory).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| access_error(e.into()))?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let Some(name) = entry.file_name().to_str() else {
            warn!("Skipping file with non UTF-8 name: {:?}", path);
            continue;
        };

        if has_allowed_extension(name, extensions) {
            images.insert(name.to_string());
        }
    }

    Ok(images)
}
