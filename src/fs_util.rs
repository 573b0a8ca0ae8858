use std::fs;
use std::io;
use std::path::Path;

use zip::ZipArchive;

use crate::error::BridgeError;
use crate::store::atomic_rename_dir;

pub fn extract_zip(zip_path: &Path, target_dir: &Path) -> Result<(), BridgeError> {
    let file = fs::File::open(zip_path).map_err(|err| {
        BridgeError::Filesystem(format!("open zip {}: {err}", zip_path.display()))
    })?;
    let mut archive = ZipArchive::new(file).map_err(|err| BridgeError::Archive(err.to_string()))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|err| BridgeError::Archive(err.to_string()))?;
        let entry_path = match entry.enclosed_name() {
            Some(path) => target_dir.join(path),
            None => {
                return Err(BridgeError::Archive(
                    "zip entry path traversal detected".to_string(),
                ));
            }
        };

        if entry.is_dir() {
            fs::create_dir_all(&entry_path)
                .map_err(|err| BridgeError::Filesystem(err.to_string()))?;
            continue;
        }

        if let Some(parent) = entry_path.parent() {
            fs::create_dir_all(parent).map_err(|err| BridgeError::Filesystem(err.to_string()))?;
        }
        let mut outfile = fs::File::create(&entry_path)
            .map_err(|err| BridgeError::Filesystem(err.to_string()))?;
        io::copy(&mut entry, &mut outfile).map_err(|err| BridgeError::Archive(err.to_string()))?;
    }
    Ok(())
}

/// Extracts into a temporary sibling of `target_dir` and renames it into place,
/// so a failed extraction never leaves a half-populated bundle behind.
pub fn extract_zip_atomic(zip_path: &Path, target_dir: &Path) -> Result<(), BridgeError> {
    let parent = target_dir
        .parent()
        .ok_or_else(|| BridgeError::Filesystem("invalid extraction path".to_string()))?;
    fs::create_dir_all(parent).map_err(|err| BridgeError::Filesystem(err.to_string()))?;
    let temp_dir = tempfile::Builder::new()
        .prefix(".tsb-extract")
        .tempdir_in(parent)
        .map_err(|err| BridgeError::Filesystem(err.to_string()))?;

    extract_zip(zip_path, temp_dir.path())?;

    let staged = temp_dir.keep();
    atomic_rename_dir(&staged, target_dir).map_err(|err| {
        let _ = fs::remove_dir_all(&staged);
        BridgeError::Filesystem(err.to_string())
    })
}
