use crate::error::{BootstrapError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary directory for material that only exists in memory or inside the binary.
/// Created on first write. Dropping it removes the directory and everything in it.
#[derive(Debug, Default)]
pub struct ScratchDir {
    dir: Option<TempDir>,
}

impl ScratchDir {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.dir.as_ref().map(|dir| dir.path())
    }

    /// Write `bytes` to a new file named after `file_name` and return its path. Each call
    /// creates a distinct file even when names repeat.
    pub fn write(&mut self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let stage_error = |e: std::io::Error| {
            BootstrapError::ResourceNotFound(format!("could not stage {file_name}: {e}"))
        };

        let dir = match self.dir.take() {
            Some(dir) => dir,
            None => tempfile::Builder::new()
                .prefix("keystore-bootstrap-")
                .tempdir()
                .map_err(stage_error)?,
        };
        let dir = self.dir.insert(dir);

        let name = Path::new(file_name);
        let stem = name
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("resource");
        let suffix = name
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();

        let mut file = tempfile::Builder::new()
            .prefix(&format!("{stem}-"))
            .suffix(&suffix)
            .tempfile_in(dir.path())
            .map_err(stage_error)?;
        file.write_all(bytes).map_err(stage_error)?;
        let (_, path) = file.keep().map_err(|e| stage_error(e.error))?;
        log::debug!("Staged {file_name} at {}", path.display());
        Ok(path)
    }
}
