use crate::error::{BootstrapError, Result};
use crate::utils::ScratchDir;
use std::collections::HashMap;
use std::path::PathBuf;

/// Paths starting with this prefix name an application resource rather than a file.
pub const RESOURCE_PREFIX: &str = "resource:";

/// Finds application resources, first on disk under `root`, then among byte blobs compiled
/// into the binary.
#[derive(Debug, Clone)]
pub struct ResourceLoader {
    root: PathBuf,
    bundled: HashMap<String, &'static [u8]>,
}

impl ResourceLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ResourceLoader {
            root: root.into(),
            bundled: HashMap::new(),
        }
    }

    /// Register a resource shipped inside the binary, e.g. via `include_bytes!`.
    pub fn with_bundled(mut self, name: &str, bytes: &'static [u8]) -> Self {
        self.bundled.insert(name.trim_start_matches('/').to_string(), bytes);
        self
    }

    /// Turn `location` into a readable filesystem path.
    ///
    /// Plain paths are returned unchanged. `resource:` paths map to the file under `root`
    /// when one exists; a bundled resource is copied into `scratch` and that copy returned.
    pub fn resolve(&self, location: &str, scratch: &mut ScratchDir) -> Result<PathBuf> {
        let Some(name) = location.strip_prefix(RESOURCE_PREFIX) else {
            return Ok(PathBuf::from(location));
        };
        let name = name.trim_start_matches('/');
        if name.is_empty() {
            return Err(BootstrapError::ResourceNotFound(format!(
                "{location}: empty resource name"
            )));
        }

        let on_disk = self.root.join(name);
        if on_disk.is_file() {
            log::debug!("Resolved {location} to {}", on_disk.display());
            return Ok(on_disk);
        }

        if let Some(bytes) = self.bundled.get(name) {
            log::debug!("Resource {location} is bundled, extracting to a temporary file");
            let file_name = name.rsplit('/').next().unwrap_or(name);
            return scratch.write(file_name, bytes);
        }

        Err(BootstrapError::ResourceNotFound(format!(
            "{location} (looked in {} and bundled resources)",
            self.root.display()
        )))
    }
}
