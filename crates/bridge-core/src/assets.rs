//! Resolution of the script and style URLs the bootstrap page loads.
//!
//! Production reads the bundler's build manifest under `bundle_dir`;
//! development points straight at the dev server.

use crate::config::{AssetSource, BridgeConfig};
use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Manifest location relative to the bundle directory.
pub const MANIFEST_PATH: &str = ".vite/manifest.json";

/// One manifest record. Unknown bundler fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub file: String,
    #[serde(default)]
    pub css: Vec<String>,
}

/// Entry-point path → built files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: HashMap<String, ManifestEntry>,
}

impl Manifest {
    pub fn path_in(bundle_dir: &Path) -> PathBuf {
        bundle_dir.join(MANIFEST_PATH)
    }

    pub fn read(path: &Path) -> Result<Self, ConfigurationError> {
        let data = std::fs::read_to_string(path).map_err(|source| {
            ConfigurationError::ManifestUnreadable {
                path: path.to_path_buf(),
                source,
            }
        })?;
        serde_json::from_str(&data).map_err(|source| ConfigurationError::ManifestInvalid {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn get(&self, entry_point: &str) -> Option<&ManifestEntry> {
        self.entries.get(entry_point)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// URLs for the bootstrap document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Assets {
    pub scripts: Vec<String>,
    pub styles: Vec<String>,
    pub dev_refresh_url: Option<String>,
}

/// Resolves assets, caching production manifests per bundle directory.
///
/// With `debug` set the manifest is re-read on every call, since a watching
/// build rewrites it between requests.
#[derive(Debug, Default)]
pub struct AssetResolver {
    cache: Mutex<HashMap<PathBuf, Arc<Manifest>>>,
}

impl AssetResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, config: &BridgeConfig) -> Result<Assets, ConfigurationError> {
        // Configuration may be swapped at runtime, so the source is re-checked
        // here rather than trusted from start-up validation.
        match config.asset_source()? {
            AssetSource::Bundle(dir) => {
                let manifest = self.manifest(dir, config.debug)?;
                let entry = manifest.get(&config.entry_point).ok_or_else(|| {
                    ConfigurationError::EntryPointNotFound {
                        entry_point: config.entry_point.clone(),
                        manifest: Manifest::path_in(dir),
                    }
                })?;
                Ok(Assets {
                    scripts: vec![static_url(&config.static_url, &entry.file)],
                    styles: entry
                        .css
                        .iter()
                        .map(|css| static_url(&config.static_url, css))
                        .collect(),
                    dev_refresh_url: None,
                })
            }
            AssetSource::DevServer(url) => {
                let base = url.trim_end_matches('/');
                let entry = config.entry_point.trim_start_matches('/');
                Ok(Assets {
                    scripts: vec![format!("{base}/@vite/client"), format!("{base}/{entry}")],
                    styles: Vec::new(),
                    dev_refresh_url: config
                        .framework
                        .has_refresh_runtime()
                        .then(|| format!("{base}/@react-refresh")),
                })
            }
        }
    }

    /// Drop every cached manifest.
    pub fn clear_cache(&self) {
        self.lock().clear();
    }

    fn manifest(&self, bundle_dir: &Path, debug: bool) -> Result<Arc<Manifest>, ConfigurationError> {
        let path = Manifest::path_in(bundle_dir);
        if debug {
            return Manifest::read(&path).map(Arc::new);
        }
        if let Some(cached) = self.lock().get(&path) {
            return Ok(Arc::clone(cached));
        }
        let manifest = Arc::new(Manifest::read(&path)?);
        tracing::debug!(path = %path.display(), entries = manifest.len(), "loaded asset manifest");
        self.lock().insert(path, Arc::clone(&manifest));
        Ok(manifest)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Arc<Manifest>>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// One-shot resolution without caching.
pub fn resolve_assets(config: &BridgeConfig) -> Result<Assets, ConfigurationError> {
    AssetResolver::new().resolve(config)
}

/// Prefix relative manifest paths with the static URL; absolute paths and
/// full URLs are used as given.
fn static_url(prefix: &str, file: &str) -> String {
    if file.starts_with('/') || file.contains("://") {
        return file.to_string();
    }
    format!("{}/{}", prefix.trim_end_matches('/'), file)
}
