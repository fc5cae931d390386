use crate::error::ConfigurationError;
use crate::packer::Packable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_ENTRY_POINT: &str = "src/main.tsx";
pub const DEFAULT_BOOTSTRAP_TEMPLATE: &str = "bridge/bootstrap.html";
pub const DEFAULT_STATIC_URL: &str = "/static/";

// ---------------------------------------------------------------------------
// Framework
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framework {
    #[default]
    React,
    Vue,
}

impl Framework {
    pub fn as_str(self) -> &'static str {
        match self {
            Framework::React => "react",
            Framework::Vue => "vue",
        }
    }

    /// Whether the dev server exposes a refresh runtime that the bootstrap
    /// page has to install before the entry point loads.
    pub fn has_refresh_runtime(self) -> bool {
        matches!(self, Framework::React)
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Framework {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "react" => Ok(Framework::React),
            "vue" => Ok(Framework::Vue),
            other => Err(format!("unknown framework '{other}' (expected react or vue)")),
        }
    }
}

// ---------------------------------------------------------------------------
// BridgeSettings: the on-disk shape
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeSettings {
    #[serde(default)]
    pub framework: Framework,
    #[serde(default = "default_entry_point")]
    pub entry_point: String,
    /// Production: directory holding the built bundle and its manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_dir: Option<PathBuf>,
    /// Development: origin of the live dev server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_server_url: Option<String>,
    #[serde(default = "default_bootstrap_template")]
    pub bootstrap_template: String,
    /// Searched, in order, before the built-in templates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub template_dirs: Vec<PathBuf>,
    /// Prefix for relative manifest entries.
    #[serde(default = "default_static_url")]
    pub static_url: String,
    /// Re-read the manifest on every request instead of caching it.
    #[serde(default)]
    pub debug: bool,
}

fn default_entry_point() -> String {
    DEFAULT_ENTRY_POINT.to_string()
}

fn default_bootstrap_template() -> String {
    DEFAULT_BOOTSTRAP_TEMPLATE.to_string()
}

fn default_static_url() -> String {
    DEFAULT_STATIC_URL.to_string()
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            framework: Framework::default(),
            entry_point: default_entry_point(),
            bundle_dir: None,
            dev_server_url: None,
            bootstrap_template: default_bootstrap_template(),
            template_dirs: Vec::new(),
            static_url: default_static_url(),
            debug: false,
        }
    }
}

impl BridgeSettings {
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let data =
            std::fs::read_to_string(path).map_err(|source| ConfigurationError::SettingsUnreadable {
                path: path.to_path_buf(),
                source,
            })?;
        serde_yaml::from_str(&data).map_err(|source| ConfigurationError::SettingsInvalid {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// Context providers
// ---------------------------------------------------------------------------

/// Produces one named entry of the render context from the current request.
pub type ContextProvider = Arc<dyn Fn(&http::request::Parts) -> Packable + Send + Sync>;

/// Named providers, kept in registration order.
#[derive(Clone, Default)]
pub struct ContextProviders(Vec<(String, ContextProvider)>);

impl ContextProviders {
    /// Add a provider. Re-registering a name replaces it in place.
    pub fn insert<F>(&mut self, name: impl Into<String>, provider: F)
    where
        F: Fn(&http::request::Parts) -> Packable + Send + Sync + 'static,
    {
        let name = name.into();
        let provider: ContextProvider = Arc::new(provider);
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = provider,
            None => self.0.push((name, provider)),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Invoke every provider, in registration order.
    pub fn gather(&self, parts: &http::request::Parts) -> Vec<(String, Packable)> {
        self.0
            .iter()
            .map(|(name, provider)| (name.clone(), provider(parts)))
            .collect()
    }
}

impl fmt::Debug for ContextProviders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

// ---------------------------------------------------------------------------
// BridgeConfig: validated runtime configuration
// ---------------------------------------------------------------------------

/// Where the bootstrap page loads its assets from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetSource<'a> {
    Bundle(&'a Path),
    DevServer(&'a str),
}

/// Immutable once built; shared by reference across requests.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub framework: Framework,
    pub entry_point: String,
    pub bundle_dir: Option<PathBuf>,
    pub dev_server_url: Option<String>,
    pub bootstrap_template: String,
    pub template_dirs: Vec<PathBuf>,
    pub static_url: String,
    pub debug: bool,
    pub context_providers: ContextProviders,
}

impl BridgeConfig {
    pub fn from_settings(settings: BridgeSettings) -> Result<Self, ConfigurationError> {
        let config = Self {
            framework: settings.framework,
            entry_point: settings.entry_point,
            bundle_dir: settings.bundle_dir,
            dev_server_url: settings.dev_server_url.filter(|u| !u.trim().is_empty()),
            bootstrap_template: settings.bootstrap_template,
            template_dirs: settings.template_dirs,
            static_url: settings.static_url,
            debug: settings.debug,
            context_providers: ContextProviders::default(),
        };
        config.asset_source()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        Self::from_settings(BridgeSettings::load(path)?)
    }

    /// Production configuration reading the manifest under `bundle_dir`.
    pub fn production(bundle_dir: impl Into<PathBuf>) -> Self {
        Self::with_source(Some(bundle_dir.into()), None)
    }

    /// Development configuration loading assets from a live dev server.
    pub fn development(dev_server_url: impl Into<String>) -> Self {
        Self::with_source(None, Some(dev_server_url.into()))
    }

    fn with_source(bundle_dir: Option<PathBuf>, dev_server_url: Option<String>) -> Self {
        let defaults = BridgeSettings::default();
        Self {
            framework: defaults.framework,
            entry_point: defaults.entry_point,
            bundle_dir,
            dev_server_url,
            bootstrap_template: defaults.bootstrap_template,
            template_dirs: defaults.template_dirs,
            static_url: defaults.static_url,
            debug: defaults.debug,
            context_providers: ContextProviders::default(),
        }
    }

    pub fn with_framework(mut self, framework: Framework) -> Self {
        self.framework = framework;
        self
    }

    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = entry_point.into();
        self
    }

    pub fn with_bootstrap_template(mut self, template: impl Into<String>) -> Self {
        self.bootstrap_template = template.into();
        self
    }

    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dirs.push(dir.into());
        self
    }

    pub fn with_static_url(mut self, static_url: impl Into<String>) -> Self {
        self.static_url = static_url.into();
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_context_provider<F>(mut self, name: impl Into<String>, provider: F) -> Self
    where
        F: Fn(&http::request::Parts) -> Packable + Send + Sync + 'static,
    {
        self.context_providers.insert(name, provider);
        self
    }

    /// Exactly one of `bundle_dir` / `dev_server_url` must be set.
    pub fn asset_source(&self) -> Result<AssetSource<'_>, ConfigurationError> {
        match (&self.bundle_dir, &self.dev_server_url) {
            (Some(dir), None) => Ok(AssetSource::Bundle(dir)),
            (None, Some(url)) => Ok(AssetSource::DevServer(url)),
            (None, None) => Err(ConfigurationError::MissingAssetSource),
            (Some(_), Some(_)) => Err(ConfigurationError::AmbiguousAssetSource),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
