use anyhow::{Context, Result};
use bridge_core::config::{BridgeConfig, BridgeSettings};
use std::path::{Path, PathBuf};

/// Asset-source flags. Either one selects its source outright, so a flag
/// clears whatever the config file set for the other.
#[derive(Debug, Default)]
pub struct Overrides {
    pub bundle_dir: Option<PathBuf>,
    pub dev_server_url: Option<String>,
}

pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<BridgeConfig> {
    let mut settings = match path {
        Some(path) => {
            let mut settings = BridgeSettings::load(path)?;
            anchor_paths(&mut settings, path.parent().unwrap_or(Path::new(".")));
            settings
        }
        None => BridgeSettings::default(),
    };
    apply(&mut settings, overrides);
    BridgeConfig::from_settings(settings).context("invalid bridge configuration")
}

fn apply(settings: &mut BridgeSettings, overrides: Overrides) {
    match (overrides.bundle_dir, overrides.dev_server_url) {
        (None, None) => {}
        (bundle_dir, dev_server_url) => {
            settings.bundle_dir = bundle_dir;
            settings.dev_server_url = dev_server_url;
        }
    }
}

/// Relative paths in a config file are relative to that file.
fn anchor_paths(settings: &mut BridgeSettings, base: &Path) {
    if let Some(dir) = settings.bundle_dir.as_mut() {
        if dir.is_relative() {
            *dir = base.join(&*dir);
        }
    }
    for dir in settings.template_dirs.iter_mut() {
        if dir.is_relative() {
            *dir = base.join(&*dir);
        }
    }
}
