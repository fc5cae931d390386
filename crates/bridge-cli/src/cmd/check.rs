use crate::output::print_json;
use anyhow::Result;
use bridge_core::assets::resolve_assets;
use bridge_core::config::{AssetSource, BridgeConfig};
use bridge_server::bootstrap::TemplateLoader;
use serde::Serialize;

#[derive(Serialize)]
struct Report {
    source: &'static str,
    location: String,
    framework: &'static str,
    entry_point: String,
    template: String,
    scripts: usize,
    styles: usize,
}

/// Resolve everything a bootstrap page needs, so a broken deployment fails
/// here instead of on the first page view.
pub fn run(config: &BridgeConfig, json: bool) -> Result<()> {
    let (source, location) = match config.asset_source()? {
        AssetSource::Bundle(dir) => ("bundle", dir.display().to_string()),
        AssetSource::DevServer(url) => ("dev-server", url.to_string()),
    };
    let assets = resolve_assets(config)?;
    TemplateLoader::new().load(config)?;

    let report = Report {
        source,
        location,
        framework: config.framework.as_str(),
        entry_point: config.entry_point.clone(),
        template: config.bootstrap_template.clone(),
        scripts: assets.scripts.len(),
        styles: assets.styles.len(),
    };
    if json {
        return print_json(&report);
    }
    println!(
        "ok: {} {} ({}), entry {} -> {} script(s), {} style(s), template {}",
        report.source,
        report.location,
        report.framework,
        report.entry_point,
        report.scripts,
        report.styles,
        report.template
    );
    Ok(())
}
