use crate::output::{print_json, print_table};
use anyhow::Result;
use bridge_core::assets::{resolve_assets, Assets};
use bridge_core::config::BridgeConfig;

pub fn run(config: &BridgeConfig, json: bool) -> Result<()> {
    let assets = resolve_assets(config)?;
    if json {
        return print_json(&assets);
    }
    print_table(&["KIND", "URL"], rows(&assets));
    Ok(())
}

fn rows(assets: &Assets) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    if let Some(url) = &assets.dev_refresh_url {
        rows.push(vec!["refresh".to_string(), url.clone()]);
    }
    rows.extend(assets.styles.iter().map(|url| vec!["style".to_string(), url.clone()]));
    rows.extend(assets.scripts.iter().map(|url| vec!["script".to_string(), url.clone()]));
    rows
}
