use anyhow::Result;
use bridge_core::config::BridgeConfig;
use bridge_core::packer::Packable;

pub fn run(config: BridgeConfig, port: u16, no_open: bool) -> Result<()> {
    let config = config.with_context_provider("request_path", |parts| Packable::from(parts.uri.path()));

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(bridge_server::serve(config, port, !no_open))
}
