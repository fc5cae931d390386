pub mod bootstrap;
pub mod embed;
pub mod error;
pub mod extract;
pub mod negotiate;
pub mod response;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::{middleware, Router};
use bridge_core::config::BridgeConfig;
use bridge_core::error::ConfigurationError;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use error::AppError;
pub use extract::Bridge;
pub use negotiate::negotiate;
pub use response::BridgeResponse;
pub use state::BridgeState;

/// Wrap `router` in the negotiation middleware.
pub fn with_bridge(router: Router, state: BridgeState) -> Router {
    router.layer(middleware::from_fn_with_state(state, negotiate))
}

/// Build the demo application: the negotiated pages, the production bundle
/// under `static_url` when one is configured, and request tracing.
/// Used by `serve()` and available for integration testing.
pub fn build_router(config: BridgeConfig) -> Result<Router, ConfigurationError> {
    // A static_url on another origin is served by someone else.
    let static_mount = config
        .bundle_dir
        .clone()
        .map(|dir| (config.static_url.trim_end_matches('/').to_string(), dir))
        .filter(|(prefix, _)| prefix.is_empty() || prefix.starts_with('/'));
    let state = BridgeState::new(config)?;

    let pages = Router::new()
        .route("/", get(routes::pages::home))
        .route("/navigation", get(routes::pages::navigation))
        .route("/overlay", get(routes::pages::overlay))
        .route("/close", get(routes::pages::close).post(routes::pages::close))
        .route("/legacy", get(routes::pages::legacy))
        .route("/reload", get(routes::pages::reload))
        .route("/events", get(routes::pages::events));
    let mut app = with_bridge(pages, state);

    if let Some((prefix, dir)) = static_mount {
        let files = ServeDir::new(dir);
        app = if prefix.is_empty() {
            app.fallback_service(files)
        } else {
            app.nest_service(&prefix, files)
        };
    }

    Ok(app.layer(TraceLayer::new_for_http()))
}

/// Start the demo server.
///
/// In development, run the bundler's dev server alongside (its URL goes in
/// `dev_server_url`); in production, point `bundle_dir` at the build output.
pub async fn serve(config: BridgeConfig, port: u16, open_browser: bool) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(config, listener, open_browser).await
}

/// Start the demo server on a pre-bound listener.
///
/// Unlike `serve`, this accepts a `TcpListener` that was already bound so the
/// caller can read the actual port before starting (useful when `port = 0` and
/// the OS picks a free port).
pub async fn serve_on(
    config: BridgeConfig,
    listener: tokio::net::TcpListener,
    open_browser: bool,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(config)?;

    tracing::info!("bridge server listening on http://localhost:{actual_port}");

    if open_browser {
        let url = format!("http://localhost:{actual_port}");
        let _ = open::that(&url);
    }

    axum::serve(listener, app).await?;
    Ok(())
}
