use axum::body::Body;
use axum::extract::Query;
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use bridge_core::action::RenderOptions;
use bridge_core::metadata::Metadata;
use bridge_core::packer::Packable;
use futures::stream;
use futures::StreamExt as _;
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;

use crate::error::AppError;
use crate::extract::Bridge;
use crate::response::BridgeResponse;

/// GET /: the landing view, stamped with the server time.
pub async fn home(bridge: Bridge) -> Result<BridgeResponse, AppError> {
    let props = Packable::map([
        ("time", Packable::from(chrono::Utc::now())),
        ("navigation_test_url", Packable::from("/navigation")),
    ]);
    Ok(bridge.render_with("Home", props, RenderOptions::new().metadata(Metadata::new("Home")))?)
}

#[derive(Debug, Default, Deserialize)]
pub struct NavigationQuery {
    delay: Option<String>,
    raise_exception: Option<String>,
    no_component: Option<String>,
}

/// GET /navigation: exercises client navigation.
///
/// `?delay` holds the response for five seconds, `?raise_exception` fails the
/// request, `?no_component` renders a view the client has no component for.
pub async fn navigation(
    bridge: Bridge,
    Query(query): Query<NavigationQuery>,
) -> Result<BridgeResponse, AppError> {
    if query.delay.is_some() {
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
    if query.raise_exception.is_some() {
        return Err(AppError(anyhow::anyhow!("simulated failure")));
    }
    if query.no_component.is_some() {
        return Ok(bridge.render("Foo", Packable::Map(Vec::new()))?);
    }
    Ok(bridge.render(
        "Navigation",
        Packable::map([("home_url", Packable::from("/"))]),
    )?)
}

/// GET /overlay: a form shown on top of the current view.
pub async fn overlay(bridge: Bridge) -> Result<BridgeResponse, AppError> {
    Ok(bridge.render_with(
        "EditOverlay",
        Packable::map([("submit_url", Packable::from("/close"))]),
        RenderOptions::new()
            .overlay(true)
            .metadata(Metadata::new("Edit")),
    )?)
}

/// GET|POST /close: dismiss the overlay and report back.
pub async fn close(bridge: Bridge) -> BridgeResponse {
    bridge.messages().success("Changes saved");
    bridge.close_overlay()
}

/// GET /legacy: a plain 302, as issued by code that knows nothing about
/// the protocol.
pub async fn legacy() -> Response {
    Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, "/")
        .body(Body::empty())
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// GET /reload: ask the client to refetch the current view.
pub async fn reload(bridge: Bridge) -> BridgeResponse {
    bridge.reload()
}

/// GET /events: a short event stream; never negotiated.
pub async fn events() -> impl IntoResponse {
    let ticks = stream::iter(1..=3)
        .map(|n| Ok::<Event, Infallible>(Event::default().event("tick").data(n.to_string())));
    Sse::new(ticks).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_query_flags_are_presence_only() {
        let query: NavigationQuery = serde_json::from_value(serde_json::json!({"no_component": ""})).unwrap();
        assert!(query.no_component.is_some());
        assert!(query.delay.is_none());
        assert!(query.raise_exception.is_none());
    }

    #[tokio::test]
    async fn legacy_is_found() {
        let resp = legacy().await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers()[header::LOCATION], "/");
    }
}
