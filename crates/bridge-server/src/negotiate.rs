//! Content negotiation between SPA fetches and browser navigations.
//!
//! The same handler serves both: an SPA fetch (marked with
//! `X-Requested-With: Bridge`) gets the packed action as bare JSON, while a
//! browser navigation gets the bootstrap page with the identical payload
//! embedded. Responses that are not actions pass through untouched.

use crate::bootstrap::{self, BootstrapContext};
use crate::error::AppError;
use crate::state::BridgeState;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::response::Parts;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use bridge_core::action::ActionResponse;
use bridge_core::config::BridgeConfig;
use bridge_core::messages::{FlashMessages, MessageStore};
use http_body::Body as _;
use std::sync::Arc;

/// Request header identifying an SPA-issued fetch.
pub const MARKER_HEADER: &str = "x-requested-with";
pub const MARKER_VALUE: &str = "Bridge";
/// Response header naming the action kind on the JSON path.
pub const ACTION_HEADER: &str = "x-bridge-action";

const EVENT_STREAM: &str = "text/event-stream";

/// Per-request context installed for the [`Bridge`](crate::extract::Bridge)
/// extractor.
#[derive(Clone)]
pub struct BridgeContext {
    pub config: Arc<BridgeConfig>,
    pub messages: Arc<dyn MessageStore>,
}

pub fn is_spa_request(headers: &HeaderMap) -> bool {
    headers
        .get(MARKER_HEADER)
        .is_some_and(|v| v.as_bytes() == MARKER_VALUE.as_bytes())
}

/// Negotiation middleware. Install with
/// `axum::middleware::from_fn_with_state(state, negotiate)`.
pub async fn negotiate(State(state): State<BridgeState>, mut req: Request, next: Next) -> Response {
    let config = state.config().await;
    let spa = is_spa_request(req.headers());

    if req.extensions().get::<FlashMessages>().is_none() {
        req.extensions_mut().insert(FlashMessages::new());
    }
    req.extensions_mut().insert(BridgeContext {
        config: Arc::clone(&config),
        messages: Arc::clone(&state.messages),
    });

    let response = next.run(req).await;
    match process_response(&state, &config, spa, response) {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Decide what the client receives for one request/response pair.
pub fn process_response(
    state: &BridgeState,
    config: &BridgeConfig,
    spa: bool,
    response: Response,
) -> Result<Response, AppError> {
    if response.status() == StatusCode::MOVED_PERMANENTLY {
        tracing::debug!("negotiation: pass-through permanent redirect");
        return Ok(response);
    }

    let (mut parts, body) = response.into_parts();
    let (mut parts, action) = match parts.extensions.remove::<ActionResponse>() {
        Some(action) => (parts, action),
        None => {
            let response = Response::from_parts(parts, body);
            if !spa || response.status() != StatusCode::FOUND || is_streaming(&response) {
                tracing::debug!(status = %response.status(), "negotiation: pass-through");
                return Ok(response);
            }
            let (mut parts, body) = response.into_parts();
            match reinterpret_redirect(&mut parts) {
                Some(action) => (parts, action),
                None => return Ok(Response::from_parts(parts, body)),
            }
        }
    };

    let packed = action.to_wire_form(&state.registry)?;
    apply_transport(&mut parts, &action);

    if spa {
        tracing::debug!(action = %action.kind(), status = %parts.status, "negotiation: json");
        let body = serde_json::to_vec(&packed)?;
        parts
            .headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        parts
            .headers
            .insert(ACTION_HEADER, HeaderValue::from_static(action.kind().as_str()));
        parts
            .headers
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        return Ok(Response::from_parts(parts, Body::from(body)));
    }

    tracing::debug!(action = %action.kind(), status = %parts.status, "negotiation: bootstrap");
    let assets = state.resolver.resolve(config)?;
    let template = state.templates.load(config)?;
    let html = bootstrap::render(
        &template,
        &BootstrapContext {
            initial_response: &packed,
            assets: &assets,
        },
    )?;
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    Ok(Response::from_parts(parts, Body::from(html)))
}

/// Event streams and bodies of unknown length are never rewritten. Only
/// consulted for responses that carry no action; an action replaces the
/// body whatever it was.
fn is_streaming(response: &Response) -> bool {
    let event_stream = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with(EVENT_STREAM));
    event_stream || response.body().size_hint().exact().is_none()
}

/// Turn an ordinary 302 into a redirect action. Cookies set alongside the
/// redirect stay on the response.
fn reinterpret_redirect(parts: &mut Parts) -> Option<ActionResponse> {
    let location = match parts.headers.get(header::LOCATION).map(|v| v.to_str()) {
        Some(Ok(location)) => location.to_string(),
        Some(Err(_)) => {
            tracing::warn!("302 with non-UTF-8 Location left as-is");
            return None;
        }
        None => return None,
    };
    parts.headers.remove(header::LOCATION);
    tracing::debug!(%location, "negotiation: 302 reinterpreted as redirect action");
    Some(ActionResponse::redirect(location))
}

/// Mirror the action's status and cookies onto the transport response.
fn apply_transport(parts: &mut Parts, action: &ActionResponse) {
    parts.status = StatusCode::from_u16(action.status()).unwrap_or(StatusCode::OK);
    let present: Vec<HeaderValue> = parts.headers.get_all(header::SET_COOKIE).iter().cloned().collect();
    for cookie in action.cookies() {
        if let Ok(value) = HeaderValue::from_str(&cookie.to_header_value()) {
            if !present.contains(&value) {
                parts.headers.append(header::SET_COOKIE, value);
            }
        }
    }
    parts.headers.remove(header::CONTENT_LENGTH);
    parts
        .headers
        .append(header::VARY, HeaderValue::from_static("X-Requested-With"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::BridgeResponse;
    use axum::body::Bytes;
    use axum::{middleware, routing::get, Router};
    use bridge_core::cookie::Cookie;
    use std::convert::Infallible;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_app() -> Router {
        let state = BridgeState::new(BridgeConfig::development("http://localhost:5173")).unwrap();
        Router::new()
            .route("/reload", get(|| async { BridgeResponse(ActionResponse::reload()) }))
            .route(
                "/found",
                get(|| async {
                    Response::builder()
                        .status(StatusCode::FOUND)
                        .header(header::LOCATION, "/foo")
                        .header(header::SET_COOKIE, "session=abc; Path=/")
                        .body(Body::empty())
                        .unwrap()
                }),
            )
            .route(
                "/moved",
                get(|| async {
                    Response::builder()
                        .status(StatusCode::MOVED_PERMANENTLY)
                        .header(header::LOCATION, "/new")
                        .body(Body::empty())
                        .unwrap()
                }),
            )
            .route("/plain", get(|| async { "plain" }))
            .route(
                "/streamed-action",
                get(|| async {
                    let body = Body::from_stream(futures::stream::empty::<Result<Bytes, Infallible>>());
                    let mut response = Response::new(body);
                    response.extensions_mut().insert(ActionResponse::reload());
                    response
                }),
            )
            .route(
                "/streamed-found",
                get(|| async {
                    let body = Body::from_stream(futures::stream::empty::<Result<Bytes, Infallible>>());
                    let mut response = Response::new(body);
                    *response.status_mut() = StatusCode::FOUND;
                    response
                        .headers_mut()
                        .insert(header::LOCATION, HeaderValue::from_static("/foo"));
                    response
                }),
            )
            .route(
                "/cookie",
                get(|| async {
                    BridgeResponse(ActionResponse::reload().with_cookie(Cookie::new("k", "v")))
                }),
            )
            .layer(middleware::from_fn_with_state(state, negotiate))
    }

    fn request(uri: &str, spa: bool) -> Request {
        let mut builder = axum::http::Request::builder().uri(uri);
        if spa {
            builder = builder.header("X-Requested-With", MARKER_VALUE);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn marker_must_match_exactly() {
        let mut headers = HeaderMap::new();
        assert!(!is_spa_request(&headers));
        headers.insert(MARKER_HEADER, HeaderValue::from_static("XMLHttpRequest"));
        assert!(!is_spa_request(&headers));
        headers.insert(MARKER_HEADER, HeaderValue::from_static("Bridge"));
        assert!(is_spa_request(&headers));
    }

    #[tokio::test]
    async fn spa_request_gets_json() {
        let resp = test_app().oneshot(request("/reload", true)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[ACTION_HEADER], "reload");
        assert_eq!(resp.headers()[header::CACHE_CONTROL], "no-store");
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({"action": "reload"}));
    }

    #[tokio::test]
    async fn browser_request_gets_bootstrap_page() {
        let resp = test_app().oneshot(request("/reload", false)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get(header::CACHE_CONTROL).is_none());
        assert!(resp.headers().get(ACTION_HEADER).is_none());
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("http://localhost:5173/@vite/client"));
        assert_eq!(
            bootstrap::extract_initial_response(&html).unwrap(),
            serde_json::json!({"action": "reload"})
        );
    }

    #[tokio::test]
    async fn spa_302_becomes_redirect_action() {
        let resp = test_app().oneshot(request("/found", true)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[ACTION_HEADER], "redirect");
        assert!(resp.headers().get(header::LOCATION).is_none());
        assert_eq!(resp.headers()[header::SET_COOKIE], "session=abc; Path=/");
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({"action": "redirect", "path": "/foo"}));
    }

    #[tokio::test]
    async fn browser_302_passes_through() {
        let resp = test_app().oneshot(request("/found", false)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers()[header::LOCATION], "/foo");
    }

    #[tokio::test]
    async fn permanent_redirect_passes_through() {
        for spa in [true, false] {
            let resp = test_app().oneshot(request("/moved", spa)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
            assert_eq!(resp.headers()[header::LOCATION], "/new");
            assert!(resp.headers().get(ACTION_HEADER).is_none());
        }
    }

    #[tokio::test]
    async fn ordinary_response_passes_through() {
        let resp = test_app().oneshot(request("/plain", true)).await.unwrap();
        assert!(resp.headers().get(ACTION_HEADER).is_none());
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"plain");
    }

    #[tokio::test]
    async fn cookies_are_not_duplicated() {
        let resp = test_app().oneshot(request("/cookie", true)).await.unwrap();
        assert_eq!(resp.headers().get_all(header::SET_COOKIE).iter().count(), 1);
        assert_eq!(resp.headers()[header::VARY], "X-Requested-With");
    }

    #[tokio::test]
    async fn action_on_streaming_body_is_negotiated() {
        let resp = test_app().oneshot(request("/streamed-action", true)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[ACTION_HEADER], "reload");
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({"action": "reload"}));
    }

    #[tokio::test]
    async fn streaming_302_passes_through() {
        let resp = test_app().oneshot(request("/streamed-found", true)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers()[header::LOCATION], "/foo");
        assert!(resp.headers().get(ACTION_HEADER).is_none());
    }
}
