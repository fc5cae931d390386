use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bridge_core::action::ActionResponse;

/// Handler return type for an [`ActionResponse`].
///
/// The body is left empty: the negotiation middleware finds the action in
/// the response extensions and writes either the JSON form or the bootstrap
/// page. Without the middleware the client receives an empty response, which
/// is why the [`Bridge`](crate::extract::Bridge) extractor refuses to run on
/// unwrapped routes.
#[derive(Debug, Clone)]
pub struct BridgeResponse(pub ActionResponse);

impl From<ActionResponse> for BridgeResponse {
    fn from(response: ActionResponse) -> Self {
        Self(response)
    }
}

impl IntoResponse for BridgeResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status()).unwrap_or(StatusCode::OK);
        let mut response = Response::new(Body::empty());
        *response.status_mut() = status;
        for cookie in self.0.cookies() {
            match HeaderValue::from_str(&cookie.to_header_value()) {
                Ok(value) => {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(_) => tracing::warn!(cookie = %cookie.name, "dropping cookie with invalid header value"),
            }
        }
        response.extensions_mut().insert(self.0);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_core::action::ActionKind;
    use bridge_core::cookie::Cookie;

    #[test]
    fn carries_action_status_and_cookies() {
        let response = BridgeResponse(
            ActionResponse::redirect("/next")
                .with_status(201)
                .with_cookie(Cookie::new("a", "1"))
                .with_cookie(Cookie::new("b", "2").http_only()),
        )
        .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        let cookies: Vec<_> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies[1].contains("HttpOnly"));
        let action = response.extensions().get::<ActionResponse>().unwrap();
        assert_eq!(action.kind(), ActionKind::Redirect);
    }

    #[test]
    fn invalid_status_falls_back_to_ok() {
        let response = BridgeResponse(ActionResponse::reload().with_status(42)).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
