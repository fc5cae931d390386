use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bridge_core::error::{
    BridgeError, ConfigurationError, ConflictingArgumentsError, SerializationError,
};

/// A handler asked for the [`Bridge`](crate::extract::Bridge) extractor on a
/// route that is not wrapped by the negotiation middleware.
#[derive(Debug, thiserror::Error)]
#[error("bridge middleware is not installed on this route")]
pub struct MiddlewareMissing;

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
///
/// Every error this crate produces is a deployment or programming error, so
/// end users get a generic 500 and the details go to the log.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Short label for the log line.
    fn kind(&self) -> &'static str {
        if let Some(e) = self.0.downcast_ref::<BridgeError>() {
            return match e {
                BridgeError::Configuration(_) => "configuration",
                BridgeError::Serialization(_) => "serialization",
                BridgeError::ConflictingArguments(_) => "conflicting arguments",
            };
        }
        if self.0.downcast_ref::<ConfigurationError>().is_some() {
            "configuration"
        } else if self.0.downcast_ref::<SerializationError>().is_some() {
            "serialization"
        } else if self.0.downcast_ref::<ConflictingArgumentsError>().is_some() {
            "conflicting arguments"
        } else if self.0.downcast_ref::<MiddlewareMissing>().is_some() {
            "middleware missing"
        } else {
            "internal"
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::error!(kind = self.kind(), error = %format!("{:#}", self.0), "request aborted");
        let body = serde_json::json!({ "error": "internal server error" });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_core::error::SerializationFailure;
    use http_body_util::BodyExt;

    #[test]
    fn configuration_error_maps_to_500() {
        let err = AppError(ConfigurationError::MissingAssetSource.into());
        assert_eq!(err.kind(), "configuration");
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn serialization_error_maps_to_500() {
        let err = AppError(
            SerializationError {
                path: "props.user".into(),
                type_name: "User".into(),
                reason: SerializationFailure::NoAdapter,
            }
            .into(),
        );
        assert_eq!(err.kind(), "serialization");
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn umbrella_error_is_classified() {
        let err = AppError(BridgeError::ConflictingArguments(ConflictingArgumentsError("x".into())).into());
        assert_eq!(err.kind(), "conflicting arguments");
    }

    #[test]
    fn missing_middleware_kind() {
        assert_eq!(AppError(MiddlewareMissing.into()).kind(), "middleware missing");
    }

    #[tokio::test]
    async fn body_does_not_leak_details() {
        let err = AppError(
            ConfigurationError::TemplateNotFound("secret/path.html".into()).into(),
        );
        let response = err.into_response();
        let ct = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .expect("should have content-type");
        assert!(ct.to_str().unwrap().contains("application/json"));
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "internal server error");
    }
}
