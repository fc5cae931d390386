use crate::error::{AppError, MiddlewareMissing};
use crate::negotiate::{is_spa_request, BridgeContext};
use crate::response::BridgeResponse;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use bridge_core::action::{ActionResponse, RenderOptions, RequestScope};
use bridge_core::config::BridgeConfig;
use bridge_core::error::ConflictingArgumentsError;
use bridge_core::messages::{FlashMessages, Message, MessageStore};
use bridge_core::packer::Packable;
use std::sync::Arc;

/// Handler-side entry point to the protocol.
///
/// ```ignore
/// async fn home(bridge: Bridge) -> Result<BridgeResponse, AppError> {
///     Ok(bridge.render("Home", Packable::map([("greeting", "hi")]))?)
/// }
/// ```
///
/// Only usable on routes wrapped by [`negotiate`](crate::negotiate::negotiate);
/// elsewhere extraction fails with a 500.
pub struct Bridge {
    parts: Parts,
    context: BridgeContext,
    pending: PendingMessages,
}

/// The injected store followed by the request's own queue, so messages
/// added through [`Bridge::messages`] are delivered whatever store is
/// installed. Both drains consume, so nothing is delivered twice.
struct PendingMessages {
    store: Arc<dyn MessageStore>,
    flash: FlashMessages,
}

impl MessageStore for PendingMessages {
    fn drain(&self, parts: &Parts) -> Vec<Message> {
        let mut messages = self.store.drain(parts);
        messages.extend(self.flash.drain());
        messages
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Bridge {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(context) = parts.extensions.get::<BridgeContext>().cloned() else {
            tracing::warn!(path = %parts.uri.path(), "Bridge extractor used without negotiation middleware");
            return Err(AppError(MiddlewareMissing.into()));
        };
        let flash = parts.extensions.get::<FlashMessages>().cloned().unwrap_or_default();
        Ok(Self {
            parts: parts.clone(),
            pending: PendingMessages {
                store: Arc::clone(&context.messages),
                flash,
            },
            context,
        })
    }
}

impl Bridge {
    fn scope(&self) -> RequestScope<'_> {
        RequestScope {
            parts: &self.parts,
            providers: &self.context.config.context_providers,
            messages: &self.pending,
        }
    }

    pub fn render(
        &self,
        view: impl Into<String>,
        props: impl Into<Packable>,
    ) -> Result<BridgeResponse, ConflictingArgumentsError> {
        self.render_with(view, props, RenderOptions::new())
    }

    pub fn render_with(
        &self,
        view: impl Into<String>,
        props: impl Into<Packable>,
        options: RenderOptions,
    ) -> Result<BridgeResponse, ConflictingArgumentsError> {
        ActionResponse::render(&self.scope(), view, props, options).map(BridgeResponse)
    }

    pub fn reload(&self) -> BridgeResponse {
        BridgeResponse(ActionResponse::reload())
    }

    pub fn redirect(&self, path: impl Into<String>) -> BridgeResponse {
        BridgeResponse(ActionResponse::redirect(path))
    }

    pub fn close_overlay(&self) -> BridgeResponse {
        BridgeResponse(ActionResponse::close_overlay(&self.scope()))
    }

    /// The request's flash queue. Messages added here appear in the next
    /// render or close-overlay built for this request.
    pub fn messages(&self) -> &FlashMessages {
        &self.pending.flash
    }

    pub fn config(&self) -> &Arc<BridgeConfig> {
        &self.context.config
    }

    pub fn is_spa_request(&self) -> bool {
        is_spa_request(&self.parts.headers)
    }
}
