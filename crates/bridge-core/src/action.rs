//! The closed set of server-to-client actions and their shared contract.
//!
//! Every variant serializes to `{"action": <kind>, ...fields}` via
//! [`ActionResponse::to_wire_form`]. That single packed value is what both
//! delivery modes carry, so the client sees the same payload whether it
//! arrives as bare JSON or embedded in the bootstrap page.

use crate::config::ContextProviders;
use crate::cookie::Cookie;
use crate::error::{ConflictingArgumentsError, SerializationError};
use crate::messages::{pack_messages, Message, MessageStore};
use crate::metadata::Metadata;
use crate::packer::{AdapterRegistry, PackedValue, Packable};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    Render,
    Reload,
    Redirect,
    CloseOverlay,
}

impl ActionKind {
    pub fn all() -> &'static [ActionKind] {
        &[
            ActionKind::Render,
            ActionKind::Reload,
            ActionKind::Redirect,
            ActionKind::CloseOverlay,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Render => "render",
            ActionKind::Reload => "reload",
            ActionKind::Redirect => "redirect",
            ActionKind::CloseOverlay => "close-overlay",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionKind::all()
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown action '{s}'"))
    }
}

// ---------------------------------------------------------------------------
// Request scope
// ---------------------------------------------------------------------------

/// What a render needs from the current request: the request itself for the
/// context providers, and the flash-message store to drain.
pub struct RequestScope<'a> {
    pub parts: &'a http::request::Parts,
    pub providers: &'a ContextProviders,
    pub messages: &'a dyn MessageStore,
}

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    overlay: bool,
    title: Option<String>,
    metadata: Option<Metadata>,
    status: Option<u16>,
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn overlay(mut self, overlay: bool) -> Self {
        self.overlay = overlay;
        self
    }

    #[deprecated(note = "pass `Metadata` via `metadata()` instead")]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// Render `view` on the client with `props`.
#[derive(Debug, Clone)]
pub struct RenderAction {
    pub view: String,
    pub props: Packable,
    pub overlay: bool,
    pub metadata: Metadata,
    /// Provider name → value, in registration order.
    pub context: Vec<(String, Packable)>,
    pub messages: Vec<Message>,
}

impl RenderAction {
    /// Validate arguments, run the context providers and drain pending
    /// flash messages for the request.
    pub fn new(
        scope: &RequestScope<'_>,
        view: impl Into<String>,
        props: impl Into<Packable>,
        options: &RenderOptions,
    ) -> Result<Self, ConflictingArgumentsError> {
        let title = options.title.as_deref().filter(|t| !t.is_empty());
        let metadata = match (&options.metadata, title) {
            (Some(_), Some(_)) => {
                return Err(ConflictingArgumentsError(
                    "title and metadata cannot both be provided".into(),
                ))
            }
            (Some(metadata), None) => metadata.clone(),
            (None, Some(title)) => {
                tracing::warn!("render title argument is deprecated; use metadata instead");
                Metadata::new(title)
            }
            (None, None) => Metadata::default(),
        };
        Ok(Self {
            view: view.into(),
            props: props.into(),
            overlay: options.overlay,
            metadata,
            context: scope.providers.gather(scope.parts),
            messages: scope.messages.drain(scope.parts),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectAction {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseOverlayAction {
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone)]
pub enum Action {
    Render(RenderAction),
    Reload,
    Redirect(RedirectAction),
    CloseOverlay(CloseOverlayAction),
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Render(_) => ActionKind::Render,
            Action::Reload => ActionKind::Reload,
            Action::Redirect(_) => ActionKind::Redirect,
            Action::CloseOverlay(_) => ActionKind::CloseOverlay,
        }
    }

    /// `{"action": kind, ...variant fields}`, ready for packing.
    pub fn data(&self) -> Packable {
        let mut entries = vec![(
            "action".to_string(),
            Packable::from(self.kind().as_str()),
        )];
        match self {
            Action::Render(r) => {
                entries.push(("view".into(), Packable::from(r.view.clone())));
                entries.push(("overlay".into(), Packable::from(r.overlay)));
                entries.push(("metadata".into(), Packable::from(&r.metadata)));
                entries.push(("props".into(), r.props.clone()));
                entries.push(("context".into(), Packable::Map(r.context.clone())));
                entries.push(("messages".into(), pack_messages(&r.messages)));
            }
            Action::Reload => {}
            Action::Redirect(r) => {
                entries.push(("path".into(), Packable::from(r.path.clone())));
            }
            Action::CloseOverlay(c) => {
                entries.push(("messages".into(), pack_messages(&c.messages)));
            }
        }
        Packable::Map(entries)
    }
}

// ---------------------------------------------------------------------------
// ActionResponse
// ---------------------------------------------------------------------------

/// An action plus its transport attributes. The action is fixed at
/// construction; only status and cookies can be set afterwards.
#[derive(Debug, Clone)]
pub struct ActionResponse {
    action: Action,
    status: u16,
    cookies: Vec<Cookie>,
}

impl ActionResponse {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            status: 200,
            cookies: Vec::new(),
        }
    }

    pub fn render(
        scope: &RequestScope<'_>,
        view: impl Into<String>,
        props: impl Into<Packable>,
        options: RenderOptions,
    ) -> Result<Self, ConflictingArgumentsError> {
        let render = RenderAction::new(scope, view, props, &options)?;
        let response = Self::new(Action::Render(render));
        Ok(match options.status {
            Some(status) => response.with_status(status),
            None => response,
        })
    }

    pub fn reload() -> Self {
        Self::new(Action::Reload)
    }

    pub fn redirect(path: impl Into<String>) -> Self {
        Self::new(Action::Redirect(RedirectAction { path: path.into() }))
    }

    pub fn close_overlay(scope: &RequestScope<'_>) -> Self {
        Self::new(Action::CloseOverlay(CloseOverlayAction {
            messages: scope.messages.drain(scope.parts),
        }))
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn kind(&self) -> ActionKind {
        self.action.kind()
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    pub fn data(&self) -> Packable {
        self.action.data()
    }

    /// The packed payload. Compute once per response and reuse it for
    /// whichever delivery mode applies.
    pub fn to_wire_form(&self, registry: &AdapterRegistry) -> Result<PackedValue, SerializationError> {
        registry.pack(&self.data())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
