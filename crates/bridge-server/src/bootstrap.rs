//! The HTML shell served on first load.
//!
//! Templates are plain HTML with `{{ name }}` placeholders:
//!
//! | placeholder            | expands to                                         |
//! |------------------------|----------------------------------------------------|
//! | `title`                | escaped `metadata.title`                           |
//! | `metadata.<field>`     | escaped metadata field                             |
//! | `styles`               | `<link rel="stylesheet">` per style URL            |
//! | `scripts`              | `<script type="module">` per script URL            |
//! | `dev_refresh`          | refresh-runtime preamble, or nothing               |
//! | `initial_response`     | `<script id="initial-response">` with the payload  |
//!
//! Unknown placeholders are left as written.

use crate::embed;
use bridge_core::assets::Assets;
use bridge_core::config::BridgeConfig;
use bridge_core::error::ConfigurationError;
use bridge_core::messages::escape_html;
use bridge_core::packer::PackedValue;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Element id the client reads the initial payload from.
pub const INITIAL_RESPONSE_ID: &str = "initial-response";

/// Values a bootstrap template is rendered with.
pub struct BootstrapContext<'a> {
    /// The packed action, exactly as the JSON path would deliver it.
    pub initial_response: &'a PackedValue,
    pub assets: &'a Assets,
}

impl BootstrapContext<'_> {
    fn metadata_field(&self, field: &str) -> String {
        match self.initial_response.get("metadata").and_then(|m| m.get(field)) {
            Some(PackedValue::String(s)) => s.clone(),
            Some(PackedValue::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Resolves template identifiers against `template_dirs`, then the built-in
/// templates. Sources are cached unless the config is in debug mode.
#[derive(Debug, Default)]
pub struct TemplateLoader {
    cache: Mutex<HashMap<String, Arc<str>>>,
}

impl TemplateLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, config: &BridgeConfig) -> Result<Arc<str>, ConfigurationError> {
        let name = config.bootstrap_template.as_str();
        if !config.debug {
            if let Some(cached) = self.lock().get(name) {
                return Ok(Arc::clone(cached));
            }
        }
        let source: Arc<str> = find_template(name, config)?.into();
        if !config.debug {
            self.lock().insert(name.to_string(), Arc::clone(&source));
        }
        Ok(source)
    }

    pub fn clear_cache(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<str>>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn find_template(name: &str, config: &BridgeConfig) -> Result<String, ConfigurationError> {
    for dir in &config.template_dirs {
        let path = dir.join(name);
        if path.is_file() {
            tracing::debug!(path = %path.display(), "loading bootstrap template");
            return std::fs::read_to_string(&path)
                .map_err(|_| ConfigurationError::TemplateNotFound(path.display().to_string()));
        }
    }
    embed::builtin_template(name).ok_or_else(|| ConfigurationError::TemplateNotFound(name.to_string()))
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub fn render(template: &str, ctx: &BootstrapContext<'_>) -> Result<String, serde_json::Error> {
    let mut out = String::with_capacity(template.len() + 1024);
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let Some(len) = rest[start + 2..].find("}}") else {
            break;
        };
        let end = start + 2 + len;
        out.push_str(&rest[..start]);
        match expand(rest[start + 2..end].trim(), ctx)? {
            Some(expanded) => out.push_str(&expanded),
            None => out.push_str(&rest[start..end + 2]),
        }
        rest = &rest[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

fn expand(name: &str, ctx: &BootstrapContext<'_>) -> Result<Option<String>, serde_json::Error> {
    let expanded = match name {
        "title" => escape_html(&ctx.metadata_field("title")),
        "styles" => ctx
            .assets
            .styles
            .iter()
            .map(|href| format!(r#"<link rel="stylesheet" href="{}">"#, escape_html(href)))
            .collect::<Vec<_>>()
            .join("\n"),
        "scripts" => ctx
            .assets
            .scripts
            .iter()
            .map(|src| format!(r#"<script type="module" src="{}"></script>"#, escape_html(src)))
            .collect::<Vec<_>>()
            .join("\n"),
        "dev_refresh" => ctx
            .assets
            .dev_refresh_url
            .as_deref()
            .map(refresh_preamble)
            .unwrap_or_default(),
        "initial_response" => json_script(ctx.initial_response, INITIAL_RESPONSE_ID)?,
        other => match other.strip_prefix("metadata.") {
            Some(field) => escape_html(&ctx.metadata_field(field)),
            None => return Ok(None),
        },
    };
    Ok(Some(expanded))
}

/// Installs the refresh runtime before any component module executes.
fn refresh_preamble(url: &str) -> String {
    let url = serde_json::Value::String(url.to_string()).to_string();
    format!(
        concat!(
            "<script type=\"module\">\n",
            "import RefreshRuntime from {url};\n",
            "RefreshRuntime.injectIntoGlobalHook(window);\n",
            "window.$RefreshReg$ = () => {{}};\n",
            "window.$RefreshSig$ = () => (type) => type;\n",
            "window.__vite_plugin_react_preamble_installed__ = true;\n",
            "</script>"
        ),
        url = url
    )
}

/// Embed JSON in a non-executing script element. `<`, `>` and `&` become
/// unicode escapes so the payload cannot close the element early.
fn json_script(value: &PackedValue, id: &str) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(value)?
        .replace('<', "\\u003C")
        .replace('>', "\\u003E")
        .replace('&', "\\u0026");
    Ok(format!(
        r#"<script id="{}" type="application/json">{json}</script>"#,
        escape_html(id)
    ))
}

/// Pull the embedded payload back out of a rendered page.
pub fn extract_initial_response(html: &str) -> Option<PackedValue> {
    let open = format!(r#"<script id="{INITIAL_RESPONSE_ID}" type="application/json">"#);
    let start = html.find(&open)? + open.len();
    let len = html[start..].find("</script>")?;
    serde_json::from_str(&html[start..start + len]).ok()
}
