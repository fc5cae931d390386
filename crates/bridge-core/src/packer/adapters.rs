//! Built-in adapters and the framework-native string wrappers they cover.
//!
//! Client reconstruction rules for the tagged forms:
//! - `{"__type": "datetime", "value": <RFC 3339>}` → `Date`
//! - `{"__type": "date", "value": "YYYY-MM-DD"}` → calendar date
//!
//! UUIDs and text-like values pack to plain strings.

use super::{AdapterRegistry, NativeValue, Packable};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

pub const DATETIME: &str = "datetime";
pub const DATE: &str = "date";
pub const UUID: &str = "uuid";
pub const SAFE_STRING: &str = "safe_string";
pub const LAZY_TEXT: &str = "lazy_text";
/// Capability key shared by every value that can render itself as text.
pub const TEXT: &str = "text";

impl NativeValue for DateTime<Utc> {
    fn type_keys(&self) -> &'static [&'static str] {
        &[DATETIME]
    }
}

impl NativeValue for NaiveDate {
    fn type_keys(&self) -> &'static [&'static str] {
        &[DATE]
    }
}

impl NativeValue for Uuid {
    fn type_keys(&self) -> &'static [&'static str] {
        &[UUID]
    }
}

/// A string already escaped for HTML. Emitted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SafeString(String);

impl SafeString {
    pub fn new(html: impl Into<String>) -> Self {
        Self(html.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SafeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl NativeValue for SafeString {
    fn type_keys(&self) -> &'static [&'static str] {
        &[SAFE_STRING, TEXT]
    }

    fn as_text(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Text whose content is produced at pack time, e.g. a translation looked up
/// in the active locale.
#[derive(Clone)]
pub struct LazyText(Arc<dyn Fn() -> String + Send + Sync>);

impl LazyText {
    pub fn new(f: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn resolve(&self) -> String {
        (self.0)()
    }
}

impl fmt::Debug for LazyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LazyText(..)")
    }
}

impl NativeValue for LazyText {
    fn type_keys(&self) -> &'static [&'static str] {
        &[LAZY_TEXT, TEXT]
    }

    fn as_text(&self) -> Option<String> {
        Some(self.resolve())
    }
}

impl From<DateTime<Utc>> for Packable {
    fn from(v: DateTime<Utc>) -> Self {
        Packable::native(v)
    }
}

impl From<NaiveDate> for Packable {
    fn from(v: NaiveDate) -> Self {
        Packable::native(v)
    }
}

impl From<Uuid> for Packable {
    fn from(v: Uuid) -> Self {
        Packable::native(v)
    }
}

impl From<SafeString> for Packable {
    fn from(v: SafeString) -> Self {
        Packable::native(v)
    }
}

impl From<LazyText> for Packable {
    fn from(v: LazyText) -> Self {
        Packable::native(v)
    }
}

pub(super) fn register_defaults(registry: &mut AdapterRegistry) {
    registry
        .register_type::<DateTime<Utc>, _>(DATETIME, |dt| {
            Packable::tagged(
                DATETIME,
                [("value", dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))],
            )
        })
        .register_type::<NaiveDate, _>(DATE, |d| {
            Packable::tagged(DATE, [("value", d.format("%Y-%m-%d").to_string())])
        })
        .register_type::<Uuid, _>(UUID, |u| Packable::String(u.to_string()))
        .register(TEXT, |value| {
            value
                .as_text()
                .map(Packable::String)
                .ok_or_else(|| format!("{} has no text form", value.type_name()))
        });
}
