use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::packer::Packable;

/// Page-level metadata attached to a render action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    /// Additional fields, flattened next to `title` on the wire.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Metadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            extra: BTreeMap::new(),
        }
    }

    /// Builder: add an extra metadata field.
    ///
    /// `title` is never stored as an extra field: a string value replaces
    /// the title, anything else is dropped.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        let key = key.into();
        let value = value.into();
        if key == "title" {
            match value {
                serde_json::Value::String(title) => self.title = title,
                other => tracing::debug!(value = %other, "ignoring non-string metadata title"),
            }
            return self;
        }
        self.extra.insert(key, value);
        self
    }
}

impl From<&Metadata> for Packable {
    fn from(m: &Metadata) -> Self {
        let mut entries = vec![("title".to_string(), Packable::String(m.title.clone()))];
        entries.extend(
            m.extra
                .iter()
                .filter(|(k, _)| k.as_str() != "title")
                .map(|(k, v)| (k.clone(), Packable::Json(v.clone()))),
        );
        Packable::Map(entries)
    }
}
