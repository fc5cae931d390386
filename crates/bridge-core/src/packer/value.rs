use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Key under which adapters store the client-side type discriminator.
pub const TYPE_TAG_KEY: &str = "__type";

pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A value whose runtime type has no direct JSON form and must go through a
/// registered adapter.
pub trait NativeValue: AsAny + fmt::Debug + Send + Sync {
    /// Registry keys, most specific first. The packer uses the adapter of the
    /// first key that has one.
    fn type_keys(&self) -> &'static [&'static str];

    /// Human-readable type name for error reports.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Plain text rendering, for values that declare the `text` capability.
    fn as_text(&self) -> Option<String> {
        None
    }
}

/// Input tree handed to the packer.
///
/// Everything except [`Packable::Native`] and non-finite floats is already
/// JSON-safe and passes through structurally.
#[derive(Debug, Clone)]
pub enum Packable {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    List(Vec<Packable>),
    /// Insertion-ordered entries. Duplicate keys: the last one wins.
    Map(Vec<(String, Packable)>),
    Json(serde_json::Value),
    Native(Arc<dyn NativeValue>),
}

impl Packable {
    pub fn native(value: impl NativeValue + 'static) -> Self {
        Packable::Native(Arc::new(value))
    }

    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Packable>,
        I: IntoIterator<Item = (K, V)>,
    {
        Packable::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// An adapter-style object: `{"__type": tag, ...fields}`.
    pub fn tagged<K, V, I>(tag: &str, fields: I) -> Self
    where
        K: Into<String>,
        V: Into<Packable>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut entries = vec![(TYPE_TAG_KEY.to_string(), Packable::String(tag.into()))];
        entries.extend(fields.into_iter().map(|(k, v)| (k.into(), v.into())));
        Packable::Map(entries)
    }

    /// Capture any `Serialize` value as an already JSON-safe subtree.
    pub fn serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Packable::Json)
    }

    /// Look up a key on a map value. Later entries shadow earlier ones.
    pub fn get(&self, key: &str) -> Option<&Packable> {
        match self {
            Packable::Map(entries) => entries.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl From<()> for Packable {
    fn from(_: ()) -> Self {
        Packable::Null
    }
}

impl From<bool> for Packable {
    fn from(v: bool) -> Self {
        Packable::Bool(v)
    }
}

macro_rules! from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Packable {
            fn from(v: $t) -> Self {
                Packable::Int(v as i64)
            }
        })*
    };
}

macro_rules! from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Packable {
            fn from(v: $t) -> Self {
                Packable::UInt(v as u64)
            }
        })*
    };
}

from_signed!(i8, i16, i32, i64, isize);
from_unsigned!(u8, u16, u32, u64, usize);

impl From<f32> for Packable {
    fn from(v: f32) -> Self {
        Packable::Float(v as f64)
    }
}

impl From<f64> for Packable {
    fn from(v: f64) -> Self {
        Packable::Float(v)
    }
}

impl From<&str> for Packable {
    fn from(v: &str) -> Self {
        Packable::String(v.to_string())
    }
}

impl From<String> for Packable {
    fn from(v: String) -> Self {
        Packable::String(v)
    }
}

impl From<serde_json::Value> for Packable {
    fn from(v: serde_json::Value) -> Self {
        Packable::Json(v)
    }
}

impl<T: Into<Packable>> From<Vec<T>> for Packable {
    fn from(v: Vec<T>) -> Self {
        Packable::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Packable>> From<Option<T>> for Packable {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Packable::Null)
    }
}

impl From<Arc<dyn NativeValue>> for Packable {
    fn from(v: Arc<dyn NativeValue>) -> Self {
        Packable::Native(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_puts_type_first() {
        let p = Packable::tagged("point", [("x", 1), ("y", 2)]);
        let Packable::Map(entries) = p else {
            panic!("expected map")
        };
        assert_eq!(entries[0].0, TYPE_TAG_KEY);
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn get_prefers_last_duplicate() {
        let p = Packable::map([("a", 1), ("a", 2)]);
        assert!(matches!(p.get("a"), Some(Packable::Int(2))));
        assert!(p.get("b").is_none());
    }

    #[test]
    fn option_none_is_null() {
        let p: Packable = Option::<i32>::None.into();
        assert!(matches!(p, Packable::Null));
    }
}
