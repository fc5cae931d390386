//! Adapter-driven conversion of arbitrary value trees into JSON-safe form.
//!
//! Values that are already JSON-safe pass through structurally. Anything
//! else is a [`NativeValue`], which declares an ordered list of registry
//! keys; the first key with a registered adapter converts it, and the
//! adapter's output is packed again. A value nobody can adapt fails the
//! whole pack with a [`SerializationError`] naming the field path.

pub mod adapters;
mod value;

pub use adapters::{LazyText, SafeString};
pub use value::{AsAny, NativeValue, Packable, TYPE_TAG_KEY};

use crate::error::{SerializationError, SerializationFailure};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The JSON-safe output tree.
pub type PackedValue = serde_json::Value;

/// Converts one native value into a packable (possibly tagged) structure.
pub type Adapter = Arc<dyn Fn(&dyn NativeValue) -> Result<Packable, String> + Send + Sync>;

/// Upper bound on adapters feeding native values into further adapters.
const MAX_ADAPTER_DEPTH: usize = 16;

/// Process-wide adapter table. Populate at start-up, then share read-only.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Adapter>,
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("AdapterRegistry").field("keys", &keys).finish()
    }
}

impl AdapterRegistry {
    /// An empty registry. Only JSON-safe values can be packed.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in adapters (timestamps, dates, UUIDs, text).
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        adapters::register_defaults(&mut registry);
        registry
    }

    /// Register (or replace) the adapter for `key`.
    pub fn register<F>(&mut self, key: impl Into<String>, adapter: F) -> &mut Self
    where
        F: Fn(&dyn NativeValue) -> Result<Packable, String> + Send + Sync + 'static,
    {
        self.adapters.insert(key.into(), Arc::new(adapter));
        self
    }

    /// Register an adapter for one concrete type. Values reaching this key
    /// with a different concrete type are rejected.
    pub fn register_type<T, F>(&mut self, key: impl Into<String>, adapter: F) -> &mut Self
    where
        T: NativeValue + 'static,
        F: Fn(&T) -> Packable + Send + Sync + 'static,
    {
        let key = key.into();
        let expected = key.clone();
        self.register(key, move |value: &dyn NativeValue| {
            match value.as_any().downcast_ref::<T>() {
                Some(v) => Ok(adapter(v)),
                None => Err(format!(
                    "adapter `{expected}` expects {}",
                    std::any::type_name::<T>()
                )),
            }
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.adapters.contains_key(key)
    }

    /// Pack a value tree. Deterministic and side-effect free.
    pub fn pack(&self, value: &Packable) -> Result<PackedValue, SerializationError> {
        let mut path = FieldPath::default();
        self.pack_at(value, &mut path, 0)
    }

    fn pack_at(
        &self,
        value: &Packable,
        path: &mut FieldPath,
        depth: usize,
    ) -> Result<PackedValue, SerializationError> {
        match value {
            Packable::Null => Ok(PackedValue::Null),
            Packable::Bool(b) => Ok(PackedValue::Bool(*b)),
            Packable::Int(n) => Ok(PackedValue::from(*n)),
            Packable::UInt(n) => Ok(PackedValue::from(*n)),
            Packable::Float(f) => serde_json::Number::from_f64(*f)
                .map(PackedValue::Number)
                .ok_or_else(|| path.error("f64", SerializationFailure::NonFiniteFloat)),
            Packable::String(s) => Ok(PackedValue::String(s.clone())),
            Packable::Json(v) => Ok(v.clone()),
            Packable::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    path.push(Segment::Index(i));
                    let packed = self.pack_at(item, path, depth);
                    path.pop();
                    out.push(packed?);
                }
                Ok(PackedValue::Array(out))
            }
            Packable::Map(entries) => {
                let mut out = serde_json::Map::new();
                for (key, item) in entries {
                    path.push(Segment::Key(key.clone()));
                    let packed = self.pack_at(item, path, depth);
                    path.pop();
                    out.insert(key.clone(), packed?);
                }
                Ok(PackedValue::Object(out))
            }
            Packable::Native(native) => self.pack_native(native.as_ref(), path, depth),
        }
    }

    fn pack_native(
        &self,
        native: &dyn NativeValue,
        path: &mut FieldPath,
        depth: usize,
    ) -> Result<PackedValue, SerializationError> {
        if depth >= MAX_ADAPTER_DEPTH {
            return Err(path.error(
                native.type_name(),
                SerializationFailure::Adapter("adapter recursion limit reached".into()),
            ));
        }
        let adapter = native
            .type_keys()
            .iter()
            .find_map(|key| self.adapters.get(*key))
            .ok_or_else(|| path.error(native.type_name(), SerializationFailure::NoAdapter))?;
        let adapted = adapter(native)
            .map_err(|msg| path.error(native.type_name(), SerializationFailure::Adapter(msg)))?;
        self.pack_at(&adapted, path, depth + 1)
    }
}

#[derive(Debug, Clone)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Location inside the packed tree, rendered as `props.items[2].user`.
#[derive(Debug, Default)]
struct FieldPath(Vec<Segment>);

impl FieldPath {
    fn push(&mut self, segment: Segment) {
        self.0.push(segment);
    }

    fn pop(&mut self) {
        self.0.pop();
    }

    fn error(&self, type_name: &str, reason: SerializationFailure) -> SerializationError {
        SerializationError {
            path: self.to_string(),
            type_name: type_name.to_string(),
            reason,
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(root)");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(k) if i == 0 => f.write_str(k)?,
                Segment::Key(k) => write!(f, ".{k}")?,
                Segment::Index(n) => write!(f, "[{n}]")?,
            }
        }
        Ok(())
    }
}
