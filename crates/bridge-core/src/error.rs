use std::path::PathBuf;
use thiserror::Error;

/// Deployment misconfiguration. Never a per-request condition: surfaces as a
/// server error and is not retried.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("bundle_dir (production) or dev_server_url (development) must be set")]
    MissingAssetSource,

    #[error("bundle_dir and dev_server_url are mutually exclusive: set exactly one")]
    AmbiguousAssetSource,

    #[error("entry point '{entry_point}' not found in manifest {}", manifest.display())]
    EntryPointNotFound {
        entry_point: String,
        manifest: PathBuf,
    },

    #[error("failed to read manifest {}: {source}", path.display())]
    ManifestUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest {}: {source}", path.display())]
    ManifestInvalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("bootstrap template not found: {0}")]
    TemplateNotFound(String),

    #[error("failed to read configuration {}: {source}", path.display())]
    SettingsUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration {}: {source}", path.display())]
    SettingsInvalid {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Why a value could not be packed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerializationFailure {
    /// No adapter is registered for any type key the value declares.
    NoAdapter,
    /// NaN and infinities have no JSON representation.
    NonFiniteFloat,
    /// A registered adapter rejected the value.
    Adapter(String),
}

impl std::fmt::Display for SerializationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SerializationFailure::NoAdapter => f.write_str("no adapter registered"),
            SerializationFailure::NonFiniteFloat => f.write_str("non-finite float"),
            SerializationFailure::Adapter(msg) => write!(f, "adapter failed: {msg}"),
        }
    }
}

/// A value in the payload could not be made JSON-safe. Fatal for the whole
/// response: nothing is emitted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot serialize value of type `{type_name}` at `{path}`: {reason}")]
pub struct SerializationError {
    pub path: String,
    pub type_name: String,
    pub reason: SerializationFailure,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ConflictingArgumentsError(pub String);

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error(transparent)]
    ConflictingArguments(#[from] ConflictingArgumentsError),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
