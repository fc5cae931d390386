pub mod action;
pub mod assets;
pub mod config;
pub mod cookie;
pub mod error;
pub mod messages;
pub mod metadata;
pub mod packer;

pub use action::{Action, ActionKind, ActionResponse, RenderOptions, RequestScope};
pub use assets::{AssetResolver, Assets};
pub use config::{BridgeConfig, BridgeSettings, Framework};
pub use error::{
    BridgeError, ConfigurationError, ConflictingArgumentsError, Result, SerializationError,
};
pub use metadata::Metadata;
pub use packer::{AdapterRegistry, Packable, PackedValue};
