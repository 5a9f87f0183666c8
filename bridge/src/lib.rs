//! Metadata and binding bridge between a native host and Rhai resources
//!
//! This crate provides the pieces a host needs to run script "resources":
//! generic values, local and replicated metadata stores mounted on script
//! objects, symbolic binding exports between host and scripts, and leveled
//! logging routed through a script-replaceable formatter.

pub mod bindings;
pub mod config;
pub mod core;
pub mod io;
pub mod meta;
pub mod net;
pub mod runtime;
pub mod scripting;
pub mod utils;
pub mod value;

// Re-export commonly used types
pub mod prelude {
    // Values and metadata
    pub use crate::meta::{MetaData, PropertyStore, SharedStore, SyncedMetaData};
    pub use crate::value::{FromValue, Value, ValueMap};

    // Entity system types
    pub use crate::core::entity::{BaseObjectType, EntityId, World};
    pub use crate::core::math::{Rgba, Vector2, Vector3};

    // Bindings
    pub use crate::bindings::{resolve_and_call, CallArg, Callable, ExecutionContext};

    // Replication
    pub use crate::net::{LoopbackHub, MetaOwner, MetaTransport, MetaUpdate, PeerId, Replicator};

    // Config types
    pub use crate::config::BridgeConfig;

    // Runtime and scripting types
    pub use crate::runtime::{HostHandle, Runtime, RuntimeError};
    pub use crate::scripting::{LogSink, PropertyTrap, Resource, Severity};
}

/// Initialize logging for the bridge
///
/// `RUST_LOG` wins over `filter`; with neither, everything at info and above
/// is shown.
pub fn init_logging(filter: Option<&str>) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fallback = filter.unwrap_or("info").to_string();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
