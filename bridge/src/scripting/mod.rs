//! Scripting layer using Rhai
//!
//! Every resource runs in its own engine with its own binding exports. The
//! modules registered on that engine expose metadata through property traps,
//! the entity factory, hashing, and leveled logging.

pub mod engine;
pub mod log;
pub mod modules;
pub mod resource;
pub mod trap;

pub use engine::build_engine;
pub use log::{dispatch, LogRecord, LogSink, MemoryLogSink, Severity, TracingLogSink};
pub use resource::{Resource, ResourceError};
pub use trap::{register_trap_api, PropertyTrap};

// Re-export commonly used types
pub use rhai::{Dynamic, EvalAltResult};

#[cfg(test)]
mod tests;
