//! File watching for resource hot reload

pub mod hot_reload;

pub use hot_reload::{ResourceWatcher, WatchError, WatcherConfig};
