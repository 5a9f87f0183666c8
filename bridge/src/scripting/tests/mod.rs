//! Cross-module scripting tests run against a full runtime

mod binding_tests;
mod timer_tests;

use crate::config::BridgeConfig;
use crate::runtime::Runtime;
use crate::scripting::log::MemoryLogSink;
use std::sync::Arc;

/// Runtime whose resource log lines are captured in memory
fn test_runtime(debug: bool) -> (Runtime, Arc<MemoryLogSink>) {
    let sink = Arc::new(MemoryLogSink::new());
    let config = BridgeConfig {
        debug,
        ..Default::default()
    };
    (Runtime::with_sink(config, sink.clone()), sink)
}
