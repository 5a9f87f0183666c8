//! Leveled log dispatch for scripts
//!
//! Script log calls are formatted by whatever callable the resource has
//! published at [`INSPECT_MULTIPLE`], then handed to a [`LogSink`]. If the
//! formatter is missing or fails, the line is dropped.
//!
//! A native formatter only understands [`Value`]s, so arguments without a
//! generic representation are replaced before the call: property traps by
//! a snapshot of their entries, anything else by its display text. Script
//! formatters receive the arguments untouched.

use crate::bindings::{resolve_and_call, CallArg, Callable, ExecutionContext, INSPECT_MULTIPLE};
use crate::scripting::trap::PropertyTrap;
use crate::value::{Value, ValueMap};
use rhai::{Dynamic, Engine};
use std::fmt;
use std::sync::{Mutex, PoisonError};
use tracing::{error, info, trace, warn};

/// Log line severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    /// Only info lines are colorized
    pub fn colors(self) -> bool {
        matches!(self, Severity::Info)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warn => write!(f, "warn"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Final destination of formatted log lines
pub trait LogSink: Send + Sync {
    fn write(&self, severity: Severity, text: &str, resource: &str);
}

/// Forwards resource log lines to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn write(&self, severity: Severity, text: &str, resource: &str) {
        match severity {
            Severity::Info => info!(target: "resource", resource, "{text}"),
            Severity::Warn => warn!(target: "resource", resource, "{text}"),
            Severity::Error => error!(target: "resource", resource, "{text}"),
        }
    }
}

/// A captured log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub severity: Severity,
    pub text: String,
    pub resource: String,
}

/// Keeps every line in memory
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the captured lines
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LogSink for MemoryLogSink {
    fn write(&self, severity: Severity, text: &str, resource: &str) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LogRecord {
                severity,
                text: text.to_string(),
                resource: resource.to_string(),
            });
    }
}

/// Format `args` through the context's formatter and write the result
///
/// Returns whether a line reached the sink.
pub fn dispatch(
    engine: &Engine,
    context: &ExecutionContext,
    sink: &dyn LogSink,
    severity: Severity,
    args: Vec<Dynamic>,
) -> bool {
    let mut options = ValueMap::new();
    options.insert("colors".to_string(), Value::Bool(severity.colors()));

    let native = matches!(context.lookup(INSPECT_MULTIPLE), Some(Callable::Native(_)));

    let mut call_args = Vec::with_capacity(args.len() + 1);
    call_args.push(CallArg::Value(Value::Map(options)));
    call_args.extend(args.into_iter().map(|arg| {
        if native {
            CallArg::Value(loggable(arg))
        } else {
            CallArg::Script(arg)
        }
    }));

    match resolve_and_call::<String>(engine, context, INSPECT_MULTIPLE, call_args) {
        Some(text) => {
            sink.write(severity, &text, context.name());
            true
        }
        None => {
            trace!(resource = context.name(), %severity, "Dropped log line");
            false
        }
    }
}

fn loggable(arg: Dynamic) -> Value {
    if let Some(value) = Value::from_dynamic(&arg) {
        return value;
    }
    if let Some(trap) = arg.read_lock::<PropertyTrap>() {
        return trap.snapshot();
    }
    Value::String(arg.to_string())
}
