//! Late-bound, typed calls through a context's binding registry

use super::registry::{Callable, ExecutionContext};
use crate::value::{FromValue, Value};
use rhai::{CallFnOptions, Dynamic, Engine, Scope};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, trace};

/// An argument on its way to a callable
///
/// Native values and script values are both accepted; each is converted to
/// whatever the target callable expects.
#[derive(Debug, Clone)]
pub enum CallArg {
    Value(Value),
    Script(Dynamic),
}

impl From<Value> for CallArg {
    fn from(v: Value) -> Self {
        CallArg::Value(v)
    }
}

impl From<Dynamic> for CallArg {
    fn from(v: Dynamic) -> Self {
        CallArg::Script(v)
    }
}

impl CallArg {
    fn into_dynamic(self) -> Dynamic {
        match self {
            CallArg::Value(v) => v.to_dynamic(),
            CallArg::Script(d) => d,
        }
    }

    fn into_value(self) -> Option<Value> {
        match self {
            CallArg::Value(v) => Some(v),
            CallArg::Script(d) => Value::from_dynamic(&d),
        }
    }
}

/// Resolve `path` in `context` and call it, converting the result to `T`
///
/// Every failure mode collapses to `None`: the path is not published, an
/// argument cannot be marshalled, the callee fails or panics, or the return
/// value has the wrong shape. Callers must handle the `None` branch.
pub fn resolve_and_call<T: FromValue>(
    engine: &Engine,
    context: &ExecutionContext,
    path: &str,
    args: Vec<CallArg>,
) -> Option<T> {
    let Some(callable) = context.lookup(path) else {
        trace!(resource = context.name(), path, "Binding export not found");
        return None;
    };

    let result = match callable {
        Callable::Native(func) => {
            let values = args
                .into_iter()
                .map(CallArg::into_value)
                .collect::<Option<Vec<_>>>();
            let Some(values) = values else {
                debug!(resource = context.name(), path, "Argument not convertible for native binding");
                return None;
            };

            match panic::catch_unwind(AssertUnwindSafe(|| func(&values))) {
                Ok(Ok(value)) => value,
                Ok(Err(e)) => {
                    debug!(resource = context.name(), path, error = %e, "Native binding failed");
                    return None;
                }
                Err(_) => {
                    debug!(resource = context.name(), path, "Native binding panicked");
                    return None;
                }
            }
        }
        Callable::Script(func) => {
            let dynamic_args: Vec<Dynamic> = args.into_iter().map(CallArg::into_dynamic).collect();
            let options = CallFnOptions::new().eval_ast(false).rewind_scope(true);
            let mut scope = Scope::new();

            match engine.call_fn_with_options::<Dynamic>(
                options,
                &mut scope,
                &func.ast,
                &func.name,
                dynamic_args,
            ) {
                Ok(value) => Value::from_dynamic(&value)?,
                Err(e) => {
                    debug!(resource = context.name(), path, error = %e, "Script binding failed");
                    return None;
                }
            }
        }
    };

    T::from_value(result)
}
