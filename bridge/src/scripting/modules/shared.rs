//! Shared API available to every resource: logging, hashing, process-wide
//! metadata and binding exports

use crate::bindings::{resolve_and_call, CallArg, SharedContext, UTILS_HASH};
use crate::runtime::HostHandle;
use crate::scripting::log::{dispatch, Severity};
use crate::scripting::trap::PropertyTrap;
use crate::utils::sha256_hex;
use crate::value::Value;
use rhai::{Dynamic, Engine, EvalAltResult, FnPtr, ImmutableString, NativeCallContext};
use tracing::debug;

/// Register one log function for every supported argument count
macro_rules! register_log_fn {
    (@arity $engine:expr, $name:expr, $severity:expr, $host:expr, $context:expr; $($arg:ident),*) => {{
        let host = $host.clone();
        let context = $context.clone();
        $engine.register_fn($name, move |ctx: NativeCallContext $(, $arg: Dynamic)*| {
            dispatch(ctx.engine(), &context, host.sink(), $severity, vec![$($arg),*]);
        });
    }};
    ($engine:expr, $name:expr, $severity:expr, $host:expr, $context:expr) => {
        register_log_fn!(@arity $engine, $name, $severity, $host, $context;);
        register_log_fn!(@arity $engine, $name, $severity, $host, $context; a);
        register_log_fn!(@arity $engine, $name, $severity, $host, $context; a, b);
        register_log_fn!(@arity $engine, $name, $severity, $host, $context; a, b, c);
        register_log_fn!(@arity $engine, $name, $severity, $host, $context; a, b, c, d);
        register_log_fn!(@arity $engine, $name, $severity, $host, $context; a, b, c, d, e);
        register_log_fn!(@arity $engine, $name, $severity, $host, $context; a, b, c, d, e, f);
    };
}

/// Register the shared API with a resource's engine
pub fn register_shared_api(engine: &mut Engine, host: &HostHandle, context: &SharedContext) {
    debug!(resource = context.name(), "Registering shared API");

    register_log_fn!(engine, "log", Severity::Info, host, context);
    register_log_fn!(engine, "logWarn", Severity::Warn, host, context);
    register_log_fn!(engine, "logError", Severity::Error, host, context);

    // Any number of arguments, passed as one array
    for (name, severity) in [
        ("logAll", Severity::Info),
        ("logWarnAll", Severity::Warn),
        ("logErrorAll", Severity::Error),
    ] {
        let host = host.clone();
        let context = context.clone();
        engine.register_fn(name, move |ctx: NativeCallContext, args: rhai::Array| {
            dispatch(ctx.engine(), &context, host.sink(), severity, args);
        });
    }

    engine.register_fn("sha256", |text: ImmutableString| sha256_hex(text.as_bytes()));

    let debug_flag = host.is_debug();
    engine.register_fn("is_debug", move || debug_flag);

    // Process-wide metadata, for use inside functions where scope variables
    // are not visible
    let meta_host = host.clone();
    engine.register_fn("shared_meta", move || {
        PropertyTrap::new(meta_host.shared_meta())
    });
    let synced_host = host.clone();
    engine.register_fn("shared_synced_meta", move || {
        PropertyTrap::new(synced_host.shared_synced_meta())
    });

    // `hash` is a static re-export of the `utils:hash` binding
    let hash_context = context.clone();
    engine.register_fn("hash", move |ctx: NativeCallContext, value: Dynamic| {
        resolve_and_call::<Value>(ctx.engine(), &hash_context, UTILS_HASH, vec![value.into()])
            .map(|v| v.to_dynamic())
            .unwrap_or(Dynamic::UNIT)
    });

    register_binding_api(engine, context);
}

/// Functions letting a script publish and call binding exports
fn register_binding_api(engine: &mut Engine, context: &SharedContext) {
    let publish_context = context.clone();
    engine.register_fn(
        "export_binding",
        move |path: ImmutableString, fn_name: ImmutableString| -> Result<(), Box<EvalAltResult>> {
            publish_context
                .publish_script_fn(&path, &fn_name)
                .map(|_| ())
                .map_err(|e| e.to_string().into())
        },
    );

    let publish_context = context.clone();
    engine.register_fn(
        "export_binding",
        move |path: ImmutableString, fn_ptr: FnPtr| -> Result<(), Box<EvalAltResult>> {
            publish_context
                .publish_script_fn(&path, fn_ptr.fn_name())
                .map(|_| ())
                .map_err(|e| e.to_string().into())
        },
    );

    let lookup_context = context.clone();
    engine.register_fn("has_binding", move |path: ImmutableString| {
        lookup_context.lookup(&path).is_some()
    });

    let call_context = context.clone();
    engine.register_fn(
        "call_binding",
        move |ctx: NativeCallContext, path: ImmutableString, args: rhai::Array| {
            let args: Vec<CallArg> = args.into_iter().map(CallArg::Script).collect();
            resolve_and_call::<Value>(ctx.engine(), &call_context, &path, args)
                .map(|v| v.to_dynamic())
                .unwrap_or(Dynamic::UNIT)
        },
    );
}
