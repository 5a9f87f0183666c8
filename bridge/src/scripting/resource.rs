//! A loaded resource: one engine, one compiled script, one execution context

use crate::bindings::{
    install_builtins, resolve_and_call, BindingError, CallArg, ExecutionContext, SharedContext,
};
use crate::config::EngineLimits;
use crate::runtime::HostHandle;
use crate::scripting::engine::build_engine;
use crate::scripting::log::{dispatch, Severity};
use crate::scripting::modules::{lock_timers, register_all_modules, SharedTimers, TimerQueue};
use crate::scripting::trap::PropertyTrap;
use crate::value::FromValue;
use rhai::{CallFnOptions, Dynamic, Engine, EvalAltResult, FuncArgs, Scope, AST};
use std::any::{type_name, Any};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, trace};

/// Lifecycle hook names looked up in resource scripts
pub const ON_START: &str = "on_start";
pub const ON_STOP: &str = "on_stop";
pub const ON_TICK: &str = "on_tick";

/// Errors raised while loading or running a resource
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("Failed to read resource script {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{resource}:{line}:{column} - {message}")]
    Compile {
        resource: String,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("{resource}:{line}:{column} - {message}")]
    Runtime {
        resource: String,
        line: usize,
        column: usize,
        message: String,
    },

    #[error(transparent)]
    Binding(#[from] BindingError),
}

impl ResourceError {
    fn runtime(resource: &str, err: &EvalAltResult) -> Self {
        let position = err.position();
        ResourceError::Runtime {
            resource: resource.to_string(),
            line: position.line().unwrap_or(0),
            column: position.position().unwrap_or(0),
            message: err.to_string(),
        }
    }
}

/// A running script resource
///
/// Scope variables `meta`, `syncedMeta` and `isDebug` are visible to
/// top-level code; functions reach the same state through `shared_meta()`,
/// `shared_synced_meta()` and `is_debug()`.
pub struct Resource {
    name: String,
    path: Option<PathBuf>,
    source: String,
    host: HostHandle,
    context: SharedContext,
    engine: Engine,
    scope: Scope<'static>,
    ast: Arc<AST>,
    timers: SharedTimers,
    started: bool,
}

impl Resource {
    /// Compile `source` and run its top-level statements
    pub fn from_source(
        name: &str,
        source: &str,
        host: &HostHandle,
        limits: &EngineLimits,
    ) -> Result<Self, ResourceError> {
        debug!(resource = name, "Loading resource");

        let context = ExecutionContext::shared(name);
        install_builtins(&context)?;

        let timers = TimerQueue::shared();
        let mut engine = build_engine(limits);
        register_all_modules(&mut engine, host, &context, &timers);

        let ast = engine.compile(source).map_err(|e| {
            let position = e.position();
            ResourceError::Compile {
                resource: name.to_string(),
                line: position.line().unwrap_or(0),
                column: position.position().unwrap_or(0),
                message: e.to_string(),
            }
        })?;
        let ast = Arc::new(ast);
        context.set_script(ast.clone());

        let mut scope = Scope::new();
        scope.push("meta", PropertyTrap::new(host.shared_meta()));
        scope.push("syncedMeta", PropertyTrap::new(host.shared_synced_meta()));
        scope.push_constant("isDebug", host.is_debug());

        engine
            .run_ast_with_scope(&mut scope, &ast)
            .map_err(|e| ResourceError::runtime(name, &e))?;

        debug!(
            resource = name,
            functions = ast.iter_functions().count(),
            exports = context.paths().len(),
            "Resource loaded"
        );

        Ok(Self {
            name: name.to_string(),
            path: None,
            source: source.to_string(),
            host: host.clone(),
            context,
            engine,
            scope,
            ast,
            timers,
            started: false,
        })
    }

    /// Load a resource script from disk
    pub fn from_file(
        name: &str,
        path: &Path,
        host: &HostHandle,
        limits: &EngineLimits,
    ) -> Result<Self, ResourceError> {
        let source = std::fs::read_to_string(path).map_err(|source| ResourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut resource = Self::from_source(name, &source, host, limits)?;
        resource.path = Some(path.to_path_buf());
        Ok(resource)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Script file this resource was loaded from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn context(&self) -> &SharedContext {
        &self.context
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Check whether the script defines `name` taking `arity` parameters
    pub fn has_function(&self, name: &str, arity: usize) -> bool {
        self.ast
            .iter_functions()
            .any(|f| f.name == name && f.params.len() == arity)
    }

    /// Call a script function if it is defined
    ///
    /// Returns `Ok(false)` when the script does not define it.
    pub fn call_hook(
        &mut self,
        name: &str,
        arity: usize,
        args: impl FuncArgs,
    ) -> Result<bool, ResourceError> {
        if !self.has_function(name, arity) {
            return Ok(false);
        }
        trace!(resource = self.name, hook = name, "Calling hook");

        let options = CallFnOptions::new().eval_ast(false).rewind_scope(true);
        self.engine
            .call_fn_with_options::<Dynamic>(options, &mut self.scope, &self.ast, name, args)
            .map_err(|e| ResourceError::runtime(&self.name, &e))?;
        Ok(true)
    }

    /// Run `on_start`; a resource is started at most once
    pub fn start(&mut self) -> Result<(), ResourceError> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        self.call_hook(ON_START, 0, ())?;
        info!(resource = self.name, "Resource started");
        Ok(())
    }

    /// Run `on_stop` if the resource was started
    pub fn stop(&mut self) -> Result<(), ResourceError> {
        if !self.started {
            return Ok(());
        }
        self.started = false;
        lock_timers(&self.timers).clear();
        self.call_hook(ON_STOP, 0, ())?;
        info!(resource = self.name, "Resource stopped");
        Ok(())
    }

    /// Fire due timers, then run `on_tick(dt)`
    ///
    /// `delta_time` is in seconds. A failing timer callback is logged and
    /// does not stop the tick.
    pub fn tick(&mut self, delta_time: f64) -> Result<(), ResourceError> {
        self.fire_timers(delta_time);
        self.call_hook(ON_TICK, 1, (delta_time,))?;
        Ok(())
    }

    /// Number of scheduled timers
    pub fn pending_timers(&self) -> usize {
        lock_timers(&self.timers).len()
    }

    fn fire_timers(&mut self, delta_time: f64) {
        let due = lock_timers(&self.timers).due(delta_time * 1000.0);
        for id in due {
            // Callbacks may schedule or clear timers, so the lock is not held
            let callback = lock_timers(&self.timers).take(id);
            let Some(callback) = callback else {
                continue;
            };
            trace!(resource = self.name, timer = id, "Firing timer");
            if let Err(e) = callback.call::<Dynamic>(&self.engine, &self.ast, ()) {
                error!(resource = self.name, timer = id, error = %e, "Timer callback failed");
            }
        }
    }

    /// Typed call through this resource's binding exports
    pub fn call_binding<T: FromValue>(&self, path: &str, args: Vec<CallArg>) -> Option<T> {
        resolve_and_call(&self.engine, &self.context, path, args)
    }

    /// Log through this resource's formatter, as the script's `log` would
    pub fn log(&self, severity: Severity, args: Vec<Dynamic>) -> bool {
        dispatch(&self.engine, &self.context, self.host.sink(), severity, args)
    }

    /// Evaluate a snippet against the resource's scope and functions
    pub fn eval<T: Any + Clone>(&mut self, snippet: &str) -> Result<T, ResourceError> {
        let snippet = self.engine.compile(snippet).map_err(|e| {
            let err: Box<EvalAltResult> = e.into();
            ResourceError::runtime(&self.name, &err)
        })?;
        let merged = self.ast.clone_functions_only().merge(&snippet);
        let result = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut self.scope, &merged)
            .map_err(|e| ResourceError::runtime(&self.name, &e))?;

        let actual = result.type_name();
        result.try_cast::<T>().ok_or_else(|| ResourceError::Runtime {
            resource: self.name.clone(),
            line: 0,
            column: 0,
            message: format!("expected {}, got {actual}", type_name::<T>()),
        })
    }
}
