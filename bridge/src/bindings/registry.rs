//! Per-context table of published callables

use crate::value::Value;
use rhai::AST;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

/// Errors raised when publishing bindings
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("Invalid binding path '{0}', expected 'namespace:identifier'")]
    InvalidPath(String),

    #[error("Resource '{0}' has no compiled script")]
    NoScript(String),

    #[error("Script function '{0}' is not defined")]
    UnknownFunction(String),
}

/// Native callable: receives marshalled arguments, may fail
pub type NativeFn = Arc<dyn Fn(&[Value]) -> Result<Value, String> + Send + Sync>;

/// A function defined by a script, callable by name inside its AST
#[derive(Clone)]
pub struct ScriptFunction {
    pub ast: Arc<AST>,
    pub name: String,
}

/// A type-erased callable stored under a binding path
#[derive(Clone)]
pub enum Callable {
    Native(NativeFn),
    Script(ScriptFunction),
}

impl Callable {
    /// Wrap a native closure
    pub fn native<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        Callable::Native(Arc::new(f))
    }

    pub fn script(ast: Arc<AST>, name: impl Into<String>) -> Self {
        Callable::Script(ScriptFunction {
            ast,
            name: name.into(),
        })
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Native(_) => write!(f, "Callable::Native"),
            Callable::Script(func) => write!(f, "Callable::Script({})", func.name),
        }
    }
}

/// Check that `path` has the `namespace:identifier` shape
pub fn validate_path(path: &str) -> Result<(), BindingError> {
    match path.split_once(':') {
        Some((namespace, identifier))
            if !namespace.is_empty() && !identifier.is_empty() && !identifier.contains(':') =>
        {
            Ok(())
        }
        _ => Err(BindingError::InvalidPath(path.to_string())),
    }
}

/// Symbol table mapping binding paths to callables
#[derive(Default, Clone)]
pub struct BindingRegistry {
    exports: HashMap<String, Callable>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `callable` under `path`, replacing any previous export
    ///
    /// Returns `true` when an existing export was replaced.
    pub fn publish(&mut self, path: &str, callable: Callable) -> Result<bool, BindingError> {
        validate_path(path)?;
        let replaced = self.exports.insert(path.to_string(), callable).is_some();
        if replaced {
            warn!(path, "Binding export replaced");
        } else {
            debug!(path, "Binding export published");
        }
        Ok(replaced)
    }

    pub fn lookup(&self, path: &str) -> Option<Callable> {
        self.exports.get(path).cloned()
    }

    pub fn unpublish(&mut self, path: &str) -> bool {
        self.exports.remove(path).is_some()
    }

    /// Published paths in sorted order
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.exports.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.exports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty()
    }
}

/// The binding-facing side of a loaded resource
///
/// Each resource owns exactly one context. Lookups never leave it.
pub struct ExecutionContext {
    name: String,
    registry: RwLock<BindingRegistry>,
    script: RwLock<Option<Arc<AST>>>,
}

/// Context handle captured by script modules
pub type SharedContext = Arc<ExecutionContext>;

impl ExecutionContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry: RwLock::new(BindingRegistry::new()),
            script: RwLock::new(None),
        }
    }

    pub fn shared(name: impl Into<String>) -> SharedContext {
        Arc::new(Self::new(name))
    }

    /// Name of the owning resource
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn publish(&self, path: &str, callable: Callable) -> Result<bool, BindingError> {
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .publish(path, callable)
    }

    /// Look up a callable; the registry lock is released before returning
    pub fn lookup(&self, path: &str) -> Option<Callable> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .lookup(path)
    }

    pub fn unpublish(&self, path: &str) -> bool {
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .unpublish(path)
    }

    pub fn paths(&self) -> Vec<String> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .paths()
    }

    /// Attach the compiled script whose functions this context may publish
    pub fn set_script(&self, ast: Arc<AST>) {
        *self.script.write().unwrap_or_else(PoisonError::into_inner) = Some(ast);
    }

    pub fn script(&self) -> Option<Arc<AST>> {
        self.script
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Publish a function of the attached script under `path`
    pub fn publish_script_fn(&self, path: &str, fn_name: &str) -> Result<bool, BindingError> {
        let ast = self
            .script()
            .ok_or_else(|| BindingError::NoScript(self.name.clone()))?;
        let defined = ast.iter_functions().any(|f| f.name == fn_name);
        if !defined {
            return Err(BindingError::UnknownFunction(fn_name.to_string()));
        }
        self.publish(path, Callable::script(ast, fn_name))
    }
}
