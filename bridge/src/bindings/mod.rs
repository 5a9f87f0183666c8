//! Symbolic binding exports
//!
//! Resources publish callables under `namespace:identifier` paths and look
//! them up by path at call time instead of linking against each other. A
//! missing export is an expected outcome, so every typed call returns an
//! `Option`.

pub mod builtin;
pub mod registry;
pub mod resolver;

pub use builtin::{
    install_builtins, CLASSES_RGBA, CLASSES_VECTOR2, CLASSES_VECTOR3, INSPECT_MULTIPLE, UTILS_HASH,
};
pub use registry::{
    BindingError, BindingRegistry, Callable, ExecutionContext, NativeFn, ScriptFunction,
    SharedContext,
};
pub use resolver::{resolve_and_call, CallArg};
