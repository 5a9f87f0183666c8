//! Rhai modules exposing host functionality to resources

pub mod math;
pub mod shared;
pub mod timers;
pub mod world;

pub use timers::{lock_timers, SharedTimers, TimerQueue};

use crate::bindings::SharedContext;
use crate::runtime::HostHandle;
use crate::scripting::trap::register_trap_api;
use rhai::Engine;
use tracing::debug;

/// Register every module with a resource's engine
pub fn register_all_modules(
    engine: &mut Engine,
    host: &HostHandle,
    context: &SharedContext,
    timers: &SharedTimers,
) {
    debug!(resource = context.name(), "Registering scripting modules");

    register_trap_api(engine);
    shared::register_shared_api(engine, host, context);
    math::register_math_api(engine, context);
    timers::register_timer_api(engine, timers);
    world::register_world_api(engine, host.world());

    debug!(resource = context.name(), "All scripting modules registered");
}
