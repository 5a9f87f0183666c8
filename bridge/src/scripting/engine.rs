//! Rhai engine construction

use crate::config::EngineLimits;
use rhai::packages::{
    BasicArrayPackage, BasicBlobPackage, BasicMapPackage, BasicStringPackage, BasicTimePackage,
    BitFieldPackage, CorePackage, LogicPackage, MoreStringPackage, Package,
};
use rhai::Engine;
use tracing::{debug, info};

/// Create an engine configured with the given safety limits
///
/// Every resource gets its own engine, so the functions registered on it
/// can capture that resource's execution context.
///
/// The standard packages are loaded without the math package: its `log`
/// functions would shadow the resource `log` for numeric arguments.
pub fn build_engine(limits: &EngineLimits) -> Engine {
    let mut engine = Engine::new_raw();

    engine.register_global_module(CorePackage::new().as_shared_module());
    engine.register_global_module(LogicPackage::new().as_shared_module());
    engine.register_global_module(BitFieldPackage::new().as_shared_module());
    engine.register_global_module(BasicStringPackage::new().as_shared_module());
    engine.register_global_module(MoreStringPackage::new().as_shared_module());
    engine.register_global_module(BasicArrayPackage::new().as_shared_module());
    engine.register_global_module(BasicBlobPackage::new().as_shared_module());
    engine.register_global_module(BasicMapPackage::new().as_shared_module());
    engine.register_global_module(BasicTimePackage::new().as_shared_module());

    engine.on_print(|text| info!(target: "script", "{text}"));
    engine.on_debug(|text, source, pos| {
        debug!(target: "script", source = source.unwrap_or(""), ?pos, "{text}");
    });

    // Configure engine for safety
    engine.set_max_expr_depths(limits.max_expr_depth, limits.max_function_expr_depth);
    engine.set_max_call_levels(limits.max_call_levels);
    engine.set_max_operations(limits.max_operations);
    engine.set_max_string_size(limits.max_string_size);
    engine.set_max_array_size(limits.max_array_size);
    engine.set_max_map_size(limits.max_map_size);

    // Disable certain features for safety
    engine.disable_symbol("eval");

    debug!(?limits, "Built script engine");
    engine
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_respects_operation_limit() {
        let limits = EngineLimits {
            max_operations: 50,
            ..Default::default()
        };
        let engine = build_engine(&limits);

        let result = engine.run("let x = 0; loop { x += 1; }");
        assert!(result.is_err());
    }

    #[test]
    fn test_eval_is_disabled() {
        let engine = build_engine(&EngineLimits::default());
        assert!(engine.run(r#"eval("1 + 1")"#).is_err());
    }

    #[test]
    fn test_plain_scripts_run() {
        let engine = build_engine(&EngineLimits::default());
        assert_eq!(engine.eval::<i64>("40 + 2").unwrap(), 42);
        assert_eq!(
            engine.eval::<String>(r#"let a = [1, 2]; a.push(3); "n=" + a.len()"#).unwrap(),
            "n=3"
        );
    }

    #[test]
    fn test_math_log_is_not_registered() {
        let engine = build_engine(&EngineLimits::default());
        assert!(engine.eval::<f64>("log(100.0)").is_err());
    }
}
