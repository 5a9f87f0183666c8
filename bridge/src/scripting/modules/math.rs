//! Number conversions and the vector/color classes for Rhai scripts

use crate::bindings::{
    resolve_and_call, SharedContext, CLASSES_RGBA, CLASSES_VECTOR2, CLASSES_VECTOR3,
};
use crate::core::math::{Rgba, Vector2, Vector3};
use rhai::{Dynamic, Engine, EvalAltResult, NativeCallContext, INT};
use tracing::debug;

/// Register a class constructor for one argument count
///
/// The constructor resolves its binding export at call time, so a resource
/// that republishes the path changes what the constructor builds. A failed
/// call yields `()`.
macro_rules! register_class_ctor {
    ($engine:expr, $name:expr, $path:expr, $ty:ty, $context:expr; $($arg:ident),*) => {{
        let context = $context.clone();
        $engine.register_fn($name, move |ctx: NativeCallContext $(, $arg: Dynamic)*| -> Dynamic {
            resolve_and_call::<$ty>(ctx.engine(), &context, $path, vec![$($arg.into()),*])
                .map(Dynamic::from)
                .unwrap_or(Dynamic::UNIT)
        });
    }};
}

/// Getter plus float and integer setters for one vector component
macro_rules! register_component {
    ($engine:expr, $ty:ty, $field:ident) => {
        $engine
            .register_get(stringify!($field), |v: &mut $ty| v.$field)
            .register_set(stringify!($field), |v: &mut $ty, n: f64| v.$field = n)
            .register_set(stringify!($field), |v: &mut $ty, n: INT| v.$field = n as f64);
    };
}

fn to_int(x: f64) -> Result<INT, Box<EvalAltResult>> {
    if x.is_finite() && x >= INT::MIN as f64 && x <= INT::MAX as f64 {
        Ok(x.trunc() as INT)
    } else {
        Err(format!("Number out of integer range: {x}").into())
    }
}

fn channel(n: INT) -> Result<u8, Box<EvalAltResult>> {
    u8::try_from(n).map_err(|_| format!("Color channel out of range: {n}").into())
}

/// Register number conversions, the class types and their constructors
pub fn register_math_api(engine: &mut Engine, context: &SharedContext) {
    debug!(resource = context.name(), "Registering math API");

    // Metadata hands every number back as a float
    engine
        .register_fn("to_int", to_int)
        .register_fn("to_int", |x: INT| x)
        .register_fn("to_float", |x: INT| x as f64)
        .register_fn("to_float", |x: f64| x)
        .register_fn("floor", |x: f64| x.floor())
        .register_fn("ceiling", |x: f64| x.ceil())
        .register_fn("round", |x: f64| x.round())
        .register_fn("abs", |x: f64| x.abs())
        .register_fn("abs", |x: INT| -> Result<INT, Box<EvalAltResult>> {
            x.checked_abs()
                .ok_or_else(|| format!("Integer overflow: abs({x})").into())
        });

    engine
        .register_type_with_name::<Vector3>("Vector3")
        .register_fn("+", |a: Vector3, b: Vector3| a + b)
        .register_fn("-", |a: Vector3, b: Vector3| a - b)
        .register_fn("*", |a: Vector3, b: f64| a * b)
        .register_fn("*", |a: Vector3, b: INT| a * b as f64)
        .register_fn("==", |a: &mut Vector3, b: Vector3| *a == b)
        .register_fn("!=", |a: &mut Vector3, b: Vector3| *a != b)
        .register_fn("length", |v: &mut Vector3| v.length())
        .register_fn("distance", |a: &mut Vector3, b: Vector3| a.distance(b))
        .register_fn("to_string", |v: &mut Vector3| v.to_string())
        .register_fn("to_debug", |v: &mut Vector3| v.to_string());
    register_component!(engine, Vector3, x);
    register_component!(engine, Vector3, y);
    register_component!(engine, Vector3, z);

    engine
        .register_type_with_name::<Vector2>("Vector2")
        .register_fn("+", |a: Vector2, b: Vector2| a + b)
        .register_fn("-", |a: Vector2, b: Vector2| a - b)
        .register_fn("*", |a: Vector2, b: f64| a * b)
        .register_fn("*", |a: Vector2, b: INT| a * b as f64)
        .register_fn("==", |a: &mut Vector2, b: Vector2| *a == b)
        .register_fn("!=", |a: &mut Vector2, b: Vector2| *a != b)
        .register_fn("length", |v: &mut Vector2| v.length())
        .register_fn("distance", |a: &mut Vector2, b: Vector2| a.distance(b))
        .register_fn("to_string", |v: &mut Vector2| v.to_string())
        .register_fn("to_debug", |v: &mut Vector2| v.to_string());
    register_component!(engine, Vector2, x);
    register_component!(engine, Vector2, y);

    engine
        .register_type_with_name::<Rgba>("RGBA")
        .register_get("r", |c: &mut Rgba| c.r as INT)
        .register_get("g", |c: &mut Rgba| c.g as INT)
        .register_get("b", |c: &mut Rgba| c.b as INT)
        .register_get("a", |c: &mut Rgba| c.a as INT)
        .register_set("r", |c: &mut Rgba, n: INT| -> Result<(), Box<EvalAltResult>> {
            c.r = channel(n)?;
            Ok(())
        })
        .register_set("g", |c: &mut Rgba, n: INT| -> Result<(), Box<EvalAltResult>> {
            c.g = channel(n)?;
            Ok(())
        })
        .register_set("b", |c: &mut Rgba, n: INT| -> Result<(), Box<EvalAltResult>> {
            c.b = channel(n)?;
            Ok(())
        })
        .register_set("a", |c: &mut Rgba, n: INT| -> Result<(), Box<EvalAltResult>> {
            c.a = channel(n)?;
            Ok(())
        })
        .register_fn("==", |a: &mut Rgba, b: Rgba| *a == b)
        .register_fn("!=", |a: &mut Rgba, b: Rgba| *a != b)
        .register_fn("to_string", |c: &mut Rgba| c.to_string())
        .register_fn("to_debug", |c: &mut Rgba| c.to_string());

    // Static re-exports of the class bindings
    register_class_ctor!(engine, "Vector3", CLASSES_VECTOR3, Vector3, context;);
    register_class_ctor!(engine, "Vector3", CLASSES_VECTOR3, Vector3, context; v);
    register_class_ctor!(engine, "Vector3", CLASSES_VECTOR3, Vector3, context; x, y, z);
    register_class_ctor!(engine, "Vector2", CLASSES_VECTOR2, Vector2, context;);
    register_class_ctor!(engine, "Vector2", CLASSES_VECTOR2, Vector2, context; v);
    register_class_ctor!(engine, "Vector2", CLASSES_VECTOR2, Vector2, context; x, y);
    register_class_ctor!(engine, "RGBA", CLASSES_RGBA, Rgba, context; c);
    register_class_ctor!(engine, "RGBA", CLASSES_RGBA, Rgba, context; r, g, b);
    register_class_ctor!(engine, "RGBA", CLASSES_RGBA, Rgba, context; r, g, b, a);
}
