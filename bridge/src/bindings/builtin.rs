//! Bindings every execution context starts with

use super::registry::{BindingError, Callable, ExecutionContext};
use crate::core::math::{to_byte, Rgba, Vector2, Vector3};
use crate::value::{FromValue, Value};

/// Path of the multi-argument formatter used by log dispatch
pub const INSPECT_MULTIPLE: &str = "logging:inspectMultiple";
/// Path of the string hash exported to scripts as `hash`
pub const UTILS_HASH: &str = "utils:hash";
/// Constructor exported to scripts as `Vector3`
pub const CLASSES_VECTOR3: &str = "classes:vector3";
/// Constructor exported to scripts as `Vector2`
pub const CLASSES_VECTOR2: &str = "classes:vector2";
/// Constructor exported to scripts as `RGBA`
pub const CLASSES_RGBA: &str = "classes:rgba";

const YELLOW: &str = "\x1b[33m";
const GREEN: &str = "\x1b[32m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Publish the default bindings into `context`
///
/// Resources may override any of them by publishing under the same path.
pub fn install_builtins(context: &ExecutionContext) -> Result<(), BindingError> {
    context.publish(INSPECT_MULTIPLE, Callable::native(inspect_multiple))?;
    context.publish(UTILS_HASH, Callable::native(hash))?;
    context.publish(CLASSES_VECTOR3, Callable::native(vector3))?;
    context.publish(CLASSES_VECTOR2, Callable::native(vector2))?;
    context.publish(CLASSES_RGBA, Callable::native(rgba))?;
    Ok(())
}

/// Format `options, ...values` into one line
///
/// The options map recognises a single field, `colors`.
pub fn inspect_multiple(args: &[Value]) -> Result<Value, String> {
    let (options, values) = args
        .split_first()
        .ok_or_else(|| "missing options argument".to_string())?;
    let colors = match options {
        Value::Map(_) => matches!(options.get("colors"), Some(Value::Bool(true))),
        other => return Err(format!("options must be a map, got {}", other.type_name())),
    };

    let parts: Vec<String> = values
        .iter()
        .map(|value| inspect(value, colors, true))
        .collect();
    Ok(Value::String(parts.join(" ")))
}

fn paint(text: String, color: &str, colors: bool) -> String {
    if colors {
        format!("{color}{text}{RESET}")
    } else {
        text
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn inspect(value: &Value, colors: bool, top_level: bool) -> String {
    match value {
        Value::Null => paint("null".into(), BOLD, colors),
        Value::Bool(b) => paint(b.to_string(), YELLOW, colors),
        Value::Number(n) => paint(format_number(*n), YELLOW, colors),
        Value::String(s) if top_level => s.clone(),
        Value::String(s) => paint(format!("'{s}'"), GREEN, colors),
        Value::List(items) if items.is_empty() => "[]".into(),
        Value::List(items) => {
            let inner: Vec<String> = items.iter().map(|v| inspect(v, colors, false)).collect();
            format!("[ {} ]", inner.join(", "))
        }
        Value::Map(entries) if entries.is_empty() => "{}".into(),
        Value::Map(entries) => {
            let inner: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("{k}: {}", inspect(v, colors, false)))
                .collect();
            format!("{{ {} }}", inner.join(", "))
        }
        Value::Handle(id) => id.to_string(),
    }
}

/// Jenkins one-at-a-time hash of the lowercased string
pub fn hash(args: &[Value]) -> Result<Value, String> {
    match args {
        [Value::String(s)] => {
            let mut h: u32 = 0;
            for byte in s.to_lowercase().bytes() {
                h = h.wrapping_add(byte as u32);
                h = h.wrapping_add(h << 10);
                h ^= h >> 6;
            }
            h = h.wrapping_add(h << 3);
            h ^= h >> 11;
            h = h.wrapping_add(h << 15);
            Ok(Value::Number(h as f64))
        }
        _ => Err("hash expects a single string".into()),
    }
}

fn numbers<const N: usize>(args: &[Value]) -> Option<[f64; N]> {
    if args.len() != N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, arg) in out.iter_mut().zip(args) {
        match arg {
            Value::Number(n) => *slot = *n,
            _ => return None,
        }
    }
    Some(out)
}

/// `classes:vector3`: from `x, y, z`, a three-number list, or a map
pub fn vector3(args: &[Value]) -> Result<Value, String> {
    let v = match args {
        [] => Some(Vector3::ZERO),
        [Value::List(items)] => numbers::<3>(items).map(|[x, y, z]| Vector3::new(x, y, z)),
        [map @ Value::Map(_)] => Vector3::from_value(map.clone()),
        _ => numbers::<3>(args).map(|[x, y, z]| Vector3::new(x, y, z)),
    };
    v.map(Value::from)
        .ok_or_else(|| "Vector3 expects x, y, z numbers".into())
}

/// `classes:vector2`: from `x, y`, a two-number list, or a map
pub fn vector2(args: &[Value]) -> Result<Value, String> {
    let v = match args {
        [] => Some(Vector2::ZERO),
        [Value::List(items)] => numbers::<2>(items).map(|[x, y]| Vector2::new(x, y)),
        [map @ Value::Map(_)] => Vector2::from_value(map.clone()),
        _ => numbers::<2>(args).map(|[x, y]| Vector2::new(x, y)),
    };
    v.map(Value::from)
        .ok_or_else(|| "Vector2 expects x, y numbers".into())
}

/// `classes:rgba`: from `r, g, b[, a]` bytes or a map; alpha defaults to 255
pub fn rgba(args: &[Value]) -> Result<Value, String> {
    let channels = |values: [f64; 4]| -> Option<Rgba> {
        let [r, g, b, a] = values.map(to_byte);
        Some(Rgba::new(r?, g?, b?, a?))
    };
    let color = match args {
        [map @ Value::Map(_)] => Rgba::from_value(map.clone()),
        _ => match numbers::<3>(args) {
            Some([r, g, b]) => channels([r, g, b, 255.0]),
            None => numbers::<4>(args).and_then(channels),
        },
    };
    color
        .map(Value::from)
        .ok_or_else(|| "RGBA expects r, g, b[, a] in 0..=255".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::EntityId;
    use crate::value::ValueMap;

    fn options(colors: bool) -> Value {
        let mut map = ValueMap::new();
        map.insert("colors".into(), Value::Bool(colors));
        Value::Map(map)
    }

    #[test]
    fn test_inspect_plain() {
        let mut nested = ValueMap::new();
        nested.insert("hp".into(), Value::Number(100.0));
        nested.insert("name".into(), Value::from("bob"));

        let out = inspect_multiple(&[
            options(false),
            Value::from("player"),
            Value::Number(1.5),
            Value::Number(3.0),
            Value::Map(nested),
            Value::from(vec![Value::Null, Value::Bool(true)]),
            Value::Handle(EntityId(4)),
        ])
        .unwrap();

        assert_eq!(
            out,
            Value::from("player 1.5 3 { hp: 100, name: 'bob' } [ null, true ] Entity(4)")
        );
    }

    #[test]
    fn test_inspect_colored() {
        let out = inspect_multiple(&[options(true), Value::from("n ="), Value::Number(2.0)]).unwrap();
        assert_eq!(out, Value::from("n = \x1b[33m2\x1b[0m"));
    }

    #[test]
    fn test_inspect_empty_collections() {
        let out = inspect_multiple(&[
            options(false),
            Value::List(vec![]),
            Value::Map(ValueMap::new()),
        ])
        .unwrap();
        assert_eq!(out, Value::from("[] {}"));
    }

    #[test]
    fn test_inspect_requires_options() {
        assert!(inspect_multiple(&[]).is_err());
        assert!(inspect_multiple(&[Value::from("text")]).is_err());
    }

    #[test]
    fn test_hash_is_case_insensitive_joaat() {
        assert_eq!(hash(&[Value::from("")]), Ok(Value::Number(0.0)));
        assert_eq!(hash(&[Value::from("adder")]), Ok(Value::Number(3078201489.0)));
        assert_eq!(hash(&[Value::from("ADDER")]), hash(&[Value::from("adder")]));
        assert!(hash(&[Value::Number(1.0)]).is_err());
    }

    #[test]
    fn test_vector_constructors() {
        let from_numbers = vector3(&[Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]).unwrap();
        let from_list = vector3(&[Value::from(vec![1.0_f64, 2.0, 3.0])]).unwrap();
        assert_eq!(from_numbers, from_list);
        assert_eq!(vector3(&[from_numbers.clone()]).unwrap(), from_numbers);
        assert_eq!(vector3(&[]).unwrap(), Vector3::ZERO.into());
        assert!(vector3(&[Value::Number(1.0)]).is_err());

        assert_eq!(
            vector2(&[Value::Number(4.0), Value::Number(5.0)]).unwrap(),
            Vector2::new(4.0, 5.0).into()
        );
        assert!(vector2(&[Value::from("x"), Value::Number(5.0)]).is_err());
    }

    #[test]
    fn test_rgba_constructor() {
        let opaque = rgba(&[Value::Number(255.0), Value::Number(0.0), Value::Number(10.0)]).unwrap();
        assert_eq!(opaque, Rgba::new(255, 0, 10, 255).into());

        let faded = rgba(&[
            Value::Number(1.0),
            Value::Number(2.0),
            Value::Number(3.0),
            Value::Number(4.0),
        ])
        .unwrap();
        assert_eq!(faded, Rgba::new(1, 2, 3, 4).into());

        assert!(rgba(&[Value::Number(256.0), Value::Number(0.0), Value::Number(0.0)]).is_err());
        assert!(rgba(&[Value::Number(0.5), Value::Number(0.0), Value::Number(0.0)]).is_err());
    }

    #[test]
    fn test_install_builtins() {
        let context = ExecutionContext::new("res");
        install_builtins(&context).unwrap();
        assert_eq!(
            context.paths(),
            vec![
                CLASSES_RGBA.to_string(),
                CLASSES_VECTOR2.to_string(),
                CLASSES_VECTOR3.to_string(),
                INSPECT_MULTIPLE.to_string(),
                UTILS_HASH.to_string(),
            ]
        );
    }
}
