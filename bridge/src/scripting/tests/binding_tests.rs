//! Binding exports between resources and the host

use super::test_runtime;
use crate::bindings::{builtin, CallArg, Callable};
use crate::value::Value;

#[test]
fn test_script_export_called_from_host() {
    let (mut runtime, _) = test_runtime(false);
    runtime
        .start_resource_from_source(
            "greeter",
            r#"
            fn greet(name) { "hi " + name }
            export_binding("greet:hello", "greet");
            export_binding("greet:ptr", Fn("greet"));
            "#,
        )
        .unwrap();
    let resource = runtime.resource("greeter").unwrap();

    let args = || vec![CallArg::from(Value::from("bob"))];
    assert_eq!(
        resource.call_binding::<String>("greet:hello", args()),
        Some("hi bob".to_string())
    );
    assert_eq!(
        resource.call_binding::<String>("greet:ptr", args()),
        Some("hi bob".to_string())
    );
    assert_eq!(resource.call_binding::<String>("greet:missing", args()), None);

    // Wrong return type
    assert_eq!(resource.call_binding::<bool>("greet:hello", args()), None);
}

#[test]
fn test_bad_exports_are_script_errors() {
    let (mut runtime, _) = test_runtime(false);
    assert!(runtime
        .start_resource_from_source("bad", r#"export_binding("nocolon", "f"); fn f() {}"#)
        .is_err());
    assert!(runtime
        .start_resource_from_source("worse", r#"export_binding("a:b", "undefined_fn");"#)
        .is_err());
    assert!(runtime.resource_names().is_empty());
}

#[test]
fn test_call_binding_from_script() {
    let (mut runtime, _) = test_runtime(false);
    runtime
        .start_resource_from_source(
            "math",
            r#"
            fn add(a, b) { a + b }
            export_binding("math:add", "add");
            "#,
        )
        .unwrap();
    let resource = runtime.resource_mut("math").unwrap();

    assert_eq!(
        resource
            .eval::<f64>(r#"call_binding("math:add", [2, 3])"#)
            .unwrap(),
        5.0
    );
    assert!(resource.eval::<bool>(r#"has_binding("math:add")"#).unwrap());
    assert!(resource
        .eval::<rhai::Dynamic>(r#"call_binding("math:nope", [])"#)
        .unwrap()
        .is_unit());
}

#[test]
fn test_native_export_called_from_script() {
    let (mut runtime, _) = test_runtime(false);
    runtime.start_resource_from_source("host", "").unwrap();
    let resource = runtime.resource_mut("host").unwrap();
    resource
        .context()
        .publish(
            "host:double",
            Callable::native(|args| match args {
                [Value::Number(n)] => Ok(Value::Number(n * 2.0)),
                _ => Err("expected a number".into()),
            }),
        )
        .unwrap();

    assert_eq!(
        resource
            .eval::<f64>(r#"call_binding("host:double", [21])"#)
            .unwrap(),
        42.0
    );
    // Native failure collapses to unit
    assert!(resource
        .eval::<rhai::Dynamic>(r#"call_binding("host:double", ["x"])"#)
        .unwrap()
        .is_unit());
}

#[test]
fn test_exports_are_per_resource() {
    let (mut runtime, _) = test_runtime(false);
    runtime
        .start_resource_from_source("a", r#"fn f() { 1 } export_binding("a:f", "f");"#)
        .unwrap();
    runtime.start_resource_from_source("b", "").unwrap();

    let b = runtime.resource_mut("b").unwrap();
    assert!(!b.eval::<bool>(r#"has_binding("a:f")"#).unwrap());
    assert!(b.call_binding::<Value>("a:f", vec![]).is_none());
}

#[test]
fn test_hash_and_sha256() {
    let (mut runtime, _) = test_runtime(false);
    runtime.start_resource_from_source("h", "").unwrap();
    let resource = runtime.resource_mut("h").unwrap();

    let expected = match builtin::hash(&[Value::from("abc")]).unwrap() {
        Value::Number(n) => n,
        other => panic!("unexpected hash result: {other:?}"),
    };
    assert_eq!(resource.eval::<f64>(r#"hash("abc")"#).unwrap(), expected);
    assert_eq!(
        resource.eval::<String>(r#"sha256("abc")"#).unwrap(),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn test_hash_follows_republished_export() {
    let (mut runtime, _) = test_runtime(false);
    runtime
        .start_resource_from_source(
            "h",
            r#"
            fn constant(text) { 7 }
            export_binding("utils:hash", "constant");
            "#,
        )
        .unwrap();
    let resource = runtime.resource_mut("h").unwrap();
    assert_eq!(resource.eval::<f64>(r#"hash("abc")"#).unwrap(), 7.0);
}
