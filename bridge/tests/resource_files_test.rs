//! Resources loaded from disk

use bridge::prelude::*;
use bridge::runtime::RuntimeError;
use bridge::scripting::{MemoryLogSink, ResourceError};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn runtime_in(dir: &TempDir) -> (Runtime, Arc<MemoryLogSink>) {
    let config = BridgeConfig {
        resource_root: dir.path().to_path_buf(),
        ..Default::default()
    };
    config.validate().unwrap();
    let sink = Arc::new(MemoryLogSink::new());
    (Runtime::with_sink(config, sink.clone()), sink)
}

#[test]
fn test_start_and_restart_from_disk() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("chat.rhai");
    fs::write(&script, r#"fn on_start() { log("v1"); }"#).unwrap();

    let (mut runtime, sink) = runtime_in(&dir);
    runtime.start_resource("chat").unwrap();
    assert_eq!(
        runtime.resource("chat").unwrap().path(),
        Some(script.as_path())
    );

    fs::write(&script, r#"fn on_start() { log("v2"); }"#).unwrap();
    runtime.restart_resource("chat").unwrap();

    let texts: Vec<String> = sink.records().into_iter().map(|r| r.text).collect();
    assert_eq!(texts, vec!["v1".to_string(), "v2".to_string()]);
}

#[test]
fn test_missing_script_is_io_error() {
    let dir = TempDir::new().unwrap();
    let (mut runtime, _) = runtime_in(&dir);

    let err = runtime.start_resource("ghost").unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Resource(ResourceError::Io { .. })
    ));
}

#[test]
fn test_compile_error_reports_position() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("broken.rhai"), "let x = ;\n").unwrap();
    let (mut runtime, _) = runtime_in(&dir);

    match runtime.start_resource("broken") {
        Err(RuntimeError::Resource(ResourceError::Compile { resource, line, .. })) => {
            assert_eq!(resource, "broken");
            assert_eq!(line, 1);
        }
        other => panic!("expected compile error, got {other:?}"),
    }
    assert!(runtime.resource_names().is_empty());
}

#[test]
fn test_config_file_drives_boot() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("motd.rhai"), r#"meta.motd = "hello";"#).unwrap();
    let config_path = dir.path().join("bridge.json");
    fs::write(
        &config_path,
        format!(
            r#"{{ "resource_root": {:?}, "resources": ["motd"], "debug": true }}"#,
            dir.path().to_str().unwrap()
        ),
    )
    .unwrap();

    let config = BridgeConfig::load(&config_path).unwrap();
    assert!(config.debug);
    assert_eq!(config.script_extension, "rhai");

    let mut runtime = Runtime::new(config.clone());
    for name in &config.resources {
        runtime.start_resource(name).unwrap();
    }

    let meta = runtime.host().shared_meta();
    assert_eq!(
        bridge::meta::read_store(&meta).get("motd"),
        Some(Value::from("hello"))
    );
    runtime.shutdown();
}
