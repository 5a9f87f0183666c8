//! Timers driven by the runtime tick

use super::test_runtime;
use crate::meta::{read_store, PropertyStore};
use crate::value::Value;

const TIMERS: &str = r#"
fn ping() {
    let m = shared_meta();
    m.pings = (m.pings ?? 0) + 1;
}

fn once() {
    let m = shared_meta();
    m.once = true;
}

fn broken() {
    throw "timer failure";
}

Timers::set_interval(Fn("ping"), 100);
Timers::set_timeout(Fn("once"), 250);
Timers::set_timeout(Fn("broken"), 10);
Timers::set_timeout(|| { let m = shared_meta(); m.closure = "ran"; }, 50);
"#;

#[test]
fn test_timers_fire_on_tick() {
    let (mut runtime, _) = test_runtime(false);
    runtime.start_resource_from_source("clock", TIMERS).unwrap();
    assert_eq!(runtime.resource("clock").unwrap().pending_timers(), 4);

    let meta = runtime.host().shared_meta();

    runtime.tick(0.05);
    assert_eq!(read_store(&meta).get("closure"), Some(Value::from("ran")));
    assert!(!read_store(&meta).has("pings"));

    for _ in 0..4 {
        runtime.tick(0.05);
    }
    assert_eq!(read_store(&meta).get("pings"), Some(Value::Number(2.0)));
    assert_eq!(read_store(&meta).get("once"), Some(Value::Bool(true)));

    // Only the interval is left
    assert_eq!(runtime.resource("clock").unwrap().pending_timers(), 1);
}

#[test]
fn test_cleared_and_stopped_timers_do_not_fire() {
    let (mut runtime, _) = test_runtime(false);
    runtime
        .start_resource_from_source(
            "clock",
            r#"
            fn mark() { let m = shared_meta(); m.fired = true; }
            let id = Timers::set_timeout(Fn("mark"), 10);
            Timers::clear(id);
            Timers::set_interval(Fn("mark"), 10);
            "#,
        )
        .unwrap();

    let resource = runtime.resource_mut("clock").unwrap();
    assert_eq!(resource.pending_timers(), 1);
    resource.stop().unwrap();
    assert_eq!(resource.pending_timers(), 0);
    resource.tick(1.0).unwrap();

    let meta = runtime.host().shared_meta();
    assert!(!read_store(&meta).has("fired"));
}

#[test]
fn test_next_tick_runs_on_following_tick() {
    let (mut runtime, _) = test_runtime(false);
    runtime
        .start_resource_from_source(
            "clock",
            r#"
            fn mark() { let m = shared_meta(); m.ticked = true; }
            Timers::next_tick(Fn("mark"));
            "#,
        )
        .unwrap();

    let meta = runtime.host().shared_meta();
    assert!(!read_store(&meta).has("ticked"));
    runtime.tick(0.0);
    assert_eq!(read_store(&meta).get("ticked"), Some(Value::Bool(true)));
}
