//! Timers namespace: script callbacks fired from the resource tick

use rhai::{Engine, EvalAltResult, FnPtr, Module, INT};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

/// Timer queue shared between a resource and its registered functions
pub type SharedTimers = Arc<Mutex<TimerQueue>>;

#[derive(Debug, Clone)]
struct Timer {
    callback: FnPtr,
    due_ms: f64,
    interval_ms: Option<f64>,
}

/// Pending timers of one resource
///
/// Time only moves when the owner calls [`due`](Self::due), so timers run
/// on the host thread between ticks, never concurrently with a script.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now_ms: f64,
    next_id: u64,
    timers: BTreeMap<u64, Timer>,
}

/// Lock a timer queue, recovering the guard if a previous holder panicked
pub fn lock_timers(timers: &SharedTimers) -> MutexGuard<'_, TimerQueue> {
    timers.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TimerQueue {
    pub fn shared() -> SharedTimers {
        Arc::new(Mutex::new(Self::default()))
    }

    /// Schedule `callback` after `delay_ms`; intervals repeat with that period
    pub fn schedule(&mut self, callback: FnPtr, delay_ms: f64, repeat: bool) -> u64 {
        let delay_ms = if delay_ms.is_finite() { delay_ms.max(0.0) } else { 0.0 };
        self.next_id += 1;
        let id = self.next_id;
        trace!(timer = id, delay_ms, repeat, "Timer scheduled");
        self.timers.insert(
            id,
            Timer {
                callback,
                due_ms: self.now_ms + delay_ms,
                interval_ms: repeat.then_some(delay_ms),
            },
        );
        id
    }

    pub fn cancel(&mut self, id: u64) -> bool {
        self.timers.remove(&id).is_some()
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Advance the clock by `delta_ms` and list the timers now due
    ///
    /// Ids come earliest deadline first. Timers scheduled after this call
    /// wait for the next advance.
    pub fn due(&mut self, delta_ms: f64) -> Vec<u64> {
        if delta_ms.is_finite() && delta_ms > 0.0 {
            self.now_ms += delta_ms;
        }
        let now = self.now_ms;
        let mut due: Vec<(f64, u64)> = self
            .timers
            .iter()
            .filter(|(_, timer)| timer.due_ms <= now)
            .map(|(id, timer)| (timer.due_ms, *id))
            .collect();
        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        due.into_iter().map(|(_, id)| id).collect()
    }

    /// Take the callback of a due timer
    ///
    /// One-shot timers are removed and intervals rescheduled. Returns `None`
    /// when the timer was cancelled in the meantime.
    pub fn take(&mut self, id: u64) -> Option<FnPtr> {
        let now = self.now_ms;
        let timer = self.timers.get_mut(&id)?;
        if timer.due_ms > now {
            return None;
        }
        let callback = timer.callback.clone();
        let interval = timer.interval_ms;
        if let Some(interval) = interval {
            timer.due_ms = now + interval;
        } else {
            self.timers.remove(&id);
        }
        Some(callback)
    }
}

fn schedule_fn(
    timers: &SharedTimers,
    repeat: bool,
) -> impl Fn(FnPtr, f64) -> Result<INT, Box<EvalAltResult>> + Send + Sync + 'static {
    let timers = timers.clone();
    move |callback, delay_ms| Ok(lock_timers(&timers).schedule(callback, delay_ms, repeat) as INT)
}

/// Register the `Timers` namespace backed by `timers`
pub fn register_timer_api(engine: &mut Engine, timers: &SharedTimers) {
    debug!("Registering timer API");

    let mut module = Module::new();

    for (name, repeat) in [("set_timeout", false), ("set_interval", true)] {
        module.set_native_fn(name, schedule_fn(timers, repeat));
        let schedule = schedule_fn(timers, repeat);
        module.set_native_fn(name, move |callback: FnPtr, delay_ms: INT| {
            schedule(callback, delay_ms as f64)
        });
    }

    let schedule = schedule_fn(timers, false);
    module.set_native_fn("next_tick", move |callback: FnPtr| schedule(callback, 0.0));

    let t = timers.clone();
    module.set_native_fn("clear", move |id: INT| -> Result<bool, Box<EvalAltResult>> {
        Ok(id >= 0 && lock_timers(&t).cancel(id as u64))
    });

    let t = timers.clone();
    module.set_native_fn("count", move || -> Result<INT, Box<EvalAltResult>> {
        Ok(lock_timers(&t).len() as INT)
    });

    engine.register_static_module("Timers", module.into());
}
