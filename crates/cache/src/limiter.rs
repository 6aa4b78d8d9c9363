//! Rate-limited callback adapters.
//!
//! Wraps a callback in debounce or throttle semantics backed by tokio
//! timer tasks. Both adapters must be used from within a tokio runtime.
//! Disposal (explicit or on drop) aborts any scheduled timer task, so a
//! torn-down adapter can never fire into freed state.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

type Callback<T> = Arc<dyn Fn(T) + Send + Sync + 'static>;

/// Delays invocation until `delay` has elapsed with no further calls.
/// Each call replaces the pending one, so a burst collapses to a single
/// invocation carrying the last value.
pub struct Debouncer<T: Send + 'static> {
    delay: Duration,
    callback: Callback<T>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(delay: Duration, callback: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            delay,
            callback: Arc::new(callback),
            pending: Mutex::new(None),
        }
    }

    /// Schedule an invocation with `value`, cancelling any pending one.
    pub fn call(&self, value: T) {
        let mut pending = self.pending.lock().unwrap();
        if let Some(old) = pending.take() {
            old.abort();
        }
        let callback = Arc::clone(&self.callback);
        let delay = self.delay;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback(value);
        }));
    }

    /// Cancel the pending invocation, if any.
    pub fn cancel(&self) {
        if let Some(handle) = self.pending.lock().unwrap().take() {
            handle.abort();
        }
    }

    /// Tear down the adapter. Equivalent to [`Debouncer::cancel`]; also
    /// runs on drop.
    pub fn dispose(&self) {
        self.cancel();
    }

    /// Whether an invocation is scheduled and has not fired yet.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl<T: Send + 'static> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

struct ThrottleState<T> {
    last_fire: Option<Instant>,
    /// Latest coalesced value awaiting the trailing flush.
    latest: Option<T>,
    trailing: Option<JoinHandle<()>>,
}

/// Invokes at most once per `interval`: the first call in a quiet period
/// fires immediately (leading edge), calls inside the interval coalesce
/// into one trailing invocation carrying the latest value.
pub struct Throttler<T: Send + 'static> {
    interval: Duration,
    callback: Callback<T>,
    state: Arc<Mutex<ThrottleState<T>>>,
}

impl<T: Send + 'static> Throttler<T> {
    pub fn new(interval: Duration, callback: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            interval,
            callback: Arc::new(callback),
            state: Arc::new(Mutex::new(ThrottleState {
                last_fire: None,
                latest: None,
                trailing: None,
            })),
        }
    }

    pub fn call(&self, value: T) {
        let mut state = self.state.lock().unwrap();
        let now = Instant::now();
        match state.last_fire {
            Some(last)
                if now.duration_since(last) < self.interval || state.trailing.is_some() =>
            {
                state.latest = Some(value);
                if state.trailing.is_none() {
                    let wait = self.interval.saturating_sub(now.duration_since(last));
                    self.schedule_trailing(&mut state, wait);
                }
            }
            _ => {
                state.last_fire = Some(now);
                // invoke outside the lock so re-entrant calls cannot deadlock
                drop(state);
                (self.callback)(value);
            }
        }
    }

    fn schedule_trailing(&self, state: &mut ThrottleState<T>, wait: Duration) {
        let callback = Arc::clone(&self.callback);
        let shared = Arc::clone(&self.state);
        state.trailing = Some(tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            let value = {
                let mut state = shared.lock().unwrap();
                state.trailing = None;
                state.last_fire = Some(Instant::now());
                state.latest.take()
            };
            if let Some(value) = value {
                callback(value);
            }
        }));
    }

    /// Abort the trailing flush and drop any coalesced value. Also runs
    /// on drop.
    pub fn dispose(&self) {
        let mut state = self.state.lock().unwrap();
        state.latest = None;
        if let Some(handle) = state.trailing.take() {
            handle.abort();
        }
    }

    /// Whether a trailing flush is scheduled.
    pub fn is_pending(&self) -> bool {
        self.state.lock().unwrap().trailing.is_some()
    }
}

impl<T: Send + 'static> Drop for Throttler<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}
