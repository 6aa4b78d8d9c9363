//! Cooperative cancellation for long-running exports.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A cancellation flag shared between an export and whoever may stop it.
///
/// Clones observe the same underlying flag. A signal counts as fired when
/// its own flag is set, when its deadline (if any) has passed, or when any
/// of the signals it was merged from has fired. Firing a merged signal
/// does not propagate back to its sources.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    fired: Arc<AtomicBool>,
    deadline: Option<Instant>,
    upstream: Vec<CancelSignal>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// A signal that fires by itself once `timeout` has elapsed.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            ..Self::default()
        }
    }

    /// A signal that fires as soon as any of `sources` fires.
    pub fn merged<I>(sources: I) -> Self
    where
        I: IntoIterator<Item = CancelSignal>,
    {
        Self {
            upstream: sources.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn fire(&self) {
        self.fired.store(true, Ordering::SeqCst);
    }

    pub fn is_fired(&self) -> bool {
        if self.fired.load(Ordering::SeqCst) {
            return true;
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return true;
            }
        }
        self.upstream.iter().any(CancelSignal::is_fired)
    }
}
