//! Leading-edge throttle.

use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

type ThrottledFn<A, R> = Box<dyn Fn(A) -> R + Send + Sync>;

struct ThrottleState<A, R> {
    /// End of the open window and the result of the call that opened it
    window: Option<(Instant, R)>,
    /// Arguments of the most recent call swallowed by the open window
    last_args: Option<A>,
}

/// Runs the wrapped function at most once per window.
///
/// The first call of a window runs immediately and its result is returned
/// to every later call of the same window. Later calls are recorded but
/// never replayed once the window lapses (no trailing edge).
pub struct Throttle<A, R> {
    func: ThrottledFn<A, R>,
    wait: Duration,
    state: Mutex<ThrottleState<A, R>>,
}

impl<A, R: Clone> Throttle<A, R> {
    pub fn new<F>(func: F, wait: Duration) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        Self {
            func: Box::new(func),
            wait,
            state: Mutex::new(ThrottleState {
                window: None,
                last_args: None,
            }),
        }
    }

    /// Invoke through the throttle.
    ///
    /// `func` runs while the internal lock is held and must not call back
    /// into the same throttle.
    pub fn call(&self, args: A) -> R {
        let now = Instant::now();
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let state = &mut *guard;

        if let Some((end, result)) = &state.window {
            if now < *end {
                state.last_args = Some(args);
                return result.clone();
            }
        }

        state.last_args = None;
        let result = (self.func)(args);
        state.window = Some((now + self.wait, result.clone()));
        result
    }

    /// Whether a window is currently open
    pub fn is_throttled(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        matches!(&state.window, Some((end, _)) if Instant::now() < *end)
    }

    /// Whether the open window has swallowed at least one call
    pub fn has_pending_args(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let open = matches!(&state.window, Some((end, _)) if Instant::now() < *end);
        open && state.last_args.is_some()
    }

    pub fn window(&self) -> Duration {
        self.wait
    }
}

impl<A, R> fmt::Debug for Throttle<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttle").field("wait", &self.wait).finish_non_exhaustive()
    }
}
