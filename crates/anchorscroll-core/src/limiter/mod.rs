//! Rate-limiting primitives used by the engine under high-frequency scroll
//! events.
//!
//! - `throttle` - leading-edge, one execution per window
//! - `debounce` - trailing-edge, runs after a quiet period
//! - `memoize` - per-argument cache, used to keep one limiter per key

pub mod debounce;
pub mod memoize;
pub mod throttle;

pub use debounce::Debounce;
pub use memoize::Memoize;
pub use throttle::Throttle;
