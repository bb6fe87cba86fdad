//! Anchor bookkeeping: who is registered, where they are, which one the
//! viewport has reached.

pub mod detector;
pub mod registry;
pub mod resolver;

pub use detector::{detect, find_reached, ReachedAnchors};
pub use registry::{AnchorRegistry, RegistrySnapshot};
pub use resolver::{resolve_all, resolve_one};
