pub mod anchor;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod host;
pub mod limiter;
pub mod sim;

pub use anchor::{AnchorRegistry, RegistrySnapshot};
pub use config::AnchorConfig;
pub use engine::{AnchorEngine, AnchorEvent, AnchorGuard, AnchorOptions, ReachedCallback};
pub use error::{Error, Result};
pub use geometry::{Axis, Coordinates, SortOrder};
pub use host::{AnchorHandle, ScrollEvent, ViewportHandle};
