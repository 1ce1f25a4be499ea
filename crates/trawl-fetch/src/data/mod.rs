//! Immutable configuration and value types.

mod options;
mod progress;
mod resource;

pub use options::{DEFAULT_PAGE_SIZE, FetchOptions};
pub use progress::{LoopState, Progress, RunSummary};
pub use resource::{ContactExpansions, MetricsScope, Resource};
