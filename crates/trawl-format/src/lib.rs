//! Aggregation of staged records into a single delivery artifact.
//!
//! An [`Aggregator`] reads every record from a [`StagingStore`](trawl_store::StagingStore),
//! frames it according to a [`RecordFormatter`], transcodes from UTF-8 into the
//! requested [`OutputEncoding`] and streams the result into an atomically committed
//! file. Record order follows the store's listing order and is unspecified.

mod aggregate;
mod encoding;
mod error;
mod formatter;

pub use aggregate::{Aggregator, GenerateSummary};
pub use encoding::OutputEncoding;
pub use error::{Error, Result};
pub use formatter::{ArrayFormatter, ArrayStyle, Format, LinesFormatter, RecordFormatter};
