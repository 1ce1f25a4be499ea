//! Atomic filesystem primitives.
//!
//! Every write in trawl lands through one of two paths:
//! - [`atomic_write`] for small whole-file payloads (checkpoints, staged records)
//! - [`AtomicFile`] for streamed artifacts that are too large to buffer
//!
//! Both stage into a hidden temp file beside the destination and rename over it,
//! so readers observe either the previous content or the complete new content.

mod atomic;
mod error;

pub use atomic::{AtomicFile, AtomicWriteOptions, atomic_write, ensure_dir, read};
pub use error::{Error, Result};
