use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Lower bound used when nothing has been checkpointed yet.
pub const BEGINNING_OF_TIME: &str = "1950-01-01T01:00:00+00:00";

/// Modification-timestamp lower bound for the next page request.
///
/// The value is opaque to the API but ordered: RFC 3339 values compare by instant,
/// anything else falls back to lexical order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watermark(String);

impl Watermark {
    pub fn new(value: impl Into<String>) -> Self { Self(value.into()) }

    pub fn beginning() -> Self { Self(BEGINNING_OF_TIME.to_string()) }

    pub fn as_str(&self) -> &str { &self.0 }

    pub fn is_beginning(&self) -> bool { self.0 == BEGINNING_OF_TIME }

    fn instant(&self) -> Option<DateTime<FixedOffset>> { DateTime::parse_from_rfc3339(&self.0).ok() }

    pub fn compare(&self, other: &Watermark) -> Ordering {
        match (self.instant(), other.instant()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.0.cmp(&other.0),
        }
    }

    /// Move forward to `candidate` unless it is earlier than the current value.
    ///
    /// Returns `false` and leaves `self` untouched when `candidate` would move the
    /// watermark backwards.
    pub fn advance(&mut self, candidate: Watermark) -> bool {
        if candidate.compare(self) == Ordering::Less {
            return false;
        }
        *self = candidate;
        true
    }
}

impl Default for Watermark {
    fn default() -> Self { Self::beginning() }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Field name of one resource inside the checkpoint record.
///
/// Keys carry the identity-strategy version, so switching strategies starts a fresh
/// watermark instead of resuming into a staging area keyed differently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CheckpointKey(String);

impl CheckpointKey {
    pub fn new(resource: &str, version: u32) -> Self { Self(format!("{resource}.v{version}")) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<&str> for CheckpointKey {
    fn from(value: &str) -> Self { Self(value.to_string()) }
}

impl fmt::Display for CheckpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}
