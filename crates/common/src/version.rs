use serde::{Deserialize, Serialize};

/// Optimistic-concurrency counter carried by every mutable row (aggregates
/// and outbox messages alike). A writer reads the current version, issues an
/// `UPDATE ... WHERE version = :v`, and only a single racing writer observes
/// a row affected; everyone else observes zero rows changed and must treat
/// that as a conflict, not an error to propagate blindly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    pub const INITIAL: Version = Version(0);

    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// The version a row will carry once this write succeeds.
    pub fn next(&self) -> Version {
        Version(self.0 + 1)
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::INITIAL
    }
}
