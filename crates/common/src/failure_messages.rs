use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// An order's accumulated failure messages.
///
/// Stored as a structured, JSON-serialized set rather than a
/// delimiter-joined string, so a message containing the delimiter can never
/// corrupt the stored value. Appending is additive and idempotent: the same
/// message recorded twice (e.g. because a compensation is retried) appears
/// once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FailureMessages(BTreeSet<String>);

impl FailureMessages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_iter<I: IntoIterator<Item = String>>(messages: I) -> Self {
        Self(messages.into_iter().collect())
    }

    /// Merges `other` into `self`; duplicates collapse by set semantics.
    pub fn extend(&mut self, other: impl IntoIterator<Item = String>) {
        self.0.extend(other);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_collapses_duplicates() {
        let mut messages = FailureMessages::from_iter(["Product X not available".to_string()]);
        messages.extend(["Product X not available".to_string()]);
        assert_eq!(messages.into_vec().len(), 1);
    }

    #[test]
    fn empty_by_default() {
        assert!(FailureMessages::new().is_empty());
    }
}
