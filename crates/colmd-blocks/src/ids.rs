//! Block id generation.
//!
//! Every conversion owns its own [`IdSource`], created from an
//! [`IdStrategy`]. Nothing is shared between conversions.

use serde::Deserialize;
use uuid::Uuid;

/// Source of process-unique block ids.
pub trait IdSource: Send {
    /// Produce the next id.
    fn next_id(&mut self) -> String;
}

/// Random UUID v4 ids.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdSource for UuidIds {
    fn next_id(&mut self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic `prefix-N` ids, counting from 1.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("block")
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> String {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

/// Which [`IdSource`] a conversion should use.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdStrategy {
    #[default]
    Uuid,
    Sequential,
}

impl IdStrategy {
    /// Create a fresh id source.
    #[must_use]
    pub fn source(self) -> Box<dyn IdSource> {
        match self {
            Self::Uuid => Box::new(UuidIds),
            Self::Sequential => Box::new(SequentialIds::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_sequential_ids() {
        let mut ids = SequentialIds::new("n");
        assert_eq!(ids.next_id(), "n-1");
        assert_eq!(ids.next_id(), "n-2");
    }

    #[test]
    fn test_uuid_ids_are_unique() {
        let mut ids = UuidIds;
        let seen: HashSet<_> = (0..100).map(|_| ids.next_id()).collect();
        assert_eq!(seen.len(), 100);
    }

    #[test]
    fn test_strategy_sources_are_independent() {
        let mut first = IdStrategy::Sequential.source();
        let mut second = IdStrategy::Sequential.source();
        assert_eq!(first.next_id(), "block-1");
        assert_eq!(first.next_id(), "block-2");
        assert_eq!(second.next_id(), "block-1");
    }

    #[test]
    fn test_strategy_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            ids: IdStrategy,
        }
        let parsed: Wrapper = serde_json::from_str(r#"{"ids":"sequential"}"#).unwrap();
        assert_eq!(parsed.ids, IdStrategy::Sequential);
    }
}
