// src/models/metadata.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Open key-value bag attached to questions, blueprints and results.
///
/// Replaces the untyped JSON blobs of the original records with an explicit
/// map type. Unknown keys round-trip untouched so older records stay
/// readable; keys the exam flow itself understands are listed as constants
/// below and are versioned through [`KEY_SCHEMA_VERSION`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(pub BTreeMap<String, serde_json::Value>);

/// Free-form label describing where a question was imported from.
pub const KEY_SOURCE: &str = "source";

/// Integer version of the known-key set; bumped when a known key changes
/// meaning. Absent means version 1.
pub const KEY_SCHEMA_VERSION: &str = "schema_version";

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.0.insert(key.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
