//! Segment shape consumed by the naming pipeline

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A time range to export as one output file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Cut-in point in seconds
    pub start: f64,
    /// Cut-out point in seconds
    pub end: f64,
    /// User label, possibly empty
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl Segment {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            name: String::new(),
            tags: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }
}
