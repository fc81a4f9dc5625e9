//! Evaluated summaries

use serde::{Deserialize, Serialize};

/// One tagged scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryValue {
    /// Tag given when the summary node was created
    pub tag: String,
    /// Scalar value at evaluation time
    pub value: f32,
}

/// Result of evaluating a summary or merged-summary node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    values: Vec<SummaryValue>,
}

impl Summary {
    pub(crate) fn scalar(tag: &str, value: f32) -> Self {
        Self {
            values: vec![SummaryValue {
                tag: tag.to_string(),
                value,
            }],
        }
    }

    pub(crate) fn extend(&mut self, other: &Self) {
        self.values.extend(other.values.iter().cloned());
    }

    /// All values in merge order.
    #[must_use]
    pub fn values(&self) -> &[SummaryValue] {
        &self.values
    }

    /// Value recorded under `tag`, if any.
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<f32> {
        self.values.iter().find(|v| v.tag == tag).map(|v| v.value)
    }
}
