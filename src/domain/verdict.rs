//! The classifier's judgment of one raw item.

use serde::{Deserialize, Serialize};

use super::task::{Category, Priority};

/// Actionability, category and priority for one item.
///
/// All four fields are required; the classifier never constructs a partial
/// verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationVerdict {
    pub actionable: bool,
    pub category: Category,
    pub description: String,
    pub priority: Priority,
}
