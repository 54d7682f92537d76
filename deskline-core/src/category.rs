//! Message topic categories used by the keyword classifier, and the
//! conversation tags used for manual labeling.

use crate::{RowId, Timestamp};
use serde::{Deserialize, Serialize};

/// Default display color for a conversation tag.
pub const DEFAULT_TAG_COLOR: &str = "#1890ff";

/// A topic category with its keyword list.
///
/// Keywords are stored lowercase; matching is case-insensitive substring
/// containment against the conversation text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageCategory {
    pub category_id: RowId,
    pub name: String,
    pub keywords: Vec<String>,
    /// Display ordering in admin listings; lower sorts first.
    pub sort_order: i32,
    pub created_by: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl MessageCategory {
    /// Normalized keywords: lowercased, trimmed, empties dropped.
    pub fn normalized_keywords(&self) -> Vec<String> {
        self.keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect()
    }
}

/// A label agents attach to conversations for filtering and reporting.
///
/// Tags are flat reference data; the conversation side stores them as
/// free text, so deleting a tag never touches closed conversations.
/// Names are unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvTag {
    pub tag_id: RowId,
    pub name: String,
    /// Hex display color, e.g. `#1890ff`.
    pub color: String,
    /// Display ordering in admin listings; lower sorts first.
    pub sort_order: i32,
    pub created_by: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_keyword_normalization() {
        let category = MessageCategory {
            category_id: 1,
            name: "billing".to_string(),
            keywords: vec![" Refund ".to_string(), "".to_string(), "INVOICE".to_string()],
            sort_order: 0,
            created_by: "admin".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(category.normalized_keywords(), vec!["refund", "invoice"]);
    }
}
