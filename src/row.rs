//! Synthetic row generation

use crate::types::PageSpec;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One generated record
///
/// Rows are created fresh for every serialization and dropped once written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// Unique row identifier
    pub id: Uuid,
    /// Secondary random identifier
    pub batch: Uuid,
    /// Creation time as unix milliseconds
    pub created_at: i64,
    /// Random auxiliary value
    pub checksum: u32,
}

impl Row {
    /// Generate a new random row
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            batch: Uuid::new_v4(),
            created_at: chrono::Utc::now().timestamp_millis(),
            checksum: rand::thread_rng().r#gen(),
        }
    }
}

impl Default for Row {
    fn default() -> Self {
        Self::new()
    }
}

/// Source of rows for a page
///
/// Implementations must be cheap to call from many page workers at once.
/// The page being written is passed in so a generator can vary its output
/// per page.
pub trait RowGenerator: Send + Sync + 'static {
    /// Record type produced by this generator
    type Row: Serialize;

    /// Produce one row for `page`
    fn generate(&self, page: &PageSpec) -> Self::Row;
}

/// Default generator producing random [`Row`]s
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidRowGenerator;

impl RowGenerator for UuidRowGenerator {
    type Row = Row;

    fn generate(&self, _page: &PageSpec) -> Row {
        Row::new()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_have_distinct_ids() {
        let page = PageSpec::new(1);
        let a = UuidRowGenerator.generate(&page);
        let b = UuidRowGenerator.generate(&page);
        assert_ne!(a.id, b.id);
        assert_ne!(a.id, a.batch);
    }

    #[test]
    fn test_row_serializes_to_single_line() {
        let row = Row::new();
        let json = serde_json::to_string(&row).unwrap();
        assert!(!json.contains('\n'));

        let parsed: Row = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, row);
    }
}
