//! Bulk product import.
//!
//! Paste a JSON array of products (or a single object) and step through the
//! resulting drafts one at a time.

use serde_json::Value;

use super::AdminError;
use super::draft::{ProductDraft, RawDraft};

/// Drafts parsed from pasted JSON, with a cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkImport {
    drafts: Vec<ProductDraft>,
    index: usize,
}

impl BulkImport {
    /// Parse pasted JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Bulk`] if the text is not JSON or an entry is
    /// not an object, and [`AdminError::EmptyBulk`] for an empty array.
    pub fn parse(text: &str) -> Result<Self, AdminError> {
        let value: Value = serde_json::from_str(text).map_err(AdminError::Bulk)?;
        let items = match value {
            Value::Array(items) => items,
            single => vec![single],
        };
        if items.is_empty() {
            return Err(AdminError::EmptyBulk);
        }

        let drafts = items
            .into_iter()
            .map(|item| serde_json::from_value::<RawDraft>(item).map(ProductDraft::from))
            .collect::<Result<Vec<_>, _>>()
            .map_err(AdminError::Bulk)?;

        tracing::info!(count = drafts.len(), "Loaded bulk import");
        Ok(Self { drafts, index: 0 })
    }

    /// The draft being processed.
    #[must_use]
    pub fn current(&self) -> Option<&ProductDraft> {
        self.drafts.get(self.index)
    }

    /// The draft being processed, for editing before it is saved.
    pub fn current_mut(&mut self) -> Option<&mut ProductDraft> {
        self.drafts.get_mut(self.index)
    }

    /// Move to the next draft. Returns `false` once every draft is done.
    pub fn advance(&mut self) -> bool {
        if self.index < self.drafts.len() {
            self.index += 1;
        }
        self.index < self.drafts.len()
    }

    /// `(current, total)`, 1-based, for "Processing 2 of 5".
    #[must_use]
    pub fn progress(&self) -> (usize, usize) {
        ((self.index + 1).min(self.drafts.len()), self.drafts.len())
    }

    /// Whether every draft has been processed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.index >= self.drafts.len()
    }

    /// Number of drafts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    /// Always false; empty imports are rejected at parse time.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }
}
