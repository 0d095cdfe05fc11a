//! Invoice id allocation
//!
//! Ids are `<prefix>-NNNN`. The next id is one past the largest numeric
//! suffix already in use under the same prefix; ids that don't parse as
//! `<prefix>-<digits>` are ignored.

use crate::domain::ids::InvoiceId;

/// Allocates ids for new records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    prefix: String,
}

impl IdAllocator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Next id given every id currently in the dataset
    ///
    /// # Examples
    ///
    /// ```
    /// use radicacion::core::lifecycle::IdAllocator;
    /// use radicacion::domain::InvoiceId;
    ///
    /// let allocator = IdAllocator::new("CHIA");
    /// let existing = [InvoiceId::new("CHIA-0009"), InvoiceId::new("legacy-77")];
    /// assert_eq!(allocator.next_id(existing.iter()).as_str(), "CHIA-0010");
    /// ```
    pub fn next_id<'a>(&self, existing: impl IntoIterator<Item = &'a InvoiceId>) -> InvoiceId {
        let highest = existing
            .into_iter()
            .filter_map(|id| id.numeric_suffix(&self.prefix))
            .max()
            .unwrap_or(0);
        InvoiceId::from_parts(&self.prefix, highest.saturating_add(1))
    }
}
