//! Result type alias for inventory operations

use super::errors::InventoryError;

/// Result type alias using `InventoryError`
///
/// # Examples
///
/// ```
/// use radicacion::domain::result::Result;
/// use radicacion::domain::errors::InventoryError;
///
/// fn failing_function() -> Result<()> {
///     Err(InventoryError::validation("invoiceNumber", "empty"))
/// }
/// ```
pub type Result<T> = std::result::Result<T, InventoryError>;
