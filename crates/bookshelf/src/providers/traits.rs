//! Book provider trait
//!
//! Defines the interface a book catalog service must implement.

use crate::data::types::Book;
use crate::error::SearchError;

/// A searchable book catalog
///
/// Each call makes exactly one request to the backing service. There are
/// no retries and no caching; callers decide when to ask again.
pub trait BookProvider: Send + Sync {
    /// Display name for the provider (e.g., "Google Books")
    fn name(&self) -> &'static str;

    /// Search the catalog by free text
    ///
    /// The query must be non-empty; callers skip the call otherwise.
    /// A response without results is `Ok(vec![])`.
    fn search(&self, query: &str) -> Result<Vec<Book>, SearchError>;

    /// Look up a single book by its provider id
    fn get_volume(&self, id: &str) -> Result<Option<Book>, SearchError>;
}
