//! Book catalog providers
//!
//! Search backends that map a provider's payloads into `Book` records.

pub mod google_books;
pub mod traits;

// Re-exports
pub use google_books::GoogleBooksProvider;
pub use traits::BookProvider;
