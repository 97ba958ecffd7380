//! Bookshelf services
//!
//! Book search providers, favorites persistence, settings, and the
//! application controller shared by every frontend.
//!
//! ## Quick start
//!
//! ```no_run
//! use bookshelf::data::{FavoritesStore, FileStore};
//! use bookshelf::providers::{BookProvider, GoogleBooksProvider};
//!
//! let provider = GoogleBooksProvider::new()?;
//! let favorites = FavoritesStore::new(FileStore::open_default()?);
//! if let Some(book) = provider.search("dune")?.into_iter().next() {
//!     println!("{:?}", favorites.add(book));
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod network;
pub mod providers;

pub use error::{AppError, Result, SearchError};
