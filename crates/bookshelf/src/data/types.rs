//! Common data types for persistence
//!
//! Shared types used across the data module.

use serde::{Deserialize, Serialize};

// =============================================================================
// Book - A catalog entry
// =============================================================================

/// A book from the search provider
///
/// This is the one type that flows from search results into navigation
/// state and the favorites collection. Providers validate their raw
/// payloads into it once, so `id` is never empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Provider-assigned unique identifier
    pub id: String,
    /// Display title (empty if the provider omitted it)
    #[serde(default)]
    pub title: String,
    /// Authors in provider order
    #[serde(default)]
    pub authors: Vec<String>,
    /// Free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Publication date, free-form ("1965", "2005-08-02", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    /// Cover image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl Book {
    /// Create a book with only an id and title
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            authors: Vec::new(),
            description: None,
            published_date: None,
            thumbnail_url: None,
        }
    }

    /// Set authors
    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    /// Set description from an Option
    pub fn with_description_opt(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Set published date from an Option
    pub fn with_published_date_opt(mut self, published_date: Option<String>) -> Self {
        self.published_date = published_date;
        self
    }

    /// Set thumbnail URL from an Option
    pub fn with_thumbnail_opt(mut self, thumbnail_url: Option<String>) -> Self {
        self.thumbnail_url = thumbnail_url;
        self
    }

    /// Title for display, "Untitled" when missing
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Untitled"
        } else {
            &self.title
        }
    }

    /// Authors joined with ", " (empty string when there are none)
    pub fn authors_line(&self) -> String {
        self.authors.join(", ")
    }

    /// Description for display, "No description." when missing
    pub fn display_description(&self) -> &str {
        self.description.as_deref().unwrap_or("No description.")
    }

    /// Published date for display, "Unknown" when missing
    pub fn display_published_date(&self) -> &str {
        self.published_date.as_deref().unwrap_or("Unknown")
    }
}
