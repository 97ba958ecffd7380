//! Google Books API provider
//!
//! Implementation of `BookProvider` for the Google Books volumes API
//! (<https://developers.google.com/books/docs/v1/using>).

use crate::config::providers::GOOGLE_BOOKS_DEFAULT_SERVER;
use crate::data::settings::Settings;
use crate::data::types::Book;
use crate::error::{AppError, Result, SearchError};
use crate::network::HttpClient;

use super::traits::BookProvider;

use reqwest::Url;
use serde::Deserialize;

// =============================================================================
// Internal API response types (serde)
// =============================================================================

#[derive(Debug, Deserialize)]
struct GbVolumes {
    #[serde(default)]
    items: Option<Vec<GbVolume>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GbVolume {
    #[serde(default)]
    id: String,
    #[serde(default)]
    volume_info: GbVolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GbVolumeInfo {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    authors: Option<Vec<String>>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    published_date: Option<String>,
    #[serde(default)]
    image_links: Option<GbImageLinks>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GbImageLinks {
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    small_thumbnail: Option<String>,
}

// =============================================================================
// GbVolume -> Book conversion
// =============================================================================

/// Drop empty and whitespace-only strings
fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

impl GbVolume {
    /// Map to a `Book`, `None` if the volume has no usable id
    fn into_book(self) -> Option<Book> {
        if self.id.trim().is_empty() {
            return None;
        }

        let info = self.volume_info;
        let authors: Vec<String> = info
            .authors
            .unwrap_or_default()
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();

        // Prefer the regular thumbnail, fall back to the small one
        let thumbnail = info
            .image_links
            .and_then(|links| non_empty(links.thumbnail).or(non_empty(links.small_thumbnail)));

        Some(
            Book::new(self.id, info.title.unwrap_or_default())
                .with_authors(authors)
                .with_description_opt(non_empty(info.description))
                .with_published_date_opt(non_empty(info.published_date))
                .with_thumbnail_opt(thumbnail),
        )
    }
}

// =============================================================================
// GoogleBooksProvider
// =============================================================================

/// Google Books API provider
pub struct GoogleBooksProvider {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
}

impl GoogleBooksProvider {
    /// Create a provider using the public API endpoint
    pub fn new() -> Result<Self> {
        Self::with_base_url(GOOGLE_BOOKS_DEFAULT_SERVER)
    }

    /// Create a provider with a custom base URL (for testing or proxies)
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self::with_client(HttpClient::new()?, base_url))
    }

    /// Create a provider from user settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut provider = Self::with_base_url(settings.api_base_url.as_str())?;
        provider.api_key = settings.api_key.clone();
        Ok(provider)
    }

    fn with_client(client: HttpClient, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    /// Build a full API URL from an endpoint path
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Query parameters appended to every request
    fn params<'a>(&'a self, extra: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
        let mut params = extra.to_vec();
        if let Some(key) = &self.api_key {
            params.push(("key", key.as_str()));
        }
        params
    }

    fn fetch_volumes(&self, query: &str) -> Result<Vec<Book>> {
        let response: GbVolumes = self
            .client
            .get_json(&self.url("/volumes"), &self.params(&[("q", query)]))?;

        let books: Vec<Book> = response
            .items
            .unwrap_or_default()
            .into_iter()
            .filter_map(GbVolume::into_book)
            .collect();
        tracing::debug!(query, count = books.len(), "search complete");
        Ok(books)
    }

    /// Single-volume URL with `id` percent-encoded as one path segment
    fn volume_url(&self, id: &str) -> Result<Url> {
        let invalid = || AppError::Config(format!("Invalid API URL: {}", self.base_url));
        let mut url = Url::parse(&self.url("/volumes")).map_err(|_| invalid())?;
        url.path_segments_mut().map_err(|_| invalid())?.push(id);
        Ok(url)
    }

    fn fetch_volume(&self, id: &str) -> Result<Option<Book>> {
        let url = self.volume_url(id)?;
        let volume: Option<GbVolume> = self.client.get_json_opt(url.as_str(), &self.params(&[]))?;
        Ok(volume.and_then(GbVolume::into_book))
    }
}

impl BookProvider for GoogleBooksProvider {
    fn name(&self) -> &'static str {
        "Google Books"
    }

    fn search(&self, query: &str) -> std::result::Result<Vec<Book>, SearchError> {
        self.fetch_volumes(query).map_err(|e| {
            tracing::warn!(query, error = %e, "search failed");
            SearchError::from(e)
        })
    }

    fn get_volume(&self, id: &str) -> std::result::Result<Option<Book>, SearchError> {
        self.fetch_volume(id).map_err(SearchError::from)
    }
}

// =============================================================================
// Tests
// =============================================================================
