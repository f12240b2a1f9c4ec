//! `OmdbApi` trait definition.
#![allow(clippy::future_not_send)]

use super::error::OmdbError;
use super::poster::Poster;
use super::types::SearchPage;

/// OMDb API trait.
///
/// Abstracts API operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
/// Implementations hold no mutable state; every call is independent.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(OmdbApi: Send)]
pub trait LocalOmdbApi {
    /// Searches movies by title (first page).
    ///
    /// # Errors
    ///
    /// Returns [`OmdbError::Request`] on a non-200 status,
    /// [`OmdbError::Transport`] if the request cannot be sent, and
    /// [`OmdbError::Decode`] if the JSON body does not match.
    async fn search_by_query(&self, query: &str) -> Result<SearchPage, OmdbError>;

    /// Searches movies by title, fetching an explicit page.
    ///
    /// # Errors
    ///
    /// Same as [`LocalOmdbApi::search_by_query`].
    async fn search_next_page(&self, query: &str, page: u32) -> Result<SearchPage, OmdbError>;

    /// Fetches the short plot for an IMDb id.
    ///
    /// A missing `Plot` field yields an empty string.
    ///
    /// # Errors
    ///
    /// Same as [`LocalOmdbApi::search_by_query`].
    async fn fetch_plot(&self, movie_id: &str) -> Result<String, OmdbError>;

    /// Fetches raw poster bytes from an absolute image URL.
    ///
    /// # Errors
    ///
    /// Returns [`OmdbError::InvalidUrl`] if `url` is not an absolute
    /// http(s) URL, otherwise the same errors as a search.
    async fn fetch_poster(&self, url: &str) -> Result<Poster, OmdbError>;
}
