//! OMDb response types.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::error::OmdbError;

/// `Error` message OMDb sends with HTTP 200 when a search has no hits.
const NOT_FOUND_MESSAGE: &str = "Movie not found!";

/// Marker OMDb uses for absent string values.
const NOT_AVAILABLE: &str = "N/A";

// --- Movie ---

/// A single movie search result.
///
/// Equality and hashing consider only the IMDb id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    #[serde(rename = "imdbID")]
    id: String,
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Year", default)]
    year: String,
    #[serde(rename = "Poster", default)]
    poster_url: String,
}

impl Movie {
    /// Creates a movie record.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        year: impl Into<String>,
        poster_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            year: year.into(),
            poster_url: poster_url.into(),
        }
    }

    /// IMDb id (e.g. `tt0078748`).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Release year as reported (may be a range such as `2019–2022`).
    #[must_use]
    pub fn year(&self) -> &str {
        &self.year
    }

    /// Poster URL as reported (`N/A` when the provider has none).
    #[must_use]
    pub fn poster_url(&self) -> &str {
        &self.poster_url
    }

    /// Returns `true` if the provider reported a poster.
    #[must_use]
    pub fn has_poster(&self) -> bool {
        !self.poster_url.is_empty() && self.poster_url != NOT_AVAILABLE
    }
}

impl PartialEq for Movie {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Movie {}

impl Hash for Movie {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// --- Search ---

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    /// Movies in provider order.
    pub movies: Vec<Movie>,
    /// Total hits across all pages, when reported.
    pub total_results: Option<u32>,
}

/// Raw body of a search request.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "Search", default)]
    search: Option<Vec<Movie>>,
    #[serde(rename = "totalResults", default)]
    total_results: Option<String>,
    #[serde(rename = "Response", default)]
    response: Option<String>,
    #[serde(rename = "Error", default)]
    error: Option<String>,
}

/// Parses a search response body.
///
/// A body without `Search` (or OMDb's "Movie not found!" error) is an
/// empty page.
pub(crate) fn parse_search_response(
    command: &'static str,
    body: &str,
) -> Result<SearchPage, OmdbError> {
    let raw: SearchResponse =
        serde_json::from_str(body).map_err(|source| OmdbError::Decode { command, source })?;

    check_provider_error(raw.response.as_deref(), raw.error, &[NOT_FOUND_MESSAGE])?;

    let total_results = raw
        .total_results
        .as_deref()
        .and_then(|s| s.trim().parse::<u32>().ok());

    Ok(SearchPage {
        movies: raw.search.unwrap_or_default(),
        total_results,
    })
}

// --- Plot ---

/// Raw body of an id lookup.
#[derive(Debug, Deserialize)]
struct PlotResponse {
    #[serde(rename = "Plot", default)]
    plot: Option<String>,
    #[serde(rename = "Response", default)]
    response: Option<String>,
    #[serde(rename = "Error", default)]
    error: Option<String>,
}

/// Parses a plot response body.
///
/// Missing, `null`, and `N/A` plots all become an empty string.
pub(crate) fn parse_plot_response(command: &'static str, body: &str) -> Result<String, OmdbError> {
    let raw: PlotResponse =
        serde_json::from_str(body).map_err(|source| OmdbError::Decode { command, source })?;

    check_provider_error(raw.response.as_deref(), raw.error, &[])?;

    Ok(raw
        .plot
        .filter(|plot| plot != NOT_AVAILABLE)
        .unwrap_or_default())
}

/// Maps `"Response": "False"` to [`OmdbError::Provider`] unless the
/// message is in `tolerated`.
fn check_provider_error(
    response: Option<&str>,
    error: Option<String>,
    tolerated: &[&str],
) -> Result<(), OmdbError> {
    if response != Some("False") {
        return Ok(());
    }
    let message = error.unwrap_or_else(|| String::from("unknown error"));
    if tolerated.contains(&message.as_str()) {
        tracing::debug!(%message, "OMDb returned no results");
        return Ok(());
    }
    Err(OmdbError::Provider(message))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::panic)]

    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_movie_equality_uses_id_only() {
        // Arrange
        let a = Movie::new("tt0078748", "Alien", "1979", "N/A");
        let b = Movie::new("tt0078748", "Alien (Director's Cut)", "2003", "");

        // Act
        let set: HashSet<Movie> = [a.clone(), b.clone()].into_iter().collect();

        // Assert
        assert_eq!(a, b);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_movie_has_poster() {
        // Arrange & Act & Assert
        assert!(!Movie::new("tt1", "A", "2000", "N/A").has_poster());
        assert!(!Movie::new("tt1", "A", "2000", "").has_poster());
        assert!(Movie::new("tt1", "A", "2000", "https://img.example/a.jpg").has_poster());
    }

    #[test]
    fn test_parse_search_empty_array() {
        // Arrange
        let body = r#"{"Search": []}"#;

        // Act
        let page = parse_search_response("search", body).unwrap();

        // Assert
        assert!(page.movies.is_empty());
        assert_eq!(page.total_results, None);
    }

    #[test]
    fn test_parse_search_without_search_field() {
        // Arrange
        let body = r#"{"Response":"True"}"#;

        // Act
        let page = parse_search_response("search", body).unwrap();

        // Assert
        assert!(page.movies.is_empty());
    }

    #[test]
    fn test_parse_search_null_search_field() {
        // Arrange
        let body = r#"{"Search": null, "totalResults": "0"}"#;

        // Act
        let page = parse_search_response("search", body).unwrap();

        // Assert
        assert!(page.movies.is_empty());
        assert_eq!(page.total_results, Some(0));
    }

    #[test]
    fn test_parse_search_provider_error() {
        // Arrange
        let body = r#"{"Response":"False","Error":"Too many results."}"#;

        // Act
        let result = parse_search_response("search", body);

        // Assert
        match result {
            Err(OmdbError::Provider(message)) => assert_eq!(message, "Too many results."),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_parse_search_shape_mismatch() {
        // Arrange
        let body = r#"{"Search": [{"Title": "no id"}]}"#;

        // Act
        let result = parse_search_response("search", body);

        // Assert
        assert!(matches!(result, Err(OmdbError::Decode { .. })));
    }

    #[test]
    fn test_parse_plot_missing_field_is_empty() {
        // Arrange
        let body = r#"{"Title":"Alien","Response":"True"}"#;

        // Act
        let plot = parse_plot_response("plot", body).unwrap();

        // Assert
        assert_eq!(plot, "");
    }

    #[test]
    fn test_parse_plot_not_available_is_empty() {
        // Arrange
        let body = r#"{"Plot":"N/A","Response":"True"}"#;

        // Act
        let plot = parse_plot_response("plot", body).unwrap();

        // Assert
        assert_eq!(plot, "");
    }

    #[test]
    fn test_parse_plot_malformed_json() {
        // Arrange
        let body = r#"{"Plot": 42"#;

        // Act
        let result = parse_plot_response("plot", body);

        // Assert
        assert!(matches!(result, Err(OmdbError::Decode { command: "plot", .. })));
    }
}
