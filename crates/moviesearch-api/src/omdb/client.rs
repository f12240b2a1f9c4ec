//! `OmdbClient` - OMDb API client implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use tracing::instrument;
use url::Url;

use super::api::OmdbApi;
use super::error::OmdbError;
use super::poster::Poster;
use super::types::{SearchPage, parse_plot_response, parse_search_response};

/// Default base URL for the OMDb API.
const DEFAULT_BASE_URL: &str = "https://www.omdbapi.com/";

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// OMDb API client.
///
/// Stateless apart from its configuration: the pagination cursor lives in
/// [`crate::session::SearchSession`].
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct OmdbClient {
    /// HTTP client.
    http_client: Client,
    /// Base URL for API requests.
    base_url: Url,
    /// Static API key sent as `apikey`.
    api_key: String,
}

/// Builder for `OmdbClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct OmdbClientBuilder {
    base_url: Option<Url>,
    api_key: Option<String>,
    user_agent: Option<String>,
    timeout: Option<Duration>,
}

impl OmdbClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            api_key: None,
            user_agent: None,
            timeout: None,
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the API key (required).
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the per-request timeout (default: 10s).
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `api_key` is not set or blank.
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<OmdbClient> {
        let api_key = self
            .api_key
            .filter(|key| !key.trim().is_empty())
            .context("api_key is required")?;
        let user_agent = self.user_agent.context("user_agent is required")?;

        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            let result = Url::parse(DEFAULT_BASE_URL);
            result.context("invalid default base URL")?
        };

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .context("failed to build HTTP client")?;

        Ok(OmdbClient {
            http_client,
            base_url,
            api_key,
        })
    }
}

impl OmdbClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> OmdbClientBuilder {
        OmdbClientBuilder::new()
    }

    /// Sends a GET to the API endpoint with `apikey` plus `query` and
    /// returns the body of a 200 response.
    #[instrument(skip_all)]
    async fn get_text(
        &self,
        command: &'static str,
        query: &[(&str, String)],
    ) -> Result<String, OmdbError> {
        tracing::debug!(%command, ?query, "OMDb API request");

        let response = self
            .http_client
            .get(self.base_url.clone())
            .query(&[("apikey", self.api_key.as_str())])
            .query(query)
            .send()
            .await
            .map_err(|source| OmdbError::Transport { command, source })?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!(%command, %status, "OMDb API returned non-200 status");
            return Err(OmdbError::Request { command, status });
        }

        let body = response
            .text()
            .await
            .map_err(|source| OmdbError::Transport { command, source })?;
        tracing::debug!(%command, body_len = body.len(), "Response body received");
        Ok(body)
    }

    /// Runs a search for `query`, optionally at an explicit page.
    async fn search(
        &self,
        command: &'static str,
        query: &str,
        page: Option<u32>,
    ) -> Result<SearchPage, OmdbError> {
        let mut params: Vec<(&str, String)> = vec![
            ("type", String::from("movie")),
            ("s", String::from(query)),
        ];
        if let Some(page) = page {
            params.push(("page", page.to_string()));
        }

        let body = self.get_text(command, &params).await?;
        let page = parse_search_response(command, &body)?;
        tracing::debug!(
            %command,
            fetched = page.movies.len(),
            total = ?page.total_results,
            "Search page decoded"
        );
        Ok(page)
    }
}

/// Parses a poster URL, accepting only absolute http(s) URLs.
fn parse_poster_url(raw: &str) -> Result<Url, OmdbError> {
    let url = Url::parse(raw).map_err(|e| OmdbError::InvalidUrl {
        url: String::from(raw),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(OmdbError::InvalidUrl {
            url: String::from(raw),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(url)
}

impl OmdbApi for OmdbClient {
    #[instrument(skip_all)]
    async fn search_by_query(&self, query: &str) -> Result<SearchPage, OmdbError> {
        self.search("search", query, None).await
    }

    #[instrument(skip_all, fields(page = page))]
    async fn search_next_page(&self, query: &str, page: u32) -> Result<SearchPage, OmdbError> {
        self.search("search page", query, Some(page)).await
    }

    #[instrument(skip_all)]
    async fn fetch_plot(&self, movie_id: &str) -> Result<String, OmdbError> {
        let params = [
            ("i", String::from(movie_id)),
            ("plot", String::from("short")),
        ];
        let body = self.get_text("plot", &params).await?;
        parse_plot_response("plot", &body)
    }

    #[instrument(skip_all)]
    async fn fetch_poster(&self, url: &str) -> Result<Poster, OmdbError> {
        let command = "poster";
        let url = parse_poster_url(url)?;

        tracing::debug!(%url, "Poster request");
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|source| OmdbError::Transport { command, source })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(OmdbError::Request { command, status });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let bytes = response
            .bytes()
            .await
            .map_err(|source| OmdbError::Transport { command, source })?;

        Ok(Poster {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}
