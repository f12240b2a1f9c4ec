//! API client library for moviesearch.
//!
//! Provides a stateless OMDb client, an incremental search session that
//! owns the pagination cursor, and a per-row fetcher for posters and plots.

/// OMDb API client.
pub mod omdb;

/// Per-row poster and plot fetches.
pub mod rows;

/// Incremental paginated search session.
pub mod session;
