//! OMDb API client module.
//!
//! Handles HTTP requests to the OMDb endpoint (title search, paginated
//! search, plot lookup) and plain GETs of poster image URLs.

mod api;
mod client;
mod error;
pub(crate) mod poster;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalOmdbApi, OmdbApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{OmdbClient, OmdbClientBuilder};
#[allow(clippy::module_name_repetitions)]
pub use error::OmdbError;
pub use poster::{DecodedPoster, Poster, decode_poster};
pub use types::{Movie, SearchPage};
