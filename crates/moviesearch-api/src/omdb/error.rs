//! OMDb error taxonomy.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by OMDb operations.
#[derive(Debug, Error)]
#[allow(clippy::module_name_repetitions)]
pub enum OmdbError {
    /// Request URL could not be constructed.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// Offending URL text.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Server answered with a status other than 200.
    #[error("{command} request failed (HTTP {status})")]
    Request {
        /// Operation name.
        command: &'static str,
        /// Status returned by the server.
        status: StatusCode,
    },

    /// Request could not be sent or the body could not be read.
    #[error("{command} request failed")]
    Transport {
        /// Operation name.
        command: &'static str,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Response body did not match the expected JSON shape.
    #[error("failed to decode {command} response")]
    Decode {
        /// Operation name.
        command: &'static str,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// OMDb reported `"Response": "False"` with an error message.
    #[error("OMDb error: {0}")]
    Provider(String),

    /// Poster bytes are not a decodable image.
    #[error("poster is not a valid image")]
    ImageDecode(#[source] image::ImageError),
}

impl OmdbError {
    /// Returns the HTTP status for [`OmdbError::Request`].
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Request { status, .. } => Some(*status),
            _ => None,
        }
    }
}
