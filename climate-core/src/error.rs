//! Error types shared by the dashboard core.

use thiserror::Error;

/// Invalid globe geometry. Raised while building a widget, never at runtime.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("viewport must have a positive size (got {width}x{height} px)")]
    EmptyViewport { width: f64, height: f64 },

    #[error("texture must have a positive size (got {width}x{height} px)")]
    EmptyTexture { width: f64, height: f64 },
}

/// Failures talking to the search, geocoding, climate or assistant services.
#[derive(Debug, Error)]
pub enum ClimateError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("{service} request failed with status {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// The body was not the JSON shape we expected.
    #[error("Failed to parse {service} response: {source}")]
    ResponseParse {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The payload parsed but lacks the section its period tag promises.
    #[error("Invalid climate payload: {0}")]
    InvalidPayload(String),

    /// The climate service returned an `error` field instead of data.
    #[error("Climate service reported an error: {0}")]
    Upstream(String),

    #[error("No location matches '{0}'")]
    NoMatch(String),

    #[error("{0}")]
    NotConfigured(String),
}

pub type Result<T> = std::result::Result<T, ClimateError>;
