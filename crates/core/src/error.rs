//! Error types for slide reuse.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while listing, reading, or inserting slides.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read a local file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The Graph service answered with a non-success status.
    #[error("Graph request failed with status {status}: {message}")]
    Graph {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// The request never produced a response (connection, TLS, decoding).
    #[error("Request error: {0}")]
    Request(String),

    /// A JSON payload did not have the expected shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to parse the PPTX package structure.
    #[error("PPTX parsing error: {0}")]
    PptxParseError(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (for PPTX).
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// The presentation host rejected or failed a call.
    #[error("Host error: {0}")]
    Host(String),
}
