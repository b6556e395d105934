//! Error types for the structchunk library.

use std::io;
use thiserror::Error;

/// Result type alias for structchunk operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while turning a document into chunks.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading inputs or writing artifacts.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure or content streams.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Page index is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Image bytes could not be decoded or re-encoded.
    #[error("Image decoding error: {0}")]
    ImageDecode(String),

    /// The tokenizer could not be constructed.
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// JSON (de)serialization of an artifact failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An input selection pattern (glob or regex) is malformed.
    #[error("Invalid input pattern: {0}")]
    InvalidPattern(String),

    /// The input selection matched no files.
    #[error("No matching input: {0}")]
    NoMatchingInput(String),

    /// A configuration value is out of its valid range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => Error::Io(e),
            _ => Error::ImageDecode(err.to_string()),
        }
    }
}
