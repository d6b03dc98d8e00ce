//! Error types for docfill library.

use std::io;
use thiserror::Error;

/// Result type alias for docfill operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while loading, filling or saving documents.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not recognized as a Word package.
    #[error("Unknown file format: not a valid DOCX package")]
    UnknownFormat,

    /// Error reading or writing the ZIP container.
    #[error("Package container error: {0}")]
    Zip(String),

    /// Malformed XML inside a package part.
    #[error("XML error in {part}: {message}")]
    Xml {
        /// Package part being parsed
        part: String,
        /// Parser message
        message: String,
    },

    /// A required package part is missing.
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// The package structure is corrupted or malformed.
    #[error("Corrupted document structure: {0}")]
    Corrupted(String),

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The text generation collaborator failed.
    #[error("Generation error: {0}")]
    Generation(String),

    /// No section with the requested ordinal.
    #[error("Section {0} is out of range (document has {1} sections)")]
    SectionNotFound(usize, usize),

    /// Error during rendering (JSON, text).
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build an XML error for the given package part.
    pub fn xml(part: impl Into<String>, message: impl ToString) -> Self {
        Error::Xml {
            part: part.into(),
            message: message.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            zip::result::ZipError::FileNotFound => {
                Error::MissingPart("requested package part".to_string())
            }
            _ => Error::Zip(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnknownFormat;
        assert_eq!(err.to_string(), "Unknown file format: not a valid DOCX package");

        let err = Error::SectionNotFound(7, 3);
        assert_eq!(
            err.to_string(),
            "Section 7 is out of range (document has 3 sections)"
        );

        let err = Error::xml("word/document.xml", "unexpected end");
        assert_eq!(
            err.to_string(),
            "XML error in word/document.xml: unexpected end"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_zip_error_conversion() {
        let err: Error = zip::result::ZipError::InvalidArchive("bad header".into()).into();
        assert!(matches!(err, Error::Zip(_)));
    }
}
