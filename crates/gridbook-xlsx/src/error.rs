//! Error types for the document layer

use thiserror::Error;

/// Result type for document operations
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// Errors that can occur reading, mutating, or writing a package.
///
/// Coordinate errors pass through transparently so their display strings
/// stay byte-for-byte stable (see `gridbook_core::Error`).
#[derive(Debug, Error)]
pub enum XlsxError {
    /// Sheet name did not resolve to a worksheet part
    #[error("sheet {0} is not exist")]
    SheetNotExist(String),

    /// Coordinate model failure (addresses, ranges, limits)
    #[error(transparent)]
    Coordinate(#[from] gridbook_core::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Invalid file format
    #[error("invalid XLSX format: {0}")]
    InvalidFormat(String),

    /// Missing required part
    #[error("missing required part: {0}")]
    MissingPart(String),

    /// Malformed stored XML content
    #[error("parse error: {0}")]
    Parse(String),
}

impl XlsxError {
    /// Best-effort duplicate for latching on an iterator while the original
    /// is returned to the caller. Coordinate and sheet errors copy exactly;
    /// io/zip/xml errors keep their message only.
    pub(crate) fn duplicate(&self) -> XlsxError {
        match self {
            XlsxError::SheetNotExist(name) => XlsxError::SheetNotExist(name.clone()),
            XlsxError::Coordinate(e) => XlsxError::Coordinate(e.clone()),
            XlsxError::InvalidFormat(msg) => XlsxError::InvalidFormat(msg.clone()),
            XlsxError::MissingPart(part) => XlsxError::MissingPart(part.clone()),
            XlsxError::Parse(msg) => XlsxError::Parse(msg.clone()),
            other => XlsxError::Parse(other.to_string()),
        }
    }
}
