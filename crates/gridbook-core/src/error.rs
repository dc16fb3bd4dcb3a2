//! Error types for gridbook-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the coordinate model.
///
/// Display strings are part of the public contract: callers match on them
/// for compatibility, so the wording here must not change.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Column name is empty, contains non-letters, or decodes past the limit
    #[error("invalid column name {0:?}")]
    ColumnName(String),

    /// Numeric column index outside 1..=16384
    #[error("the column number must be greater than or equal to 1 and less than or equal to 16384")]
    ColumnNumber,

    /// Cell reference does not match `[A-Z]+[1-9][0-9]*`
    #[error("invalid cell name {0:?}")]
    CellName(String),

    /// Numeric cell coordinates outside the sheet limits
    #[error("invalid cell reference [{0}, {1}]")]
    CellReference(u32, u32),

    /// Row number outside 1..=1048576
    #[error("invalid row number {0}")]
    RowNumber(u32),

    /// Stored row attribute that does not parse as a row number
    #[error("invalid row reference {0:?}")]
    RowReference(String),

    /// Cell reference that failed coordinate conversion, with the cause
    #[error("cannot convert cell {cell:?} to coordinates: {source}")]
    CellCoordinates {
        /// The offending reference as stored
        cell: String,
        /// The underlying parse failure
        #[source]
        source: Box<Error>,
    },

    /// Range reference that is not two `:`-separated cell names
    #[error("invalid range reference {0:?}")]
    RangeRef(String),

    /// Requested outline level beyond the format maximum
    #[error("invalid outline level, the outline level must be in the range 1-7")]
    OutlineLevel,

    /// Requested column width beyond the format maximum
    #[error("the width of the column must be less than or equal to 255 characters")]
    ColumnWidth,
}

impl Error {
    /// Wrap a cell-name parse failure with the reference that caused it
    pub fn cell_coordinates(cell: &str, source: Error) -> Self {
        Error::CellCoordinates {
            cell: cell.to_string(),
            source: Box::new(source),
        }
    }
}
