//! # gridbook-core
//!
//! Coordinate model for the gridbook spreadsheet library.
//!
//! This crate provides the pure, I/O-free pieces shared by the document
//! layer:
//! - the coordinate codec between column letters ("A".."XFD"), 1-based
//!   numeric indices, and combined cell references ("C4"),
//! - [`ColumnRange`]/[`RowRange`] resolvers that normalize user-supplied
//!   endpoints,
//! - the error taxonomy for malformed addresses and format limits.
//!
//! ## Example
//!
//! ```rust
//! use gridbook_core::coordinate;
//!
//! assert_eq!(coordinate::column_name_to_number("AB").unwrap(), 28);
//! assert_eq!(coordinate::column_number_to_name(28).unwrap(), "AB");
//!
//! let (col, row) = coordinate::cell_name_to_coordinates("C4").unwrap();
//! assert_eq!((col, row), (3, 4));
//! ```

pub mod coordinate;
pub mod error;
pub mod range;

// Re-exports for convenience
pub use error::{Error, Result};
pub use range::{ColumnRange, RowRange};

/// Maximum number of rows in a worksheet (format limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (format limit)
pub const MAX_COLUMNS: u32 = 16_384;

/// Maximum column width, in character units
pub const MAX_COLUMN_WIDTH: f64 = 255.0;

/// Maximum outline (grouping) level for rows and columns
pub const MAX_OUTLINE_LEVEL: u8 = 7;

/// Width reported for columns without an explicit width record
pub const DEFAULT_COL_WIDTH: f64 = 9.140625;
