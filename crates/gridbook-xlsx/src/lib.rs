//! OOXML spreadsheet package layer.
//!
//! A [`Workbook`] holds every part of a zip-packaged spreadsheet as raw
//! bytes, parses worksheet parts on demand, and serializes them back when
//! the package is written. Streaming cursors ([`Cols`], [`Rows`]) walk a
//! sheet without materializing it; structural operations (column
//! visibility, width, outline level, style, insert/remove) rewrite the
//! parsed form in place.
//!
//! ```no_run
//! use gridbook_xlsx::Workbook;
//!
//! # fn main() -> gridbook_xlsx::XlsxResult<()> {
//! let mut wb = Workbook::new();
//! wb.set_cell_value("Sheet1", "B2", "hello")?;
//! wb.set_col_width("Sheet1", "B", "B", 14.0)?;
//! wb.save_as("hello.xlsx")?;
//! # Ok(())
//! # }
//! ```

mod adjust;
mod cols;
mod document;
mod error;
mod rows;
pub mod worksheet;

pub use cols::Cols;
pub use document::{CellValue, Workbook};
pub use error::{XlsxError, XlsxResult};
pub use rows::Rows;
