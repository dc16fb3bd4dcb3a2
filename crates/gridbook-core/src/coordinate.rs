//! Conversions between cell references and numeric coordinates
//!
//! All numeric coordinates are 1-based: column 1 is "A", row 1 is the first
//! row. This matches the convention of the stored worksheet XML, where cell
//! references like "C4" carry 1-based positions.

use crate::error::{Error, Result};
use crate::{MAX_COLUMNS, MAX_ROWS};

/// Convert a column name ("A".."XFD", case-insensitive) to its 1-based index.
///
/// # Examples
/// ```
/// use gridbook_core::coordinate::column_name_to_number;
///
/// assert_eq!(column_name_to_number("A").unwrap(), 1);
/// assert_eq!(column_name_to_number("z").unwrap(), 26);
/// assert_eq!(column_name_to_number("AA").unwrap(), 27);
/// ```
pub fn column_name_to_number(name: &str) -> Result<u32> {
    if name.is_empty() {
        return Err(Error::ColumnName(name.to_string()));
    }

    let mut col: u64 = 0;
    for c in name.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(Error::ColumnName(name.to_string()));
        }
        col = col * 26 + (c.to_ascii_uppercase() as u64 - 'A' as u64 + 1);
        if col > MAX_COLUMNS as u64 {
            return Err(Error::ColumnName(name.to_string()));
        }
    }

    Ok(col as u32)
}

/// Convert a 1-based column index to its name (1 = "A", 27 = "AA").
pub fn column_number_to_name(col: u32) -> Result<String> {
    if col < 1 || col > MAX_COLUMNS {
        return Err(Error::ColumnNumber);
    }

    let mut name = String::new();
    let mut n = col;
    while n > 0 {
        n -= 1;
        name.insert(0, ((n % 26) as u8 + b'A') as char);
        n /= 26;
    }

    Ok(name)
}

/// Split a cell reference ("C4") into its column letters and row number.
///
/// The reference must match `[A-Za-z]+[1-9][0-9]*`; anything else fails with
/// [`Error::CellName`].
pub fn split_cell_name(cell: &str) -> Result<(&str, u32)> {
    let bytes = cell.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
        pos += 1;
    }

    let (letters, digits) = cell.split_at(pos);
    if letters.is_empty() || digits.is_empty() || digits.starts_with('0') {
        return Err(Error::CellName(cell.to_string()));
    }

    let row: u32 = digits
        .parse()
        .map_err(|_| Error::CellName(cell.to_string()))?;

    Ok((letters, row))
}

/// Convert a cell reference ("C4") to 1-based `(col, row)` coordinates.
///
/// Failures carry the offending reference and the underlying cause, e.g.
/// `cannot convert cell "A" to coordinates: invalid cell name "A"`.
pub fn cell_name_to_coordinates(cell: &str) -> Result<(u32, u32)> {
    let (letters, row) = split_cell_name(cell).map_err(|e| Error::cell_coordinates(cell, e))?;
    if row > MAX_ROWS {
        return Err(Error::cell_coordinates(cell, Error::RowNumber(row)));
    }
    let col = column_name_to_number(letters).map_err(|e| Error::cell_coordinates(cell, e))?;
    Ok((col, row))
}

/// Compose a cell reference from 1-based `(col, row)` coordinates.
pub fn coordinates_to_cell_name(col: u32, row: u32) -> Result<String> {
    if col < 1 || row < 1 || col > MAX_COLUMNS || row > MAX_ROWS {
        return Err(Error::CellReference(col, row));
    }
    Ok(format!("{}{}", column_number_to_name(col)?, row))
}

/// Compose a rectangular range reference ("A1:C3") from four 1-based bounds.
///
/// Bounds are normalized so the reference always runs top-left to
/// bottom-right, whichever corner was given first.
pub fn coordinates_to_range_ref(col1: u32, row1: u32, col2: u32, row2: u32) -> Result<String> {
    let (start_col, end_col) = if col1 <= col2 { (col1, col2) } else { (col2, col1) };
    let (start_row, end_row) = if row1 <= row2 { (row1, row2) } else { (row2, row1) };
    Ok(format!(
        "{}:{}",
        coordinates_to_cell_name(start_col, start_row)?,
        coordinates_to_cell_name(end_col, end_row)?
    ))
}

/// Decode a range reference to normalized `(start_col, start_row, end_col,
/// end_row)` bounds.
///
/// A bare cell reference ("C3") is accepted as a single-cell range; reversed
/// corners are swapped rather than rejected.
pub fn range_ref_to_coordinates(range_ref: &str) -> Result<(u32, u32, u32, u32)> {
    let (first, second) = match range_ref.split_once(':') {
        Some((a, b)) => (a, b),
        None => (range_ref, range_ref),
    };
    if first.is_empty() || second.is_empty() {
        return Err(Error::RangeRef(range_ref.to_string()));
    }

    let (col1, row1) = cell_name_to_coordinates(first)?;
    let (col2, row2) = cell_name_to_coordinates(second)?;

    Ok((
        col1.min(col2),
        row1.min(row2),
        col1.max(col2),
        row1.max(row2),
    ))
}
