//! Reference adjustment after structural column changes
//!
//! Inserting columns shifts everything at or right of the anchor column by
//! the offset; removing a column shifts left and shrinks ranges that span
//! it. The stored dimension hint is dropped afterwards since the populated
//! area may have moved or shrunk.

use gridbook_core::coordinate::{
    cell_name_to_coordinates, coordinates_to_cell_name, coordinates_to_range_ref,
    range_ref_to_coordinates,
};
use gridbook_core::{Error as CoreError, MAX_COLUMNS};

use crate::error::{XlsxError, XlsxResult};
use crate::worksheet::Worksheet;

/// Shift a column index by `offset` relative to an edit at `col`.
///
/// `None` means the index fell off the left edge (its column was removed);
/// overflow past the last valid column is an error.
fn shifted(value: u32, col: u32, offset: i64) -> XlsxResult<Option<u32>> {
    if value < col {
        return Ok(Some(value));
    }
    let moved = value as i64 + offset;
    if moved < 1 {
        return Ok(None);
    }
    if moved > MAX_COLUMNS as i64 {
        return Err(CoreError::ColumnNumber.into());
    }
    Ok(Some(moved as u32))
}

/// Apply a column insertion (`offset > 0`, before `col`) or removal
/// (`offset == -1`, of `col`) to every stored structure of the sheet.
pub(crate) fn adjust_columns(ws: &mut Worksheet, col: u32, offset: i64) -> XlsxResult<()> {
    adjust_cells(ws, col, offset)?;
    adjust_col_records(ws, col, offset)?;
    adjust_merge_cells(ws, col, offset)?;
    adjust_hyperlinks(ws, col, offset)?;
    ws.clear_dimension();
    Ok(())
}

fn adjust_cells(ws: &mut Worksheet, col: u32, offset: i64) -> XlsxResult<()> {
    for row in &mut ws.rows {
        for cell in &mut row.cells {
            let (cell_col, cell_row) =
                cell_name_to_coordinates(&cell.reference).map_err(XlsxError::Coordinate)?;
            if let Some(moved) = shifted(cell_col, col, offset)? {
                if moved != cell_col {
                    cell.reference =
                        coordinates_to_cell_name(moved, cell_row).map_err(XlsxError::Coordinate)?;
                }
            }
        }
    }
    Ok(())
}

fn adjust_col_records(ws: &mut Worksheet, col: u32, offset: i64) -> XlsxResult<()> {
    let mut kept = Vec::with_capacity(ws.cols.len());
    for mut record in ws.cols.drain(..) {
        if offset < 0 {
            // Removal: spans covering the column shrink by one
            if record.min > col {
                record.min -= 1;
            }
            if record.max >= col {
                if record.max == record.min && record.max == col {
                    continue;
                }
                record.max -= 1;
            }
            if record.max < record.min || record.min < 1 {
                continue;
            }
        } else {
            if record.min >= col {
                match shifted(record.min, col, offset)? {
                    Some(moved) => record.min = moved,
                    None => continue,
                }
            }
            if record.max >= col {
                match shifted(record.max, col, offset)? {
                    Some(moved) => record.max = moved,
                    None => continue,
                }
            }
        }
        kept.push(record);
    }
    ws.cols = kept;
    Ok(())
}

fn adjust_merge_cells(ws: &mut Worksheet, col: u32, offset: i64) -> XlsxResult<()> {
    let mut kept = Vec::with_capacity(ws.merge_cells.len());
    for merge_ref in ws.merge_cells.drain(..) {
        let (mut c1, r1, mut c2, r2) =
            range_ref_to_coordinates(&merge_ref).map_err(XlsxError::Coordinate)?;
        if offset < 0 {
            // The whole merge lived in the removed column
            if c1 == col && c2 == col {
                continue;
            }
            if c1 > col {
                c1 -= 1;
            }
            if c2 >= col {
                c2 -= 1;
            }
            // A merge collapsed to a single cell is dropped
            if c1 == c2 && r1 == r2 {
                continue;
            }
        } else {
            if let Some(moved) = shifted(c1, col, offset)? {
                c1 = moved;
            }
            if let Some(moved) = shifted(c2, col, offset)? {
                c2 = moved;
            }
        }
        kept.push(coordinates_to_range_ref(c1, r1, c2, r2).map_err(XlsxError::Coordinate)?);
    }
    ws.merge_cells = kept;
    Ok(())
}

fn adjust_hyperlinks(ws: &mut Worksheet, col: u32, offset: i64) -> XlsxResult<()> {
    let mut kept = Vec::with_capacity(ws.hyperlinks.len());
    for mut link in ws.hyperlinks.drain(..) {
        let (link_col, link_row) =
            cell_name_to_coordinates(&link.reference).map_err(XlsxError::Coordinate)?;
        if offset < 0 && link_col == col {
            // Anchor column removed: the link goes with it
            continue;
        }
        if let Some(moved) = shifted(link_col, col, offset)? {
            if moved != link_col {
                link.reference =
                    coordinates_to_cell_name(moved, link_row).map_err(XlsxError::Coordinate)?;
            }
        }
        kept.push(link);
    }
    ws.hyperlinks = kept;
    Ok(())
}
