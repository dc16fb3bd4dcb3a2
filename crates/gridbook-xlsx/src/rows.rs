//! Row iteration and row-level operations

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use gridbook_core::coordinate::cell_name_to_coordinates;
use gridbook_core::{Error as CoreError, RowRange, MAX_OUTLINE_LEVEL};

use crate::document::Workbook;
use crate::error::{XlsxError, XlsxResult};
use crate::worksheet::scan_totals;

/// Streaming cursor over the rows of one sheet.
///
/// `next` visits every row position from 1 through the sheet's total row
/// count, including gaps with no stored row element. The stored XML is
/// consumed forward once; a stored row scanned ahead of the cursor is kept
/// until the cursor reaches it.
pub struct Rows<'a> {
    doc: &'a Workbook,
    sheet_xml: Vec<u8>,
    /// Byte offset of the unconsumed tail of `sheet_xml`
    pos: usize,
    cur_row: usize,
    total_rows: usize,
    /// Number of the last stored row scanned, for implicit row numbering
    last_row: usize,
    /// A stored row already scanned, waiting for the cursor to catch up
    stash: Option<(usize, Vec<String>)>,
    err: Option<XlsxError>,
}

impl std::fmt::Debug for Rows<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rows")
            .field("cur_row", &self.cur_row)
            .field("total_rows", &self.total_rows)
            .field("pos", &self.pos)
            .field("err", &self.err)
            .finish_non_exhaustive()
    }
}

impl Workbook {
    /// A row cursor over `sheet`, positioned before the first row.
    pub fn rows(&self, sheet: &str) -> XlsxResult<Rows<'_>> {
        let sheet_xml = self.sheet_xml(sheet)?;
        let (total_rows, _) = scan_totals(&sheet_xml)?;
        Ok(Rows {
            doc: self,
            sheet_xml,
            pos: 0,
            cur_row: 0,
            total_rows,
            last_row: 0,
            stash: None,
            err: None,
        })
    }

    /// All rows of `sheet` eagerly, one `Vec<String>` per row position up to
    /// the last populated row. Gap rows are empty vectors; each row is
    /// padded only to its own last populated cell.
    pub fn get_rows(&self, sheet: &str) -> XlsxResult<Vec<Vec<String>>> {
        let mut rows = self.rows(sheet)?;
        let mut out = Vec::with_capacity(rows.total_rows());
        while rows.next() {
            out.push(rows.columns()?);
        }
        Ok(out)
    }
}

impl<'a> Rows<'a> {
    /// Advance to the next row position; `false` once past the last row or
    /// after a decode error has been latched.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        if self.err.is_some() {
            return false;
        }
        if self.cur_row < self.total_rows {
            self.cur_row += 1;
            true
        } else {
            false
        }
    }

    /// 1-based number of the current row; 0 before the first `next`.
    pub fn current_row(&self) -> usize {
        self.cur_row
    }

    /// Total number of rows in the sheet.
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// The first error hit while reading row values, if any.
    pub fn error(&self) -> Option<&XlsxError> {
        self.err.as_ref()
    }

    /// The current row's cell values, padded with empty strings to the
    /// row's last populated cell. Gap rows yield an empty vector.
    pub fn columns(&mut self) -> XlsxResult<Vec<String>> {
        if self.cur_row == 0 {
            return Ok(Vec::new());
        }

        if let Some((stash_row, _)) = &self.stash {
            if *stash_row > self.cur_row {
                return Ok(Vec::new());
            }
            let (stash_row, values) = self.stash.take().unwrap_or_default();
            if stash_row == self.cur_row {
                return Ok(values);
            }
            // Stashed row fell behind the cursor; drop it and keep scanning
        }

        loop {
            match self.scan_next_row() {
                Ok(Some((row_num, values))) => {
                    if row_num == self.cur_row {
                        return Ok(values);
                    }
                    if row_num > self.cur_row {
                        // Scanned ahead: hold the row for a later position
                        self.stash = Some((row_num, values));
                        return Ok(Vec::new());
                    }
                    // Row behind the cursor was skipped over; discard it
                }
                Ok(None) => return Ok(Vec::new()),
                Err(e) => {
                    self.err = Some(e.duplicate());
                    return Err(e);
                }
            }
        }
    }

    /// Consume stored XML forward until the next row element, returning its
    /// row number and resolved cell values.
    fn scan_next_row(&mut self) -> XlsxResult<Option<(usize, Vec<String>)>> {
        if self.pos >= self.sheet_xml.len() {
            return Ok(None);
        }

        let tail = &self.sheet_xml[self.pos..];
        let mut reader = Reader::from_reader(tail);
        reader.trim_text(true);

        let mut buf = Vec::new();
        let mut row_num: Option<usize> = None;
        let mut values: Vec<String> = Vec::new();
        let mut last_col: usize = 0;
        let mut cell_type: Option<String> = None;
        let mut cell_value: Option<String> = None;
        let mut cell_inline: Option<String> = None;
        let mut in_cell = false;
        let mut in_value = false;
        let mut in_inline_str = false;
        let mut in_inline_text = false;

        let result = loop {
            match reader.read_event_into(&mut buf) {
                Ok(event @ (Event::Start(_) | Event::Empty(_))) => {
                    let is_empty = matches!(event, Event::Empty(_));
                    let e = match &event {
                        Event::Start(e) | Event::Empty(e) => e,
                        _ => unreachable!(),
                    };
                    match e.name().as_ref() {
                        b"row" => {
                            let mut num = self.last_row + 1;
                            for attr in e.attributes().flatten() {
                                if attr.key.as_ref() == b"r" {
                                    let value = attr
                                        .unescape_value()
                                        .map(|v| v.to_string())
                                        .unwrap_or_default();
                                    let parsed: u32 = value.parse().map_err(|_| {
                                        CoreError::RowReference(value.clone())
                                    })?;
                                    if parsed < 1 {
                                        return Err(CoreError::RowNumber(parsed).into());
                                    }
                                    num = parsed as usize;
                                }
                            }
                            self.last_row = num;
                            row_num = Some(num);
                            if is_empty {
                                break Some((num, Vec::new()));
                            }
                        }
                        b"c" if row_num.is_some() => {
                            in_cell = true;
                            cell_type = None;
                            cell_value = None;
                            cell_inline = None;
                            let mut col = last_col + 1;
                            for attr in e.attributes().flatten() {
                                let value = attr
                                    .unescape_value()
                                    .map(|v| v.to_string())
                                    .unwrap_or_default();
                                match attr.key.as_ref() {
                                    b"r" => {
                                        let (c, _) = cell_name_to_coordinates(&value)
                                            .map_err(XlsxError::Coordinate)?;
                                        col = c as usize;
                                    }
                                    b"t" => cell_type = Some(value),
                                    _ => {}
                                }
                            }
                            last_col = col;
                            if is_empty {
                                in_cell = false;
                                self.push_cell_value(
                                    &mut values,
                                    col,
                                    &cell_type,
                                    &cell_value,
                                    &cell_inline,
                                );
                            }
                        }
                        b"v" if in_cell => in_value = true,
                        b"is" if in_cell => in_inline_str = true,
                        b"t" if in_inline_str => in_inline_text = true,
                        _ => {}
                    }
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"row" => {
                        if let Some(num) = row_num {
                            break Some((num, values));
                        }
                    }
                    b"c" => {
                        if in_cell {
                            in_cell = false;
                            self.push_cell_value(
                                &mut values,
                                last_col,
                                &cell_type,
                                &cell_value,
                                &cell_inline,
                            );
                        }
                    }
                    b"v" => in_value = false,
                    b"is" => in_inline_str = false,
                    b"t" => in_inline_text = false,
                    _ => {}
                },
                Ok(Event::Text(e)) => {
                    let text = e.unescape().map_err(XlsxError::Xml)?.to_string();
                    if in_value {
                        cell_value = Some(text);
                    } else if in_inline_text {
                        cell_inline = Some(text);
                    }
                }
                Ok(Event::Eof) => break None,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        };

        self.pos += reader.buffer_position();
        Ok(result)
    }

    fn push_cell_value(
        &self,
        values: &mut Vec<String>,
        col: usize,
        cell_type: &Option<String>,
        cell_value: &Option<String>,
        cell_inline: &Option<String>,
    ) {
        let cell = crate::worksheet::Cell {
            reference: String::new(),
            cell_type: cell_type.clone(),
            style: None,
            value: cell_value.clone(),
            formula: None,
            inline_string: cell_inline.clone(),
        };
        let resolved = cell.value_string(self.doc.shared_strings());
        if values.len() < col {
            values.resize(col, String::new());
        }
        values[col - 1] = resolved;
    }
}

impl Workbook {
    /// Show or hide a single row.
    pub fn set_row_visible(&mut self, sheet: &str, row: u32, visible: bool) -> XlsxResult<()> {
        RowRange::new(row, row).map_err(XlsxError::Coordinate)?;
        self.with_sheet_mut(sheet, |ws| {
            ws.row_mut(row).hidden = !visible;
            Ok(())
        })
    }

    /// Whether a row is visible. Rows with no stored element are visible.
    pub fn get_row_visible(&self, sheet: &str, row: u32) -> XlsxResult<bool> {
        RowRange::new(row, row).map_err(XlsxError::Coordinate)?;
        self.with_sheet(sheet, |ws| {
            Ok(ws.row(row).map(|r| !r.hidden).unwrap_or(true))
        })
    }

    /// Set the outline (grouping) level of a single row, 1 through 7.
    pub fn set_row_outline_level(&mut self, sheet: &str, row: u32, level: u8) -> XlsxResult<()> {
        RowRange::new(row, row).map_err(XlsxError::Coordinate)?;
        if level < 1 || level > MAX_OUTLINE_LEVEL {
            return Err(CoreError::OutlineLevel.into());
        }
        self.with_sheet_mut(sheet, |ws| {
            ws.row_mut(row).outline_level = level;
            Ok(())
        })
    }

    /// The outline level of a row; 0 when the row has no stored element.
    pub fn get_row_outline_level(&self, sheet: &str, row: u32) -> XlsxResult<u8> {
        RowRange::new(row, row).map_err(XlsxError::Coordinate)?;
        self.with_sheet(sheet, |ws| {
            Ok(ws.row(row).map(|r| r.outline_level).unwrap_or(0))
        })
    }
}
