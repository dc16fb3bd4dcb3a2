//! Column iteration and structural column operations

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use gridbook_core::coordinate::{cell_name_to_coordinates, column_name_to_number};
use gridbook_core::{
    ColumnRange, Error as CoreError, DEFAULT_COL_WIDTH, MAX_COLUMN_WIDTH, MAX_OUTLINE_LEVEL,
};

use crate::adjust::adjust_columns;
use crate::document::Workbook;
use crate::error::{XlsxError, XlsxResult};
use crate::worksheet::{parse_row_number, scan_totals, Cell, Col};

/// Streaming cursor over the columns of one sheet.
///
/// The total column and row counts are resolved once when the cursor is
/// built (from the dimension hint when present, otherwise by a forward scan
/// of the stored XML); [`Cols::rows`] token-scans the sheet for the current
/// column's values, buffering one cell at a time.
pub struct Cols<'a> {
    doc: &'a Workbook,
    sheet_xml: Vec<u8>,
    cur_col: usize,
    total_cols: usize,
    total_rows: usize,
    err: Option<XlsxError>,
}

impl std::fmt::Debug for Cols<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cols")
            .field("cur_col", &self.cur_col)
            .field("total_cols", &self.total_cols)
            .field("total_rows", &self.total_rows)
            .field("err", &self.err)
            .finish_non_exhaustive()
    }
}

impl Workbook {
    /// A column cursor over `sheet`, positioned before the first column.
    pub fn cols(&self, sheet: &str) -> XlsxResult<Cols<'_>> {
        let sheet_xml = self.sheet_xml(sheet)?;
        let (total_rows, total_cols) = scan_totals(&sheet_xml)?;
        Ok(Cols {
            doc: self,
            sheet_xml,
            cur_col: 0,
            total_cols,
            total_rows,
            err: None,
        })
    }

    /// All columns of `sheet` eagerly, one `Vec<String>` per column, each
    /// padded with empty strings to the sheet's total row count.
    pub fn get_cols(&self, sheet: &str) -> XlsxResult<Vec<Vec<String>>> {
        let mut cols = self.cols(sheet)?;
        let mut out = Vec::with_capacity(cols.total_cols());
        while cols.next() {
            out.push(cols.rows()?);
        }
        Ok(out)
    }
}

impl<'a> Cols<'a> {
    /// Advance to the next column; `false` once every column is consumed or
    /// after a decode error has been latched.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        if self.err.is_some() {
            return false;
        }
        if self.cur_col < self.total_cols {
            self.cur_col += 1;
            true
        } else {
            false
        }
    }

    /// 1-based index of the current column; 0 before the first `next`.
    pub fn current_col(&self) -> usize {
        self.cur_col
    }

    /// Total number of columns in the sheet.
    pub fn total_cols(&self) -> usize {
        self.total_cols
    }

    /// The first error hit while reading column values, if any.
    pub fn error(&self) -> Option<&XlsxError> {
        self.err.as_ref()
    }

    /// The current column's cell values, one entry per sheet row.
    ///
    /// Rows without a cell in this column yield an empty string; the result
    /// always has `total_rows` entries.
    pub fn rows(&mut self) -> XlsxResult<Vec<String>> {
        if self.cur_col == 0 || self.sheet_xml.is_empty() {
            return Ok(Vec::new());
        }

        match self.scan_column() {
            Ok(values) => Ok(values),
            Err(e) => {
                self.err = Some(e.duplicate());
                Err(e)
            }
        }
    }

    /// Forward token scan of `sheetData`, keeping only the cell that lands
    /// in the current column of each row. Memory stays bounded to the
    /// output vector plus one in-flight cell.
    fn scan_column(&self) -> XlsxResult<Vec<String>> {
        let mut reader = Reader::from_reader(self.sheet_xml.as_slice());
        reader.trim_text(true);

        let mut buf = Vec::new();
        let mut values = vec![String::new(); self.total_rows];
        let mut cur_row: usize = 0;
        let mut last_col: usize = 0;
        // The in-flight cell, kept only while it lands in cur_col
        let mut capture = false;
        let mut cell = Cell::default();
        let mut in_cell = false;
        let mut in_value = false;
        let mut in_inline_str = false;
        let mut in_inline_text = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(event @ (Event::Start(_) | Event::Empty(_))) => {
                    let is_empty = matches!(event, Event::Empty(_));
                    let e = match &event {
                        Event::Start(e) | Event::Empty(e) => e,
                        _ => unreachable!(),
                    };
                    match e.name().as_ref() {
                        b"row" => {
                            let mut num = cur_row + 1;
                            for attr in e.attributes().flatten() {
                                if attr.key.as_ref() == b"r" {
                                    let value = attr
                                        .unescape_value()
                                        .map(|v| v.to_string())
                                        .unwrap_or_default();
                                    num = parse_row_number(&value)? as usize;
                                }
                            }
                            cur_row = num;
                            last_col = 0;
                        }
                        b"c" if cur_row > 0 => {
                            in_cell = true;
                            cell = Cell::default();
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
                                    b"t" => cell.cell_type = Some(value),
                                    _ => {}
                                }
                            }
                            last_col = col;
                            capture = col == self.cur_col
                                && cur_row >= 1
                                && cur_row <= self.total_rows;
                            if is_empty {
                                in_cell = false;
                                capture = false;
                            }
                        }
                        b"v" if in_cell => in_value = true,
                        b"is" if in_cell => in_inline_str = true,
                        b"t" if in_inline_str => in_inline_text = true,
                        _ => {}
                    }
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"c" => {
                        if in_cell && capture {
                            values[cur_row - 1] =
                                cell.value_string(self.doc.shared_strings());
                        }
                        in_cell = false;
                        capture = false;
                    }
                    b"v" => in_value = false,
                    b"is" => in_inline_str = false,
                    b"t" => in_inline_text = false,
                    _ => {}
                },
                Ok(Event::Text(e)) => {
                    if capture {
                        let text = e.unescape().map_err(XlsxError::Xml)?.to_string();
                        if in_value {
                            cell.value = Some(text);
                        } else if in_inline_text {
                            cell.inline_string = Some(text);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(values)
    }
}

/// Flatten overlapping column records into one record per column, applying
/// `setting` across its span. Existing records keep their other properties
/// through `replacer`; records outside the span split but keep their
/// settings unchanged.
fn flat_cols(setting: Col, cols: Vec<Col>, replacer: impl Fn(Col, &Col) -> Col) -> Vec<Col> {
    let mut flat: Vec<Col> = (setting.min..=setting.max)
        .map(|i| {
            let mut c = setting.clone();
            c.min = i;
            c.max = i;
            c
        })
        .collect();

    for column in &cols {
        for i in column.min..=column.max {
            if let Some(pos) = flat.iter().position(|c| c.min == i) {
                let fresh = flat[pos].clone();
                flat[pos] = replacer(fresh, column);
            } else {
                let mut c = column.clone();
                c.min = i;
                c.max = i;
                flat.push(c);
            }
        }
    }

    flat.sort_by_key(|c| c.min);
    flat
}

impl Workbook {
    /// Show or hide every column in `columns` ("F" or "F:V"; reversed
    /// endpoints are accepted).
    pub fn set_col_visible(&mut self, sheet: &str, columns: &str, visible: bool) -> XlsxResult<()> {
        let range = ColumnRange::parse(columns).map_err(XlsxError::Coordinate)?;
        self.with_sheet_mut(sheet, |ws| {
            let mut setting = Col::span(range.start, range.end);
            setting.hidden = !visible;
            let existing = std::mem::take(&mut ws.cols);
            ws.cols = flat_cols(setting, existing, |mut fc, c| {
                fc.width = c.width;
                fc.custom_width = c.custom_width;
                fc.outline_level = c.outline_level;
                fc.style = c.style;
                fc.collapsed = c.collapsed;
                fc
            });
            Ok(())
        })
    }

    /// Whether a column is visible. Columns with no stored record are
    /// visible.
    pub fn get_col_visible(&self, sheet: &str, column: &str) -> XlsxResult<bool> {
        let col = column_name_to_number(column).map_err(XlsxError::Coordinate)?;
        self.with_sheet(sheet, |ws| {
            Ok(ws.col_for(col).map(|c| !c.hidden).unwrap_or(true))
        })
    }

    /// Set the width of the columns from `start_col` to `end_col` inclusive,
    /// in character units. Widths above 255 are rejected.
    pub fn set_col_width(
        &mut self,
        sheet: &str,
        start_col: &str,
        end_col: &str,
        width: f64,
    ) -> XlsxResult<()> {
        let range = ColumnRange::from_names(start_col, end_col).map_err(XlsxError::Coordinate)?;
        if width > MAX_COLUMN_WIDTH {
            return Err(CoreError::ColumnWidth.into());
        }
        self.with_sheet_mut(sheet, |ws| {
            let mut setting = Col::span(range.start, range.end);
            setting.width = Some(width);
            setting.custom_width = true;
            let existing = std::mem::take(&mut ws.cols);
            ws.cols = flat_cols(setting, existing, |mut fc, c| {
                fc.hidden = c.hidden;
                fc.outline_level = c.outline_level;
                fc.style = c.style;
                fc.collapsed = c.collapsed;
                fc
            });
            Ok(())
        })
    }

    /// The width of a column in character units; columns without a custom
    /// width report the default (9.140625).
    pub fn get_col_width(&self, sheet: &str, column: &str) -> XlsxResult<f64> {
        let col = column_name_to_number(column).map_err(XlsxError::Coordinate)?;
        self.with_sheet(sheet, |ws| {
            Ok(ws
                .col_for(col)
                .and_then(|c| c.width)
                .unwrap_or(DEFAULT_COL_WIDTH))
        })
    }

    /// Set the outline (grouping) level of a single column, 1 through 7.
    pub fn set_col_outline_level(&mut self, sheet: &str, column: &str, level: u8) -> XlsxResult<()> {
        if level < 1 || level > MAX_OUTLINE_LEVEL {
            return Err(CoreError::OutlineLevel.into());
        }
        let col = column_name_to_number(column).map_err(XlsxError::Coordinate)?;
        self.with_sheet_mut(sheet, |ws| {
            let mut setting = Col::span(col, col);
            setting.outline_level = level;
            let existing = std::mem::take(&mut ws.cols);
            ws.cols = flat_cols(setting, existing, |mut fc, c| {
                fc.width = c.width;
                fc.custom_width = c.custom_width;
                fc.hidden = c.hidden;
                fc.style = c.style;
                fc.collapsed = c.collapsed;
                fc
            });
            Ok(())
        })
    }

    /// The outline level of a column; 0 when no record covers it.
    pub fn get_col_outline_level(&self, sheet: &str, column: &str) -> XlsxResult<u8> {
        let col = column_name_to_number(column).map_err(XlsxError::Coordinate)?;
        self.with_sheet(sheet, |ws| {
            Ok(ws.col_for(col).map(|c| c.outline_level).unwrap_or(0))
        })
    }

    /// Apply a style to every column in `columns`: the column records carry
    /// the style for future cells, and every existing cell in the span is
    /// restyled.
    pub fn set_col_style(&mut self, sheet: &str, columns: &str, style_id: u32) -> XlsxResult<()> {
        let range = ColumnRange::parse(columns).map_err(XlsxError::Coordinate)?;
        self.with_sheet_mut(sheet, |ws| {
            let mut setting = Col::span(range.start, range.end);
            setting.style = Some(style_id);
            let existing = std::mem::take(&mut ws.cols);
            ws.cols = flat_cols(setting, existing, |mut fc, c| {
                fc.width = c.width;
                fc.custom_width = c.custom_width;
                fc.hidden = c.hidden;
                fc.outline_level = c.outline_level;
                fc.collapsed = c.collapsed;
                fc
            });

            for row in &mut ws.rows {
                for cell in &mut row.cells {
                    let (col, _) =
                        cell_name_to_coordinates(&cell.reference).map_err(XlsxError::Coordinate)?;
                    if range.contains(col) {
                        cell.style = Some(style_id);
                    }
                }
            }
            Ok(())
        })
    }

    /// Insert `n` empty columns before `column`, shifting cells, column
    /// records, merged ranges, and hyperlinks right.
    pub fn insert_cols(&mut self, sheet: &str, column: &str, n: u32) -> XlsxResult<()> {
        let col = column_name_to_number(column).map_err(XlsxError::Coordinate)?;
        if n < 1 {
            return Err(CoreError::ColumnNumber.into());
        }
        self.with_sheet_mut(sheet, |ws| adjust_columns(ws, col, n as i64))
    }

    /// Remove a single column: its cells are deleted and everything to the
    /// right shifts left by one.
    pub fn remove_col(&mut self, sheet: &str, column: &str) -> XlsxResult<()> {
        let col = column_name_to_number(column).map_err(XlsxError::Coordinate)?;
        self.with_sheet_mut(sheet, |ws| {
            for row in &mut ws.rows {
                let mut kept = Vec::with_capacity(row.cells.len());
                for cell in row.cells.drain(..) {
                    let (c, _) =
                        cell_name_to_coordinates(&cell.reference).map_err(XlsxError::Coordinate)?;
                    if c != col {
                        kept.push(cell);
                    }
                }
                row.cells = kept;
            }
            adjust_columns(ws, col, -1)
        })
    }
}
