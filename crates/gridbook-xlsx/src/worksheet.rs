//! Worksheet part schema: parsed structures, XML parse/serialize, and the
//! populated-dimension tracker.
//!
//! The stored XML stays the source of truth. A worksheet is parsed on demand
//! into the sparse structures below, mutated in place, and serialized back
//! when the raw bytes are needed (iteration, save). The bounding dimension is
//! computed lazily and cached; structural mutators invalidate the cache
//! before returning.

use std::sync::OnceLock;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use gridbook_core::coordinate::{
    cell_name_to_coordinates, coordinates_to_cell_name, coordinates_to_range_ref,
    range_ref_to_coordinates,
};
use gridbook_core::{Error as CoreError, MAX_ROWS};

use crate::error::{XlsxError, XlsxResult};

/// The populated bounding box of a sheet, all bounds 1-based inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimension {
    /// First populated row
    pub first_row: u32,
    /// Last populated row
    pub last_row: u32,
    /// First populated column
    pub first_col: u32,
    /// Last populated column
    pub last_col: u32,
}

/// A column-metadata record spanning `min..=max`, as stored in `<cols>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Col {
    /// First column covered by this record
    pub min: u32,
    /// Last column covered by this record (inclusive)
    pub max: u32,
    /// Custom width in character units
    pub width: Option<f64>,
    /// Width was set explicitly rather than auto-derived
    pub custom_width: bool,
    /// Column is hidden
    pub hidden: bool,
    /// Outline/grouping level (0-7)
    pub outline_level: u8,
    /// Column-level style index
    pub style: Option<u32>,
    /// Column group is collapsed
    pub collapsed: bool,
}

impl Col {
    /// A record covering a single span with default properties.
    pub fn span(min: u32, max: u32) -> Self {
        Self {
            min,
            max,
            width: None,
            custom_width: false,
            hidden: false,
            outline_level: 0,
            style: None,
            collapsed: false,
        }
    }
}

/// One stored cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    /// Cell reference as stored ("C4")
    pub reference: String,
    /// Cell type attribute (`t`): "s", "str", "b", "inlineStr", ...
    pub cell_type: Option<String>,
    /// Style index attribute (`s`)
    pub style: Option<u32>,
    /// Raw stored value (`<v>`)
    pub value: Option<String>,
    /// Formula text (`<f>`)
    pub formula: Option<String>,
    /// Inline string payload (`<is><t>`)
    pub inline_string: Option<String>,
}

impl Cell {
    /// The string form of the stored value, resolving shared-string and
    /// inline-string indirection. Value formatting beyond that is out of
    /// scope here.
    pub fn value_string(&self, shared_strings: &[String]) -> String {
        match self.cell_type.as_deref() {
            Some("s") => self
                .value
                .as_deref()
                .and_then(|v| v.parse::<usize>().ok())
                .and_then(|idx| shared_strings.get(idx))
                .cloned()
                .unwrap_or_default(),
            Some("inlineStr") => self.inline_string.clone().unwrap_or_default(),
            Some("b") => match self.value.as_deref() {
                Some("1") => "TRUE".to_string(),
                Some(_) => "FALSE".to_string(),
                None => String::new(),
            },
            _ => self.value.clone().unwrap_or_default(),
        }
    }
}

/// One stored row with its cells in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// 1-based row number (`r`)
    pub r: u32,
    /// Row is hidden
    pub hidden: bool,
    /// Outline/grouping level (0-7)
    pub outline_level: u8,
    /// Cells present in this row, sorted by column
    pub cells: Vec<Cell>,
}

impl Row {
    /// An empty row at the given position.
    pub fn new(r: u32) -> Self {
        Self {
            r,
            hidden: false,
            outline_level: 0,
            cells: Vec::new(),
        }
    }
}

/// A hyperlink anchored at a single cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Hyperlink {
    /// Anchor cell reference ("A5")
    pub reference: String,
    /// Display text / target carried in the worksheet part
    pub display: Option<String>,
}

/// Parsed form of one worksheet part.
#[derive(Debug, Default)]
pub struct Worksheet {
    /// Stored `<dimension ref>` hint, if any
    pub dimension: Option<String>,
    /// Column-metadata records
    pub cols: Vec<Col>,
    /// Sparse rows, sorted by row number
    pub rows: Vec<Row>,
    /// Merged ranges as stored refs ("A1:B1")
    pub merge_cells: Vec<String>,
    /// Hyperlink anchors
    pub hyperlinks: Vec<Hyperlink>,
    dim_cache: OnceLock<Result<Option<Dimension>, CoreError>>,
}

impl Worksheet {
    /// An empty worksheet.
    pub fn new() -> Self {
        Self::default()
    }

    /// The populated bounding box, or `None` for a sheet with no cells.
    ///
    /// Decodes the stored `dimension` hint when present and well-formed
    /// (O(1)); otherwise scans every stored cell reference. The result is
    /// cached until a mutator invalidates it.
    pub fn dimension_bounds(&self) -> Result<Option<Dimension>, CoreError> {
        self.dim_cache
            .get_or_init(|| self.compute_dimension())
            .clone()
    }

    fn compute_dimension(&self) -> Result<Option<Dimension>, CoreError> {
        if let Some(dim_ref) = self.dimension.as_deref() {
            if let Ok((first_col, first_row, last_col, last_row)) =
                range_ref_to_coordinates(dim_ref)
            {
                return Ok(Some(Dimension {
                    first_row,
                    last_row,
                    first_col,
                    last_col,
                }));
            }
        }

        let mut bounds: Option<Dimension> = None;
        for row in &self.rows {
            for cell in &row.cells {
                let (col, row_num) = cell_name_to_coordinates(&cell.reference)?;
                let dim = bounds.get_or_insert(Dimension {
                    first_row: row_num,
                    last_row: row_num,
                    first_col: col,
                    last_col: col,
                });
                dim.first_row = dim.first_row.min(row_num);
                dim.last_row = dim.last_row.max(row_num);
                dim.first_col = dim.first_col.min(col);
                dim.last_col = dim.last_col.max(col);
            }
        }
        Ok(bounds)
    }

    /// Drop the cached dimension so the next read recomputes it.
    pub fn invalidate_dimension(&mut self) {
        self.dim_cache = OnceLock::new();
    }

    /// Grow the stored dimension hint to cover `(col, row)`.
    pub fn expand_dimension(&mut self, col: u32, row: u32) {
        let updated = match self.dimension.as_deref().map(range_ref_to_coordinates) {
            Some(Ok((c1, r1, c2, r2))) => coordinates_to_range_ref(
                c1.min(col),
                r1.min(row),
                c2.max(col),
                r2.max(row),
            ),
            // No hint yet, or an unreadable one: restart from this cell
            _ => coordinates_to_range_ref(col, row, col, row),
        };
        self.dimension = updated.ok();
        self.invalidate_dimension();
    }

    /// Drop the dimension hint entirely; used after mutations that may
    /// shrink the populated area.
    pub fn clear_dimension(&mut self) {
        self.dimension = None;
        self.invalidate_dimension();
    }

    /// The column record covering `col`, if any.
    pub fn col_for(&self, col: u32) -> Option<&Col> {
        self.cols.iter().find(|c| col >= c.min && col <= c.max)
    }

    /// The stored row with number `row`, if present.
    pub fn row(&self, row: u32) -> Option<&Row> {
        self.rows
            .binary_search_by_key(&row, |r| r.r)
            .ok()
            .map(|idx| &self.rows[idx])
    }

    /// The stored row with number `row`, created empty if absent.
    pub fn row_mut(&mut self, row: u32) -> &mut Row {
        let idx = match self.rows.binary_search_by_key(&row, |r| r.r) {
            Ok(idx) => idx,
            Err(idx) => {
                self.rows.insert(idx, Row::new(row));
                idx
            }
        };
        &mut self.rows[idx]
    }

    /// The cell at `(col, row)`, created empty if absent. The row must
    /// already be positioned via [`Worksheet::row_mut`].
    pub fn cell_mut(&mut self, col: u32, row: u32) -> XlsxResult<&mut Cell> {
        let reference = coordinates_to_cell_name(col, row).map_err(XlsxError::Coordinate)?;
        let stored_row = self.row_mut(row);
        let pos = stored_row.cells.iter().position(|c| {
            cell_name_to_coordinates(&c.reference)
                .map(|(c_col, _)| c_col >= col)
                .unwrap_or(false)
        });
        match pos {
            Some(idx)
                if cell_name_to_coordinates(&stored_row.cells[idx].reference)
                    .map(|(c_col, _)| c_col == col)
                    .unwrap_or(false) =>
            {
                Ok(&mut stored_row.cells[idx])
            }
            Some(idx) => {
                stored_row.cells.insert(
                    idx,
                    Cell {
                        reference,
                        ..Cell::default()
                    },
                );
                Ok(&mut stored_row.cells[idx])
            }
            None => {
                stored_row.cells.push(Cell {
                    reference,
                    ..Cell::default()
                });
                let last = stored_row.cells.len() - 1;
                Ok(&mut stored_row.cells[last])
            }
        }
    }
}

pub(crate) fn parse_row_number(value: &str) -> XlsxResult<u32> {
    let row: u32 = value
        .parse()
        .map_err(|_| CoreError::RowReference(value.to_string()))?;
    if row < 1 || row > MAX_ROWS {
        return Err(CoreError::RowNumber(row).into());
    }
    Ok(row)
}

fn attr_value(attr: &quick_xml::events::attributes::Attribute<'_>) -> String {
    attr.unescape_value()
        .map(|v| v.to_string())
        .unwrap_or_default()
}

fn is_truthy(value: &str) -> bool {
    value == "1" || value == "true"
}

/// Parse one worksheet part from its raw XML bytes.
///
/// Unknown elements (sheet views, page setup, ...) are skipped; empty input
/// produces an empty worksheet.
pub fn parse_worksheet(xml: &[u8]) -> XlsxResult<Worksheet> {
    let mut ws = Worksheet::new();
    if xml.is_empty() {
        return Ok(ws);
    }

    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();

    let mut current_row: Option<Row> = None;
    let mut current_cell: Option<Cell> = None;
    let mut last_row_num: u32 = 0;
    let mut in_value = false;
    let mut in_formula = false;
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
                    b"dimension" => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"ref" {
                                let value = attr_value(&attr);
                                if !value.is_empty() {
                                    ws.dimension = Some(value);
                                }
                            }
                        }
                    }
                    b"col" => {
                        let mut col = Col::span(0, 0);
                        for attr in e.attributes().flatten() {
                            let value = attr_value(&attr);
                            match attr.key.as_ref() {
                                b"min" => col.min = value.parse().unwrap_or(0),
                                b"max" => col.max = value.parse().unwrap_or(0),
                                b"width" => col.width = value.parse().ok(),
                                b"customWidth" => col.custom_width = is_truthy(&value),
                                b"hidden" => col.hidden = is_truthy(&value),
                                b"outlineLevel" => {
                                    col.outline_level = value.parse().unwrap_or(0)
                                }
                                b"style" => col.style = value.parse().ok(),
                                b"collapsed" => col.collapsed = is_truthy(&value),
                                _ => {}
                            }
                        }
                        if col.min >= 1 && col.max >= col.min {
                            ws.cols.push(col);
                        }
                    }
                    b"row" => {
                        let mut row_num = last_row_num + 1;
                        let mut row = Row::new(row_num);
                        for attr in e.attributes().flatten() {
                            let value = attr_value(&attr);
                            match attr.key.as_ref() {
                                b"r" => {
                                    row_num = parse_row_number(&value)?;
                                    row.r = row_num;
                                }
                                b"hidden" => row.hidden = is_truthy(&value),
                                b"outlineLevel" => {
                                    row.outline_level = value.parse().unwrap_or(0)
                                }
                                _ => {}
                            }
                        }
                        last_row_num = row_num;
                        if is_empty {
                            ws.rows.push(row);
                        } else {
                            current_row = Some(row);
                        }
                    }
                    b"c" => {
                        let mut cell = Cell::default();
                        for attr in e.attributes().flatten() {
                            let value = attr_value(&attr);
                            match attr.key.as_ref() {
                                b"r" => cell.reference = value,
                                b"t" => cell.cell_type = Some(value),
                                b"s" => cell.style = value.parse().ok(),
                                _ => {}
                            }
                        }
                        if cell.reference.is_empty() {
                            // Position comes from the previous cell in the row
                            if let Some(row) = &current_row {
                                let col = row.cells.len() as u32 + 1;
                                cell.reference = coordinates_to_cell_name(col, row.r)
                                    .map_err(XlsxError::Coordinate)?;
                            }
                        }
                        if is_empty {
                            if let Some(row) = current_row.as_mut() {
                                row.cells.push(cell);
                            }
                        } else {
                            current_cell = Some(cell);
                        }
                    }
                    b"v" if current_cell.is_some() => in_value = true,
                    b"f" if current_cell.is_some() => in_formula = true,
                    b"is" if current_cell.is_some() => in_inline_str = true,
                    b"t" if in_inline_str => in_inline_text = true,
                    b"mergeCell" => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"ref" {
                                ws.merge_cells.push(attr_value(&attr));
                            }
                        }
                    }
                    b"hyperlink" => {
                        let mut link = Hyperlink {
                            reference: String::new(),
                            display: None,
                        };
                        for attr in e.attributes().flatten() {
                            let value = attr_value(&attr);
                            match attr.key.as_ref() {
                                b"ref" => link.reference = value,
                                b"display" => link.display = Some(value),
                                _ => {}
                            }
                        }
                        if !link.reference.is_empty() {
                            ws.hyperlinks.push(link);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"row" => {
                    if let Some(row) = current_row.take() {
                        ws.rows.push(row);
                    }
                }
                b"c" => {
                    if let (Some(cell), Some(row)) = (current_cell.take(), current_row.as_mut()) {
                        row.cells.push(cell);
                    }
                }
                b"v" => in_value = false,
                b"f" => in_formula = false,
                b"is" => in_inline_str = false,
                b"t" => in_inline_text = false,
                _ => {}
            },
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(XlsxError::Xml)?.to_string();
                if let Some(cell) = current_cell.as_mut() {
                    if in_value {
                        cell.value = Some(text);
                    } else if in_formula {
                        cell.formula = Some(text);
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

    ws.rows.sort_by_key(|r| r.r);
    Ok(ws)
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serialize a worksheet back to part bytes.
pub fn write_worksheet_xml(ws: &Worksheet) -> Vec<u8> {
    let mut content = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );

    if let Some(dim) = &ws.dimension {
        content.push_str(&format!("\n    <dimension ref=\"{}\"/>", escape_xml(dim)));
    }

    if !ws.cols.is_empty() {
        content.push_str("\n    <cols>");
        for col in &ws.cols {
            content.push_str(&format!("\n        <col min=\"{}\" max=\"{}\"", col.min, col.max));
            if let Some(width) = col.width {
                content.push_str(&format!(" width=\"{}\"", width));
            }
            if let Some(style) = col.style {
                content.push_str(&format!(" style=\"{}\"", style));
            }
            if col.hidden {
                content.push_str(" hidden=\"1\"");
            }
            if col.outline_level > 0 {
                content.push_str(&format!(" outlineLevel=\"{}\"", col.outline_level));
            }
            if col.custom_width {
                content.push_str(" customWidth=\"1\"");
            }
            if col.collapsed {
                content.push_str(" collapsed=\"1\"");
            }
            content.push_str("/>");
        }
        content.push_str("\n    </cols>");
    }

    content.push_str("\n    <sheetData>");
    for row in &ws.rows {
        content.push_str(&format!("\n        <row r=\"{}\"", row.r));
        if row.hidden {
            content.push_str(" hidden=\"1\"");
        }
        if row.outline_level > 0 {
            content.push_str(&format!(" outlineLevel=\"{}\"", row.outline_level));
        }
        if row.cells.is_empty() {
            content.push_str("/>");
            continue;
        }
        content.push('>');
        for cell in &row.cells {
            content.push_str(&format!("\n            <c r=\"{}\"", escape_xml(&cell.reference)));
            if let Some(style) = cell.style {
                content.push_str(&format!(" s=\"{}\"", style));
            }
            if let Some(t) = &cell.cell_type {
                content.push_str(&format!(" t=\"{}\"", escape_xml(t)));
            }
            content.push('>');
            if let Some(f) = &cell.formula {
                content.push_str(&format!("<f>{}</f>", escape_xml(f)));
            }
            if let Some(v) = &cell.value {
                content.push_str(&format!("<v>{}</v>", escape_xml(v)));
            }
            if let Some(is) = &cell.inline_string {
                content.push_str(&format!("<is><t>{}</t></is>", escape_xml(is)));
            }
            content.push_str("</c>");
        }
        content.push_str("\n        </row>");
    }
    content.push_str("\n    </sheetData>");

    if !ws.merge_cells.is_empty() {
        content.push_str(&format!("\n    <mergeCells count=\"{}\">", ws.merge_cells.len()));
        for merge_ref in &ws.merge_cells {
            content.push_str(&format!("\n        <mergeCell ref=\"{}\"/>", escape_xml(merge_ref)));
        }
        content.push_str("\n    </mergeCells>");
    }

    if !ws.hyperlinks.is_empty() {
        content.push_str("\n    <hyperlinks>");
        for link in &ws.hyperlinks {
            content.push_str(&format!("\n        <hyperlink ref=\"{}\"", escape_xml(&link.reference)));
            if let Some(display) = &link.display {
                content.push_str(&format!(" display=\"{}\"", escape_xml(display)));
            }
            content.push_str("/>");
        }
        content.push_str("\n    </hyperlinks>");
    }

    content.push_str("\n</worksheet>");
    content.into_bytes()
}

/// Total row and column counts for iteration over one worksheet part.
///
/// A present, well-formed `<dimension ref>` is decoded directly; otherwise
/// the `sheetData` stream is scanned forward, tracking the maximum row and
/// column seen. Malformed stored coordinates fail the scan.
pub(crate) fn scan_totals(xml: &[u8]) -> XlsxResult<(usize, usize)> {
    if xml.is_empty() {
        return Ok((0, 0));
    }

    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut max_row: u32 = 0;
    let mut max_col: u32 = 0;
    let mut last_row: u32 = 0;
    let mut cells_in_row: u32 = 0;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"dimension" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"ref" {
                            let value = attr_value(&attr);
                            if let Ok((_, _, last_col, last_row)) =
                                range_ref_to_coordinates(&value)
                            {
                                return Ok((last_row as usize, last_col as usize));
                            }
                        }
                    }
                }
                b"row" => {
                    let mut row_num = last_row + 1;
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"r" {
                            row_num = parse_row_number(&attr_value(&attr))?;
                        }
                    }
                    last_row = row_num;
                    cells_in_row = 0;
                    max_row = max_row.max(row_num);
                }
                b"c" => {
                    cells_in_row += 1;
                    let mut col = cells_in_row;
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"r" {
                            let (c, _) = cell_name_to_coordinates(&attr_value(&attr))
                                .map_err(XlsxError::Coordinate)?;
                            col = c;
                        }
                    }
                    max_col = max_col.max(col);
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok((max_row as usize, max_col as usize))
}
