//! Workbook document model: the in-memory package and its part store.
//!
//! A [`Workbook`] keeps every package part as raw bytes and parses worksheet
//! parts on demand into [`Worksheet`] structures. Parsed sheets are cached
//! and serialized back over the stored bytes when the raw XML is needed.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use gridbook_core::coordinate::{
    cell_name_to_coordinates, coordinates_to_cell_name, coordinates_to_range_ref,
};

use crate::error::{XlsxError, XlsxResult};
use crate::worksheet::{parse_worksheet, write_worksheet_xml, Hyperlink, Worksheet};

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const ROOT_RELS_PART: &str = "_rels/.rels";
const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const STYLES_PART: &str = "xl/styles.xml";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

const EMPTY_SHEET_XML: &[u8] = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData/></worksheet>"#;

/// A typed cell value accepted by [`Workbook::set_cell_value`].
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Floating-point number
    Number(f64),
    /// Integer
    Int(i64),
    /// Boolean, stored as a `b`-typed cell
    Bool(bool),
    /// String, stored inline as a `str`-typed cell
    Str(String),
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(v)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Int(v)
    }
}

impl From<i32> for CellValue {
    fn from(v: i32) -> Self {
        CellValue::Int(v as i64)
    }
}

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        CellValue::Bool(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::Str(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::Str(v)
    }
}

/// An open spreadsheet package.
pub struct Workbook {
    /// Raw part bytes, keyed by part path ("xl/worksheets/sheet1.xml")
    pkg: RwLock<HashMap<String, Vec<u8>>>,
    /// Parsed worksheet cache, keyed by part path
    sheets: RwLock<HashMap<String, Worksheet>>,
    /// Sheet names with their part paths, in workbook order
    sheet_names: Vec<(String, String)>,
    /// Shared-string table from `xl/sharedStrings.xml`
    shared_strings: Vec<String>,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbook {
    /// A new workbook with a single empty sheet named "Sheet1".
    pub fn new() -> Self {
        let mut pkg = HashMap::new();
        pkg.insert(
            "xl/worksheets/sheet1.xml".to_string(),
            EMPTY_SHEET_XML.to_vec(),
        );
        Self {
            pkg: RwLock::new(pkg),
            sheets: RwLock::new(HashMap::new()),
            sheet_names: vec![("Sheet1".to_string(), "xl/worksheets/sheet1.xml".to_string())],
            shared_strings: Vec::new(),
        }
    }

    /// Open a package from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> XlsxResult<Self> {
        let file = File::open(path.as_ref())?;
        Self::read(BufReader::new(file))
    }

    /// Read a package from any seekable source.
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Self> {
        let mut archive = zip::ZipArchive::new(reader)?;

        let mut pkg = HashMap::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            pkg.insert(file.name().to_string(), data);
        }

        let workbook_xml = pkg
            .get(WORKBOOK_PART)
            .ok_or_else(|| XlsxError::MissingPart(WORKBOOK_PART.to_string()))?;
        let rels = pkg
            .get(WORKBOOK_RELS_PART)
            .map(|data| parse_relationships(data))
            .transpose()?
            .unwrap_or_default();
        let sheet_names = parse_workbook_sheets(workbook_xml, &rels)?;

        let shared_strings = pkg
            .get(SHARED_STRINGS_PART)
            .map(|data| parse_shared_strings(data))
            .transpose()?
            .unwrap_or_default();

        log::debug!(
            "opened package: {} parts, {} sheets, {} shared strings",
            pkg.len(),
            sheet_names.len(),
            shared_strings.len()
        );

        Ok(Self {
            pkg: RwLock::new(pkg),
            sheets: RwLock::new(HashMap::new()),
            sheet_names,
            shared_strings,
        })
    }

    /// Save the package to a file path.
    pub fn save_as<P: AsRef<Path>>(&self, path: P) -> XlsxResult<()> {
        let file = File::create(path.as_ref())?;
        self.write(BufWriter::new(file))
    }

    /// Write the package to any seekable sink.
    ///
    /// Parsed worksheets are serialized over their stored bytes; structural
    /// parts (content types, relationships, workbook) are regenerated so new
    /// sheets appear; everything else passes through untouched.
    pub fn write<W: Write + Seek>(&self, writer: W) -> XlsxResult<()> {
        self.flush_sheets();

        let mut parts: HashMap<String, Vec<u8>> = {
            let pkg = self.pkg.read().unwrap_or_else(PoisonError::into_inner);
            pkg.clone()
        };

        parts.insert(CONTENT_TYPES_PART.to_string(), self.content_types_xml());
        parts.insert(ROOT_RELS_PART.to_string(), root_rels_xml());
        parts.insert(WORKBOOK_PART.to_string(), self.workbook_xml());
        parts.insert(WORKBOOK_RELS_PART.to_string(), self.workbook_rels_xml());
        parts
            .entry(STYLES_PART.to_string())
            .or_insert_with(minimal_styles_xml);
        if !self.shared_strings.is_empty() {
            parts.insert(
                SHARED_STRINGS_PART.to_string(),
                shared_strings_xml(&self.shared_strings),
            );
        }

        let mut names: Vec<&String> = parts.keys().collect();
        names.sort();

        let mut zip_writer = zip::ZipWriter::new(writer);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        for name in names {
            zip_writer.start_file(name.as_str(), options)?;
            zip_writer.write_all(&parts[name])?;
        }
        zip_writer.finish()?;

        log::debug!("wrote package: {} parts", parts.len());
        Ok(())
    }

    /// Add a new empty sheet, returning its 0-based index in workbook order.
    ///
    /// Adding a sheet whose name already exists returns the existing index.
    pub fn new_sheet(&mut self, name: &str) -> XlsxResult<usize> {
        if let Some(idx) = self.sheet_names.iter().position(|(n, _)| n == name) {
            return Ok(idx);
        }

        let mut next = self.sheet_names.len() + 1;
        let mut path = format!("xl/worksheets/sheet{}.xml", next);
        // Opened packages may already use this numbering
        while self.sheet_names.iter().any(|(_, p)| *p == path) {
            next += 1;
            path = format!("xl/worksheets/sheet{}.xml", next);
        }
        self.pkg
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.clone(), EMPTY_SHEET_XML.to_vec());
        self.sheet_names.push((name.to_string(), path));
        Ok(self.sheet_names.len() - 1)
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheet_names.iter().map(|(n, _)| n.clone()).collect()
    }

    /// The shared-string table read from the package.
    pub fn shared_strings(&self) -> &[String] {
        &self.shared_strings
    }

    /// Resolve a sheet name (exact match) to its part path.
    pub(crate) fn sheet_path(&self, sheet: &str) -> XlsxResult<String> {
        self.sheet_names
            .iter()
            .find(|(n, _)| n == sheet)
            .map(|(_, p)| p.clone())
            .ok_or_else(|| XlsxError::SheetNotExist(sheet.to_string()))
    }

    /// Parse the worksheet at `path` into the cache if not already there.
    fn ensure_parsed(&self, path: &str) -> XlsxResult<()> {
        {
            let sheets = self.sheets.read().unwrap_or_else(PoisonError::into_inner);
            if sheets.contains_key(path) {
                return Ok(());
            }
        }
        let raw = self
            .pkg
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
            .unwrap_or_default();
        let ws = parse_worksheet(&raw)?;
        self.sheets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_string(), ws);
        Ok(())
    }

    /// Run a closure over the parsed worksheet for `sheet` (read access).
    pub(crate) fn with_sheet<T>(
        &self,
        sheet: &str,
        f: impl FnOnce(&Worksheet) -> XlsxResult<T>,
    ) -> XlsxResult<T> {
        let path = self.sheet_path(sheet)?;
        self.ensure_parsed(&path)?;
        let sheets = self.sheets.read().unwrap_or_else(PoisonError::into_inner);
        let ws = sheets
            .get(&path)
            .ok_or_else(|| XlsxError::MissingPart(path.clone()))?;
        f(ws)
    }

    /// Run a closure over the parsed worksheet for `sheet` (write access).
    pub(crate) fn with_sheet_mut<T>(
        &mut self,
        sheet: &str,
        f: impl FnOnce(&mut Worksheet) -> XlsxResult<T>,
    ) -> XlsxResult<T> {
        let path = self.sheet_path(sheet)?;
        self.ensure_parsed(&path)?;
        let mut sheets = self.sheets.write().unwrap_or_else(PoisonError::into_inner);
        let ws = sheets
            .get_mut(&path)
            .ok_or_else(|| XlsxError::MissingPart(path.clone()))?;
        f(ws)
    }

    /// The current XML bytes for a sheet: the cached parsed form serialized,
    /// or the stored part bytes when the sheet was never parsed.
    pub(crate) fn sheet_xml(&self, sheet: &str) -> XlsxResult<Vec<u8>> {
        let path = self.sheet_path(sheet)?;
        {
            let sheets = self.sheets.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(ws) = sheets.get(&path) {
                return Ok(write_worksheet_xml(ws));
            }
        }
        Ok(self
            .pkg
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&path)
            .cloned()
            .unwrap_or_default())
    }

    /// Raw bytes of an arbitrary package part.
    pub fn part(&self, path: &str) -> Option<Vec<u8>> {
        self.pkg
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }

    /// Replace an arbitrary package part. A cached parse of the same part is
    /// evicted so the new bytes take effect.
    pub fn set_part(&mut self, path: &str, data: Vec<u8>) {
        self.sheets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path);
        self.pkg
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_string(), data);
    }

    /// Serialize every cached worksheet back into the part store.
    fn flush_sheets(&self) {
        let sheets = self.sheets.read().unwrap_or_else(PoisonError::into_inner);
        let mut pkg = self.pkg.write().unwrap_or_else(PoisonError::into_inner);
        for (path, ws) in sheets.iter() {
            pkg.insert(path.clone(), write_worksheet_xml(ws));
        }
    }

    /// Set a cell value. Strings are stored inline (`t="str"`), booleans as
    /// `b`-typed cells, numbers as raw `<v>` text. The stored dimension hint
    /// grows to cover the cell.
    pub fn set_cell_value<V: Into<CellValue>>(
        &mut self,
        sheet: &str,
        cell: &str,
        value: V,
    ) -> XlsxResult<()> {
        let (col, row) = cell_name_to_coordinates(cell)?;
        let value = value.into();
        self.with_sheet_mut(sheet, |ws| {
            let stored = ws.cell_mut(col, row)?;
            stored.formula = None;
            stored.inline_string = None;
            match value {
                CellValue::Number(n) => {
                    stored.cell_type = None;
                    stored.value = Some(n.to_string());
                }
                CellValue::Int(n) => {
                    stored.cell_type = None;
                    stored.value = Some(n.to_string());
                }
                CellValue::Bool(b) => {
                    stored.cell_type = Some("b".to_string());
                    stored.value = Some(if b { "1" } else { "0" }.to_string());
                }
                CellValue::Str(s) => {
                    stored.cell_type = Some("str".to_string());
                    stored.value = Some(s);
                }
            }
            ws.expand_dimension(col, row);
            Ok(())
        })
    }

    /// The string form of a cell value; empty for an absent cell.
    pub fn get_cell_value(&self, sheet: &str, cell: &str) -> XlsxResult<String> {
        let (col, row) = cell_name_to_coordinates(cell)?;
        let reference = coordinates_to_cell_name(col, row)?;
        self.with_sheet(sheet, |ws| {
            let Some(stored_row) = ws.row(row) else {
                return Ok(String::new());
            };
            Ok(stored_row
                .cells
                .iter()
                .find(|c| c.reference.eq_ignore_ascii_case(&reference))
                .map(|c| c.value_string(&self.shared_strings))
                .unwrap_or_default())
        })
    }

    /// Merge the rectangle spanned by two corner cells, given in either
    /// order. The stored reference is normalized to top-left:bottom-right;
    /// merging an already merged range is a no-op.
    pub fn merge_cell(&mut self, sheet: &str, from: &str, to: &str) -> XlsxResult<()> {
        let (c1, r1) = cell_name_to_coordinates(from)?;
        let (c2, r2) = cell_name_to_coordinates(to)?;
        let normalized = coordinates_to_range_ref(c1, r1, c2, r2)?;
        self.with_sheet_mut(sheet, |ws| {
            if !ws.merge_cells.contains(&normalized) {
                ws.merge_cells.push(normalized);
            }
            Ok(())
        })
    }

    /// Attach a hyperlink to a cell, replacing any existing link there.
    pub fn set_cell_hyperlink(&mut self, sheet: &str, cell: &str, link: &str) -> XlsxResult<()> {
        let (col, row) = cell_name_to_coordinates(cell)?;
        let reference = coordinates_to_cell_name(col, row)?;
        let link = link.to_string();
        self.with_sheet_mut(sheet, |ws| {
            if let Some(existing) = ws
                .hyperlinks
                .iter_mut()
                .find(|h| h.reference.eq_ignore_ascii_case(&reference))
            {
                existing.display = Some(link);
            } else {
                ws.hyperlinks.push(Hyperlink {
                    reference,
                    display: Some(link),
                });
            }
            Ok(())
        })
    }

    /// The sheet's dimension reference: the stored hint when present,
    /// otherwise computed from the populated cells. Empty sheets yield
    /// `None`.
    pub fn sheet_dimension(&self, sheet: &str) -> XlsxResult<Option<String>> {
        self.with_sheet(sheet, |ws| {
            if let Some(dim) = &ws.dimension {
                return Ok(Some(dim.clone()));
            }
            match ws.dimension_bounds()? {
                Some(dim) => Ok(Some(coordinates_to_range_ref(
                    dim.first_col,
                    dim.first_row,
                    dim.last_col,
                    dim.last_row,
                )?)),
                None => Ok(None),
            }
        })
    }

    fn workbook_xml(&self) -> Vec<u8> {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
    <sheets>"#,
        );
        for (i, (name, _)) in self.sheet_names.iter().enumerate() {
            content.push_str(&format!(
                "\n        <sheet name=\"{}\" sheetId=\"{}\" r:id=\"rId{}\"/>",
                escape_attr(name),
                i + 1,
                i + 1
            ));
        }
        content.push_str("\n    </sheets>\n</workbook>");
        content.into_bytes()
    }

    fn workbook_rels_xml(&self) -> Vec<u8> {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        let mut rid = 0;
        for (_, path) in &self.sheet_names {
            rid += 1;
            let target = path.strip_prefix("xl/").unwrap_or(path);
            content.push_str(&format!(
                "\n    <Relationship Id=\"rId{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"{}\"/>",
                rid, escape_attr(target)
            ));
        }
        rid += 1;
        content.push_str(&format!(
            "\n    <Relationship Id=\"rId{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>",
            rid
        ));
        if !self.shared_strings.is_empty() {
            rid += 1;
            content.push_str(&format!(
                "\n    <Relationship Id=\"rId{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings\" Target=\"sharedStrings.xml\"/>",
                rid
            ));
        }
        content.push_str("\n</Relationships>");
        content.into_bytes()
    }

    fn content_types_xml(&self) -> Vec<u8> {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
    <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
        );
        for (_, path) in &self.sheet_names {
            content.push_str(&format!(
                "\n    <Override PartName=\"/{}\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>",
                escape_attr(path)
            ));
        }
        if !self.shared_strings.is_empty() {
            content.push_str(
                "\n    <Override PartName=\"/xl/sharedStrings.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml\"/>",
            );
        }
        content.push_str("\n</Types>");
        content.into_bytes()
    }
}

fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn root_rels_xml() -> Vec<u8> {
    br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#
        .to_vec()
}

fn minimal_styles_xml() -> Vec<u8> {
    br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
    <fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>
    <fills count="1"><fill><patternFill patternType="none"/></fill></fills>
    <borders count="1"><border/></borders>
    <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
    <cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs>
</styleSheet>"#
        .to_vec()
}

fn shared_strings_xml(strings: &[String]) -> Vec<u8> {
    let mut content = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        strings.len()
    );
    for s in strings {
        content.push_str(&format!("\n    <si><t>{}</t></si>", escape_attr(s)));
    }
    content.push_str("\n</sst>");
    content.into_bytes()
}

/// Parse a relationships part into an id -> resolved-path map.
fn parse_relationships(xml: &[u8]) -> XlsxResult<HashMap<String, String>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut rels = HashMap::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.name().as_ref() == b"Relationship" {
                    let mut id = String::new();
                    let mut target = String::new();
                    for attr in e.attributes().flatten() {
                        let value = attr
                            .unescape_value()
                            .map(|v| v.to_string())
                            .unwrap_or_default();
                        match attr.key.as_ref() {
                            b"Id" => id = value,
                            b"Target" => target = value,
                            _ => {}
                        }
                    }
                    if !id.is_empty() && !target.is_empty() {
                        // Targets are relative to xl/ unless package-absolute
                        let path = match target.strip_prefix('/') {
                            Some(abs) => abs.to_string(),
                            None => format!("xl/{}", target),
                        };
                        rels.insert(id, path);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(rels)
}

/// Parse the sheet list from xl/workbook.xml, resolving part paths through
/// the relationships map.
fn parse_workbook_sheets(
    xml: &[u8],
    rels: &HashMap<String, String>,
) -> XlsxResult<Vec<(String, String)>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut sheets = Vec::new();
    let mut buf = Vec::new();
    let mut fallback_index = 0;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.name().as_ref() == b"sheet" {
                    let mut name = String::new();
                    let mut rid = String::new();
                    for attr in e.attributes().flatten() {
                        let value = attr
                            .unescape_value()
                            .map(|v| v.to_string())
                            .unwrap_or_default();
                        match attr.key.as_ref() {
                            b"name" => name = value,
                            b"r:id" => rid = value,
                            _ => {}
                        }
                    }
                    if name.is_empty() {
                        return Err(XlsxError::InvalidFormat(
                            "sheet element without a name".to_string(),
                        ));
                    }
                    fallback_index += 1;
                    let path = rels
                        .get(&rid)
                        .cloned()
                        .unwrap_or_else(|| format!("xl/worksheets/sheet{}.xml", fallback_index));
                    sheets.push((name, path));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    if sheets.is_empty() {
        return Err(XlsxError::InvalidFormat(
            "workbook has no sheets".to_string(),
        ));
    }
    Ok(sheets)
}

/// Parse xl/sharedStrings.xml; rich-text runs concatenate their `<t>` parts.
fn parse_shared_strings(xml: &[u8]) -> XlsxResult<Vec<String>> {
    let mut reader = Reader::from_reader(xml);
    // Whitespace inside <t> is significant
    reader.trim_text(false);

    let mut strings = Vec::new();
    let mut buf = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"si" => current = Some(String::new()),
                b"t" if current.is_some() => in_text = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"si" => {
                    if let Some(s) = current.take() {
                        strings.push(s);
                    }
                }
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                if let Some(s) = current.as_mut() {
                    s.push_str(&e.unescape().map_err(XlsxError::Xml)?);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_workbook_has_sheet1() {
        let wb = Workbook::new();
        assert_eq!(wb.sheet_names(), vec!["Sheet1".to_string()]);
        assert!(wb.sheet_path("Sheet1").is_ok());
        assert_eq!(
            wb.sheet_path("SheetN").unwrap_err().to_string(),
            "sheet SheetN is not exist"
        );
    }

    #[test]
    fn test_sheet_name_exact_match() {
        let wb = Workbook::new();
        // Lookup is case sensitive
        assert!(wb.sheet_path("sheet1").is_err());
    }

    #[test]
    fn test_new_sheet() {
        let mut wb = Workbook::new();
        assert_eq!(wb.new_sheet("Data").unwrap(), 1);
        assert_eq!(wb.sheet_names(), vec!["Sheet1".to_string(), "Data".to_string()]);
        // Duplicate name returns the existing index
        assert_eq!(wb.new_sheet("Data").unwrap(), 1);
    }

    #[test]
    fn test_set_get_cell_value() {
        let mut wb = Workbook::new();
        wb.set_cell_value("Sheet1", "C2", "hello").unwrap();
        wb.set_cell_value("Sheet1", "D2", 42).unwrap();
        wb.set_cell_value("Sheet1", "E2", 2.5).unwrap();
        wb.set_cell_value("Sheet1", "F2", true).unwrap();

        assert_eq!(wb.get_cell_value("Sheet1", "C2").unwrap(), "hello");
        assert_eq!(wb.get_cell_value("Sheet1", "D2").unwrap(), "42");
        assert_eq!(wb.get_cell_value("Sheet1", "E2").unwrap(), "2.5");
        assert_eq!(wb.get_cell_value("Sheet1", "F2").unwrap(), "TRUE");
        // Absent cell reads as empty
        assert_eq!(wb.get_cell_value("Sheet1", "Z99").unwrap(), "");
    }

    #[test]
    fn test_set_cell_value_invalid_cell() {
        let mut wb = Workbook::new();
        let err = wb.set_cell_value("Sheet1", "A", "x").unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"cannot convert cell "A" to coordinates: invalid cell name "A""#
        );
    }

    #[test]
    fn test_sheet_dimension_tracks_writes() {
        let mut wb = Workbook::new();
        assert_eq!(wb.sheet_dimension("Sheet1").unwrap(), None);

        wb.set_cell_value("Sheet1", "C2", 1).unwrap();
        assert_eq!(
            wb.sheet_dimension("Sheet1").unwrap().as_deref(),
            Some("C2:C2")
        );

        wb.set_cell_value("Sheet1", "E7", 1).unwrap();
        assert_eq!(
            wb.sheet_dimension("Sheet1").unwrap().as_deref(),
            Some("C2:E7")
        );
    }

    #[test]
    fn test_merge_cell_normalizes() {
        let mut wb = Workbook::new();
        wb.merge_cell("Sheet1", "C3", "A1").unwrap();
        wb.merge_cell("Sheet1", "A1", "C3").unwrap();
        wb.with_sheet("Sheet1", |ws| {
            assert_eq!(ws.merge_cells, vec!["A1:C3".to_string()]);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_set_cell_hyperlink_replaces() {
        let mut wb = Workbook::new();
        wb.set_cell_hyperlink("Sheet1", "A5", "https://example.com")
            .unwrap();
        wb.set_cell_hyperlink("Sheet1", "A5", "https://example.org")
            .unwrap();
        wb.with_sheet("Sheet1", |ws| {
            assert_eq!(ws.hyperlinks.len(), 1);
            assert_eq!(
                ws.hyperlinks[0].display.as_deref(),
                Some("https://example.org")
            );
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_set_part_evicts_cache() {
        let mut wb = Workbook::new();
        wb.set_cell_value("Sheet1", "A1", 1).unwrap();
        wb.set_part(
            "xl/worksheets/sheet1.xml",
            br#"<worksheet><sheetData><row r="3"><c r="B3"><v>9</v></c></row></sheetData></worksheet>"#.to_vec(),
        );
        assert_eq!(wb.get_cell_value("Sheet1", "A1").unwrap(), "");
        assert_eq!(wb.get_cell_value("Sheet1", "B3").unwrap(), "9");
    }
}
