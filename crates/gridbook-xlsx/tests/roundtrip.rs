use gridbook_xlsx::worksheet::parse_worksheet;
use gridbook_xlsx::Workbook;

#[test]
fn save_and_reopen_preserves_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("book.xlsx");

    let mut wb = Workbook::new();
    wb.set_cell_value("Sheet1", "B2", "text").unwrap();
    wb.set_cell_value("Sheet1", "C2", 42).unwrap();
    wb.set_cell_value("Sheet1", "D2", 2.5).unwrap();
    wb.set_cell_value("Sheet1", "E2", true).unwrap();
    wb.set_col_width("Sheet1", "B", "C", 14.0).unwrap();
    wb.set_col_visible("Sheet1", "D", false).unwrap();
    wb.set_col_outline_level("Sheet1", "B", 2).unwrap();
    wb.set_row_visible("Sheet1", 3, false).unwrap();
    wb.merge_cell("Sheet1", "B5", "C6").unwrap();
    wb.set_cell_hyperlink("Sheet1", "B2", "https://example.com")
        .unwrap();
    wb.save_as(&path).unwrap();

    let reopened = Workbook::open(&path).unwrap();
    assert_eq!(reopened.sheet_names(), vec!["Sheet1".to_string()]);
    assert_eq!(reopened.get_cell_value("Sheet1", "B2").unwrap(), "text");
    assert_eq!(reopened.get_cell_value("Sheet1", "C2").unwrap(), "42");
    assert_eq!(reopened.get_cell_value("Sheet1", "D2").unwrap(), "2.5");
    assert_eq!(reopened.get_cell_value("Sheet1", "E2").unwrap(), "TRUE");
    assert_eq!(reopened.get_col_width("Sheet1", "B").unwrap(), 14.0);
    assert_eq!(reopened.get_col_width("Sheet1", "C").unwrap(), 14.0);
    assert!(!reopened.get_col_visible("Sheet1", "D").unwrap());
    assert_eq!(reopened.get_col_outline_level("Sheet1", "B").unwrap(), 2);
    assert!(!reopened.get_row_visible("Sheet1", 3).unwrap());

    let raw = reopened.part("xl/worksheets/sheet1.xml").unwrap();
    let ws = parse_worksheet(&raw).unwrap();
    assert_eq!(ws.merge_cells, vec!["B5:C6".to_string()]);
    assert_eq!(ws.hyperlinks[0].reference, "B2");
    assert_eq!(
        ws.hyperlinks[0].display.as_deref(),
        Some("https://example.com")
    );
}

#[test]
fn save_and_reopen_with_multiple_sheets() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("multi.xlsx");

    let mut wb = Workbook::new();
    let idx = wb.new_sheet("Data").unwrap();
    assert_eq!(idx, 1);
    wb.set_cell_value("Data", "A1", "second sheet").unwrap();
    wb.save_as(&path).unwrap();

    let reopened = Workbook::open(&path).unwrap();
    assert_eq!(
        reopened.sheet_names(),
        vec!["Sheet1".to_string(), "Data".to_string()]
    );
    assert_eq!(
        reopened.get_cell_value("Data", "A1").unwrap(),
        "second sheet"
    );
    assert_eq!(
        reopened.get_cell_value("Sheet1", "A1").unwrap(),
        ""
    );
}

#[test]
fn reopened_iteration_matches() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("iter.xlsx");

    let mut wb = Workbook::new();
    for (cell, value) in [("C2", "c2"), ("D2", "d2"), ("C3", "c3"), ("D3", "d3")] {
        wb.set_cell_value("Sheet1", cell, value).unwrap();
    }
    wb.save_as(&path).unwrap();

    let reopened = Workbook::open(&path).unwrap();
    assert_eq!(
        reopened.get_cols("Sheet1").unwrap(),
        wb.get_cols("Sheet1").unwrap()
    );
    assert_eq!(
        reopened.get_rows("Sheet1").unwrap(),
        wb.get_rows("Sheet1").unwrap()
    );
    assert_eq!(
        reopened.sheet_dimension("Sheet1").unwrap().as_deref(),
        Some("C2:D3")
    );
}

#[test]
fn dimension_hint_written_and_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dim.xlsx");

    let mut wb = Workbook::new();
    wb.set_cell_value("Sheet1", "C2", 1).unwrap();
    wb.set_cell_value("Sheet1", "E7", 1).unwrap();
    wb.save_as(&path).unwrap();

    let reopened = Workbook::open(&path).unwrap();
    assert_eq!(
        reopened.sheet_dimension("Sheet1").unwrap().as_deref(),
        Some("C2:E7")
    );
    // The hint also feeds iteration totals without a scan
    let cols = reopened.cols("Sheet1").unwrap();
    assert_eq!(cols.total_cols(), 5);
}
