use gridbook_xlsx::Workbook;

#[test]
fn rows_iteration_with_gaps() {
    let mut wb = Workbook::new();
    wb.set_cell_value("Sheet1", "B2", "b2").unwrap();
    wb.set_cell_value("Sheet1", "C2", "c2").unwrap();
    wb.set_cell_value("Sheet1", "B4", "b4").unwrap();

    let mut rows = wb.rows("Sheet1").unwrap();
    assert_eq!(rows.total_rows(), 4);

    // Row 1 has no stored element
    assert!(rows.next());
    assert_eq!(rows.current_row(), 1);
    assert_eq!(rows.columns().unwrap(), Vec::<String>::new());

    assert!(rows.next());
    assert_eq!(rows.columns().unwrap(), vec!["", "b2", "c2"]);

    // Row 3 is a gap between stored rows
    assert!(rows.next());
    assert_eq!(rows.columns().unwrap(), Vec::<String>::new());

    assert!(rows.next());
    assert_eq!(rows.columns().unwrap(), vec!["", "b4"]);

    assert!(!rows.next());
    assert!(rows.error().is_none());
}

#[test]
fn get_rows_shape() {
    let mut wb = Workbook::new();
    wb.set_cell_value("Sheet1", "A1", 1).unwrap();
    wb.set_cell_value("Sheet1", "C3", 3).unwrap();

    let rows = wb.get_rows("Sheet1").unwrap();
    assert_eq!(
        rows,
        vec![
            vec!["1".to_string()],
            vec![],
            vec!["".to_string(), "".to_string(), "3".to_string()],
        ]
    );
}

#[test]
fn rows_empty_sheet() {
    let wb = Workbook::new();
    let mut rows = wb.rows("Sheet1").unwrap();
    assert_eq!(rows.total_rows(), 0);
    assert!(!rows.next());
    assert_eq!(wb.get_rows("Sheet1").unwrap(), Vec::<Vec<String>>::new());
}

#[test]
fn rows_unknown_sheet() {
    let wb = Workbook::new();
    let err = wb.rows("SheetN").unwrap_err();
    assert_eq!(err.to_string(), "sheet SheetN is not exist");
}

#[test]
fn rows_error_latches_on_cursor() {
    let mut wb = Workbook::new();
    wb.set_part(
        "xl/worksheets/sheet1.xml",
        br#"<worksheet><dimension ref="A1:B2"/><sheetData><row r="1"><c r="A" t="str"><v>B</v></c></row></sheetData></worksheet>"#
            .to_vec(),
    );
    let mut rows = wb.rows("Sheet1").unwrap();
    assert!(rows.next());
    assert!(rows.columns().is_err());
    assert_eq!(
        rows.error().map(|e| e.to_string()),
        Some(r#"cannot convert cell "A" to coordinates: invalid cell name "A""#.to_string())
    );
    // A latched error terminates the cursor
    assert!(!rows.next());
}

#[test]
fn rows_skip_then_fetch() {
    let mut wb = Workbook::new();
    wb.set_cell_value("Sheet1", "A1", "a1").unwrap();
    wb.set_cell_value("Sheet1", "A2", "a2").unwrap();
    wb.set_cell_value("Sheet1", "A3", "a3").unwrap();

    // Advancing past rows without fetching them must not lose the row the
    // cursor lands on
    let mut rows = wb.rows("Sheet1").unwrap();
    assert!(rows.next());
    assert!(rows.next());
    assert!(rows.next());
    assert_eq!(rows.current_row(), 3);
    assert_eq!(rows.columns().unwrap(), vec!["a3"]);
    assert!(rows.error().is_none());
}

#[test]
fn rows_skip_over_stashed_row() {
    let mut wb = Workbook::new();
    wb.set_cell_value("Sheet1", "A2", "a2").unwrap();
    wb.set_cell_value("Sheet1", "A4", "a4").unwrap();

    let mut rows = wb.rows("Sheet1").unwrap();
    // Row 1 is a gap; fetching it scans ahead and stashes row 2
    assert!(rows.next());
    assert_eq!(rows.columns().unwrap(), Vec::<String>::new());
    // Skip rows 2 and 3 without fetching, then read row 4
    assert!(rows.next());
    assert!(rows.next());
    assert!(rows.next());
    assert_eq!(rows.columns().unwrap(), vec!["a4"]);
}

#[test]
fn rows_implicit_cell_positions() {
    let mut wb = Workbook::new();
    // Cells without r attributes take consecutive positions
    wb.set_part(
        "xl/worksheets/sheet1.xml",
        br#"<worksheet><sheetData><row r="1"><c t="str"><v>first</v></c><c t="str"><v>second</v></c></row></sheetData></worksheet>"#
            .to_vec(),
    );
    let rows = wb.get_rows("Sheet1").unwrap();
    assert_eq!(rows, vec![vec!["first".to_string(), "second".to_string()]]);
}

#[test]
fn row_visibility() {
    let mut wb = Workbook::new();
    assert!(wb.get_row_visible("Sheet1", 2).unwrap());

    wb.set_row_visible("Sheet1", 2, false).unwrap();
    assert!(!wb.get_row_visible("Sheet1", 2).unwrap());

    wb.set_row_visible("Sheet1", 2, true).unwrap();
    assert!(wb.get_row_visible("Sheet1", 2).unwrap());

    let err = wb.set_row_visible("Sheet1", 0, false).unwrap_err();
    assert_eq!(err.to_string(), "invalid row number 0");
    let err = wb.get_row_visible("SheetN", 1).unwrap_err();
    assert_eq!(err.to_string(), "sheet SheetN is not exist");
}

#[test]
fn row_outline_levels() {
    let mut wb = Workbook::new();
    assert_eq!(wb.get_row_outline_level("Sheet1", 2).unwrap(), 0);

    wb.set_row_outline_level("Sheet1", 2, 7).unwrap();
    assert_eq!(wb.get_row_outline_level("Sheet1", 2).unwrap(), 7);

    let err = wb.set_row_outline_level("Sheet1", 2, 8).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid outline level, the outline level must be in the range 1-7"
    );
    let err = wb.set_row_outline_level("Sheet1", 0, 1).unwrap_err();
    assert_eq!(err.to_string(), "invalid row number 0");
}
