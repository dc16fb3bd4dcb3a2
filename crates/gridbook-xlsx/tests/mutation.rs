use gridbook_xlsx::worksheet::parse_worksheet;
use gridbook_xlsx::Workbook;

/// Serialize the workbook in memory and return the parsed form of sheet 1,
/// for assertions on structures without public getters.
fn flushed_sheet1(wb: &Workbook) -> gridbook_xlsx::worksheet::Worksheet {
    let mut buf = std::io::Cursor::new(Vec::new());
    wb.write(&mut buf).unwrap();
    let raw = wb.part("xl/worksheets/sheet1.xml").unwrap();
    parse_worksheet(&raw).unwrap()
}

#[test]
fn col_visibility_over_range() {
    let mut wb = Workbook::new();
    assert!(wb.get_col_visible("Sheet1", "F").unwrap());

    wb.set_col_visible("Sheet1", "F:V", false).unwrap();
    assert!(!wb.get_col_visible("Sheet1", "F").unwrap());
    assert!(!wb.get_col_visible("Sheet1", "K").unwrap());
    assert!(!wb.get_col_visible("Sheet1", "V").unwrap());
    assert!(wb.get_col_visible("Sheet1", "E").unwrap());
    assert!(wb.get_col_visible("Sheet1", "W").unwrap());

    // Reversed endpoints select the same columns
    wb.set_col_visible("Sheet1", "V:F", true).unwrap();
    assert!(wb.get_col_visible("Sheet1", "K").unwrap());
}

#[test]
fn col_visibility_errors() {
    let mut wb = Workbook::new();
    let err = wb.set_col_visible("Sheet1", "*", false).unwrap_err();
    assert_eq!(err.to_string(), r#"invalid column name "*""#);
    let err = wb.set_col_visible("Sheet1", "F:-1", false).unwrap_err();
    assert_eq!(err.to_string(), r#"invalid column name "-1""#);
    let err = wb.set_col_visible("SheetN", "F", false).unwrap_err();
    assert_eq!(err.to_string(), "sheet SheetN is not exist");
    let err = wb.get_col_visible("Sheet1", "*").unwrap_err();
    assert_eq!(err.to_string(), r#"invalid column name "*""#);
}

#[test]
fn col_visibility_keeps_other_settings() {
    let mut wb = Workbook::new();
    wb.set_col_width("Sheet1", "D", "D", 14.0).unwrap();
    wb.set_col_visible("Sheet1", "C:E", false).unwrap();
    assert_eq!(wb.get_col_width("Sheet1", "D").unwrap(), 14.0);
    assert!(!wb.get_col_visible("Sheet1", "D").unwrap());
}

#[test]
fn col_width() {
    let mut wb = Workbook::new();
    // Unset columns report the default width
    assert_eq!(wb.get_col_width("Sheet1", "A").unwrap(), 9.140625);

    wb.set_col_width("Sheet1", "D", "F", 12.5).unwrap();
    assert_eq!(wb.get_col_width("Sheet1", "D").unwrap(), 12.5);
    assert_eq!(wb.get_col_width("Sheet1", "F").unwrap(), 12.5);
    assert_eq!(wb.get_col_width("Sheet1", "G").unwrap(), 9.140625);

    // Reversed endpoints
    wb.set_col_width("Sheet1", "J", "H", 20.0).unwrap();
    assert_eq!(wb.get_col_width("Sheet1", "I").unwrap(), 20.0);
}

#[test]
fn col_width_errors() {
    let mut wb = Workbook::new();
    let err = wb.set_col_width("Sheet1", "D", "F", 256.0).unwrap_err();
    assert_eq!(
        err.to_string(),
        "the width of the column must be less than or equal to 255 characters"
    );
    let err = wb.set_col_width("Sheet1", "*", "F", 10.0).unwrap_err();
    assert_eq!(err.to_string(), r#"invalid column name "*""#);
    let err = wb.set_col_width("SheetN", "D", "F", 10.0).unwrap_err();
    assert_eq!(err.to_string(), "sheet SheetN is not exist");
    let err = wb.get_col_width("SheetN", "D").unwrap_err();
    assert_eq!(err.to_string(), "sheet SheetN is not exist");
}

#[test]
fn col_outline_levels() {
    let mut wb = Workbook::new();
    assert_eq!(wb.get_col_outline_level("Sheet1", "D").unwrap(), 0);

    wb.set_col_outline_level("Sheet1", "D", 4).unwrap();
    assert_eq!(wb.get_col_outline_level("Sheet1", "D").unwrap(), 4);
    assert_eq!(wb.get_col_outline_level("Sheet1", "E").unwrap(), 0);

    let err = wb.set_col_outline_level("Sheet1", "D", 8).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid outline level, the outline level must be in the range 1-7"
    );
    let err = wb.set_col_outline_level("Sheet1", "D", 0).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid outline level, the outline level must be in the range 1-7"
    );
    let err = wb.set_col_outline_level("SheetN", "D", 2).unwrap_err();
    assert_eq!(err.to_string(), "sheet SheetN is not exist");
}

#[test]
fn col_style_applies_to_records_and_cells() {
    let mut wb = Workbook::new();
    wb.set_cell_value("Sheet1", "C2", "x").unwrap();
    wb.set_cell_value("Sheet1", "D2", "y").unwrap();
    wb.set_col_style("Sheet1", "C:D", 2).unwrap();

    let ws = flushed_sheet1(&wb);
    assert!(ws
        .cols
        .iter()
        .filter(|c| c.min >= 3 && c.max <= 4)
        .all(|c| c.style == Some(2)));
    for cell in &ws.rows[0].cells {
        assert_eq!(cell.style, Some(2));
    }
}

#[test]
fn insert_cols_shifts_everything_right() {
    let mut wb = Workbook::new();
    wb.set_cell_value("Sheet1", "C2", "moved").unwrap();
    wb.merge_cell("Sheet1", "C2", "D2").unwrap();
    wb.set_cell_hyperlink("Sheet1", "C2", "https://example.com")
        .unwrap();

    wb.insert_cols("Sheet1", "C", 1).unwrap();

    assert_eq!(wb.get_cell_value("Sheet1", "C2").unwrap(), "");
    assert_eq!(wb.get_cell_value("Sheet1", "D2").unwrap(), "moved");

    let ws = flushed_sheet1(&wb);
    assert_eq!(ws.merge_cells, vec!["D2:E2".to_string()]);
    assert_eq!(ws.hyperlinks[0].reference, "D2");
}

#[test]
fn insert_cols_rejects_bad_arguments() {
    let mut wb = Workbook::new();
    let err = wb.insert_cols("Sheet1", "*", 1).unwrap_err();
    assert_eq!(err.to_string(), r#"invalid column name "*""#);
    let err = wb.insert_cols("Sheet1", "C", 0).unwrap_err();
    assert_eq!(
        err.to_string(),
        "the column number must be greater than or equal to 1 and less than or equal to 16384"
    );

    wb.set_cell_value("Sheet1", "XFD1", "edge").unwrap();
    let err = wb.insert_cols("Sheet1", "A", 1).unwrap_err();
    assert_eq!(
        err.to_string(),
        "the column number must be greater than or equal to 1 and less than or equal to 16384"
    );
}

#[test]
fn remove_col_shifts_left_and_drops_structures() {
    let mut wb = Workbook::new();
    wb.set_cell_value("Sheet1", "A1", "a").unwrap();
    wb.set_cell_value("Sheet1", "B1", "b").unwrap();
    wb.set_cell_value("Sheet1", "C1", "c").unwrap();
    wb.merge_cell("Sheet1", "A1", "B1").unwrap();
    wb.set_cell_hyperlink("Sheet1", "B1", "https://example.com")
        .unwrap();

    wb.remove_col("Sheet1", "B").unwrap();

    assert_eq!(wb.get_cell_value("Sheet1", "A1").unwrap(), "a");
    assert_eq!(wb.get_cell_value("Sheet1", "B1").unwrap(), "c");
    assert_eq!(wb.get_cell_value("Sheet1", "C1").unwrap(), "");

    let ws = flushed_sheet1(&wb);
    // The merge collapsed to a single cell and the link anchor was removed
    assert!(ws.merge_cells.is_empty());
    assert!(ws.hyperlinks.is_empty());
}

#[test]
fn remove_col_unknown_sheet() {
    let mut wb = Workbook::new();
    let err = wb.remove_col("SheetN", "B").unwrap_err();
    assert_eq!(err.to_string(), "sheet SheetN is not exist");
}

#[test]
fn dimension_cleared_after_structural_change() {
    let mut wb = Workbook::new();
    wb.set_cell_value("Sheet1", "C2", "x").unwrap();
    assert_eq!(
        wb.sheet_dimension("Sheet1").unwrap().as_deref(),
        Some("C2:C2")
    );

    wb.insert_cols("Sheet1", "A", 2).unwrap();
    // Recomputed from cells after the hint was dropped
    assert_eq!(
        wb.sheet_dimension("Sheet1").unwrap().as_deref(),
        Some("E2:E2")
    );
}
