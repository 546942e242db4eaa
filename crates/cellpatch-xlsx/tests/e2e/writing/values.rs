//! Tests for `write_values`, checked by reopening the saved file.

use crate::{
    member_text, read_members, WorkbookBuilder, CALC_CHAIN_PART, CONTENT_TYPES_PART,
    SHARED_STRINGS_PART, WORKBOOK_RELS_PART,
};
use cellpatch_core::CellValue;
use cellpatch_xlsx::{WriteInput, XlsxError, XlsxSession};
use pretty_assertions::assert_eq;
use serde_json::json;

fn s(text: &str) -> CellValue {
    CellValue::string(text)
}

#[test]
fn test_values_survive_save_and_reopen() {
    let fixture = WorkbookBuilder::standard().write();
    let mut session = fixture.open();

    let input = WriteInput::from_json(&json!([["x", 1.5, -7], [true, null, 1e20]]));
    session.write_values("Data", "D1:F2", &input).unwrap();
    session.save().unwrap();

    let mut reopened = XlsxSession::open(&fixture.path).unwrap();
    let values = reopened.read_values("Data", "A1:F2").unwrap();
    assert_eq!(
        values,
        vec![
            vec![s("Name"), s("Value"), CellValue::Number(3.5), s("x"), CellValue::Number(1.5), CellValue::Integer(-7)],
            vec![
                CellValue::Integer(42),
                CellValue::Boolean(true),
                CellValue::Integer(84),
                CellValue::Boolean(true),
                CellValue::Empty,
                CellValue::Number(1e20),
            ],
        ]
    );
}

#[test]
fn test_strings_are_interned() {
    let fixture = WorkbookBuilder::standard().write();
    let mut session = fixture.open();
    assert_eq!(session.shared_string_count().unwrap(), 2);

    session
        .write_values("Data", "D1:E1", &WriteInput::from_json(&json!(["Name", "Value"])))
        .unwrap();
    assert_eq!(session.shared_string_count().unwrap(), 2);

    session
        .write_values("Data", "D2:D3", &WriteInput::from_json(&json!(["fresh", "fresh"])))
        .unwrap();
    assert_eq!(session.shared_string_count().unwrap(), 3);
    session.save().unwrap();

    let sst = member_text(&fixture.path, SHARED_STRINGS_PART);
    assert!(sst.contains(r#"uniqueCount="3""#), "{}", sst);
    assert_eq!(sst.matches("<si>").count(), 3);
    assert!(sst.contains("<t>fresh</t>"));
}

#[test]
fn test_flat_list_runs_down_a_column() {
    let fixture = WorkbookBuilder::standard().write();
    let mut session = fixture.open();

    session
        .write_values("Data", "A5:A7", &WriteInput::from_json(&json!([1, 2, 3, 4])))
        .unwrap();

    let values = session.read_values("Data", "A5:A8").unwrap();
    assert_eq!(
        values,
        vec![
            vec![CellValue::Integer(1)],
            vec![CellValue::Integer(2)],
            vec![CellValue::Integer(3)],
            vec![CellValue::Empty],
        ]
    );
}

#[test]
fn test_flat_list_fills_a_column_after_reopen() {
    let fixture = WorkbookBuilder::bare().write();
    let mut session = fixture.open();

    session
        .write_values("Sheet1", "A1:A3", &WriteInput::from_json(&json!([1, 2, 3])))
        .unwrap();
    session.save().unwrap();

    let mut reopened = XlsxSession::open(&fixture.path).unwrap();
    assert_eq!(
        reopened.read_values("Sheet1", "A1:B3").unwrap(),
        vec![
            vec![CellValue::Integer(1), CellValue::Empty],
            vec![CellValue::Integer(2), CellValue::Empty],
            vec![CellValue::Integer(3), CellValue::Empty],
        ]
    );
}

#[test]
fn test_flat_list_repeats_over_a_block() {
    let fixture = WorkbookBuilder::standard().write();
    let mut session = fixture.open();

    session
        .write_values("Data", "A5:B6", &WriteInput::from_json(&json!(["a", "b", "c"])))
        .unwrap();

    let values = session.read_values("Data", "A5:C6").unwrap();
    assert_eq!(
        values,
        vec![
            vec![s("a"), s("b"), CellValue::Empty],
            vec![s("a"), s("b"), CellValue::Empty],
        ]
    );
}

#[test]
fn test_grid_larger_than_range_is_clipped() {
    let fixture = WorkbookBuilder::standard().write();
    let mut session = fixture.open();

    let input = WriteInput::from_json(&json!([[1, 2, 3], [4, 5, 6], [7, 8, 9]]));
    session.write_values("Data", "A5:B6", &input).unwrap();

    let values = session.read_values("Data", "A5:C7").unwrap();
    assert_eq!(
        values,
        vec![
            vec![CellValue::Integer(1), CellValue::Integer(2), CellValue::Empty],
            vec![CellValue::Integer(4), CellValue::Integer(5), CellValue::Empty],
            vec![CellValue::Empty, CellValue::Empty, CellValue::Empty],
        ]
    );
}

#[test]
fn test_scalar_writes_only_top_left() {
    let fixture = WorkbookBuilder::standard().write();
    let mut session = fixture.open();

    session
        .write_values("Data", "A5:B6", &WriteInput::Scalar(CellValue::Integer(9)))
        .unwrap();

    let values = session.read_values("Data", "A5:B6").unwrap();
    assert_eq!(
        values,
        vec![
            vec![CellValue::Integer(9), CellValue::Empty],
            vec![CellValue::Empty, CellValue::Empty],
        ]
    );
}

#[test]
fn test_null_clears_value_but_keeps_style() {
    let fixture = WorkbookBuilder::standard().write();
    let mut session = fixture.open();

    session
        .write_values("Data", "C1", &WriteInput::Scalar(CellValue::Empty))
        .unwrap();
    session.save().unwrap();

    let mut reopened = XlsxSession::open(&fixture.path).unwrap();
    assert_eq!(reopened.read_values("Data", "C1").unwrap(), vec![vec![CellValue::Empty]]);
    let formats = reopened.read_formats("Data", "C1").unwrap();
    assert_eq!(formats.len(), 1);
    assert_eq!(formats[0].bold, Some(true));
}

#[test]
fn test_error_values_are_written_as_text() {
    let fixture = WorkbookBuilder::standard().write();
    let mut session = fixture.open();

    session
        .write_values("Data", "D1", &WriteInput::Scalar(CellValue::Error("#N/A".into())))
        .unwrap();

    assert_eq!(session.read_values("Data", "D1").unwrap(), vec![vec![s("#N/A")]]);
}

#[test]
fn test_overwriting_a_formula_drops_calc_chain() {
    let fixture = WorkbookBuilder::standard().write();
    let mut session = fixture.open();

    session
        .write_values("Data", "C2", &WriteInput::Scalar(CellValue::Integer(5)))
        .unwrap();
    session.save().unwrap();

    let members = read_members(&fixture.path);
    assert!(!members.contains_key(CALC_CHAIN_PART));
    let content_types = member_text(&fixture.path, CONTENT_TYPES_PART);
    assert!(!content_types.contains("calcChain"), "{}", content_types);
    let rels = member_text(&fixture.path, WORKBOOK_RELS_PART);
    assert!(!rels.contains("calcChain"), "{}", rels);
    assert!(rels.contains("sharedStrings"));

    let sheet = member_text(&fixture.path, crate::DATA_SHEET_PART);
    assert!(!sheet.contains("<f>"), "{}", sheet);

    let mut reopened = XlsxSession::open(&fixture.path).unwrap();
    assert_eq!(
        reopened.read_values("Data", "C2").unwrap(),
        vec![vec![CellValue::Integer(5)]]
    );
}

#[test]
fn test_plain_writes_keep_calc_chain() {
    let fixture = WorkbookBuilder::standard().write();
    let mut session = fixture.open();

    session
        .write_values("Data", "D2", &WriteInput::Scalar(CellValue::Integer(5)))
        .unwrap();
    session.save().unwrap();

    let members = read_members(&fixture.path);
    assert!(members.contains_key(CALC_CHAIN_PART));
}

#[test]
fn test_shared_strings_created_when_missing() {
    let fixture = WorkbookBuilder::bare().write();
    let mut session = fixture.open();

    session
        .write_values("Sheet1", "B1", &WriteInput::Scalar(s("hello")))
        .unwrap();
    session.save().unwrap();

    let members = read_members(&fixture.path);
    assert!(members.contains_key(SHARED_STRINGS_PART));
    let content_types = member_text(&fixture.path, CONTENT_TYPES_PART);
    assert!(content_types.contains(r#"PartName="/xl/sharedStrings.xml""#), "{}", content_types);
    let rels = member_text(&fixture.path, WORKBOOK_RELS_PART);
    assert!(rels.contains(r#"Target="sharedStrings.xml""#), "{}", rels);

    let mut reopened = XlsxSession::open(&fixture.path).unwrap();
    assert_eq!(
        reopened.read_values("Sheet1", "A1:B1").unwrap(),
        vec![vec![CellValue::Integer(1), s("hello")]]
    );
}

#[test]
fn test_unrelated_shared_strings_are_reused_and_registered() {
    let fixture = WorkbookBuilder::new()
        .sheet(
            "Sheet1",
            &crate::sheet_xml(r#"<row r="1"><c r="A1" t="s"><v>0</v></c></row>"#),
        )
        .member(SHARED_STRINGS_PART, crate::standard_shared_strings())
        .write();
    let mut session = fixture.open();

    session
        .write_values("Sheet1", "B1", &WriteInput::Scalar(s("Value")))
        .unwrap();
    assert_eq!(session.shared_string_count().unwrap(), 2);
    session.save().unwrap();

    let sst = member_text(&fixture.path, SHARED_STRINGS_PART);
    assert_eq!(sst.matches("<si>").count(), 2);
    let content_types = member_text(&fixture.path, CONTENT_TYPES_PART);
    assert!(content_types.contains(r#"PartName="/xl/sharedStrings.xml""#), "{}", content_types);
    let rels = member_text(&fixture.path, WORKBOOK_RELS_PART);
    assert!(rels.contains(r#"Target="sharedStrings.xml""#), "{}", rels);

    let mut reopened = XlsxSession::open(&fixture.path).unwrap();
    assert_eq!(
        reopened.read_values("Sheet1", "A1:B1").unwrap(),
        vec![vec![s("Name"), s("Value")]]
    );
}

#[test]
fn test_large_numbers_use_exponent_form() {
    let fixture = WorkbookBuilder::bare().write();
    let mut session = fixture.open();

    session
        .write_values("Sheet1", "B1", &WriteInput::Scalar(CellValue::Number(1e300)))
        .unwrap();
    session.save().unwrap();

    let sheet = member_text(&fixture.path, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("<v>1E+300</v>"), "{}", sheet);
    let mut reopened = XlsxSession::open(&fixture.path).unwrap();
    assert_eq!(
        reopened.read_values("Sheet1", "B1").unwrap(),
        vec![vec![CellValue::Number(1e300)]]
    );
}

#[test]
fn test_numbers_alone_do_not_create_shared_strings() {
    let fixture = WorkbookBuilder::bare().write();
    let mut session = fixture.open();

    session
        .write_values("Sheet1", "B1", &WriteInput::Scalar(CellValue::Number(2.5)))
        .unwrap();
    session.save().unwrap();

    assert!(!read_members(&fixture.path).contains_key(SHARED_STRINGS_PART));
}

#[test]
fn test_invalid_value_changes_nothing() {
    let fixture = WorkbookBuilder::standard().write();
    let mut session = fixture.open();

    let input = WriteInput::Row(vec![s("ok"), CellValue::Number(f64::NAN)]);
    let err = session.write_values("Data", "D1:E1", &input).unwrap_err();

    assert!(matches!(err, XlsxError::Core(cellpatch_core::Error::InvalidValue(_))));
    assert!(!session.is_modified());
    assert_eq!(session.shared_string_count().unwrap(), 2);
}

#[test]
fn test_dimension_is_refreshed() {
    let fixture = WorkbookBuilder::standard().write();
    let mut session = fixture.open();

    session
        .write_values("Data", "E10", &WriteInput::Scalar(CellValue::Integer(1)))
        .unwrap();
    session.save().unwrap();

    let sheet = member_text(&fixture.path, crate::DATA_SHEET_PART);
    assert!(sheet.contains(r#"<dimension ref="A1:E10"/>"#), "{}", sheet);
}

#[test]
fn test_save_as_leaves_source_untouched() {
    let fixture = WorkbookBuilder::standard().write();
    let before = read_members(&fixture.path);
    let target = fixture.sibling("copy.xlsx");

    let mut session = fixture.open();
    session
        .write_values("Data", "A1", &WriteInput::Scalar(s("renamed")))
        .unwrap();
    session.save_as(&target).unwrap();

    assert_eq!(session.path(), target.as_path());
    assert_eq!(read_members(&fixture.path), before);
    let mut copy = XlsxSession::open(&target).unwrap();
    assert_eq!(copy.read_values("Data", "A1").unwrap(), vec![vec![s("renamed")]]);
}
