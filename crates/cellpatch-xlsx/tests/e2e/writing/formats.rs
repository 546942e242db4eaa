//! Tests for `apply_format`: merging onto existing styles and deduplication.

use crate::{count_elements, member_text, read_members, WorkbookBuilder, CONTENT_TYPES_PART, STYLES_PART, WORKBOOK_RELS_PART};
use cellpatch_core::{
    BorderLineStyle, BorderPosition, BorderSpec, Color, FormatSpec, HorizontalAlignment,
    VerticalAlignment,
};
use cellpatch_xlsx::{XlsxError, XlsxSession};
use pretty_assertions::assert_eq;

fn thin_black() -> BorderSpec {
    BorderSpec::new(BorderLineStyle::Thin, Color::BLACK)
}

#[test]
fn test_background_keeps_existing_font() {
    let fixture = WorkbookBuilder::standard().write();
    let mut session = fixture.open();

    session
        .apply_format("Data", "C1", &FormatSpec::new().background(Color::YELLOW))
        .unwrap();
    session.save().unwrap();

    let mut reopened = XlsxSession::open(&fixture.path).unwrap();
    let formats = reopened.read_formats("Data", "C1").unwrap();
    assert_eq!(formats.len(), 1);
    let c1 = &formats[0];
    assert_eq!(c1.bold, Some(true));
    assert_eq!(c1.font_name.as_deref(), Some("Arial"));
    assert_eq!(c1.font_size, Some(12.0));
    assert_eq!(c1.font_color.as_deref(), Some("#ff0000"));
    assert_eq!(c1.bg.as_deref(), Some("#ffff00"));
}

#[test]
fn test_font_color_change_keeps_bold_and_size() {
    let fixture = WorkbookBuilder::standard().write();
    let mut session = fixture.open();

    session
        .apply_format("Data", "C1", &FormatSpec::new().font_color(Color::rgb(0, 0, 255)))
        .unwrap();

    let formats = session.read_formats("Data", "C1").unwrap();
    assert_eq!(formats[0].font_color.as_deref(), Some("#0000ff"));
    assert_eq!(formats[0].bold, Some(true));
    assert_eq!(formats[0].font_size, Some(12.0));
}

#[test]
fn test_column_background_adds_one_fill_and_one_xf() {
    let fixture = WorkbookBuilder::standard().write();
    let mut session = fixture.open();
    let before = session.style_counts().unwrap().unwrap();

    session
        .apply_format("Data", "A1:A3", &FormatSpec::new().background(Color::YELLOW))
        .unwrap();

    let after = session.style_counts().unwrap().unwrap();
    assert_eq!(after.fills, before.fills + 1);
    assert_eq!(after.cell_xfs, before.cell_xfs + 1);
    assert_eq!(after.fonts, before.fonts);
    assert_eq!(after.borders, before.borders);

    session.save().unwrap();
    let styles = member_text(&fixture.path, STYLES_PART);
    assert_eq!(count_elements(&styles, "fill"), 3);
    assert!(styles.contains(r#"<fills count="3">"#), "{}", styles);
    assert!(styles.contains(r#"<cellXfs count="3">"#), "{}", styles);
}

#[test]
fn test_repeating_a_format_adds_nothing() {
    let fixture = WorkbookBuilder::standard().write();
    let mut session = fixture.open();
    let spec = FormatSpec::new()
        .bold(true)
        .background(Color::rgb(0xDD, 0xEE, 0xFF))
        .border(BorderPosition::Outside, thin_black());

    session.apply_format("Data", "A1:C3", &spec).unwrap();
    let first = session.style_counts().unwrap().unwrap();
    session.save().unwrap();
    let styles_after_first = read_members(&fixture.path)[STYLES_PART].clone();

    session.apply_format("Data", "A1:C3", &spec).unwrap();
    assert_eq!(session.style_counts().unwrap().unwrap(), first);
    session.save().unwrap();

    assert_eq!(read_members(&fixture.path)[STYLES_PART], styles_after_first);
}

#[test]
fn test_equal_results_share_a_style() {
    let fixture = WorkbookBuilder::standard().write();
    let mut session = fixture.open();
    let before = session.style_counts().unwrap().unwrap();

    // C1 is already bold; D1 and E1 share the default style
    session
        .apply_format("Data", "C1:E1", &FormatSpec::new().bold(true))
        .unwrap();

    let after = session.style_counts().unwrap().unwrap();
    assert_eq!(after.cell_xfs, before.cell_xfs + 1);
    assert_eq!(after.fonts, before.fonts + 1);
}

#[test]
fn test_outside_border_paints_perimeter_only() {
    let fixture = WorkbookBuilder::standard().write();
    let mut session = fixture.open();

    let spec = FormatSpec::new().border(BorderPosition::Outside, thin_black());
    session.apply_format("Data", "E5:G7", &spec).unwrap();

    let formats = session.read_formats("Data", "E5:G7").unwrap();
    let sides = |cell: &str| -> Vec<String> {
        formats
            .iter()
            .find(|f| f.cell == cell)
            .map(|f| f.borders.keys().cloned().collect())
            .unwrap_or_default()
    };
    assert_eq!(sides("E5"), vec!["left", "top"]);
    assert_eq!(sides("F5"), vec!["top"]);
    assert_eq!(sides("G7"), vec!["bottom", "right"]);
    assert_eq!(sides("F6"), Vec::<String>::new());
    assert_eq!(formats.len(), 8);
}

#[test]
fn test_inside_border_paints_grid_only() {
    let fixture = WorkbookBuilder::standard().write();
    let mut session = fixture.open();

    let spec = FormatSpec::new().border(
        BorderPosition::Inside,
        BorderSpec::new(BorderLineStyle::Dashed, Color::BLACK),
    );
    session.apply_format("Data", "E5:F6", &spec).unwrap();

    let formats = session.read_formats("Data", "E5:F6").unwrap();
    let e5 = formats.iter().find(|f| f.cell == "E5").unwrap();
    assert_eq!(
        e5.borders.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect::<Vec<_>>(),
        vec![("bottom", "dashed"), ("right", "dashed")]
    );
    let f6 = formats.iter().find(|f| f.cell == "F6").unwrap();
    assert_eq!(f6.borders.keys().collect::<Vec<_>>(), vec!["left", "top"]);
}

#[test]
fn test_alignment_and_wrap() {
    let fixture = WorkbookBuilder::standard().write();
    let mut session = fixture.open();

    let spec = FormatSpec::new()
        .text_align(HorizontalAlignment::Center)
        .vertical_align(VerticalAlignment::Center)
        .wrap_text(true);
    session.apply_format("Data", "A1", &spec).unwrap();

    let a1 = &session.read_formats("Data", "A1").unwrap()[0];
    assert_eq!(a1.text_align.as_deref(), Some("center"));
    assert_eq!(a1.vertical_align.as_deref(), Some("middle"));
    assert_eq!(a1.wrap_text, Some(true));

    session
        .apply_format("Data", "A1", &FormatSpec::new().wrap_text(false))
        .unwrap();
    let a1 = &session.read_formats("Data", "A1").unwrap()[0];
    assert_eq!(a1.wrap_text, None);
    assert_eq!(a1.text_align.as_deref(), Some("center"));
}

#[test]
fn test_custom_number_format_is_registered() {
    let fixture = WorkbookBuilder::standard().write();
    let mut session = fixture.open();

    session
        .apply_format("Data", "A2", &FormatSpec::new().number_format("0.000"))
        .unwrap();
    session
        .apply_format("Data", "B2", &FormatSpec::new().number_format("0.00%"))
        .unwrap();
    session.save().unwrap();

    let styles = member_text(&fixture.path, STYLES_PART);
    assert!(
        styles.contains(r#"<numFmts count="1"><numFmt numFmtId="164" formatCode="0.000"/></numFmts>"#),
        "{}",
        styles
    );
    assert!(styles.find("<numFmts").unwrap() < styles.find("<fonts").unwrap());

    let mut reopened = XlsxSession::open(&fixture.path).unwrap();
    let formats = reopened.read_formats("Data", "A2:B2").unwrap();
    assert_eq!(formats[0].number_format.as_deref(), Some("0.000"));
    assert_eq!(formats[1].number_format.as_deref(), Some("0.00%"));
}

#[test]
fn test_no_background_clears_fill() {
    let fixture = WorkbookBuilder::standard().write();
    let mut session = fixture.open();

    session
        .apply_format("Data", "A1", &FormatSpec::new().background(Color::YELLOW))
        .unwrap();
    assert_eq!(session.read_formats("Data", "A1").unwrap()[0].bg.as_deref(), Some("#ffff00"));

    session
        .apply_format("Data", "A1", &FormatSpec::new().no_background())
        .unwrap();
    assert!(session.read_formats("Data", "A1").unwrap().is_empty());
}

#[test]
fn test_styles_created_when_missing() {
    let fixture = WorkbookBuilder::bare().write();
    let mut session = fixture.open();

    session
        .apply_format("Sheet1", "A1", &FormatSpec::new().italic(true))
        .unwrap();
    session.save().unwrap();

    assert!(read_members(&fixture.path).contains_key(STYLES_PART));
    let content_types = member_text(&fixture.path, CONTENT_TYPES_PART);
    assert!(content_types.contains(r#"PartName="/xl/styles.xml""#), "{}", content_types);
    let rels = member_text(&fixture.path, WORKBOOK_RELS_PART);
    assert!(rels.contains(r#"Target="styles.xml""#), "{}", rels);

    let mut reopened = XlsxSession::open(&fixture.path).unwrap();
    let formats = reopened.read_formats("Sheet1", "A1").unwrap();
    assert_eq!(formats.len(), 1);
    assert_eq!(formats[0].italic, Some(true));
}

#[test]
fn test_invalid_spec_changes_nothing() {
    let fixture = WorkbookBuilder::standard().write();
    let mut session = fixture.open();

    let err = session
        .apply_format("Data", "A1", &FormatSpec::new().font_size(500.0))
        .unwrap_err();

    assert!(matches!(err, XlsxError::Core(cellpatch_core::Error::InvalidFormatSpec(_))));
    assert!(!session.is_modified());
}

#[test]
fn test_empty_spec_is_a_no_op() {
    let fixture = WorkbookBuilder::standard().write();
    let mut session = fixture.open();

    session.apply_format("Data", "A1:C3", &FormatSpec::new()).unwrap();

    assert!(!session.is_modified());
}

#[test]
fn test_format_spec_from_json() {
    let fixture = WorkbookBuilder::standard().write();
    let mut session = fixture.open();

    let spec = FormatSpec::from_json_str(
        r##"{"bold": true, "backgroundColor": "#00FF00", "borders": {"bottom": {"style": "double"}}}"##,
    )
    .unwrap();
    session.apply_format("Data", "B2", &spec).unwrap();

    let b2 = &session.read_formats("Data", "B2").unwrap()[0];
    assert_eq!(b2.bold, Some(true));
    assert_eq!(b2.bg.as_deref(), Some("#00ff00"));
    assert_eq!(b2.borders.get("bottom").map(String::as_str), Some("double"));
}
