//! Reporting the non-default properties of style records

use cellpatch_core::{CellFormat, Color, VerticalAlignment};

use crate::xml::XmlElement;

/// `#rrggbb` of an `rgb` colour attribute; black and theme/indexed colours
/// are not reported
fn reported_color(el: &XmlElement) -> Option<String> {
    let color = Color::from_hex(el.attr("rgb")?)?;
    if color.is_black() {
        None
    } else {
        Some(color.to_hex())
    }
}

/// Boolean font flag such as `<b/>`; `val="0"` switches it off
fn flag(font: &XmlElement, local: &str) -> bool {
    match font.find_local(local) {
        Some(el) => !matches!(el.attr("val"), Some("0") | Some("false")),
        None => false,
    }
}

pub(crate) fn read_font(font: &XmlElement, fmt: &mut CellFormat) {
    if flag(font, "b") {
        fmt.bold = Some(true);
    }
    if flag(font, "i") {
        fmt.italic = Some(true);
    }
    if let Some(u) = font.find_local("u") {
        if u.attr("val") != Some("none") {
            fmt.underline = Some(true);
        }
    }
    if let Some(sz) = font.find_local("sz") {
        fmt.font_size = sz.attr("val").and_then(|v| v.trim().parse().ok());
    }
    if let Some(name) = font.find_local("name") {
        fmt.font_name = name.attr("val").map(str::to_string);
    }
    fmt.font_color = font.find_local("color").and_then(reported_color);
}

pub(crate) fn read_fill(fill: &XmlElement, fmt: &mut CellFormat) {
    fmt.bg = fill
        .find_local("patternFill")
        .and_then(|p| p.find_local("fgColor"))
        .and_then(reported_color);
}

pub(crate) fn read_border(border: &XmlElement, fmt: &mut CellFormat) {
    for (side, alias) in [
        ("left", "start"),
        ("right", "end"),
        ("top", "top"),
        ("bottom", "bottom"),
    ] {
        let edge = border.find_local(side).or_else(|| border.find_local(alias));
        let style = edge.and_then(|e| e.attr("style"));
        if let Some(style) = style.filter(|s| *s != "none") {
            fmt.borders.insert(side.to_string(), style.to_string());
        }
    }
}

pub(crate) fn read_alignment(alignment: &XmlElement, fmt: &mut CellFormat) {
    if let Some(h) = alignment.attr("horizontal").filter(|h| *h != "general") {
        fmt.text_align = Some(h.to_string());
    }
    if let Some(v) = alignment.attr("vertical").filter(|v| *v != "bottom") {
        let label = VerticalAlignment::from_ooxml(v).map(|v| v.label()).unwrap_or(v);
        fmt.vertical_align = Some(label.to_string());
    }
    if matches!(alignment.attr("wrapText"), Some("1") | Some("true")) {
        fmt.wrap_text = Some(true);
    }
}
