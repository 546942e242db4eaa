//! Overlaying a format request onto existing style records
//!
//! Each function takes a copy of the base record and changes only what the
//! request names. Children are kept in schema order so the result is valid
//! wherever the base record was.

use std::collections::BTreeMap;

use cellpatch_core::{BorderLineStyle, BorderSide, BorderSpec, Color, FormatSpec};

use crate::xml::{NamespaceScope, XmlElement};

/// Child order of `<font>`
const FONT_ORDER: &[&str] = &[
    "b", "i", "strike", "condense", "extend", "outline", "shadow", "u", "vertAlign", "sz",
    "color", "name", "family", "charset", "scheme",
];

/// Child order of `<border>`; `start`/`end` are the strict spellings of left/right
const BORDER_ORDER: &[&str] = &[
    "start",
    "left",
    "end",
    "right",
    "top",
    "bottom",
    "diagonal",
    "vertical",
    "horizontal",
];

/// Child order of `<xf>`
const XF_ORDER: &[&str] = &["alignment", "protection", "extLst"];

/// Replace the child with `child`'s local name, keeping schema order
fn put_child(parent: &mut XmlElement, child: XmlElement, order: &[&str]) {
    let local = child.local_name().to_string();
    parent.remove_local(&local);
    let followers: &[&str] = match order.iter().position(|o| *o == local) {
        Some(pos) => &order[pos + 1..],
        None => &[],
    };
    parent.insert_before_any(child, followers);
}

fn color_element(scope: &NamespaceScope, local: &str, color: Color) -> XmlElement {
    scope.element(local).with_attr("rgb", color.to_argb_hex())
}

/// Font record with the requested font properties applied
pub(crate) fn merge_font(mut font: XmlElement, spec: &FormatSpec, scope: &NamespaceScope) -> XmlElement {
    for (local, wanted) in [("b", spec.bold), ("i", spec.italic)] {
        match wanted {
            Some(true) => put_child(&mut font, scope.element(local), FONT_ORDER),
            Some(false) => {
                font.remove_local(local);
            }
            None => {}
        }
    }

    match spec.underline {
        Some(true) => {
            // an existing double/accounting underline already satisfies the request
            let underlined = font
                .find_local("u")
                .map(|u| u.attr("val") != Some("none"))
                .unwrap_or(false);
            if !underlined {
                put_child(&mut font, scope.element("u"), FONT_ORDER);
            }
        }
        Some(false) => {
            font.remove_local("u");
        }
        None => {}
    }

    if let Some(size) = spec.font_size {
        put_child(
            &mut font,
            scope.element("sz").with_attr("val", size.to_string()),
            FONT_ORDER,
        );
    }
    if let Some(color) = spec.font_color {
        put_child(&mut font, color_element(scope, "color", color), FONT_ORDER);
    }
    if let Some(name) = &spec.font_name {
        put_child(
            &mut font,
            scope.element("name").with_attr("val", name.as_str()),
            FONT_ORDER,
        );
        // a theme scheme would override the explicit name
        font.remove_local("scheme");
    }
    font
}

/// Solid fill of one colour
pub(crate) fn solid_fill(color: Color, scope: &NamespaceScope) -> XmlElement {
    let pattern = scope
        .element("patternFill")
        .with_attr("patternType", "solid")
        .with_child(color_element(scope, "fgColor", color))
        .with_child(scope.element("bgColor").with_attr("indexed", "64"));
    scope.element("fill").with_child(pattern)
}

/// Border record with the given edges replaced
pub(crate) fn merge_border(
    mut border: XmlElement,
    edges: &BTreeMap<BorderSide, BorderSpec>,
    scope: &NamespaceScope,
) -> XmlElement {
    for (side, spec) in edges {
        let local = side.element_name();
        match side {
            BorderSide::Left => {
                border.remove_local("start");
            }
            BorderSide::Right => {
                border.remove_local("end");
            }
            _ => {}
        }

        let mut edge = scope.element(local);
        if spec.style != BorderLineStyle::None {
            edge.set_attr("style", spec.style.as_ooxml());
            edge.push(color_element(scope, "color", spec.color));
        }
        put_child(&mut border, edge, BORDER_ORDER);
    }
    border
}

/// Apply the alignment part of a request to an `<xf>` in place
pub(crate) fn merge_alignment(xf: &mut XmlElement, spec: &FormatSpec, scope: &NamespaceScope) {
    let mut alignment = xf
        .find_local("alignment")
        .cloned()
        .unwrap_or_else(|| scope.element("alignment"));

    if let Some(h) = spec.text_align {
        alignment.set_attr("horizontal", h.as_ooxml());
    }
    if let Some(v) = spec.vertical_align {
        alignment.set_attr("vertical", v.as_ooxml());
    }
    match spec.wrap_text {
        Some(true) => alignment.set_attr("wrapText", "1"),
        Some(false) => {
            alignment.remove_attr("wrapText");
        }
        None => {}
    }

    if alignment.attributes.is_empty() && alignment.children.is_empty() {
        xf.remove_local("alignment");
    } else {
        put_child(xf, alignment, XF_ORDER);
    }
}
