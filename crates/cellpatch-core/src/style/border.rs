//! Border style types

use super::Color;
use serde::Deserialize;

/// Border line style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BorderLineStyle {
    /// No border; removes an existing edge
    None,
    #[default]
    Thin,
    Medium,
    Thick,
    Dashed,
    Dotted,
    Double,
    Hair,
    MediumDashed,
    DashDot,
    MediumDashDot,
    DashDotDot,
    MediumDashDotDot,
    SlantDashDot,
}

impl BorderLineStyle {
    /// `style` attribute value
    pub fn as_ooxml(&self) -> &'static str {
        match self {
            BorderLineStyle::None => "none",
            BorderLineStyle::Thin => "thin",
            BorderLineStyle::Medium => "medium",
            BorderLineStyle::Thick => "thick",
            BorderLineStyle::Dashed => "dashed",
            BorderLineStyle::Dotted => "dotted",
            BorderLineStyle::Double => "double",
            BorderLineStyle::Hair => "hair",
            BorderLineStyle::MediumDashed => "mediumDashed",
            BorderLineStyle::DashDot => "dashDot",
            BorderLineStyle::MediumDashDot => "mediumDashDot",
            BorderLineStyle::DashDotDot => "dashDotDot",
            BorderLineStyle::MediumDashDotDot => "mediumDashDotDot",
            BorderLineStyle::SlantDashDot => "slantDashDot",
        }
    }
}

/// One edge of a single cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BorderSide {
    Left,
    Right,
    Top,
    Bottom,
}

impl BorderSide {
    pub const ALL: [BorderSide; 4] = [
        BorderSide::Left,
        BorderSide::Right,
        BorderSide::Top,
        BorderSide::Bottom,
    ];

    /// Element name inside `<border>`
    pub fn element_name(&self) -> &'static str {
        match self {
            BorderSide::Left => "left",
            BorderSide::Right => "right",
            BorderSide::Top => "top",
            BorderSide::Bottom => "bottom",
        }
    }
}

/// Where a border request applies within the target range
///
/// The single sides apply to every cell in the range. `Outside` draws only the
/// range perimeter, `Inside` only the grid lines between cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BorderPosition {
    Outside,
    Inside,
    #[serde(alias = "inside_vertical")]
    InsideVertical,
    #[serde(alias = "inside_horizontal")]
    InsideHorizontal,
    Left,
    Right,
    Top,
    Bottom,
}

impl BorderPosition {
    /// Sides of the cell at (`row`, `col`), 0-based within a `rows` x `cols`
    /// range, that this position paints
    pub fn sides_at(&self, row: u32, col: u32, rows: u32, cols: u32) -> Vec<BorderSide> {
        let first_row = row == 0;
        let last_row = row + 1 == rows;
        let first_col = col == 0;
        let last_col = col + 1 == cols;

        let mut sides = Vec::with_capacity(4);
        let vertical_inner = |sides: &mut Vec<BorderSide>| {
            if !first_col {
                sides.push(BorderSide::Left);
            }
            if !last_col {
                sides.push(BorderSide::Right);
            }
        };
        match self {
            BorderPosition::Left => sides.push(BorderSide::Left),
            BorderPosition::Right => sides.push(BorderSide::Right),
            BorderPosition::Top => sides.push(BorderSide::Top),
            BorderPosition::Bottom => sides.push(BorderSide::Bottom),
            BorderPosition::Outside => {
                if first_col {
                    sides.push(BorderSide::Left);
                }
                if last_col {
                    sides.push(BorderSide::Right);
                }
                if first_row {
                    sides.push(BorderSide::Top);
                }
                if last_row {
                    sides.push(BorderSide::Bottom);
                }
            }
            BorderPosition::InsideVertical => vertical_inner(&mut sides),
            BorderPosition::InsideHorizontal => {
                if !first_row {
                    sides.push(BorderSide::Top);
                }
                if !last_row {
                    sides.push(BorderSide::Bottom);
                }
            }
            BorderPosition::Inside => {
                vertical_inner(&mut sides);
                sides.extend(BorderPosition::InsideHorizontal.sides_at(row, col, rows, cols));
            }
        }
        sides
    }
}

/// Requested line for one border position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct BorderSpec {
    #[serde(default)]
    pub style: BorderLineStyle,
    #[serde(default = "default_border_color")]
    pub color: Color,
}

fn default_border_color() -> Color {
    Color::BLACK
}

impl Default for BorderSpec {
    fn default() -> Self {
        Self {
            style: BorderLineStyle::Thin,
            color: Color::BLACK,
        }
    }
}

impl BorderSpec {
    pub fn new(style: BorderLineStyle, color: Color) -> Self {
        Self { style, color }
    }
}
