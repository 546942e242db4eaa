//! Format requests and format read-back records
//!
//! [`FormatSpec`] is the typed form of the JSON object accepted by
//! `apply_format`. Every recognized key is a field; unknown keys are logged and
//! ignored so newer callers keep working against older engines. Values of known
//! keys are checked before any workbook state is touched.

use super::{
    BorderPosition, BorderSide, BorderSpec, Color, HorizontalAlignment, VerticalAlignment,
};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Largest font size a spreadsheet application accepts, in points
pub const MAX_FONT_SIZE: f64 = 409.0;

/// Keys [`FormatSpec`] understands, as spelled in JSON
pub const FORMAT_SPEC_KEYS: &[&str] = &[
    "bold",
    "italic",
    "underline",
    "fontSize",
    "fontName",
    "fontColor",
    "backgroundColor",
    "borders",
    "numberFormat",
    "textAlign",
    "verticalAlign",
    "wrapText",
];

/// Requested cell background
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Background {
    /// Remove any fill
    None,
    /// Solid fill of one colour
    Solid(Color),
}

impl TryFrom<String> for Background {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("none") {
            Ok(Background::None)
        } else {
            Ok(Background::Solid(s.parse()?))
        }
    }
}

/// Formatting to merge onto the existing style of every cell in a range
///
/// Fields left as `None` (or an empty `borders` map) inherit the cell's
/// current setting.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatSpec {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub font_size: Option<f64>,
    pub font_name: Option<String>,
    pub font_color: Option<Color>,
    pub background_color: Option<Background>,
    #[serde(default)]
    pub borders: BTreeMap<BorderPosition, BorderSpec>,
    pub number_format: Option<String>,
    pub text_align: Option<HorizontalAlignment>,
    pub vertical_align: Option<VerticalAlignment>,
    pub wrap_text: Option<bool>,
}

impl FormatSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object, warning about and skipping unknown keys
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::format_spec("format spec must be a JSON object"))?;

        for key in object.keys() {
            if !FORMAT_SPEC_KEYS.contains(&key.as_str()) {
                log::warn!("ignoring unknown format key '{}'", key);
            }
        }

        let spec: FormatSpec = serde_json::from_value(value.clone())
            .map_err(|e| Error::format_spec(e.to_string()))?;
        spec.validate()?;
        Ok(spec)
    }

    /// Parse JSON text; see [`FormatSpec::from_json`]
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: JsonValue =
            serde_json::from_str(text).map_err(|e| Error::format_spec(e.to_string()))?;
        Self::from_json(&value)
    }

    /// Check values serde cannot constrain
    pub fn validate(&self) -> Result<()> {
        if let Some(size) = self.font_size {
            if !size.is_finite() || size <= 0.0 || size > MAX_FONT_SIZE {
                return Err(Error::format_spec(format!(
                    "fontSize must be in (0, {}], got {}",
                    MAX_FONT_SIZE, size
                )));
            }
        }
        if matches!(&self.font_name, Some(name) if name.trim().is_empty()) {
            return Err(Error::format_spec("fontName must not be empty"));
        }
        if matches!(&self.number_format, Some(code) if code.is_empty()) {
            return Err(Error::format_spec("numberFormat must not be empty"));
        }
        Ok(())
    }

    /// True when no option is requested
    pub fn is_empty(&self) -> bool {
        *self == FormatSpec::default()
    }

    /// Whether any font property is requested
    pub fn touches_font(&self) -> bool {
        self.bold.is_some()
            || self.italic.is_some()
            || self.underline.is_some()
            || self.font_size.is_some()
            || self.font_name.is_some()
            || self.font_color.is_some()
    }

    /// Whether any alignment property is requested
    pub fn touches_alignment(&self) -> bool {
        self.text_align.is_some() || self.vertical_align.is_some() || self.wrap_text.is_some()
    }

    /// Border edges for the cell at 0-based (`row`, `col`) of a `rows` x `cols` range
    ///
    /// Grouped positions are applied first, so an explicit side wins over
    /// `outside`/`inside` for the same edge.
    pub fn border_edges_at(
        &self,
        row: u32,
        col: u32,
        rows: u32,
        cols: u32,
    ) -> BTreeMap<BorderSide, BorderSpec> {
        let mut edges = BTreeMap::new();
        for (position, spec) in &self.borders {
            for side in position.sides_at(row, col, rows, cols) {
                edges.insert(side, *spec);
            }
        }
        edges
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = Some(bold);
        self
    }

    pub fn italic(mut self, italic: bool) -> Self {
        self.italic = Some(italic);
        self
    }

    pub fn font_size(mut self, size: f64) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn font_name<S: Into<String>>(mut self, name: S) -> Self {
        self.font_name = Some(name.into());
        self
    }

    pub fn font_color(mut self, color: Color) -> Self {
        self.font_color = Some(color);
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.background_color = Some(Background::Solid(color));
        self
    }

    /// Request that any fill be removed
    pub fn no_background(mut self) -> Self {
        self.background_color = Some(Background::None);
        self
    }

    pub fn border(mut self, position: BorderPosition, spec: BorderSpec) -> Self {
        self.borders.insert(position, spec);
        self
    }

    pub fn number_format<S: Into<String>>(mut self, code: S) -> Self {
        self.number_format = Some(code.into());
        self
    }

    pub fn text_align(mut self, align: HorizontalAlignment) -> Self {
        self.text_align = Some(align);
        self
    }

    pub fn vertical_align(mut self, align: VerticalAlignment) -> Self {
        self.vertical_align = Some(align);
        self
    }

    pub fn wrap_text(mut self, wrap: bool) -> Self {
        self.wrap_text = Some(wrap);
        self
    }
}

/// Formatting of one cell as reported by `read_formats`
///
/// Only non-default properties are present; defaults are omitted from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellFormat {
    pub cell: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub borders: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_align: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrap_text: Option<bool>,
}

impl CellFormat {
    /// True when no property is set (the cell reference does not count)
    pub fn is_empty(&self) -> bool {
        CellFormat {
            cell: String::new(),
            ..self.clone()
        } == CellFormat::default()
    }
}
