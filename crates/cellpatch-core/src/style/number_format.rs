//! Number format codes and the built-in ID table

/// First ID available for workbook-defined format codes
pub const FIRST_CUSTOM_NUM_FMT_ID: u32 = 164;

/// Built-in formats every consumer knows by ID
const BUILTIN_FORMATS: &[(u32, &str)] = &[
    (0, "General"),
    (1, "0"),
    (2, "0.00"),
    (3, "#,##0"),
    (4, "#,##0.00"),
    (9, "0%"),
    (10, "0.00%"),
    (11, "0.00E+00"),
    (12, "# ?/?"),
    (13, "# ??/??"),
    (14, "mm-dd-yy"),
    (15, "d-mmm-yy"),
    (16, "d-mmm"),
    (17, "mmm-yy"),
    (18, "h:mm AM/PM"),
    (19, "h:mm:ss AM/PM"),
    (20, "h:mm"),
    (21, "h:mm:ss"),
    (22, "m/d/yy h:mm"),
    (37, "#,##0 ;(#,##0)"),
    (38, "#,##0 ;[Red](#,##0)"),
    (39, "#,##0.00;(#,##0.00)"),
    (40, "#,##0.00;[Red](#,##0.00)"),
    (45, "mm:ss"),
    (46, "[h]:mm:ss"),
    (47, "mmss.0"),
    (48, "##0.0E+0"),
    (49, "@"),
];

/// Number format for cell display
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NumberFormat {
    /// General format (default)
    #[default]
    General,

    /// Built-in format by ID
    BuiltIn(u32),

    /// Custom format string
    Custom(String),
}

impl NumberFormat {
    /// 0 - General
    pub const ID_GENERAL: u32 = 0;

    /// Classify a format code, resolving built-in codes to their fixed IDs
    pub fn from_code(code: &str) -> Self {
        match Self::builtin_id(code) {
            Some(Self::ID_GENERAL) => NumberFormat::General,
            Some(id) => NumberFormat::BuiltIn(id),
            None => NumberFormat::Custom(code.to_string()),
        }
    }

    /// Fixed ID of a built-in code
    pub fn builtin_id(code: &str) -> Option<u32> {
        if code.eq_ignore_ascii_case("General") {
            return Some(Self::ID_GENERAL);
        }
        BUILTIN_FORMATS
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(id, _)| *id)
    }

    /// Code of a built-in ID, if it is one
    pub fn builtin_code(id: u32) -> Option<&'static str> {
        BUILTIN_FORMATS
            .iter()
            .find(|(i, _)| *i == id)
            .map(|(_, c)| *c)
    }

    /// The format code string
    pub fn format_string(&self) -> &str {
        match self {
            NumberFormat::General => "General",
            NumberFormat::BuiltIn(id) => Self::builtin_code(*id).unwrap_or("General"),
            NumberFormat::Custom(s) => s,
        }
    }

    pub fn is_general(&self) -> bool {
        matches!(self, NumberFormat::General)
    }
}
