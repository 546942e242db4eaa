//! Text escaping for XML output and for Excel's `_xHHHH_` convention

/// Escape character data
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            // a literal CR would be normalized away by the next parser
            '\r' => out.push_str("&#13;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape an attribute value (always written inside double quotes)
pub fn escape_xml_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(c),
        }
    }
    out
}

/// Length of an `_xHHHH_` sequence at the start of `bytes`, if there is one
fn escape_at(bytes: &[u8]) -> Option<u32> {
    if bytes.len() < 7 || bytes[0] != b'_' || bytes[1] != b'x' || bytes[6] != b'_' {
        return None;
    }
    let hex = std::str::from_utf8(&bytes[2..6]).ok()?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// Excel uses this format for characters XML cannot carry:
/// - `_x000d_` = CR (carriage return)
/// - `_x0009_` = Tab
/// - `_x005f_` = Underscore (escaped underscore)
pub fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }

    let bytes = s.as_bytes();
    let mut result = String::with_capacity(s.len());
    let mut pos = 0;
    let mut literal_start = 0;

    while pos < bytes.len() {
        if let Some(decoded) = escape_at(&bytes[pos..]).and_then(char::from_u32) {
            result.push_str(&s[literal_start..pos]);
            result.push(decoded);
            pos += 7;
            literal_start = pos;
        } else {
            pos += 1;
        }
    }
    result.push_str(&s[literal_start..]);
    result
}

/// Inverse of [`decode_excel_escapes`]
///
/// Control characters XML 1.0 cannot represent become `_xHHHH_`, and an
/// underscore that would otherwise start a valid escape becomes `_x005F_`.
pub fn encode_excel_escapes(s: &str) -> String {
    let needs_work = s.chars().any(|c| is_xml_forbidden(c)) || s.contains("_x");
    if !needs_work {
        return s.to_string();
    }

    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len() + 8);
    for (i, c) in s.char_indices() {
        if is_xml_forbidden(c) {
            out.push_str(&format!("_x{:04X}_", c as u32));
        } else if c == '_' && escape_at(&bytes[i..]).is_some() {
            out.push_str("_x005F_");
        } else {
            out.push(c);
        }
    }
    out
}

fn is_xml_forbidden(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}')
}
