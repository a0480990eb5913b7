//! Value-to-SQL-literal formatting
//!
//! Escaping policy, in priority order: expressions verbatim, numbers as
//! canonical decimal text, hex-literal strings as unquoted uppercase hex,
//! the literal word `NULL` unquoted, everything else through the driver's
//! byte-level escape routine wrapped in single quotes.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::driver::Escaper;
use crate::error::BuilderError;
use crate::query::SqlArg;
use crate::value::Value;

/// Strings of this shape parse as integer hex literals on the server and
/// are emitted unquoted. The digit count after the prefix must be even.
static HEX_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^0x[0-9A-Fa-f]+$").expect("hex literal pattern is valid")
});

/// Format one builder input as SQL literal text.
pub fn format_arg(escaper: &dyn Escaper, arg: &SqlArg) -> Result<String, BuilderError> {
    match arg {
        SqlArg::Expr(expr) => Ok(expr.as_str().to_string()),
        SqlArg::Value(value) => format_value(escaper, value),
    }
}

/// Format one scalar as SQL literal text.
pub fn format_value(escaper: &dyn Escaper, value: &Value) -> Result<String, BuilderError> {
    match value {
        Value::Null => Ok("NULL".to_string()),
        Value::Bool(v) => Ok(if *v { "1" } else { "0" }.to_string()),
        Value::I64(v) => Ok(v.to_string()),
        Value::U64(v) => Ok(v.to_string()),
        Value::F32(v) => Ok(v.to_string()),
        Value::F64(v) => Ok(v.to_string()),
        Value::String(s) => format_string(escaper, s),
        Value::Bytes(b) => Ok(hex_literal(b)),
        Value::Date(v) => quote(escaper, &v.format("%Y-%m-%d").to_string()),
        Value::DateTime(v) => quote(escaper, &v.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
        Value::Time(v) => quote(escaper, &v.format("%H:%M:%S%.f").to_string()),
        Value::Decimal(v) => Ok(v.to_string()),
        Value::Json(v) => quote(escaper, &v.to_string()),
    }
}

fn format_string(escaper: &dyn Escaper, s: &str) -> Result<String, BuilderError> {
    // Case-sensitive match on the literal word only.
    if s == "NULL" {
        return Ok("NULL".to_string());
    }
    if is_hex_literal(s) {
        return Ok(format!("0x{}", s[2..].to_ascii_uppercase()));
    }
    quote(escaper, s)
}

fn is_hex_literal(s: &str) -> bool {
    HEX_LITERAL.is_match(s) && (s.len() - 2) % 2 == 0
}

/// Escape through the driver routine and wrap in single quotes.
fn quote(escaper: &dyn Escaper, s: &str) -> Result<String, BuilderError> {
    let escaped = escaper.escape_bytes(s.as_bytes());
    let escaped = String::from_utf8(escaped)
        .map_err(|e| BuilderError::EscapeFailure(e.to_string()))?;
    Ok(format!("'{escaped}'"))
}

/// Binary data is emitted as a hex literal so the statement text stays
/// valid UTF-8 regardless of content.
fn hex_literal(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return "''".to_string();
    }
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    for byte in bytes {
        out.push_str(&format!("{byte:02X}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DefaultEscaper;
    use crate::query::Expression;

    fn fmt(value: impl Into<Value>) -> String {
        format_value(&DefaultEscaper, &value.into()).unwrap()
    }

    /// Inverse of the quoting path, used to check literal round-trips.
    fn unquote(literal: &str) -> String {
        let inner = literal.strip_prefix('\'').unwrap().strip_suffix('\'').unwrap();
        let mut out = String::new();
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                match chars.next().unwrap() {
                    '0' => out.push('\0'),
                    'n' => out.push('\n'),
                    'r' => out.push('\r'),
                    'Z' => out.push('\x1a'),
                    other => out.push(other),
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn test_expression_emitted_verbatim() {
        let arg = SqlArg::from(Expression::new("NOW()"));
        assert_eq!(format_arg(&DefaultEscaper, &arg).unwrap(), "NOW()");
    }

    #[test]
    fn test_numbers_unquoted() {
        assert_eq!(fmt(42i64), "42");
        assert_eq!(fmt(-7i64), "-7");
        assert_eq!(fmt(3.5f64), "3.5");
        assert_eq!(fmt(u64::MAX), "18446744073709551615");
    }

    #[test]
    fn test_number_round_trip() {
        assert_eq!(fmt(i64::MIN).parse::<i64>().unwrap(), i64::MIN);
        let f = 0.1f64 + 0.2f64;
        assert_eq!(fmt(f).parse::<f64>().unwrap(), f);
    }

    #[test]
    fn test_hex_literal_uppercased_unquoted() {
        assert_eq!(fmt("0xaabbcc"), "0xAABBCC");
        assert_eq!(fmt("0xDEADBEEF"), "0xDEADBEEF");
    }

    #[test]
    fn test_odd_digit_hex_is_quoted() {
        assert_eq!(fmt("0xabc"), "'0xabc'");
        assert_eq!(fmt("0x"), "'0x'");
        assert_eq!(fmt("0xzz"), "'0xzz'");
    }

    #[test]
    fn test_null_word_case_sensitive() {
        assert_eq!(fmt("NULL"), "NULL");
        assert_eq!(fmt("null"), "'null'");
        assert_eq!(fmt(Value::Null), "NULL");
    }

    #[test]
    fn test_string_escaped_and_quoted() {
        assert_eq!(fmt("a'b"), "'a\\'b'");
        assert_eq!(fmt("a\\b"), "'a\\\\b'");
    }

    #[test]
    fn test_string_round_trip() {
        for original in ["plain", "a'b", "back\\slash", "line\nbreak\r", "ctrl\x1a\0end"] {
            let literal = fmt(original);
            assert_eq!(unquote(&literal), original, "literal was {literal}");
        }
    }

    #[test]
    fn test_bytes_as_hex() {
        assert_eq!(fmt(vec![0xAAu8, 0xBB, 0xCC]), "0xAABBCC");
        assert_eq!(fmt(Vec::<u8>::new()), "''");
    }

    #[test]
    fn test_bool_as_numeric() {
        assert_eq!(fmt(true), "1");
        assert_eq!(fmt(false), "0");
    }
}
