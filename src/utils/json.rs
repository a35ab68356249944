//! JSON output matching Python's `json.dumps` defaults.
//!
//! Raw objects in the bucket all share this layout: `", "` between items,
//! `": "` after keys, every non-ASCII character escaped as `\uXXXX`, integers
//! with all their digits and floats in `repr` form (`1e-05`, `1e+20`, `3.0`).

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use std::borrow::Cow;
use std::io::{self, Write};

#[derive(Debug, Default, Clone, Copy)]
pub struct PythonFormatter;

impl Formatter for PythonFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(b": ")
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(float_repr(value).as_bytes())
    }

    // arbitrary_precision: every parsed number comes through here with its source text
    fn write_number_str<W>(&mut self, writer: &mut W, value: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(number_repr(value).as_bytes())
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if fragment.is_ascii() {
            return writer.write_all(fragment.as_bytes());
        }

        let mut units = [0u16; 2];
        for c in fragment.chars() {
            if c.is_ascii() {
                writer.write_all(&[c as u8])?;
            } else {
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

fn number_repr(raw: &str) -> Cow<'_, str> {
    if raw.contains(|c| matches!(c, '.' | 'e' | 'E')) {
        return match raw.parse::<f64>() {
            Ok(value) => Cow::Owned(float_repr(value)),
            Err(_) => Cow::Borrowed(raw),
        };
    }
    if raw == "-0" {
        Cow::Borrowed("0")
    } else {
        Cow::Borrowed(raw)
    }
}

/// Shortest round-trip digits; exponent form when the decimal exponent is
/// below -4 or at least 16.
fn float_repr(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let scientific = format!("{:e}", value);
    let (mantissa, exp) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(m) => ("-", m),
        None => ("", mantissa),
    };

    if !(-4..16).contains(&exp) {
        let exp_sign = if exp < 0 { '-' } else { '+' };
        return format!("{sign}{mantissa}e{exp_sign}{:02}", exp.abs());
    }

    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    if exp < 0 {
        return format!("{sign}0.{}{digits}", "0".repeat((-exp - 1) as usize));
    }

    let int_len = exp as usize + 1;
    if digits.len() > int_len {
        format!("{sign}{}.{}", &digits[..int_len], &digits[int_len..])
    } else {
        format!("{sign}{digits}{}.0", "0".repeat(int_len - digits.len()))
    }
}

pub fn to_python_json_vec<T: ?Sized + Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(256);
    let mut ser = Serializer::with_formatter(&mut buf, PythonFormatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dumps(value: &serde_json::Value) -> String {
        String::from_utf8(to_python_json_vec(value).unwrap()).unwrap()
    }

    #[test]
    fn test_separators_match_json_dumps() {
        let value = json!({"articles": [{"title": "A"}, {"title": "B"}]});
        assert_eq!(
            dumps(&value),
            r#"{"articles": [{"title": "A"}, {"title": "B"}]}"#
        );
    }

    #[test]
    fn test_key_order_is_preserved() {
        let value: serde_json::Value =
            serde_json::from_str(r#"{"status":"ok","totalResults":2,"articles":[]}"#).unwrap();
        assert_eq!(
            dumps(&value),
            r#"{"status": "ok", "totalResults": 2, "articles": []}"#
        );
    }

    #[test]
    fn test_non_ascii_is_escaped() {
        let value = json!({"title": "Café 😀"});
        assert_eq!(dumps(&value), r#"{"title": "Caf\u00e9 \ud83d\ude00"}"#);
    }

    #[test]
    fn test_control_characters_and_quotes() {
        let value = json!(["line\nbreak", "say \"hi\"", null, true, 1.5]);
        assert_eq!(
            dumps(&value),
            r#"["line\nbreak", "say \"hi\"", null, true, 1.5]"#
        );
    }

    #[test]
    fn test_numbers_match_python_repr() {
        let value: serde_json::Value = serde_json::from_str(
            r#"{"a": 1e20, "b": 0.00001, "c": 12345678901234567890123, "d": 1.0, "e": 100000.0, "f": 1E5, "g": -0.0, "h": 0.0001, "i": 1e16, "j": 1.5e300, "k": 3.14, "l": -7, "n": 123456789012345.6, "o": 0.1e-3, "p": -0}"#,
        )
        .unwrap();
        assert_eq!(
            dumps(&value),
            r#"{"a": 1e+20, "b": 1e-05, "c": 12345678901234567890123, "d": 1.0, "e": 100000.0, "f": 100000.0, "g": -0.0, "h": 0.0001, "i": 1e+16, "j": 1.5e+300, "k": 3.14, "l": -7, "n": 123456789012345.6, "o": 0.0001, "p": 0}"#
        );
    }

    #[test]
    fn test_plain_f64_uses_repr() {
        let out = to_python_json_vec(&[2.0f64, 1e-7, 0.5]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[2.0, 1e-07, 0.5]");
    }

    #[test]
    fn test_empty_containers() {
        assert_eq!(dumps(&json!({})), "{}");
        assert_eq!(dumps(&json!({"a": [], "b": {}})), r#"{"a": [], "b": {}}"#);
    }
}
