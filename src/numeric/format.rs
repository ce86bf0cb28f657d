//! printf-style number formatting.
//!
//! Values written into documents follow a caller-supplied C format such as
//! `%g`, `%.3f` or `x=%+08.2e mm`: literal text around exactly one
//! conversion `%[flags][width][.precision](d|i|f|F|e|E|g|G)`. Length
//! modifiers (`l`, `ll`, `h`) are accepted and ignored, `%%` is a literal
//! percent sign.

use crate::error::{Result, TixiError};

/// Default format for floating point values.
pub const DEFAULT_DOUBLE_FORMAT: &str = "%g";
/// Default format for integers.
pub const DEFAULT_INTEGER_FORMAT: &str = "%d";

/// Largest accepted width or precision.
const MAX_FIELD: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Value {
    Int(i64),
    Float(f64),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Flags {
    left: bool,
    plus: bool,
    space: bool,
    zero: bool,
    alternate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Directive {
    flags: Flags,
    width: usize,
    precision: Option<usize>,
    conversion: char,
}

/// Formats a floating point value. `None` uses `%g`.
///
/// ```
/// use tixi::numeric::format::format_double;
///
/// assert_eq!(format_double(None, 0.1).unwrap(), "0.1");
/// assert_eq!(format_double(Some("%.3f"), 2.0).unwrap(), "2.000");
/// assert_eq!(format_double(Some("%e"), 1500.0).unwrap(), "1.500000e+03");
/// ```
///
/// # Errors
///
/// Returns `FAILED` for a format without exactly one valid conversion.
pub fn format_double(format: Option<&str>, value: f64) -> Result<String> {
    render(format.unwrap_or(DEFAULT_DOUBLE_FORMAT), Value::Float(value))
}

/// Formats an integer. `None` uses `%d`.
///
/// # Errors
///
/// Returns `FAILED` for a format without exactly one valid conversion.
pub fn format_integer(format: Option<&str>, value: i64) -> Result<String> {
    render(format.unwrap_or(DEFAULT_INTEGER_FORMAT), Value::Int(value))
}

fn invalid(format: &str, reason: &str) -> TixiError {
    TixiError::Failed(format!("invalid number format '{format}': {reason}"))
}

fn render(format: &str, value: Value) -> Result<String> {
    let mut out = String::new();
    let mut chars = format.chars().peekable();
    let mut converted = false;
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            out.push('%');
            continue;
        }
        if converted {
            return Err(invalid(format, "more than one conversion"));
        }
        let directive =
            parse_directive(&mut chars).ok_or_else(|| invalid(format, "bad conversion"))?;
        out.push_str(&convert(&directive, value));
        converted = true;
    }
    if !converted {
        return Err(invalid(format, "no conversion"));
    }
    Ok(out)
}

fn parse_directive(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<Directive> {
    let mut flags = Flags::default();
    while let Some(&c) = chars.peek() {
        match c {
            '-' => flags.left = true,
            '+' => flags.plus = true,
            ' ' => flags.space = true,
            '0' => flags.zero = true,
            '#' => flags.alternate = true,
            _ => break,
        }
        chars.next();
    }
    let width = digits(chars).unwrap_or(0);
    let precision = if chars.peek() == Some(&'.') {
        chars.next();
        Some(digits(chars).unwrap_or(0))
    } else {
        None
    };
    if width > MAX_FIELD || precision.is_some_and(|p| p > MAX_FIELD) {
        return None;
    }
    while matches!(chars.peek(), Some('l' | 'h' | 'L')) {
        chars.next();
    }
    let conversion = chars.next()?;
    if !matches!(conversion, 'd' | 'i' | 'f' | 'F' | 'e' | 'E' | 'g' | 'G') {
        return None;
    }
    Some(Directive {
        flags,
        width,
        precision,
        conversion,
    })
}

fn digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<usize> {
    let mut n: Option<usize> = None;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        chars.next();
        n = Some(n.unwrap_or(0).saturating_mul(10).saturating_add(d as usize));
    }
    n
}

fn convert(directive: &Directive, value: Value) -> String {
    let (negative, body, numeric) = match directive.conversion {
        'd' | 'i' => {
            #[allow(clippy::cast_possible_truncation)]
            let n = match value {
                Value::Int(n) => n,
                Value::Float(f) => f.trunc() as i64,
            };
            let mut digits = n.unsigned_abs().to_string();
            if let Some(p) = directive.precision {
                if p == 0 && n == 0 {
                    digits.clear();
                }
                while digits.len() < p {
                    digits.insert(0, '0');
                }
            }
            (n < 0, digits, directive.precision.is_none())
        }
        conversion => {
            #[allow(clippy::cast_precision_loss)]
            let f = match value {
                Value::Int(n) => n as f64,
                Value::Float(f) => f,
            };
            let upper = conversion.is_ascii_uppercase();
            let body = if f.is_nan() {
                "nan".to_string()
            } else if f.is_infinite() {
                "inf".to_string()
            } else {
                let precision = directive.precision.unwrap_or(6);
                match conversion.to_ascii_lowercase() {
                    'f' => fixed(f.abs(), precision, directive.flags.alternate),
                    'e' => exponential(f.abs(), precision, directive.flags.alternate),
                    _ => general(f.abs(), precision, directive.flags.alternate),
                }
            };
            let body = if upper { body.to_ascii_uppercase() } else { body };
            (f.is_sign_negative() && !f.is_nan(), body, f.is_finite())
        }
    };

    let sign = if negative {
        "-"
    } else if directive.flags.plus {
        "+"
    } else if directive.flags.space {
        " "
    } else {
        ""
    };
    pad(directive, sign, &body, numeric)
}

fn pad(directive: &Directive, sign: &str, body: &str, zero_ok: bool) -> String {
    let len = sign.len() + body.len();
    if len >= directive.width {
        return format!("{sign}{body}");
    }
    let fill = directive.width - len;
    if directive.flags.left {
        format!("{sign}{body}{}", " ".repeat(fill))
    } else if directive.flags.zero && zero_ok {
        format!("{sign}{}{body}", "0".repeat(fill))
    } else {
        format!("{}{sign}{body}", " ".repeat(fill))
    }
}

fn fixed(f: f64, precision: usize, alternate: bool) -> String {
    let mut s = format!("{f:.precision$}");
    if alternate && precision == 0 {
        s.push('.');
    }
    s
}

/// `d.ddde±XX` with at least two exponent digits.
fn exponential(f: f64, precision: usize, alternate: bool) -> String {
    let (mantissa, exponent) = split_exponential(f, precision);
    let mut mantissa = mantissa;
    if alternate && precision == 0 {
        mantissa.push('.');
    }
    join_exponent(&mantissa, exponent)
}

fn split_exponential(f: f64, precision: usize) -> (String, i32) {
    let s = format!("{f:.precision$e}");
    match s.split_once('e') {
        Some((mantissa, exponent)) => (mantissa.to_string(), exponent.parse().unwrap_or(0)),
        None => (s, 0),
    }
}

fn join_exponent(mantissa: &str, exponent: i32) -> String {
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
}

/// `%g`: the shorter of fixed and exponential notation for `precision`
/// significant digits, without trailing zeros unless `alternate`.
fn general(f: f64, precision: usize, alternate: bool) -> String {
    let p = precision.max(1);
    let (mantissa, exponent) = split_exponential(f, p - 1);
    let p_signed = i32::try_from(p).unwrap_or(i32::MAX);
    if exponent >= -4 && exponent < p_signed {
        let decimals = usize::try_from(p_signed - 1 - exponent).unwrap_or(0);
        let s = format!("{f:.decimals$}");
        if alternate {
            s
        } else {
            strip_zeros(&s)
        }
    } else {
        let mantissa = if alternate {
            mantissa
        } else {
            strip_zeros(&mantissa)
        };
        join_exponent(&mantissa, exponent)
    }
}

fn strip_zeros(s: &str) -> String {
    if !s.contains('.') {
        return s.to_string();
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ReturnCode;
    use pretty_assertions::assert_eq;

    fn g(value: f64) -> String {
        format_double(None, value).unwrap()
    }

    #[test]
    fn test_general_format() {
        assert_eq!(g(0.0), "0");
        assert_eq!(g(1.0), "1");
        assert_eq!(g(-2.5), "-2.5");
        assert_eq!(g(123_456.0), "123456");
        assert_eq!(g(1_234_567.0), "1.23457e+06");
        assert_eq!(g(0.0001), "0.0001");
        assert_eq!(g(0.000_012_3), "1.23e-05");
        assert_eq!(g(3.141_592_653_5), "3.14159");
        assert_eq!(format_double(Some("%.10g"), 1.0 / 3.0).unwrap(), "0.3333333333");
        assert_eq!(format_double(Some("%G"), 1e-10).unwrap(), "1E-10");
    }

    #[test]
    fn test_fixed_and_exponential() {
        assert_eq!(format_double(Some("%f"), 1.5).unwrap(), "1.500000");
        assert_eq!(format_double(Some("%.2f"), -0.126).unwrap(), "-0.13");
        assert_eq!(format_double(Some("%8.3f"), 3.0).unwrap(), "   3.000");
        assert_eq!(format_double(Some("%-8.1f|"), 3.0).unwrap(), "3.0     |");
        assert_eq!(format_double(Some("%+09.2f"), 3.0).unwrap(), "+00003.00");
        assert_eq!(format_double(Some("%.2e"), 0.000_123).unwrap(), "1.23e-04");
        assert_eq!(format_double(Some("%E"), 1e100).unwrap(), "1.000000E+100");
        assert_eq!(format_double(Some("%lf"), 2.0).unwrap(), "2.000000");
    }

    #[test]
    fn test_integer_format() {
        assert_eq!(format_integer(None, -42).unwrap(), "-42");
        assert_eq!(format_integer(Some("%05d"), 42).unwrap(), "00042");
        assert_eq!(format_integer(Some("%.3i"), 7).unwrap(), "007");
        assert_eq!(format_integer(Some("% d"), 7).unwrap(), " 7");
        assert_eq!(format_integer(Some("%f"), 2).unwrap(), "2.000000");
        assert_eq!(format_double(Some("%d"), 2.9).unwrap(), "2");
    }

    #[test]
    fn test_literal_text_and_percent() {
        assert_eq!(format_double(Some("x=%.1f mm"), 2.0).unwrap(), "x=2.0 mm");
        assert_eq!(format_integer(Some("%d%%"), 50).unwrap(), "50%");
    }

    #[test]
    fn test_special_values() {
        assert_eq!(g(f64::INFINITY), "inf");
        assert_eq!(g(f64::NEG_INFINITY), "-inf");
        assert_eq!(format_double(Some("%F"), f64::NAN).unwrap(), "NAN");
        assert_eq!(format_double(Some("%05g"), f64::INFINITY).unwrap(), "  inf");
    }

    #[test]
    fn test_invalid_formats() {
        for format in ["", "plain", "%s", "%d %d", "%"] {
            let err = format_double(Some(format), 1.0).unwrap_err();
            assert_eq!(err.code(), ReturnCode::Failed, "{format}");
        }
    }

    #[test]
    fn test_oversized_fields_are_rejected() {
        for format in ["%.70000f", "%70000g", "%99999999999999999999999d", "%.513e"] {
            let err = format_double(Some(format), 1.0).unwrap_err();
            assert_eq!(err.code(), ReturnCode::Failed, "{format}");
        }
        assert_eq!(format_double(Some("%.512f"), 0.5).unwrap().len(), 514);
        assert_eq!(format_integer(Some("%512d"), 7).unwrap().len(), 512);
    }
}
