//! Numbers are stored as the shortest of their textual forms.
//!
//! Both forms are built from the shortest digit string that reads back as
//! the same `f64`, as ECMAScript's `Number::toString` does.

use crate::SchemaError;

/// The shortest round-trip digits of a positive finite number, and its
/// decimal exponent `n` such that the value is `0.digits * 10^n`.
fn digits_and_exponent(value: f64) -> (String, i32) {
    let formatted = format!("{:e}", value);
    let (mantissa, exponent) = match formatted.find('e') {
        Some(pos) => (&formatted[..pos], &formatted[pos + 1..]),
        None => (&formatted[..], "0"),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);
    (digits, exponent + 1)
}

/// The text of a finite number, as ECMAScript's `String(value)`.
///
/// ```
/// use bean_io::number::to_js_string;
///
/// assert_eq!(to_js_string(100.), "100");
/// assert_eq!(to_js_string(1e21), "1e+21");
/// assert_eq!(to_js_string(0.000001), "0.000001");
/// assert_eq!(to_js_string(1e-7), "1e-7");
/// assert_eq!(to_js_string(-1.5), "-1.5");
/// ```
pub fn to_js_string(value: f64) -> String {
    if value == 0. {
        return "0".to_string();
    }
    if value < 0. {
        return format!("-{}", to_js_string(-value));
    }
    let (digits, n) = digits_and_exponent(value);
    let k = digits.len() as i32;
    if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        format!("{}.{}", &digits[..n as usize], &digits[n as usize..])
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let exponent = n - 1;
        let sign = if exponent < 0 { '-' } else { '+' };
        if k == 1 {
            format!("{}e{}{}", digits, sign, exponent.abs())
        } else {
            format!("{}.{}e{}{}", &digits[..1], &digits[1..], sign, exponent.abs())
        }
    }
}

/// The exponential form of a finite number, as ECMAScript's
/// `toExponential()` with `e+` shortened to `e`.
pub fn to_exponential(value: f64) -> String {
    if value == 0. {
        return "0e0".to_string();
    }
    format!("{:e}", value)
}

/// The shortest form of a number, preferring the fixed form on ties.
pub fn minimal(value: f64) -> Result<String, SchemaError> {
    if !value.is_finite() {
        return Err(SchemaError::NonFiniteNumber(value));
    }
    let mut fixed = to_js_string(value);
    if fixed.starts_with("0.") {
        fixed.remove(0);
    }
    let exponential = to_exponential(value);
    if exponential.len() < fixed.len() {
        Ok(exponential)
    } else {
        Ok(fixed)
    }
}

/// The literal stored for a numeric literal.
///
/// A source spelling ending with `.` (e.g. `1.`) is kept as is, so that
/// `1..toString()` still reads back.
pub fn literal(value: f64, raw: Option<&str>) -> Result<String, SchemaError> {
    match raw {
        Some(raw) if raw.ends_with('.') => Ok(raw.to_string()),
        _ => minimal(value),
    }
}
