//! Numeric text handling with JavaScript semantics.
//!
//! `float`/`integer` coercion treats a value as numeric when `Number(value)`
//! is not NaN; the stored value comes from the lenient `parseFloat`/`parseInt`
//! prefix parsers.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static DECIMAL_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)$").unwrap()
});

static DECIMAL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)").unwrap()
});

static INTEGER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-]?)(?:0[xX]([0-9a-fA-F]+)|(\d+))").unwrap());

// Largest integer an f64 holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

fn parse_decimal(literal: &str) -> f64 {
    let (sign, body) = match literal.as_bytes().first() {
        Some(b'-') => (-1.0, &literal[1..]),
        Some(b'+') => (1.0, &literal[1..]),
        _ => (1.0, literal),
    };
    if body == "Infinity" {
        return sign * f64::INFINITY;
    }
    sign * body.parse::<f64>().unwrap_or(f64::NAN)
}

/// `Number(text)`: the whole trimmed text must be a numeric literal.
pub fn number_from_text(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
                return f64::NAN;
            }
            return u64::from_str_radix(digits, radix)
                .map(|n| n as f64)
                .unwrap_or(f64::NAN);
        }
    }
    if DECIMAL_LITERAL.is_match(trimmed) {
        parse_decimal(trimmed)
    } else {
        f64::NAN
    }
}

/// `parseFloat(text)`: longest numeric prefix after leading whitespace.
pub fn parse_float_prefix(text: &str) -> f64 {
    match DECIMAL_PREFIX.find(text.trim_start()) {
        Some(m) => parse_decimal(m.as_str()),
        None => f64::NAN,
    }
}

/// `parseInt(text)`: leading decimal or `0x` hexadecimal digits.
pub fn parse_int_prefix(text: &str) -> f64 {
    let Some(caps) = INTEGER_PREFIX.captures(text.trim_start()) else {
        return f64::NAN;
    };
    let sign = if &caps[1] == "-" { -1.0 } else { 1.0 };
    let magnitude = match (caps.get(2), caps.get(3)) {
        (Some(hex), _) => hex
            .as_str()
            .chars()
            .fold(0.0, |acc, c| acc * 16.0 + c.to_digit(16).unwrap_or(0) as f64),
        (None, Some(dec)) => dec.as_str().parse::<f64>().unwrap_or(f64::NAN),
        (None, None) => f64::NAN,
    };
    sign * magnitude
}

/// Store a number the way a JSON document would: integral values as
/// integers, NaN as `null`. JSON has no infinities, so those are kept as the
/// text `"Infinity"` / `"-Infinity"`, which still reads back as a number.
pub fn number_value(n: f64) -> Value {
    if n.is_infinite() {
        Value::String(format_number(n))
    } else if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        Value::from(n as i64)
    } else {
        // serde_json maps NaN to null
        Value::from(n)
    }
}

/// Numeric reading of a stored value: JSON numbers plus the infinity text
/// written by [`number_value`].
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => match s.as_str() {
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            _ => None,
        },
        _ => None,
    }
}

/// `String(n)`: plain decimal in `[1e-6, 1e21)`, exponent form outside it.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        return text.to_string();
    }
    let magnitude = n.abs();
    if magnitude != 0.0 && !(1e-6..1e21).contains(&magnitude) {
        // `{:e}` gives the shortest digits; JavaScript signs positive exponents
        let text = format!("{:e}", n);
        return match text.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => text,
        };
    }
    if n.fract() == 0.0 && magnitude <= MAX_SAFE_INTEGER {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Text form of a value as substituted into format strings: strings verbatim,
/// everything else JSON-serialized (which matches `String()` for scalars).
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (None, Some(u), _) => u.to_string(),
            (None, None, Some(f)) => format_number(f),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}
