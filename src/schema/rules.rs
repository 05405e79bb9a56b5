//! Scalar value checks
//!
//! One function per family of CQL scalar kinds. Each takes the raw value
//! and returns either the accepted (possibly converted) value or the
//! failure details. No check here panics or allocates a regex twice.

use std::net::IpAddr;
use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use serde_json::{Number, Value};

use super::errors::ValidationDetails;
use super::types::CqlType;

/// Largest integer a JSON number carries without loss: 2^53 - 1
pub const MAX_SAFE_INTEGER: i128 = 9_007_199_254_740_991;

static INT_STRING: OnceLock<Regex> = OnceLock::new();
static BIGINT_STRING: OnceLock<Regex> = OnceLock::new();
static DECIMAL_STRING: OnceLock<Regex> = OnceLock::new();
static HEX_STRING: OnceLock<Regex> = OnceLock::new();
static UUID_STRING: OnceLock<Regex> = OnceLock::new();
static TIMESTAMP_STRING: OnceLock<Regex> = OnceLock::new();
static MAP_KEY: OnceLock<Regex> = OnceLock::new();
static INDEX_KEY: OnceLock<Regex> = OnceLock::new();

fn int_string() -> &'static Regex {
    INT_STRING.get_or_init(|| Regex::new(r"^-?\d+$").expect("valid integer regex"))
}

fn bigint_string() -> &'static Regex {
    BIGINT_STRING.get_or_init(|| Regex::new(r"^-?\d{1,19}$").expect("valid bigint regex"))
}

fn decimal_string() -> &'static Regex {
    DECIMAL_STRING.get_or_init(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("valid decimal regex"))
}

fn hex_string() -> &'static Regex {
    HEX_STRING.get_or_init(|| Regex::new(r"^(0x)?([0-9a-fA-F]{2})*$").expect("valid hex regex"))
}

fn uuid_string() -> &'static Regex {
    UUID_STRING.get_or_init(|| {
        Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
            .expect("valid uuid regex")
    })
}

fn timestamp_string() -> &'static Regex {
    TIMESTAMP_STRING.get_or_init(|| {
        Regex::new(concat!(
            r"^(\d{4})-(\d{2})-(\d{2})",
            r"(?:[T ](\d{2}):(\d{2})(?::(\d{2})(?:\.\d+)?)?",
            r"(?:Z|[+-]\d{2}(?::?\d{2})?)?)?$",
        ))
        .expect("valid timestamp regex")
    })
}

/// Map field names: word and dash characters
pub fn map_key() -> &'static Regex {
    MAP_KEY.get_or_init(|| Regex::new(r"^[\w-]+$").expect("valid map key regex"))
}

/// List index keys in an update descriptor
pub fn index_key() -> &'static Regex {
    INDEX_KEY.get_or_init(|| Regex::new(r"^\d+$").expect("valid index key regex"))
}

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "integer"
            } else {
                "number"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Integral reading of a JSON number
enum Integral {
    Exact(i128),
    /// Integral but beyond what i128 holds (only reachable through f64)
    Huge,
    Fraction,
}

fn integral(n: &Number) -> Integral {
    if let Some(i) = n.as_i64() {
        return Integral::Exact(i128::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Integral::Exact(i128::from(u));
    }
    match n.as_f64() {
        Some(f) if f.fract() != 0.0 || !f.is_finite() => Integral::Fraction,
        Some(f) if f.abs() < 1e38 => Integral::Exact(f as i128),
        Some(_) => Integral::Huge,
        None => Integral::Fraction,
    }
}

/// Checks `value` against a scalar kind.
///
/// `strict` turns off string-to-number conversion for `int`.
pub fn check_scalar(
    kind: CqlType,
    value: &Value,
    path: &str,
    strict: bool,
) -> Result<Value, ValidationDetails> {
    let mismatch =
        || ValidationDetails::type_mismatch(path, kind.type_name(), json_type_name(value));

    match kind {
        CqlType::Ascii | CqlType::Text | CqlType::Varchar => match value {
            Value::String(_) => Ok(value.clone()),
            _ => Err(mismatch()),
        },
        CqlType::Int => check_int(value, path, strict).unwrap_or_else(|| Err(mismatch())),
        CqlType::Bigint | CqlType::Counter => {
            check_bigint(kind, value, path).unwrap_or_else(|| Err(mismatch()))
        }
        CqlType::Decimal | CqlType::Double | CqlType::Float => match value {
            Value::Number(_) => Ok(value.clone()),
            Value::String(s) if decimal_string().is_match(s) => Ok(value.clone()),
            Value::String(s) => Err(ValidationDetails::pattern_mismatch(
                path,
                "numeral string",
                s.as_str(),
            )),
            _ => Err(mismatch()),
        },
        CqlType::Varint => match value {
            Value::Number(n) => match integral(n) {
                Integral::Exact(_) | Integral::Huge => Ok(value.clone()),
                Integral::Fraction => Err(mismatch()),
            },
            Value::String(s) if int_string().is_match(s) => Ok(value.clone()),
            Value::String(s) => Err(ValidationDetails::pattern_mismatch(
                path,
                "integer string",
                s.as_str(),
            )),
            _ => Err(mismatch()),
        },
        CqlType::Blob => match value {
            Value::String(s) if hex_string().is_match(s) => Ok(value.clone()),
            Value::String(s) => {
                Err(ValidationDetails::pattern_mismatch(path, "hex string", s.as_str()))
            }
            Value::Array(bytes) if bytes.iter().all(is_byte) => Ok(value.clone()),
            _ => Err(ValidationDetails::type_mismatch(path, "bytes", json_type_name(value))),
        },
        CqlType::Boolean => match value {
            Value::Bool(_) => Ok(value.clone()),
            _ => Err(mismatch()),
        },
        CqlType::Inet => match value {
            Value::String(s) if is_inet(s) => Ok(value.clone()),
            Value::String(s) => {
                Err(ValidationDetails::pattern_mismatch(path, "IP address", s.as_str()))
            }
            _ => Err(mismatch()),
        },
        CqlType::Timestamp => match value {
            Value::Number(n) => match integral(n) {
                Integral::Exact(ms) if ms.abs() <= MAX_SAFE_INTEGER => Ok(value.clone()),
                Integral::Exact(_) | Integral::Huge => Err(ValidationDetails::out_of_range(
                    path,
                    "epoch milliseconds",
                    n.to_string(),
                )),
                Integral::Fraction => Err(mismatch()),
            },
            Value::String(s) if is_timestamp(s) => Ok(value.clone()),
            Value::String(s) => Err(ValidationDetails::pattern_mismatch(
                path,
                "ISO-8601 date",
                s.as_str(),
            )),
            _ => Err(mismatch()),
        },
        CqlType::Uuid | CqlType::Timeuuid => match value {
            Value::String(s) if uuid_string().is_match(s) => Ok(value.clone()),
            Value::String(s) => Err(ValidationDetails::pattern_mismatch(path, "uuid", s.as_str())),
            _ => Err(mismatch()),
        },
        CqlType::Json | CqlType::Map | CqlType::List | CqlType::Set => Ok(value.clone()),
    }
}

/// `None` means "wrong JSON type", reported by the caller.
fn check_int(value: &Value, path: &str, strict: bool) -> Option<Result<Value, ValidationDetails>> {
    let parsed = match value {
        Value::Number(n) => match integral(n) {
            Integral::Exact(i) => Some(i),
            Integral::Huge => None,
            Integral::Fraction => return None,
        },
        Value::String(s) if !strict => {
            if !int_string().is_match(s) {
                return Some(Err(ValidationDetails::pattern_mismatch(
                    path,
                    "integer string",
                    s.as_str(),
                )));
            }
            s.parse::<i128>().ok()
        }
        _ => return None,
    };

    let result = match parsed.and_then(|i| i32::try_from(i).ok()) {
        Some(i) => Ok(Value::from(i)),
        None => Err(ValidationDetails::out_of_range(
            path,
            format!("integer in [{}, {}]", i32::MIN, i32::MAX),
            value_text(value),
        )),
    };
    Some(result)
}

/// `None` means "wrong JSON type", reported by the caller.
fn check_bigint(
    kind: CqlType,
    value: &Value,
    path: &str,
) -> Option<Result<Value, ValidationDetails>> {
    let result = match value {
        Value::Number(n) => match integral(n) {
            Integral::Exact(i) if i.abs() <= MAX_SAFE_INTEGER => Ok(value.clone()),
            Integral::Exact(_) | Integral::Huge => Err(ValidationDetails::out_of_range(
                path,
                "safe integer (use a string beyond 2^53 - 1)",
                n.to_string(),
            )),
            Integral::Fraction => return None,
        },
        Value::String(s) => {
            if !bigint_string().is_match(s) {
                return Some(Err(ValidationDetails::pattern_mismatch(
                    path,
                    format!("{} string of 1-19 digits", kind.type_name()),
                    s.as_str(),
                )));
            }
            match s.parse::<i128>() {
                Ok(i) if i.abs() <= i128::from(i64::MAX) => Ok(value.clone()),
                _ => Err(ValidationDetails::out_of_range(
                    path,
                    format!("magnitude at most {}", i64::MAX),
                    s.as_str(),
                )),
            }
        }
        _ => return None,
    };
    Some(result)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_byte(value: &Value) -> bool {
    value.as_u64().map_or(false, |b| b <= u64::from(u8::MAX))
}

fn is_inet(s: &str) -> bool {
    let (addr, prefix) = match s.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (s, None),
    };

    let Ok(ip) = addr.parse::<IpAddr>() else {
        return false;
    };

    match prefix {
        None => true,
        Some(p) if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) => false,
        Some(p) => {
            let bits = if ip.is_ipv4() { 32 } else { 128 };
            p.parse::<u16>().map_or(false, |n| n <= bits)
        }
    }
}

fn is_timestamp(s: &str) -> bool {
    let Some(caps) = timestamp_string().captures(s) else {
        return false;
    };

    let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    let (Some(year), Some(month), Some(day)) = (field(1), field(2), field(3)) else {
        return false;
    };
    if NaiveDate::from_ymd_opt(year as i32, month, day).is_none() {
        return false;
    }

    match (field(4), field(5)) {
        (Some(hour), Some(minute)) => {
            NaiveTime::from_hms_opt(hour, minute, field(6).unwrap_or(0)).is_some()
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn passes(kind: CqlType, value: Value) -> bool {
        check_scalar(kind, &value, "f", false).is_ok()
    }

    #[test]
    fn test_text_kinds() {
        for kind in [CqlType::Ascii, CqlType::Text, CqlType::Varchar] {
            assert!(passes(kind, json!("")));
            assert!(passes(kind, json!("hello")));
            assert!(!passes(kind, json!(true)));
            assert!(!passes(kind, json!(1)));
            assert!(!passes(kind, json!({})));
            assert!(!passes(kind, json!([])));
        }
    }

    #[test]
    fn test_int_converts_numeral_strings() {
        let out = check_scalar(CqlType::Int, &json!("42"), "f", false).unwrap();
        assert_eq!(out, json!(42));
        assert!(check_scalar(CqlType::Int, &json!("42"), "f", true).is_err());
    }

    #[test]
    fn test_int_bounds() {
        assert!(passes(CqlType::Int, json!(2147483647)));
        assert!(passes(CqlType::Int, json!(-2147483648)));
        assert!(!passes(CqlType::Int, json!(2147483648i64)));
        assert!(!passes(CqlType::Int, json!(-2147483649i64)));
        assert!(!passes(CqlType::Int, json!(1.5)));
        assert!(!passes(CqlType::Int, json!("1.5")));
    }

    #[test]
    fn test_bigint_strings() {
        assert!(passes(CqlType::Bigint, json!("9223372036854775807")));
        assert!(passes(CqlType::Bigint, json!("-9223372036854775807")));
        assert!(!passes(CqlType::Bigint, json!("9223372036854775808")));
        assert!(!passes(CqlType::Bigint, json!("12345678901234567890")));
        assert!(!passes(CqlType::Bigint, json!("1,000")));
        assert!(!passes(CqlType::Bigint, json!("\u{2212}1")));
        assert!(!passes(CqlType::Bigint, json!("+1")));
    }

    #[test]
    fn test_bigint_numbers_must_be_safe() {
        assert!(passes(CqlType::Counter, json!(9007199254740991i64)));
        assert!(!passes(CqlType::Counter, json!(9007199254740992i64)));
    }

    #[test]
    fn test_inet_prefixes() {
        assert!(is_inet("10.0.0.1"));
        assert!(is_inet("10.0.0.0/8"));
        assert!(is_inet("::1"));
        assert!(is_inet("2001:db8::/32"));
        assert!(!is_inet("10.0.0.0/33"));
        assert!(!is_inet("10.0.0.0/"));
        assert!(!is_inet("10.0.0.0/+8"));
        assert!(!is_inet("localhost"));
    }

    #[test]
    fn test_timestamp_shapes() {
        assert!(is_timestamp("2015-01-01"));
        assert!(is_timestamp("2015-01-01 10:20"));
        assert!(is_timestamp("2015-01-01T10:20:30"));
        assert!(is_timestamp("2015-01-01T10:20:30.123Z"));
        assert!(is_timestamp("2015-01-01T10:20+0100"));
        assert!(is_timestamp("2015-01-01T10:20:30-05:00"));
        assert!(!is_timestamp("2015-01-01Z"));
        assert!(!is_timestamp("2015-02-30"));
        assert!(!is_timestamp("2015-01-01T25:00"));
    }

    #[test]
    fn test_json_type_names() {
        assert_eq!(json_type_name(&json!(1)), "integer");
        assert_eq!(json_type_name(&json!(1.5)), "number");
        assert_eq!(json_type_name(&json!(null)), "null");
    }
}
