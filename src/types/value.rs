//! Constant values carried by resolved expression nodes.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ErrorKind;
use crate::types::DataType;

/// An interval broken into calendar and clock components, since months do
/// not have a fixed length in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Interval {
    pub months: i32,
    pub days: i32,
    pub micros: i64,
}

/// A typed constant value. The node that carries it records the SQL type;
/// an `Unknown`-typed constant holds its literal text in `String` form until
/// context coerces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Decimal(Decimal),
    String(String),
    Bytea(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Interval(Interval),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            // bitwise so NaN constants stay self-equal
            (Float(a), Float(b)) => a.to_bits() == b.to_bits(),
            (Decimal(a), Decimal(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Bytea(a), Bytea(b)) => a == b,
            (Date(a), Date(b)) => a == b,
            (Time(a), Time(b)) => a == b,
            (Timestamp(a), Timestamp(b)) => a == b,
            (TimestampTz(a), TimestampTz(b)) => a == b,
            (Interval(a), Interval(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Parse literal text as a value of the given type. This is how an
    /// `Unknown` constant acquires a concrete type when context demands one.
    pub fn parse_as(ty: &DataType, text: &str) -> Result<Value, ErrorKind> {
        let fail = || ErrorKind::InvalidLiteral {
            ty: ty.to_string(),
            text: text.to_string(),
        };
        let trimmed = text.trim();
        match ty.base_type() {
            DataType::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "t" | "true" | "yes" | "on" | "1" => Ok(Value::Boolean(true)),
                "f" | "false" | "no" | "off" | "0" => Ok(Value::Boolean(false)),
                _ => Err(fail()),
            },
            DataType::Int16 => trimmed
                .parse::<i16>()
                .map(|v| Value::Integer(v as i64))
                .map_err(|_| fail()),
            DataType::Int32 => trimmed
                .parse::<i32>()
                .map(|v| Value::Integer(v as i64))
                .map_err(|_| fail()),
            DataType::Int64 => trimmed
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| fail()),
            DataType::Float32 | DataType::Float64 => trimmed
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| fail()),
            DataType::Numeric => Decimal::from_str(trimmed)
                .map(Value::Decimal)
                .map_err(|_| fail()),
            DataType::Text | DataType::Varchar | DataType::Xml => {
                Ok(Value::String(text.to_string()))
            }
            DataType::Bytea => Ok(Value::Bytea(text.as_bytes().to_vec())),
            DataType::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|_| fail()),
            DataType::Time => NaiveTime::parse_from_str(trimmed, "%H:%M:%S%.f")
                .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
                .map(Value::Time)
                .map_err(|_| fail()),
            DataType::Timestamp => NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f")
                .or_else(|_| {
                    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                        .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default())
                })
                .map(Value::Timestamp)
                .map_err(|_| fail()),
            DataType::TimestampTz => DateTime::parse_from_rfc3339(trimmed)
                .map(|dt| Value::TimestampTz(dt.with_timezone(&Utc)))
                .or_else(|_| {
                    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f")
                        .map(|dt| Value::TimestampTz(dt.and_utc()))
                })
                .map_err(|_| fail()),
            DataType::Interval => parse_interval(trimmed).ok_or_else(fail),
            _ => Err(fail()),
        }
    }
}

/// Accepts `N <unit>` pairs ("1 year 2 days") optionally followed by a
/// clock part (`HH:MM:SS`).
fn parse_interval(text: &str) -> Option<Value> {
    let mut result = Interval::default();
    let mut words = text.split_whitespace().peekable();
    let mut saw_any = false;
    while let Some(word) = words.peek().copied() {
        if let Ok(n) = word.parse::<i64>() {
            words.next();
            let unit = words.next()?;
            match unit.trim_end_matches('s') {
                "year" => result.months += (n as i32) * 12,
                "mon" | "month" => result.months += n as i32,
                "week" => result.days += (n as i32) * 7,
                "day" => result.days += n as i32,
                "hour" => result.micros += n * 3_600_000_000,
                "minute" | "min" => result.micros += n * 60_000_000,
                "second" | "sec" => result.micros += n * 1_000_000,
                _ => return None,
            }
            saw_any = true;
        } else {
            // clock form HH:MM[:SS]
            let time = words.next()?;
            let mut parts = time.split(':');
            let h = parts.next()?.parse::<i64>().ok()?;
            let m = parts.next()?.parse::<i64>().ok()?;
            let s = match parts.next() {
                Some(p) => p.parse::<f64>().ok()?,
                None => 0.0,
            };
            if parts.next().is_some() {
                return None;
            }
            result.micros += h * 3_600_000_000 + m * 60_000_000 + (s * 1_000_000.0) as i64;
            saw_any = true;
        }
    }
    saw_any.then_some(Value::Interval(result))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::String(s) => write!(f, "'{s}'"),
            Value::Bytea(b) => write!(f, "\\x{}", hex(b)),
            Value::Date(d) => write!(f, "{d}"),
            Value::Time(t) => write!(f, "{t}"),
            Value::Timestamp(t) => write!(f, "{t}"),
            Value::TimestampTz(t) => write!(f, "{t}"),
            Value::Interval(iv) => {
                write!(f, "{} mons {} days {} us", iv.months, iv.days, iv.micros)
            }
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_spellings() {
        assert_eq!(
            Value::parse_as(&DataType::Bool, "t"),
            Ok(Value::Boolean(true))
        );
        assert_eq!(
            Value::parse_as(&DataType::Bool, "off"),
            Ok(Value::Boolean(false))
        );
        assert!(Value::parse_as(&DataType::Bool, "maybe").is_err());
    }

    #[test]
    fn test_parse_out_of_range_int() {
        assert!(Value::parse_as(&DataType::Int16, "70000").is_err());
        assert_eq!(
            Value::parse_as(&DataType::Int32, "70000"),
            Ok(Value::Integer(70000))
        );
    }

    #[test]
    fn test_parse_date() {
        assert!(Value::parse_as(&DataType::Date, "2024-02-29").is_ok());
        assert!(Value::parse_as(&DataType::Date, "2023-02-29").is_err());
    }

    #[test]
    fn test_parse_interval_units() {
        let v = Value::parse_as(&DataType::Interval, "1 year 2 days 03:00:00");
        assert_eq!(
            v,
            Ok(Value::Interval(Interval {
                months: 12,
                days: 2,
                micros: 3 * 3_600_000_000,
            }))
        );
    }

    #[test]
    fn test_parse_through_domain() {
        let dom = DataType::Domain {
            name: "posint".into(),
            base: Box::new(DataType::Int32),
        };
        assert_eq!(Value::parse_as(&dom, "5"), Ok(Value::Integer(5)));
    }

    #[test]
    fn test_nan_constants_compare_equal() {
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
    }
}
