//! MySQL column type vocabulary and value compatibility checks.
//!
//! `COLUMN_TYPE` strings such as `varchar(255)`, `int(11) unsigned`,
//! `decimal(10,2)` or `enum('draft','live')` are parsed once at startup into
//! a [`ColumnType`]; request values are then checked against it before any
//! statement reaches the database.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnType {
    Integer { min: i128, max: i128 },
    Decimal { precision: u32, scale: u32, unsigned: bool },
    Float { unsigned: bool },
    Bit { width: u32 },
    /// `char` / `varchar`, limit in characters
    Char { max_chars: u64 },
    /// `binary` / `varbinary` / blobs, limit in bytes
    Binary { max_bytes: u64 },
    /// text family, limit in bytes
    Text { max_bytes: u64 },
    Date,
    DateTime,
    Timestamp,
    Time,
    Year,
    Enum(Vec<String>),
    Set(Vec<String>),
    Json,
    /// Anything not modelled (spatial types, ...). Scalars pass through.
    Other(String),
}

impl ColumnType {
    pub fn parse(declared: &str) -> ColumnType {
        let declared = declared.trim();
        let lower = declared.to_ascii_lowercase();

        let base_end = lower.find(|c: char| c == '(' || c.is_whitespace()).unwrap_or(lower.len());
        let base = &lower[..base_end];

        // Arguments keep their original case (enum members are case-preserving)
        let (args, rest) = match declared[base_end..].trim_start().strip_prefix('(') {
            Some(after) => match find_closing_paren(after) {
                Some(close) => (Some(&after[..close]), after[close + 1..].to_ascii_lowercase()),
                None => (Some(after), String::new()),
            },
            None => (None, lower[base_end..].to_string()),
        };
        let unsigned = rest.split_whitespace().any(|m| m == "unsigned");
        let numeric_args = args.map(parse_numeric_args).unwrap_or_default();

        match base {
            "tinyint" => integer_range(8, unsigned),
            "bool" | "boolean" => integer_range(8, false),
            "smallint" => integer_range(16, unsigned),
            "mediumint" => integer_range(24, unsigned),
            "int" | "integer" => integer_range(32, unsigned),
            "bigint" => integer_range(64, unsigned),
            "serial" => integer_range(64, true),
            "decimal" | "numeric" | "dec" | "fixed" => ColumnType::Decimal {
                precision: numeric_args.first().copied().unwrap_or(10) as u32,
                scale: numeric_args.get(1).copied().unwrap_or(0) as u32,
                unsigned,
            },
            "float" | "double" | "real" => ColumnType::Float { unsigned },
            "bit" => ColumnType::Bit { width: numeric_args.first().copied().unwrap_or(1) as u32 },
            "char" => ColumnType::Char { max_chars: numeric_args.first().copied().unwrap_or(1) },
            "varchar" => ColumnType::Char { max_chars: numeric_args.first().copied().unwrap_or(255) },
            "binary" => ColumnType::Binary { max_bytes: numeric_args.first().copied().unwrap_or(1) },
            "varbinary" => ColumnType::Binary { max_bytes: numeric_args.first().copied().unwrap_or(255) },
            "tinyblob" => ColumnType::Binary { max_bytes: 255 },
            "blob" => ColumnType::Binary { max_bytes: 65_535 },
            "mediumblob" => ColumnType::Binary { max_bytes: 16_777_215 },
            "longblob" => ColumnType::Binary { max_bytes: 4_294_967_295 },
            "tinytext" => ColumnType::Text { max_bytes: 255 },
            "text" => ColumnType::Text { max_bytes: 65_535 },
            "mediumtext" => ColumnType::Text { max_bytes: 16_777_215 },
            "longtext" => ColumnType::Text { max_bytes: 4_294_967_295 },
            "date" => ColumnType::Date,
            "datetime" => ColumnType::DateTime,
            "timestamp" => ColumnType::Timestamp,
            "time" => ColumnType::Time,
            "year" => ColumnType::Year,
            "enum" => ColumnType::Enum(args.map(parse_quoted_list).unwrap_or_default()),
            "set" => ColumnType::Set(args.map(parse_quoted_list).unwrap_or_default()),
            "json" => ColumnType::Json,
            other => ColumnType::Other(other.to_string()),
        }
    }

    /// `Err` carries a human readable reason. `null` is never accepted here;
    /// nullability is the validator's call.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        if value.is_null() {
            return Err("value cannot be null".to_string());
        }

        match self {
            ColumnType::Integer { min, max } => {
                let n = integer_value(value).ok_or_else(|| format!("expected an integer, got {}", value))?;
                if n < *min || n > *max {
                    return Err(format!("{} is out of range [{}, {}]", n, min, max));
                }
                Ok(())
            }
            ColumnType::Decimal { precision, scale, unsigned } => {
                check_decimal(value, *precision, *scale, *unsigned)
            }
            ColumnType::Float { unsigned } => {
                let f = float_value(value).ok_or_else(|| format!("expected a number, got {}", value))?;
                if *unsigned && f < 0.0 {
                    return Err(format!("{} must not be negative", f));
                }
                Ok(())
            }
            ColumnType::Bit { width } => {
                let n = match value {
                    Value::Bool(b) => *b as i128,
                    _ => integer_value(value).ok_or_else(|| format!("expected a bit value, got {}", value))?,
                };
                let max = (1i128 << (*width).min(64)) - 1;
                if n < 0 || n > max {
                    return Err(format!("{} does not fit in bit({})", n, width));
                }
                Ok(())
            }
            ColumnType::Char { max_chars } => {
                let s = scalar_text(value)?;
                let len = s.chars().count() as u64;
                if len > *max_chars {
                    return Err(format!("length {} exceeds maximum of {} characters", len, max_chars));
                }
                Ok(())
            }
            ColumnType::Binary { max_bytes } | ColumnType::Text { max_bytes } => {
                let s = scalar_text(value)?;
                if s.len() as u64 > *max_bytes {
                    return Err(format!("length {} exceeds maximum of {} bytes", s.len(), max_bytes));
                }
                Ok(())
            }
            ColumnType::Date => {
                let s = expect_str(value)?;
                let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                    .map_err(|_| format!("'{}' is not a date (YYYY-MM-DD)", s))?;
                check_year_range(date.year(), 1000, 9999)
            }
            ColumnType::DateTime => {
                let s = expect_str(value)?;
                let dt = parse_datetime(s).ok_or_else(|| format!("'{}' is not a datetime (YYYY-MM-DD HH:MM:SS)", s))?;
                check_year_range(dt.year(), 1000, 9999)
            }
            ColumnType::Timestamp => {
                let s = expect_str(value)?;
                let dt = parse_datetime(s).ok_or_else(|| format!("'{}' is not a timestamp (YYYY-MM-DD HH:MM:SS)", s))?;
                let ts = dt.and_utc().timestamp();
                // 1970-01-01 00:00:01 .. 2038-01-19 03:14:07 UTC
                if !(1..=2_147_483_647).contains(&ts) {
                    return Err(format!("'{}' is outside the timestamp range", s));
                }
                Ok(())
            }
            ColumnType::Time => {
                let s = expect_str(value)?;
                if is_time(s.trim()) {
                    Ok(())
                } else {
                    Err(format!("'{}' is not a time (HH:MM:SS)", s))
                }
            }
            ColumnType::Year => {
                let n = integer_value(value).ok_or_else(|| format!("expected a year, got {}", value))?;
                if n == 0 || (1901..=2155).contains(&n) {
                    Ok(())
                } else {
                    Err(format!("{} is outside the year range [1901, 2155]", n))
                }
            }
            ColumnType::Enum(members) => {
                let s = scalar_text(value)?;
                if members.iter().any(|m| m.eq_ignore_ascii_case(&s)) {
                    Ok(())
                } else {
                    Err(format!("'{}' is not one of {}", s, members.join(", ")))
                }
            }
            ColumnType::Set(members) => {
                let s = scalar_text(value)?;
                for item in s.split(',').filter(|i| !i.is_empty()) {
                    if !members.iter().any(|m| m.eq_ignore_ascii_case(item)) {
                        return Err(format!("'{}' is not one of {}", item, members.join(", ")));
                    }
                }
                Ok(())
            }
            ColumnType::Json => match value {
                Value::String(s) => serde_json::from_str::<Value>(s)
                    .map(|_| ())
                    .map_err(|e| format!("invalid JSON document: {}", e)),
                _ => Ok(()),
            },
            ColumnType::Other(_) => match value {
                Value::Array(_) | Value::Object(_) => Err(format!("expected a scalar, got {}", value)),
                _ => Ok(()),
            },
        }
    }
}

fn integer_range(bits: u32, unsigned: bool) -> ColumnType {
    if unsigned {
        ColumnType::Integer { min: 0, max: (1i128 << bits) - 1 }
    } else {
        ColumnType::Integer { min: -(1i128 << (bits - 1)), max: (1i128 << (bits - 1)) - 1 }
    }
}

fn find_closing_paren(s: &str) -> Option<usize> {
    let mut in_quote = false;
    for (i, c) in s.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            ')' if !in_quote => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_numeric_args(args: &str) -> Vec<u64> {
    args.split(',').filter_map(|a| a.trim().parse().ok()).collect()
}

/// `'a','b''s','c'` -> [a, b's, c]
fn parse_quoted_list(args: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut chars = args.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\'' {
            continue;
        }
        let mut item = String::new();
        while let Some(c) = chars.next() {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    item.push('\'');
                } else {
                    break;
                }
            } else {
                item.push(c);
            }
        }
        out.push(item);
    }
    out
}

fn integer_value(value: &Value) -> Option<i128> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && f.is_finite()).map(|f| f as i128)),
        Value::String(s) => s.trim().parse::<i128>().ok(),
        Value::Bool(b) => Some(*b as i128),
        _ => None,
    }
}

fn float_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn check_decimal(value: &Value, precision: u32, scale: u32, unsigned: bool) -> Result<(), String> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err(format!("expected a decimal, got {}", value)),
    };

    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(&text)),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
    let well_formed = !(int_part.is_empty() && frac_part.is_empty())
        && int_part.chars().all(|c| c.is_ascii_digit())
        && frac_part.chars().all(|c| c.is_ascii_digit());
    if !well_formed {
        return Err(format!("'{}' is not a decimal number", text));
    }
    if unsigned && negative && (int_part.trim_start_matches('0').len() + frac_part.trim_end_matches('0').len()) > 0 {
        return Err(format!("{} must not be negative", text));
    }

    // Extra fractional digits are rounded by the server; integer digits are not
    let int_digits = int_part.trim_start_matches('0').len() as u32;
    let allowed = precision.saturating_sub(scale);
    if int_digits > allowed {
        return Err(format!("{} does not fit decimal({},{})", text, precision, scale));
    }
    Ok(())
}

fn expect_str(value: &Value) -> Result<&str, String> {
    value.as_str().ok_or_else(|| format!("expected a string, got {}", value))
}

fn scalar_text(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(if *b { "1" } else { "0" }.to_string()),
        other => Err(format!("expected a scalar, got {}", other)),
    }
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn check_year_range(year: i32, min: i32, max: i32) -> Result<(), String> {
    if (min..=max).contains(&year) {
        Ok(())
    } else {
        Err(format!("year {} is outside [{}, {}]", year, min, max))
    }
}

/// MySQL TIME: `[-]H{1,3}:MM[:SS[.fraction]]`, hours up to 838.
fn is_time(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    let (clock, fraction) = s.split_once('.').unwrap_or((s, ""));
    if !fraction.chars().all(|c| c.is_ascii_digit()) || fraction.len() > 6 {
        return false;
    }
    let parts: Vec<&str> = clock.split(':').collect();
    if !(2..=3).contains(&parts.len()) || parts.iter().any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit())) {
        return false;
    }
    let hours: u32 = parts[0].parse().unwrap_or(u32::MAX);
    let minutes: u32 = parts[1].parse().unwrap_or(u32::MAX);
    let seconds: u32 = parts.get(2).map(|p| p.parse().unwrap_or(u32::MAX)).unwrap_or(0);
    if hours > 838 || minutes > 59 || seconds > 59 {
        return false;
    }
    if parts[0].len() <= 2 && hours < 24 {
        return NaiveTime::from_hms_opt(hours, minutes, seconds).is_some();
    }
    true
}
