use crate::domain::models::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %B %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%b %d, %Y",
];

/// Days since 1899-12-30 with the fraction as time of day.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let excel_epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let days = serial.floor() as i64;
    let seconds_in_day = ((serial - serial.floor()) * 86400.0).floor() as u32;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds_in_day, 0)?;
    let date = excel_epoch.checked_add_signed(chrono::Duration::try_days(days)?)?;
    Some(NaiveDateTime::new(date, time))
}

pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Parses with an explicit chrono format. Date-only formats yield midnight.
pub fn parse_datetime_with_format(s: &str, fmt: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, fmt).ok().or_else(|| {
        NaiveDate::parse_from_str(s, fmt)
            .ok()
            .map(|d| d.and_time(NaiveTime::MIN))
    })
}

/// Lenient datetime coercion: anything unparseable becomes null.
pub fn to_datetime(value: &Value) -> Value {
    match value {
        v if v.is_null() => Value::Null,
        Value::DateTime(dt) => Value::DateTime(*dt),
        Value::Int(i) => excel_serial_to_datetime(*i as f64).into(),
        Value::Float(f) => excel_serial_to_datetime(*f).into(),
        Value::Text(s) => parse_datetime(s).into(),
        _ => Value::Null,
    }
}

pub fn to_datetime_with_format(value: &Value, fmt: &str) -> Value {
    match value {
        Value::DateTime(dt) => Value::DateTime(*dt),
        Value::Text(s) => parse_datetime_with_format(s, fmt).into(),
        _ => Value::Null,
    }
}

fn float_to_int(f: f64) -> Result<Value, String> {
    if f.is_nan() {
        return Ok(Value::Null);
    }
    if !f.is_finite() || f.fract() != 0.0 || f < i64::MIN as f64 || f >= i64::MAX as f64 {
        return Err(format!("{} is not an integer", f));
    }
    Ok(Value::Int(f as i64))
}

/// Numeric coercion followed by an integer cast. Non-numeric values become
/// null; numbers with a fractional part are an error.
pub fn to_int(value: &Value) -> Result<Value, String> {
    match value {
        Value::Null | Value::DateTime(_) => Ok(Value::Null),
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(f) => float_to_int(*f),
        Value::Text(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                Ok(Value::Int(i))
            } else if let Ok(f) = s.parse::<f64>() {
                float_to_int(f)
            } else {
                Ok(Value::Null)
            }
        }
    }
}

/// Strict float cast.
pub fn to_float(value: &Value) -> Result<Value, String> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Int(i) => Ok(Value::Float(*i as f64)),
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::Text(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| format!("could not convert '{}' to float", s)),
        Value::DateTime(dt) => Err(format!("cannot cast datetime {} to float", dt)),
    }
}
