//! Toleranta serde-avkodare för postfält
//!
//! Formulären i webbversionen sparade allt som trimmade strängar, så belopp
//! kan komma som `"850"` och tomma fält som `""`. Avkodarna accepterar båda
//! representationerna men avvisar värden som inte går att tolka.

use chrono::NaiveDate;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::date::parse_date;

/// Tolka ett numeriskt värde ur sträng eller tal. Tom sträng/null ger `None`.
pub fn parse_number(value: &Value) -> Result<Option<f64>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| format!("ogiltigt tal: {}", n)),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.replace(',', ".")
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Some)
                .ok_or_else(|| format!("ogiltigt belopp: {:?}", s))
        }
        other => Err(format!("förväntade ett tal, fick {}", other)),
    }
}

/// Belopp; saknat värde blir 0
pub fn amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    parse_number(&value)
        .map(|v| v.unwrap_or(0.0))
        .map_err(D::Error::custom)
}

pub fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    parse_number(&value).map_err(D::Error::custom)
}

pub fn optional_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match parse_number(&value).map_err(D::Error::custom)? {
        None => Ok(None),
        Some(v) if v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => Ok(Some(v as u32)),
        Some(v) => Err(D::Error::custom(format!("ogiltigt antal: {}", v))),
    }
}

pub fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => parse_date(&s)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("ogiltigt datum: {:?}", s))),
        other => Err(D::Error::custom(format!("förväntade ett datum, fick {}", other))),
    }
}

/// Fritext; tal accepteras (telefonnummer sparades ibland som tal)
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!("förväntade text, fick {}", other))),
    }
}
