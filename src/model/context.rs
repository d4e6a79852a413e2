//! Caller-supplied context used to seed hexagram sequences.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Hexagram, HexagramTable, HEXAGRAM_COUNT};

/// Scalar or text field carried in a `UserContext`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ContextValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ContextValue::Null => "NULL",
            ContextValue::Bool(_) => "BOOLEAN",
            ContextValue::Int(_) => "INTEGER",
            ContextValue::Float(_) => "FLOAT",
            ContextValue::Text(_) => "TEXT",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ContextValue::Int(_) | ContextValue::Float(_))
    }

    /// Numeric value, if any. Booleans and text are not numeric.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ContextValue::Int(i) => Some(*i as f64),
            ContextValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ContextValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for ContextValue { fn from(v: bool) -> Self { ContextValue::Bool(v) } }
impl From<i32> for ContextValue { fn from(v: i32) -> Self { ContextValue::Int(v as i64) } }
impl From<i64> for ContextValue { fn from(v: i64) -> Self { ContextValue::Int(v) } }
impl From<f64> for ContextValue { fn from(v: f64) -> Self { ContextValue::Float(v) } }
impl From<String> for ContextValue { fn from(v: String) -> Self { ContextValue::Text(v) } }
impl From<&str> for ContextValue { fn from(v: &str) -> Self { ContextValue::Text(v.to_owned()) } }
impl<T: Into<ContextValue>> From<Option<T>> for ContextValue {
    fn from(v: Option<T>) -> Self { v.map(Into::into).unwrap_or(ContextValue::Null) }
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextValue::Null => write!(f, "null"),
            ContextValue::Bool(b) => write!(f, "{b}"),
            ContextValue::Int(i) => write!(f, "{i}"),
            ContextValue::Float(v) => write!(f, "{v}"),
            ContextValue::Text(s) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
        }
    }
}

/// Request context: a timestamp, a prior quotient value, and free-form
/// biometric fields. Only numeric `bio_data` entries feed the derivation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    /// Defaults to "now" when absent.
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub shang_value: f64,
    #[serde(default)]
    pub bio_data: BTreeMap<String, ContextValue>,
}

impl UserContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.timestamp = Some(ts);
        self
    }

    pub fn with_shang_value(mut self, value: f64) -> Self {
        self.shang_value = value;
        self
    }

    pub fn with_bio(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.bio_data.insert(key.into(), value.into());
        self
    }

    /// Sum of the numeric biometric fields.
    pub fn bio_sum(&self) -> f64 {
        self.bio_data.values().filter_map(ContextValue::as_float).sum()
    }

    fn timestamp_seconds(&self) -> f64 {
        let ts = self.timestamp.unwrap_or_else(Utc::now);
        ts.timestamp_millis() as f64 / 1000.0
    }

    /// Hexagram ids derived from the context, one per position.
    ///
    /// Position `i` combines a time factor `(ts + 3600 i) mod 64`, a quotient
    /// factor `(|1000 shang| + i) mod 64` and a biometric factor
    /// `(|bio_sum| + 100 i) mod 64`.
    pub fn hexagram_ids(&self, len: usize) -> Vec<usize> {
        let ts = self.timestamp_seconds();
        let shang = (self.shang_value * 1000.0).abs();
        let bio = self.bio_sum().abs();
        (0..len)
            .map(|i| {
                let i = i as f64;
                let time_factor = mod64(ts + i * 3600.0);
                let shang_factor = mod64(shang.trunc() + i);
                let bio_factor = mod64(bio.trunc() + i * 100.0);
                (time_factor + shang_factor + bio_factor) % HEXAGRAM_COUNT
            })
            .collect()
    }

    /// Hexagrams derived from the context, resolved against the global table.
    pub fn hexagram_sequence(&self, len: usize) -> Vec<Hexagram> {
        let table = HexagramTable::global();
        self.hexagram_ids(len)
            .into_iter()
            .filter_map(|id| table.lookup(id).ok().cloned())
            .collect()
    }
}

fn mod64(x: f64) -> usize {
    (x.trunc() as i64).rem_euclid(HEXAGRAM_COUNT as i64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ctx() -> UserContext {
        UserContext::new()
            .with_timestamp(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
            .with_shang_value(0.42)
            .with_bio("heart_rate", 72)
            .with_bio("hrv", 55.5)
            .with_bio("mood", "calm")
    }

    #[test]
    fn test_bio_sum_ignores_text() {
        assert_eq!(ctx().bio_sum(), 127.5);
    }

    #[test]
    fn test_hexagram_ids() {
        // ts % 64 = 1_700_000_000 % 64 = 0, shang = 420, bio = 127
        let ids = ctx().hexagram_ids(2);
        let first = (0 + 420 % 64 + 127 % 64) % 64;
        let second = ((1_700_003_600i64 % 64) as usize + 421 % 64 + 227 % 64) % 64;
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn test_sequence_is_deterministic() {
        let a = ctx().hexagram_sequence(8);
        let b = ctx().hexagram_sequence(8);
        assert_eq!(a.len(), 8);
        assert_eq!(a, b);
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(ContextValue::from(3), ContextValue::Int(3));
        assert_eq!(ContextValue::from("x").as_str(), Some("x"));
        assert_eq!(ContextValue::from(None::<i64>), ContextValue::Null);
        assert!(ContextValue::Bool(true).as_float().is_none());
    }
}
