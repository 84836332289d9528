//! Uniform request parameter bag.
//!
//! Query-string, JSON-body and form-body parameters all end up in one
//! `Params` value, so controllers read `search` the same way whether the
//! client sent `?search=x` or `{"search": "x"}`.

use serde_json::{Map, Value};

/// Request parameters keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    inner: Map<String, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(inner: Map<String, Value>) -> Self {
        Self { inner }
    }

    /// Build from string pairs (query string / form body).
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let inner = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), Value::String(v.into())))
            .collect();
        Self { inner }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.inner.insert(key.into(), value);
    }

    /// Overlay `other` on top of `self`; keys present in `other` win.
    pub fn merge(&mut self, other: Params) {
        self.inner.extend(other.inner);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Absent, null, or a string that is empty after trimming.
    pub fn is_blank(&self, key: &str) -> bool {
        is_blank(self.get(key))
    }

    /// The value, if it is truthy. Empty strings, `"0"`, `0`, `false`,
    /// `null` and empty collections are falsy.
    pub fn truthy(&self, key: &str) -> Option<&Value> {
        self.get(key).filter(|v| is_truthy(v))
    }

    /// Text of a truthy value, or `default`.
    pub fn str_or(&self, key: &str, default: &str) -> String {
        self.truthy(key)
            .and_then(value_text)
            .unwrap_or_else(|| default.to_string())
    }

    /// Integer reading of a truthy value, or `default`.
    ///
    /// A truthy value that does not read as a number coerces to 0, the way an
    /// integer cast would.
    pub fn i64_or(&self, key: &str, default: i64) -> i64 {
        match self.truthy(key) {
            Some(v) => coerce_i64(v),
            None => default,
        }
    }

    /// Text of a string or number value.
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(value_text)
    }

    /// Strict integer reading (`12`, `"12"`, `12.0`); `None` otherwise.
    pub fn integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(value_integer)
    }

    /// Numeric reading (`1.5`, `"1.5"`, `"-2e3"`); `None` otherwise.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(value_number)
    }
}

impl From<Map<String, Value>> for Params {
    fn from(inner: Map<String, Value>) -> Self {
        Self { inner }
    }
}

pub(crate) fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(_) => false,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s.as_str() == "0"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Text of a string or number. Integral floats print without a fraction
/// (`5551234.0` reads as `"5551234"`), matching how stored values compare.
pub(crate) fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(number_text(n)),
        _ => None,
    }
}

fn number_text(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if !n.is_i64() && !n.is_u64() && f.fract() == 0.0 && f.abs() < 9.2e18 => {
            (f as i64).to_string()
        }
        _ => n.to_string(),
    }
}

pub(crate) fn value_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < 9.2e18).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

pub(crate) fn value_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_numeric(s),
        _ => None,
    }
}

fn coerce_i64(value: &Value) -> i64 {
    value_integer(value)
        .or_else(|| value_number(value).map(|f| f.trunc() as i64))
        .unwrap_or(0)
}

/// Decimal/scientific number text with optional sign and surrounding
/// whitespace. Rejects `inf`, `nan` and hex.
pub fn parse_numeric(s: &str) -> Option<f64> {
    let t = s.trim();
    let unsigned = t.strip_prefix(['+', '-']).unwrap_or(t);
    if unsigned.is_empty() {
        return None;
    }

    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(i) => (&unsigned[..i], Some(&unsigned[i + 1..])),
        None => (unsigned, None),
    };

    let mut digits = 0usize;
    let mut dots = 0usize;
    for c in mantissa.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return None,
        }
    }
    if digits == 0 || dots > 1 {
        return None;
    }

    if let Some(exp) = exponent {
        let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
        if exp.is_empty() || !exp.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }

    t.parse::<f64>().ok().filter(|f| f.is_finite())
}
