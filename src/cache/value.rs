//! Wire representation of snapshot fields and the flag decoding rule.

use std::fmt;

/// A hash field value as returned by a cache store.
///
/// Redis hands back bulk strings for fields we wrote ourselves, but RESP3
/// servers and other writers may return integers or booleans, so every read
/// site decodes through [`decode_flag`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheValue {
    Text(String),
    Integer(i64),
    Bool(bool),
    /// Anything else the server returned (arrays, doubles, ...)
    Other(String),
}

impl CacheValue {
    /// The canonical encoding written by a reload: `"1"` or `"0"`.
    pub fn flag(value: bool) -> Self {
        CacheValue::Text(if value { "1" } else { "0" }.to_string())
    }

    /// String form sent to the server.
    pub fn to_wire(&self) -> String {
        match self {
            CacheValue::Text(text) | CacheValue::Other(text) => text.clone(),
            CacheValue::Integer(n) => n.to_string(),
            CacheValue::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        }
    }
}

impl fmt::Display for CacheValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

/// Decode a stored setting value.
///
/// | stored value        | result |
/// |---------------------|--------|
/// | `"1"`               | true   |
/// | `1`                 | true   |
/// | `true`              | true   |
/// | anything else       | false  |
pub fn decode_flag(value: &CacheValue) -> bool {
    match value {
        CacheValue::Text(text) => text == "1",
        CacheValue::Integer(n) => *n == 1,
        CacheValue::Bool(b) => *b,
        CacheValue::Other(_) => false,
    }
}
