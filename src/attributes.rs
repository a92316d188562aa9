//! Untyped attribute bags with dotted-path addressing.
//!
//! Items and the site carry free-form attributes. Keys are addressed with
//! dotted paths (`site.collections.posts`), and a literal dot inside a key
//! is written as `[.]`:
//!
//! | Path | Segments |
//! |------|----------|
//! | `site.name` | `site`, `name` |
//! | `site.pages.index[.]html` | `site`, `pages`, `index.html` |
//!
//! Consumers that need a specific type check it explicitly and report a
//! typed error; nothing is coerced.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Literal-dot escape inside a path segment.
const ESCAPED_DOT: &str = "[.]";

/// Escape every `.` in `key` so it is read back as a single segment.
pub fn escape_dot(key: &str) -> String {
    key.replace('.', ESCAPED_DOT)
}

/// Split a dotted path into its segments, honoring `[.]` escapes.
///
/// An empty path has no segments.
pub fn split_path(path: &str) -> Vec<String> {
    if path.is_empty() {
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut rest = path;

    while let Some(c) = rest.chars().next() {
        if let Some(after) = rest.strip_prefix(ESCAPED_DOT) {
            current.push('.');
            rest = after;
            continue;
        }
        if c == '.' {
            segments.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }
    segments.push(current);
    segments
}

/// Ordered key/value map addressed by dotted paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeBag {
    map: Map<String, Value>,
}

impl AttributeBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self { map }
    }

    /// Build a bag from a JSON value; non-objects give an empty bag.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self { map },
            _ => Self::default(),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.map
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.map)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Look up a value by dotted path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let segments = split_path(path);
        let (first, rest) = segments.split_first()?;
        let mut current = self.map.get(first)?;
        for segment in rest {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Look up a value, falling back to `default` when absent.
    pub fn get_or<'a>(&'a self, path: &str, default: &'a Value) -> &'a Value {
        self.get(path).unwrap_or(default)
    }

    /// Look up a string value. Non-strings read as `None`.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn has(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Set a value, creating intermediate objects along the path.
    ///
    /// A non-object found mid-path is replaced by an object.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) {
        let segments = split_path(path);
        let Some((last, parents)) = segments.split_last() else {
            return;
        };

        let mut current = &mut self.map;
        for segment in parents {
            let entry = current
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            let Value::Object(next) = entry else {
                unreachable!("entry was just made an object");
            };
            current = next;
        }
        current.insert(last.clone(), value.into());
    }

    /// Set a value only if the path is not already present.
    pub fn add(&mut self, path: &str, value: impl Into<Value>) {
        if !self.has(path) {
            self.set(path, value);
        }
    }

    /// Remove a value, returning it if it was present.
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        let segments = split_path(path);
        let (last, parents) = segments.split_last()?;

        let mut current = &mut self.map;
        for segment in parents {
            current = current.get_mut(segment)?.as_object_mut()?;
        }
        current.shift_remove(last)
    }

    /// Merge `defaults` underneath this bag: keys already present here win.
    ///
    /// The merged order lists the defaults' keys first, like an array merge
    /// of `defaults` followed by `self`.
    pub fn merge_under(&mut self, defaults: &AttributeBag) {
        let mut merged = defaults.map.clone();
        for (key, value) in std::mem::take(&mut self.map) {
            merged.insert(key, value);
        }
        self.map = merged;
    }
}

/// Total order over attribute values used for sorting.
///
/// Values of different kinds order as `null < bool < number < string <
/// array < object`; a missing value sorts like `null`. Arrays compare
/// element-wise, objects by size.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.total_cmp(&y)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Array(x)), Some(Value::Array(y))) => x
            .iter()
            .zip(y)
            .map(|(x, y)| compare_values(Some(x), Some(y)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (Some(Value::Object(x)), Some(Value::Object(y))) => x.len().cmp(&y.len()),
        _ => rank(a).cmp(&rank(b)),
    }
}

impl From<Map<String, Value>> for AttributeBag {
    fn from(map: Map<String, Value>) -> Self {
        Self::from_map(map)
    }
}

impl From<AttributeBag> for Value {
    fn from(bag: AttributeBag) -> Self {
        bag.into_value()
    }
}
