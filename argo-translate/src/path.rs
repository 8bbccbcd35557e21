//! Path codec: converts between nested property trees and flat
//! `(path, value)` pairs.
//!
//! Key paths join dictionary keys with `.`. Keys that themselves contain
//! `.`, `!` or `\` are backslash-escaped and the empty key is written `\0`,
//! so `build(flatten(x)) == x` holds for any tree of non-empty dictionaries
//! and scalars. The empty path addresses the root.
//!
//! Entity property paths (`field.delta.property`) use the same `.` syntax.
//! A `!` after the schema part marks the start of a free-form dictionary key
//! path, see [`PropertyPath`].

use std::borrow::Cow;

use serde_json::{Map, Value};
use thiserror::Error;

/// Separator between schema properties and dictionary keys.
pub const KEY_SEPARATOR: char = '.';

/// Marks the start of a free-form dictionary key path.
pub const MAP_KEY_MARKER: char = '!';

const ESCAPE: char = '\\';

/// Escaped form of the empty key.
const EMPTY_KEY: &str = "\\0";

/// Errors from parsing or applying paths.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty path")]
    Empty,

    #[error("path {0:?} does not name a property")]
    MissingProperty(String),

    #[error("path {0:?} has an empty map key")]
    EmptyMapKey(String),

    #[error("key {key:?} is not a list index")]
    NotAnIndex { key: String },

    #[error("index {index} out of range for list of {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Escapes a single dictionary key for use in a key path.
pub fn escape_key(key: &str) -> Cow<'_, str> {
    if key.is_empty() {
        return Cow::Borrowed(EMPTY_KEY);
    }
    if !key.contains([KEY_SEPARATOR, MAP_KEY_MARKER, ESCAPE]) {
        return Cow::Borrowed(key);
    }
    let mut out = String::with_capacity(key.len() + 2);
    for c in key.chars() {
        if matches!(c, KEY_SEPARATOR | MAP_KEY_MARKER | ESCAPE) {
            out.push(ESCAPE);
        }
        out.push(c);
    }
    Cow::Owned(out)
}

/// Joins keys into an escaped key path.
pub fn join_keys<S: AsRef<str>>(keys: &[S]) -> String {
    keys.iter()
        .map(|k| escape_key(k.as_ref()))
        .collect::<Vec<_>>()
        .join(".")
}

/// Splits an escaped key path back into its keys. The empty path has no keys.
pub fn split_key_path(path: &str) -> Vec<String> {
    if path.is_empty() {
        return Vec::new();
    }
    let mut keys = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();
    while let Some(c) = chars.next() {
        match c {
            ESCAPE => match chars.next() {
                // `\0` is the empty key; `0` itself is never escaped.
                Some('0') | None => {}
                Some(next) => current.push(next),
            },
            KEY_SEPARATOR => keys.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    keys.push(current);
    keys
}

/// Splits off the last key of an escaped key path.
///
/// Returns `None` when the path has a single key.
pub fn split_last_key(path: &str) -> Option<(&str, String)> {
    let mut last_sep = None;
    let mut escaped = false;
    for (i, c) in path.char_indices() {
        if escaped {
            escaped = false;
        } else if c == ESCAPE {
            escaped = true;
        } else if c == KEY_SEPARATOR {
            last_sep = Some(i);
        }
    }
    let i = last_sep?;
    let key = split_key_path(&path[i + 1..]).concat();
    Some((&path[..i], key))
}

/// Depth-first flattening of a tree into `(key path, leaf)` pairs.
///
/// List elements are keyed by index. Empty dictionaries and lists produce
/// no pairs. A scalar root yields one pair with the empty path.
pub fn flatten(tree: &Value) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    let mut prefix = Vec::new();
    flatten_into(tree, &mut prefix, &mut out);
    out
}

fn flatten_into(node: &Value, prefix: &mut Vec<String>, out: &mut Vec<(String, Value)>) {
    match node {
        Value::Object(map) => {
            for (key, child) in map {
                prefix.push(key.clone());
                flatten_into(child, prefix, out);
                prefix.pop();
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                prefix.push(index.to_string());
                flatten_into(child, prefix, out);
                prefix.pop();
            }
        }
        leaf => out.push((join_keys(prefix), leaf.clone())),
    }
}

/// Builds a tree from `(key path, leaf)` pairs. Inverse of [`flatten`].
///
/// Later pairs win when two paths address the same slot.
pub fn build<I, K>(pairs: I) -> Value
where
    I: IntoIterator<Item = (K, Value)>,
    K: AsRef<str>,
{
    pairs.into_iter().fold(Value::Null, |tree, (path, leaf)| {
        let keys = split_key_path(path.as_ref());
        insert_at(tree, &keys, leaf)
    })
}

/// Returns `node` with `leaf` placed at `keys`, creating dictionaries on
/// the way. A non-dictionary node on the way is replaced.
fn insert_at(node: Value, keys: &[String], leaf: Value) -> Value {
    let Some((head, rest)) = keys.split_first() else {
        return leaf;
    };
    let mut map = match node {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let child = map.remove(head).unwrap_or(Value::Null);
    map.insert(head.clone(), insert_at(child, rest, leaf));
    Value::Object(map)
}

/// Deep-merges `patch` into `base`.
///
/// Dictionaries merge key by key; anything else is replaced. A dictionary
/// patch applied to a list addresses existing elements by index.
pub fn merge(base: &mut Value, patch: Value) -> Result<(), PathError> {
    match (base, patch) {
        (Value::Object(existing), Value::Object(patch)) => {
            for (key, value) in patch {
                match existing.get_mut(&key) {
                    Some(slot) => merge(slot, value)?,
                    None => {
                        existing.insert(key, value);
                    }
                }
            }
            Ok(())
        }
        (Value::Array(items), Value::Object(patch)) => {
            for (key, value) in patch {
                let index: usize = key.parse().map_err(|_| PathError::NotAnIndex { key: key.clone() })?;
                let len = items.len();
                let slot = items
                    .get_mut(index)
                    .ok_or(PathError::IndexOutOfRange { index, len })?;
                merge(slot, value)?;
            }
            Ok(())
        }
        (slot, patch) => {
            *slot = patch;
            Ok(())
        }
    }
}

/// A parsed entity property path: `field[.delta].property[.sub...][!map.key]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    pub field: String,
    /// Item index; `0` when the path omits it.
    pub delta: usize,
    /// Property name followed by declared sub-property names.
    pub properties: Vec<String>,
    /// Escaped key path into an untyped dictionary, after the `!` marker.
    pub map_key: Option<String>,
}

impl PropertyPath {
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let (schema_part, map_key) = match path.split_once(MAP_KEY_MARKER) {
            Some((schema, key)) if key.is_empty() => return Err(PathError::EmptyMapKey(schema.to_string())),
            Some((schema, key)) => (schema, Some(key.to_string())),
            None => (path, None),
        };
        let mut segments = schema_part.split(KEY_SEPARATOR);
        let field = match segments.next() {
            Some(f) if !f.is_empty() => f.to_string(),
            _ => return Err(PathError::Empty),
        };
        let mut rest: Vec<String> = segments.map(str::to_string).collect();
        let delta = match rest.first().and_then(|s| s.parse::<usize>().ok()) {
            Some(delta) => {
                rest.remove(0);
                delta
            }
            None => 0,
        };
        if rest.is_empty() || rest.iter().any(String::is_empty) {
            return Err(PathError::MissingProperty(path.to_string()));
        }
        Ok(Self {
            field,
            delta,
            properties: rest,
            map_key,
        })
    }

    /// The path of the item property, without the map key part.
    pub fn property_path(&self) -> String {
        format!("{}.{}.{}", self.field, self.delta, self.properties.join("."))
    }
}

impl std::fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.property_path())?;
        if let Some(key) = &self.map_key {
            write!(f, "{MAP_KEY_MARKER}{key}")?;
        }
        Ok(())
    }
}
