//! Structured field paths.
//!
//! Field names such as `Categorias[0].Operacao` address one value inside a
//! nested form payload. They are kept structured ([`FieldPath`]) everywhere
//! except at the registry boundary, where [`FieldPath::canonical`] produces
//! the string key. Reindexing a row after a removal is then a matter of
//! [`FieldPath::with_index`] instead of string surgery.

use std::fmt;

use serde_json::{Map, Value};

use crate::{FormError, Result};

/// A field name made of a base key, an optional array index and an optional
/// sub-field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    base: String,
    index: Option<usize>,
    sub_field: Option<String>,
}

impl FieldPath {
    /// Creates a plain top-level path.
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            index: None,
            sub_field: None,
        }
    }

    /// Creates a path to a sub-field of an array item, e.g. `Categorias[0].Operacao`.
    pub fn indexed(base: impl Into<String>, index: usize, sub_field: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            index: Some(index),
            sub_field: Some(sub_field.into()),
        }
    }

    /// Creates a path to a whole array item, e.g. `Tags[2]`.
    pub fn item(base: impl Into<String>, index: usize) -> Self {
        Self {
            base: base.into(),
            index: Some(index),
            sub_field: None,
        }
    }

    /// Parses a canonical path string.
    ///
    /// Accepts `base`, `base[i]`, `base.sub` and `base[i].sub`. Deeper paths
    /// are rejected; use [`segments`] for arbitrary error paths.
    pub fn parse(input: &str) -> Result<Self> {
        let parts = segments(input)?;
        match parts.as_slice() {
            [Segment::Key(base)] => Ok(Self::new(base.clone())),
            [Segment::Key(base), Segment::Index(i)] => Ok(Self::item(base.clone(), *i)),
            [Segment::Key(base), Segment::Key(sub)] => Ok(Self {
                base: base.clone(),
                index: None,
                sub_field: Some(sub.clone()),
            }),
            [Segment::Key(base), Segment::Index(i), Segment::Key(sub)] => {
                Ok(Self::indexed(base.clone(), *i, sub.clone()))
            }
            _ => Err(FormError::InvalidPath(input.to_string())),
        }
    }

    /// Returns the base key.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Returns the array index, if any.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Returns the sub-field, if any.
    pub fn sub_field(&self) -> Option<&str> {
        self.sub_field.as_deref()
    }

    /// Returns the same path pointing at another array index.
    pub fn with_index(&self, index: usize) -> Self {
        Self {
            base: self.base.clone(),
            index: Some(index),
            sub_field: self.sub_field.clone(),
        }
    }

    /// Produces the string key used by the registry and error maps.
    pub fn canonical(&self) -> String {
        let mut out = self.base.clone();
        if let Some(index) = self.index {
            out.push_str(&format!("[{index}]"));
        }
        if let Some(sub) = &self.sub_field {
            out.push('.');
            out.push_str(sub);
        }
        out
    }

    /// Returns true if `path` names this field or something nested under it.
    pub fn contains(&self, path: &str) -> bool {
        is_within(path, &self.canonical())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl From<&str> for FieldPath {
    fn from(base: &str) -> Self {
        Self::new(base)
    }
}

impl From<String> for FieldPath {
    fn from(base: String) -> Self {
        Self::new(base)
    }
}

impl From<&FieldPath> for FieldPath {
    fn from(path: &FieldPath) -> Self {
        path.clone()
    }
}

// -----------------------------------------------------------------------------
// Segments
// -----------------------------------------------------------------------------

/// One step of a parsed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// An object key.
    Key(String),
    /// An array index.
    Index(usize),
}

/// Splits a dotted/indexed path such as `a.b[2].c` into segments.
pub fn segments(path: &str) -> Result<Vec<Segment>> {
    let invalid = || FormError::InvalidPath(path.to_string());
    let mut out = Vec::new();
    let mut key = String::new();
    let mut chars = path.chars().peekable();
    // True right after a `]`, where a new key must be introduced by `.`.
    let mut after_index = false;

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if key.is_empty() && !after_index {
                    return Err(invalid());
                }
                if !key.is_empty() {
                    out.push(Segment::Key(std::mem::take(&mut key)));
                }
                after_index = false;
                if chars.peek().is_none() {
                    return Err(invalid());
                }
            }
            '[' => {
                if !key.is_empty() {
                    out.push(Segment::Key(std::mem::take(&mut key)));
                } else if out.is_empty() {
                    return Err(invalid());
                }
                let mut digits = String::new();
                loop {
                    match chars.next() {
                        Some(']') => break,
                        Some(d) if d.is_ascii_digit() => digits.push(d),
                        _ => return Err(invalid()),
                    }
                }
                let index = digits.parse().map_err(|_| invalid())?;
                out.push(Segment::Index(index));
                after_index = true;
            }
            ']' => return Err(invalid()),
            other => {
                if after_index {
                    return Err(invalid());
                }
                key.push(other);
            }
        }
    }

    if !key.is_empty() {
        out.push(Segment::Key(key));
    }
    if out.is_empty() {
        return Err(invalid());
    }
    Ok(out)
}

/// Joins an object key onto a parent path.
pub fn join_key(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

/// Joins an array index onto a parent path.
pub fn join_index(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}

/// Returns true if `path` equals `ancestor` or lies underneath it.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    match path.strip_prefix(ancestor) {
        Some(rest) => rest.is_empty() || rest.starts_with('.') || rest.starts_with('['),
        None => false,
    }
}

/// Looks up `path` inside a nested value.
///
/// A flat key equal to the whole path wins over nested traversal, so both
/// `{"Categorias[0].Operacao": "x"}` and `{"Categorias": [{"Operacao": "x"}]}`
/// resolve the same field.
pub fn pick<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    if let Some(found) = data.as_object().and_then(|map| map.get(path)) {
        return Some(found);
    }
    let parts = segments(path).ok()?;
    let mut current = data;
    for part in &parts {
        current = match part {
            Segment::Key(key) => current.as_object()?.get(key)?,
            Segment::Index(i) => current.as_array()?.get(*i)?,
        };
    }
    Some(current)
}

/// Writes `value` at `parts` inside `target`, creating objects and arrays on
/// the way. Missing array slots are filled with `null`.
pub fn insert(target: &mut Value, parts: &[Segment], value: Value) {
    let Some((first, rest)) = parts.split_first() else {
        *target = value;
        return;
    };
    match first {
        Segment::Key(key) => {
            if !target.is_object() {
                *target = Value::Object(Map::new());
            }
            if let Value::Object(map) = target {
                let slot = map.entry(key.clone()).or_insert(Value::Null);
                insert(slot, rest, value);
            }
        }
        Segment::Index(index) => {
            if !target.is_array() {
                *target = Value::Array(Vec::new());
            }
            if let Value::Array(items) = target {
                if items.len() <= *index {
                    items.resize(*index + 1, Value::Null);
                }
                insert(&mut items[*index], rest, value);
            }
        }
    }
}
