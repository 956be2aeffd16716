//! Attribute-pattern algebra seam
//!
//! The engine consumes pattern union and data filtering through the
//! [`AttributeAlgebra`] trait rather than implementing glob matching
//! itself. [`FlatUnion`] is the shipped implementation, sufficient for
//! plain attribute lists, whole-object grants and dotted-path selection;
//! richer glob semantics (wildcard segments, pattern overlap resolution)
//! belong to an external implementation of the trait.

use serde_json::{Map, Value};

/// Set algebra over attribute-pattern lists and pattern-based filtering.
///
/// `union` combines two pattern lists into their semantic union; `filter`
/// produces a deep-cloned copy of `data` containing only the attributes the
/// pattern list allows.
pub trait AttributeAlgebra {
    /// Semantic union of two attribute-pattern lists
    fn union(&self, a: &[String], b: &[String]) -> Vec<String>;

    /// Deep-cloned, pattern-filtered copy of the given data
    fn filter(&self, data: &Value, attributes: &[String]) -> Value;
}

/// Plain-list attribute algebra.
///
/// `union` is an order-preserving unique concatenation (first occurrence
/// wins position). `filter` understands three pattern shapes: the empty
/// list (nothing passes), `*` (everything passes), and plain dotted paths,
/// optionally combined with `!`-prefixed exclusions.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatUnion;

impl AttributeAlgebra for FlatUnion {
    fn union(&self, a: &[String], b: &[String]) -> Vec<String> {
        let mut out: Vec<String> = a.to_vec();
        for item in b {
            if !out.contains(item) {
                out.push(item.clone());
            }
        }
        out
    }

    fn filter(&self, data: &Value, attributes: &[String]) -> Value {
        if attributes.is_empty() {
            return Value::Object(Map::new());
        }
        match data {
            Value::Array(items) => {
                Value::Array(items.iter().map(|v| self.filter(v, attributes)).collect())
            }
            Value::Object(_) => {
                let includes: Vec<&str> = attributes
                    .iter()
                    .filter(|a| !a.starts_with('!'))
                    .map(String::as_str)
                    .collect();
                let excludes: Vec<&str> = attributes
                    .iter()
                    .filter_map(|a| a.strip_prefix('!'))
                    .collect();

                let mut out = if includes.iter().any(|a| *a == "*") {
                    data.clone()
                } else {
                    let mut map = Map::new();
                    for path in includes {
                        if let Some(value) = lookup_path(data, path) {
                            insert_path(&mut map, path, value.clone());
                        }
                    }
                    Value::Object(map)
                };

                for path in excludes {
                    remove_path(&mut out, path);
                }
                out
            }
            _ => Value::Object(Map::new()),
        }
    }
}

fn lookup_path<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    match path.split_once('.') {
        None => data.get(path),
        Some((head, rest)) => lookup_path(data.get(head)?, rest),
    }
}

fn insert_path(out: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            out.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = out
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Some(obj) = entry.as_object_mut() {
                insert_path(obj, rest, value);
            }
        }
    }
}

fn remove_path(data: &mut Value, path: &str) {
    match path.split_once('.') {
        None => {
            if let Some(obj) = data.as_object_mut() {
                obj.remove(path);
            }
        }
        Some((head, rest)) => {
            if let Some(next) = data.get_mut(head) {
                remove_path(next, rest);
            }
        }
    }
}
