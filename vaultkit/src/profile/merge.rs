//! JSON settings merge.

use crate::error::Result;
use serde_json::Value;
use std::path::Path;

/// Reads and writes JSON documents.
pub trait JsonStore: Sync {
    fn exists(&self, path: &Path) -> bool;
    fn read_json(&self, path: &Path) -> Result<Value>;
    /// Write `value` pretty-printed with two-space indentation.
    fn write_json(&self, path: &Path, value: &Value) -> Result<()>;
}

/// [`JsonStore`] backed by the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsJsonStore;

impl JsonStore for FsJsonStore {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_json(&self, path: &Path) -> Result<Value> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn write_json(&self, path: &Path, value: &Value) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut json = serde_json::to_string_pretty(value)?;
        json.push('\n');
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Merge a source settings document into a destination one.
///
/// - two arrays: union, destination items first, duplicates dropped
/// - one array: that array, source first
/// - two objects: shallow merge, source keys win
/// - scalar or null source onto an object: the destination, unchanged
/// - otherwise: the source value
pub fn merge_json(source: Value, destination: Value) -> Value {
    match (source, destination) {
        (Value::Array(src), Value::Array(dst)) => {
            let mut merged: Vec<Value> = Vec::with_capacity(src.len() + dst.len());
            for item in dst.into_iter().chain(src) {
                if !merged.contains(&item) {
                    merged.push(item);
                }
            }
            Value::Array(merged)
        }
        (src @ Value::Array(_), _) => src,
        (_, dst @ Value::Array(_)) => dst,
        (Value::Object(src), Value::Object(mut dst)) => {
            for (key, value) in src {
                dst.insert(key, value);
            }
            Value::Object(dst)
        }
        (Value::Object(src), _) => Value::Object(src),
        // Nothing to spread from a scalar, so the object settings survive.
        (_, dst @ Value::Object(_)) => dst,
        (src, _) => src,
    }
}

/// Read, merge and write back one settings document.
///
/// A missing destination counts as an empty object.
pub fn merge_json_file(store: &dyn JsonStore, source: &Path, destination: &Path) -> Result<()> {
    let source_value = store.read_json(source)?;
    let destination_value = if store.exists(destination) {
        store.read_json(destination)?
    } else {
        Value::Object(serde_json::Map::new())
    };

    let merged = merge_json(source_value, destination_value);
    store.write_json(destination, &merged)
}
