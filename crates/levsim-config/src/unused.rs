use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::warn;

use crate::consumption::consumed_pointers;

const PREVIEW: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    /// JSON pointers of leaves no registered key covers (sorted).
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Walk a merged config document and list the leaves the simulator never reads.
/// `Fail` turns a non-empty report into an error; `Warn` logs it.
pub fn report_unused_keys(config_json: &Value, policy: UnusedKeyPolicy) -> Result<UnusedKeyReport> {
    let registry: BTreeSet<&str> = consumed_pointers().iter().copied().collect();

    let mut unused = Vec::new();
    walk(config_json, &mut String::new(), &registry, &mut unused);
    unused.sort();

    let report = UnusedKeyReport {
        unused_leaf_pointers: unused,
    };
    if report.is_clean() {
        return Ok(report);
    }

    let n = report.unused_leaf_pointers.len();
    let preview = &report.unused_leaf_pointers[..n.min(PREVIEW)];
    match policy {
        UnusedKeyPolicy::Fail => bail!(
            "CONFIG_UNUSED_KEYS: {n} config key(s) are not read by the simulator. \
            Remove them or register them. First few: {preview:?}"
        ),
        UnusedKeyPolicy::Warn => warn!(count = n, keys = ?preview, "unused config keys"),
    }
    Ok(report)
}

/// Depth-first; a registered pointer covers its whole subtree.
fn walk(v: &Value, path: &mut String, registry: &BTreeSet<&str>, out: &mut Vec<String>) {
    if !path.is_empty() && registry.contains(path.as_str()) {
        return;
    }

    let mark = path.len();
    match v {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                path.push('/');
                push_escaped(path, key);
                walk(child, path, registry, out);
                path.truncate(mark);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (i, child) in items.iter().enumerate() {
                path.push('/');
                path.push_str(&i.to_string());
                walk(child, path, registry, out);
                path.truncate(mark);
            }
        }
        _ if path.is_empty() => {}
        _ => out.push(path.clone()),
    }
}

/// RFC 6901 token escaping.
fn push_escaped(path: &mut String, token: &str) {
    for c in token.chars() {
        match c {
            '~' => path.push_str("~0"),
            '/' => path.push_str("~1"),
            c => path.push(c),
        }
    }
}
