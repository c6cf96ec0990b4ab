#![forbid(unsafe_code)]

use super::clock::rfc3339_to_ts_ms;
use super::document::{INDEX_KEY, RoadmapDocument, decode_document, storage_key_for};
use super::{KvStore, StoreError};
use serde_json::{Value, json};

/// Summary metadata for one known roadmap, kept in a single JSON array
/// record sorted most-recently-modified first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    pub id: String,
    pub name: String,
    pub last_modified: String,
    pub node_count: usize,
    pub connection_count: usize,
}

pub fn entry_for(id: &str, doc: &RoadmapDocument) -> IndexEntry {
    IndexEntry {
        id: id.to_string(),
        name: id.to_string(),
        last_modified: doc.last_modified.clone(),
        node_count: doc.nodes.len(),
        connection_count: doc.connections.len(),
    }
}

/// The browsable catalog of roadmaps, maintained alongside every
/// document write, rename and delete.
#[derive(Debug)]
pub struct RoadmapIndex<'a> {
    kv: &'a KvStore,
}

impl<'a> RoadmapIndex<'a> {
    pub fn new(kv: &'a KvStore) -> Self {
        Self { kv }
    }

    /// Reads the whole index; a missing or corrupt record yields an
    /// empty list with a log line, never a failure.
    pub fn list(&self) -> Result<Vec<IndexEntry>, StoreError> {
        let Some(raw) = self.kv.get(INDEX_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => Ok(decode_entries(&value)),
            Err(err) => {
                eprintln!("failed to parse roadmap index: {err}");
                Ok(Vec::new())
            }
        }
    }

    /// Replace-by-id or append, then re-sort descending by
    /// `lastModified`. Entries with unparseable stamps sort last.
    pub fn upsert(&self, entry: IndexEntry) -> Result<(), StoreError> {
        let mut entries = self.list()?;
        match entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        entries.sort_by(|a, b| {
            rfc3339_to_ts_ms(&b.last_modified).cmp(&rfc3339_to_ts_ms(&a.last_modified))
        });
        self.write(&entries)
    }

    pub fn remove(&self, id: &str) -> Result<(), StoreError> {
        let mut entries = self.list()?;
        entries.retain(|e| e.id != id);
        self.write(&entries)
    }

    /// Rewrites the entry with id `old_id` in place (no re-sort); used
    /// by rename. Appends when no such entry exists, so a rename never
    /// drops a roadmap from the catalog.
    pub fn replace_in_place(&self, old_id: &str, entry: IndexEntry) -> Result<(), StoreError> {
        let mut entries = self.list()?;
        match entries.iter_mut().find(|e| e.id == old_id) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        self.write(&entries)
    }

    /// Re-derives node/connection counts for every entry by reading
    /// the corresponding document, correcting any drift. Returns how
    /// many entries changed. Missing or unreadable documents leave
    /// their entries untouched.
    pub fn recalculate(&self) -> Result<usize, StoreError> {
        let mut entries = self.list()?;
        let mut corrected = 0usize;
        for entry in entries.iter_mut() {
            let Some(raw) = self.kv.get(&storage_key_for(&entry.id))? else {
                continue;
            };
            let doc = match decode_document(&raw) {
                Ok(doc) => doc,
                Err(err) => {
                    eprintln!("skipping stats for roadmap '{}': {err}", entry.id);
                    continue;
                }
            };
            if entry.node_count != doc.nodes.len()
                || entry.connection_count != doc.connections.len()
            {
                entry.node_count = doc.nodes.len();
                entry.connection_count = doc.connections.len();
                corrected += 1;
            }
        }
        if corrected > 0 {
            self.write(&entries)?;
        }
        Ok(corrected)
    }

    fn write(&self, entries: &[IndexEntry]) -> Result<(), StoreError> {
        let value = Value::Array(entries.iter().map(entry_to_value).collect());
        self.kv.set(INDEX_KEY, &value.to_string())
    }
}

fn entry_to_value(entry: &IndexEntry) -> Value {
    json!({
        "id": entry.id,
        "name": entry.name,
        "lastModified": entry.last_modified,
        "nodeCount": entry.node_count,
        "connectionCount": entry.connection_count,
    })
}

fn decode_entries(value: &Value) -> Vec<IndexEntry> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        let Some(id) = item.get("id").and_then(Value::as_str) else {
            continue;
        };
        entries.push(IndexEntry {
            id: id.to_string(),
            name: item
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(id)
                .to_string(),
            last_modified: item
                .get("lastModified")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            node_count: count_field(item, "nodeCount"),
            connection_count: count_field(item, "connectionCount"),
        });
    }
    entries
}

fn count_field(value: &Value, field: &str) -> usize {
    value
        .get(field)
        .and_then(Value::as_u64)
        .map(|v| v as usize)
        .unwrap_or(0)
}
