#![forbid(unsafe_code)]

use super::clock::ts_ms_to_rfc3339;
use super::index::{RoadmapIndex, entry_for};
use super::migrate::migrate_legacy_into_default;
use super::{KvStore, StoreError};
use rb_core::graph::{Connection, Node, PROGRESS_STEPS, connection_id, normalize_color};
use rb_core::ids::RoadmapId;
use serde_json::{Value, json};

pub const APP_VERSION: &str = "1.2.2";

pub const DEFAULT_FONT_SIZE: u32 = 14;
pub const MIN_FONT_SIZE: u32 = 10;
pub const MAX_FONT_SIZE: u32 = 32;

/// Storage keys, wire-compatible with earlier releases.
pub const DOCUMENT_KEY_PREFIX: &str = "erby_roadmap_";
pub const INDEX_KEY: &str = "erby_roadmap_list";
pub const LEGACY_DOCUMENT_KEY: &str = "roadmapData";
pub const LEGACY_NOTEPAD_KEY: &str = "roadmapNotepad";
pub const LEGACY_FONT_SIZE_KEY: &str = "notepadFontSize";

pub fn storage_key_for(roadmap_id: &str) -> String {
    format!("{DOCUMENT_KEY_PREFIX}{roadmap_id}")
}

/// The unit of persistence: one roadmap's full state. The in-memory
/// graph is a working copy checked out from exactly one of these.
#[derive(Clone, Debug, PartialEq)]
pub struct RoadmapDocument {
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
    pub notepad: String,
    pub notepad_font_size: u32,
    pub version: String,
    pub last_modified: String,
    pub name: String,
}

impl Default for RoadmapDocument {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            connections: Vec::new(),
            notepad: String::new(),
            notepad_font_size: DEFAULT_FONT_SIZE,
            version: APP_VERSION.to_string(),
            last_modified: String::new(),
            name: String::new(),
        }
    }
}

/// Clamps a stored font size into the supported range; anything that
/// is not an integer yields the default.
pub fn font_size_from(value: Option<&Value>) -> u32 {
    match value.and_then(Value::as_i64) {
        Some(raw) => raw.clamp(MIN_FONT_SIZE as i64, MAX_FONT_SIZE as i64) as u32,
        None => DEFAULT_FONT_SIZE,
    }
}

pub fn decode_document(raw: &str) -> Result<RoadmapDocument, serde_json::Error> {
    let value: Value = serde_json::from_str(raw)?;
    Ok(decode_document_value(&value))
}

/// Schema-validated restoration with documented defaults: missing
/// colour falls back to the default colour, progress is resized to
/// exactly twelve 0/1 entries, nodes without an id are dropped.
pub fn decode_document_value(value: &Value) -> RoadmapDocument {
    RoadmapDocument {
        nodes: decode_nodes(value.get("nodes")),
        connections: decode_connections(value.get("connections")),
        notepad: str_field(value, "notepad"),
        notepad_font_size: font_size_from(value.get("notepadFontSize")),
        version: value
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or(APP_VERSION)
            .to_string(),
        last_modified: str_field(value, "lastModified"),
        name: str_field(value, "name"),
    }
}

fn str_field(value: &Value, field: &str) -> String {
    value
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

pub fn decode_nodes(value: Option<&Value>) -> Vec<Node> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut nodes = Vec::with_capacity(items.len());
    for item in items {
        match decode_node(item) {
            Some(node) => nodes.push(node),
            None => eprintln!("dropping stored node without a usable id"),
        }
    }
    nodes
}

fn decode_node(value: &Value) -> Option<Node> {
    let id = value.get("id").and_then(Value::as_str)?.trim();
    if id.is_empty() {
        return None;
    }
    let mut progress = [0u8; PROGRESS_STEPS];
    if let Some(raw) = value.get("progress").and_then(Value::as_array) {
        for (slot, entry) in progress.iter_mut().zip(raw.iter()) {
            *slot = match entry.as_i64() {
                Some(0) | None => 0,
                Some(_) => 1,
            };
        }
    }
    Some(Node {
        id: id.to_string(),
        title: str_field(value, "title"),
        description: str_field(value, "description"),
        x: value.get("x").and_then(Value::as_f64).unwrap_or(0.0),
        y: value.get("y").and_then(Value::as_f64).unwrap_or(0.0),
        color: normalize_color(value.get("color").and_then(Value::as_str).unwrap_or("")),
        progress,
        locked: value.get("locked").and_then(Value::as_bool).unwrap_or(false),
    })
}

pub fn decode_connections(value: Option<&Value>) -> Vec<Connection> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut connections = Vec::with_capacity(items.len());
    for item in items {
        let from_id = item.get("fromId").and_then(Value::as_str).unwrap_or("");
        let to_id = item.get("toId").and_then(Value::as_str).unwrap_or("");
        if from_id.is_empty() || to_id.is_empty() {
            eprintln!("dropping stored connection with a missing endpoint");
            continue;
        }
        let id = match item.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => connection_id(from_id, to_id),
        };
        connections.push(Connection {
            id,
            from_id: from_id.to_string(),
            to_id: to_id.to_string(),
        });
    }
    connections
}

pub fn document_to_value(doc: &RoadmapDocument) -> Value {
    json!({
        "nodes": doc.nodes.iter().map(node_to_value).collect::<Vec<_>>(),
        "connections": doc.connections.iter().map(connection_to_value).collect::<Vec<_>>(),
        "notepad": doc.notepad,
        "notepadFontSize": doc.notepad_font_size,
        "version": doc.version,
        "lastModified": doc.last_modified,
        "name": doc.name,
    })
}

pub fn node_to_value(node: &Node) -> Value {
    json!({
        "id": node.id,
        "title": node.title,
        "description": node.description,
        "x": node.x,
        "y": node.y,
        "color": node.color,
        "progress": node.progress.to_vec(),
        "locked": node.locked,
    })
}

pub fn connection_to_value(conn: &Connection) -> Value {
    json!({
        "id": conn.id,
        "fromId": conn.from_id,
        "toId": conn.to_id,
    })
}

/// Durable read/write of one roadmap document, including the legacy
/// migration chain for the default slot.
#[derive(Debug)]
pub struct DocumentStore<'a> {
    kv: &'a KvStore,
}

impl<'a> DocumentStore<'a> {
    pub fn new(kv: &'a KvStore) -> Self {
        Self { kv }
    }

    pub fn kv(&self) -> &KvStore {
        self.kv
    }

    pub fn exists(&self, id: &RoadmapId) -> Result<bool, StoreError> {
        self.kv.contains(&storage_key_for(id.as_str()))
    }

    /// Loads the namespaced record. Malformed JSON is logged and
    /// treated as absent data; an absent `"default"` slot triggers the
    /// legacy migration chain. Anything else absent yields an empty
    /// document.
    pub fn load(&self, id: &RoadmapId, now_ms: i64) -> Result<RoadmapDocument, StoreError> {
        if let Some(raw) = self.kv.get(&storage_key_for(id.as_str()))? {
            match decode_document(&raw) {
                Ok(doc) => return Ok(doc),
                Err(err) => eprintln!("failed to parse roadmap '{id}': {err}"),
            }
        } else if id.is_default() {
            if let Some(doc) = migrate_legacy_into_default(self.kv, now_ms)? {
                return Ok(doc);
            }
        }
        Ok(RoadmapDocument::default())
    }

    /// Serializes and writes the full document, stamping identity and
    /// `lastModified`, then refreshes the index entry.
    pub fn save(
        &self,
        id: &RoadmapId,
        doc: &mut RoadmapDocument,
        now_ms: i64,
    ) -> Result<(), StoreError> {
        doc.last_modified = ts_ms_to_rfc3339(now_ms);
        doc.name = id.as_str().to_string();
        doc.version = APP_VERSION.to_string();
        let raw = document_to_value(doc).to_string();
        self.kv.set(&storage_key_for(id.as_str()), &raw)?;
        RoadmapIndex::new(self.kv).upsert(entry_for(id.as_str(), doc))
    }

    pub fn create_empty(
        &self,
        id: &RoadmapId,
        now_ms: i64,
    ) -> Result<RoadmapDocument, StoreError> {
        let mut doc = RoadmapDocument::default();
        self.save(id, &mut doc, now_ms)?;
        Ok(doc)
    }

    /// Copies a document's record to a new key, rewriting its identity
    /// fields and refreshing `lastModified`. Unknown or unparseable
    /// sources fail with `false`, never a hard error.
    pub fn duplicate(
        &self,
        source: &RoadmapId,
        target: &RoadmapId,
        now_ms: i64,
    ) -> Result<bool, StoreError> {
        let Some(raw) = self.kv.get(&storage_key_for(source.as_str()))? else {
            return Ok(false);
        };
        let mut value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                eprintln!("cannot duplicate roadmap '{source}': {err}");
                return Ok(false);
            }
        };
        rewrite_identity(&mut value, target.as_str());
        if let Some(map) = value.as_object_mut() {
            map.insert(
                "lastModified".to_string(),
                Value::String(ts_ms_to_rfc3339(now_ms)),
            );
        }
        self.kv
            .set(&storage_key_for(target.as_str()), &value.to_string())?;
        let doc = decode_document_value(&value);
        RoadmapIndex::new(self.kv).upsert(entry_for(target.as_str(), &doc))?;
        Ok(true)
    }

    /// Moves a record under a new id. Fails with `false` when the ids
    /// match or the source record is missing; the matching index entry
    /// is rewritten in place.
    pub fn rename(
        &self,
        old: &RoadmapId,
        new: &RoadmapId,
        now_ms: i64,
    ) -> Result<bool, StoreError> {
        if old == new {
            return Ok(false);
        }
        let Some(raw) = self.kv.get(&storage_key_for(old.as_str()))? else {
            return Ok(false);
        };
        let mut value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                eprintln!("cannot rename roadmap '{old}': {err}");
                return Ok(false);
            }
        };
        rewrite_identity(&mut value, new.as_str());
        self.kv
            .set(&storage_key_for(new.as_str()), &value.to_string())?;
        self.kv.remove(&storage_key_for(old.as_str()))?;

        let doc = decode_document_value(&value);
        let mut entry = entry_for(new.as_str(), &doc);
        entry.last_modified = ts_ms_to_rfc3339(now_ms);
        RoadmapIndex::new(self.kv).replace_in_place(old.as_str(), entry)?;
        Ok(true)
    }

    /// Removes the record and its index entry. Refusing to delete the
    /// active roadmap is the caller's precondition, enforced before
    /// this runs.
    pub fn delete(&self, id: &RoadmapId) -> Result<(), StoreError> {
        self.kv.remove(&storage_key_for(id.as_str()))?;
        RoadmapIndex::new(self.kv).remove(id.as_str())
    }
}

/// Rewrites the `roadmapId`/`name` identity fields while preserving
/// any unknown fields the record may carry.
fn rewrite_identity(value: &mut Value, id: &str) {
    if let Some(map) = value.as_object_mut() {
        map.insert("roadmapId".to_string(), Value::String(id.to_string()));
        map.insert("name".to_string(), Value::String(id.to_string()));
    }
}
