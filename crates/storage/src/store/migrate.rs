#![forbid(unsafe_code)]

use super::document::{
    DocumentStore, LEGACY_DOCUMENT_KEY, LEGACY_FONT_SIZE_KEY, LEGACY_NOTEPAD_KEY, RoadmapDocument,
    decode_connections, decode_nodes, font_size_from,
};
use super::{KvStore, StoreError};
use rb_core::ids::RoadmapId;
use serde_json::Value;

/// One generation of the pre-index on-disk schema: a precondition over
/// the legacy keys and a transform producing the migrated document.
/// Steps run in order; the first applicable one wins. Transforms have
/// no side effects of their own, so an aborted step leaves storage
/// untouched.
struct MigrationStep {
    name: &'static str,
    applies: fn(&KvStore) -> Result<bool, StoreError>,
    transform: fn(&KvStore) -> Result<Option<RoadmapDocument>, StoreError>,
}

fn migration_steps() -> [MigrationStep; 2] {
    [
        MigrationStep {
            name: "single-roadmap blob",
            applies: |kv| kv.contains(LEGACY_DOCUMENT_KEY),
            transform: transform_legacy_blob,
        },
        MigrationStep {
            name: "freestanding notepad",
            applies: |kv| kv.contains(LEGACY_NOTEPAD_KEY),
            transform: transform_freestanding_notepad,
        },
    ]
}

/// Runs the legacy chain for the `"default"` slot: on success the
/// migrated document is saved under the namespaced key, registered in
/// the index, and the legacy keys are deleted. Idempotent; a second
/// run finds no legacy keys and is a no-op. Invalid legacy JSON aborts
/// with a log line and no side effects.
pub fn migrate_legacy_into_default(
    kv: &KvStore,
    now_ms: i64,
) -> Result<Option<RoadmapDocument>, StoreError> {
    for step in migration_steps() {
        if !(step.applies)(kv)? {
            continue;
        }
        let Some(mut doc) = (step.transform)(kv)? else {
            return Ok(None);
        };
        DocumentStore::new(kv).save(&RoadmapId::default_id(), &mut doc, now_ms)?;
        for key in [LEGACY_DOCUMENT_KEY, LEGACY_NOTEPAD_KEY, LEGACY_FONT_SIZE_KEY] {
            kv.remove(key)?;
        }
        eprintln!("migrated legacy {} into the default roadmap", step.name);
        return Ok(Some(doc));
    }
    Ok(None)
}

/// Oldest generation: one flat JSON blob holding the whole roadmap.
/// The freestanding notepad and font-size keys fill in fields the blob
/// may lack.
fn transform_legacy_blob(kv: &KvStore) -> Result<Option<RoadmapDocument>, StoreError> {
    let Some(raw) = kv.get(LEGACY_DOCUMENT_KEY)? else {
        return Ok(None);
    };
    let value: Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            eprintln!("legacy roadmap blob is not valid JSON, leaving it alone: {err}");
            return Ok(None);
        }
    };
    let mut doc = RoadmapDocument {
        nodes: decode_nodes(value.get("nodes")),
        connections: decode_connections(value.get("connections")),
        ..RoadmapDocument::default()
    };
    doc.notepad = match value.get("notepad").and_then(Value::as_str) {
        Some(notepad) if !notepad.is_empty() => notepad.to_string(),
        _ => kv.get(LEGACY_NOTEPAD_KEY)?.unwrap_or_default(),
    };
    doc.notepad_font_size = match value.get("notepadFontSize") {
        Some(size) => font_size_from(Some(size)),
        None => legacy_font_size(kv)?,
    };
    Ok(Some(doc))
}

/// Middle generation: no blob, just the notepad text (and optionally a
/// font size) under flat keys.
fn transform_freestanding_notepad(kv: &KvStore) -> Result<Option<RoadmapDocument>, StoreError> {
    let Some(notepad) = kv.get(LEGACY_NOTEPAD_KEY)? else {
        return Ok(None);
    };
    let mut doc = RoadmapDocument {
        notepad,
        ..RoadmapDocument::default()
    };
    doc.notepad_font_size = legacy_font_size(kv)?;
    Ok(Some(doc))
}

fn legacy_font_size(kv: &KvStore) -> Result<u32, StoreError> {
    let raw = kv.get(LEGACY_FONT_SIZE_KEY)?;
    let parsed = raw.as_deref().and_then(|v| v.trim().parse::<i64>().ok());
    Ok(font_size_from(parsed.map(Value::from).as_ref()))
}
