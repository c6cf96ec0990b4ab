#![forbid(unsafe_code)]

use rb_core::ids::RoadmapId;
use rb_storage::{
    RoadmapDocument, decode_document_value, document_to_value, ts_ms_to_date, ts_ms_to_rfc3339,
};
use serde_json::Value;

/// A file the UI boundary offers for download: suggested name plus the
/// full contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub contents: String,
}

/// Full-document JSON export: the persisted record shape plus an
/// export stamp and the roadmap identity.
pub fn export_document_json(doc: &RoadmapDocument, id: &RoadmapId, now_ms: i64) -> ExportFile {
    let mut value = document_to_value(doc);
    if let Some(map) = value.as_object_mut() {
        map.insert(
            "exportDate".to_string(),
            Value::String(ts_ms_to_rfc3339(now_ms)),
        );
        map.insert(
            "roadmapId".to_string(),
            Value::String(id.as_str().to_string()),
        );
        map.insert(
            "roadmapName".to_string(),
            Value::String(id.as_str().to_string()),
        );
    }
    let contents = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
    ExportFile {
        filename: format!("ERBY_{}_{}.json", id, ts_ms_to_date(now_ms)),
        contents,
    }
}

/// Self-contained styled HTML snapshot of the notepad content, with
/// the current font size inlined.
pub fn export_notes_html(notepad: &str, font_size: u32, now_ms: i64) -> ExportFile {
    let exported_at = ts_ms_to_rfc3339(now_ms);
    let contents = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>ERBY notes</title>
    <style>
        body {{ font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; line-height: 1.6; padding: 20px; background: #383838; color: #ffffff; }}
        .content {{ max-width: 800px; margin: 0 auto; background: #474747; padding: 30px; border: 24px double #383838; }}
        .header {{ text-align: center; margin-bottom: 30px; padding-bottom: 15px; border-bottom: 2px solid #e4a700; }}
        .date {{ color: #e4a700; font-size: 14px; }}
        h1 {{ color: #f0f0f0; }}
        code {{ background: rgba(0, 0, 0, 0.3); padding: 2px 6px; border-radius: 3px; font-family: 'Courier New', monospace; color: #ffd700; }}
        a {{ color: #64b5f6; text-decoration: underline; }}
        b, strong {{ font-weight: bold; }}
        i, em {{ font-style: italic; }}
        u {{ text-decoration: underline; }}
        ul {{ padding-left: 20px; }}
        .exported-content {{ white-space: pre-wrap; font-size: {font_size}px; }}
    </style>
</head>
<body>
    <div class="content">
        <div class="header">
            <h1>ERBY notes</h1>
            <div class="date">Exported {exported_at}</div>
        </div>
        <div class="exported-content">{notepad}</div>
    </div>
</body>
</html>"#
    );
    ExportFile {
        filename: format!("ERBY_notes_{}.html", ts_ms_to_date(now_ms)),
        contents,
    }
}

/// What to do with an imported file: store it as a new roadmap, or
/// merge it into the currently open one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportDecision {
    LoadAsNew,
    MergeIntoCurrent,
}

#[derive(Clone, Debug)]
pub struct ImportPayload {
    /// Roadmap id carried by the file, when present and valid.
    pub roadmap_id: Option<RoadmapId>,
    pub document: RoadmapDocument,
    /// Whether the file carried a font size at all; a merge leaves the
    /// current size alone when it did not.
    pub has_font_size: bool,
}

pub fn parse_import(raw: &str) -> Result<ImportPayload, serde_json::Error> {
    let value: Value = serde_json::from_str(raw)?;
    let roadmap_id = value
        .get("roadmapId")
        .and_then(Value::as_str)
        .and_then(|id| RoadmapId::try_new(id).ok());
    Ok(ImportPayload {
        roadmap_id,
        document: decode_document_value(&value),
        has_font_size: value.get("notepadFontSize").is_some(),
    })
}

/// Fallback id for files that do not carry one, derived from the
/// clock's last six digits like the ids the original app generated.
pub fn generated_import_id(now_ms: i64) -> RoadmapId {
    let digits = now_ms.unsigned_abs().to_string();
    let suffix = if digits.len() > 6 {
        digits[digits.len() - 6..].to_string()
    } else {
        digits
    };
    RoadmapId::try_new(format!("imported_{suffix}")).unwrap_or_else(|_| RoadmapId::default_id())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_carries_identity_and_stamp() {
        let doc = RoadmapDocument {
            notepad: "hello".to_string(),
            ..RoadmapDocument::default()
        };
        let id = RoadmapId::try_new("work").unwrap();
        let file = export_document_json(&doc, &id, 1_700_000_000_000);
        assert_eq!(file.filename, "ERBY_work_2023-11-14.json");

        let value: Value = serde_json::from_str(&file.contents).unwrap();
        assert_eq!(value["roadmapId"], "work");
        assert_eq!(value["roadmapName"], "work");
        assert_eq!(value["notepad"], "hello");
        assert!(value["exportDate"].as_str().unwrap().starts_with("2023-11-14"));
    }

    #[test]
    fn notes_html_is_self_contained() {
        let file = export_notes_html("<b>bold</b>", 18, 1_700_000_000_000);
        assert_eq!(file.filename, "ERBY_notes_2023-11-14.html");
        assert!(file.contents.starts_with("<!DOCTYPE html>"));
        assert!(file.contents.contains("font-size: 18px"));
        assert!(file.contents.contains("<b>bold</b>"));
    }

    #[test]
    fn import_parses_document_and_optional_id() {
        let payload = parse_import(
            r#"{"roadmapId":"from-file","nodes":[{"id":"n1"}],"connections":[],"notepad":"n"}"#,
        )
        .unwrap();
        assert_eq!(payload.roadmap_id.unwrap().as_str(), "from-file");
        assert_eq!(payload.document.nodes.len(), 1);

        let no_id = parse_import(r#"{"nodes":[]}"#).unwrap();
        assert!(no_id.roadmap_id.is_none());

        assert!(parse_import("{bad").is_err());
    }

    #[test]
    fn generated_import_ids_use_clock_suffix() {
        let id = generated_import_id(1_700_000_123_456);
        assert_eq!(id.as_str(), "imported_123456");
        assert_eq!(generated_import_id(42).as_str(), "imported_42");
    }
}
