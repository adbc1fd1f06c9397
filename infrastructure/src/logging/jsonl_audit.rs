//! JSONL file writer for audit events.
//!
//! Each [`AuditEvent`] is serialized as a single JSON line with `type`,
//! `timestamp` and the deliberation/requester ids, appended to the file via
//! a buffered writer. Existing content is kept across restarts.

use council_application::{AuditEvent, AuditLogger};
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// JSONL audit logger that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every event and
/// on `Drop`.
pub struct JsonlAuditLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlAuditLogger {
    /// Open (or create) the audit log at the given path.
    ///
    /// Creates parent directories if needed. Returns `None` if the file
    /// cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create audit log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open audit log file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn to_record(event: AuditEvent) -> Value {
    let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

    let mut map = match event.payload {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            map
        }
    };
    map.insert(
        "type".to_string(),
        Value::String(event.action.as_str().to_string()),
    );
    map.insert("timestamp".to_string(), Value::String(timestamp));
    if let Some(id) = event.deliberation_id {
        map.insert("deliberation_id".to_string(), Value::String(id.to_string()));
    }
    if let Some(requester) = event.requester_id {
        map.insert(
            "requester_id".to_string(),
            Value::String(requester.to_string()),
        );
    }
    Value::Object(map)
}

impl AuditLogger for JsonlAuditLogger {
    fn log(&self, event: AuditEvent) {
        let Ok(line) = serde_json::to_string(&to_record(event)) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlAuditLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_application::AuditAction;
    use council_domain::DeliberationId;
    use serde_json::json;

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_one_object_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let logger = JsonlAuditLogger::new(&path).unwrap();
        let id = DeliberationId::new();

        logger.log(
            AuditEvent::new(
                AuditAction::Query,
                json!({ "query_length": 24, "responders": 4 }),
            )
            .for_deliberation(id)
            .by("alice".into()),
        );
        logger.log(AuditEvent::new(
            AuditAction::HealthTransition,
            json!({ "responder_id": "b", "old": "healthy", "new": "unhealthy" }),
        ));
        drop(logger);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "query");
        assert_eq!(lines[0]["deliberation_id"], id.to_string());
        assert_eq!(lines[0]["requester_id"], "alice");
        assert_eq!(lines[0]["query_length"], 24);
        assert!(lines[0]["timestamp"].is_string());

        assert_eq!(lines[1]["type"], "health_transition");
        assert!(lines[1].get("deliberation_id").is_none());
        assert_eq!(lines[1]["new"], "unhealthy");
    }

    #[test]
    fn test_appends_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("audit.jsonl");

        let logger = JsonlAuditLogger::new(&path).unwrap();
        logger.log(AuditEvent::new(AuditAction::Access, json!({})));
        drop(logger);

        let logger = JsonlAuditLogger::new(&path).unwrap();
        assert_eq!(logger.path(), path);
        logger.log(AuditEvent::new(AuditAction::Flag, json!({ "reason": "x" })));
        drop(logger);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "access");
        assert_eq!(lines[1]["type"], "flag");
    }

    #[test]
    fn test_non_object_payload_is_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let logger = JsonlAuditLogger::new(&path).unwrap();
        logger.log(AuditEvent::new(AuditAction::Access, json!("just a string")));
        drop(logger);

        let lines = read_lines(&path);
        assert_eq!(lines[0]["data"], "just a string");
        assert_eq!(lines[0]["type"], "access");
    }
}
