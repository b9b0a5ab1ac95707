//! Append-only JSON history of refinement runs.
//!
//! The log is a single pretty-printed JSON array. Each save loads the array,
//! appends, and rewrites the file. A missing or unreadable log counts as an
//! empty history.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{RefinementRun, Result};
use crate::obs;

/// One persisted run with the time it was saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub saved_at: DateTime<Utc>,
    #[serde(flatten)]
    pub run: RefinementRun,
}

/// Raw entries of the log; anything unreadable yields an empty list.
async fn load_raw(path: &Path) -> Vec<Value> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "audit log unreadable; starting fresh"
            );
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<Value>>(&text) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "audit log corrupt; starting fresh");
            Vec::new()
        }
    }
}

/// Append a run to the log. Returns the number of entries now stored.
pub async fn append_run(path: &Path, run: &RefinementRun) -> Result<usize> {
    let mut entries = load_raw(path).await;

    let entry = AuditEntry {
        saved_at: Utc::now(),
        run: run.clone(),
    };
    entries.push(serde_json::to_value(&entry)?);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let text = serde_json::to_string_pretty(&entries)?;
    tokio::fs::write(path, text).await?;

    obs::emit_audit_saved(&path.display().to_string(), entries.len());
    Ok(entries.len())
}

/// Entries that parse as runs; others are skipped.
pub async fn load_entries(path: &Path) -> Vec<AuditEntry> {
    load_raw(path)
        .await
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RunOutcome, VerificationMode};
    use crate::generation::GenerationParams;

    fn finished_run() -> RefinementRun {
        RefinementRun::start(
            "and gate",
            VerificationMode::CompileOnly,
            1,
            GenerationParams::default(),
        )
        .finalize(RunOutcome::Success { iterations_used: 1 })
    }

    #[tokio::test]
    async fn test_entry_flattens_run_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        append_run(&path, &finished_run()).await.unwrap();

        let raw: Vec<Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw.len(), 1);
        assert!(raw[0].get("saved_at").is_some());
        assert_eq!(raw[0]["intent"], "and gate");
        assert_eq!(raw[0]["final_outcome"]["type"], "success");
    }
}
