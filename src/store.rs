// ABOUTME: Session store — the persisted list of sessions the user has started.
// ABOUTME: Keyed by session id in memory, saved as a JSON array with atomic tmp + rename writes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One remembered session, created when its first message is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub first_message: String,
    /// Creation time in epoch milliseconds.
    pub timestamp: i64,
}

impl SessionRecord {
    /// Whether the record is younger than `window` at `now_ms`.
    pub fn is_fresh(&self, now_ms: i64, window: Duration) -> bool {
        let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
        now_ms.saturating_sub(self.timestamp) < window_ms
    }
}

/// The session list backed by a single JSON file.
///
/// Every mutation re-reads the file, applies the change, and writes the whole
/// list back, so the file stays the source of truth.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    records: BTreeMap<String, SessionRecord>,
}

impl SessionStore {
    /// Open the store at `path`. A missing file is an empty store; an unreadable
    /// or corrupt one is logged and treated as empty.
    pub fn load(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let records = read_records(&path);
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.records.contains_key(session_id)
    }

    pub fn get(&self, session_id: &str) -> Option<&SessionRecord> {
        self.records.get(session_id)
    }

    /// Re-read the file so the in-memory view matches what is on disk.
    pub fn reload(&mut self) {
        self.records = read_records(&self.path);
    }

    /// Records younger than `window`, oldest first. Storage is not rewritten.
    pub fn fresh_records(&self, now_ms: i64, window: Duration) -> Vec<SessionRecord> {
        let mut fresh: Vec<SessionRecord> = self
            .records
            .values()
            .filter(|r| r.is_fresh(now_ms, window))
            .cloned()
            .collect();
        fresh.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        fresh
    }

    /// Remember a session by its first message. Does nothing if the session is
    /// already stored. Returns whether a record was created.
    pub fn record_first_message(
        &mut self,
        session_id: &str,
        first_message: &str,
        now_ms: i64,
    ) -> anyhow::Result<bool> {
        self.reload();
        if self.records.contains_key(session_id) {
            return Ok(false);
        }
        self.records.insert(
            session_id.to_string(),
            SessionRecord {
                session_id: session_id.to_string(),
                first_message: first_message.to_string(),
                timestamp: now_ms,
            },
        );
        self.save()?;
        tracing::debug!(session_id, "stored new session record");
        Ok(true)
    }

    /// Forget the session with exactly this id, leaving all others untouched.
    pub fn remove(&mut self, session_id: &str) -> anyhow::Result<Option<SessionRecord>> {
        self.reload();
        let removed = self.records.remove(session_id);
        if removed.is_some() {
            self.save()?;
            tracing::debug!(session_id, "removed session record");
        }
        Ok(removed)
    }

    /// Write the full list to disk (atomic write via tmp + rename).
    fn save(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let list: Vec<&SessionRecord> = self.records.values().collect();
        let content = serde_json::to_string_pretty(&list)?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &content)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

fn read_records(path: &Path) -> BTreeMap<String, SessionRecord> {
    if !path.exists() {
        return BTreeMap::new();
    }
    let parsed = std::fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|content| {
            serde_json::from_str::<Vec<SessionRecord>>(&content).map_err(anyhow::Error::from)
        });
    match parsed {
        Ok(list) => {
            let mut records = BTreeMap::new();
            for record in list {
                // First occurrence wins, matching the first-send rule.
                records.entry(record.session_id.clone()).or_insert(record);
            }
            records
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable session store");
            BTreeMap::new()
        }
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
