use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{ServiceError, ServiceResult};
use crate::storage::KeyValueStore;
use crate::types::{AppView, Board, ProjectDraft, SavedProject};

/// Entry holding the whole saved-project list.
pub const PROJECTS_KEY: &str = "makerforge_saved_projects";
pub const UNTITLED: &str = "Untitled Project";

/// Lenient on-disk shape. Older versions wrote records without a title.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredProject {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    timestamp: Option<i64>,
    board: Board,
    #[serde(default)]
    view: AppView,
    #[serde(default)]
    topic: String,
    #[serde(default)]
    content: String,
}

impl StoredProject {
    fn migrate(self) -> SavedProject {
        let title = match self.title {
            Some(title) if !title.trim().is_empty() => title,
            _ if !self.topic.trim().is_empty() => self.topic.clone(),
            _ => UNTITLED.to_string(),
        };
        let timestamp = self
            .timestamp
            .or_else(|| self.id.parse::<i64>().ok())
            .unwrap_or_default();
        SavedProject {
            id: self.id,
            title,
            timestamp,
            board: self.board,
            view: self.view,
            topic: self.topic,
            content: self.content,
        }
    }
}

/// Saved projects, newest first, mirrored to a key-value entry on every
/// change.
pub struct ProjectStore {
    kv: Arc<dyn KeyValueStore>,
    projects: Vec<SavedProject>,
    last_timestamp: i64,
}

impl ProjectStore {
    /// Read the persisted list. Never fails: a missing or unreadable entry
    /// gives an empty list and bad records are dropped.
    pub fn load(kv: Arc<dyn KeyValueStore>) -> Self {
        let projects = match kv.get(PROJECTS_KEY) {
            Ok(Some(blob)) => parse_blob(&blob),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read saved projects");
                Vec::new()
            }
        };
        let last_timestamp = projects.iter().map(|p| p.timestamp).max().unwrap_or(0);
        tracing::debug!(count = projects.len(), "saved projects loaded");
        Self {
            kv,
            projects,
            last_timestamp,
        }
    }

    pub fn projects(&self) -> &[SavedProject] {
        &self.projects
    }

    pub fn get(&self, id: &str) -> Option<&SavedProject> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Store a new project at the front of the list and rewrite the entry.
    pub fn save(&mut self, draft: ProjectDraft) -> ServiceResult<SavedProject> {
        if draft.title.trim().is_empty() {
            return Err(ServiceError::Input(
                "A project title is required.".to_string(),
            ));
        }

        let timestamp = self.next_timestamp()?;
        let project = SavedProject {
            id: timestamp.to_string(),
            title: draft.title.trim().to_string(),
            timestamp,
            board: draft.board,
            view: draft.view,
            topic: draft.topic,
            content: draft.content,
        };

        let mut updated = Vec::with_capacity(self.projects.len() + 1);
        updated.push(project.clone());
        updated.extend(self.projects.iter().cloned());
        self.persist(&updated)?;

        self.projects = updated;
        self.last_timestamp = timestamp;
        tracing::info!(id = %project.id, title = %project.title, "project saved");
        Ok(project)
    }

    /// Remove the project with `id`. Returns `false` when there was none,
    /// in which case nothing is written.
    pub fn delete(&mut self, id: &str) -> ServiceResult<bool> {
        if self.get(id).is_none() {
            return Ok(false);
        }
        let updated: Vec<SavedProject> = self
            .projects
            .iter()
            .filter(|p| p.id != id)
            .cloned()
            .collect();
        self.persist(&updated)?;
        self.projects = updated;
        tracing::info!(id, "project deleted");
        Ok(true)
    }

    fn persist(&self, projects: &[SavedProject]) -> ServiceResult<()> {
        let blob = serde_json::to_string(projects)?;
        self.kv.set(PROJECTS_KEY, &blob)?;
        Ok(())
    }

    /// Milliseconds since the epoch, bumped past the newest project so ids
    /// stay unique even within the same millisecond.
    fn next_timestamp(&self) -> ServiceResult<i64> {
        let exhausted = || {
            ServiceError::FromString(
                "no project id left after the newest saved timestamp".to_string(),
            )
        };
        let floor = self.last_timestamp.checked_add(1).ok_or_else(exhausted)?;
        let mut candidate = Utc::now().timestamp_millis().max(floor);
        while self.projects.iter().any(|p| p.id == candidate.to_string()) {
            candidate = candidate.checked_add(1).ok_or_else(exhausted)?;
        }
        Ok(candidate)
    }
}

fn parse_blob(blob: &str) -> Vec<SavedProject> {
    let records: Vec<serde_json::Value> = match serde_json::from_str(blob) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(error = %e, "saved projects entry is malformed; starting empty");
            return Vec::new();
        }
    };

    records
        .into_iter()
        .enumerate()
        .filter_map(
            |(index, record)| match serde_json::from_value::<StoredProject>(record) {
                Ok(stored) => Some(stored.migrate()),
                Err(e) => {
                    tracing::warn!(index, error = %e, "skipping unreadable saved project");
                    None
                }
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, MemoryStore};

    fn draft(title: &str) -> ProjectDraft {
        ProjectDraft {
            title: title.to_string(),
            board: Board::Esp32,
            view: AppView::Sensors,
            topic: format!("{title} topic"),
            content: format!("# {title}"),
        }
    }

    fn empty_store() -> (Arc<MemoryStore>, ProjectStore) {
        let kv = Arc::new(MemoryStore::new());
        let store = ProjectStore::load(kv.clone());
        (kv, store)
    }

    #[test]
    fn save_then_load_returns_project_first() {
        let (kv, mut store) = empty_store();
        store.save(draft("older")).unwrap();
        let saved = store.save(draft("Weather station")).unwrap();

        let reloaded = ProjectStore::load(kv);
        assert_eq!(reloaded.projects()[0], saved);
        assert_eq!(reloaded.len(), 2);
    }

    #[test]
    fn sequential_saves_are_newest_first() {
        let (_kv, mut store) = empty_store();
        for i in 0..5 {
            store.save(draft(&format!("p{i}"))).unwrap();
        }
        let titles: Vec<&str> = store.projects().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["p4", "p3", "p2", "p1", "p0"]);
        assert!(
            store
                .projects()
                .windows(2)
                .all(|w| w[0].timestamp > w[1].timestamp)
        );
    }

    #[test]
    fn deleting_unknown_id_changes_nothing() {
        let (kv, mut store) = empty_store();
        store.save(draft("keep")).unwrap();
        let before = kv.get(PROJECTS_KEY).unwrap();

        assert!(!store.delete("does-not-exist").unwrap());
        assert_eq!(store.len(), 1);
        assert_eq!(kv.get(PROJECTS_KEY).unwrap(), before);
    }

    #[test]
    fn delete_rewrites_entry() {
        let (kv, mut store) = empty_store();
        let a = store.save(draft("a")).unwrap();
        let b = store.save(draft("b")).unwrap();

        assert!(store.delete(&a.id).unwrap());
        let reloaded = ProjectStore::load(kv);
        assert_eq!(reloaded.projects(), &[b]);
    }

    #[test]
    fn legacy_record_gets_title_from_topic() {
        let blob = r##"[{"id":"1","topic":"Blink LED","board":"ESP32","timestamp":1,"view":"sensors","content":"# Blink"},
                       {"id":"2","topic":"","board":"Arduino Nano","timestamp":2,"view":"games","content":""}]"##;
        let store = ProjectStore::load(Arc::new(MemoryStore::with_entry(PROJECTS_KEY, blob)));

        assert_eq!(store.projects()[0].title, "Blink LED");
        assert_eq!(store.projects()[0].board, Board::Esp32);
        assert_eq!(store.projects()[1].title, UNTITLED);
    }

    #[test]
    fn malformed_entry_loads_empty() {
        for blob in ["{not json", "{\"id\":\"1\"}", "42"] {
            let store = ProjectStore::load(Arc::new(MemoryStore::with_entry(PROJECTS_KEY, blob)));
            assert!(store.is_empty(), "{blob}");
        }
    }

    #[test]
    fn unreadable_records_are_skipped() {
        let blob = r#"[{"id":"1","title":"ok","topic":"t","board":"pico-w","timestamp":1,"view":"network","content":"c"},
                       {"id":"2","title":"bad","topic":"t","board":"Teensy 4.1","timestamp":2,"view":"network","content":"c"}]"#;
        let store = ProjectStore::load(Arc::new(MemoryStore::with_entry(PROJECTS_KEY, blob)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.projects()[0].board, Board::PicoW);
    }

    #[test]
    fn ids_never_collide_with_existing_timestamps() {
        let future = Utc::now().timestamp_millis() + 60_000;
        let blob = format!(
            r#"[{{"id":"{future}","title":"t","topic":"t","board":"ESP32","timestamp":{future},"view":"home","content":""}}]"#
        );
        let mut store = ProjectStore::load(Arc::new(MemoryStore::with_entry(PROJECTS_KEY, &blob)));
        let saved = store.save(draft("next")).unwrap();
        assert!(saved.timestamp > future);
        assert_eq!(store.projects()[0].id, saved.id);
    }

    #[test]
    fn save_after_maximum_timestamp_fails_cleanly() {
        let blob = format!(
            r#"[{{"id":"x","title":"t","topic":"t","board":"ESP32","timestamp":{},"view":"home","content":""}}]"#,
            i64::MAX
        );
        let kv = Arc::new(MemoryStore::with_entry(PROJECTS_KEY, &blob));
        let mut store = ProjectStore::load(kv.clone());
        assert_eq!(store.len(), 1);

        let err = store.save(draft("overflow")).unwrap_err();
        assert!(!err.is_input());
        assert_eq!(store.len(), 1);
        assert_eq!(kv.get(PROJECTS_KEY).unwrap().as_deref(), Some(blob.as_str()));
    }

    #[test]
    fn blank_title_is_rejected() {
        let (kv, mut store) = empty_store();
        let err = store.save(draft("  ")).unwrap_err();
        assert!(err.is_input());
        assert_eq!(kv.get(PROJECTS_KEY).unwrap(), None);
    }

    #[test]
    fn file_backed_store_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let kv: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(dir.path()));
        let mut store = ProjectStore::load(kv.clone());
        let saved = store.save(draft("disk")).unwrap();

        let reloaded = ProjectStore::load(kv);
        assert_eq!(reloaded.get(&saved.id), Some(&saved));
    }
}
