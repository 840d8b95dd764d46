// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local snapshot store.
//!
//! The whole state lives in memory and is written through to one JSON file
//! on every mutation. Reads and writes are synchronous; consistency holds
//! within a single process only.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::db::{GroupStore, SnapshotHub, Subscription};
use crate::error::{AppError, Result};
use crate::models::{default_milestones, Entry, Group, GroupDoc, MemberDoc, Milestone};
use crate::time_utils::now_millis;

/// On-disk layout: every group with its member documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LocalSnapshot {
    #[serde(default)]
    groups: BTreeMap<String, StoredGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredGroup {
    group: GroupDoc,
    #[serde(default)]
    members: BTreeMap<String, MemberDoc>,
}

impl StoredGroup {
    fn new_default() -> Self {
        Self {
            group: GroupDoc {
                milestones: default_milestones(),
                updated_at: now_millis(),
            },
            members: BTreeMap::new(),
        }
    }

    fn to_group(&self, group_id: &str) -> Group {
        Group::from_documents(group_id, self.group.clone(), self.members.clone())
    }
}

/// Group store backed by a local JSON snapshot.
pub struct LocalStore {
    path: Option<PathBuf>,
    state: Mutex<LocalSnapshot>,
    hub: Arc<SnapshotHub>,
}

impl LocalStore {
    /// Open the snapshot at `path`, starting empty if the file does not exist.
    pub fn open(path: impl AsRef<Path>, hub: Arc<SnapshotHub>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|e| {
                AppError::PersistenceUnavailable(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                ))
            })?;
            serde_json::from_str(&raw).map_err(|e| {
                AppError::PersistenceUnavailable(format!(
                    "Corrupt snapshot {}: {}",
                    path.display(),
                    e
                ))
            })?
        } else {
            LocalSnapshot::default()
        };

        tracing::info!(
            path = %path.display(),
            groups = state.groups.len(),
            "Opened local store"
        );

        Ok(Self {
            path: Some(path),
            state: Mutex::new(state),
            hub,
        })
    }

    /// A store that never touches disk (tests, demos).
    pub fn in_memory(hub: Arc<SnapshotHub>) -> Self {
        Self {
            path: None,
            state: Mutex::new(LocalSnapshot::default()),
            hub,
        }
    }

    /// Write the full state to disk via a temp file and rename.
    fn persist(&self, state: &LocalSnapshot) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let io_err = |e: std::io::Error| {
            AppError::PersistenceUnavailable(format!("Failed to write {}: {}", path.display(), e))
        };

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(state)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Snapshot encoding failed: {}", e)))?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }

    /// Apply `f` to a group, creating it first if needed, and write through.
    ///
    /// The in-memory state is replaced only after the write succeeds. The
    /// snapshot is published before the lock is released, so subscribers
    /// see writes in the order they were applied.
    fn mutate<T>(&self, group_id: &str, f: impl FnOnce(&mut StoredGroup) -> T) -> Result<T> {
        let mut state = self.lock()?;
        let mut next = state.clone();
        let stored = next
            .groups
            .entry(group_id.to_string())
            .or_insert_with(StoredGroup::new_default);
        let out = f(stored);
        let group = stored.to_group(group_id);

        self.persist(&next)?;
        *state = next;
        self.hub.publish(group);
        Ok(out)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, LocalSnapshot>> {
        self.state
            .lock()
            .map_err(|_| AppError::PersistenceUnavailable("Local store lock poisoned".to_string()))
    }

    fn read_group(&self, group_id: &str) -> Result<Group> {
        let existing = self
            .lock()?
            .groups
            .get(group_id)
            .map(|stored| stored.to_group(group_id));

        match existing {
            Some(group) => Ok(group),
            None => {
                tracing::info!(group_id, "Creating group with default route");
                self.mutate(group_id, |stored| stored.to_group(group_id))
            }
        }
    }
}

impl GroupStore for LocalStore {
    async fn load_group(&self, group_id: &str) -> Result<Group> {
        self.read_group(group_id)
    }

    async fn subscribe_group(&self, group_id: &str) -> Result<Subscription> {
        self.read_group(group_id)?;
        {
            let state = self.lock()?;
            if let Some(stored) = state.groups.get(group_id) {
                self.hub.publish(stored.to_group(group_id));
            }
        }
        Ok(self.hub.subscribe(group_id, None))
    }

    async fn load_member_entries(&self, group_id: &str, member: &str) -> Result<Vec<Entry>> {
        Ok(self
            .lock()?
            .groups
            .get(group_id)
            .and_then(|stored| stored.members.get(member))
            .map(|doc| doc.entries.clone())
            .unwrap_or_default())
    }

    async fn save_member_entries(
        &self,
        group_id: &str,
        member: &str,
        entries: &[Entry],
    ) -> Result<()> {
        self.mutate(group_id, |stored| {
            stored.members.insert(
                member.to_string(),
                MemberDoc {
                    entries: entries.to_vec(),
                    updated_at: now_millis(),
                },
            );
        })?;
        tracing::debug!(group_id, member, entries = entries.len(), "Saved member entries");
        Ok(())
    }

    async fn save_milestones(&self, group_id: &str, milestones: &[Milestone]) -> Result<()> {
        self.mutate(group_id, |stored| {
            stored.group = GroupDoc {
                milestones: milestones.to_vec(),
                updated_at: now_millis(),
            };
        })?;
        tracing::debug!(group_id, count = milestones.len(), "Saved milestones");
        Ok(())
    }

    async fn reset_group(&self, group_id: &str) -> Result<usize> {
        let removed = self.mutate(group_id, |stored| {
            let count = stored.members.len();
            stored.members.clear();
            count
        })?;
        tracing::info!(group_id, removed, "Group reset");
        Ok(removed)
    }
}
