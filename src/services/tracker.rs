// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Group tracking service.
//!
//! Validates input, runs the read-modify-write sequences against a
//! [`GroupStore`], and derives dashboards from snapshots:
//! 1. Validate (no storage call on failure)
//! 2. Read the current document
//! 3. Compute the replacement
//! 4. Write it back whole

use serde::Serialize;

use crate::db::{GroupStore, Subscription};
use crate::error::{AppError, Result};
use crate::models::{
    create_entry, DistanceInput, Entry, ExportFile, Group, Milestone, SegmentMilestone,
};
use crate::services::aggregation::{Aggregate, FeedEntry, Standing};
use crate::services::milestone_edit::{
    normalize_for_save, reorder, to_segment_view, MilestoneEdit,
};
use crate::services::progress::Progress;
use crate::time_utils::today;

/// Everything a client shows for a group, derived from one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub group_id: String,
    pub feed: Vec<FeedEntry>,
    pub leaderboard: Vec<Standing>,
    pub group_total: f64,
    pub progress: Progress,
}

impl Dashboard {
    /// Recompute from scratch; no state is carried between snapshots.
    pub fn from_group(group: &Group) -> Self {
        let aggregate = Aggregate::compute(&group.members);
        let leaderboard = aggregate.leaderboard();
        let progress = Progress::compute(&group.milestones, aggregate.group_total);

        Self {
            group_id: group.id.clone(),
            feed: aggregate.feed,
            leaderboard,
            group_total: aggregate.group_total,
            progress,
        }
    }
}

/// Raw entry input as submitted by a client.
#[derive(Debug, Clone, Default)]
pub struct EntryInput {
    pub distance: Option<DistanceInput>,
    pub date: Option<String>,
    pub note: Option<String>,
}

/// Tracking operations over any group store.
pub struct GroupService<S> {
    store: S,
}

impl<S: GroupStore> GroupService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn dashboard(&self, group_id: &str) -> Result<Dashboard> {
        let group = self.store.load_group(group_id).await?;
        Ok(Dashboard::from_group(&group))
    }

    pub async fn subscribe(&self, group_id: &str) -> Result<Subscription> {
        self.store.subscribe_group(group_id).await
    }

    /// Log an entry for `member`, creating the member on first use.
    pub async fn log_entry(
        &self,
        group_id: &str,
        member: Option<&str>,
        input: &EntryInput,
    ) -> Result<Entry> {
        let member = member
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or(AppError::MissingIdentity)?;

        let entry = create_entry(
            input.distance.as_ref(),
            input.date.as_deref(),
            input.note.as_deref(),
            today(),
        )?;

        let current = self.store.load_member_entries(group_id, member).await?;
        let mut entries = Vec::with_capacity(current.len() + 1);
        entries.push(entry.clone());
        entries.extend(current);

        self.store
            .save_member_entries(group_id, member, &entries)
            .await?;

        tracing::info!(
            group_id,
            member,
            entry_id = %entry.id,
            distance_km = entry.distance_km,
            "Entry logged"
        );
        Ok(entry)
    }

    /// Remove one entry. Returns `false` if no entry had that id, in which
    /// case nothing is written.
    pub async fn remove_entry(&self, group_id: &str, member: &str, entry_id: &str) -> Result<bool> {
        let current = self.store.load_member_entries(group_id, member).await?;
        let before = current.len();
        let remaining: Vec<Entry> = current.into_iter().filter(|e| e.id != entry_id).collect();

        if remaining.len() == before {
            tracing::debug!(group_id, member, entry_id, "No entry to remove");
            return Ok(false);
        }

        self.store
            .save_member_entries(group_id, member, &remaining)
            .await?;

        tracing::info!(group_id, member, entry_id, "Entry removed");
        Ok(true)
    }

    /// The route in editable segment form.
    pub async fn milestone_segments(&self, group_id: &str) -> Result<Vec<SegmentMilestone>> {
        let group = self.store.load_group(group_id).await?;
        Ok(to_segment_view(&group.milestones))
    }

    /// Normalize an edited segment list and store it as the route.
    pub async fn save_milestone_segments(
        &self,
        group_id: &str,
        segments: &[SegmentMilestone],
    ) -> Result<Vec<Milestone>> {
        let milestones = normalize_for_save(segments);
        self.store.save_milestones(group_id, &milestones).await?;

        tracing::info!(group_id, count = milestones.len(), "Route updated");
        Ok(milestones)
    }

    /// Move one milestone within the route. Out-of-range moves change nothing.
    pub async fn reorder_milestones(
        &self,
        group_id: &str,
        from: usize,
        to: usize,
    ) -> Result<Vec<Milestone>> {
        let segments = self.milestone_segments(group_id).await?;
        if from >= segments.len() || to >= segments.len() || from == to {
            tracing::debug!(group_id, from, to, "Reorder is a no-op");
            return Ok(self.store.load_group(group_id).await?.milestones);
        }
        self.save_milestone_segments(group_id, &reorder(&segments, from, to))
            .await
    }

    /// Apply one administrative edit to the route and store the result.
    pub async fn edit_milestones(
        &self,
        group_id: &str,
        edit: &MilestoneEdit,
    ) -> Result<Vec<Milestone>> {
        let segments = self.milestone_segments(group_id).await?;
        tracing::debug!(group_id, ?edit, "Editing route");
        self.save_milestone_segments(group_id, &edit.apply(&segments))
            .await
    }

    /// Delete all members, keeping the route.
    pub async fn reset(&self, group_id: &str) -> Result<usize> {
        self.store.reset_group(group_id).await
    }

    pub async fn export(&self, group_id: &str) -> Result<ExportFile> {
        let group = self.store.load_group(group_id).await?;
        Ok(ExportFile::from_group(&group))
    }

    /// Replace the route and every member from an export file.
    ///
    /// The file is fully validated before anything is written.
    pub async fn import(&self, group_id: &str, raw: &str) -> Result<Group> {
        let file = ExportFile::parse(raw)?;

        self.store.save_milestones(group_id, &file.milestones).await?;
        self.store.reset_group(group_id).await?;
        for (name, member) in &file.members {
            self.store
                .save_member_entries(group_id, name, &member.entries)
                .await?;
        }

        tracing::info!(
            group_id,
            milestones = file.milestones.len(),
            members = file.members.len(),
            "Group imported"
        );

        self.store.load_group(group_id).await
    }
}
