// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod entry;
pub mod group;
pub mod milestone;
pub(crate) mod number;

pub use entry::{create_entry, DistanceInput, Entry};
pub use group::{ExportFile, ExportedMember, Group, GroupDoc, Member, MemberDoc, Membership};
pub use milestone::{default_milestones, Milestone, SegmentMilestone};

/// Generate a fresh opaque identifier for entries and milestones.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
