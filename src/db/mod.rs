// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer: the group store contract and its two backends.
//!
//! - [`LocalStore`]: a JSON snapshot file, written through on every mutation.
//! - [`FirestoreDb`]: Firestore documents behind an anonymous identity gate.
//!
//! Both publish snapshots to a [`SnapshotHub`] so subscribers see the same
//! stream of group states regardless of backend.

pub mod firestore;
pub mod hub;
pub mod identity;
pub mod local;

pub use firestore::FirestoreDb;
pub use hub::{GroupChange, PollerGuard, SnapshotHub, Subscription};
pub use identity::AnonymousIdentity;
pub use local::LocalStore;

use crate::error::Result;
use crate::models::{Entry, Group, Milestone};
use std::future::Future;

/// Collection names as constants.
pub mod collections {
    /// Group documents (route), keyed by group id
    pub const GROUPS: &str = "groups";
    /// Member documents, a subcollection of each group keyed by member name
    pub const MEMBERS: &str = "members";
}

/// Load/save contract for group state.
///
/// Every write replaces a whole document. Entry mutation is a
/// read-modify-write by the caller and is not transactional: two clients
/// editing the same member at once can lose one write.
pub trait GroupStore: Send + Sync {
    /// Load a group, creating it with the default route if it does not exist.
    fn load_group(&self, group_id: &str) -> impl Future<Output = Result<Group>> + Send;

    /// Subscribe to a group. The first item is its current state.
    fn subscribe_group(&self, group_id: &str)
        -> impl Future<Output = Result<Subscription>> + Send;

    /// Current entries of one member (empty if the member does not exist).
    fn load_member_entries(
        &self,
        group_id: &str,
        member: &str,
    ) -> impl Future<Output = Result<Vec<Entry>>> + Send;

    /// Replace a member's entire entry list.
    fn save_member_entries(
        &self,
        group_id: &str,
        member: &str,
        entries: &[Entry],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Replace the group's route (cumulative form).
    fn save_milestones(
        &self,
        group_id: &str,
        milestones: &[Milestone],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Delete every member document, keeping the route. Returns the number
    /// of members removed.
    fn reset_group(&self, group_id: &str) -> impl Future<Output = Result<usize>> + Send;
}

/// Storage backend selected by configuration.
pub enum Backend {
    Local(LocalStore),
    Firestore(FirestoreDb),
}

impl GroupStore for Backend {
    async fn load_group(&self, group_id: &str) -> Result<Group> {
        match self {
            Backend::Local(store) => store.load_group(group_id).await,
            Backend::Firestore(store) => store.load_group(group_id).await,
        }
    }

    async fn subscribe_group(&self, group_id: &str) -> Result<Subscription> {
        match self {
            Backend::Local(store) => store.subscribe_group(group_id).await,
            Backend::Firestore(store) => store.subscribe_group(group_id).await,
        }
    }

    async fn load_member_entries(&self, group_id: &str, member: &str) -> Result<Vec<Entry>> {
        match self {
            Backend::Local(store) => store.load_member_entries(group_id, member).await,
            Backend::Firestore(store) => store.load_member_entries(group_id, member).await,
        }
    }

    async fn save_member_entries(
        &self,
        group_id: &str,
        member: &str,
        entries: &[Entry],
    ) -> Result<()> {
        match self {
            Backend::Local(store) => store.save_member_entries(group_id, member, entries).await,
            Backend::Firestore(store) => {
                store.save_member_entries(group_id, member, entries).await
            }
        }
    }

    async fn save_milestones(&self, group_id: &str, milestones: &[Milestone]) -> Result<()> {
        match self {
            Backend::Local(store) => store.save_milestones(group_id, milestones).await,
            Backend::Firestore(store) => store.save_milestones(group_id, milestones).await,
        }
    }

    async fn reset_group(&self, group_id: &str) -> Result<usize> {
        match self {
            Backend::Local(store) => store.reset_group(group_id).await,
            Backend::Firestore(store) => store.reset_group(group_id).await,
        }
    }
}
