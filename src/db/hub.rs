// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process fan-out of group snapshots to subscribers.
//!
//! Each group id owns one `watch` channel. Stores publish the full group
//! after every write they observe; unchanged snapshots are not re-delivered.
//!
//! Publishing must happen in the order the underlying state changed. The
//! local store publishes while it still holds its state lock; the remote
//! store takes the group's [`SnapshotHub::refresh_lock`] around every
//! read-then-publish cycle.

use dashmap::DashMap;
use futures_util::Stream;
use std::sync::{Arc, Weak};
use tokio::sync::{watch, Mutex};
use tokio::task::AbortHandle;

use crate::models::{Group, Membership, Milestone};

type Slot = Option<Arc<Group>>;

/// Background task feeding a group's channel. Aborted when the last
/// subscription holding it goes away.
#[derive(Debug)]
pub struct PollerGuard(AbortHandle);

impl PollerGuard {
    pub fn new(handle: AbortHandle) -> Self {
        Self(handle)
    }
}

impl Drop for PollerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Registry of per-group snapshot channels.
#[derive(Default)]
pub struct SnapshotHub {
    channels: DashMap<String, watch::Sender<Slot>>,
    pollers: DashMap<String, Weak<PollerGuard>>,
    refresh_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SnapshotHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a snapshot. Returns `true` if it differed from the last one.
    pub fn publish(&self, group: Group) -> bool {
        let sender = self
            .channels
            .entry(group.id.clone())
            .or_insert_with(|| watch::channel(None).0);

        sender.send_if_modified(move |current| {
            if current.as_deref() == Some(&group) {
                false
            } else {
                *current = Some(Arc::new(group));
                true
            }
        })
    }

    /// True if anyone is listening on this group.
    pub fn has_subscribers(&self, group_id: &str) -> bool {
        self.channels
            .get(group_id)
            .is_some_and(|sender| sender.receiver_count() > 0)
    }

    /// Lock serializing read-then-publish cycles for one group, so a slow
    /// read can never publish over a newer one.
    pub fn refresh_lock(&self, group_id: &str) -> Arc<Mutex<()>> {
        self.refresh_locks
            .entry(group_id.to_string())
            .or_default()
            .clone()
    }

    /// The group's running poller, or a new one from `spawn` if none is
    /// alive. All subscriptions on a group share one poller.
    pub fn poller(
        &self,
        group_id: &str,
        spawn: impl FnOnce() -> AbortHandle,
    ) -> Arc<PollerGuard> {
        let mut slot = self.pollers.entry(group_id.to_string()).or_default();
        if let Some(running) = slot.upgrade() {
            return running;
        }

        let guard = Arc::new(PollerGuard::new(spawn()));
        *slot = Arc::downgrade(&guard);
        tracing::debug!(group_id, "Poller started");
        guard
    }

    /// Open a subscription on a group.
    ///
    /// The subscription keeps `poller` alive; it stops once every
    /// subscription sharing it is cancelled or dropped.
    pub fn subscribe(&self, group_id: &str, poller: Option<Arc<PollerGuard>>) -> Subscription {
        let receiver = self
            .channels
            .entry(group_id.to_string())
            .or_insert_with(|| watch::channel(None).0)
            .subscribe();

        tracing::debug!(group_id, "Subscription opened");

        Subscription {
            group_id: group_id.to_string(),
            receiver,
            poller,
            delivered_first: false,
            last: None,
        }
    }
}

/// What changed between two consecutive snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupChange {
    pub snapshot: Arc<Group>,
    /// Set when the route changed (always set on the first delivery)
    pub milestones: Option<Vec<Milestone>>,
    /// Set when membership changed (always set on the first delivery)
    pub members: Option<Membership>,
}

/// A live, non-restartable sequence of group snapshots.
///
/// The first item is the state at subscription time; later items follow
/// every observed change, including this process's own writes. The sequence
/// ends only when the subscription is cancelled or dropped.
pub struct Subscription {
    group_id: String,
    receiver: watch::Receiver<Slot>,
    poller: Option<Arc<PollerGuard>>,
    delivered_first: bool,
    last: Option<Arc<Group>>,
}

impl Subscription {
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Wait for the next snapshot.
    pub async fn next(&mut self) -> Option<Arc<Group>> {
        if !self.delivered_first {
            self.delivered_first = true;
            let current = self.receiver.borrow_and_update().clone();
            if current.is_some() {
                return current;
            }
        }

        loop {
            self.receiver.changed().await.ok()?;
            let snapshot = self.receiver.borrow_and_update().clone();
            if snapshot.is_some() {
                return snapshot;
            }
        }
    }

    /// Wait for the next snapshot and split it into route and membership
    /// changes.
    pub async fn next_change(&mut self) -> Option<GroupChange> {
        let snapshot = self.next().await?;
        let previous = self.last.replace(snapshot.clone());

        let milestones = match &previous {
            Some(prev) if prev.milestones == snapshot.milestones => None,
            _ => Some(snapshot.milestones.clone()),
        };
        let members = match &previous {
            Some(prev) if prev.members == snapshot.members => None,
            _ => Some(snapshot.members.clone()),
        };

        Some(GroupChange {
            snapshot,
            milestones,
            members,
        })
    }

    /// Consume the subscription as a stream of snapshots.
    pub fn into_stream(self) -> impl Stream<Item = Arc<Group>> + Send {
        futures_util::stream::unfold(self, |mut sub| async move {
            sub.next().await.map(|snapshot| (snapshot, sub))
        })
    }

    /// Stop delivery. Consumes the handle, so it runs exactly once.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.poller.take();
        tracing::debug!(group_id = %self.group_id, "Subscription closed");
    }
}
