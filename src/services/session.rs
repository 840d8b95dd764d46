// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The group a client is currently watching.

use crate::db::{GroupStore, Subscription};
use crate::error::Result;
use crate::services::tracker::GroupService;

/// Holds at most one live subscription.
///
/// Switching groups cancels the old subscription before opening the new
/// one, so snapshots from the previous group are never delivered after a
/// switch.
#[derive(Default)]
pub struct ActiveGroup {
    current: Option<Subscription>,
}

impl ActiveGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group_id(&self) -> Option<&str> {
        self.current.as_ref().map(Subscription::group_id)
    }

    /// Watch `group_id` instead of whatever was watched before.
    pub async fn switch_to<S: GroupStore>(
        &mut self,
        service: &GroupService<S>,
        group_id: &str,
    ) -> Result<&mut Subscription> {
        if let Some(previous) = self.current.take() {
            tracing::debug!(from = previous.group_id(), to = group_id, "Switching group");
            previous.cancel();
        }

        let subscription = service.subscribe(group_id).await?;
        Ok(self.current.insert(subscription))
    }

    /// The live subscription, if any.
    pub fn subscription(&mut self) -> Option<&mut Subscription> {
        self.current.as_mut()
    }

    /// Stop watching.
    pub fn clear(&mut self) {
        if let Some(previous) = self.current.take() {
            previous.cancel();
        }
    }
}
