// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Aggregation of member entries into totals and an activity feed.
//!
//! Everything here is a pure function of the membership mapping, so it is
//! recomputed from scratch on every snapshot instead of being patched.

use serde::Serialize;
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{Entry, Membership};

/// An entry tagged with the member who logged it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FeedEntry {
    pub member: String,
    #[serde(flatten)]
    pub entry: Entry,
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Standing {
    pub rank: usize,
    pub member: String,
    pub total_km: f64,
}

/// Totals and feed derived from a group's membership.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregate {
    /// All entries, most recent date first
    pub feed: Vec<FeedEntry>,
    /// Sum of entry distances per member
    pub per_member_total: BTreeMap<String, f64>,
    /// Sum of all member totals
    pub group_total: f64,
}

impl Aggregate {
    /// Aggregate every member's entries.
    pub fn compute(members: &Membership) -> Self {
        let mut feed = Vec::new();
        let mut per_member_total = BTreeMap::new();

        for (name, member) in members {
            let total: f64 = member
                .entries
                .iter()
                .map(|e| usable_km(e.distance_km))
                .sum();
            per_member_total.insert(name.clone(), total);

            feed.extend(member.entries.iter().map(|entry| FeedEntry {
                member: name.clone(),
                entry: entry.clone(),
            }));
        }

        // Stable: entries sharing a date keep their iteration order.
        feed.sort_by(|a, b| b.entry.date_iso.cmp(&a.entry.date_iso));

        let group_total = per_member_total.values().sum();

        Self {
            feed,
            per_member_total,
            group_total,
        }
    }

    /// Members by total, highest first. Ties keep name order.
    pub fn leaderboard(&self) -> Vec<Standing> {
        let mut rows: Vec<(&String, f64)> = self
            .per_member_total
            .iter()
            .map(|(name, total)| (name, *total))
            .collect();
        rows.sort_by(|a, b| b.1.total_cmp(&a.1));

        rows.into_iter()
            .enumerate()
            .map(|(idx, (name, total))| Standing {
                rank: idx + 1,
                member: name.clone(),
                total_km: total,
            })
            .collect()
    }
}

fn usable_km(km: f64) -> f64 {
    if km.is_finite() {
        km
    } else {
        0.0
    }
}
