// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route progress: reached milestones and the next stop.
//!
//! All comparisons use cumulative distances. Callers holding segment form
//! must convert with [`crate::services::milestone_edit::to_cumulative_view`].

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::Milestone;

/// First milestone strictly beyond `group_total`, or the last milestone once
/// the whole route is covered. `None` for an empty route.
pub fn next_milestone(milestones: &[Milestone], group_total: f64) -> Option<&Milestone> {
    milestones
        .iter()
        .find(|m| m.distance_km > group_total)
        .or_else(|| milestones.last())
}

/// A milestone counts as reached once the group total meets it.
pub fn is_reached(milestone: &Milestone, group_total: f64) -> bool {
    group_total >= milestone.distance_km
}

/// Distance from the previous milestone; `0` for the first one.
pub fn segment_length(milestones: &[Milestone], index: usize) -> f64 {
    match index.checked_sub(1) {
        Some(prev) => match (milestones.get(index), milestones.get(prev)) {
            (Some(cur), Some(prev)) => cur.distance_km - prev.distance_km,
            _ => 0.0,
        },
        None => 0.0,
    }
}

/// Share of the route covered, in `[0, 1]`.
pub fn progress_fraction(milestones: &[Milestone], group_total: f64) -> f64 {
    let route_km = match milestones.last() {
        Some(last) if last.distance_km != 0.0 => last.distance_km,
        _ => 1.0,
    };
    (group_total / route_km).clamp(0.0, 1.0)
}

/// Display row for one milestone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MilestoneStatus {
    pub index: usize,
    pub id: String,
    pub name: String,
    pub distance_km: f64,
    /// Segment length for display, never negative
    pub segment_km: f64,
    pub reached: bool,
}

/// Progress of a group along its route.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Progress {
    pub group_total: f64,
    pub fraction: f64,
    pub next_milestone: Option<Milestone>,
    /// Distance left to the next milestone
    pub remaining_km: f64,
    pub milestones: Vec<MilestoneStatus>,
}

impl Progress {
    pub fn compute(milestones: &[Milestone], group_total: f64) -> Self {
        let next = next_milestone(milestones, group_total).cloned();
        let remaining_km = next
            .as_ref()
            .map(|m| (m.distance_km - group_total).max(0.0))
            .unwrap_or(0.0);

        let rows = milestones
            .iter()
            .enumerate()
            .map(|(index, m)| MilestoneStatus {
                index,
                id: m.id.clone(),
                name: m.name.clone(),
                distance_km: m.distance_km,
                segment_km: segment_length(milestones, index).max(0.0),
                reached: is_reached(m, group_total),
            })
            .collect();

        Self {
            group_total,
            fraction: progress_fraction(milestones, group_total),
            next_milestone: next,
            remaining_km,
            milestones: rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(distances: &[f64]) -> Vec<Milestone> {
        distances
            .iter()
            .enumerate()
            .map(|(i, d)| Milestone {
                id: format!("m{}", i),
                name: format!("Stop {}", i),
                distance_km: *d,
            })
            .collect()
    }

    #[test]
    fn test_next_milestone_midway() {
        let milestones = route(&[0.0, 100.0, 300.0]);

        let next = next_milestone(&milestones, 150.0).unwrap();
        assert_eq!(next.distance_km, 300.0);
        assert!(is_reached(&milestones[1], 150.0));
        assert!(!is_reached(&milestones[2], 150.0));
    }

    #[test]
    fn test_next_milestone_empty_route() {
        assert!(next_milestone(&[], 10.0).is_none());
    }

    #[test]
    fn test_next_milestone_past_the_end_is_last() {
        let milestones = route(&[0.0, 100.0, 300.0]);
        assert_eq!(next_milestone(&milestones, 300.0).unwrap().id, "m2");
        assert_eq!(next_milestone(&milestones, 1_000.0).unwrap().id, "m2");
    }

    #[test]
    fn test_single_milestone_is_always_next() {
        let milestones = route(&[50.0]);
        for total in [0.0, 49.9, 50.0, 80.0] {
            assert_eq!(next_milestone(&milestones, total).unwrap().id, "m0");
        }
        assert!(!is_reached(&milestones[0], 49.9));
        assert!(is_reached(&milestones[0], 50.0));
    }

    #[test]
    fn test_next_milestone_invariant() {
        let milestones = route(&[0.0, 10.0, 10.0, 25.0, 60.0]);
        for total in [0.0, 5.0, 10.0, 24.9, 25.0, 59.0, 60.0, 75.0] {
            let next = next_milestone(&milestones, total).unwrap();
            let pos = milestones.iter().position(|m| m.id == next.id).unwrap();

            assert!(milestones[..pos].iter().all(|m| m.distance_km <= total));
            assert!(next.distance_km > total || pos == milestones.len() - 1);
        }
    }

    #[test]
    fn test_segment_length() {
        let milestones = route(&[0.0, 100.0, 300.0]);
        assert_eq!(segment_length(&milestones, 0), 0.0);
        assert_eq!(segment_length(&milestones, 1), 100.0);
        assert_eq!(segment_length(&milestones, 2), 200.0);
        assert_eq!(segment_length(&milestones, 7), 0.0);
    }

    #[test]
    fn test_progress_fraction_clamped() {
        let milestones = route(&[0.0, 200.0]);
        assert_eq!(progress_fraction(&milestones, 50.0), 0.25);
        assert_eq!(progress_fraction(&milestones, 500.0), 1.0);
        assert_eq!(progress_fraction(&milestones, -3.0), 0.0);
    }

    #[test]
    fn test_progress_fraction_avoids_division_by_zero() {
        assert_eq!(progress_fraction(&[], 0.5), 0.5);
        assert_eq!(progress_fraction(&route(&[0.0]), 0.5), 0.5);
        assert_eq!(progress_fraction(&route(&[0.0]), 3.0), 1.0);
    }

    #[test]
    fn test_progress_compute() {
        let milestones = route(&[0.0, 100.0, 300.0]);
        let progress = Progress::compute(&milestones, 150.0);

        assert_eq!(progress.remaining_km, 150.0);
        assert_eq!(progress.next_milestone.unwrap().id, "m2");
        let reached: Vec<bool> = progress.milestones.iter().map(|r| r.reached).collect();
        assert_eq!(reached, vec![true, true, false]);
        assert_eq!(progress.milestones[2].segment_km, 200.0);
    }

    #[test]
    fn test_display_segment_is_not_negative() {
        let milestones = route(&[0.0, 100.0, 40.0]);
        let progress = Progress::compute(&milestones, 0.0);
        assert_eq!(progress.milestones[2].segment_km, 0.0);
        assert_eq!(segment_length(&milestones, 2), -60.0);
    }
}
