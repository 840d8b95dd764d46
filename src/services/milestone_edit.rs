// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Conversions between cumulative and segment milestone forms, and the
//! administrative list edits built on them.
//!
//! Administrators edit segment lengths; storage and progress always use the
//! cumulative form. [`normalize_for_save`] is the only way back to storage.

use serde::Deserialize;

use crate::models::number::lenient_km;
use crate::models::{new_id, Milestone, SegmentMilestone};

/// Segment view of a cumulative route.
///
/// The first segment is `0`. Non-monotonic input yields negative segments,
/// which are passed through unchanged.
pub fn to_segment_view(cumulative: &[Milestone]) -> Vec<SegmentMilestone> {
    let mut previous: Option<f64> = None;
    cumulative
        .iter()
        .map(|m| {
            let segment_km = previous.map_or(0.0, |prev| m.distance_km - prev);
            previous = Some(m.distance_km);
            SegmentMilestone {
                id: Some(m.id.clone()),
                name: m.name.clone(),
                segment_km,
            }
        })
        .collect()
}

/// Cumulative view of a segment list.
///
/// The origin is pinned at `0` whatever its supplied segment. Non-finite
/// segments count as `0`. Missing ids are left empty; see
/// [`normalize_for_save`].
pub fn to_cumulative_view(segments: &[SegmentMilestone]) -> Vec<Milestone> {
    let mut running = 0.0;
    segments
        .iter()
        .enumerate()
        .map(|(index, s)| {
            if index > 0 && s.segment_km.is_finite() {
                running += s.segment_km;
            }
            Milestone {
                id: s.id.clone().unwrap_or_default(),
                name: s.name.clone(),
                distance_km: running,
            }
        })
        .collect()
}

/// Move the element at `from` to position `to`.
///
/// Out-of-range indices leave the list unchanged.
pub fn reorder<T: Clone>(list: &[T], from: usize, to: usize) -> Vec<T> {
    let mut out = list.to_vec();
    if from >= out.len() || to >= out.len() {
        return out;
    }
    let item = out.remove(from);
    out.insert(to, item);
    out
}

/// Swap a segment with its predecessor. No-op for the first one.
pub fn move_up(segments: &[SegmentMilestone], index: usize) -> Vec<SegmentMilestone> {
    match index.checked_sub(1) {
        Some(target) => reorder(segments, index, target),
        None => segments.to_vec(),
    }
}

/// Swap a segment with its successor. No-op for the last one.
pub fn move_down(segments: &[SegmentMilestone], index: usize) -> Vec<SegmentMilestone> {
    reorder(segments, index, index.saturating_add(1))
}

/// Drop the segment at `index`, if any.
pub fn remove_at(segments: &[SegmentMilestone], index: usize) -> Vec<SegmentMilestone> {
    let mut out = segments.to_vec();
    if index < out.len() {
        out.remove(index);
    }
    out
}

/// Set one segment's length. Non-finite input is stored as `0`.
pub fn set_segment(
    segments: &[SegmentMilestone],
    index: usize,
    segment_km: f64,
) -> Vec<SegmentMilestone> {
    let mut out = segments.to_vec();
    if let Some(s) = out.get_mut(index) {
        s.segment_km = if segment_km.is_finite() {
            segment_km
        } else {
            0.0
        };
    }
    out
}

/// Append a named segment of the given length.
pub fn append_segment(
    segments: &[SegmentMilestone],
    name: &str,
    segment_km: f64,
) -> Vec<SegmentMilestone> {
    let mut out = segments.to_vec();
    out.push(SegmentMilestone::new(name, segment_km));
    out
}

/// Rename one segment. Blank names are kept here and dropped on save.
pub fn rename(segments: &[SegmentMilestone], index: usize, name: &str) -> Vec<SegmentMilestone> {
    let mut out = segments.to_vec();
    if let Some(s) = out.get_mut(index) {
        s.name = name.to_string();
    }
    out
}

/// A single administrative edit of the segment list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MilestoneEdit {
    SetSegment {
        index: usize,
        #[serde(default, deserialize_with = "lenient_km")]
        segment_km: f64,
    },
    MoveUp {
        index: usize,
    },
    MoveDown {
        index: usize,
    },
    Remove {
        index: usize,
    },
    Append {
        name: String,
        #[serde(default, deserialize_with = "lenient_km")]
        segment_km: f64,
    },
    Rename {
        index: usize,
        name: String,
    },
}

impl MilestoneEdit {
    pub fn apply(&self, segments: &[SegmentMilestone]) -> Vec<SegmentMilestone> {
        match self {
            MilestoneEdit::SetSegment { index, segment_km } => {
                set_segment(segments, *index, *segment_km)
            }
            MilestoneEdit::MoveUp { index } => move_up(segments, *index),
            MilestoneEdit::MoveDown { index } => move_down(segments, *index),
            MilestoneEdit::Remove { index } => remove_at(segments, *index),
            MilestoneEdit::Append { name, segment_km } => {
                append_segment(segments, name, *segment_km)
            }
            MilestoneEdit::Rename { index, name } => rename(segments, *index, name),
        }
    }
}

/// Turn an edited segment list into the cumulative route to store.
///
/// Drops segments whose trimmed name is empty, fills in missing ids, then
/// re-accumulates distances in the final order.
pub fn normalize_for_save(segments: &[SegmentMilestone]) -> Vec<Milestone> {
    let kept: Vec<SegmentMilestone> = segments
        .iter()
        .filter(|s| !s.name.trim().is_empty())
        .map(|s| SegmentMilestone {
            id: Some(
                s.id
                    .as_deref()
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map_or_else(new_id, str::to_string),
            ),
            name: s.name.trim().to_string(),
            segment_km: s.segment_km,
        })
        .collect();

    to_cumulative_view(&kept)
}
