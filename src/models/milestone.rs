// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route milestones in cumulative and segment form.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::number::lenient_km;

/// A named checkpoint at a cumulative distance from the route origin.
///
/// This is the form stored at rest and used by all progress computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Milestone {
    /// Opaque identifier, independent of position
    #[serde(default)]
    pub id: String,
    /// Display label
    #[serde(default)]
    pub name: String,
    /// Cumulative distance from the origin (`distance` in older documents)
    #[serde(
        rename = "distanceKm",
        alias = "distance",
        default,
        deserialize_with = "lenient_km"
    )]
    pub distance_km: f64,
}

impl Milestone {
    /// Create a milestone with a freshly generated id.
    pub fn new(name: impl Into<String>, distance_km: f64) -> Self {
        Self {
            id: super::new_id(),
            name: name.into(),
            distance_km,
        }
    }

    fn fixed(id: &str, name: &str, distance_km: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            distance_km,
        }
    }
}

/// A milestone as edited by an administrator: distance relative to the
/// previous milestone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SegmentMilestone {
    /// Missing or blank ids are regenerated on save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    /// Length of the segment leading to this milestone
    #[serde(
        rename = "segmentKm",
        default,
        deserialize_with = "lenient_km"
    )]
    pub segment_km: f64,
}

impl SegmentMilestone {
    /// Create a segment with a freshly generated id.
    pub fn new(name: impl Into<String>, segment_km: f64) -> Self {
        Self {
            id: Some(super::new_id()),
            name: name.into(),
            segment_km,
        }
    }
}

/// Milestones a group starts with: Montréal to the Îles-de-la-Madeleine.
pub fn default_milestones() -> Vec<Milestone> {
    vec![
        Milestone::fixed("mtl", "Montréal (départ)", 0.0),
        Milestone::fixed("qc", "Québec", 317.0),
        Milestone::fixed("rdl", "Rivière-du-loup", 525.0),
        Milestone::fixed("fre", "Frédéricton", 913.0),
        Milestone::fixed("mon", "Moncton", 1089.0),
        Milestone::fixed("cht", "Charlottetown", 1254.0),
        Milestone::fixed("srs", "Charlottetown - Souris", 1334.0),
        Milestone::fixed("iles", "Souris - Îles-de-la-Madeleine (arrivée)", 1487.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_route_is_monotonic_from_origin() {
        let route = default_milestones();
        assert_eq!(route[0].distance_km, 0.0);
        assert!(route
            .windows(2)
            .all(|pair| pair[0].distance_km <= pair[1].distance_km));
        assert_eq!(route.last().unwrap().distance_km, 1487.0);
    }

    #[test]
    fn test_new_generates_distinct_ids() {
        let a = Milestone::new("A", 10.0);
        let b = Milestone::new("A", 10.0);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_legacy_distance_field() {
        let m: Milestone =
            serde_json::from_str(r#"{"id":"qc","name":"Québec","distance":317}"#).unwrap();
        assert_eq!(m.distance_km, 317.0);

        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["distanceKm"], 317.0);
    }

    #[test]
    fn test_segment_non_numeric_coerced() {
        let s: SegmentMilestone =
            serde_json::from_str(r#"{"name":"Québec","segmentKm":"lots"}"#).unwrap();
        assert_eq!(s.segment_km, 0.0);
        assert_eq!(s.id, None);
    }
}
