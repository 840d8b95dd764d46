// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Groups, members, and their stored document shapes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{default_milestones, Entry, Milestone};
use crate::error::{AppError, Result};

/// A participant, identified solely by display name.
///
/// Two people choosing the same name share one member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub entries: Vec<Entry>,
}

impl Member {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }
}

/// Member name to member mapping.
pub type Membership = BTreeMap<String, Member>;

/// The aggregation root: a route and the members walking it.
///
/// Also the snapshot type delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub id: String,
    pub milestones: Vec<Milestone>,
    pub members: Membership,
}

impl Group {
    /// A fresh group with the default route and no members.
    pub fn new_default(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            milestones: default_milestones(),
            members: Membership::new(),
        }
    }

    /// Assemble a group from its stored documents.
    ///
    /// An empty stored route is presented as the default route.
    pub fn from_documents<I>(id: impl Into<String>, group: GroupDoc, members: I) -> Self
    where
        I: IntoIterator<Item = (String, MemberDoc)>,
    {
        let milestones = if group.milestones.is_empty() {
            default_milestones()
        } else {
            group.milestones
        };

        let members = members
            .into_iter()
            .map(|(name, doc)| {
                let member = Member {
                    name: name.clone(),
                    entries: doc.entries,
                };
                (name, member)
            })
            .collect();

        Self {
            id: id.into(),
            milestones,
            members,
        }
    }

    /// Return the named member, creating it with no entries if absent.
    pub fn upsert_member(&mut self, name: &str) -> &mut Member {
        self.members
            .entry(name.to_string())
            .or_insert_with(|| Member::new(name))
    }
}

/// Stored group document (`groups/{groupId}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDoc {
    /// Route in cumulative form
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    /// Epoch millis of the last write
    #[serde(default)]
    pub updated_at: i64,
}

/// Stored member document (`groups/{groupId}/members/{name}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDoc {
    #[serde(default)]
    pub entries: Vec<Entry>,
    /// Epoch millis of the last write
    #[serde(default)]
    pub updated_at: i64,
}

/// Member section of an export file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedMember {
    pub entries: Vec<Entry>,
}

/// Downloadable backup of a group: `{ milestones, members }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportFile {
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub members: BTreeMap<String, ExportedMember>,
}

impl ExportFile {
    pub fn from_group(group: &Group) -> Self {
        Self {
            milestones: group.milestones.clone(),
            members: group
                .members
                .values()
                .map(|m| {
                    (
                        m.name.clone(),
                        ExportedMember {
                            entries: m.entries.clone(),
                        },
                    )
                })
                .collect(),
        }
    }

    /// Parse and validate an uploaded export file.
    ///
    /// The whole file is rejected when `milestones` is missing or not a list,
    /// or when any member section is malformed.
    pub fn parse(raw: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| AppError::MalformedImportFile(format!("not JSON: {}", e)))?;

        match value.get("milestones") {
            Some(serde_json::Value::Array(_)) => {}
            Some(_) => {
                return Err(AppError::MalformedImportFile(
                    "'milestones' must be a list".to_string(),
                ))
            }
            None => {
                return Err(AppError::MalformedImportFile(
                    "missing 'milestones'".to_string(),
                ))
            }
        }

        serde_json::from_value(value).map_err(|e| AppError::MalformedImportFile(e.to_string()))
    }
}
