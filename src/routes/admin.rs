// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route administration, reset and export/import.

use crate::error::{AppError, Result};
use crate::models::{ExportFile, Milestone, SegmentMilestone};
use crate::routes::json_body;
use crate::services::milestone_edit::MilestoneEdit;
use crate::services::Dashboard;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Upper bound on route length accepted from clients.
const MAX_MILESTONES: u64 = 500;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/groups/{group}/milestones/segments",
            get(get_segments),
        )
        .route("/api/groups/{group}/milestones", put(save_segments))
        .route(
            "/api/groups/{group}/milestones/reorder",
            post(reorder_milestones),
        )
        .route("/api/groups/{group}/milestones/edit", post(edit_milestones))
        .route("/api/groups/{group}/reset", post(reset_group))
        .route("/api/groups/{group}/export", get(export_group))
        .route("/api/groups/{group}/import", post(import_group))
}

// ─── Milestones ──────────────────────────────────────────────

async fn get_segments(
    State(state): State<Arc<AppState>>,
    Path(group): Path<String>,
) -> Result<Json<Vec<SegmentMilestone>>> {
    Ok(Json(state.groups.milestone_segments(&group).await?))
}

#[derive(Deserialize, Validate)]
struct SaveSegmentsRequest {
    #[validate(length(max = MAX_MILESTONES))]
    milestones: Vec<SegmentMilestone>,
}

/// Replace the route with an edited segment list.
async fn save_segments(
    State(state): State<Arc<AppState>>,
    Path(group): Path<String>,
    payload: std::result::Result<Json<SaveSegmentsRequest>, JsonRejection>,
) -> Result<Json<Vec<Milestone>>> {
    let body = json_body(payload)?;
    Ok(Json(
        state
            .groups
            .save_milestone_segments(&group, &body.milestones)
            .await?,
    ))
}

#[derive(Deserialize, Validate)]
struct ReorderRequest {
    from: usize,
    to: usize,
}

async fn reorder_milestones(
    State(state): State<Arc<AppState>>,
    Path(group): Path<String>,
    payload: std::result::Result<Json<ReorderRequest>, JsonRejection>,
) -> Result<Json<Vec<Milestone>>> {
    let body = json_body(payload)?;
    Ok(Json(
        state
            .groups
            .reorder_milestones(&group, body.from, body.to)
            .await?,
    ))
}

async fn edit_milestones(
    State(state): State<Arc<AppState>>,
    Path(group): Path<String>,
    payload: std::result::Result<Json<MilestoneEdit>, JsonRejection>,
) -> Result<Json<Vec<Milestone>>> {
    let Json(edit) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    Ok(Json(state.groups.edit_milestones(&group, &edit).await?))
}

// ─── Reset ───────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct ResetRequest {
    #[serde(default)]
    confirm: bool,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ResetResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub members_removed: usize,
}

/// Delete every member of a group. Requires `{"confirm": true}`.
async fn reset_group(
    State(state): State<Arc<AppState>>,
    Path(group): Path<String>,
    payload: std::result::Result<Json<ResetRequest>, JsonRejection>,
) -> Result<Json<ResetResponse>> {
    let body = json_body(payload)?;
    if !body.confirm {
        return Err(AppError::BadRequest(
            "Reset must be confirmed with {\"confirm\": true}".to_string(),
        ));
    }

    tracing::warn!(group_id = %group, "Resetting group");
    let members_removed = state.groups.reset(&group).await?;
    Ok(Json(ResetResponse { members_removed }))
}

// ─── Export / Import ─────────────────────────────────────────

/// Download the group as a JSON attachment.
async fn export_group(
    State(state): State<Arc<AppState>>,
    Path(group): Path<String>,
) -> Result<impl IntoResponse> {
    let file: ExportFile = state.groups.export(&group).await?;
    let disposition = format!(
        "attachment; filename=\"km-ensemble-{}.json\"",
        sanitize_filename(&group)
    );
    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(file)))
}

/// Replace the group's route and members from an export file.
///
/// The raw body is parsed here so a bad file reports `invalid_file` rather
/// than a generic JSON rejection.
async fn import_group(
    State(state): State<Arc<AppState>>,
    Path(group): Path<String>,
    body: String,
) -> Result<Json<Dashboard>> {
    let imported = state.groups.import(&group, &body).await?;
    Ok(Json(Dashboard::from_group(&imported)))
}

fn sanitize_filename(group: &str) -> String {
    group
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("MTL_ILES"), "MTL_ILES");
        assert_eq!(sanitize_filename("a/b\"c d"), "a_b_c_d");
    }
}
