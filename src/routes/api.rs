// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Member-facing API: dashboards, live updates and entry logging.

use crate::error::Result;
use crate::middleware::member::{member_cookie, ActiveMember};
use crate::models::{DistanceInput, Entry};
use crate::routes::json_body;
use crate::services::{Dashboard, EntryInput};
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

const MAX_NAME_LEN: u64 = 80;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", post(remember_me))
        .route("/api/groups/{group}/dashboard", get(get_dashboard))
        .route("/api/groups/{group}/events", get(group_events))
        .route("/api/groups/{group}/entries", post(log_entry))
        .route(
            "/api/groups/{group}/members/{member}/entries/{entry_id}",
            delete(remove_entry),
        )
}

// ─── Member Name ─────────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct RememberMeRequest {
    #[validate(length(min = 1, max = MAX_NAME_LEN))]
    name: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MeResponse {
    pub name: String,
}

/// Remember who this client is.
async fn remember_me(
    jar: CookieJar,
    payload: std::result::Result<Json<RememberMeRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<MeResponse>)> {
    let body = json_body(payload)?;
    let name = body.name.trim().to_string();
    if name.is_empty() {
        return Err(crate::error::AppError::BadRequest(
            "Name must not be blank".to_string(),
        ));
    }

    tracing::info!(member = %name, "Member name remembered");
    Ok((jar.add(member_cookie(&name)), Json(MeResponse { name })))
}

// ─── Dashboard ───────────────────────────────────────────────

async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Path(group): Path<String>,
) -> Result<Json<Dashboard>> {
    Ok(Json(state.groups.dashboard(&group).await?))
}

/// Live dashboards as Server-Sent Events.
///
/// The first event is the current state; one follows every change. Closing
/// the connection drops the subscription.
async fn group_events(
    State(state): State<Arc<AppState>>,
    Path(group): Path<String>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let subscription = state.groups.subscribe(&group).await?;
    tracing::debug!(group_id = %group, "Event stream opened");

    let stream = subscription.into_stream().map(|snapshot| {
        let dashboard = Dashboard::from_group(&snapshot);
        Ok(Event::default()
            .event("dashboard")
            .json_data(&dashboard)
            .unwrap_or_else(|e| Event::default().event("error").data(e.to_string())))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

// ─── Entries ─────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct LogEntryRequest {
    /// Number or numeric string; validated by the entry model
    #[serde(default, alias = "km")]
    distance_km: Option<DistanceInput>,
    #[validate(length(max = 32))]
    date: Option<String>,
    #[validate(length(max = 500))]
    note: Option<String>,
    /// Overrides the remembered member name
    #[validate(length(max = MAX_NAME_LEN))]
    member: Option<String>,
}

/// Log an entry for the named or remembered member.
async fn log_entry(
    State(state): State<Arc<AppState>>,
    Path(group): Path<String>,
    Extension(active): Extension<ActiveMember>,
    payload: std::result::Result<Json<LogEntryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Entry>)> {
    let body = json_body(payload)?;

    let member = body
        .member
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .or(active.name());

    let input = EntryInput {
        distance: body.distance_km,
        date: body.date,
        note: body.note,
    };

    let entry = state.groups.log_entry(&group, member, &input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RemoveEntryResponse {
    pub removed: bool,
}

async fn remove_entry(
    State(state): State<Arc<AppState>>,
    Path((group, member, entry_id)): Path<(String, String, String)>,
) -> Result<Json<RemoveEntryResponse>> {
    let removed = state
        .groups
        .remove_entry(&group, &member, &entry_id)
        .await?;
    Ok(Json(RemoveEntryResponse { removed }))
}
