// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! km-ensemble: a shared distance tracker for small groups
//!
//! Members log distance entries; the group's combined total is tracked
//! against an ordered route of milestones. State lives in a local JSON
//! snapshot or in Firestore, and every client sees live updates.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::{Config, StorageBackend};
use db::{AnonymousIdentity, Backend, FirestoreDb, LocalStore, SnapshotHub};
use services::GroupService;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub groups: GroupService<Backend>,
}

impl AppState {
    /// Open the configured storage backend.
    pub async fn from_config(config: Config) -> error::Result<Self> {
        let hub = Arc::new(SnapshotHub::new());

        let backend = match &config.storage {
            StorageBackend::Local { path: Some(path) } => {
                Backend::Local(LocalStore::open(path, hub)?)
            }
            StorageBackend::Local { path: None } => {
                tracing::warn!("Using in-memory store; nothing will be persisted");
                Backend::Local(LocalStore::in_memory(hub))
            }
            StorageBackend::Firestore { project_id } => {
                let identity = match &config.firebase_api_key {
                    Some(key) => AnonymousIdentity::firebase(key.clone()),
                    None => AnonymousIdentity::local(),
                };
                Backend::Firestore(
                    FirestoreDb::new(
                        project_id,
                        Arc::new(identity),
                        hub,
                        Duration::from_secs(config.sync_poll_seconds.max(1)),
                    )
                    .await?,
                )
            }
        };

        Ok(Self::with_backend(config, backend))
    }

    pub fn with_backend(config: Config, backend: Backend) -> Self {
        Self {
            config,
            groups: GroupService::new(backend),
        }
    }
}
