// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed group operations.
//!
//! Layout:
//! - `groups/{groupId}`: route document
//! - `groups/{groupId}/members/{name}`: one document per member, keyed by
//!   the URL-encoded member name
//!
//! Writes wait for the anonymous identity gate. Subscriptions poll the
//! documents at a fixed interval and publish to the shared snapshot hub;
//! this process's own writes are echoed to subscribers immediately.

use serde::Deserialize;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use crate::db::{collections, AnonymousIdentity, GroupStore, SnapshotHub, Subscription};
use crate::error::AppError;
use crate::models::{default_milestones, Entry, Group, GroupDoc, MemberDoc, Milestone};
use crate::time_utils::now_millis;

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Member document as read back from a listing, with its document id.
#[derive(Debug, Deserialize)]
struct MemberRow {
    #[serde(alias = "_firestore_id")]
    doc_id: Option<String>,
    #[serde(default)]
    entries: Vec<Entry>,
    #[serde(default, rename = "updatedAt")]
    updated_at: i64,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
    identity: Arc<AnonymousIdentity>,
    hub: Arc<SnapshotHub>,
    poll_interval: Duration,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(
        project_id: &str,
        identity: Arc<AnonymousIdentity>,
        hub: Arc<SnapshotHub>,
        poll_interval: Duration,
    ) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        let client = if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            Self::create_emulator_client(project_id).await?
        } else {
            let client = firestore::FirestoreDb::new(project_id).await.map_err(|e| {
                AppError::PersistenceUnavailable(format!("Failed to connect to Firestore: {}", e))
            })?;
            tracing::info!(project = project_id, "Connected to Firestore");
            client
        };

        Ok(Self {
            client: Some(client),
            identity,
            hub,
            poll_interval,
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<firestore::FirestoreDb, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without needing async-trait
        // or a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::PersistenceUnavailable(format!(
                "Failed to connect to Firestore Emulator: {}",
                e
            ))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(client)
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            client: None,
            identity: Arc::new(AnonymousIdentity::local()),
            hub: Arc::new(SnapshotHub::new()),
            poll_interval: Duration::from_secs(5),
        }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client.as_ref().ok_or_else(|| {
            AppError::PersistenceUnavailable("Database not connected (offline mode)".to_string())
        })
    }

    /// Document id for a member name. Names Firestore reserves (`.`, `..`,
    /// `__x__`) get their dots and underscores escaped as well.
    fn member_doc_id(member: &str) -> String {
        let encoded = urlencoding::encode(member).into_owned();
        let reserved = encoded == "."
            || encoded == ".."
            || (encoded.len() >= 4 && encoded.starts_with("__") && encoded.ends_with("__"));
        if reserved {
            encoded.replace('.', "%2E").replace('_', "%5F")
        } else {
            encoded
        }
    }

    fn member_name(doc_id: &str) -> String {
        urlencoding::decode(doc_id)
            .map(Cow::into_owned)
            .unwrap_or_else(|_| doc_id.to_string())
    }

    fn group_path(&self, group_id: &str) -> Result<firestore::ParentPathBuilder, AppError> {
        self.get_client()?
            .parent_path(collections::GROUPS, group_id)
            .map_err(|e| AppError::PersistenceUnavailable(e.to_string()))
    }

    // ─── Group Operations ────────────────────────────────────────

    async fn get_group_doc(&self, group_id: &str) -> Result<Option<GroupDoc>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::GROUPS)
            .obj()
            .one(group_id)
            .await
            .map_err(|e| AppError::PersistenceUnavailable(e.to_string()))
    }

    /// Create the group document with the default route if it is missing.
    ///
    /// Uses a create (not an overwrite), so concurrent first loads converge
    /// on whichever document landed first.
    async fn ensure_group_doc(&self, group_id: &str) -> Result<GroupDoc, AppError> {
        if let Some(doc) = self.get_group_doc(group_id).await? {
            return Ok(doc);
        }

        self.identity.ready().await?;

        let fresh = GroupDoc {
            milestones: default_milestones(),
            updated_at: now_millis(),
        };

        let created: Result<GroupDoc, _> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::GROUPS)
            .document_id(group_id)
            .object(&fresh)
            .execute()
            .await;

        match created {
            Ok(doc) => {
                tracing::info!(group_id, "Created group with default route");
                Ok(doc)
            }
            Err(e) => {
                // Lost the creation race: read the winner's document.
                tracing::debug!(group_id, error = %e, "Group create failed, re-reading");
                self.get_group_doc(group_id)
                    .await?
                    .ok_or_else(|| AppError::PersistenceUnavailable(e.to_string()))
            }
        }
    }

    async fn list_members(&self, group_id: &str) -> Result<Vec<(String, MemberDoc)>, AppError> {
        let parent = self.group_path(group_id)?;

        let rows: Vec<MemberRow> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::MEMBERS)
            .parent(&parent)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::PersistenceUnavailable(e.to_string()))?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let name = Self::member_name(row.doc_id.as_deref()?);
                Some((
                    name,
                    MemberDoc {
                        entries: row.entries,
                        updated_at: row.updated_at,
                    },
                ))
            })
            .collect())
    }

    /// Read the full group state without creating anything.
    async fn fetch_group(&self, group_id: &str) -> Result<Group, AppError> {
        let doc = self.get_group_doc(group_id).await?.unwrap_or_default();
        let members = self.list_members(group_id).await?;
        Ok(Group::from_documents(group_id, doc, members))
    }

    /// Read the group and publish it, holding the group's refresh lock so
    /// concurrent refreshes publish in read order.
    async fn refresh(&self, group_id: &str) -> Result<bool, AppError> {
        let lock = self.hub.refresh_lock(group_id);
        let _guard = lock.lock().await;
        let group = self.fetch_group(group_id).await?;
        Ok(self.hub.publish(group))
    }

    /// Push this process's write to subscribers without waiting for a poll.
    async fn echo(&self, group_id: &str) {
        if !self.hub.has_subscribers(group_id) {
            return;
        }
        if let Err(e) = self.refresh(group_id).await {
            tracing::warn!(group_id, error = %e, "Failed to refresh after write");
        }
    }

    /// Poll a group and publish changes until aborted.
    async fn poll_group(self, group_id: String) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First tick completes immediately; the initial state is already published.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match self.refresh(&group_id).await {
                Ok(true) => tracing::debug!(group_id = %group_id, "Remote change detected"),
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(group_id = %group_id, error = %e, "Group poll failed");
                }
            }
        }
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Helper to batch delete member documents using transactions.
    async fn batch_delete_members(
        &self,
        group_id: &str,
        doc_ids: &[String],
    ) -> Result<(), AppError> {
        let client = self.get_client()?;
        let parent = self.group_path(group_id)?;

        for chunk in doc_ids.chunks(BATCH_SIZE) {
            let mut transaction = client.begin_transaction().await.map_err(|e| {
                AppError::PersistenceUnavailable(format!("Failed to begin transaction: {}", e))
            })?;

            for doc_id in chunk {
                client
                    .fluent()
                    .delete()
                    .from(collections::MEMBERS)
                    .parent(&parent)
                    .document_id(doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::PersistenceUnavailable(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collections::MEMBERS,
                            e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::PersistenceUnavailable(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}

impl GroupStore for FirestoreDb {
    async fn load_group(&self, group_id: &str) -> Result<Group, AppError> {
        let doc = self.ensure_group_doc(group_id).await?;
        let members = self.list_members(group_id).await?;
        Ok(Group::from_documents(group_id, doc, members))
    }

    async fn subscribe_group(&self, group_id: &str) -> Result<Subscription, AppError> {
        self.ensure_group_doc(group_id).await?;
        self.refresh(group_id).await?;

        let poller = self.hub.poller(group_id, || {
            tracing::info!(
                group_id,
                interval_secs = self.poll_interval.as_secs(),
                "Watching group for remote changes"
            );
            tokio::spawn(self.clone().poll_group(group_id.to_string())).abort_handle()
        });

        Ok(self.hub.subscribe(group_id, Some(poller)))
    }

    async fn load_member_entries(
        &self,
        group_id: &str,
        member: &str,
    ) -> Result<Vec<Entry>, AppError> {
        let parent = self.group_path(group_id)?;

        let doc: Option<MemberDoc> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::MEMBERS)
            .parent(&parent)
            .obj()
            .one(&Self::member_doc_id(member))
            .await
            .map_err(|e| AppError::PersistenceUnavailable(e.to_string()))?;

        Ok(doc.map(|d| d.entries).unwrap_or_default())
    }

    async fn save_member_entries(
        &self,
        group_id: &str,
        member: &str,
        entries: &[Entry],
    ) -> Result<(), AppError> {
        let identity = self.identity.ready().await?;
        let parent = self.group_path(group_id)?;

        let doc = MemberDoc {
            entries: entries.to_vec(),
            updated_at: now_millis(),
        };

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::MEMBERS)
            .document_id(Self::member_doc_id(member))
            .parent(&parent)
            .object(&doc)
            .execute()
            .await
            .map_err(|e| AppError::PersistenceUnavailable(e.to_string()))?;

        tracing::debug!(
            group_id,
            member,
            entries = entries.len(),
            uid = %identity.uid,
            "Saved member entries"
        );

        self.echo(group_id).await;
        Ok(())
    }

    async fn save_milestones(
        &self,
        group_id: &str,
        milestones: &[Milestone],
    ) -> Result<(), AppError> {
        let identity = self.identity.ready().await?;

        let doc = GroupDoc {
            milestones: milestones.to_vec(),
            updated_at: now_millis(),
        };

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::GROUPS)
            .document_id(group_id)
            .object(&doc)
            .execute()
            .await
            .map_err(|e| AppError::PersistenceUnavailable(e.to_string()))?;

        tracing::debug!(
            group_id,
            count = milestones.len(),
            uid = %identity.uid,
            "Saved milestones"
        );

        self.echo(group_id).await;
        Ok(())
    }

    async fn reset_group(&self, group_id: &str) -> Result<usize, AppError> {
        self.identity.ready().await?;

        let doc_ids: Vec<String> = self
            .list_members(group_id)
            .await?
            .into_iter()
            .map(|(name, _)| Self::member_doc_id(&name))
            .collect();

        let count = doc_ids.len();
        self.batch_delete_members(group_id, &doc_ids).await?;

        tracing::info!(group_id, removed = count, "Group reset");

        self.echo(group_id).await;
        Ok(count)
    }
}
