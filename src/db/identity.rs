// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Anonymous identity gate for remote writes.
//!
//! Every mutating call on the remote store awaits [`AnonymousIdentity::ready`]
//! first. Sign-in happens once; concurrent callers wait on the same attempt
//! and later callers get the cached identity. A failed attempt is not cached,
//! so the next write tries again.

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::error::AppError;

const FIREBASE_SIGN_UP_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts:signUp";

/// An established anonymous identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    /// Stable anonymous user id
    pub uid: String,
    /// Bearer token for rule-checked access, when the provider issues one
    pub id_token: Option<String>,
}

/// Where anonymous identities come from.
#[derive(Debug, Clone)]
pub enum IdentitySource {
    /// Firebase Auth anonymous sign-up via the REST API.
    Firebase {
        api_key: String,
        http: reqwest::Client,
    },
    /// A process-local id, for service-account access and the emulator.
    Local,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignUpRequest {
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    local_id: String,
    id_token: String,
}

impl IdentitySource {
    async fn sign_in(&self) -> Result<Identity, AppError> {
        match self {
            IdentitySource::Local => Ok(Identity {
                uid: format!("anon-{}", crate::models::new_id()),
                id_token: None,
            }),
            IdentitySource::Firebase { api_key, http } => {
                let response = http
                    .post(FIREBASE_SIGN_UP_URL)
                    .query(&[("key", api_key.as_str())])
                    .json(&SignUpRequest {
                        return_secure_token: true,
                    })
                    .send()
                    .await
                    .map_err(|e| {
                        AppError::PersistenceUnavailable(format!(
                            "Anonymous sign-in request failed: {}",
                            e
                        ))
                    })?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(AppError::PersistenceUnavailable(format!(
                        "Anonymous sign-in rejected ({}): {}",
                        status, body
                    )));
                }

                let body: SignUpResponse = response.json().await.map_err(|e| {
                    AppError::PersistenceUnavailable(format!(
                        "Invalid sign-in response: {}",
                        e
                    ))
                })?;

                Ok(Identity {
                    uid: body.local_id,
                    id_token: Some(body.id_token),
                })
            }
        }
    }
}

/// Lazily established, cached anonymous identity.
#[derive(Debug)]
pub struct AnonymousIdentity {
    source: IdentitySource,
    cell: OnceCell<Identity>,
}

impl AnonymousIdentity {
    pub fn new(source: IdentitySource) -> Self {
        Self {
            source,
            cell: OnceCell::new(),
        }
    }

    /// Identity backed by Firebase Auth anonymous sign-in.
    pub fn firebase(api_key: impl Into<String>) -> Self {
        Self::new(IdentitySource::Firebase {
            api_key: api_key.into(),
            http: reqwest::Client::new(),
        })
    }

    /// Identity minted locally.
    pub fn local() -> Self {
        Self::new(IdentitySource::Local)
    }

    /// Wait until an identity is established.
    pub async fn ready(&self) -> Result<&Identity, AppError> {
        self.cell
            .get_or_try_init(|| async {
                let identity = self.source.sign_in().await?;
                tracing::info!(uid = %identity.uid, "Anonymous identity established");
                Ok(identity)
            })
            .await
    }

    /// The identity, if already established.
    pub fn current(&self) -> Option<&Identity> {
        self.cell.get()
    }
}
