//! Marketplace credential lifecycle
//!
//! One credential record per process. [`TokenLifecycleManager`] hands out a
//! bearer token that stays valid for at least [`FRESHNESS_MARGIN_MS`] and
//! renews it through the refresh grant when it is about to expire.

pub mod store;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::market::TokenGrant;
use shared::util::now_millis;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::kv::StoreError;
use crate::marketplace::{OAuthGateway, UpstreamError};
use store::TokenStore;

/// A token is reused only while `now < expires_at - FRESHNESS_MARGIN_MS`
pub const FRESHNESS_MARGIN_MS: i64 = 30_000;

/// Stored credential, serialized with the key names the record has always
/// used in Redis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRecord {
    #[serde(rename = "user_id")]
    pub marketplace_user_id: i64,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Milliseconds since epoch
    #[serde(rename = "created_at")]
    pub issued_at: i64,
    /// `issued_at + ttl_seconds * 1000`
    pub expires_at: i64,
    #[serde(rename = "expires_in")]
    pub ttl_seconds: i64,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl CredentialRecord {
    /// Record for a fresh authorization-code grant
    pub fn from_grant(grant: TokenGrant, issued_at: i64) -> Self {
        Self {
            marketplace_user_id: grant.user_id,
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            issued_at,
            expires_at: issued_at + grant.expires_in * 1000,
            ttl_seconds: grant.expires_in,
            scope: grant.scope,
            token_type: grant.token_type,
        }
    }

    /// Record after a refresh grant. The marketplace may omit the refresh
    /// token, in which case the current one stays.
    pub fn renewed(&self, grant: TokenGrant, issued_at: i64) -> Self {
        let carried = self.refresh_token.clone();
        let mut next = Self::from_grant(grant, issued_at);
        if next.refresh_token.is_none() {
            next.refresh_token = carried;
        }
        next
    }

    pub fn is_fresh(&self, now: i64, margin_ms: i64) -> bool {
        now < self.expires_at - margin_ms
    }
}

/// Credential metadata without the secrets
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CredentialStatus {
    pub user_id: i64,
    /// Whole seconds left, never negative
    pub expires_in: i64,
    pub expires_at: i64,
    pub has_access_token: bool,
    pub has_refresh_token: bool,
    pub saved_at: i64,
}

impl CredentialStatus {
    fn of(record: &CredentialRecord, now: i64) -> Self {
        Self {
            user_id: record.marketplace_user_id,
            expires_in: ((record.expires_at - now) / 1000).max(0),
            expires_at: record.expires_at,
            has_access_token: !record.access_token.is_empty(),
            has_refresh_token: record.refresh_token.as_deref().is_some_and(|t| !t.is_empty()),
            saved_at: record.issued_at,
        }
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("No token saved")]
    Missing,
    #[error("Refresh failed: {body}")]
    Refresh { status: Option<u16>, body: String },
    #[error("Token exchange failed: {body}")]
    Exchange { status: Option<u16>, body: String },
    #[error("credential store: {0}")]
    Store(#[from] StoreError),
}

impl CredentialError {
    fn refresh(e: UpstreamError) -> Self {
        Self::Refresh {
            status: e.status(),
            body: e.body(),
        }
    }

    fn exchange(e: UpstreamError) -> Self {
        Self::Exchange {
            status: e.status(),
            body: e.body(),
        }
    }
}

/// Upstream bodies are JSON most of the time; keep them structured when so.
fn body_value(body: String) -> serde_json::Value {
    serde_json::from_str(&body).unwrap_or(serde_json::Value::String(body))
}

impl From<CredentialError> for AppError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::Missing => AppError::new(ErrorCode::CredentialMissing),
            CredentialError::Refresh { status, body } => {
                AppError::new(ErrorCode::CredentialRefreshFailed)
                    .with_detail("upstream_status", status)
                    .with_detail("upstream_body", body_value(body))
            }
            CredentialError::Exchange { status, body } => {
                AppError::new(ErrorCode::CodeExchangeFailed)
                    .with_detail("upstream_status", status)
                    .with_detail("upstream_body", body_value(body))
            }
            CredentialError::Store(e) => AppError::cache(e.to_string()),
        }
    }
}

pub struct TokenLifecycleManager {
    store: Arc<dyn TokenStore>,
    oauth: Arc<dyn OAuthGateway>,
    refresh_lock: Mutex<()>,
    margin_ms: i64,
}

impl TokenLifecycleManager {
    pub fn new(store: Arc<dyn TokenStore>, oauth: Arc<dyn OAuthGateway>) -> Self {
        Self {
            store,
            oauth,
            refresh_lock: Mutex::new(()),
            margin_ms: FRESHNESS_MARGIN_MS,
        }
    }

    async fn load(&self) -> Result<CredentialRecord, CredentialError> {
        self.store.get().await?.ok_or(CredentialError::Missing)
    }

    /// A bearer token valid for at least the freshness margin.
    ///
    /// Refreshes are serialized in-process: callers that queue behind a
    /// running refresh re-read the store and reuse its result. On a rejected
    /// refresh the stored record is left as it was.
    pub async fn get_valid_token(&self) -> Result<String, CredentialError> {
        let record = self.load().await?;
        if record.is_fresh(now_millis(), self.margin_ms) {
            return Ok(record.access_token);
        }

        let _guard = self.refresh_lock.lock().await;

        let record = self.load().await?;
        if record.is_fresh(now_millis(), self.margin_ms) {
            return Ok(record.access_token);
        }

        let refresh_token = record
            .refresh_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CredentialError::Refresh {
                status: None,
                body: "no refresh token stored".into(),
            })?;

        let grant = self.oauth.refresh(refresh_token).await.map_err(|e| {
            tracing::warn!(
                user_id = record.marketplace_user_id,
                status = ?e.status(),
                "Marketplace rejected token refresh"
            );
            CredentialError::refresh(e)
        })?;

        let renewed = record.renewed(grant, now_millis());
        self.store.set(&renewed).await?;
        tracing::info!(
            user_id = renewed.marketplace_user_id,
            expires_at = renewed.expires_at,
            "Marketplace credential refreshed"
        );
        Ok(renewed.access_token)
    }

    /// Exchange an authorization code and persist the resulting record
    pub async fn authorize(&self, code: &str) -> Result<CredentialRecord, CredentialError> {
        let grant = self
            .oauth
            .exchange_code(code)
            .await
            .map_err(CredentialError::exchange)?;
        self.store_grant(grant).await
    }

    /// Persist the result of an authorization-code exchange
    pub async fn store_grant(
        &self,
        grant: TokenGrant,
    ) -> Result<CredentialRecord, CredentialError> {
        let record = CredentialRecord::from_grant(grant, now_millis());
        let _guard = self.refresh_lock.lock().await;
        self.store.set(&record).await?;
        tracing::info!(
            user_id = record.marketplace_user_id,
            expires_at = record.expires_at,
            "Marketplace credential saved"
        );
        Ok(record)
    }

    pub async fn status(&self) -> Result<CredentialStatus, CredentialError> {
        let record = self.load().await?;
        Ok(CredentialStatus::of(&record, now_millis()))
    }
}
