//! Marketplace webhook receiver

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::error::ApiResponse;
use shared::util::now_millis;

use crate::error::ServiceResult;
use crate::notifications::{CAPACITY, DEFAULT_RECENT, NotificationRecord};
use crate::state::AppState;

/// POST /api/ml/notifications
///
/// Acknowledged immediately; the record is stored in the background. An
/// unreadable body is kept as absent and the query string still applies.
pub async fn receive(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> ApiResponse<()> {
    let body = if body.is_empty() {
        None
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(error = %e, "Webhook body is not JSON");
                None
            }
        }
    };

    let record = NotificationRecord::from_webhook(body, &query, now_millis());
    tracing::info!(kind = %record.kind, resource = ?record.resource, "Notification received");

    let buffer = state.notifications.clone();
    tokio::spawn(async move {
        if let Err(e) = buffer.push(&record).await {
            tracing::warn!(id = record.id, error = %e, "Failed to store notification");
        }
    });

    ApiResponse::ok()
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecentPayload {
    pub notifications: Vec<NotificationRecord>,
}

/// GET /api/ml/notifications?limit=
pub async fn recent(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> ServiceResult<ApiResponse<RecentPayload>> {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT).min(CAPACITY);
    let notifications = state.notifications.recent(limit).await?;
    Ok(ApiResponse::success(RecentPayload { notifications }))
}
