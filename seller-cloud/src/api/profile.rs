//! Marketplace profile proxy

use axum::extract::State;
use serde::Serialize;
use shared::error::{ApiResponse, AppError};
use shared::market::MarketUser;
use shared::util::now_millis;

use super::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MePayload {
    pub me: MarketUser,
}

/// GET /api/ml/me
///
/// Returns the marketplace's `users/me` and upserts the seller row in the
/// background.
pub async fn me(State(state): State<AppState>) -> ApiResult<MePayload> {
    let token = state.tokens.get_valid_token().await?;
    let user = state.source.current_user(&token).await.map_err(|e| {
        tracing::warn!(status = ?e.status(), error = %e, "Profile request failed");
        AppError::upstream(e.error_code(), "ML request failed")
            .with_detail("upstream_status", e.status())
            .with_detail("upstream_body", e.body())
    })?;

    let archive = state.archive.clone();
    let row = user.clone();
    tokio::spawn(async move {
        if let Err(e) = archive.upsert_user(&row, now_millis()).await {
            tracing::warn!(user_id = row.id, error = %e, "Failed to archive seller profile");
        }
    });

    Ok(ApiResponse::success(MePayload { me: user }))
}
