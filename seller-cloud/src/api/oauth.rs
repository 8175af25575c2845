//! Marketplace authorization endpoints

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use http::{HeaderMap, StatusCode, header};
use serde::{Deserialize, Serialize};
use shared::error::{ApiResponse, AppError, ErrorCode};

use super::ApiResult;
use crate::marketplace::authorization_url;
use crate::state::AppState;
use crate::token::CredentialStatus;

const ADMIN_KEY_HEADER: &str = "x-admin-key";

#[derive(Debug, Deserialize)]
pub struct AuthQuery {
    pub redirect: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub auth_url: String,
    pub state: String,
}

/// GET /api/ml/auth
///
/// Marketplace login URL with a fresh random `state`; `redirect=1` answers
/// with a 302 to it instead.
pub async fn authorize(
    State(state): State<AppState>,
    Query(query): Query<AuthQuery>,
) -> Result<Response, AppError> {
    let settings = &state.oauth;
    if settings.client_id.is_empty() || settings.redirect_uri.is_empty() {
        return Err(AppError::new(ErrorCode::OAuthNotConfigured));
    }

    let nonce = uuid::Uuid::new_v4().to_string();
    let url = authorization_url(
        &settings.auth_url,
        &settings.client_id,
        &settings.redirect_uri,
        &nonce,
    )
    .map_err(|e| {
        AppError::with_message(ErrorCode::ConfigError, format!("invalid ML_AUTH_URL: {e}"))
    })?;

    if query.redirect.as_deref() == Some("1") {
        return Ok((StatusCode::FOUND, [(header::LOCATION, url.to_string())]).into_response());
    }

    Ok(ApiResponse::success(AuthPayload {
        auth_url: url.into(),
        state: nonce,
    })
    .into_response())
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CallbackPayload {
    pub user_id: i64,
    pub expires_in: i64,
    pub saved: bool,
}

/// GET /api/ml/callback?code=
///
/// Exchanges the authorization code and stores the credential. Tokens are
/// never echoed back.
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> ApiResult<CallbackPayload> {
    let code = query
        .code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::new(ErrorCode::AuthorizationCodeMissing))?;

    let record = state.tokens.authorize(code).await?;

    Ok(ApiResponse::success(CallbackPayload {
        user_id: record.marketplace_user_id,
        expires_in: record.ttl_seconds,
        saved: true,
    }))
}

/// GET /api/ml/token, requires `x-admin-key`
pub async fn token_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<CredentialStatus> {
    let presented = headers
        .get(ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if state.admin_key.is_empty() || presented != state.admin_key {
        tracing::debug!("Rejected credential status request");
        return Err(AppError::unauthorized());
    }

    let status = state.tokens.status().await?;
    Ok(ApiResponse::success(status))
}
