use serde::{Deserialize, Serialize};

/// Successful `POST /oauth/token` body, for both the authorization-code and
/// refresh grants. The refresh grant may omit `refresh_token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub expires_in: i64,
    #[serde(default)]
    pub scope: Option<String>,
    pub user_id: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
}
