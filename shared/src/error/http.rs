//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound | Self::CredentialMissing | Self::StatsNotCached => {
                StatusCode::NOT_FOUND
            }

            // 401 Unauthorized
            Self::NotAuthenticated | Self::AdminKeyInvalid => StatusCode::UNAUTHORIZED,

            // 502 Bad Gateway (marketplace said no)
            Self::CredentialRefreshFailed
            | Self::CodeExchangeFailed
            | Self::UpstreamRequestFailed
            | Self::UpstreamInvalidResponse => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable (transient, client can retry)
            Self::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::Unknown
            | Self::OAuthNotConfigured
            | Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError
            | Self::CacheError => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request
            Self::ValidationFailed
            | Self::InvalidRequest
            | Self::InvalidFormat
            | Self::RequiredField
            | Self::AuthorizationCodeMissing
            | Self::InvalidDateRange => StatusCode::BAD_REQUEST,
        }
    }
}
