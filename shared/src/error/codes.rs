//! Unified error codes for the seller analytics service
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors (admin access)
//! - 2xxx: Marketplace credential errors
//! - 3xxx: Marketplace upstream errors
//! - 4xxx: Analytics errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so the dashboard can
/// branch on them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,

    // ==================== 1xxx: Auth ====================
    /// Caller is not authenticated
    NotAuthenticated = 1001,
    /// Admin key missing or wrong
    AdminKeyInvalid = 1002,

    // ==================== 2xxx: Credential ====================
    /// No marketplace credential has been stored yet
    CredentialMissing = 2001,
    /// Marketplace rejected the refresh grant
    CredentialRefreshFailed = 2002,
    /// Authorization callback without a code
    AuthorizationCodeMissing = 2003,
    /// Marketplace rejected the authorization-code exchange
    CodeExchangeFailed = 2004,
    /// OAuth client settings are not configured
    OAuthNotConfigured = 2005,

    // ==================== 3xxx: Marketplace ====================
    /// Marketplace answered with a non-success status
    UpstreamRequestFailed = 3001,
    /// Marketplace could not be reached
    UpstreamUnavailable = 3002,
    /// Marketplace answered with an unreadable body
    UpstreamInvalidResponse = 3003,

    // ==================== 4xxx: Analytics ====================
    /// Date range parameters are malformed or inverted
    InvalidDateRange = 4001,
    /// No cached statistics for the requested key
    StatsNotCached = 4002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
    /// Key-value store error
    CacheError = 9004,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",

            // Auth
            ErrorCode::NotAuthenticated => "Authentication required",
            ErrorCode::AdminKeyInvalid => "Unauthorized",

            // Credential
            ErrorCode::CredentialMissing => "No token saved",
            ErrorCode::CredentialRefreshFailed => "Token refresh failed",
            ErrorCode::AuthorizationCodeMissing => "Missing code",
            ErrorCode::CodeExchangeFailed => "Token exchange failed",
            ErrorCode::OAuthNotConfigured => "Missing OAuth client configuration",

            // Marketplace
            ErrorCode::UpstreamRequestFailed => "Marketplace request failed",
            ErrorCode::UpstreamUnavailable => "Marketplace unavailable",
            ErrorCode::UpstreamInvalidResponse => "Marketplace returned an invalid response",

            // Analytics
            ErrorCode::InvalidDateRange => "Invalid date range",
            ErrorCode::StatsNotCached => "No cached statistics for this range",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::CacheError => "Key-value store error",
        }
    }
}

/// Error returned when converting an unknown u16 to [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),

            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::AdminKeyInvalid),

            2001 => Ok(ErrorCode::CredentialMissing),
            2002 => Ok(ErrorCode::CredentialRefreshFailed),
            2003 => Ok(ErrorCode::AuthorizationCodeMissing),
            2004 => Ok(ErrorCode::CodeExchangeFailed),
            2005 => Ok(ErrorCode::OAuthNotConfigured),

            3001 => Ok(ErrorCode::UpstreamRequestFailed),
            3002 => Ok(ErrorCode::UpstreamUnavailable),
            3003 => Ok(ErrorCode::UpstreamInvalidResponse),

            4001 => Ok(ErrorCode::InvalidDateRange),
            4002 => Ok(ErrorCode::StatsNotCached),

            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::ConfigError),
            9004 => Ok(ErrorCode::CacheError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
