//! Service configuration

use std::str::FromStr;

use chrono_tz::Tz;
use rust_decimal::Decimal;

use crate::analytics::cost_model::CostModel;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Seller analytics service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// Redis connection URL (credential record, notification ring)
    pub redis_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// Marketplace OAuth application id
    pub ml_client_id: String,
    /// Marketplace OAuth application secret
    pub ml_client_secret: String,
    /// Redirect URI registered with the marketplace application
    pub ml_redirect_uri: String,
    /// Shared secret for the credential status endpoint (`x-admin-key`)
    pub admin_key: String,
    /// Marketplace REST base URL
    pub ml_api_base_url: String,
    /// Marketplace authorization page
    pub ml_auth_url: String,
    /// Timezone that defines "today" and calendar-day buckets
    pub business_timezone: Tz,
    /// Upstream HTTP timeout
    pub request_timeout_ms: u64,
    /// Cost heuristic applied to every line item
    pub cost_model: CostModel,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Admin key for the credential status endpoint. Unset in development
    /// leaves it empty, which keeps that endpoint closed.
    fn admin_key(value: Option<String>, environment: &str) -> Result<String, BoxError> {
        match value {
            Some(key) if !key.is_empty() => Ok(key),
            _ if environment == "development" => Ok(String::new()),
            _ => Err(format!("ADMIN_KEY must be set in {environment} environment").into()),
        }
    }

    /// Optional rate override, e.g. `COMMISSION_RATE=0.16`
    fn rate(name: &str, default: Decimal) -> Result<Decimal, BoxError> {
        match std::env::var(name) {
            Ok(raw) if !raw.trim().is_empty() => {
                let rate = Decimal::from_str(raw.trim())
                    .map_err(|e| format!("{name} is not a decimal: {e}"))?;
                if rate.is_sign_negative() || rate > Decimal::ONE {
                    return Err(format!("{name} must be between 0 and 1, got {rate}").into());
                }
                Ok(rate)
            }
            _ => Ok(default),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let business_timezone = std::env::var("BUSINESS_TIMEZONE")
            .unwrap_or_else(|_| "America/Sao_Paulo".into())
            .parse::<Tz>()
            .map_err(|e| format!("BUSINESS_TIMEZONE: {e}"))?;

        let defaults = CostModel::default();
        let cost_model = CostModel {
            commission_rate: Self::rate("COMMISSION_RATE", defaults.commission_rate)?,
            product_cost_rate: Self::rate("PRODUCT_COST_RATE", defaults.product_cost_rate)?,
            ..defaults
        };

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: environment.clone(),
            ml_client_id: Self::require_secret("ML_CLIENT_ID", &environment)?,
            ml_client_secret: Self::require_secret("ML_CLIENT_SECRET", &environment)?,
            ml_redirect_uri: Self::require_secret("ML_REDIRECT_URI", &environment)?,
            admin_key: Self::admin_key(std::env::var("ADMIN_KEY").ok(), &environment)?,
            ml_api_base_url: std::env::var("ML_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.mercadolibre.com".into()),
            ml_auth_url: std::env::var("ML_AUTH_URL")
                .unwrap_or_else(|_| "https://auth.mercadolivre.com.br/authorization".into()),
            business_timezone,
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30_000),
            cost_model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_key_unset_in_development_stays_empty() {
        assert_eq!(Config::admin_key(None, "development").unwrap(), "");
        assert_eq!(Config::admin_key(Some(String::new()), "development").unwrap(), "");
    }

    #[test]
    fn admin_key_required_outside_development() {
        assert!(Config::admin_key(None, "production").is_err());
        assert!(Config::admin_key(Some(String::new()), "staging").is_err());
        assert_eq!(
            Config::admin_key(Some("k-1".into()), "production").unwrap(),
            "k-1"
        );
    }
}
