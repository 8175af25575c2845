//! Marketplace REST client
//!
//! [`OrderSource`] and [`OAuthGateway`] are the seams the rest of the
//! service talks to; [`MarketplaceClient`] implements both over reqwest.

mod oauth;

pub use oauth::authorization_url;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::de::DeserializeOwned;
use shared::error::ErrorCode;
use shared::market::{ItemSearchResponse, MarketUser, Order, OrderSearchResponse, TokenGrant};
use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("marketplace request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("marketplace returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unreadable marketplace response: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// Upstream status code, when the marketplace answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Decode(_) => None,
        }
    }

    /// Error code reported to API clients
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Status { .. } => ErrorCode::UpstreamRequestFailed,
            Self::Http(_) => ErrorCode::UpstreamUnavailable,
            Self::Decode(_) => ErrorCode::UpstreamInvalidResponse,
        }
    }

    /// Response body (or transport error text) for diagnostics
    pub fn body(&self) -> String {
        match self {
            Self::Status { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }
}

/// One page of the seller's orders created in `[created_from, created_to]`
#[derive(Debug, Clone, PartialEq)]
pub struct OrderQuery {
    pub seller_id: i64,
    pub created_from: DateTime<FixedOffset>,
    /// Open-ended when absent
    pub created_to: Option<DateTime<FixedOffset>>,
    pub limit: u32,
}

impl OrderQuery {
    /// Query-string pairs for `orders/search`
    pub fn params(&self) -> Vec<(&'static str, String)> {
        const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";
        let mut params = vec![
            ("seller", self.seller_id.to_string()),
            (
                "order.date_created.from",
                self.created_from.format(FORMAT).to_string(),
            ),
        ];
        if let Some(to) = self.created_to {
            params.push(("order.date_created.to", to.format(FORMAT).to_string()));
        }
        params.push(("limit", self.limit.to_string()));
        params
    }
}

/// Read access to the seller's marketplace data
#[async_trait]
pub trait OrderSource: Send + Sync {
    /// `GET /users/me`
    async fn current_user(&self, token: &str) -> Result<MarketUser, UpstreamError>;
    /// `GET /orders/search`, first page only
    async fn search_orders(
        &self,
        token: &str,
        query: &OrderQuery,
    ) -> Result<Vec<Order>, UpstreamError>;
    /// `GET /orders/{id}`
    async fn order_detail(&self, token: &str, order_id: i64) -> Result<Order, UpstreamError>;
    /// `GET /users/{id}/items/search?status=active`
    async fn active_listing_ids(
        &self,
        token: &str,
        seller_id: i64,
    ) -> Result<Vec<String>, UpstreamError>;
}

/// The marketplace OAuth token endpoint
#[async_trait]
pub trait OAuthGateway: Send + Sync {
    /// `authorization_code` grant
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, UpstreamError>;
    /// `refresh_token` grant
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, UpstreamError>;
}

pub const LISTING_PAGE_LIMIT: u32 = 50;

/// reqwest client for the marketplace API
#[derive(Clone)]
pub struct MarketplaceClient {
    http: reqwest::Client,
    api_base: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl MarketplaceClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self {
            http,
            api_base: config.ml_api_base_url.trim_end_matches('/').to_string(),
            client_id: config.ml_client_id.clone(),
            client_secret: config.ml_client_secret.clone(),
            redirect_uri: config.ml_redirect_uri.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, UpstreamError> {
        let resp = self
            .http
            .get(self.url(path))
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;
        decode(resp).await
    }
}

/// Map a response to `T`, keeping non-2xx bodies for the caller
async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, UpstreamError> {
    let status = resp.status();
    let bytes = resp.bytes().await?;
    if !status.is_success() {
        return Err(UpstreamError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }
    serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Decode(e.to_string()))
}

#[async_trait]
impl OrderSource for MarketplaceClient {
    async fn current_user(&self, token: &str) -> Result<MarketUser, UpstreamError> {
        self.get_json(token, "users/me", &[]).await
    }

    async fn search_orders(
        &self,
        token: &str,
        query: &OrderQuery,
    ) -> Result<Vec<Order>, UpstreamError> {
        let page: OrderSearchResponse = self
            .get_json(token, "orders/search", &query.params())
            .await?;
        tracing::debug!(
            seller_id = query.seller_id,
            returned = page.results.len(),
            total = page.paging.as_ref().map(|p| p.total),
            "Fetched order page"
        );
        Ok(page.results)
    }

    async fn order_detail(&self, token: &str, order_id: i64) -> Result<Order, UpstreamError> {
        self.get_json(token, &format!("orders/{order_id}"), &[]).await
    }

    async fn active_listing_ids(
        &self,
        token: &str,
        seller_id: i64,
    ) -> Result<Vec<String>, UpstreamError> {
        let page: ItemSearchResponse = self
            .get_json(
                token,
                &format!("users/{seller_id}/items/search"),
                &[
                    ("status", "active".to_string()),
                    ("limit", LISTING_PAGE_LIMIT.to_string()),
                ],
            )
            .await?;
        Ok(page.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn order_query_params() {
        let offset = FixedOffset::west_opt(3 * 3600).unwrap();
        let query = OrderQuery {
            seller_id: 123,
            created_from: offset.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap(),
            created_to: Some(
                offset
                    .with_ymd_and_hms(2026, 10, 18, 23, 59, 59)
                    .unwrap()
                    + chrono::Duration::milliseconds(999),
            ),
            limit: 100,
        };
        assert_eq!(
            query.params(),
            vec![
                ("seller", "123".to_string()),
                (
                    "order.date_created.from",
                    "2026-10-01T00:00:00.000-03:00".to_string()
                ),
                (
                    "order.date_created.to",
                    "2026-10-18T23:59:59.999-03:00".to_string()
                ),
                ("limit", "100".to_string()),
            ]
        );
    }

    #[test]
    fn open_ended_query_has_no_upper_bound() {
        let query = OrderQuery {
            seller_id: 9,
            created_from: FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(2026, 10, 18, 0, 0, 0)
                .unwrap(),
            created_to: None,
            limit: 50,
        };
        let params = query.params();
        assert!(params.iter().all(|(k, _)| *k != "order.date_created.to"));
        assert_eq!(params[1].1, "2026-10-18T00:00:00.000+00:00");
    }

    #[test]
    fn upstream_error_accessors() {
        let err = UpstreamError::Status {
            status: 400,
            body: r#"{"error":"invalid_grant"}"#.into(),
        };
        assert_eq!(err.status(), Some(400));
        assert!(err.body().contains("invalid_grant"));
        assert_eq!(UpstreamError::Decode("eof".into()).status(), None);
    }
}
