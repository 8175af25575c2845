//! HTTP routes

pub mod health;
pub mod notifications;
pub mod oauth;
pub mod profile;
pub mod views;

use axum::Router;
use axum::routing::get;
use http::Method;
use serde::Deserialize;
use shared::error::{ApiResponse, AppError, ErrorCode};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::analytics::ViewParams;
use crate::analytics::dates::parse_date;
use crate::state::AppState;

/// Handler result: `{ok:true, ..payload}` or the error envelope
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// `?seller_id=&from=YYYY-MM-DD&to=YYYY-MM-DD`, all optional
#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    #[serde(alias = "user_id")]
    pub seller_id: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

fn present(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ViewQuery {
    /// Validate into view parameters; bad ids or dates are client errors
    pub fn params(&self) -> Result<ViewParams, AppError> {
        let seller_id = present(&self.seller_id)
            .map(|raw| {
                raw.parse::<i64>().map_err(|_| {
                    AppError::invalid_request("seller_id must be an integer")
                        .with_detail("seller_id", raw)
                })
            })
            .transpose()?;

        let date = |field: &str, raw: Option<&str>| {
            raw.map(|value| {
                parse_date(value).map_err(|_| {
                    AppError::with_message(
                        ErrorCode::InvalidDateRange,
                        format!("{field} must be YYYY-MM-DD"),
                    )
                    .with_detail(field, value)
                })
            })
            .transpose()
        };
        let from = date("from", present(&self.from))?;
        let to = date("to", present(&self.to))?;

        if let (Some(from), Some(to)) = (from, to)
            && from > to
        {
            return Err(AppError::with_message(
                ErrorCode::InvalidDateRange,
                "from must not be after to",
            ));
        }

        Ok(ViewParams { seller_id, from, to })
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let marketplace = Router::new()
        .route("/auth", get(oauth::authorize))
        .route("/callback", get(oauth::callback))
        .route("/token", get(oauth::token_status))
        .route("/me", get(profile::me))
        .route("/stats", get(views::stats))
        .route("/stats/cached", get(views::cached_stats))
        .route("/finance", get(views::finance))
        .route("/product-analysis", get(views::product_analysis))
        .route("/transactions", get(views::transactions))
        .route("/products", get(views::products))
        .route(
            "/notifications",
            get(notifications::recent).post(notifications::receive),
        );

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/ml", marketplace)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
