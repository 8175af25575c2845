//! Dashboard views
//!
//! A view that cannot be computed (no credential, marketplace down) still
//! answers `ok:true` with its empty value; the cause goes to the log.
//! Only malformed query parameters produce an error envelope.

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::util::now_millis;

use super::{ApiResult, ViewQuery};
use crate::analytics::finance::FinanceChart;
use crate::analytics::ledger::Transaction;
use crate::analytics::products::ProductsSummary;
use crate::analytics::profitability::ProfitabilityReport;
use crate::analytics::stats::{self, PeriodStats};
use crate::analytics::{ViewError, ViewOutput, dates};
use crate::db::StatsCacheEntry;
use crate::error::ServiceResult;
use crate::state::AppState;

fn fallback(view: &'static str, err: &ViewError) {
    tracing::warn!(view, error = %err, "View unavailable, answering with empty result");
}

#[derive(Debug, Serialize)]
pub struct StatsPayload {
    pub stats: PeriodStats,
}

async fn cache_stats(state: &AppState, out: &ViewOutput<PeriodStats>) {
    let Some(to) = out.range.to else {
        return;
    };
    if let Err(e) = state
        .stats_cache
        .upsert(out.seller_id, out.range.from, to, &out.value, now_millis())
        .await
    {
        tracing::warn!(seller_id = out.seller_id, error = %e, "Failed to cache period stats");
    }
}

/// GET /api/ml/stats
pub async fn stats(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> ApiResult<StatsPayload> {
    let params = query.params()?;
    let stats = match state.engine.period_stats(&params).await {
        Ok(out) => {
            cache_stats(&state, &out).await;
            out.value
        }
        Err(e) => {
            fallback("stats", &e);
            PeriodStats::default()
        }
    };
    Ok(ApiResponse::success(StatsPayload { stats }))
}

/// GET /api/ml/stats/cached
///
/// Last stored snapshot. Without `from`/`to` the seller's most recent entry
/// is returned; the seller defaults to the stored credential's owner.
pub async fn cached_stats(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> ServiceResult<ApiResponse<StatsCacheEntry>> {
    let params = query.params()?;
    let seller_id = match params.seller_id {
        Some(id) => id,
        None => state.tokens.status().await?.user_id,
    };

    let entry = if params.from.is_none() && params.to.is_none() {
        state.stats_cache.latest(seller_id).await?
    } else {
        let today = state.engine.today();
        let from = params
            .from
            .unwrap_or_else(|| dates::days_before(today, stats::DEFAULT_LOOKBACK_DAYS));
        let to = params.to.unwrap_or(today);
        state.stats_cache.get(seller_id, from, to).await?
    };

    let entry = entry.ok_or_else(|| {
        AppError::new(ErrorCode::StatsNotCached).with_detail("seller_id", seller_id)
    })?;
    Ok(ApiResponse::success(entry))
}

/// GET /api/ml/finance
pub async fn finance(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> ApiResult<FinanceChart> {
    let params = query.params()?;
    let chart = match state.engine.finance_chart(&params).await {
        Ok(out) => {
            let archive = state.archive.clone();
            let buckets = out.value.data.clone();
            let seller_id = out.seller_id;
            tokio::spawn(async move {
                if let Err(e) = archive.save_finance(seller_id, &buckets, now_millis()).await {
                    tracing::warn!(seller_id, error = %e, "Failed to archive finance buckets");
                }
            });
            out.value
        }
        Err(e) => {
            fallback("finance", &e);
            FinanceChart::zeroed(params.to.unwrap_or_else(|| state.engine.today()))
        }
    };
    Ok(ApiResponse::success(chart))
}

/// GET /api/ml/product-analysis
pub async fn product_analysis(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> ApiResult<ProfitabilityReport> {
    let params = query.params()?;
    let report = match state.engine.profitability(&params).await {
        Ok(out) => {
            let archive = state.archive.clone();
            let lines = out.value.products.clone();
            let seller_id = out.seller_id;
            tokio::spawn(async move {
                if let Err(e) = archive.save_product_lines(seller_id, &lines, now_millis()).await {
                    tracing::warn!(seller_id, error = %e, "Failed to archive product analysis");
                }
            });
            out.value
        }
        Err(e) => {
            fallback("product-analysis", &e);
            ProfitabilityReport::default()
        }
    };
    Ok(ApiResponse::success(report))
}

#[derive(Debug, Default, Deserialize)]
pub struct LedgerFlags {
    pub enriched: Option<String>,
}

impl LedgerFlags {
    fn enriched(&self) -> bool {
        matches!(self.enriched.as_deref(), Some("true" | "1"))
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionsPayload {
    pub transactions: Vec<Transaction>,
}

/// GET /api/ml/transactions[?enriched=true]
pub async fn transactions(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
    Query(flags): Query<LedgerFlags>,
) -> ApiResult<TransactionsPayload> {
    let params = query.params()?;
    let transactions = match state.engine.ledger(&params, flags.enriched()).await {
        Ok(out) => out.value,
        Err(e) => {
            fallback("transactions", &e);
            Vec::new()
        }
    };
    Ok(ApiResponse::success(TransactionsPayload { transactions }))
}

#[derive(Debug, Serialize)]
pub struct ProductsPayload {
    pub data: ProductsSummary,
}

/// GET /api/ml/products
pub async fn products(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> ApiResult<ProductsPayload> {
    let params = query.params()?;
    let data = match state.engine.products_summary(&params).await {
        Ok(out) => out.value,
        Err(e) => {
            fallback("products", &e);
            ProductsSummary::default()
        }
    };
    Ok(ApiResponse::success(ProductsPayload { data }))
}
