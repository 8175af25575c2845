//! Order analytics
//!
//! Every view follows the same pipeline: valid token, seller id (explicit
//! or `users/me`), date range (explicit or the view's default), one page of
//! orders sorted newest first, then a pure fold over that page. The folds
//! live in the submodules and know nothing about the network.

pub mod cost_model;
pub mod dates;
pub mod finance;
pub mod ledger;
pub mod products;
pub mod profitability;
pub mod stats;

use std::sync::Arc;

use chrono::NaiveDate;
use chrono_tz::Tz;
use futures::future::join_all;
use shared::market::Order;
use thiserror::Error;

use crate::marketplace::{OrderQuery, OrderSource, UpstreamError};
use crate::token::{CredentialError, TokenLifecycleManager};
use cost_model::CostModel;
use dates::DateRange;
use finance::FinanceChart;
use ledger::Transaction;
use products::ProductsSummary;
use profitability::ProfitabilityReport;
use stats::PeriodStats;

/// Why a view fell back to its empty value
#[derive(Debug, Error)]
pub enum ViewError {
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error("seller lookup failed: {0}")]
    Seller(UpstreamError),
    #[error("order fetch failed: {0}")]
    Orders(UpstreamError),
    #[error("listing fetch failed: {0}")]
    Listings(UpstreamError),
}

/// Caller-supplied view inputs, already validated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewParams {
    pub seller_id: Option<i64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// A computed view plus the seller and range it covers
#[derive(Debug, Clone, PartialEq)]
pub struct ViewOutput<T> {
    pub seller_id: i64,
    pub range: DateRange,
    pub value: T,
}

pub struct AnalyticsEngine {
    source: Arc<dyn OrderSource>,
    tokens: Arc<TokenLifecycleManager>,
    cost_model: CostModel,
    tz: Tz,
}

impl AnalyticsEngine {
    pub fn new(
        source: Arc<dyn OrderSource>,
        tokens: Arc<TokenLifecycleManager>,
        cost_model: CostModel,
        tz: Tz,
    ) -> Self {
        Self {
            source,
            tokens,
            cost_model,
            tz,
        }
    }

    pub fn today(&self) -> NaiveDate {
        dates::today(self.tz)
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.cost_model
    }

    async fn seller(&self, token: &str, explicit: Option<i64>) -> Result<i64, ViewError> {
        match explicit {
            Some(id) => Ok(id),
            None => self
                .source
                .current_user(token)
                .await
                .map(|user| user.id)
                .map_err(ViewError::Seller),
        }
    }

    fn range(
        params: &ViewParams,
        default_from: NaiveDate,
        default_to: Option<NaiveDate>,
    ) -> DateRange {
        DateRange {
            from: params.from.unwrap_or(default_from),
            to: params.to.or(default_to),
        }
    }

    /// First page of orders in `range`, newest first
    async fn orders(
        &self,
        token: &str,
        seller_id: i64,
        range: DateRange,
        limit: u32,
    ) -> Result<Vec<Order>, ViewError> {
        let query = OrderQuery {
            seller_id,
            created_from: dates::day_start(self.tz, range.from),
            created_to: range.to.map(|to| dates::day_end(self.tz, to)),
            limit,
        };
        let mut orders = self
            .source
            .search_orders(token, &query)
            .await
            .map_err(ViewError::Orders)?;
        // stable: equal timestamps keep upstream order
        orders.sort_by(|a, b| b.date_created.cmp(&a.date_created));
        tracing::debug!(seller_id, count = orders.len(), "Fetched orders");
        Ok(orders)
    }

    /// Token, seller and the sorted order page for one view
    async fn load(
        &self,
        params: &ViewParams,
        range: DateRange,
        limit: u32,
    ) -> Result<(String, i64, Vec<Order>), ViewError> {
        let token = self.tokens.get_valid_token().await?;
        let seller_id = self.seller(&token, params.seller_id).await?;
        let orders = self.orders(&token, seller_id, range, limit).await?;
        Ok((token, seller_id, orders))
    }

    pub async fn period_stats(
        &self,
        params: &ViewParams,
    ) -> Result<ViewOutput<PeriodStats>, ViewError> {
        let today = self.today();
        let range = Self::range(
            params,
            dates::days_before(today, stats::DEFAULT_LOOKBACK_DAYS),
            Some(today),
        );
        let (_, seller_id, orders) = self.load(params, range, stats::PAGE_LIMIT).await?;
        let totals = stats::fold(&orders, &self.cost_model, self.tz, today);
        Ok(ViewOutput {
            seller_id,
            range,
            value: PeriodStats::from(&totals),
        })
    }

    /// Chart buckets end at the range's last day
    pub async fn finance_chart(
        &self,
        params: &ViewParams,
    ) -> Result<ViewOutput<FinanceChart>, ViewError> {
        let today = self.today();
        let range = Self::range(
            params,
            dates::days_before(today, finance::DEFAULT_LOOKBACK_DAYS),
            Some(today),
        );
        let (_, seller_id, orders) = self.load(params, range, finance::PAGE_LIMIT).await?;
        let end = range.to.unwrap_or(today);
        Ok(ViewOutput {
            seller_id,
            range,
            value: finance::fold(&orders, self.tz, end),
        })
    }

    pub async fn profitability(
        &self,
        params: &ViewParams,
    ) -> Result<ViewOutput<ProfitabilityReport>, ViewError> {
        let today = self.today();
        let range = Self::range(params, dates::first_of_month(today), Some(today));
        let (_, seller_id, orders) = self.load(params, range, profitability::PAGE_LIMIT).await?;
        Ok(ViewOutput {
            seller_id,
            range,
            value: profitability::fold(&orders, &self.cost_model, self.tz),
        })
    }

    /// Ledger rows; `enriched` fetches each contributing order's detail
    /// concurrently to add buyer identity and address.
    pub async fn ledger(
        &self,
        params: &ViewParams,
        enriched: bool,
    ) -> Result<ViewOutput<Vec<Transaction>>, ViewError> {
        let range = Self::range(params, self.today(), None);
        let (token, seller_id, mut orders) = self.load(params, range, ledger::PAGE_LIMIT).await?;

        if enriched {
            orders.truncate(ledger::contributing(&orders));
            let details = join_all(
                orders
                    .iter()
                    .map(|order| self.source.order_detail(&token, order.id)),
            )
            .await;
            orders = orders
                .into_iter()
                .zip(details)
                .map(|(summary, detail)| ledger::with_detail(summary, detail))
                .collect();
        }

        Ok(ViewOutput {
            seller_id,
            range,
            value: ledger::fold(&orders, self.tz, enriched),
        })
    }

    /// Active listings and their units sold over the last 30 days.
    ///
    /// Orders are not fetched when the seller has no active listing.
    pub async fn products_summary(
        &self,
        params: &ViewParams,
    ) -> Result<ViewOutput<ProductsSummary>, ViewError> {
        let token = self.tokens.get_valid_token().await?;
        let seller_id = self.seller(&token, params.seller_id).await?;
        let range = DateRange {
            from: dates::days_before(self.today(), products::LOOKBACK_DAYS),
            to: None,
        };

        let listings = self
            .source
            .active_listing_ids(&token, seller_id)
            .await
            .map_err(ViewError::Listings)?;
        let orders = if listings.is_empty() {
            Vec::new()
        } else {
            self.orders(&token, seller_id, range, products::PAGE_LIMIT)
                .await?
        };

        Ok(ViewOutput {
            seller_id,
            range,
            value: products::fold(&listings, &orders),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::OAuthGateway;
    use crate::token::CredentialRecord;
    use crate::token::store::{InMemoryTokenStore, TokenStore};
    use async_trait::async_trait;
    use serde_json::json;
    use shared::market::{MarketUser, TokenGrant};
    use shared::util::now_millis;
    use std::sync::Mutex;

    /// Order API double recording the queries it receives
    #[derive(Default)]
    struct FakeSource {
        orders: Vec<Order>,
        listings: Vec<String>,
        fail_search: bool,
        fail_detail_for: Option<i64>,
        queries: Mutex<Vec<OrderQuery>>,
        detail_calls: Mutex<Vec<i64>>,
    }

    #[async_trait]
    impl OrderSource for FakeSource {
        async fn current_user(&self, _token: &str) -> Result<MarketUser, UpstreamError> {
            Ok(serde_json::from_value(json!({"id": 4242, "nickname": "LOJA"})).unwrap())
        }

        async fn search_orders(
            &self,
            _token: &str,
            query: &OrderQuery,
        ) -> Result<Vec<Order>, UpstreamError> {
            self.queries.lock().unwrap().push(query.clone());
            if self.fail_search {
                return Err(UpstreamError::Status {
                    status: 500,
                    body: "down".into(),
                });
            }
            Ok(self.orders.clone())
        }

        async fn order_detail(&self, _token: &str, order_id: i64) -> Result<Order, UpstreamError> {
            self.detail_calls.lock().unwrap().push(order_id);
            if self.fail_detail_for == Some(order_id) {
                return Err(UpstreamError::Decode("bad json".into()));
            }
            let mut order = self
                .orders
                .iter()
                .find(|o| o.id == order_id)
                .cloned()
                .ok_or(UpstreamError::Status {
                    status: 404,
                    body: "not found".into(),
                })?;
            order.buyer = serde_json::from_value(json!({"first_name": "Ana", "last_name": "Lima"})).unwrap();
            Ok(order)
        }

        async fn active_listing_ids(
            &self,
            _token: &str,
            _seller_id: i64,
        ) -> Result<Vec<String>, UpstreamError> {
            Ok(self.listings.clone())
        }
    }

    struct NoOAuth;

    #[async_trait]
    impl OAuthGateway for NoOAuth {
        async fn exchange_code(&self, _code: &str) -> Result<TokenGrant, UpstreamError> {
            Err(UpstreamError::Decode("unused".into()))
        }
        async fn refresh(&self, _refresh_token: &str) -> Result<TokenGrant, UpstreamError> {
            Err(UpstreamError::Decode("unused".into()))
        }
    }

    fn tz() -> Tz {
        "America/Sao_Paulo".parse().unwrap()
    }

    fn tokens(with_record: bool) -> Arc<TokenLifecycleManager> {
        let store: Arc<dyn TokenStore> = if with_record {
            let grant = TokenGrant {
                access_token: "APP-live".into(),
                token_type: Some("Bearer".into()),
                expires_in: 21600,
                scope: None,
                user_id: 4242,
                refresh_token: Some("TG-1".into()),
            };
            Arc::new(InMemoryTokenStore::with_record(CredentialRecord::from_grant(
                grant,
                now_millis(),
            )))
        } else {
            Arc::new(InMemoryTokenStore::new())
        };
        Arc::new(TokenLifecycleManager::new(store, Arc::new(NoOAuth)))
    }

    fn engine(source: Arc<FakeSource>, with_record: bool) -> AnalyticsEngine {
        AnalyticsEngine::new(source, tokens(with_record), CostModel::default(), tz())
    }

    /// Orders created "now", so they land on today's business day
    fn recent_orders() -> Vec<Order> {
        let now = chrono::Utc::now().fixed_offset();
        let earlier = now - chrono::Duration::minutes(5);
        serde_json::from_value(json!([
            {
                "id": 1, "status": "paid", "total_amount": 100,
                "date_created": earlier.to_rfc3339(),
                "order_items": [{"item": {"id": "MLB1", "title": "X"}, "quantity": 1, "unit_price": 100}],
                "shipping": {"cost": 10}
            },
            {
                "id": 2, "status": "cancelled", "total_amount": 40,
                "date_created": now.to_rfc3339(),
                "order_items": [{"item": {"id": "MLB2"}, "quantity": 1, "unit_price": 40}]
            }
        ]))
        .unwrap()
    }

    #[tokio::test]
    async fn stats_resolve_seller_and_default_range() {
        let source = Arc::new(FakeSource {
            orders: recent_orders(),
            ..Default::default()
        });
        let engine = engine(source.clone(), true);

        let out = engine.period_stats(&ViewParams::default()).await.unwrap();
        assert_eq!(out.seller_id, 4242);
        let today = engine.today();
        assert_eq!(out.range.to, Some(today));
        assert_eq!(out.range.from, dates::days_before(today, 30));
        assert_eq!(out.value.total_sales, 100.0);
        assert_eq!(out.value.cancelled, 1);
        assert_eq!(out.value.real_profit, 47.0);

        let queries = source.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].seller_id, 4242);
        assert_eq!(queries[0].limit, 100);
    }

    #[tokio::test]
    async fn explicit_params_win() {
        let source = Arc::new(FakeSource::default());
        let engine = engine(source.clone(), true);
        let from = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2026, 9, 30).unwrap();
        let params = ViewParams {
            seller_id: Some(99),
            from: Some(from),
            to: Some(to),
        };

        let out = engine.profitability(&params).await.unwrap();
        assert_eq!(out.seller_id, 99);
        assert_eq!(out.range, DateRange { from, to: Some(to) });

        let queries = source.queries.lock().unwrap();
        assert_eq!(queries[0].created_from, dates::day_start(tz(), from));
        assert_eq!(queries[0].created_to, Some(dates::day_end(tz(), to)));
    }

    #[tokio::test]
    async fn missing_credential_is_a_view_error() {
        let engine = engine(Arc::new(FakeSource::default()), false);
        let err = engine.finance_chart(&ViewParams::default()).await.unwrap_err();
        assert!(matches!(err, ViewError::Credential(CredentialError::Missing)));
    }

    #[tokio::test]
    async fn failed_search_is_a_view_error() {
        let source = Arc::new(FakeSource {
            fail_search: true,
            ..Default::default()
        });
        let err = engine(source, true)
            .period_stats(&ViewParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ViewError::Orders(_)));
    }

    #[tokio::test]
    async fn orders_are_sorted_newest_first() {
        let source = Arc::new(FakeSource {
            orders: recent_orders(),
            ..Default::default()
        });
        let out = engine(source, true)
            .ledger(&ViewParams::default(), false)
            .await
            .unwrap();
        let statuses: Vec<_> = out.value.iter().map(|t| t.status).collect();
        assert_eq!(statuses, vec!["Cancelled", "Completed"]);
        assert_eq!(out.range.to, None);
    }

    #[tokio::test]
    async fn enriched_ledger_survives_failed_detail() {
        let source = Arc::new(FakeSource {
            orders: recent_orders(),
            fail_detail_for: Some(2),
            ..Default::default()
        });
        let out = engine(source.clone(), true)
            .ledger(&ViewParams::default(), true)
            .await
            .unwrap();

        assert_eq!(out.value.len(), 2);
        let cancelled = out.value[0].buyer.as_ref().unwrap();
        assert_eq!(cancelled.buyer_name, None);
        let paid = out.value[1].buyer.as_ref().unwrap();
        assert_eq!(paid.buyer_name.as_deref(), Some("Ana Lima"));
        assert_eq!(source.detail_calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn products_skip_orders_without_listings() {
        let source = Arc::new(FakeSource {
            orders: recent_orders(),
            ..Default::default()
        });
        let out = engine(source.clone(), true)
            .products_summary(&ViewParams::default())
            .await
            .unwrap();
        assert_eq!(out.value, ProductsSummary::default());
        assert!(source.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn products_count_listed_sales() {
        let source = Arc::new(FakeSource {
            orders: recent_orders(),
            listings: vec!["MLB1".into(), "MLB2".into()],
            ..Default::default()
        });
        let out = engine(source, true)
            .products_summary(&ViewParams::default())
            .await
            .unwrap();
        assert_eq!(out.value.products_launched, 2);
        // MLB2 only appears in a cancelled order
        assert_eq!(out.value.sales_of_launched_products, 1);
    }
}
