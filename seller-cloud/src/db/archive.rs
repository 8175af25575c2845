//! Relational archive of seller data
//!
//! Upsert-by-natural-key writes for seller profiles, daily finance buckets
//! and product-analysis lines. Writes run after the response is computed
//! and never affect it.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::market::MarketUser;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::analytics::finance::FinanceBucket;
use crate::analytics::profitability::ProductLine;

#[async_trait]
pub trait SellerArchive: Send + Sync {
    /// Upsert a profile by marketplace user id
    async fn upsert_user(&self, user: &MarketUser, now: i64) -> Result<(), sqlx::Error>;

    /// Upsert chart buckets by (seller, date)
    async fn save_finance(
        &self,
        seller_id: i64,
        buckets: &[FinanceBucket],
        now: i64,
    ) -> Result<(), sqlx::Error>;

    /// Upsert product lines by line id
    async fn save_product_lines(
        &self,
        seller_id: i64,
        lines: &[ProductLine],
        now: i64,
    ) -> Result<(), sqlx::Error>;
}

// ── PostgreSQL ──

/// Full profile for the `ml_data` column
fn profile_json(user: &MarketUser) -> Result<serde_json::Value, sqlx::Error> {
    serde_json::to_value(user).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

pub struct PgSellerArchive {
    pool: PgPool,
}

impl PgSellerArchive {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SellerArchive for PgSellerArchive {
    async fn upsert_user(&self, user: &MarketUser, now: i64) -> Result<(), sqlx::Error> {
        let raw = profile_json(user)?;
        sqlx::query(
            r#"
            INSERT INTO users (ml_user_id, nickname, email, first_name, last_name, picture,
                               ml_data, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            ON CONFLICT (ml_user_id) DO UPDATE SET
                nickname = EXCLUDED.nickname,
                email = EXCLUDED.email,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                picture = EXCLUDED.picture,
                ml_data = EXCLUDED.ml_data,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.nickname)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.picture())
        .bind(raw)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_finance(
        &self,
        seller_id: i64,
        buckets: &[FinanceBucket],
        now: i64,
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for bucket in buckets {
            sqlx::query(
                r#"
                INSERT INTO financial_data (user_id, date, day_label, revenue, expenses,
                                            revenue_value, expenses_value, is_highlight, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (user_id, date) DO UPDATE SET
                    day_label = EXCLUDED.day_label,
                    revenue = EXCLUDED.revenue,
                    expenses = EXCLUDED.expenses,
                    revenue_value = EXCLUDED.revenue_value,
                    expenses_value = EXCLUDED.expenses_value,
                    is_highlight = EXCLUDED.is_highlight,
                    updated_at = EXCLUDED.updated_at
                "#,
            )
            .bind(seller_id)
            .bind(bucket.date)
            .bind(&bucket.day)
            .bind(bucket.renda as i32)
            .bind(bucket.despesas as i32)
            .bind(bucket.renda_value)
            .bind(bucket.despesas_value)
            .bind(bucket.highlight)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn save_product_lines(
        &self,
        seller_id: i64,
        lines: &[ProductLine],
        now: i64,
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for line in lines {
            let problems: Vec<String> =
                line.problems.iter().map(|p| p.label().to_string()).collect();
            sqlx::query(
                r#"
                INSERT INTO product_analysis (line_id, user_id, order_id, product_id, product_name,
                    sku, sale_price, product_cost, commission, shipping, total_costs, profit,
                    margin, quantity, problems, analysis_date, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
                ON CONFLICT (line_id) DO UPDATE SET
                    product_name = EXCLUDED.product_name,
                    sku = EXCLUDED.sku,
                    sale_price = EXCLUDED.sale_price,
                    product_cost = EXCLUDED.product_cost,
                    commission = EXCLUDED.commission,
                    shipping = EXCLUDED.shipping,
                    total_costs = EXCLUDED.total_costs,
                    profit = EXCLUDED.profit,
                    margin = EXCLUDED.margin,
                    quantity = EXCLUDED.quantity,
                    problems = EXCLUDED.problems,
                    analysis_date = EXCLUDED.analysis_date,
                    updated_at = EXCLUDED.updated_at
                "#,
            )
            .bind(&line.id)
            .bind(seller_id)
            .bind(&line.order_id)
            .bind(&line.product_id)
            .bind(&line.product_name)
            .bind(&line.sku)
            .bind(line.sale_price)
            .bind(line.product_cost)
            .bind(line.commission)
            .bind(line.shipping)
            .bind(line.total_costs)
            .bind(line.profit)
            .bind(line.margin)
            .bind(i32::try_from(line.quantity).unwrap_or(i32::MAX))
            .bind(problems)
            .bind(line.local_date)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

// ── In-memory ──

/// Keeps the latest write per natural key
#[derive(Default)]
pub struct InMemoryArchive {
    pub users: RwLock<HashMap<i64, MarketUser>>,
    pub finance: RwLock<HashMap<(i64, NaiveDate), FinanceBucket>>,
    pub product_lines: RwLock<HashMap<String, ProductLine>>,
}

impl InMemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SellerArchive for InMemoryArchive {
    async fn upsert_user(&self, user: &MarketUser, _now: i64) -> Result<(), sqlx::Error> {
        self.users.write().await.insert(user.id, user.clone());
        Ok(())
    }

    async fn save_finance(
        &self,
        seller_id: i64,
        buckets: &[FinanceBucket],
        _now: i64,
    ) -> Result<(), sqlx::Error> {
        let mut finance = self.finance.write().await;
        for bucket in buckets {
            finance.insert((seller_id, bucket.date), bucket.clone());
        }
        Ok(())
    }

    async fn save_product_lines(
        &self,
        _seller_id: i64,
        lines: &[ProductLine],
        _now: i64,
    ) -> Result<(), sqlx::Error> {
        let mut stored = self.product_lines.write().await;
        for line in lines {
            stored.insert(line.id.clone(), line.clone());
        }
        Ok(())
    }
}
