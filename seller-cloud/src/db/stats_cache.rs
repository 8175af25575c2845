//! Last computed period statistics per (seller, from, to)
//!
//! Entries have no TTL. Each upsert overwrites the stats and moves
//! `calculated_at` strictly forward, even when two writes land in the same
//! millisecond.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::analytics::stats::PeriodStats;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsCacheEntry {
    pub seller_id: i64,
    #[serde(rename = "from")]
    pub from_date: NaiveDate,
    #[serde(rename = "to")]
    pub to_date: NaiveDate,
    pub stats: PeriodStats,
    /// Milliseconds since epoch
    pub calculated_at: i64,
}

#[async_trait]
pub trait StatsCache: Send + Sync {
    /// Insert or overwrite the entry for the key
    async fn upsert(
        &self,
        seller_id: i64,
        from: NaiveDate,
        to: NaiveDate,
        stats: &PeriodStats,
        now: i64,
    ) -> Result<StatsCacheEntry, sqlx::Error>;

    async fn get(
        &self,
        seller_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Option<StatsCacheEntry>, sqlx::Error>;

    /// Most recently calculated entry of a seller, any range
    async fn latest(&self, seller_id: i64) -> Result<Option<StatsCacheEntry>, sqlx::Error>;
}

// ── PostgreSQL ──

pub struct PgStatsCache {
    pool: PgPool,
}

impl PgStatsCache {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct StatsRow {
    user_id: i64,
    from_date: NaiveDate,
    to_date: NaiveDate,
    total_sales: f64,
    today_sales: i32,
    pending_shipments: i32,
    cancelled: i32,
    total_orders: i32,
    net_revenue: f64,
    real_profit: f64,
    margin: f64,
    calculated_at: i64,
}

impl From<StatsRow> for StatsCacheEntry {
    fn from(row: StatsRow) -> Self {
        Self {
            seller_id: row.user_id,
            from_date: row.from_date,
            to_date: row.to_date,
            stats: PeriodStats {
                total_sales: row.total_sales,
                today_sales: row.today_sales.max(0) as u32,
                pending_shipments: row.pending_shipments.max(0) as u32,
                cancelled: row.cancelled.max(0) as u32,
                total_orders: row.total_orders.max(0) as u32,
                net_revenue: row.net_revenue,
                real_profit: row.real_profit,
                margin: row.margin,
            },
            calculated_at: row.calculated_at,
        }
    }
}

const SELECT_COLUMNS: &str = "SELECT user_id, from_date, to_date, total_sales, today_sales, \
    pending_shipments, cancelled, total_orders, net_revenue, real_profit, margin, calculated_at \
    FROM stats_cache";

fn count(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

#[async_trait]
impl StatsCache for PgStatsCache {
    async fn upsert(
        &self,
        seller_id: i64,
        from: NaiveDate,
        to: NaiveDate,
        stats: &PeriodStats,
        now: i64,
    ) -> Result<StatsCacheEntry, sqlx::Error> {
        let (calculated_at,): (i64,) = sqlx::query_as(
            "INSERT INTO stats_cache (user_id, from_date, to_date, total_sales, today_sales,
                pending_shipments, cancelled, total_orders, net_revenue, real_profit, margin, calculated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             ON CONFLICT (user_id, from_date, to_date) DO UPDATE SET
                total_sales = EXCLUDED.total_sales,
                today_sales = EXCLUDED.today_sales,
                pending_shipments = EXCLUDED.pending_shipments,
                cancelled = EXCLUDED.cancelled,
                total_orders = EXCLUDED.total_orders,
                net_revenue = EXCLUDED.net_revenue,
                real_profit = EXCLUDED.real_profit,
                margin = EXCLUDED.margin,
                calculated_at = GREATEST(stats_cache.calculated_at + 1, EXCLUDED.calculated_at)
             RETURNING calculated_at",
        )
        .bind(seller_id)
        .bind(from)
        .bind(to)
        .bind(stats.total_sales)
        .bind(count(stats.today_sales))
        .bind(count(stats.pending_shipments))
        .bind(count(stats.cancelled))
        .bind(count(stats.total_orders))
        .bind(stats.net_revenue)
        .bind(stats.real_profit)
        .bind(stats.margin)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(StatsCacheEntry {
            seller_id,
            from_date: from,
            to_date: to,
            stats: stats.clone(),
            calculated_at,
        })
    }

    async fn get(
        &self,
        seller_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Option<StatsCacheEntry>, sqlx::Error> {
        let row: Option<StatsRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE user_id = $1 AND from_date = $2 AND to_date = $3"
        ))
        .bind(seller_id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn latest(&self, seller_id: i64) -> Result<Option<StatsCacheEntry>, sqlx::Error> {
        let row: Option<StatsRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE user_id = $1 ORDER BY calculated_at DESC LIMIT 1"
        ))
        .bind(seller_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }
}

// ── In-memory ──

type CacheKey = (i64, NaiveDate, NaiveDate);

#[derive(Default)]
pub struct InMemoryStatsCache {
    entries: RwLock<HashMap<CacheKey, StatsCacheEntry>>,
}

impl InMemoryStatsCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatsCache for InMemoryStatsCache {
    async fn upsert(
        &self,
        seller_id: i64,
        from: NaiveDate,
        to: NaiveDate,
        stats: &PeriodStats,
        now: i64,
    ) -> Result<StatsCacheEntry, sqlx::Error> {
        let mut entries = self.entries.write().await;
        let calculated_at = match entries.get(&(seller_id, from, to)) {
            Some(prev) => now.max(prev.calculated_at + 1),
            None => now,
        };
        let entry = StatsCacheEntry {
            seller_id,
            from_date: from,
            to_date: to,
            stats: stats.clone(),
            calculated_at,
        };
        entries.insert((seller_id, from, to), entry.clone());
        Ok(entry)
    }

    async fn get(
        &self,
        seller_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Option<StatsCacheEntry>, sqlx::Error> {
        Ok(self.entries.read().await.get(&(seller_id, from, to)).cloned())
    }

    async fn latest(&self, seller_id: i64) -> Result<Option<StatsCacheEntry>, sqlx::Error> {
        Ok(self
            .entries
            .read()
            .await
            .values()
            .filter(|e| e.seller_id == seller_id)
            .max_by_key(|e| e.calculated_at)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, day).unwrap()
    }

    fn stats(total: f64) -> PeriodStats {
        PeriodStats {
            total_sales: total,
            total_orders: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn upsert_is_idempotent_on_key() {
        let cache = InMemoryStatsCache::new();
        cache.upsert(1, d(1), d(18), &stats(10.0), 1_000).await.unwrap();
        cache.upsert(1, d(1), d(18), &stats(25.0), 2_000).await.unwrap();

        let entry = cache.get(1, d(1), d(18)).await.unwrap().unwrap();
        assert_eq!(entry.stats.total_sales, 25.0);
        assert_eq!(entry.calculated_at, 2_000);
        assert_eq!(cache.entries.read().await.len(), 1);
    }

    #[tokio::test]
    async fn calculated_at_strictly_advances() {
        let cache = InMemoryStatsCache::new();
        let first = cache.upsert(1, d(1), d(18), &stats(1.0), 5_000).await.unwrap();
        // same millisecond
        let second = cache.upsert(1, d(1), d(18), &stats(1.0), 5_000).await.unwrap();
        // clock stepped back
        let third = cache.upsert(1, d(1), d(18), &stats(1.0), 4_000).await.unwrap();
        assert!(second.calculated_at > first.calculated_at);
        assert!(third.calculated_at > second.calculated_at);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let cache = InMemoryStatsCache::new();
        cache.upsert(1, d(1), d(18), &stats(1.0), 1_000).await.unwrap();
        cache.upsert(1, d(2), d(18), &stats(2.0), 3_000).await.unwrap();
        cache.upsert(2, d(1), d(18), &stats(3.0), 9_000).await.unwrap();

        assert!(cache.get(1, d(3), d(18)).await.unwrap().is_none());
        let latest = cache.latest(1).await.unwrap().unwrap();
        assert_eq!(latest.from_date, d(2));
        assert_eq!(latest.stats.total_sales, 2.0);
        assert!(cache.latest(3).await.unwrap().is_none());
    }

    #[test]
    fn entry_serializes_range_keys() {
        let entry = StatsCacheEntry {
            seller_id: 7,
            from_date: d(1),
            to_date: d(18),
            stats: PeriodStats::default(),
            calculated_at: 42,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["from"], "2026-10-01");
        assert_eq!(json["to"], "2026-10-18");
        assert_eq!(json["calculatedAt"], 42);
        assert_eq!(json["sellerId"], 7);
        assert!(json["stats"].get("totalSales").is_some());
    }
}
