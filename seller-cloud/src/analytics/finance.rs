//! Weekly finance chart

use chrono::NaiveDate;
use chrono_tz::Tz;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use shared::market::Order;

use super::dates;
use crate::money::{amount, to_f64};

pub const PAGE_LIMIT: u32 = 100;
pub const DEFAULT_LOOKBACK_DAYS: u64 = 7;
pub const BUCKETS: usize = 7;
/// Bucket flagged for the dashboard regardless of data
pub const HIGHLIGHT_INDEX: usize = 2;

/// One business day of the chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceBucket {
    pub day: String,
    pub date: NaiveDate,
    /// Revenue on a 0..=100 scale
    pub renda: i64,
    /// Expenses on a 0..=100 scale
    pub despesas: i64,
    #[serde(rename = "rendaValue")]
    pub renda_value: f64,
    #[serde(rename = "despesasValue")]
    pub despesas_value: f64,
    pub highlight: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceChart {
    pub data: Vec<FinanceBucket>,
    #[serde(rename = "maxValue")]
    pub max_value: f64,
}

impl FinanceChart {
    /// Seven empty buckets ending at `end`
    pub fn zeroed(end: NaiveDate) -> Self {
        fold(&[], Tz::UTC, end)
    }
}

fn normalize(value: Decimal, max: Decimal) -> i64 {
    (value / max * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or_default()
}

/// Bucket orders into the seven business days ending at `end`.
///
/// Paid and confirmed totals count as revenue, cancelled totals as expense.
/// Orders of any other status, or outside the window, are ignored.
pub fn fold(orders: &[Order], tz: Tz, end: NaiveDate) -> FinanceChart {
    let days: Vec<NaiveDate> = (0..BUCKETS as u64)
        .rev()
        .map(|back| dates::days_before(end, back))
        .collect();
    let mut revenue = [Decimal::ZERO; BUCKETS];
    let mut expense = [Decimal::ZERO; BUCKETS];

    for order in orders {
        let local = dates::local_date(&order.date_created, tz);
        let Some(slot) = days.iter().position(|d| *d == local) else {
            continue;
        };
        if order.status.is_cancelled() {
            expense[slot] += amount(order.total());
        } else if order.status.is_settled() {
            revenue[slot] += amount(order.total());
        }
    }

    let max = revenue
        .iter()
        .chain(expense.iter())
        .copied()
        .fold(Decimal::ONE, Decimal::max);

    let data = days
        .iter()
        .enumerate()
        .map(|(i, date)| FinanceBucket {
            day: dates::weekday_letter(*date).to_string(),
            date: *date,
            renda: normalize(revenue[i], max),
            despesas: normalize(expense[i], max),
            renda_value: to_f64(revenue[i]),
            despesas_value: to_f64(expense[i]),
            highlight: i == HIGHLIGHT_INDEX,
        })
        .collect();

    FinanceChart {
        data,
        max_value: to_f64(max),
    }
}
