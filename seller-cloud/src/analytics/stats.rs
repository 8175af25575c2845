//! Period statistics

use chrono::NaiveDate;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::market::Order;

use super::cost_model::{CostModel, sale_total};
use super::dates;
use crate::money::{amount, round_money, to_f64};

pub const PAGE_LIMIT: u32 = 100;
pub const DEFAULT_LOOKBACK_DAYS: u64 = 30;

/// Dashboard headline numbers for a date range
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodStats {
    pub total_sales: f64,
    pub today_sales: u32,
    pub pending_shipments: u32,
    pub cancelled: u32,
    pub total_orders: u32,
    pub net_revenue: f64,
    pub real_profit: f64,
    /// Percent of total sales
    pub margin: f64,
}

/// Exact accumulators behind [`PeriodStats`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodTotals {
    pub total_sales: Decimal,
    pub total_commissions: Decimal,
    pub total_product_costs: Decimal,
    pub total_shipping: Decimal,
    pub today_sales: u32,
    pub pending_shipments: u32,
    pub cancelled: u32,
    pub total_orders: u32,
}

impl PeriodTotals {
    pub fn net_revenue(&self) -> Decimal {
        self.total_sales - self.total_commissions
    }

    pub fn real_profit(&self) -> Decimal {
        self.net_revenue() - self.total_product_costs - self.total_shipping
    }

    pub fn margin_pct(&self) -> Decimal {
        if self.total_sales > Decimal::ZERO {
            round_money(self.real_profit() / self.total_sales * Decimal::ONE_HUNDRED)
        } else {
            Decimal::ZERO
        }
    }
}

impl From<&PeriodTotals> for PeriodStats {
    fn from(t: &PeriodTotals) -> Self {
        Self {
            total_sales: to_f64(t.total_sales),
            today_sales: t.today_sales,
            pending_shipments: t.pending_shipments,
            cancelled: t.cancelled,
            total_orders: t.total_orders,
            net_revenue: to_f64(t.net_revenue()),
            real_profit: to_f64(t.real_profit()),
            margin: to_f64(t.margin_pct()),
        }
    }
}

/// Classify and sum a page of orders.
///
/// Cancelled orders only bump `cancelled`. Every other order adds its total
/// to sales, its items' commission and product cost, and its shipping cost
/// once.
pub fn fold(orders: &[Order], model: &CostModel, tz: Tz, today: NaiveDate) -> PeriodTotals {
    let mut totals = PeriodTotals::default();

    for order in orders {
        if order.status.is_pending_shipment() {
            totals.pending_shipments += 1;
        }
        if order.status.is_cancelled() {
            totals.cancelled += 1;
            continue;
        }

        totals.total_orders += 1;
        totals.total_sales += amount(order.total());
        totals.total_shipping += amount(order.shipping_cost());
        if dates::local_date(&order.date_created, tz) >= today {
            totals.today_sales += 1;
        }

        for item in &order.order_items {
            let sale_total = sale_total(amount(item.unit_price()), item.quantity());
            totals.total_commissions += model.commission_for(sale_total);
            totals.total_product_costs += model.product_cost_for(sale_total);
        }
    }

    totals
}
