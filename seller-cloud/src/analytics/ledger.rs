//! Transaction ledger

use chrono_tz::Tz;
use serde::Serialize;
use shared::market::{Order, OrderStatus};

use super::dates;
use crate::marketplace::UpstreamError;
use crate::money::{amount, to_f64};

pub const PAGE_LIMIT: u32 = 50;
pub const MAX_ROWS: usize = 20;
const UNNAMED_PRODUCT: &str = "Produto sem nome";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Order id; every item of an order shares it
    pub id: String,
    pub product_name: String,
    /// Long pt-BR form, `18 de outubro de 2026`
    pub date: String,
    pub status: &'static str,
    pub quantity: u32,
    pub price: f64,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub buyer: Option<BuyerDetails>,
}

/// Buyer identity and shipping address of the enriched ledger
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerDetails {
    pub buyer_name: Option<String>,
    pub buyer_nickname: Option<String>,
    pub buyer_document: Option<String>,
    pub buyer_address: Option<String>,
}

impl BuyerDetails {
    pub fn from_order(order: &Order) -> Self {
        let buyer = order.buyer.as_ref();
        let address = order
            .shipping
            .as_ref()
            .and_then(|s| s.receiver_address.as_ref())
            .map(|a| a.parts().join(", "))
            .filter(|a| !a.is_empty());

        Self {
            buyer_name: buyer.and_then(|b| b.full_name()),
            buyer_nickname: buyer.and_then(|b| b.nickname.clone()),
            buyer_document: buyer
                .and_then(|b| b.billing_info.as_ref())
                .and_then(|info| info.doc_number.clone()),
            buyer_address: address,
        }
    }
}

pub fn status_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Paid | OrderStatus::Confirmed => "Completed",
        OrderStatus::Cancelled => "Cancelled",
        OrderStatus::PaymentRequired | OrderStatus::Other => "Pending",
    }
}

/// Number of leading orders whose items fill the ledger
pub fn contributing(orders: &[Order]) -> usize {
    let mut rows = 0;
    for (i, order) in orders.iter().enumerate() {
        if rows >= MAX_ROWS {
            return i;
        }
        rows += order.order_items.len();
    }
    orders.len()
}

/// Overlay buyer and shipping from a detail fetch onto the summary order.
///
/// A failed fetch keeps the summary's own fields.
pub fn with_detail(mut summary: Order, detail: Result<Order, UpstreamError>) -> Order {
    match detail {
        Ok(detail) => {
            if detail.buyer.is_some() {
                summary.buyer = detail.buyer;
            }
            if detail.shipping.is_some() {
                summary.shipping = detail.shipping;
            }
        }
        Err(e) => {
            tracing::warn!(
                order_id = summary.id,
                error = %e,
                "Order detail fetch failed, using summary fields"
            );
        }
    }
    summary
}

/// One row per item of every order, capped at [`MAX_ROWS`].
pub fn fold(orders: &[Order], tz: Tz, enriched: bool) -> Vec<Transaction> {
    orders
        .iter()
        .flat_map(|order| {
            let date = dates::long_date(dates::local_date(&order.date_created, tz));
            let status = status_label(order.status);
            let buyer = enriched.then(|| BuyerDetails::from_order(order));
            order.order_items.iter().map(move |item| Transaction {
                id: order.id.to_string(),
                product_name: item
                    .item
                    .title
                    .clone()
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| UNNAMED_PRODUCT.to_string()),
                date: date.clone(),
                status,
                quantity: item.quantity(),
                price: to_f64(amount(item.unit_price())),
                buyer: buyer.clone(),
            })
        })
        .take(MAX_ROWS)
        .collect()
}
