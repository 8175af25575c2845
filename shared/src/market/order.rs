use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::{null_as_default, string_or_number};

/// Order status as reported by the marketplace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Paid,
    Confirmed,
    Cancelled,
    PaymentRequired,
    /// Any status this service does not classify
    #[default]
    #[serde(other)]
    Other,
}

impl OrderStatus {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Paid or confirmed orders count as realized revenue
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Paid | Self::Confirmed)
    }

    /// Orders still waiting to ship
    pub fn is_pending_shipment(&self) -> bool {
        matches!(self, Self::Confirmed | Self::PaymentRequired)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: OrderStatus,
    pub date_created: DateTime<FixedOffset>,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub buyer: Option<Buyer>,
    #[serde(default)]
    pub shipping: Option<Shipping>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub order_items: Vec<OrderItem>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub payments: Vec<Payment>,
}

impl Order {
    pub fn total(&self) -> f64 {
        self.total_amount.unwrap_or(0.0)
    }

    pub fn shipping_cost(&self) -> f64 {
        self.shipping.as_ref().and_then(|s| s.cost).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub item: ItemRef,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub unit_price: Option<f64>,
}

impl OrderItem {
    /// Quantity, with a missing or zero value counted as one unit
    pub fn quantity(&self) -> u32 {
        self.quantity.filter(|q| *q > 0).unwrap_or(1)
    }

    pub fn unit_price(&self) -> f64 {
        self.unit_price.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRef {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub seller_sku: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Shipping {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub receiver_address: Option<ReceiverAddress>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceiverAddress {
    #[serde(default)]
    pub address_line: Option<String>,
    #[serde(default)]
    pub street_name: Option<String>,
    #[serde(default)]
    pub street_number: Option<String>,
    #[serde(default)]
    pub city: Option<NamedRef>,
    #[serde(default)]
    pub state: Option<NamedRef>,
    #[serde(default)]
    pub zip_code: Option<String>,
}

impl ReceiverAddress {
    /// Present, non-blank parts in display order: address line, street
    /// name, street number, city, state, postal code.
    pub fn parts(&self) -> Vec<&str> {
        [
            self.address_line.as_deref(),
            self.street_name.as_deref(),
            self.street_number.as_deref(),
            self.city.as_ref().and_then(|c| c.name.as_deref()),
            self.state.as_ref().and_then(|s| s.name.as_deref()),
            self.zip_code.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamedRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Buyer {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub billing_info: Option<BillingInfo>,
}

impl Buyer {
    /// "First Last" from whichever parts are present
    pub fn full_name(&self) -> Option<String> {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!name.is_empty()).then_some(name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillingInfo {
    #[serde(default)]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub doc_number: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Payment {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub transaction_amount: Option<f64>,
}

/// One page of `orders/search`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderSearchResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<Order>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub limit: u64,
}
