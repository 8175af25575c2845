//! Marketplace wire model
//!
//! Read-only views of the marketplace payloads the service consumes. Every
//! field the marketplace may omit or send as `null` is optional or defaults.

mod oauth;
mod order;
mod user;

pub use oauth::TokenGrant;
pub use order::{
    BillingInfo, Buyer, ItemRef, NamedRef, Order, OrderItem, OrderSearchResponse, OrderStatus,
    Paging, Payment, ReceiverAddress, Shipping,
};
pub use user::{ItemSearchResponse, MarketUser};

use serde::{Deserialize, Deserializer};

/// Treat an explicit `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept ids the marketplace sends either as JSON strings or numbers.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(f) => f.to_string(),
    })
}
