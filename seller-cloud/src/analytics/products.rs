//! Active listings and their recent sales

use std::collections::HashSet;

use serde::Serialize;
use shared::market::Order;

pub const PAGE_LIMIT: u32 = 100;
pub const LOOKBACK_DAYS: u64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsSummary {
    pub products_launched: u32,
    pub sales_of_launched_products: u32,
}

/// Units sold of the given listings across non-cancelled orders
pub fn fold(listing_ids: &[String], orders: &[Order]) -> ProductsSummary {
    let listings: HashSet<&str> = listing_ids.iter().map(String::as_str).collect();
    let sold = orders
        .iter()
        .filter(|o| !o.status.is_cancelled())
        .flat_map(|o| o.order_items.iter())
        .filter(|item| listings.contains(item.item.id.as_str()))
        .map(|item| item.quantity())
        .sum();

    ProductsSummary {
        products_launched: listing_ids.len() as u32,
        sales_of_launched_products: sold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counts_units_of_listed_items() {
        let orders: Vec<Order> = serde_json::from_value(json!([
            {"id": 1, "status": "paid", "date_created": "2026-10-10T10:00:00.000-03:00",
             "order_items": [
                {"item": {"id": "MLB1"}, "quantity": 3, "unit_price": 10},
                {"item": {"id": "MLB9"}, "quantity": 5, "unit_price": 10}
             ]},
            {"id": 2, "status": "shipped", "date_created": "2026-10-11T10:00:00.000-03:00",
             "order_items": [{"item": {"id": "MLB2"}, "unit_price": 10}]},
            {"id": 3, "status": "cancelled", "date_created": "2026-10-12T10:00:00.000-03:00",
             "order_items": [{"item": {"id": "MLB1"}, "quantity": 7, "unit_price": 10}]}
        ]))
        .unwrap();
        let listings = vec!["MLB1".to_string(), "MLB2".to_string(), "MLB3".to_string()];

        let summary = fold(&listings, &orders);
        assert_eq!(summary.products_launched, 3);
        assert_eq!(summary.sales_of_launched_products, 4);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(ProductsSummary::default()).unwrap();
        assert_eq!(
            json,
            json!({"productsLaunched": 0, "salesOfLaunchedProducts": 0})
        );
    }
}
