//! Per-product profitability report

use chrono::NaiveDate;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::market::{Order, OrderItem};

use super::cost_model::{CostModel, ProblemTag};
use super::dates;
use crate::money::{amount, round_money, to_f64};

pub const PAGE_LIMIT: u32 = 100;
const UNNAMED_PRODUCT: &str = "Produto sem nome";
const NO_SKU: &str = "N/A";

/// One order item with its derived costs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductLine {
    /// `<order id>-<item id>`
    pub id: String,
    pub product_name: String,
    pub sku: String,
    pub order_id: String,
    pub sale_price: f64,
    pub product_cost: f64,
    pub commission: f64,
    pub shipping: f64,
    pub total_costs: f64,
    pub profit: f64,
    pub margin: f64,
    pub problems: Vec<ProblemTag>,
    pub quantity: u32,
    /// dd/mm/yyyy
    pub date: String,
    #[serde(skip)]
    pub product_id: String,
    #[serde(skip)]
    pub local_date: NaiveDate,
}

impl ProductLine {
    pub fn is_profitable(&self) -> bool {
        self.profit > 0.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total: u32,
    pub with_profit: u32,
    pub with_loss: u32,
    pub total_profit: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfitabilityReport {
    pub summary: Summary,
    pub products: Vec<ProductLine>,
}

fn line(order: &Order, item: &OrderItem, model: &CostModel, tz: Tz) -> (ProductLine, Decimal) {
    let derived = model.derive_costs(
        amount(item.unit_price()),
        item.quantity(),
        amount(order.shipping_cost()),
    );
    let local_date = dates::local_date(&order.date_created, tz);
    let sku = item
        .item
        .seller_sku
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| Some(item.item.id.as_str()).filter(|id| !id.is_empty()))
        .unwrap_or(NO_SKU);

    let product = ProductLine {
        id: format!("{}-{}", order.id, item.item.id),
        product_name: item
            .item
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| UNNAMED_PRODUCT.to_string()),
        sku: sku.to_string(),
        order_id: order.id.to_string(),
        sale_price: to_f64(derived.sale_total),
        product_cost: to_f64(derived.product_cost),
        commission: to_f64(derived.commission),
        shipping: to_f64(derived.shipping_share),
        total_costs: to_f64(derived.total_costs),
        profit: to_f64(derived.profit),
        margin: to_f64(derived.margin_pct),
        problems: derived.problems,
        quantity: item.quantity(),
        date: dates::short_date(local_date),
        product_id: item.item.id.clone(),
        local_date,
    };
    (product, derived.profit)
}

/// Emit a product line for every item of every non-cancelled order.
pub fn fold(orders: &[Order], model: &CostModel, tz: Tz) -> ProfitabilityReport {
    let mut report = ProfitabilityReport::default();
    let mut total_profit = Decimal::ZERO;

    for order in orders.iter().filter(|o| !o.status.is_cancelled()) {
        for item in &order.order_items {
            let (product, profit) = line(order, item, model, tz);
            total_profit += profit;
            if product.is_profitable() {
                report.summary.with_profit += 1;
            } else {
                report.summary.with_loss += 1;
            }
            report.products.push(product);
        }
    }

    report.summary.total = report.products.len() as u32;
    report.summary.total_profit = to_f64(round_money(total_profit));
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tz() -> Tz {
        "America/Sao_Paulo".parse().unwrap()
    }

    fn orders() -> Vec<Order> {
        serde_json::from_value(json!([
            {
                "id": 2001,
                "status": "paid",
                "total_amount": 100,
                "date_created": "2026-10-05T14:00:00.000-03:00",
                "order_items": [
                    {"item": {"id": "MLB1", "title": "Caneca", "seller_sku": "CAN-01"}, "quantity": 1, "unit_price": 100}
                ],
                "shipping": {"cost": 10}
            },
            {
                "id": 2002,
                "status": "payment_required",
                "total_amount": 30,
                "date_created": "2026-10-06T09:00:00.000-03:00",
                "order_items": [
                    {"item": {"id": "MLB2"}, "quantity": 2, "unit_price": 10},
                    {"item": {"id": "MLB3", "title": "Adesivo"}, "unit_price": 10}
                ],
                "shipping": {"cost": 15}
            },
            {
                "id": 2003,
                "status": "cancelled",
                "total_amount": 500,
                "date_created": "2026-10-06T10:00:00.000-03:00",
                "order_items": [{"item": {"id": "MLB4"}, "quantity": 1, "unit_price": 500}]
            }
        ]))
        .unwrap()
    }

    #[test]
    fn lines_for_non_cancelled_orders() {
        let report = fold(&orders(), &CostModel::default(), tz());
        assert_eq!(report.products.len(), 3);
        assert!(report.products.iter().all(|p| p.order_id != "2003"));

        let first = &report.products[0];
        assert_eq!(first.id, "2001-MLB1");
        assert_eq!(first.product_name, "Caneca");
        assert_eq!(first.sku, "CAN-01");
        assert_eq!(first.sale_price, 100.0);
        assert_eq!(first.commission, 13.0);
        assert_eq!(first.product_cost, 30.0);
        assert_eq!(first.shipping, 10.0);
        assert_eq!(first.total_costs, 53.0);
        assert_eq!(first.profit, 47.0);
        assert_eq!(first.margin, 47.0);
        assert_eq!(first.date, "05/10/2026");
        assert!(first.problems.is_empty());
    }

    #[test]
    fn full_order_shipping_is_charged_to_every_item() {
        let report = fold(&orders(), &CostModel::default(), tz());
        let unnamed = &report.products[1];
        assert_eq!(unnamed.product_name, "Produto sem nome");
        assert_eq!(unnamed.sku, "MLB2");
        assert_eq!(unnamed.quantity, 2);
        assert_eq!(unnamed.sale_price, 20.0);
        assert_eq!(unnamed.shipping, 15.0);
        // 20 - 2.60 - 6.00 - 15 = -3.60
        assert_eq!(unnamed.profit, -3.6);
        assert_eq!(unnamed.problems, vec![ProblemTag::HighShipping]);

        let sticker = &report.products[2];
        assert_eq!(sticker.quantity, 1);
        assert_eq!(sticker.shipping, 15.0);
        // 10 - 1.30 - 3.00 - 15 = -9.30
        assert_eq!(sticker.profit, -9.3);
    }

    #[test]
    fn summary_counts_profitable_lines() {
        let report = fold(&orders(), &CostModel::default(), tz());
        assert_eq!(
            report.summary,
            Summary {
                total: 3,
                with_profit: 1,
                with_loss: 2,
                // 47 - 3.60 - 9.30
                total_profit: 34.1,
            }
        );
    }

    #[test]
    fn zero_profit_counts_as_loss() {
        let model = CostModel {
            commission_rate: Decimal::new(5, 1),
            product_cost_rate: Decimal::new(5, 1),
            ..CostModel::default()
        };
        let orders: Vec<Order> = serde_json::from_value(json!([{
            "id": 1, "status": "paid", "date_created": "2026-10-06T10:00:00.000-03:00",
            "order_items": [{"item": {"id": "X"}, "quantity": 1, "unit_price": 40}]
        }]))
        .unwrap();
        let report = fold(&orders, &model, tz());
        assert_eq!(report.products[0].profit, 0.0);
        assert_eq!(report.summary.with_loss, 1);
        assert_eq!(report.summary.with_profit, 0);
    }

    #[test]
    fn empty_report() {
        let report = fold(&[], &CostModel::default(), tz());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            json!({
                "summary": {"total": 0, "withProfit": 0, "withLoss": 0, "totalProfit": 0.0},
                "products": []
            })
        );
    }

    #[test]
    fn line_serializes_without_internal_fields() {
        let report = fold(&orders(), &CostModel::default(), tz());
        let json = serde_json::to_value(&report.products[1]).unwrap();
        assert_eq!(json["problems"], json!(["high shipping"]));
        assert_eq!(json["orderId"], json!("2002"));
        assert!(json.get("productId").is_none());
        assert!(json.get("localDate").is_none());
    }
}
