//! Heuristic cost model
//!
//! The marketplace does not report a seller's real costs, so every sale is
//! charged fixed percentages for commission and product cost plus the
//! order's full shipping cost.

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::money::round_money;

/// Problem flags raised on a line item. Flags are independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProblemTag {
    HighCommission,
    HighShipping,
    HighProductCost,
}

impl ProblemTag {
    pub fn label(&self) -> &'static str {
        match self {
            Self::HighCommission => "high commission",
            Self::HighShipping => "high shipping",
            Self::HighProductCost => "high product cost",
        }
    }
}

impl Serialize for ProblemTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Rates and problem thresholds, all fractions of the sale total
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub commission_rate: Decimal,
    pub product_cost_rate: Decimal,
    pub high_commission_ratio: Decimal,
    pub high_shipping_ratio: Decimal,
    pub high_product_cost_ratio: Decimal,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            commission_rate: Decimal::new(13, 2),
            product_cost_rate: Decimal::new(30, 2),
            high_commission_ratio: Decimal::new(15, 2),
            high_shipping_ratio: Decimal::new(25, 2),
            high_product_cost_ratio: Decimal::new(5, 1),
        }
    }
}

/// Unit price times quantity, rounded to cents
pub fn sale_total(unit_price: Decimal, quantity: u32) -> Decimal {
    round_money(unit_price * Decimal::from(quantity))
}

/// Costs derived for one order item
///
/// Monetary fields are rounded to cents; `total_costs` and `profit` are
/// exact sums of the rounded parts. `margin_pct` is unrounded.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedLineItem {
    pub sale_total: Decimal,
    pub commission: Decimal,
    pub shipping_share: Decimal,
    pub product_cost: Decimal,
    pub total_costs: Decimal,
    pub profit: Decimal,
    pub margin_pct: Decimal,
    pub problems: Vec<ProblemTag>,
}

impl CostModel {
    /// Derive commission, product cost, profit and margin for a sale.
    ///
    /// `shipping_cost` is the order's shipping cost, charged in full to
    /// every item of the order.
    pub fn derive_costs(
        &self,
        unit_price: Decimal,
        quantity: u32,
        shipping_cost: Decimal,
    ) -> DerivedLineItem {
        let sale_total = sale_total(unit_price, quantity);
        let commission = round_money(sale_total * self.commission_rate);
        let product_cost = round_money(sale_total * self.product_cost_rate);
        let shipping_share = round_money(shipping_cost);

        let total_costs = commission + shipping_share + product_cost;
        let profit = sale_total - total_costs;

        let mut problems = Vec::new();
        let margin_pct = if sale_total > Decimal::ZERO {
            if commission / sale_total > self.high_commission_ratio {
                problems.push(ProblemTag::HighCommission);
            }
            if shipping_share / sale_total > self.high_shipping_ratio {
                problems.push(ProblemTag::HighShipping);
            }
            if product_cost / sale_total > self.high_product_cost_ratio {
                problems.push(ProblemTag::HighProductCost);
            }
            profit / sale_total * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };

        DerivedLineItem {
            sale_total,
            commission,
            shipping_share,
            product_cost,
            total_costs,
            profit,
            margin_pct,
            problems,
        }
    }

    /// Commission charged on a sale total
    pub fn commission_for(&self, sale_total: Decimal) -> Decimal {
        round_money(sale_total * self.commission_rate)
    }

    /// Estimated product cost for a sale total
    pub fn product_cost_for(&self, sale_total: Decimal) -> Decimal {
        round_money(sale_total * self.product_cost_rate)
    }
}
