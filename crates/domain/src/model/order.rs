//! Order - products bought by one account
//!
//! Line items snapshot the unit price at order time, so later catalog price
//! changes never alter an existing order's total.

use chrono::{DateTime, Utc};

use super::Record;

/// One product line inside an order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedProduct {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: f64,
}

impl OrderedProduct {
    pub fn subtotal(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub account_id: String,
    pub total_price: f64,
    pub products: Vec<OrderedProduct>,
}

impl Order {
    /// Sum of all line subtotals
    pub fn compute_total(products: &[OrderedProduct]) -> f64 {
        products.iter().map(OrderedProduct::subtotal).sum()
    }
}

impl Record for Order {
    const KIND: &'static str = "order";

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_total() {
        let products = vec![
            OrderedProduct {
                product_id: "p1".to_string(),
                quantity: 2,
                unit_price: 1.5,
            },
            OrderedProduct {
                product_id: "p2".to_string(),
                quantity: 1,
                unit_price: 10.0,
            },
        ];

        assert_eq!(Order::compute_total(&products), 13.0);
        assert_eq!(Order::compute_total(&[]), 0.0);
    }
}
