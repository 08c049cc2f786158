//! Operations accepted by the gateway
//!
//! ```json
//! {"op": "account", "id": "01HV...", "select": {"orders": {"products": true}}}
//! {"op": "create_order", "account_id": "01HV...", "products": [{"product_id": "01HW...", "quantity": 2}]}
//! ```

use serde::Deserialize;
use shared::PageRequest;

/// Nested fields requested on an account
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AccountSelection {
    /// Resolve the account's orders with this selection
    pub orders: Option<OrderSelection>,
}

/// Nested fields requested on an order
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OrderSelection {
    /// Resolve each line's current catalog entry
    pub products: bool,
}

/// Product and quantity for an order line; the price is looked up by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LineRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Account {
        id: String,
        #[serde(default)]
        select: AccountSelection,
    },
    Accounts {
        #[serde(default)]
        page: PageRequest,
        #[serde(default)]
        select: AccountSelection,
    },
    Product {
        id: String,
    },
    Products {
        #[serde(default)]
        page: PageRequest,
    },
    Order {
        id: String,
        #[serde(default)]
        select: OrderSelection,
    },
    CreateAccount {
        name: String,
        email: String,
        password: String,
    },
    UpdateAccount {
        id: String,
        name: String,
        email: String,
        #[serde(default)]
        password: Option<String>,
    },
    DeleteAccount {
        id: String,
    },
    CreateProduct {
        name: String,
        #[serde(default)]
        description: String,
        price: f64,
    },
    UpdateProduct {
        id: String,
        name: String,
        #[serde(default)]
        description: String,
        price: f64,
    },
    DeleteProduct {
        id: String,
    },
    CreateOrder {
        account_id: String,
        products: Vec<LineRequest>,
    },
    UpdateOrder {
        id: String,
        account_id: String,
        products: Vec<LineRequest>,
    },
    DeleteOrder {
        id: String,
    },
}

impl Operation {
    /// Root field name; also the key of the payload in the response
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Account { .. } => "account",
            Operation::Accounts { .. } => "accounts",
            Operation::Product { .. } => "product",
            Operation::Products { .. } => "products",
            Operation::Order { .. } => "order",
            Operation::CreateAccount { .. } => "create_account",
            Operation::UpdateAccount { .. } => "update_account",
            Operation::DeleteAccount { .. } => "delete_account",
            Operation::CreateProduct { .. } => "create_product",
            Operation::UpdateProduct { .. } => "update_product",
            Operation::DeleteProduct { .. } => "delete_product",
            Operation::CreateOrder { .. } => "create_order",
            Operation::UpdateOrder { .. } => "update_order",
            Operation::DeleteOrder { .. } => "delete_order",
        }
    }

    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Operation::Account { .. }
                | Operation::Accounts { .. }
                | Operation::Product { .. }
                | Operation::Products { .. }
                | Operation::Order { .. }
        )
    }
}

// Never prints credentials
impl core::fmt::Debug for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Operation({})", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_account_query_with_nested_selection() {
        let op: Operation = serde_json::from_value(json!({
            "op": "account",
            "id": "a-1",
            "select": {"orders": {"products": true}}
        }))
        .unwrap();

        match op {
            Operation::Account { id, select } => {
                assert_eq!(id, "a-1");
                assert_eq!(select.orders, Some(OrderSelection { products: true }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_selection_defaults_to_nothing_nested() {
        let op: Operation = serde_json::from_value(json!({"op": "accounts"})).unwrap();
        match op {
            Operation::Accounts { page, select } => {
                assert_eq!(page, PageRequest::default());
                assert!(select.orders.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_debug_hides_password() {
        let op: Operation = serde_json::from_value(json!({
            "op": "create_account",
            "name": "Ada",
            "email": "ada@example.com",
            "password": "hunter2hunter2"
        }))
        .unwrap();
        assert_eq!(format!("{:?}", op), "Operation(create_account)");
        assert!(op.is_mutation());
    }

    #[test]
    fn test_unknown_op_rejected() {
        let result = serde_json::from_value::<Operation>(json!({"op": "drop_tables"}));
        assert!(result.is_err());
    }
}
