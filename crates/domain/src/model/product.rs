//! Product - a catalog entry

use super::Record;

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
}

impl Record for Product {
    const KIND: &'static str = "product";

    fn id(&self) -> &str {
        &self.id
    }
}
