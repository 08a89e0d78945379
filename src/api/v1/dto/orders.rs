/*
 * Responsibility
 * - Orders の request/response DTO
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repos::OrderRow;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub product: String,
    pub quantity: i32,
    pub price: f64,
}

impl CreateOrderRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        let product = self.product.trim();
        if product.is_empty() {
            return Err("product is required");
        }
        if product.len() > 255 {
            return Err("product must be <= 255 chars");
        }
        if self.quantity < 1 {
            return Err("quantity must be >= 1");
        }
        // NaN も弾く
        if !(self.price.is_finite() && self.price > 0.0) {
            return Err("price must be > 0");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: i64,
    pub user_id: i64,
    pub product: String,
    pub quantity: i32,
    pub price: f64,
    pub created_at: DateTime<Utc>,
}

impl From<OrderRow> for OrderResponse {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            product: row.product,
            quantity: row.quantity,
            price: row.price,
            created_at: row.created_at,
        }
    }
}
