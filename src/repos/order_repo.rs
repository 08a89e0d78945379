/*
 * Responsibility
 * - orders CRUD
 * - user_id の FK (CASCADE) 前提で、ユーザー削除時に注文も消える
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::repos::error::RepoResult;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub user_id: i64,
    pub product: String,
    pub quantity: i32,
    pub price: f64,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait OrderRepo: Send + Sync {
    async fn create(
        &self,
        user_id: i64,
        product: &str,
        quantity: i32,
        price: f64,
    ) -> RepoResult<OrderRow>;

    async fn list_by_user(&self, user_id: i64) -> RepoResult<Vec<OrderRow>>;
}

#[derive(Clone, Debug)]
pub struct PgOrderRepo {
    pool: PgPool,
}

impl PgOrderRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepo for PgOrderRepo {
    async fn create(
        &self,
        user_id: i64,
        product: &str,
        quantity: i32,
        price: f64,
    ) -> RepoResult<OrderRow> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            INSERT INTO orders (user_id, product, quantity, price)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, product, quantity, price, created_at
            "#,
        )
        .bind(user_id)
        .bind(product)
        .bind(quantity)
        .bind(price)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_by_user(&self, user_id: i64) -> RepoResult<Vec<OrderRow>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, product, quantity, price, created_at
            FROM orders
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
