/*
 * Responsibility
 * - users テーブル向け SQLx 操作
 * - UserRepo trait で抽象化し、認可ゲート/ログインからは trait object として使う
 * - DB エラーは RepoError に変換して返す (unique 違反は Conflict)
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::repos::error::{RepoError, RepoResult};

#[derive(Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for UserRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print the password hash
        f.debug_struct("UserRow")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("age", &self.age)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<i32>,
}

#[derive(Debug, Clone, Copy)]
pub struct UserFilter {
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    pub limit: i64,
    pub offset: i64,
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn create(
        &self,
        name: &str,
        email: &str,
        age: i32,
        password_hash: &str,
    ) -> RepoResult<UserRow>;

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<UserRow>>;

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<UserRow>>;

    async fn update(&self, id: i64, patch: UserPatch) -> RepoResult<Option<UserRow>>;

    async fn delete(&self, id: i64) -> RepoResult<bool>;

    /// Returns one page of users plus the total count matching the filter.
    async fn list(&self, filter: UserFilter) -> RepoResult<(Vec<UserRow>, i64)>;
}

#[derive(Clone, Debug)]
pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn create(
        &self,
        name: &str,
        email: &str,
        age: i32,
        password_hash: &str,
    ) -> RepoResult<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (name, email, age, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, age, password_hash, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(age)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(row)
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, age, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, age, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update(&self, id: i64, patch: UserPatch) -> RepoResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                age = COALESCE($4, age)
            WHERE id = $1
            RETURNING id, name, email, age, password_hash, created_at
            "#,
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.email)
        .bind(patch.age)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(row)
    }

    async fn delete(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, filter: UserFilter) -> RepoResult<(Vec<UserRow>, i64)> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM users
            WHERE ($1::INTEGER IS NULL OR age >= $1)
              AND ($2::INTEGER IS NULL OR age <= $2)
            "#,
        )
        .bind(filter.min_age)
        .bind(filter.max_age)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, age, password_hash, created_at
            FROM users
            WHERE ($1::INTEGER IS NULL OR age >= $1)
              AND ($2::INTEGER IS NULL OR age <= $2)
            ORDER BY id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.min_age)
        .bind(filter.max_age)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }
}
