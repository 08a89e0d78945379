//! Shared fixtures for the HTTP integration tests: in-memory repositories and
//! a router wired exactly like production, minus Postgres.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use argon2::Params;
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use orders_api::app;
use orders_api::repos::{
    OrderRepo, OrderRow, RepoError, RepoResult, UserFilter, UserPatch, UserRepo, UserRow,
};
use orders_api::services::auth::{CredentialVerifier, TokenCodec};
use orders_api::state::AppState;

pub type TestResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub const SECRET: &[u8] = b"integration-test-signing-key";
pub const TTL: Duration = Duration::from_secs(3600);
pub const PASSWORD: &str = "correct-horse-battery";

fn storage_down() -> RepoError {
    RepoError::Db(sqlx::Error::PoolTimedOut)
}

#[derive(Default)]
pub struct MemUsers {
    rows: Mutex<Vec<UserRow>>,
    next_id: Mutex<i64>,
    failing: AtomicBool,
}

impl MemUsers {
    /// Every subsequent call returns a storage error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn check(&self) -> RepoResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(storage_down())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl UserRepo for MemUsers {
    async fn create(
        &self,
        name: &str,
        email: &str,
        age: i32,
        password_hash: &str,
    ) -> RepoResult<UserRow> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|u| u.email == email) {
            return Err(RepoError::Conflict);
        }
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let row = UserRow {
            id: *next_id,
            name: name.to_owned(),
            email: email.to_owned(),
            age,
            password_hash: password_hash.to_owned(),
            created_at: Utc::now(),
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<UserRow>> {
        self.check()?;
        Ok(self.rows.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<UserRow>> {
        self.check()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update(&self, id: i64, patch: UserPatch) -> RepoResult<Option<UserRow>> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        if let Some(email) = &patch.email
            && rows.iter().any(|u| u.id != id && &u.email == email)
        {
            return Err(RepoError::Conflict);
        }
        let Some(row) = rows.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            row.name = name;
        }
        if let Some(email) = patch.email {
            row.email = email;
        }
        if let Some(age) = patch.age {
            row.age = age;
        }
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: i64) -> RepoResult<bool> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|u| u.id != id);
        Ok(rows.len() != before)
    }

    async fn list(&self, filter: UserFilter) -> RepoResult<(Vec<UserRow>, i64)> {
        self.check()?;
        let rows = self.rows.lock().unwrap();
        let matching: Vec<UserRow> = rows
            .iter()
            .filter(|u| filter.min_age.is_none_or(|min| u.age >= min))
            .filter(|u| filter.max_age.is_none_or(|max| u.age <= max))
            .cloned()
            .collect();
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .collect();
        Ok((page, total))
    }
}

#[derive(Default)]
pub struct MemOrders {
    rows: Mutex<Vec<OrderRow>>,
}

impl MemOrders {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl OrderRepo for MemOrders {
    async fn create(
        &self,
        user_id: i64,
        product: &str,
        quantity: i32,
        price: f64,
    ) -> RepoResult<OrderRow> {
        let mut rows = self.rows.lock().unwrap();
        let row = OrderRow {
            id: rows.len() as i64 + 1,
            user_id,
            product: product.to_owned(),
            quantity,
            price,
            created_at: Utc::now(),
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn list_by_user(&self, user_id: i64) -> RepoResult<Vec<OrderRow>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }
}

pub struct TestApp {
    pub router: Router,
    pub users: Arc<MemUsers>,
    pub orders: Arc<MemOrders>,
    pub tokens: Arc<TokenCodec>,
    pub credentials: Arc<CredentialVerifier>,
}

impl TestApp {
    pub fn new() -> Self {
        let users = Arc::new(MemUsers::default());
        let orders = Arc::new(MemOrders::default());
        let tokens = Arc::new(TokenCodec::new(SECRET, TTL).unwrap());
        // Minimal argon2 cost keeps the suite fast.
        let credentials = Arc::new(
            CredentialVerifier::with_params(Params::new(8, 1, 1, None).unwrap()).unwrap(),
        );

        let state = AppState::new(
            users.clone(),
            orders.clone(),
            tokens.clone(),
            credentials.clone(),
        );

        Self {
            router: app::router(state),
            users,
            orders,
            tokens,
            credentials,
        }
    }

    /// Inserts a user with [`PASSWORD`] directly through the repository.
    pub async fn seed_user(&self, email: &str) -> i64 {
        let hash = self.credentials.hash(PASSWORD).unwrap();
        self.users
            .create("Seeded", email, 30, &hash)
            .await
            .unwrap()
            .id
    }

    pub fn bearer_for(&self, user_id: i64) -> String {
        format!("Bearer {}", self.tokens.issue(user_id).unwrap())
    }

    pub async fn send(
        &self,
        req: Request<Body>,
    ) -> Result<(StatusCode, Value), Box<dyn std::error::Error + Send + Sync>> {
        let resp = self
            .router
            .clone()
            .oneshot(req)
            .await
            .unwrap_or_else(|e| match e {});
        let status = resp.status();
        let bytes = resp.into_body().collect().await?.to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, body))
    }
}

pub fn request(method: Method, uri: &str, auth: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

pub fn get(uri: &str, auth: Option<&str>) -> Request<Body> {
    request(Method::GET, uri, auth, None)
}

pub fn unauthorized_body() -> Value {
    serde_json::json!({ "error": { "code": "UNAUTHORIZED", "message": "unauthorized" } })
}
