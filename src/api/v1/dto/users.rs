/*
 * Responsibility
 * - Users の request/response DTO
 * - validation (形式チェック) 用の validate() を持たせる
 */
use serde::{Deserialize, Serialize};

use crate::repos::{UserFilter, UserPatch, UserRow};

const MAX_TEXT_LEN: usize = 255;
const MIN_PASSWORD_LEN: usize = 8;
pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub age: i32,
    pub password: String,
}

impl std::fmt::Debug for CreateUserRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUserRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("age", &self.age)
            .finish_non_exhaustive()
    }
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        validate_name(&self.name)?;
        validate_email(&self.email)?;
        validate_age(self.age)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err("password must be at least 8 characters");
        }
        Ok(())
    }
}

/// 部分更新。欠けたフィールドは変更しない
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<i32>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(age) = self.age {
            validate_age(age)?;
        }
        Ok(())
    }

    pub fn into_patch(self) -> UserPatch {
        UserPatch {
            name: self.name.map(|n| n.trim().to_owned()),
            email: self.email.map(|e| e.trim().to_owned()),
            age: self.age,
        }
    }
}

fn validate_name(name: &str) -> Result<(), &'static str> {
    let name = name.trim();
    if name.is_empty() {
        return Err("name is required");
    }
    if name.len() > MAX_TEXT_LEN {
        return Err("name must be <= 255 chars");
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), &'static str> {
    let email = email.trim();
    if email.is_empty() {
        return Err("email is required");
    }
    if email.len() > MAX_TEXT_LEN {
        return Err("email must be <= 255 chars");
    }
    Ok(())
}

fn validate_age(age: i32) -> Result<(), &'static str> {
    if age < 0 {
        return Err("age must be >= 0");
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
}

impl ListUsersQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(DEFAULT_PAGE)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.page() < 1 {
            return Err("page must be >= 1");
        }
        if !(1..=MAX_LIMIT).contains(&self.limit()) {
            return Err("limit must be between 1 and 100");
        }
        Ok(())
    }

    /// validate() 済みであること
    pub fn to_filter(&self) -> UserFilter {
        let limit = self.limit();
        UserFilter {
            min_age: self.min_age,
            max_age: self.max_age,
            limit,
            offset: (self.page() - 1).saturating_mul(limit),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub age: i32,
}

impl From<UserRow> for UserResponse {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            age: row.age,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UsersListResponse {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub users: Vec<UserResponse>,
}
