pub mod error;
pub mod order_repo;
pub mod user_repo;

pub use error::{RepoError, RepoResult};
pub use order_repo::{OrderRepo, OrderRow, PgOrderRepo};
pub use user_repo::{PgUserRepo, UserFilter, UserPatch, UserRepo, UserRow};
