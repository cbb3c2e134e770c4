//! Persistence traits and their PostgreSQL and in-memory implementations
//!
//! Handlers never see a concrete store. [`AppState`](crate::state::AppState)
//! holds an `Arc<dyn Datastore>`, which is either a [`PgStore`] or, when no
//! database is configured, a [`MemoryStore`].
//!
//! Every paged read orders by id ascending and reports the total size of the
//! matching set from a separate count.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Client, NewClientRecord, NewProduct, NewUserRecord, Product, User};
use crate::pagination::{Page, PageRequest};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Field reported when a username collides with an existing one
pub const USERNAME_FIELD: &str = "username";

/// Message reported when a username collides with an existing one
pub const USERNAME_TAKEN: &str = "This username is already used";

#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn find_client(&self, id: i64) -> Result<Option<Client>>;

    /// Clients log in with their email, which is unique
    async fn find_client_by_email(&self, email: &str) -> Result<Option<Client>>;

    async fn insert_client(&self, record: NewClientRecord) -> Result<Client>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// One page of the users owned by `client_id`
    async fn find_users_page(&self, client_id: i64, page: &PageRequest) -> Result<Page<User>>;

    /// The user `id`, only if it is owned by `client_id`
    async fn find_user_for_client(&self, client_id: i64, id: i64) -> Result<Option<User>>;

    /// Store a user for `client_id`
    ///
    /// A taken username fails with a validation error on `username`.
    async fn insert_user(&self, client_id: i64, record: NewUserRecord) -> Result<User>;

    /// Remove the user `id` owned by `client_id`; `false` when nothing matched
    async fn delete_user(&self, client_id: i64, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_products_page(&self, page: &PageRequest) -> Result<Page<Product>>;

    async fn find_product(&self, id: i64) -> Result<Option<Product>>;

    async fn insert_product(&self, product: NewProduct) -> Result<Product>;
}

/// Everything the service persists
#[async_trait]
pub trait Datastore: ClientRepository + UserRepository + ProductRepository {
    /// Check the store is reachable
    async fn ping(&self) -> Result<()>;

    /// Short store name for logs and readiness output
    fn name(&self) -> &'static str;
}
