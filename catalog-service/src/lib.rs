//! # catalog-service
//!
//! REST API for a phone catalog and the users of its B2B clients.
//!
//! ## Features
//!
//! - **Products**: paginated, cached catalog reads
//! - **Users**: per-client CRUD with tenant isolation and field validation
//! - **Authentication**: JWT bearer tokens issued by `POST /api/login_check`
//! - **Caching**: tag-invalidated read cache on Redis or in process
//! - **Storage**: PostgreSQL via `sqlx`, or an in-memory store for development
//! - **Middleware stack**: request ids, header masking, tracing, body limit,
//!   timeout, compression, CORS, panic recovery
//!
//! ## Example
//!
//! ```rust,no_run
//! use catalog_service::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let state = AppState::build(config).await?;
//!     serve(state).await
//! }
//! ```

pub mod auth;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod fixtures;
pub mod handlers;
pub mod models;
pub mod observability;
pub mod pagination;
pub mod repository;
pub mod resources;
pub mod responses;
pub mod routes;
pub mod server;
pub mod state;
pub mod validation;

pub use error::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::auth::{authorize, Claims, CurrentClient, PasswordHasher, TokenService};
    pub use crate::cache::{CacheBackend, MemoryCacheBackend, RedisCacheBackend, TagCache};
    pub use crate::config::Config;
    pub use crate::error::{
        DatabaseError, DatabaseErrorKind, DatabaseOperation, Error, Result, ValidationErrors,
    };
    pub use crate::handlers::router;
    pub use crate::models::{Client, NewUser, Product, User, UserView, ROLE_USER};
    pub use crate::observability::init_tracing;
    pub use crate::pagination::{ListQuery, Page, PageLinks, PageRequest};
    pub use crate::repository::{Datastore, MemoryStore, PgStore};
    pub use crate::responses::{CachedJson, Created, NoContent, PaginatedBody};
    pub use crate::server::{app, serve};
    pub use crate::state::AppState;
}
