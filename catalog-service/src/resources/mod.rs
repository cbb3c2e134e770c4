//! Resource operations shared by the HTTP handlers
//!
//! Each operation takes the [`AppState`](crate::state::AppState) explicitly.
//! Ownership checks, hashing and cache invalidation happen here so handlers
//! only shape requests and responses.

pub mod clients;
pub mod products;
pub mod users;
