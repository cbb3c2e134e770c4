//! Authentication and authorization
//!
//! - [`PasswordHasher`]: Argon2id hashing of client and user passwords
//! - [`TokenService`]: JWT issuing (login) and validation
//! - [`authenticate`]: middleware resolving the bearer token to a [`CurrentClient`]
//! - [`authorize`]: explicit role check at the top of each handler

pub mod middleware;
pub mod password;
pub mod tokens;

pub use middleware::{authenticate, authorize, CurrentClient};
pub use password::PasswordHasher;
pub use tokens::{extract_token, Claims, TokenService};
