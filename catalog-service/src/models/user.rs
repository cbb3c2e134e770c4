use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::client::{Client, ClientSummary};
use crate::pagination::Link;
use crate::routes;

/// A user record owned by exactly one client
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub client_id: i64,
    pub username: String,
    /// Argon2id PHC string
    pub password: String,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub creation_date: DateTime<Utc>,
}

/// Body accepted when creating a user
///
/// Every field is optional at the wire level so that missing fields surface
/// as validation messages instead of deserialization failures.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    pub username: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
}

/// A creation payload that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidNewUser {
    pub username: String,
    pub password: String,
    pub name: String,
    pub surname: String,
    pub email: String,
}

/// Insert payload for a user; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub surname: String,
    pub email: String,
}

impl ValidNewUser {
    pub fn into_record(self, password_hash: String) -> NewUserRecord {
        NewUserRecord {
            username: self.username,
            password_hash,
            name: self.name,
            surname: self.surname,
            email: self.email,
        }
    }
}

/// Hypermedia relations of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLinks {
    #[serde(rename = "self")]
    pub self_link: Link,
    pub delete: Link,
    pub post: Link,
    pub get: Link,
}

impl UserLinks {
    pub fn for_user(id: i64) -> Self {
        Self {
            self_link: Link::new(routes::user_path(id)),
            delete: Link::new(routes::user_path(id)),
            post: Link::new(routes::USER_CREATE),
            get: Link::new(routes::USERS),
        }
    }
}

/// Public representation of a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub creation_date: DateTime<Utc>,
    pub client: ClientSummary,
    #[serde(rename = "_links")]
    pub links: UserLinks,
}

impl UserView {
    pub fn new(user: User, owner: &Client) -> Self {
        Self {
            id: user.id,
            links: UserLinks::for_user(user.id),
            username: user.username,
            name: user.name,
            surname: user.surname,
            email: user.email,
            creation_date: user.creation_date,
            client: ClientSummary::from(owner),
        }
    }
}
