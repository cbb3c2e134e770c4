//! Domain records and their wire representations
//!
//! Records (`Client`, `User`, `Product`) mirror table rows. Views
//! (`UserView`, `ClientSummary`) list exactly the fields a response may carry.

pub mod client;
pub mod product;
pub mod user;

pub use client::{Client, ClientSummary, NewClientRecord, ROLE_USER};
pub use product::{NewProduct, Product};
pub use user::{NewUser, NewUserRecord, User, UserLinks, UserView, ValidNewUser};
