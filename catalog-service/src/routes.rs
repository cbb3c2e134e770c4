//! Public route paths shared by the router, hypermedia links and `Location` headers

pub const PRODUCTS: &str = "/api/products";
pub const PRODUCT: &str = "/api/product/{id}";
pub const USERS: &str = "/api/client/users";
pub const USER: &str = "/api/client/user/{id}";
pub const USER_CREATE: &str = "/api/client/user";
pub const LOGIN: &str = "/api/login_check";
pub const HEALTH: &str = "/health";
pub const READY: &str = "/ready";

/// Concrete path of a single user
pub fn user_path(id: i64) -> String {
    format!("{}/{}", USER_CREATE, id)
}
