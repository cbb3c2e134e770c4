//! Product catalog reads

use crate::error::{Error, Result};
use crate::models::Product;
use crate::pagination::{Page, PageRequest};
use crate::state::AppState;

/// One page of the catalog, ordered by id
pub async fn list(state: &AppState, page: &PageRequest) -> Result<Page<Product>> {
    state.store().find_products_page(page).await
}

pub async fn get(state: &AppState, id: i64) -> Result<Product> {
    state
        .store()
        .find_product(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("product {}", id)))
}
