//! Product endpoints

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};

use super::{id_param, list_query};
use crate::{
    auth::{authorize, CurrentClient},
    cache::keys,
    error::{Error, Result},
    models::{Product, ROLE_USER},
    pagination::ListQuery,
    resources::products,
    responses::{CachedJson, PaginatedBody},
    routes,
    state::AppState,
};

/// `GET /api/products`
pub async fn list_products(
    State(state): State<AppState>,
    client: CurrentClient,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> Result<CachedJson> {
    authorize(&client, ROLE_USER)?;
    let page = list_query(query)?.resolve(&state.config().pagination)?;

    let payload = state
        .cache()
        .get_or_insert_with(
            &keys::products_page(&page),
            &[keys::PRODUCTS_TAG.to_string()],
            || async {
                let catalog = products::list(&state, &page).await?;
                let body = PaginatedBody::new(routes::PRODUCTS, catalog);
                Ok::<_, Error>(serde_json::to_string(&body)?)
            },
        )
        .await?;

    Ok(CachedJson(payload))
}

/// `GET /api/product/{id}`
pub async fn get_product(
    State(state): State<AppState>,
    client: CurrentClient,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<Product>> {
    authorize(&client, ROLE_USER)?;
    let product = products::get(&state, id_param(id)?).await?;
    Ok(Json(product))
}
