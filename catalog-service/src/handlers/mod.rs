//! HTTP handlers and the route table
//!
//! Every `/api` route except login sits behind [`auth::authenticate`], and
//! each handler calls [`auth::authorize`] before doing anything else.
//! Extractor rejections are converted here so that every failure carries the
//! service's error body.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query,
    },
    middleware,
    routing::{get, post},
    Json, Router,
};

use crate::{
    auth,
    error::{Error, Result},
    pagination::ListQuery,
    routes,
    state::AppState,
};

pub mod health;
pub mod login;
pub mod products;
pub mod users;

/// Build the application router
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route(routes::PRODUCTS, get(products::list_products))
        .route(routes::PRODUCT, get(products::get_product))
        .route(routes::USERS, get(users::list_users))
        .route(routes::USER_CREATE, post(users::create_user))
        .route(
            routes::USER,
            get(users::get_user).delete(users::delete_user),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ));

    Router::new()
        .merge(protected)
        .route(routes::LOGIN, post(login::login))
        .route(routes::HEALTH, get(health::health))
        .route(routes::READY, get(health::readiness))
        .with_state(state)
}

/// Non-numeric ids match no resource
pub(crate) fn id_param(id: std::result::Result<Path<i64>, PathRejection>) -> Result<i64> {
    id.map(|Path(id)| id).map_err(|rejection| {
        tracing::debug!("Rejected path parameter: {}", rejection);
        Error::NotFound(rejection.body_text())
    })
}

pub(crate) fn list_query(
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> Result<ListQuery> {
    query
        .map(|Query(query)| query)
        .map_err(|rejection| Error::BadRequest(rejection.body_text()))
}

pub(crate) fn json_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(body)| body)
        .map_err(|rejection| Error::BadRequest(rejection.body_text()))
}
