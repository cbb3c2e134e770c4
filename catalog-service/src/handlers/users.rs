//! User endpoints, scoped to the authenticated client

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};

use super::{id_param, json_body, list_query};
use crate::{
    auth::{authorize, CurrentClient},
    cache::keys,
    error::{Error, Result},
    models::{NewUser, UserView, ROLE_USER},
    pagination::ListQuery,
    resources::users,
    responses::{CachedJson, Created, NoContent, PaginatedBody},
    routes,
    state::AppState,
};

/// `GET /api/client/users`
pub async fn list_users(
    State(state): State<AppState>,
    client: CurrentClient,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> Result<CachedJson> {
    authorize(&client, ROLE_USER)?;
    let page = list_query(query)?.resolve(&state.config().pagination)?;

    let payload = state
        .cache()
        .get_or_insert_with(
            &keys::users_page(client.id, &page),
            &[keys::users_tag(client.id)],
            || async {
                let owned = users::list(&state, &client, &page)
                    .await?
                    .map(|user| UserView::new(user, &client));
                let body = PaginatedBody::new(routes::USERS, owned);
                Ok::<_, Error>(serde_json::to_string(&body)?)
            },
        )
        .await?;

    Ok(CachedJson(payload))
}

/// `GET /api/client/user/{id}`
pub async fn get_user(
    State(state): State<AppState>,
    client: CurrentClient,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<UserView>> {
    authorize(&client, ROLE_USER)?;
    let user = users::get(&state, &client, id_param(id)?).await?;
    Ok(Json(UserView::new(user, &client)))
}

/// `POST /api/client/user`
pub async fn create_user(
    State(state): State<AppState>,
    client: CurrentClient,
    body: std::result::Result<Json<NewUser>, JsonRejection>,
) -> Result<Created<UserView>> {
    authorize(&client, ROLE_USER)?;
    let payload = json_body(body)?;

    let user = users::create(&state, &client, &payload).await?;
    let path = routes::user_path(user.id);
    let location = match &state.config().service.public_url {
        Some(base) => format!("{}{}", base.trim_end_matches('/'), path),
        None => path,
    };

    Ok(Created::new(UserView::new(user, &client)).with_location(location))
}

/// `DELETE /api/client/user/{id}`
pub async fn delete_user(
    State(state): State<AppState>,
    client: CurrentClient,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<NoContent> {
    authorize(&client, ROLE_USER)?;
    users::delete(&state, &client, id_param(id)?).await?;
    Ok(NoContent)
}
