//! Bearer token authentication for the protected routes

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use super::tokens::{extract_token, TOKEN_INVALID};
use crate::error::{Error, Result};
use crate::models::Client;
use crate::state::AppState;

/// The client a request was authenticated as
///
/// Inserted into request extensions by [`authenticate`].
#[derive(Debug, Clone)]
pub struct CurrentClient(pub Client);

impl CurrentClient {
    pub fn into_inner(self) -> Client {
        self.0
    }
}

impl std::ops::Deref for CurrentClient {
    type Target = Client;

    fn deref(&self) -> &Client {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CurrentClient
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentClient>()
            .cloned()
            .ok_or_else(|| Error::Unauthorized(TOKEN_INVALID.to_string()))
    }
}

/// Validate the bearer token and load the client it names
///
/// Rejects with 401 when the token is missing, invalid, expired, or names a
/// client that no longer exists.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let claims = state.tokens().validate(extract_token(request.headers())?)?;

    let client_id = claims
        .client_id()
        .ok_or_else(|| Error::Unauthorized(TOKEN_INVALID.to_string()))?;

    let client = state.store().find_client(client_id).await?.ok_or_else(|| {
        tracing::debug!(client_id, "Token names an unknown client");
        Error::Unauthorized(TOKEN_INVALID.to_string())
    })?;

    tracing::debug!(client_id, "Request authenticated");
    request.extensions_mut().insert(CurrentClient(client));

    Ok(next.run(request).await)
}

/// Require `role` on `client`; a missing role is 403
pub fn authorize(client: &Client, role: &str) -> Result<()> {
    if client.has_role(role) {
        Ok(())
    } else {
        Err(Error::Forbidden(format!(
            "client {} lacks {}",
            client.id, role
        )))
    }
}
