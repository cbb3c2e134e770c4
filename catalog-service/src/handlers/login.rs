//! Token issuing

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::json_body;
use crate::{error::Result, resources::clients, state::AppState};

/// Login body; `username` is the client's email
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// `POST /api/login_check`
pub async fn login(
    State(state): State<AppState>,
    body: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>> {
    let credentials = json_body(body)?;
    let client = clients::authenticate(&state, &credentials.username, &credentials.password).await?;
    let token = state.tokens().issue(&client)?;
    Ok(Json(TokenResponse { token }))
}
