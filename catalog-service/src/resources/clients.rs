//! Client authentication

use crate::error::{Error, Result};
use crate::models::Client;
use crate::state::AppState;

/// Message returned for any failed login
pub const INVALID_CREDENTIALS: &str = "Invalid credentials.";

/// The client whose email and password match
///
/// An unknown email and a wrong password fail the same way.
pub async fn authenticate(state: &AppState, email: &str, password: &str) -> Result<Client> {
    let Some(client) = state.store().find_client_by_email(email).await? else {
        tracing::debug!("Login attempt for unknown client");
        return Err(Error::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    let hasher = state.hasher().clone();
    let password = password.to_string();
    let hash = client.password.clone();
    let verified = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
        .await
        .map_err(|e| Error::Internal(format!("Password verification task failed: {}", e)))??;

    if verified {
        tracing::info!(client_id = client.id, "Client logged in");
        Ok(client)
    } else {
        tracing::debug!(client_id = client.id, "Login attempt with wrong password");
        Err(Error::Unauthorized(INVALID_CREDENTIALS.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::{NewClientRecord, ROLE_USER};

    async fn state_with_client() -> AppState {
        let mut config = Config::default();
        config.jwt.secret = Some("clients-test".to_string());
        config.password.memory_cost_kib = 8;
        config.password.time_cost = 1;
        let state = AppState::in_memory(config).unwrap();

        let password_hash = state.hasher().hash("passwordtest!1").unwrap();
        state
            .store()
            .insert_client(NewClientRecord {
                email: "client1@test.fr".into(),
                password_hash,
                name: "ClientName1".into(),
                address: None,
                address_complement: None,
                postal_code: None,
                city: None,
                roles: vec![ROLE_USER.to_string()],
            })
            .await
            .unwrap();
        state
    }

    #[tokio::test]
    async fn test_authenticate() {
        let state = state_with_client().await;

        let client = authenticate(&state, "client1@test.fr", "passwordtest!1")
            .await
            .unwrap();
        assert_eq!(client.name, "ClientName1");

        for (email, password) in [
            ("client1@test.fr", "wrong"),
            ("nobody@test.fr", "passwordtest!1"),
        ] {
            match authenticate(&state, email, password).await {
                Err(Error::Unauthorized(message)) => assert_eq!(message, INVALID_CREDENTIALS),
                other => panic!("expected unauthorized, got {:?}", other),
            }
        }
    }
}
