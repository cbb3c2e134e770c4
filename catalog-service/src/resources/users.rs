//! Users owned by the authenticated client
//!
//! Every operation is scoped to one client. A user of another client is
//! reported as missing, never as forbidden, so ids of other tenants leak
//! nothing. Writes drop the client's cached listings before touching the store.

use crate::cache::keys;
use crate::error::{Error, Result};
use crate::models::{Client, NewUser, User};
use crate::pagination::{Page, PageRequest};
use crate::state::AppState;

pub async fn list(state: &AppState, client: &Client, page: &PageRequest) -> Result<Page<User>> {
    state.store().find_users_page(client.id, page).await
}

pub async fn get(state: &AppState, client: &Client, id: i64) -> Result<User> {
    state
        .store()
        .find_user_for_client(client.id, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("user {} of client {}", id, client.id)))
}

/// Validate, hash and store a new user for `client`
pub async fn create(state: &AppState, client: &Client, payload: &NewUser) -> Result<User> {
    let valid = payload.validate()?;

    let hasher = state.hasher().clone();
    let password = valid.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| Error::Internal(format!("Password hashing task failed: {}", e)))??;

    state
        .cache()
        .invalidate_tags(&[keys::users_tag(client.id)])
        .await?;

    let user = state
        .store()
        .insert_user(client.id, valid.into_record(password_hash))
        .await?;

    tracing::info!(client_id = client.id, user_id = user.id, "User created");
    Ok(user)
}

/// Remove a user of `client`
pub async fn delete(state: &AppState, client: &Client, id: i64) -> Result<()> {
    let user = get(state, client, id).await?;

    state
        .cache()
        .invalidate_tags(&[keys::users_tag(client.id)])
        .await?;

    if !state.store().delete_user(client.id, user.id).await? {
        return Err(Error::NotFound(format!(
            "user {} of client {}",
            id, client.id
        )));
    }

    tracing::info!(client_id = client.id, user_id = id, "User deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheBackend, TagCache};
    use crate::config::Config;
    use crate::models::{NewClientRecord, ROLE_USER};
    use crate::repository::{MemoryStore, UserRepository};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    fn config() -> Config {
        let mut config = Config::default();
        config.jwt.secret = Some("users-test".to_string());
        config.password.memory_cost_kib = 8;
        config.password.time_cost = 1;
        config
    }

    async fn add_client(state: &AppState, i: u32) -> Client {
        state
            .store()
            .insert_client(NewClientRecord {
                email: format!("client{}@test.fr", i),
                password_hash: "hash".into(),
                name: format!("ClientName{}", i),
                address: None,
                address_complement: None,
                postal_code: None,
                city: None,
                roles: vec![ROLE_USER.to_string()],
            })
            .await
            .unwrap()
    }

    fn payload(username: &str) -> NewUser {
        NewUser {
            username: Some(username.to_string()),
            password: Some("Sup3r$ecret-Passw0rd!".to_string()),
            name: Some("Jane".to_string()),
            surname: Some("Doe".to_string()),
            email: Some("jane.doe@test.fr".to_string()),
        }
    }

    fn first_page() -> PageRequest {
        PageRequest::new(1, 10).unwrap()
    }

    #[tokio::test]
    async fn test_create_hashes_password_and_scopes_to_client() {
        let state = AppState::in_memory(config()).unwrap();
        let c1 = add_client(&state, 1).await;
        let c2 = add_client(&state, 2).await;

        let user = create(&state, &c1, &payload("jdoe")).await.unwrap();
        assert_eq!(user.client_id, c1.id);
        assert_ne!(user.password, "Sup3r$ecret-Passw0rd!");
        assert!(state
            .hasher()
            .verify("Sup3r$ecret-Passw0rd!", &user.password)
            .unwrap());

        assert_eq!(get(&state, &c1, user.id).await.unwrap().username, "jdoe");
        assert!(matches!(get(&state, &c2, user.id).await, Err(Error::NotFound(_))));
        assert_eq!(list(&state, &c2, &first_page()).await.unwrap().total_items, 0);
    }

    #[tokio::test]
    async fn test_invalid_payload_is_rejected_before_store() {
        let state = AppState::in_memory(config()).unwrap();
        let client = add_client(&state, 1).await;

        let mut bad = payload("jdoe");
        bad.email = Some("not-an-email".to_string());
        bad.username = Some("  ".to_string());

        match create(&state, &client, &bad).await {
            Err(Error::Validation(errors)) => {
                assert_eq!(errors.len(), 2);
                assert!(errors.has("username"));
                assert!(errors.has("email"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(list(&state, &client, &first_page()).await.unwrap().total_items, 0);
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let state = AppState::in_memory(config()).unwrap();
        let owner = add_client(&state, 1).await;
        let other = add_client(&state, 2).await;
        let user = create(&state, &owner, &payload("jdoe")).await.unwrap();

        assert!(matches!(
            delete(&state, &other, user.id).await,
            Err(Error::NotFound(_))
        ));
        delete(&state, &owner, user.id).await.unwrap();
        assert!(matches!(get(&state, &owner, user.id).await, Err(Error::NotFound(_))));
        assert!(matches!(
            delete(&state, &owner, user.id).await,
            Err(Error::NotFound(_))
        ));
    }

    /// Backend that serves reads but refuses invalidation
    struct ReadOnlyBackend;

    #[async_trait]
    impl CacheBackend for ReadOnlyBackend {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        async fn put(
            &self,
            _key: &str,
            _value: &str,
            _tags: &[String],
            _ttl: Option<Duration>,
        ) -> Result<()> {
            Ok(())
        }

        async fn invalidate_tags(&self, _tags: &[String]) -> Result<()> {
            Err(Error::Internal("READONLY".into()))
        }

        async fn ping(&self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &'static str {
            "read-only"
        }
    }

    #[tokio::test]
    async fn test_write_is_aborted_when_invalidation_fails() {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(
            config(),
            store.clone(),
            TagCache::new(Arc::new(ReadOnlyBackend)),
        )
        .unwrap();
        let client = add_client(&state, 1).await;

        let result = create(&state, &client, &payload("jdoe")).await;
        assert!(matches!(result, Err(Error::CacheUnavailable(_))));

        let page = store.find_users_page(client.id, &first_page()).await.unwrap();
        assert!(page.items.is_empty());
    }
}
