//! End-to-end tests driving the full router against the in-memory backends

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use catalog_service::{
    cache::{CacheBackend, MemoryCacheBackend, TagCache},
    config::Config,
    fixtures,
    models::{NewClientRecord, NewUserRecord, ROLE_USER},
    repository::MemoryStore,
    server,
    state::AppState,
};

const PASSWORD: &str = "passwordtest!";

struct TestApp {
    router: Router,
    state: AppState,
    cache: Arc<MemoryCacheBackend>,
}

fn config() -> Config {
    let mut config = Config::default();
    config.jwt.secret = Some("integration-test-secret".to_string());
    config.password.memory_cost_kib = 8;
    config.password.time_cost = 1;
    config.service.public_url = Some("https://catalog.test/".to_string());
    config
}

/// Two clients with `users_per_client` users each, and `products` products
async fn test_app(products: u32, users_per_client: u32) -> TestApp {
    let cache = Arc::new(MemoryCacheBackend::new());
    let state = AppState::new(
        config(),
        Arc::new(MemoryStore::new()),
        TagCache::new(cache.clone()),
    )
    .unwrap();

    for i in 0..products {
        state
            .store()
            .insert_product(fixtures::product(i))
            .await
            .unwrap();
    }

    let password_hash = state.hasher().hash(PASSWORD).unwrap();
    for c in 1..=2 {
        let client = state
            .store()
            .insert_client(NewClientRecord {
                email: format!("client{}@test.fr", c),
                password_hash: password_hash.clone(),
                name: format!("ClientName{}", c),
                address: Some(format!("Client address{}", c)),
                address_complement: None,
                postal_code: Some("73 200".to_string()),
                city: Some("Mercury".to_string()),
                roles: vec![ROLE_USER.to_string()],
            })
            .await
            .unwrap();

        for u in 0..users_per_client {
            state
                .store()
                .insert_user(
                    client.id,
                    NewUserRecord {
                        username: format!("Client{}User{}", c, u),
                        password_hash: password_hash.clone(),
                        name: format!("Client{}Name{}", c, u),
                        surname: format!("Client{}Surname{}", c, u),
                        email: format!("client{}user{}@test.fr", c, u),
                    },
                )
                .await
                .unwrap();
        }
    }

    TestApp {
        router: server::app(state.clone()),
        state,
        cache,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>, header::HeaderMap) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec(), headers)
    }

    async fn token(&self, client: u32) -> String {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/login_check")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"username": format!("client{}@test.fr", client), "password": PASSWORD})
                    .to_string(),
            ))
            .unwrap();
        let (status, body, _) = self.send(request).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value, header::HeaderMap) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token));
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let (status, bytes, headers) = self.send(builder.body(body).unwrap()).await;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json, headers)
    }
}

fn new_user(username: &str) -> Value {
    json!({
        "username": username,
        "password": "Sup3r$ecret-Passw0rd!",
        "name": "Jane",
        "surname": "Doe",
        "email": "jane.doe@test.fr"
    })
}

#[tokio::test]
async fn products_third_page_of_twenty_five() {
    let app = test_app(25, 0).await;
    let token = app.token(1).await;

    let (status, body, headers) = app
        .call(Method::GET, "/api/products?page=3&limit=10", &token, None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "application/json");
    assert_eq!(body["items"].as_array().unwrap().len(), 5);
    assert_eq!(body["current_page"], 3);
    assert_eq!(body["total_pages"], 3);
    assert_eq!(body["limit"], 10);
    assert_eq!(body["items"][0]["id"], 21);
    assert_eq!(body["_links"]["prev"]["href"], "/api/products?page=2&limit=10");
    assert_eq!(body["_links"]["first"]["href"], "/api/products?page=1&limit=10");
    assert_eq!(body["_links"]["last"]["href"], "/api/products?page=3&limit=10");
    assert!(body["_links"].get("next").is_none());
}

#[tokio::test]
async fn page_past_the_end_is_empty_not_an_error() {
    let app = test_app(25, 0).await;
    let token = app.token(1).await;

    let (status, body, _) = app
        .call(Method::GET, "/api/products?page=9&limit=10", &token, None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["items"].as_array().unwrap().is_empty());
    assert_eq!(body["total_pages"], 3);
}

#[tokio::test]
async fn default_paging_and_invalid_paging() {
    let app = test_app(12, 0).await;
    let token = app.token(1).await;

    let (status, body, _) = app.call(Method::GET, "/api/products", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_page"], 1);
    assert_eq!(body["limit"], 10);
    assert_eq!(body["_links"]["next"]["href"], "/api/products?page=2&limit=10");
    assert!(body["_links"].get("prev").is_none());

    let (status, body, _) = app
        .call(Method::GET, "/api/products?page=0&limit=0", &token, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert!(body["errors"]["page"].is_string());
    assert!(body["errors"]["limit"].is_string());

    let (status, _, _) = app
        .call(Method::GET, "/api/products?page=abc", &token, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_collection_has_zero_pages() {
    let app = test_app(0, 0).await;
    let token = app.token(1).await;

    let (status, body, _) = app.call(Method::GET, "/api/client/users", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["items"].as_array().unwrap().is_empty());
    assert_eq!(body["total_pages"], 0);
    assert_eq!(body["_links"]["last"]["href"], "/api/client/users?page=1&limit=10");
}

#[tokio::test]
async fn product_by_id() {
    let app = test_app(3, 0).await;
    let token = app.token(1).await;

    let (status, body, _) = app.call(Method::GET, "/api/product/2", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "product 1");
    assert_eq!(body["os"], "Androïd");

    let (status, body, _) = app.call(Method::GET, "/api/product/99", &token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.is_null());

    let (status, _, _) = app.call(Method::GET, "/api/product/abc", &token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn users_list_shows_public_view_of_own_users_only() {
    let app = test_app(0, 2).await;
    let token = app.token(1).await;

    let (status, body, _) = app.call(Method::GET, "/api/client/users", &token, None).await;
    assert_eq!(status, StatusCode::OK);

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    for item in items {
        assert_eq!(item["client"]["email"], "client1@test.fr");
        assert!(item.get("password").is_none());
        assert!(item["client"].get("password").is_none());
    }
    assert_eq!(items[0]["username"], "Client1User0");
    assert_eq!(
        items[0]["_links"]["self"]["href"],
        format!("/api/client/user/{}", items[0]["id"])
    );
}

#[tokio::test]
async fn create_invalidates_only_the_owner_listing() {
    let app = test_app(0, 2).await;
    let token1 = app.token(1).await;
    let token2 = app.token(2).await;

    // Warm both clients' caches
    let (_, before, _) = app.call(Method::GET, "/api/client/users", &token1, None).await;
    assert_eq!(before["items"].as_array().unwrap().len(), 2);
    app.call(Method::GET, "/api/client/users", &token2, None).await;
    assert!(app.cache.get("userCache-1-1-10").await.unwrap().is_some());
    assert!(app.cache.get("userCache-2-1-10").await.unwrap().is_some());

    let (status, created, headers) = app
        .call(
            Method::POST,
            "/api/client/user",
            &token1,
            Some(new_user("jdoe")),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap();
    assert_eq!(
        headers.get(header::LOCATION).unwrap(),
        format!("https://catalog.test/api/client/user/{}", id).as_str()
    );
    assert_eq!(created["username"], "jdoe");
    assert!(created.get("password").is_none());

    assert!(app.cache.get("userCache-1-1-10").await.unwrap().is_none());
    assert!(app.cache.get("userCache-2-1-10").await.unwrap().is_some());

    let (_, after, _) = app.call(Method::GET, "/api/client/users", &token1, None).await;
    let usernames: Vec<_> = after["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(usernames, vec!["Client1User0", "Client1User1", "jdoe"]);
}

#[tokio::test]
async fn other_clients_users_are_not_found() {
    let app = test_app(0, 1).await;
    let token1 = app.token(1).await;
    let token2 = app.token(2).await;

    let (_, list, _) = app.call(Method::GET, "/api/client/users", &token2, None).await;
    let foreign_id = list["items"][0]["id"].as_i64().unwrap();

    let uri = format!("/api/client/user/{}", foreign_id);
    let (status, body, _) = app.call(Method::GET, &uri, &token1, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.is_null());

    let (status, _, _) = app.call(Method::DELETE, &uri, &token1, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body, _) = app.call(Method::GET, &uri, &token2, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["client"]["email"], "client2@test.fr");
}

#[tokio::test]
async fn delete_then_fetch_is_not_found() {
    let app = test_app(0, 1).await;
    let token = app.token(1).await;

    let (_, list, _) = app.call(Method::GET, "/api/client/users", &token, None).await;
    let id = list["items"][0]["id"].as_i64().unwrap();
    let uri = format!("/api/client/user/{}", id);

    let (status, body, _) = app.call(Method::DELETE, &uri, &token, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _, _) = app.call(Method::GET, &uri, &token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list, _) = app.call(Method::GET, "/api/client/users", &token, None).await;
    assert!(list["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_payload_reports_every_field() {
    let app = test_app(0, 0).await;
    let token = app.token(1).await;

    let mut payload = new_user("   ");
    payload["email"] = json!("not an email");
    payload["password"] = json!("weak");

    let (status, body, _) = app
        .call(Method::POST, "/api/client/user", &token, Some(payload))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(body["errors"]["username"], "You must enter a username");
    assert_eq!(body["errors"]["email"], "Incorrect email address");
    assert_eq!(
        body["errors"]["password"],
        "Your password is too weak. Add numbers, upper, lower and special characters"
    );
    assert!(body["errors"].get("name").is_none());

    let (_, list, _) = app.call(Method::GET, "/api/client/users", &token, None).await;
    assert!(list["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let app = test_app(0, 1).await;
    let token = app.token(2).await;

    let (status, body, _) = app
        .call(
            Method::POST,
            "/api/client/user",
            &token,
            Some(new_user("Client1User0")),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["username"], "This username is already used");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = test_app(0, 0).await;
    let token = app.token(1).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/client/user")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"username\": "))
        .unwrap();
    let (status, body, _) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["code"], "BAD_REQUEST");
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn missing_or_invalid_token_is_unauthorized() {
    let app = test_app(1, 0).await;

    let request = Request::builder()
        .uri("/api/products")
        .body(Body::empty())
        .unwrap();
    let (status, body, _) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({"code": 401, "message": "JWT Token not found"}));

    let (status, body, _) = app
        .call(Method::GET, "/api/products", "not.a.jwt", None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid JWT Token");
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = test_app(0, 0).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/login_check")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"username": "client1@test.fr", "password": "nope"}).to_string(),
        ))
        .unwrap();
    let (status, body, _) = app.send(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({"code": 401, "message": "Invalid credentials."}));
}

#[tokio::test]
async fn issued_token_names_the_client() {
    let app = test_app(0, 0).await;
    let token = app.token(2).await;

    let claims = app.state.tokens().validate(&token).unwrap();
    assert_eq!(claims.username, "client2@test.fr");
    assert_eq!(claims.client_id(), Some(2));
}

#[tokio::test]
async fn probes_are_public() {
    let app = test_app(0, 0).await;

    for uri in ["/health", "/ready"] {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, body, headers) = app.send(request).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert!(headers.get("x-request-id").is_some());
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert!(body.is_object());
    }
}
