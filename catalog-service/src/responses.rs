//! Response types for the REST endpoints

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::pagination::{Page, PageLinks};

/// HTTP 201 Created, with an optional `Location` header
#[derive(Debug)]
pub struct Created<T> {
    data: T,
    location: Option<String>,
}

impl<T> Created<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            location: None,
        }
    }

    /// Point the `Location` header at the created resource
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::CREATED, Json(&self.data)).into_response();

        if let Some(location) = self.location {
            match HeaderValue::from_str(&location) {
                Ok(value) => {
                    response.headers_mut().insert(header::LOCATION, value);
                }
                Err(e) => tracing::warn!(location, "Dropping invalid Location header: {}", e),
            }
        }

        response
    }
}

/// HTTP 204 No Content
#[derive(Debug, Clone, Copy)]
pub struct NoContent;

impl IntoResponse for NoContent {
    fn into_response(self) -> Response {
        StatusCode::NO_CONTENT.into_response()
    }
}

/// An already serialized JSON document, sent as is
///
/// Cached listings are stored serialized and replayed byte for byte.
#[derive(Debug, Clone)]
pub struct CachedJson(pub String);

impl IntoResponse for CachedJson {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )],
            self.0,
        )
            .into_response()
    }
}

/// Body of every paginated listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedBody<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub total_pages: u32,
    pub limit: u32,
    #[serde(rename = "_links")]
    pub links: PageLinks,
}

impl<T> PaginatedBody<T> {
    /// Shape `page` of the collection served at `path`
    pub fn new(path: &str, page: Page<T>) -> Self {
        let links = PageLinks::for_page(path, &page);
        Self {
            items: page.items,
            current_page: page.current_page,
            total_pages: page.total_pages,
            limit: page.limit,
            links,
        }
    }
}
