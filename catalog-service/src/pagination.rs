//! Offset pagination and navigation links
//!
//! Pages are 1-based. A page request resolves to an SQL style
//! `OFFSET (page - 1) * limit LIMIT limit` window, and the total page count
//! comes from a separate count of the whole matching set.
//!
//! # Example
//!
//! ```rust
//! use catalog_service::pagination::{Page, PageLinks, PageRequest};
//!
//! let request = PageRequest::new(3, 10).unwrap();
//! assert_eq!(request.offset(), 20);
//!
//! let page = Page::new(vec![21, 22, 23, 24, 25], request, 25);
//! assert_eq!(page.total_pages, 3);
//!
//! let links = PageLinks::for_page("/api/products", &page);
//! assert_eq!(links.prev.unwrap().href, "/api/products?page=2&limit=10");
//! assert!(links.next.is_none());
//! ```

use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;
use crate::error::{Result, ValidationErrors};

/// A validated page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Build a page request; both values must be at least 1
    pub fn new(page: u32, limit: u32) -> Result<Self> {
        let mut errors = ValidationErrors::new();
        if page == 0 {
            errors.add("page", "The page must be greater than or equal to 1");
        }
        if limit == 0 {
            errors.add("limit", "The limit must be greater than or equal to 1");
        }
        errors.into_result()?;
        Ok(Self { page, limit })
    }

    /// 1-based page number
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of items to skip
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

/// `page` / `limit` query string parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListQuery {
    /// Apply defaults and the configured ceiling
    pub fn resolve(&self, config: &PaginationConfig) -> Result<PageRequest> {
        let page = self.page.unwrap_or(1);
        let limit = self.limit.unwrap_or(config.default_limit);

        if let Some(max) = config.max_limit {
            if limit > max {
                return Err(ValidationErrors::single(
                    "limit",
                    format!("The limit must be a maximum of {}", max),
                )
                .into());
            }
        }

        PageRequest::new(page, limit)
    }
}

/// Number of pages needed to hold `total_items`; zero for an empty set
pub fn total_pages(total_items: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    let pages = total_items.div_ceil(u64::from(limit));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// One page of a collection
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub total_pages: u32,
    pub limit: u32,
    pub total_items: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        Self {
            items,
            current_page: request.page(),
            total_pages: total_pages(total_items, request.limit()),
            limit: request.limit(),
            total_items,
        }
    }

    /// Convert every item while keeping the page metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            current_page: self.current_page,
            total_pages: self.total_pages,
            limit: self.limit,
            total_items: self.total_items,
        }
    }

    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// A hypermedia link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
}

impl Link {
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }
}

/// Navigation links for a paginated collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLinks {
    pub first: Link,
    pub last: Link,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Link>,
}

impl PageLinks {
    /// Links for `page` of the collection served at `path`
    ///
    /// `last` points at page 1 when the collection is empty.
    pub fn for_page<T>(path: &str, page: &Page<T>) -> Self {
        let href = |n: u32| Link::new(format!("{}?page={}&limit={}", path, n, page.limit));

        Self {
            first: href(1),
            last: href(page.total_pages.max(1)),
            prev: page.has_prev().then(|| href(page.current_page - 1)),
            next: page.has_next().then(|| href(page.current_page + 1)),
        }
    }
}
