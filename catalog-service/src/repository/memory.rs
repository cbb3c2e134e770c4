//! In-process store used when no database is configured, and by tests

use async_trait::async_trait;
use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use super::{
    ClientRepository, Datastore, ProductRepository, UserRepository, USERNAME_FIELD,
    USERNAME_TAKEN,
};
use crate::error::{
    DatabaseError, DatabaseErrorKind, DatabaseOperation, Result, ValidationErrors,
};
use crate::models::{Client, NewClientRecord, NewProduct, NewUserRecord, Product, User};
use crate::pagination::{Page, PageRequest};

#[derive(Debug, Default)]
struct Tables {
    clients: DashMap<i64, Client>,
    client_emails: DashMap<String, i64>,
    users: DashMap<i64, User>,
    usernames: DashMap<String, i64>,
    products: DashMap<i64, Product>,
    next_client_id: AtomicI64,
    next_user_id: AtomicI64,
    next_product_id: AtomicI64,
}

/// Store holding every table in concurrent maps
///
/// Ids are assigned from 1 upwards per table. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn next_id(counter: &AtomicI64) -> i64 {
    counter.fetch_add(1, Ordering::SeqCst) + 1
}

/// Slice `rows` (already filtered) into the requested page, ordered by id
fn paginate<T>(mut rows: Vec<(i64, T)>, page: &PageRequest) -> Page<T> {
    rows.sort_unstable_by_key(|(id, _)| *id);
    let total = rows.len() as u64;
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let items = rows
        .into_iter()
        .skip(offset)
        .take(page.limit() as usize)
        .map(|(_, row)| row)
        .collect();
    Page::new(items, *page, total)
}

#[async_trait]
impl ClientRepository for MemoryStore {
    async fn find_client(&self, id: i64) -> Result<Option<Client>> {
        Ok(self.tables.clients.get(&id).map(|c| c.value().clone()))
    }

    async fn find_client_by_email(&self, email: &str) -> Result<Option<Client>> {
        let id = match self.tables.client_emails.get(email) {
            Some(id) => *id,
            None => return Ok(None),
        };
        self.find_client(id).await
    }

    async fn insert_client(&self, record: NewClientRecord) -> Result<Client> {
        let id = match self.tables.client_emails.entry(record.email.clone()) {
            Entry::Occupied(_) => {
                let mut err = DatabaseError::new(
                    DatabaseOperation::Insert,
                    DatabaseErrorKind::UniqueViolation,
                    format!("client email '{}' already exists", record.email),
                );
                err.constraint = Some("uniq_client_email".to_string());
                return Err(err.into());
            }
            Entry::Vacant(slot) => {
                let id = next_id(&self.tables.next_client_id);
                slot.insert(id);
                id
            }
        };

        let client = Client {
            id,
            email: record.email,
            password: record.password_hash,
            name: record.name,
            address: record.address,
            address_complement: record.address_complement,
            postal_code: record.postal_code,
            city: record.city,
            creation_date: Utc::now(),
            roles: record.roles,
        };
        self.tables.clients.insert(id, client.clone());
        Ok(client)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_users_page(&self, client_id: i64, page: &PageRequest) -> Result<Page<User>> {
        let rows = self
            .tables
            .users
            .iter()
            .filter(|u| u.client_id == client_id)
            .map(|u| (u.id, u.value().clone()))
            .collect();
        Ok(paginate(rows, page))
    }

    async fn find_user_for_client(&self, client_id: i64, id: i64) -> Result<Option<User>> {
        Ok(self
            .tables
            .users
            .get(&id)
            .filter(|u| u.client_id == client_id)
            .map(|u| u.value().clone()))
    }

    async fn insert_user(&self, client_id: i64, record: NewUserRecord) -> Result<User> {
        if !self.tables.clients.contains_key(&client_id) {
            let mut err = DatabaseError::new(
                DatabaseOperation::Insert,
                DatabaseErrorKind::ConstraintViolation,
                format!("client {} does not exist", client_id),
            );
            err.constraint = Some("fk_user_client".to_string());
            return Err(err.into());
        }

        let id = match self.tables.usernames.entry(record.username.clone()) {
            Entry::Occupied(_) => {
                return Err(ValidationErrors::single(USERNAME_FIELD, USERNAME_TAKEN).into());
            }
            Entry::Vacant(slot) => {
                let id = next_id(&self.tables.next_user_id);
                slot.insert(id);
                id
            }
        };

        let user = User {
            id,
            client_id,
            username: record.username,
            password: record.password_hash,
            name: record.name,
            surname: record.surname,
            email: record.email,
            creation_date: Utc::now(),
        };
        self.tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn delete_user(&self, client_id: i64, id: i64) -> Result<bool> {
        match self
            .tables
            .users
            .remove_if(&id, |_, user| user.client_id == client_id)
        {
            Some((_, user)) => {
                self.tables.usernames.remove(&user.username);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn find_products_page(&self, page: &PageRequest) -> Result<Page<Product>> {
        let rows = self
            .tables
            .products
            .iter()
            .map(|p| (p.id, p.value().clone()))
            .collect();
        Ok(paginate(rows, page))
    }

    async fn find_product(&self, id: i64) -> Result<Option<Product>> {
        Ok(self.tables.products.get(&id).map(|p| p.value().clone()))
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product> {
        let product = product.with_id(next_id(&self.tables.next_product_id));
        self.tables.products.insert(product.id, product.clone());
        Ok(product)
    }
}

#[async_trait]
impl Datastore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::ROLE_USER;

    fn client_record(i: u32) -> NewClientRecord {
        NewClientRecord {
            email: format!("client{}@test.fr", i),
            password_hash: "hash".into(),
            name: format!("ClientName{}", i),
            address: None,
            address_complement: None,
            postal_code: None,
            city: None,
            roles: vec![ROLE_USER.to_string()],
        }
    }

    fn user_record(username: &str) -> NewUserRecord {
        NewUserRecord {
            username: username.into(),
            password_hash: "hash".into(),
            name: "Name".into(),
            surname: "Surname".into(),
            email: format!("{}@test.fr", username.to_lowercase()),
        }
    }

    fn page(page: u32, limit: u32) -> PageRequest {
        PageRequest::new(page, limit).unwrap()
    }

    #[tokio::test]
    async fn test_pages_partition_the_collection() {
        let store = MemoryStore::new();
        let client = store.insert_client(client_record(1)).await.unwrap();
        for i in 0..7 {
            store
                .insert_user(client.id, user_record(&format!("User{}", i)))
                .await
                .unwrap();
        }

        let mut seen = Vec::new();
        let first = store.find_users_page(client.id, &page(1, 3)).await.unwrap();
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.total_items, 7);
        for p in 1..=first.total_pages {
            let chunk = store.find_users_page(client.id, &page(p, 3)).await.unwrap();
            assert!(chunk.items.len() <= 3);
            seen.extend(chunk.items.into_iter().map(|u| u.id));
        }
        assert_eq!(seen, (1..=7).collect::<Vec<i64>>());

        let beyond = store.find_users_page(client.id, &page(4, 3)).await.unwrap();
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total_pages, 3);
    }

    #[tokio::test]
    async fn test_users_are_scoped_to_their_client() {
        let store = MemoryStore::new();
        let c1 = store.insert_client(client_record(1)).await.unwrap();
        let c2 = store.insert_client(client_record(2)).await.unwrap();
        let user = store.insert_user(c1.id, user_record("Client1User0")).await.unwrap();

        assert!(store.find_user_for_client(c1.id, user.id).await.unwrap().is_some());
        assert!(store.find_user_for_client(c2.id, user.id).await.unwrap().is_none());
        assert!(!store.delete_user(c2.id, user.id).await.unwrap());
        assert!(store.delete_user(c1.id, user.id).await.unwrap());
        assert!(store.find_user_for_client(c1.id, user.id).await.unwrap().is_none());

        let empty = store.find_users_page(c1.id, &page(1, 10)).await.unwrap();
        assert_eq!(empty.total_pages, 0);
        assert!(empty.items.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_a_validation_error() {
        let store = MemoryStore::new();
        let client = store.insert_client(client_record(1)).await.unwrap();
        store.insert_user(client.id, user_record("taken")).await.unwrap();

        match store.insert_user(client.id, user_record("taken")).await {
            Err(Error::Validation(errors)) => {
                assert_eq!(errors.get("username"), Some(USERNAME_TAKEN));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_user_requires_an_existing_client() {
        let store = MemoryStore::new();

        match store.insert_user(9999, user_record("Orphan")).await {
            Err(Error::Database(err)) => {
                assert_eq!(err.kind, DatabaseErrorKind::ConstraintViolation);
                assert_eq!(err.constraint.as_deref(), Some("fk_user_client"));
            }
            other => panic!("expected constraint violation, got {:?}", other),
        }

        // The username was not reserved by the failed insert
        let client = store.insert_client(client_record(1)).await.unwrap();
        assert!(store.insert_user(client.id, user_record("Orphan")).await.is_ok());
    }

    #[tokio::test]
    async fn test_username_is_released_on_delete() {
        let store = MemoryStore::new();
        let client = store.insert_client(client_record(1)).await.unwrap();
        let user = store.insert_user(client.id, user_record("reused")).await.unwrap();
        store.delete_user(client.id, user.id).await.unwrap();
        assert!(store.insert_user(client.id, user_record("reused")).await.is_ok());
    }

    #[tokio::test]
    async fn test_client_lookup_by_email() {
        let store = MemoryStore::new();
        let client = store.insert_client(client_record(3)).await.unwrap();
        let found = store.find_client_by_email("client3@test.fr").await.unwrap();
        assert_eq!(found.map(|c| c.id), Some(client.id));
        assert!(store.find_client_by_email("nobody@test.fr").await.unwrap().is_none());
        assert!(store.insert_client(client_record(3)).await.is_err());
    }
}
