//! PostgreSQL store

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use super::{
    ClientRepository, Datastore, ProductRepository, UserRepository, USERNAME_FIELD,
    USERNAME_TAKEN,
};
use crate::error::{
    DatabaseError, DatabaseErrorKind, DatabaseOperation, Error, Result, ValidationErrors,
};
use crate::models::{Client, NewClientRecord, NewProduct, NewUserRecord, Product, User};
use crate::pagination::{Page, PageRequest};

const USERNAME_CONSTRAINT: &str = "uniq_user_username";

const CLIENT_COLUMNS: &str = "id, email, password, name, address, address_complement, \
     postal_code, city, creation_date, roles";

const USER_COLUMNS: &str = "id, client_id, username, password, name, surname, email, creation_date";

const PRODUCT_COLUMNS: &str = "id, name, manufacturer, dimensions, weight, os, connectivity, \
     camera, app, storage, ram, battery, gps, accessories, processor, design, description, price";

/// Store backed by a `sqlx` connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn db_error(err: sqlx::Error, operation: DatabaseOperation) -> Error {
    Error::Database(DatabaseError::from(err).during(operation))
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_u64(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

#[async_trait]
impl ClientRepository for PgStore {
    async fn find_client(&self, id: i64) -> Result<Option<Client>> {
        let sql = format!("SELECT {} FROM client WHERE id = $1", CLIENT_COLUMNS);
        sqlx::query_as::<_, Client>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error(e, DatabaseOperation::Query))
    }

    async fn find_client_by_email(&self, email: &str) -> Result<Option<Client>> {
        let sql = format!("SELECT {} FROM client WHERE email = $1", CLIENT_COLUMNS);
        sqlx::query_as::<_, Client>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error(e, DatabaseOperation::Query))
    }

    async fn insert_client(&self, record: NewClientRecord) -> Result<Client> {
        let sql = format!(
            "INSERT INTO client \
             (email, password, name, address, address_complement, postal_code, city, roles, creation_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            CLIENT_COLUMNS
        );
        sqlx::query_as::<_, Client>(&sql)
            .bind(&record.email)
            .bind(&record.password_hash)
            .bind(&record.name)
            .bind(&record.address)
            .bind(&record.address_complement)
            .bind(&record.postal_code)
            .bind(&record.city)
            .bind(&record.roles)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error(e, DatabaseOperation::Insert))
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_users_page(&self, client_id: i64, page: &PageRequest) -> Result<Page<User>> {
        let total: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM "user" WHERE client_id = $1"#)
            .bind(client_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error(e, DatabaseOperation::Query))?;

        let sql = format!(
            r#"SELECT {} FROM "user" WHERE client_id = $1 ORDER BY id LIMIT $2 OFFSET $3"#,
            USER_COLUMNS
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(client_id)
            .bind(i64::from(page.limit()))
            .bind(to_i64(page.offset()))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error(e, DatabaseOperation::Query))?;

        Ok(Page::new(users, *page, to_u64(total)))
    }

    async fn find_user_for_client(&self, client_id: i64, id: i64) -> Result<Option<User>> {
        let sql = format!(
            r#"SELECT {} FROM "user" WHERE id = $1 AND client_id = $2"#,
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error(e, DatabaseOperation::Query))
    }

    async fn insert_user(&self, client_id: i64, record: NewUserRecord) -> Result<User> {
        let sql = format!(
            r#"INSERT INTO "user" (client_id, username, password, name, surname, email, creation_date)
               VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}"#,
            USER_COLUMNS
        );
        let inserted = sqlx::query_as::<_, User>(&sql)
            .bind(client_id)
            .bind(&record.username)
            .bind(&record.password_hash)
            .bind(&record.name)
            .bind(&record.surname)
            .bind(&record.email)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await;

        match inserted {
            Ok(user) => Ok(user),
            Err(e) => {
                let err = DatabaseError::from(e).during(DatabaseOperation::Insert);
                if err.kind == DatabaseErrorKind::UniqueViolation
                    && err.constraint.as_deref() == Some(USERNAME_CONSTRAINT)
                {
                    Err(ValidationErrors::single(USERNAME_FIELD, USERNAME_TAKEN).into())
                } else {
                    Err(Error::Database(err))
                }
            }
        }
    }

    async fn delete_user(&self, client_id: i64, id: i64) -> Result<bool> {
        let result = sqlx::query(r#"DELETE FROM "user" WHERE id = $1 AND client_id = $2"#)
            .bind(id)
            .bind(client_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(e, DatabaseOperation::Delete))?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ProductRepository for PgStore {
    async fn find_products_page(&self, page: &PageRequest) -> Result<Page<Product>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error(e, DatabaseOperation::Query))?;

        let sql = format!(
            "SELECT {} FROM product ORDER BY id LIMIT $1 OFFSET $2",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(i64::from(page.limit()))
            .bind(to_i64(page.offset()))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error(e, DatabaseOperation::Query))?;

        Ok(Page::new(products, *page, to_u64(total)))
    }

    async fn find_product(&self, id: i64) -> Result<Option<Product>> {
        let sql = format!("SELECT {} FROM product WHERE id = $1", PRODUCT_COLUMNS);
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error(e, DatabaseOperation::Query))
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product> {
        let sql = format!(
            "INSERT INTO product \
             (name, manufacturer, dimensions, weight, os, connectivity, camera, app, storage, \
              ram, battery, gps, accessories, processor, design, description, price) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
             RETURNING {}",
            PRODUCT_COLUMNS
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(&product.name)
            .bind(&product.manufacturer)
            .bind(&product.dimensions)
            .bind(&product.weight)
            .bind(&product.os)
            .bind(&product.connectivity)
            .bind(&product.camera)
            .bind(&product.app)
            .bind(&product.storage)
            .bind(&product.ram)
            .bind(&product.battery)
            .bind(&product.gps)
            .bind(&product.accessories)
            .bind(&product.processor)
            .bind(&product.design)
            .bind(&product.description)
            .bind(product.price)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error(e, DatabaseOperation::Insert))
    }
}

#[async_trait]
impl Datastore for PgStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(e, DatabaseOperation::Query))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
