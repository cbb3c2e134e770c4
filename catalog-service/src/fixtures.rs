//! Demo dataset: 20 products, 20 clients and 2 users per client
//!
//! Client `i` logs in as `client{i}@test.fr` with password `passwordtest!{i}`.
//! Its users are `Client{i}User0` and `Client{i}User1`, sharing that password.

use crate::{
    auth::PasswordHasher,
    cache::{keys, TagCache},
    error::Result,
    models::{NewClientRecord, NewProduct, NewUserRecord, ROLE_USER},
    pagination::PageRequest,
    repository::Datastore,
};

pub const PRODUCT_COUNT: u32 = 20;
pub const CLIENT_COUNT: u32 = 20;
pub const USERS_PER_CLIENT: u32 = 2;

/// What [`load`] inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixtureSummary {
    pub products: u32,
    pub clients: u32,
    pub users: u32,
}

/// Email of fixture client `i`
pub fn client_email(i: u32) -> String {
    format!("client{}@test.fr", i)
}

/// Password of fixture client `i` and of its users
pub fn client_password(i: u32) -> String {
    format!("passwordtest!{}", i)
}

/// Fixture product `i`; even indices are iOS phones, odd ones Android
pub fn product(i: u32) -> NewProduct {
    let ios = i % 2 == 0;
    NewProduct {
        name: format!("product {}", i),
        manufacturer: format!("manufacturer {}", i),
        dimensions: "Height : 146.7 mm - Width : 71.5 mm - Depth : 7.65 mm".to_string(),
        weight: format!("{}Gr", 100 + (i * 37) % 201),
        os: if ios { "IOS" } else { "Androïd" }.to_string(),
        connectivity: "4G, 5G, Wifi, Bluetooth".to_string(),
        camera: "Digital zoom up to 5x, Night mode, Smart HDR 4".to_string(),
        app: if ios {
            "Siri, Notes, Maps, Apple Store, Face ID"
        } else {
            "Play Store, YouTube, Gmail"
        }
        .to_string(),
        storage: "256Go".to_string(),
        ram: "6Go".to_string(),
        battery: "Lithium-ion Up to 19 hours. Fast-charge capable".to_string(),
        gps: "yes".to_string(),
        accessories: "USB-C Charge Cable".to_string(),
        processor: if ios { "A15 Bionic chip" } else { "Snapdragon 8 Gen2" }.to_string(),
        design: "Glass back and aluminum".to_string(),
        description: if ios {
            "Description Iphone"
        } else {
            "Description Androïd Phone"
        }
        .to_string(),
        price: f64::from(200 + (i * 97) % 1801),
    }
}

/// Insert whatever part of the dataset is missing
///
/// Loading resumes where an interrupted run stopped: products are topped up
/// to [`PRODUCT_COUNT`], existing clients are reused (their stored hash is
/// kept for their users) and each client gets its missing users. Cached
/// listings touched by an insert are invalidated before the insert.
pub async fn load(
    store: &dyn Datastore,
    cache: &TagCache,
    hasher: &PasswordHasher,
) -> Result<FixtureSummary> {
    let mut summary = FixtureSummary::default();

    let present = store
        .find_products_page(&PageRequest::new(1, 1)?)
        .await?
        .total_items;
    let present = u32::try_from(present).unwrap_or(u32::MAX);
    if present < PRODUCT_COUNT {
        cache
            .invalidate_tags(&[keys::PRODUCTS_TAG.to_string()])
            .await?;
        for i in present..PRODUCT_COUNT {
            store.insert_product(product(i)).await?;
            summary.products += 1;
        }
    }

    let users_page = PageRequest::new(1, USERS_PER_CLIENT)?;
    for i in 0..CLIENT_COUNT {
        let client = match store.find_client_by_email(&client_email(i)).await? {
            Some(client) => client,
            None => {
                let client = store.insert_client(client_record(i, hasher)?).await?;
                summary.clients += 1;
                client
            }
        };

        let existing = store.find_users_page(client.id, &users_page).await?.total_items;
        let existing = u32::try_from(existing).unwrap_or(u32::MAX);
        if existing >= USERS_PER_CLIENT {
            continue;
        }

        cache.invalidate_tags(&[keys::users_tag(client.id)]).await?;
        for j in existing..USERS_PER_CLIENT {
            store
                .insert_user(client.id, user_record(i, j, &client.password))
                .await?;
            summary.users += 1;
        }
    }

    if summary == FixtureSummary::default() {
        tracing::info!("Fixtures already loaded, skipping");
    } else {
        tracing::info!(
            products = summary.products,
            clients = summary.clients,
            users = summary.users,
            "Fixtures loaded"
        );
    }

    Ok(summary)
}

fn client_record(i: u32, hasher: &PasswordHasher) -> Result<NewClientRecord> {
    Ok(NewClientRecord {
        email: client_email(i),
        password_hash: hasher.hash(&client_password(i))?,
        name: format!("ClientName{}", i),
        address: Some(format!("Client address{}", i)),
        address_complement: Some(format!("Client address complement{}", i)),
        postal_code: Some("73 200".to_string()),
        city: Some("Mercury".to_string()),
        roles: vec![ROLE_USER.to_string()],
    })
}

/// User `j` of client `i`, sharing the client's password hash
fn user_record(i: u32, j: u32, password_hash: &str) -> NewUserRecord {
    NewUserRecord {
        username: format!("Client{}User{}", i, j),
        password_hash: password_hash.to_string(),
        name: format!("Client{}Name{}", i, j),
        surname: format!("Client{}Surname{}", i, j),
        email: format!("client{}user{}@test.fr", i, j),
    }
}
