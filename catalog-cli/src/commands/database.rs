use anyhow::{Context, Result};
use catalog_service::{
    auth::PasswordHasher,
    cache::{RedisCacheBackend, TagCache},
    config::{Config, DatabaseConfig},
    database, fixtures,
    repository::PgStore,
};
use colored::Colorize;
use sqlx::PgPool;
use std::path::Path;
use std::sync::Arc;

fn database_config(config: &Config) -> Result<&DatabaseConfig> {
    config.database.as_ref().context(
        "No [database] section configured. Set database.url in config.toml or CATALOG_DATABASE__URL",
    )
}

async fn connect(config: &Config) -> Result<PgPool> {
    let db = database_config(config)?;
    println!(
        "{} {}",
        "Connecting to".cyan(),
        database::sanitize_connection_url(&db.url)
    );
    database::create_pool(db)
        .await
        .context("Failed to connect to the database")
}

/// The cache a running server reads listings from, so seeding can invalidate them
async fn listing_cache(config: &Config) -> Result<TagCache> {
    match &config.redis {
        Some(redis) => {
            let backend = RedisCacheBackend::connect(redis)
                .await
                .context("Failed to connect to Redis")?;
            Ok(TagCache::new(Arc::new(backend)))
        }
        None => Ok(TagCache::in_memory()),
    }
}

async fn apply_migrations(pool: &PgPool) -> Result<()> {
    database::run_migrations(pool)
        .await
        .context("Failed to apply migrations")?;

    println!("{} Migrations applied", "✓".green().bold());
    Ok(())
}

pub async fn migrate(config_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path)?;
    let pool = connect(&config).await?;
    apply_migrations(&pool).await
}

pub async fn seed(config_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path)?;
    let pool = connect(&config).await?;
    apply_migrations(&pool).await?;

    let hasher = PasswordHasher::new(&config.password).context("Invalid password settings")?;
    let store = PgStore::new(pool);
    let cache = listing_cache(&config).await?;

    let summary = fixtures::load(&store, &cache, &hasher)
        .await
        .context("Failed to load fixtures")?;

    if summary == fixtures::FixtureSummary::default() {
        println!("{} Dataset already present, nothing to do", "•".yellow());
    } else {
        println!(
            "{} Loaded {} products, {} clients, {} users",
            "✓".green().bold(),
            summary.products,
            summary.clients,
            summary.users
        );
        println!(
            "  Log in as {} with password {}",
            fixtures::client_email(0).bold(),
            fixtures::client_password(0).bold()
        );
    }

    Ok(())
}
