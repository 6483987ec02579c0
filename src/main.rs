use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hospital::config::{AppConfig, ConfigError, StoreBackend};
use hospital::media::{IpfsMediaStore, MediaStore};
use hospital::routes;
use hospital::store::{MemoryStore, PgStore, Store};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("hospital=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store: Arc<dyn Store> = match config.backend {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or(ConfigError::Missing("DATABASE_URL"))?;
            let store = PgStore::connect(url, config.pool_size, config.transaction_id_style)
                .context("Failed to create database pool")?;
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; records are lost on exit");
            Arc::new(MemoryStore::new(config.transaction_id_style))
        }
    };
    let media: Arc<dyn MediaStore> = Arc::new(IpfsMediaStore::connect(config.ipfs_api_url.as_deref())?);

    let bind = (config.bind_addr.clone(), config.port);
    tracing::info!("++ Starting hospital API on {}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::from(store.clone()))
            .app_data(web::Data::from(media.clone()))
            .app_data(web::Data::new(config.clone()))
            .configure(routes::configure)
    })
    .bind(bind)?
    .run()
    .await?;

    Ok(())
}
