mod config;
mod core;
mod models;
mod routes;
mod services;

use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{LoggingSettings, Settings};
use crate::core::SearchEngine;
use crate::routes::search::AppState;
use crate::services::{CacheManager, GeocoderClient, PostgresClient};

fn init_tracing(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.clone()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if logging.format == "pretty" {
        builder.pretty().init();
    } else {
        builder.init();
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("configuration error: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    init_tracing(&settings.logging);

    info!("Starting famille-search {}", env!("CARGO_PKG_VERSION"));

    let geocoder = Arc::new(GeocoderClient::new(
        settings.geocoder.endpoint,
        settings.geocoder.user_agent,
        settings.geocoder.country,
    ));

    let cache = CacheManager::new(
        &settings.cache.redis_url,
        settings.cache.l1_cache_size.unwrap_or(1000),
        settings.cache.ttl_secs.unwrap_or(3600),
    )
    .await
    .map(Arc::new)
    .map_err(|e| {
        tracing::error!("Redis connection failed: {}", e);
        io::Error::new(io::ErrorKind::ConnectionRefused, e)
    })?;

    info!("Cache connected to {}", settings.cache.redis_url);

    let postgres = PostgresClient::from_settings(
        &settings.database.url,
        settings.database.max_connections,
        settings.database.min_connections,
    )
    .await
    .map(Arc::new)
    .map_err(|e| {
        tracing::error!("PostgreSQL connection failed: {}", e);
        io::Error::new(io::ErrorKind::ConnectionRefused, e)
    })?;

    info!("Database connected, migrations applied");

    let engine = SearchEngine::new(settings.search.clone().into());

    info!("Search engine ready: {:?}", engine.settings());

    let state = AppState {
        postgres,
        cache,
        geocoder,
        engine,
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Listening on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::JsonConfig::default().error_handler(routes::json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(routes::query_error_handler))
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
