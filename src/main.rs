use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::{App, HttpServer};
use dotenvy::dotenv;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod routes;
mod state;
mod store;
mod tracker;
mod utils;

#[cfg(test)]
mod test_support;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::state::AppState;
use crate::store::MySqlStore;
use crate::tracker::clock::SystemClock;
use tracing::{error, info};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(
        server_addr = %config.server_addr,
        server_timezone = %config.server_timezone,
        "Server starting..."
    );

    let pool = init_db(&config.database_url, config.db_max_connections).await?;
    let store = Arc::new(MySqlStore::new(pool.clone()));

    let server_addr = config.server_addr.clone();
    let state = AppState::new(
        config.clone(),
        store.clone(),
        store.clone(),
        Arc::new(SystemClock),
    );

    let filter = state.email_filter.clone();
    let filter_store = store.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = filter.warmup(&*filter_store, 100).await {
            error!(error = %e, "Failed to warmup email filter");
        }
    });

    let cache = state.email_cache.clone();
    let cache_store = store.clone();
    actix_web::rt::spawn(async move {
        // Warm up last 30 days of recent users in batches of 250
        if let Err(e) = cache.warmup(&*cache_store, 30, 250).await {
            error!(error = %e, "Failed to warmup email cache");
        }
    });

    HttpServer::new(move || {
        App::new()
            .wrap(routes::build_cors(&config))
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .configure(|cfg| state.register(cfg))
            .configure(|cfg| routes::configure(cfg, &config))
    })
    .bind(server_addr)?
    .run()
    .await?;

    info!("Server stopped, closing database pool");
    pool.close().await;
    Ok(())
}
