use std::sync::Arc;

use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;

mod api;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod routes;
mod service;
mod store;
mod utils;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::service::{AttendanceService, SystemClock};
use crate::store::{AttendanceStore, MemoryAttendanceStore, MySqlAttendanceStore};
use tracing::{error, info, warn};
use tracing_appender::rolling;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

/// Route panics through tracing so they land in the log file too.
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        error!(panic = %panic_info, "Unhandled panic");
        default_hook(panic_info);
    }));
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log, mirrored to stdout
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking.and(std::io::stdout))
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    install_panic_hook();

    info!(
        addr = %config.server_addr,
        offset = %config.reference_zone.offset(),
        "Server starting..."
    );

    let store: Arc<dyn AttendanceStore> = match &config.database_url {
        Some(url) => {
            let pool = init_db(url, config.db_max_connections, config.store_timeout)
                .await
                .context("Failed to connect to database")?;
            info!("MySQL attendance store ready");
            Arc::new(MySqlAttendanceStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set, records live in memory and vanish on restart");
            Arc::new(MemoryAttendanceStore::new())
        }
    };

    let service = AttendanceService::new(
        store,
        Arc::new(SystemClock),
        config.reference_zone,
        config.store_timeout,
    );

    let server_addr = config.server_addr.clone();
    let api_prefix = config.api_prefix.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(service.clone()))
            .configure(|cfg| routes::configure(cfg, &api_prefix))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
