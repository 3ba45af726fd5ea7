use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::{self, Data};
use actix_web::{App, HttpServer};
use anyhow::Context;
use tracing::{info, warn};
use tracing_appender::rolling;

use classflow::api::status;
use classflow::config::Config;
use classflow::db::open_store;
use classflow::routes;
use classflow::state::AppState;
use classflow::utils::clock::SystemClock;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "classflow.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    for warning in &config.warnings {
        warn!("{warning}");
    }

    info!(
        addr = %config.server_addr,
        environment = %config.environment,
        late_cutoff = %config.late_cutoff.format("%H:%M"),
        "Server starting..."
    );

    let store = open_store(&config)
        .await
        .context("failed to open attendance store")?;

    let state = Data::new(AppState::new(config.clone(), store.clone(), Arc::new(SystemClock)));

    let warmup_state = state.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = warmup_state
            .students
            .warmup(warmup_state.store.as_ref(), 250)
            .await
        {
            warn!(error = %e, "Failed to warm up student cache");
        }
    });

    let server_addr = config.server_addr.clone();
    let route_config = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .wrap(routes::cors(&route_config))
            .app_data(state.clone())
            .configure(|cfg| routes::configure(cfg, &route_config))
            .default_service(web::to(status::not_found))
    })
    .bind(&server_addr)
    .with_context(|| format!("failed to bind {server_addr}"))?
    .run()
    .await?;

    store.close().await;
    info!("Attendance store closed");
    Ok(())
}
