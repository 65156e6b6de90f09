#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Process entry point: wires the store, fetcher, and run controller
//! together and serves the API.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use vrm_harvest_engine::{Pacing, RunController};
use vrm_harvest_scraper::{ScrapeConfig, fetch::PageFetcher};
use vrm_harvest_server::{AppState, handlers};
use vrm_harvest_store::Store;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let data_dir = std::env::var("VRM_DATA_DIR").unwrap_or_else(|_| "data".to_string());
    let store = Arc::new(Store::new(&data_dir).expect("Failed to open data directory"));
    log::info!("Data directory: {data_dir}");

    let mut config = ScrapeConfig::new();
    if let Ok(base_url) = std::env::var("VRM_BASE_URL") {
        log::info!("Catalog URL override: {base_url}");
        config = config.with_base_url(&base_url);
    }
    let fetcher = PageFetcher::new(config).expect("Failed to build page fetcher");

    let controller = RunController::new(fetcher, Arc::clone(&store), Pacing::default());

    let api_key = std::env::var("VRM_API_KEY").ok();
    if api_key.is_none() {
        log::warn!("VRM_API_KEY not set — API is unauthenticated");
    }

    let state = web::Data::new(AppState {
        controller,
        store,
        api_key,
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .route("/", web::get().to(handlers::banner))
            .service(
                web::scope("/api")
                    .route("/run", web::post().to(handlers::start_run))
                    .route("/progress", web::get().to(handlers::progress))
                    .route("/kill", web::post().to(handlers::kill))
                    .route("/latest", web::get().to(handlers::latest))
                    .route("/images", web::get().to(handlers::images)),
            )
            .route("/export.csv", web::get().to(handlers::export_csv))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
