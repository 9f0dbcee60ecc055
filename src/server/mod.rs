//! actix-web surface: route wiring, CORS and request logging.

mod routes;
pub mod types;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use log::info;

use crate::scorer::Scorer;
use crate::settings::Settings;

const JSON_PAYLOAD_LIMIT: usize = 10 * 1024 * 1024;

fn build_cors(settings: &Settings) -> Cors {
    if settings.allows_any_origin() {
        return Cors::permissive();
    }

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
        .supports_credentials()
        .max_age(3600);
    for origin in &settings.allowed_origins {
        cors = cors.allowed_origin(origin);
    }
    cors
}

/// Registers every route. Split out of [`run`] so tests can mount
/// the same surface on their own `App`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(routes::root))
        .route("/health", web::get().to(routes::health))
        .route("/predict", web::post().to(routes::predict))
        .route("/batch_predict", web::post().to(routes::batch_predict))
        .route("/upload", web::post().to(routes::upload))
        .default_service(web::route().to(routes::not_found));
}

/// Runs the HTTP server until shutdown. The scorer is shared across
/// all workers; inference itself happens on the blocking pool.
pub async fn run(settings: Settings, scorer: Arc<Scorer>) -> std::io::Result<()> {
    let bind_address = settings.bind_address();
    let workers = settings.workers;

    info!("Server listening on http://{}", bind_address);
    info!("Workers: {}", workers);
    info!("Endpoints:");
    info!("  GET  /              - service info");
    info!("  GET  /health        - health check");
    info!("  POST /predict       - score a single text");
    info!("  POST /batch_predict - score a list of texts");
    info!("  POST /upload        - score an anomaly workbook in the background");

    let scorer_data = web::Data::new(scorer);
    let settings_data = web::Data::new(settings.clone());

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(build_cors(&settings))
            .app_data(scorer_data.clone())
            .app_data(settings_data.clone())
            .app_data(web::JsonConfig::default().limit(JSON_PAYLOAD_LIMIT))
            .configure(configure)
    })
    .workers(workers)
    .bind(&bind_address)?
    .run()
    .await
}
