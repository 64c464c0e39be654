mod classify;
mod routes;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use std::env;

use classify::config::ModelManifest;
use classify::pipeline::Analyzer;
use routes::configure_routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv::dotenv().ok();

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    }

    // Model loading gates all interaction: the server does not come up
    // until both heads are ready.
    let manifest = ModelManifest::load().map_err(|e| {
        log::error!("Failed to load model manifest: {}", e);
        std::io::Error::other(format!("Manifest loading failed: {e}"))
    })?;
    let analyzer = Analyzer::from_manifest(&manifest).map_err(|e| {
        log::error!("Failed to preload models at startup: {}", e);
        std::io::Error::other(format!("Model loading failed: {e}"))
    })?;
    log::info!("Both classifier heads loaded");

    let analyzer = web::Data::new(analyzer);

    let port = env::var("PORT").unwrap_or_else(|_| "8081".to_string());
    let bind_address = format!("0.0.0.0:{}", port);
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::AUTHORIZATION,
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(analyzer.clone())
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
