use actix_multipart::Multipart;
use actix_web::{Error, HttpResponse, web};
use futures::{StreamExt, TryStreamExt};
use log::{error, info};
use serde_json::json;
use std::io::Write;
use uuid::Uuid;

use shared::classes::{LesionClass, MALIGNANCY_INFO};

use crate::classify::pipeline::Analyzer;

/// Shown to the client for any failed analysis; the granular cause only
/// goes to the log.
const GENERIC_ANALYSIS_ERROR: &str = "Something went wrong, please try again.";

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/analysis").route(web::post().to(handle_analysis)))
        .service(web::resource("/api/classes").route(web::get().to(list_classes)))
        .service(web::resource("/api/health").route(web::get().to(health)));
}

async fn handle_analysis(
    analyzer: web::Data<Analyzer>,
    mut payload: Multipart,
) -> Result<HttpResponse, Error> {
    let mut images: Vec<Vec<u8>> = Vec::new();

    while let Ok(Some(mut field)) = payload.try_next().await {
        let mut image_data = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk?;
            image_data.write_all(&data)?;
        }
        if !image_data.is_empty() {
            images.push(image_data);
        }
    }

    let mut results = Vec::new();
    for image_data in &images {
        let scan_id = Uuid::new_v4();
        match analyzer.analyze(image_data) {
            Ok(response) => {
                info!(
                    "scan {} complete: malignant {}% image {}",
                    scan_id,
                    shared::format_percent(response.malignant_probability),
                    response.image_sha256
                );
                results.push(json!({
                    "scan": { "id": scan_id },
                    "analysis": response
                }));
            }
            Err(e) => {
                error!("scan {} failed: {}", scan_id, e);
                results.push(json!({
                    "scan": { "id": scan_id },
                    "error": GENERIC_ANALYSIS_ERROR
                }));
            }
        }
    }

    Ok(HttpResponse::Ok().json(json!({
        "results": results
    })))
}

async fn list_classes() -> HttpResponse {
    let classes: Vec<_> = LesionClass::ALL
        .iter()
        .map(|class| {
            let info = class.info();
            json!({
                "class": class,
                "label": info.label,
                "description": info.description,
                "reference_url": info.reference_url
            })
        })
        .collect();

    HttpResponse::Ok().json(json!({
        "malignancy": {
            "label": MALIGNANCY_INFO.label,
            "description": MALIGNANCY_INFO.description,
            "reference_url": MALIGNANCY_INFO.reference_url
        },
        "classes": classes
    }))
}

async fn health() -> HttpResponse {
    // The analyzer is constructed before the server binds, so reaching this
    // handler means the models are loaded.
    HttpResponse::Ok().json(json!({ "status": "ready" }))
}
