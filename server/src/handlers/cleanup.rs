use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use system::{simplify, Stroke};

use super::MAX_BODY_BYTES;

#[derive(Debug, Default, Deserialize)]
struct CleanupRequest {
    #[serde(default)]
    strokes: Vec<Stroke>,
}

#[derive(Debug, Serialize)]
struct CleanupResponse {
    strokes: Vec<Stroke>,
}

pub fn configure_cleanup_handlers(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/ai/cleanup")
            .app_data(web::PayloadConfig::new(MAX_BODY_BYTES))
            .route(web::post().to(cleanup)),
    );
}

/// Never fails: a body that cannot be read as strokes is treated as having none.
async fn cleanup(body: web::Bytes) -> impl Responder {
    let request = system::serde_json::from_slice::<CleanupRequest>(&body).unwrap_or_else(|err| {
        log::debug!("Cleanup body ignored: {}", err);
        CleanupRequest::default()
    });

    HttpResponse::Ok().json(CleanupResponse {
        strokes: simplify(&request.strokes),
    })
}
