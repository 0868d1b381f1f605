use actix_web::{web, HttpResponse, Responder};
use system::serde_json::json;

use crate::connection::ws_index;
use crate::handlers::cleanup::configure_cleanup_handlers;
use crate::handlers::diagrams::configure_diagram_handlers;

mod cleanup;
mod diagrams;

/// Request body ceiling for the JSON endpoints. Stroke sets from long sessions get large.
pub const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Every route the server exposes. Expects a `RelayHandle` and a `DiagramStore` in app data.
pub fn root(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/ws/draw").route(web::get().to(ws_index)));

    configure_cleanup_handlers(cfg);
    configure_diagram_handlers(cfg);
}

async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({ "message": "Collaborative drawing backend" }))
}
