use actix_web::{web, HttpResponse};
use serde::Deserialize;

use system::serde_json::{json, Value};
use system::{DiagramId, NewDiagram};

use crate::diagram_store::DiagramStore;
use crate::error::ApiError;

use super::MAX_BODY_BYTES;

pub fn configure_diagram_handlers(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/diagrams")
            .app_data(
                web::JsonConfig::default()
                    .limit(MAX_BODY_BYTES)
                    .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
            )
            .service(web::resource("").route(web::post().to(create_diagram)))
            .service(web::resource("/shared").route(web::get().to(list_shared)))
            .service(web::resource("/user/{owner}").route(web::get().to(list_by_owner)))
            .service(web::resource("/{id}").route(web::get().to(show_diagram))),
    );
}

#[derive(Debug, Deserialize)]
struct CreateDiagramRequest {
    owner: Option<String>,
    title: Option<String>,
    #[serde(default = "empty_strokes")]
    strokes: Value,
    is_shared: Option<bool>,
}

fn empty_strokes() -> Value {
    Value::Array(Vec::new())
}

async fn create_diagram(
    payload: web::Json<CreateDiagramRequest>,
    store: web::Data<DiagramStore>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    let diagram = NewDiagram::new(
        payload.owner.unwrap_or_default(),
        payload.title.unwrap_or_default(),
        &payload.strokes,
        payload.is_shared.unwrap_or(false),
    )?;
    let id = store.create(diagram).await?;
    Ok(HttpResponse::Ok().json(json!({ "id": id, "message": "Diagram saved successfully" })))
}

async fn list_by_owner(
    owner: web::Path<String>,
    store: web::Data<DiagramStore>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(store.list_by_owner(&owner).await))
}

async fn list_shared(store: web::Data<DiagramStore>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(store.list_shared().await))
}

async fn show_diagram(
    id: web::Path<DiagramId>,
    store: web::Data<DiagramStore>,
) -> Result<HttpResponse, ApiError> {
    let diagram = store
        .get_by_id(id.into_inner())
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(diagram))
}
