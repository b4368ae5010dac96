use actix_web::web::Data;
use actix_web::{HttpResponse, Responder};
use radio_sessions::RadioManager;
use serde_json::json;
use std::sync::Arc;

pub(crate) async fn health_check(radio_manager: Data<Arc<RadioManager>>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "version": crate::VERSION,
        "active_sessions": radio_manager.active_sessions().len(),
    }))
}
