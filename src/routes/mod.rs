// Route exports
pub mod catalog;
pub mod favorites;
pub mod search;
pub mod subscriptions;

use actix_web::{error, web, HttpRequest, HttpResponse};

use crate::models::ErrorResponse;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(search::configure)
            .configure(catalog::configure)
            .configure(favorites::configure)
            .configure(subscriptions::configure),
    );
}

/// Turn a malformed JSON body into a 400 with our error shape.
pub fn json_error_handler(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Rejected JSON payload on {}: {}", req.path(), err);
    let message = err.to_string();
    bad_request(err, "invalid_json", message)
}

/// Turn an undeserializable query string into a 400 with our error shape.
pub fn query_error_handler(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Rejected query string on {}: {}", req.path(), err);
    let message = err.to_string();
    bad_request(err, "invalid_query", message)
}

fn bad_request<E>(cause: E, error: &str, message: String) -> actix_web::Error
where
    E: std::fmt::Debug + std::fmt::Display + 'static,
{
    let body = HttpResponse::BadRequest().json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: 400,
    });
    error::InternalError::from_response(cause, body).into()
}
