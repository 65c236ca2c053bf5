use actix_web::{HttpMessage, HttpRequest, HttpResponse};
use serde::Serialize;
use tracing::debug;

use crate::domain::error::DomainError;
use crate::presentation::middleware::RequestId;
use crate::presentation::utils::{INDEX_PATH, found};

pub mod auth;
pub mod feed;
pub mod follow;
pub mod group;
pub mod post;

pub(crate) fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|rid| rid.0.clone())
        .unwrap_or_else(|| "unknown".into())
}

/// Read-only pages answer a missing group, author or post by sending the
/// client back to the global feed.
pub(crate) fn page_or_index<T: Serialize>(
    req: &HttpRequest,
    result: Result<T, DomainError>,
) -> Result<HttpResponse, DomainError> {
    match result {
        Ok(body) => Ok(HttpResponse::Ok().json(body)),
        Err(err) if err.is_not_found() => {
            debug!(request_id = %request_id(req), error = %err, "redirecting to index");
            Ok(found(INDEX_PATH))
        }
        Err(err) => Err(err),
    }
}
