use actix_web::dev::Payload;
use actix_web::error::InternalError;
use actix_web::http::header;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest, HttpResponse, web};
use futures_util::future::{Ready, ready};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::application::auth_service::AuthService;
use crate::domain::error::DomainError;
use crate::domain::viewer::{AuthenticatedUser, Viewer};
use crate::presentation::dto::PageQuery;

pub const INDEX_PATH: &str = "/api/posts";
pub const LOGIN_PATH: &str = "/api/auth/login";

pub fn found(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

pub fn post_detail_path(post_id: i64) -> String {
    format!("/api/posts/{}", post_id)
}

pub fn profile_path(username: &str) -> String {
    format!("/api/profile/{}", username)
}

/// `next` is the raw request path; each segment is normalised to exactly one
/// level of percent-encoding and the slashes are kept.
pub fn login_redirect(next: &str) -> Error {
    let next = next
        .split('/')
        .map(|segment| {
            let decoded = urlencoding::decode(segment)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| segment.to_string());
            urlencoding::encode(&decoded).into_owned()
        })
        .collect::<Vec<_>>()
        .join("/");
    let location = format!("{}?next={}", LOGIN_PATH, next);
    InternalError::from_response("login required", found(&location)).into()
}

impl FromRequest for Viewer {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(req
            .extensions()
            .get::<Viewer>()
            .cloned()
            .unwrap_or_default()))
    }
}

/// Only resolves for a signed-in viewer; anonymous requests are sent to the
/// login page instead of reaching the handler.
impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<Viewer>() {
            Some(Viewer::Authenticated(user)) => ready(Ok(user.clone())),
            _ => ready(Err(login_redirect(req.path()))),
        }
    }
}

/// Repeated `page` keys resolve to the last one. A query string that does not
/// parse reads as no page at all.
impl FromRequest for PageQuery {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let page = web::Query::<Vec<(String, String)>>::from_query(req.query_string())
            .ok()
            .and_then(|pairs| {
                pairs
                    .into_inner()
                    .into_iter()
                    .rev()
                    .find(|(key, _)| key == "page")
                    .map(|(_, value)| value)
            });
        ready(Ok(PageQuery { page }))
    }
}

pub fn bearer_token(req: &actix_web::dev::ServiceRequest) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

/// Bad or stale credentials degrade to an anonymous viewer. Storage failures
/// do not: they surface as errors so a valid session is never dropped.
pub async fn resolve_viewer(
    token: &str,
    auth_service: &AuthService,
) -> Result<Viewer, DomainError> {
    let claims = match auth_service.keys().verify_token(token) {
        Ok(claims) => claims,
        Err(err) => {
            debug!(error = %err, "rejected bearer token");
            return Ok(Viewer::Anonymous);
        }
    };
    let Ok(user_id) = Uuid::parse_str(&claims.sub) else {
        return Ok(Viewer::Anonymous);
    };

    match auth_service.get_user(user_id).await {
        Ok(user) => Ok(Viewer::Authenticated(AuthenticatedUser {
            id: user.id,
            username: user.username,
        })),
        Err(DomainError::UserNotFound(_)) => {
            warn!(user_id = %user_id, "token for unknown user");
            Ok(Viewer::Anonymous)
        }
        Err(err) => {
            error!(user_id = %user_id, error = %err, "failed to resolve viewer");
            Err(err)
        }
    }
}
