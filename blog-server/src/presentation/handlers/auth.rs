use crate::application::auth_service::AuthService;
use crate::domain::error::DomainError;
use crate::infrastructure::security::TOKEN_TTL_SECS;
use crate::presentation::dto::{AuthResponse, LoginRequest, RegisterRequest};
use crate::presentation::handlers::request_id;
use actix_web::{HttpRequest, HttpResponse, Responder, Scope, post, web};
use tracing::info;

pub fn scope() -> Scope {
    web::scope("/auth").service(register).service(login)
}

#[post("/register")]
async fn register(
    req: HttpRequest,
    service: web::Data<AuthService>,
    payload: web::Json<RegisterRequest>,
) -> Result<impl Responder, DomainError> {
    let user = service
        .register(&payload.username, &payload.email, &payload.password)
        .await?;

    info!(request_id = %request_id(&req), user_id = %user.id, username = %user.username, "user registered");

    let jwt = service.login(&user.username, &payload.password).await?;

    Ok(HttpResponse::Created().json(AuthResponse {
        access_token: jwt,
        expires_in: TOKEN_TTL_SECS,
        token_type: "Bearer".to_string(),
    }))
}

#[post("/login")]
async fn login(
    req: HttpRequest,
    service: web::Data<AuthService>,
    payload: web::Json<LoginRequest>,
) -> Result<impl Responder, DomainError> {
    let jwt = service.login(&payload.username, &payload.password).await?;

    info!(request_id = %request_id(&req), username = %payload.username, "user logged in");

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: jwt,
        expires_in: TOKEN_TTL_SECS,
        token_type: "Bearer".to_string(),
    }))
}
