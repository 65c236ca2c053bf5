use crate::application::follow_service::FollowService;
use crate::domain::error::DomainError;
use crate::domain::viewer::AuthenticatedUser;
use crate::presentation::dto::FollowResponse;
use crate::presentation::handlers::request_id;
use actix_web::{HttpRequest, HttpResponse, post, web};
use tracing::info;

#[post("/profile/{username}/follow")]
async fn profile_follow(
    req: HttpRequest,
    user: AuthenticatedUser,
    follows: web::Data<FollowService>,
    path: web::Path<String>,
) -> Result<HttpResponse, DomainError> {
    let author = path.into_inner();
    let outcome = follows.follow(&user, &author).await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        author = %author,
        ?outcome,
        "follow requested"
    );

    Ok(HttpResponse::Ok().json(FollowResponse { author, outcome }))
}

#[post("/profile/{username}/unfollow")]
async fn profile_unfollow(
    req: HttpRequest,
    user: AuthenticatedUser,
    follows: web::Data<FollowService>,
    path: web::Path<String>,
) -> Result<HttpResponse, DomainError> {
    let author = path.into_inner();
    follows.unfollow(&user, &author).await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        author = %author,
        "unfollowed"
    );

    Ok(HttpResponse::NoContent().finish())
}
