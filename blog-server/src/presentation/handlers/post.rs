use crate::application::post_service::PostService;
use crate::domain::error::DomainError;
use crate::domain::viewer::AuthenticatedUser;
use crate::presentation::dto::{CommentRequest, PostRequest};
use crate::presentation::handlers::{page_or_index, request_id};
use crate::presentation::utils::{found, post_detail_path, profile_path};
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use tracing::info;

#[get("/posts/{post_id}")]
async fn post_detail(
    req: HttpRequest,
    posts: web::Data<PostService>,
    path: web::Path<i64>,
) -> Result<HttpResponse, DomainError> {
    let result = posts.post_detail(path.into_inner()).await;
    page_or_index(&req, result)
}

#[post("/posts")]
async fn create_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    payload: web::Json<PostRequest>,
) -> Result<HttpResponse, DomainError> {
    let post = posts.create_post(&user, payload.into_inner().into()).await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id = post.id,
        "post created"
    );

    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, profile_path(&user.username)))
        .json(post))
}

/// A non-author lands back on the post instead of getting an error.
#[put("/posts/{post_id}")]
async fn update_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    path: web::Path<i64>,
    payload: web::Json<PostRequest>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    match posts
        .edit_post(&user, post_id, payload.into_inner().into())
        .await
    {
        Ok(post) => {
            info!(
                request_id = %request_id(&req),
                username = %user.username,
                post_id,
                "post updated"
            );
            Ok(HttpResponse::Ok().json(post))
        }
        Err(DomainError::PermissionDenied) => Ok(found(&post_detail_path(post_id))),
        Err(err) => Err(err),
    }
}

#[delete("/posts/{post_id}")]
async fn delete_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    path: web::Path<i64>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    posts.delete_post(&user, post_id).await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id,
        "post deleted"
    );

    Ok(HttpResponse::NoContent().finish())
}

#[post("/posts/{post_id}/comments")]
async fn add_comment(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    path: web::Path<i64>,
    payload: web::Json<CommentRequest>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let comment = posts
        .add_comment(&user, post_id, payload.into_inner().text)
        .await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id,
        comment_id = comment.id,
        "comment added"
    );

    Ok(HttpResponse::Created().json(comment))
}
