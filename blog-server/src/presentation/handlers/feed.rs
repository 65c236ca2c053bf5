use crate::application::feed_service::FeedService;
use crate::domain::error::DomainError;
use crate::domain::viewer::{AuthenticatedUser, Viewer};
use crate::infrastructure::page_cache::PageCache;
use crate::presentation::dto::PageQuery;
use crate::presentation::handlers::{page_or_index, request_id};
use actix_web::http::header::ContentType;
use actix_web::{HttpRequest, HttpResponse, get, web};
use tracing::info;

#[get("/posts")]
async fn index(
    req: HttpRequest,
    feed: web::Data<FeedService>,
    cache: web::Data<PageCache>,
    query: PageQuery,
) -> Result<HttpResponse, DomainError> {
    let key = format!("{}?{}", req.path(), req.query_string());
    if let Some(body) = cache.get(&key).await {
        return Ok(HttpResponse::Ok()
            .content_type(ContentType::json())
            .body(body));
    }

    let page = feed.global_feed(query.page.as_deref()).await?;
    let body = serde_json::to_string(&page).map_err(|e| DomainError::Internal(e.to_string()))?;
    cache.insert(key, body.clone()).await;

    info!(
        request_id = %request_id(&req),
        page = page.number,
        "posts retrieved"
    );

    Ok(HttpResponse::Ok()
        .content_type(ContentType::json())
        .body(body))
}

#[get("/group/{slug}")]
async fn group_posts(
    req: HttpRequest,
    feed: web::Data<FeedService>,
    path: web::Path<String>,
    query: PageQuery,
) -> Result<HttpResponse, DomainError> {
    let slug = path.into_inner();
    let result = feed.group_feed(&slug, query.page.as_deref()).await;
    page_or_index(&req, result)
}

#[get("/profile/{username}")]
async fn profile(
    req: HttpRequest,
    viewer: Viewer,
    feed: web::Data<FeedService>,
    path: web::Path<String>,
    query: PageQuery,
) -> Result<HttpResponse, DomainError> {
    let username = path.into_inner();
    let result = feed
        .author_feed(&username, &viewer, query.page.as_deref())
        .await;
    page_or_index(&req, result)
}

#[get("/follow")]
async fn follow_index(
    req: HttpRequest,
    user: AuthenticatedUser,
    feed: web::Data<FeedService>,
    query: PageQuery,
) -> Result<HttpResponse, DomainError> {
    let username = user.username.clone();
    let page = feed
        .followed_feed(&Viewer::from(user), query.page.as_deref())
        .await?;

    info!(
        request_id = %request_id(&req),
        username = %username,
        page = page.number,
        "followed feed retrieved"
    );

    Ok(HttpResponse::Ok().json(page))
}
