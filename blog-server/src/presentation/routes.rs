use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::Services;
use crate::presentation::handlers;
use crate::presentation::middleware::ViewerMiddleware;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}

pub fn configure(cfg: &mut web::ServiceConfig, services: &Services) {
    cfg.app_data(web::Data::new(services.auth.clone()))
        .app_data(web::Data::new(services.feed.clone()))
        .app_data(web::Data::new(services.follow.clone()))
        .app_data(web::Data::new(services.post.clone()))
        .app_data(web::Data::new(services.group.clone()))
        .app_data(web::Data::from(Arc::clone(&services.page_cache)))
        .service(
            web::scope("/api")
                .wrap(ViewerMiddleware)
                .route("/health", web::get().to(health))
                .service(handlers::auth::scope())
                .service(handlers::feed::index)
                .service(handlers::feed::group_posts)
                .service(handlers::feed::profile)
                .service(handlers::feed::follow_index)
                .service(handlers::post::post_detail)
                .service(handlers::post::create_post)
                .service(handlers::post::update_post)
                .service(handlers::post::delete_post)
                .service(handlers::post::add_comment)
                .service(handlers::follow::profile_follow)
                .service(handlers::follow::profile_unfollow)
                .service(handlers::group::list_groups),
        );
}

#[cfg(test)]
mod tests {
    use actix_web::dev::ServiceResponse;
    use actix_web::http::{StatusCode, header};
    use actix_web::{App, test};
    use chrono::Duration;
    use serde_json::{Value, json};

    use super::*;
    use crate::domain::feed::FeedScope;
    use crate::domain::viewer::AuthenticatedUser;
    use crate::test_support::{FEED_CACHE_TTL_SECS, TestApp};

    fn bearer(ctx: &TestApp, user: &AuthenticatedUser) -> (header::HeaderName, String) {
        (header::AUTHORIZATION, format!("Bearer {}", ctx.token(user)))
    }

    fn location(resp: &ServiceResponse) -> &str {
        resp.headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    #[actix_web::test]
    async fn register_login_and_health() {
        let ctx = TestApp::new();
        let app =
            test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.services))).await;

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({"username": "leo", "email": "leo@example.com", "password": "pw"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"username": "leo", "password": "pw"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["token_type"], "Bearer");

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn anonymous_create_redirects_to_login_and_stores_nothing() {
        let ctx = TestApp::new();
        let app =
            test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.services))).await;

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .set_json(json!({"text": "sneaky"}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/api/auth/login?next=/api/posts");
        assert_eq!(ctx.repos.posts.count(FeedScope::All).await.unwrap(), 0);
    }

    #[actix_web::test]
    async fn invalid_token_is_treated_as_anonymous() {
        let ctx = TestApp::new();
        let app =
            test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.services))).await;

        let req = test::TestRequest::get()
            .uri("/api/follow")
            .insert_header((header::AUTHORIZATION, "Bearer not-a-jwt"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert!(location(&resp).starts_with("/api/auth/login"));
    }

    #[actix_web::test]
    async fn create_post_then_validation_error() {
        let ctx = TestApp::new();
        let leo = ctx.user("leo").await;
        let app =
            test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.services))).await;

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(bearer(&ctx, &leo))
            .set_json(json!({"text": "hello world"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(location(&resp), "/api/profile/leo");

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(bearer(&ctx, &leo))
            .set_json(json!({"text": ""}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["details"]["field"], "text");

        assert_eq!(ctx.repos.posts.count(FeedScope::All).await.unwrap(), 1);
    }

    #[actix_web::test]
    async fn non_author_edit_redirects_to_detail() {
        let ctx = TestApp::new();
        let leo = ctx.user("leo").await;
        let intruder = ctx.user("intruder").await;
        let post = ctx.post(&leo, "original", None).await;
        let app =
            test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.services))).await;
        let uri = format!("/api/posts/{}", post.id);

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(&ctx, &intruder))
            .set_json(json!({"text": "hijacked"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), uri);
        let unchanged = ctx.services.post.get_post(post.id).await.unwrap();
        assert_eq!(unchanged.text, "original");

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(&ctx, &leo))
            .set_json(json!({"text": "edited"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["text"], "edited");
    }

    #[actix_web::test]
    async fn missing_pages_redirect_to_index() {
        let ctx = TestApp::new();
        let app =
            test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.services))).await;

        for uri in ["/api/group/nope", "/api/profile/nobody", "/api/posts/42"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::FOUND, "uri = {uri}");
            assert_eq!(location(&resp), "/api/posts");
        }
    }

    #[actix_web::test]
    async fn detail_group_and_profile_pages_render() {
        let ctx = TestApp::new();
        let leo = ctx.user("leo").await;
        let cats = ctx.group("cats").await;
        let post = ctx.post(&leo, "meow", Some(&cats)).await;
        ctx.services
            .post
            .add_comment(&leo, post.id, "purr".into())
            .await
            .unwrap();
        let app =
            test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.services))).await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/posts/{}", post.id))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["comments"][0]["text"], "purr");
        assert_eq!(body["author_posts_count"], 1);

        let req = test::TestRequest::get().uri("/api/group/cats").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["posts_count"], 1);
        assert_eq!(body["group"]["slug"], "cats");

        let req = test::TestRequest::get()
            .uri("/api/profile/leo?page=7")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["following"], false);
        assert_eq!(body["page"]["number"], 1);

        let req = test::TestRequest::get().uri("/api/groups").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["slug"], "cats");
    }

    #[actix_web::test]
    async fn follow_flow_over_http() {
        let ctx = TestApp::new();
        let reader = ctx.user("reader").await;
        let author = ctx.user("author").await;
        let post = ctx.post(&author, "news", None).await;
        let app =
            test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.services))).await;

        for expected in ["created", "already_following"] {
            let req = test::TestRequest::post()
                .uri("/api/profile/author/follow")
                .insert_header(bearer(&ctx, &reader))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["outcome"], expected);
        }

        let req = test::TestRequest::post()
            .uri("/api/profile/reader/follow")
            .insert_header(bearer(&ctx, &reader))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["outcome"], "self_follow_rejected");

        let req = test::TestRequest::get()
            .uri("/api/follow")
            .insert_header(bearer(&ctx, &reader))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["items"][0]["id"], post.id);

        let req = test::TestRequest::get()
            .uri("/api/profile/author")
            .insert_header(bearer(&ctx, &reader))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["following"], true);

        for expected in [StatusCode::NO_CONTENT, StatusCode::NOT_FOUND] {
            let req = test::TestRequest::post()
                .uri("/api/profile/author/unfollow")
                .insert_header(bearer(&ctx, &reader))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), expected);
        }
    }

    #[actix_web::test]
    async fn index_is_cached_until_ttl_or_clear() {
        let ctx = TestApp::new();
        let leo = ctx.user("leo").await;
        ctx.post(&leo, "first", None).await;
        let app =
            test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.services))).await;

        let req = || test::TestRequest::get().uri("/api/posts").to_request();

        let body: Value = test::call_and_read_body_json(&app, req()).await;
        assert_eq!(body["total"], 1);

        ctx.post(&leo, "second", None).await;
        let body: Value = test::call_and_read_body_json(&app, req()).await;
        assert_eq!(body["total"], 1, "stale page is served inside the window");

        ctx.clock.advance(Duration::seconds(FEED_CACHE_TTL_SECS));
        let body: Value = test::call_and_read_body_json(&app, req()).await;
        assert_eq!(body["total"], 2);

        ctx.post(&leo, "third", None).await;
        ctx.services.page_cache.clear().await;
        let body: Value = test::call_and_read_body_json(&app, req()).await;
        assert_eq!(body["total"], 3);
    }

    #[actix_web::test]
    async fn index_paginates_thirteen_posts() {
        let ctx = TestApp::new();
        let leo = ctx.user("leo").await;
        for i in 0..13 {
            ctx.post(&leo, &format!("text {i}"), None).await;
        }
        let app =
            test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.services))).await;

        let page = |uri: &str| test::TestRequest::get().uri(uri).to_request();
        let first: Value = test::call_and_read_body_json(&app, page("/api/posts")).await;
        let second: Value = test::call_and_read_body_json(&app, page("/api/posts?page=2")).await;
        let third: Value = test::call_and_read_body_json(&app, page("/api/posts?page=3")).await;

        assert_eq!(first["items"].as_array().map(Vec::len), Some(10));
        assert_eq!(second["items"].as_array().map(Vec::len), Some(3));
        assert_eq!(third["items"], second["items"]);
        assert_eq!(third["number"], 2);

        let repeated: Value =
            test::call_and_read_body_json(&app, page("/api/posts?page=1&page=2")).await;
        assert_eq!(repeated["number"], 2);
        assert_eq!(repeated["items"], second["items"]);
    }
}
