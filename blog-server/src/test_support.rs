//! Fixtures shared by service and handler tests.

use std::sync::Arc;

use chrono::Duration;

use crate::application::Services;
use crate::data::Repositories;
use crate::domain::group::{Group, NewGroup};
use crate::domain::post::{Post, PostForm};
use crate::domain::viewer::AuthenticatedUser;
use crate::infrastructure::clock::ManualClock;
use crate::infrastructure::security::JwtKeys;

pub const FEED_CACHE_TTL_SECS: i64 = 20;

pub struct TestApp {
    pub repos: Repositories,
    pub clock: Arc<ManualClock>,
    pub services: Services,
}

impl TestApp {
    pub fn new() -> Self {
        let repos = Repositories::in_memory();
        let clock = Arc::new(ManualClock::new());
        let services = Services::new(
            repos.clone(),
            JwtKeys::new("test-secret".into()),
            clock.clone(),
            Duration::seconds(FEED_CACHE_TTL_SECS),
        );
        Self {
            repos,
            clock,
            services,
        }
    }

    pub async fn user(&self, username: &str) -> AuthenticatedUser {
        let user = self
            .services
            .auth
            .register(username, &format!("{username}@example.com"), "password")
            .await
            .expect("register user");
        AuthenticatedUser {
            id: user.id,
            username: user.username,
        }
    }

    pub fn token(&self, user: &AuthenticatedUser) -> String {
        self.services
            .auth
            .keys()
            .generate_token(user.id)
            .expect("sign token")
    }

    pub async fn group(&self, slug: &str) -> Group {
        self.services
            .group
            .create(NewGroup {
                title: format!("Group {slug}"),
                slug: slug.to_string(),
                description: String::new(),
            })
            .await
            .expect("create group")
    }

    /// Creates a post one second after the previous one.
    pub async fn post(&self, author: &AuthenticatedUser, text: &str, group: Option<&Group>) -> Post {
        self.clock.advance(Duration::seconds(1));
        self.services
            .post
            .create_post(
                author,
                PostForm {
                    text: text.to_string(),
                    group_id: group.map(|g| g.id),
                    image: None,
                },
            )
            .await
            .expect("create post")
    }
}
