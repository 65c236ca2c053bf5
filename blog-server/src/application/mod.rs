use std::sync::Arc;

use chrono::Duration;

use crate::data::Repositories;
use crate::infrastructure::clock::Clock;
use crate::infrastructure::page_cache::{DEFAULT_CAPACITY, PageCache};
use crate::infrastructure::security::JwtKeys;

pub mod auth_service;
pub mod feed_service;
pub mod follow_service;
pub mod group_service;
pub mod post_service;

use auth_service::AuthService;
use feed_service::FeedService;
use follow_service::FollowService;
use group_service::GroupService;
use post_service::PostService;

/// Everything the HTTP layer and the admin commands call into.
#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub feed: FeedService,
    pub follow: FollowService,
    pub post: PostService,
    pub group: GroupService,
    pub page_cache: Arc<PageCache>,
}

impl Services {
    pub fn new(
        repos: Repositories,
        keys: JwtKeys,
        clock: Arc<dyn Clock>,
        feed_cache_ttl: Duration,
    ) -> Self {
        Self {
            auth: AuthService::new(Arc::clone(&repos.users), keys),
            feed: FeedService::new(
                Arc::clone(&repos.posts),
                Arc::clone(&repos.groups),
                Arc::clone(&repos.users),
                Arc::clone(&repos.follows),
            ),
            follow: FollowService::new(Arc::clone(&repos.users), Arc::clone(&repos.follows)),
            post: PostService::new(
                Arc::clone(&repos.posts),
                Arc::clone(&repos.groups),
                Arc::clone(&repos.comments),
                Arc::clone(&clock),
            ),
            group: GroupService::new(Arc::clone(&repos.groups)),
            page_cache: Arc::new(PageCache::new(feed_cache_ttl, DEFAULT_CAPACITY, clock)),
        }
    }
}
