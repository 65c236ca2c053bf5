use std::sync::Arc;

use tracing::debug;

use crate::data::follow_repository::FollowRepository;
use crate::data::group_repository::GroupRepository;
use crate::data::post_repository::PostRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::feed::{AuthorFeed, FeedScope, GroupFeed};
use crate::domain::pagination::{Page, Paginator};
use crate::domain::post::Post;
use crate::domain::user::Author;
use crate::domain::viewer::Viewer;

/// Resolves the four post timelines. Every scope is counted, clamped to a
/// valid page and then loaded in `(created_at DESC, id DESC)` order.
#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostRepository>,
    groups: Arc<dyn GroupRepository>,
    users: Arc<dyn UserRepository>,
    follows: Arc<dyn FollowRepository>,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        groups: Arc<dyn GroupRepository>,
        users: Arc<dyn UserRepository>,
        follows: Arc<dyn FollowRepository>,
    ) -> Self {
        Self {
            posts,
            groups,
            users,
            follows,
        }
    }

    async fn resolve(&self, scope: FeedScope, page: Option<&str>) -> Result<Page<Post>, DomainError> {
        let paginator = Paginator::new(self.posts.count(scope).await?);
        let window = paginator.window(page);
        let items = self.posts.list(scope, window.limit, window.offset).await?;
        debug!(?scope, page = window.number, items = items.len(), "feed resolved");
        Ok(Page::new(items, window, &paginator))
    }

    pub async fn global_feed(&self, page: Option<&str>) -> Result<Page<Post>, DomainError> {
        self.resolve(FeedScope::All, page).await
    }

    pub async fn group_feed(&self, slug: &str, page: Option<&str>) -> Result<GroupFeed, DomainError> {
        let group = self
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::GroupNotFound(slug.to_string()))?;
        let page = self.resolve(FeedScope::Group(group.id), page).await?;
        Ok(GroupFeed {
            group,
            posts_count: page.total,
            page,
        })
    }

    pub async fn author_feed(
        &self,
        username: &str,
        viewer: &Viewer,
        page: Option<&str>,
    ) -> Result<AuthorFeed, DomainError> {
        let author = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(username.to_string()))?;
        let following = match viewer.id() {
            Some(viewer_id) => self.follows.exists(viewer_id, author.id).await?,
            None => false,
        };
        let page = self.resolve(FeedScope::Author(author.id), page).await?;
        Ok(AuthorFeed {
            author: Author::from(&author),
            posts_count: page.total,
            following,
            page,
        })
    }

    pub async fn followed_feed(
        &self,
        viewer: &Viewer,
        page: Option<&str>,
    ) -> Result<Page<Post>, DomainError> {
        let viewer_id = viewer.id().ok_or(DomainError::Unauthorized)?;
        self.resolve(FeedScope::FollowedBy(viewer_id), page).await
    }
}
