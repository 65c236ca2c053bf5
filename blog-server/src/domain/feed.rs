use serde::Serialize;
use uuid::Uuid;

use crate::domain::comment::Comment;
use crate::domain::group::Group;
use crate::domain::pagination::Page;
use crate::domain::post::Post;
use crate::domain::user::Author;

/// Which posts a feed query selects. Every scope shares the same
/// `(created_at DESC, id DESC)` ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    All,
    Group(i64),
    Author(Uuid),
    FollowedBy(Uuid),
}

#[derive(Debug, Serialize)]
pub struct GroupFeed {
    pub group: Group,
    pub posts_count: usize,
    pub page: Page<Post>,
}

#[derive(Debug, Serialize)]
pub struct AuthorFeed {
    pub author: Author,
    pub posts_count: usize,
    pub following: bool,
    pub page: Page<Post>,
}

#[derive(Debug, Serialize)]
pub struct PostDetail {
    pub post: Post,
    pub author_posts_count: usize,
    pub comments: Vec<Comment>,
}
