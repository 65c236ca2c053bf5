use std::sync::Arc;

use tracing::instrument;

use crate::data::comment_repository::CommentRepository;
use crate::data::group_repository::GroupRepository;
use crate::data::post_repository::PostRepository;
use crate::domain::comment::{Comment, NewComment};
use crate::domain::error::DomainError;
use crate::domain::feed::{FeedScope, PostDetail};
use crate::domain::post::{NewPost, Post, PostChanges, PostForm, validate_text};
use crate::domain::viewer::AuthenticatedUser;
use crate::infrastructure::clock::Clock;

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    groups: Arc<dyn GroupRepository>,
    comments: Arc<dyn CommentRepository>,
    clock: Arc<dyn Clock>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        groups: Arc<dyn GroupRepository>,
        comments: Arc<dyn CommentRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            posts,
            groups,
            comments,
            clock,
        }
    }

    pub async fn get_post(&self, id: i64) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }

    pub async fn post_detail(&self, id: i64) -> Result<PostDetail, DomainError> {
        let post = self.get_post(id).await?;
        let author_posts_count = self.posts.count(FeedScope::Author(post.author_id)).await?;
        let comments = self.comments.list_for_post(id).await?;
        Ok(PostDetail {
            post,
            author_posts_count,
            comments,
        })
    }

    /// Checks a submitted form and normalises its optional fields.
    async fn clean(&self, form: PostForm) -> Result<PostForm, DomainError> {
        validate_text(&form.text)?;
        if let Some(group_id) = form.group_id {
            if self.groups.find_by_id(group_id).await?.is_none() {
                return Err(DomainError::validation(
                    "group",
                    format!("unknown group {}", group_id),
                ));
            }
        }
        let image = form.image.filter(|i| !i.trim().is_empty());
        Ok(PostForm { image, ..form })
    }

    #[instrument(skip(self, viewer, form), fields(author_id = %viewer.id))]
    pub async fn create_post(
        &self,
        viewer: &AuthenticatedUser,
        form: PostForm,
    ) -> Result<Post, DomainError> {
        let form = self.clean(form).await?;
        self.posts
            .create(NewPost {
                author_id: viewer.id,
                text: form.text,
                group_id: form.group_id,
                image: form.image,
                created_at: self.clock.now(),
            })
            .await
    }

    #[instrument(skip(self, viewer, form), fields(author_id = %viewer.id))]
    pub async fn edit_post(
        &self,
        viewer: &AuthenticatedUser,
        post_id: i64,
        form: PostForm,
    ) -> Result<Post, DomainError> {
        let post = self.get_post(post_id).await?;
        if post.author_id != viewer.id {
            return Err(DomainError::PermissionDenied);
        }
        let form = self.clean(form).await?;
        self.posts
            .update(
                post_id,
                PostChanges {
                    text: form.text,
                    group_id: form.group_id,
                    image: form.image,
                },
            )
            .await?
            .ok_or(DomainError::PostNotFound(post_id))
    }

    #[instrument(skip(self, viewer), fields(author_id = %viewer.id))]
    pub async fn delete_post(&self, viewer: &AuthenticatedUser, post_id: i64) -> Result<(), DomainError> {
        let post = self.get_post(post_id).await?;
        if post.author_id != viewer.id {
            return Err(DomainError::PermissionDenied);
        }
        if !self.posts.delete(post_id).await? {
            return Err(DomainError::PostNotFound(post_id));
        }
        Ok(())
    }

    #[instrument(skip(self, viewer, text), fields(author_id = %viewer.id))]
    pub async fn add_comment(
        &self,
        viewer: &AuthenticatedUser,
        post_id: i64,
        text: String,
    ) -> Result<Comment, DomainError> {
        self.get_post(post_id).await?;
        validate_text(&text)?;
        self.comments
            .create(NewComment {
                post_id,
                author_id: viewer.id,
                text,
                created_at: self.clock.now(),
            })
            .await
    }
}
