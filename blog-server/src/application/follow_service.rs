use std::sync::Arc;

use tracing::{debug, instrument};

use crate::data::follow_repository::FollowRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::follow::FollowOutcome;
use crate::domain::user::User;
use crate::domain::viewer::AuthenticatedUser;

#[derive(Clone)]
pub struct FollowService {
    users: Arc<dyn UserRepository>,
    follows: Arc<dyn FollowRepository>,
}

impl FollowService {
    pub fn new(users: Arc<dyn UserRepository>, follows: Arc<dyn FollowRepository>) -> Self {
        Self { users, follows }
    }

    async fn author(&self, username: &str) -> Result<User, DomainError> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(username.to_string()))
    }

    /// Never creates a second edge for the same pair. A losing concurrent
    /// insert surfaces as `Conflict` from storage and reads as already following.
    #[instrument(skip(self, viewer), fields(follower_id = %viewer.id))]
    pub async fn follow(
        &self,
        viewer: &AuthenticatedUser,
        username: &str,
    ) -> Result<FollowOutcome, DomainError> {
        let author = self.author(username).await?;
        if author.id == viewer.id {
            return Ok(FollowOutcome::SelfFollowRejected);
        }
        if self.follows.exists(viewer.id, author.id).await? {
            return Ok(FollowOutcome::AlreadyFollowing);
        }
        match self.follows.create(viewer.id, author.id).await {
            Ok(_) => Ok(FollowOutcome::Created),
            Err(DomainError::Conflict(constraint)) => {
                debug!(%constraint, author_id = %author.id, "lost follow insert race");
                Ok(FollowOutcome::AlreadyFollowing)
            }
            Err(err) => Err(err),
        }
    }

    #[instrument(skip(self, viewer), fields(follower_id = %viewer.id))]
    pub async fn unfollow(&self, viewer: &AuthenticatedUser, username: &str) -> Result<(), DomainError> {
        let author = self.author(username).await?;
        if !self.follows.delete(viewer.id, author.id).await? {
            return Err(DomainError::FollowNotFound(username.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use uuid::Uuid;

    use super::*;
    use crate::domain::follow::Follow;
    use crate::domain::viewer::Viewer;
    use crate::test_support::TestApp;

    #[tokio::test]
    async fn following_twice_keeps_one_edge() {
        let app = TestApp::new();
        let reader = app.user("reader").await;
        let author = app.user("author").await;

        let first = app.services.follow.follow(&reader, "author").await.unwrap();
        let second = app.services.follow.follow(&reader, "author").await.unwrap();
        assert_eq!(first, FollowOutcome::Created);
        assert_eq!(second, FollowOutcome::AlreadyFollowing);

        assert!(app.repos.follows.exists(reader.id, author.id).await.unwrap());
        app.services.follow.unfollow(&reader, "author").await.unwrap();
        assert!(!app.repos.follows.exists(reader.id, author.id).await.unwrap());
    }

    #[tokio::test]
    async fn self_follow_is_rejected_without_an_edge() {
        let app = TestApp::new();
        let leo = app.user("leo").await;

        let outcome = app.services.follow.follow(&leo, "leo").await.unwrap();
        assert_eq!(outcome, FollowOutcome::SelfFollowRejected);
        assert!(!app.repos.follows.exists(leo.id, leo.id).await.unwrap());
    }

    #[tokio::test]
    async fn unfollow_without_edge_is_not_found() {
        let app = TestApp::new();
        let reader = app.user("reader").await;
        app.user("author").await;

        let err = app
            .services
            .follow
            .unfollow(&reader, "author")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::FollowNotFound(name) if name == "author"));
    }

    #[tokio::test]
    async fn unknown_author_is_not_found() {
        let app = TestApp::new();
        let reader = app.user("reader").await;
        let err = app.services.follow.follow(&reader, "ghost").await.unwrap_err();
        assert!(matches!(err, DomainError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn unfollow_only_touches_the_viewers_edge() {
        let app = TestApp::new();
        let reader = app.user("reader").await;
        let other = app.user("other").await;
        let author = app.user("author").await;
        app.services.follow.follow(&reader, "author").await.unwrap();
        app.services.follow.follow(&other, "author").await.unwrap();

        app.services.follow.unfollow(&reader, "author").await.unwrap();

        assert!(app.repos.follows.exists(other.id, author.id).await.unwrap());
        let feed = app
            .services
            .feed
            .author_feed("author", &Viewer::from(other), None)
            .await
            .unwrap();
        assert!(feed.following);
    }

    /// Pretends the pre-check always misses, as when two requests race.
    struct RacingFollows(Arc<dyn FollowRepository>);

    #[async_trait]
    impl FollowRepository for RacingFollows {
        async fn create(&self, follower_id: Uuid, author_id: Uuid) -> Result<Follow, DomainError> {
            self.0.create(follower_id, author_id).await
        }

        async fn exists(&self, _: Uuid, _: Uuid) -> Result<bool, DomainError> {
            Ok(false)
        }

        async fn delete(&self, follower_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
            self.0.delete(follower_id, author_id).await
        }
    }

    #[tokio::test]
    async fn losing_insert_race_reads_as_already_following() {
        let app = TestApp::new();
        let reader = app.user("reader").await;
        let author = app.user("author").await;
        let racing = FollowService::new(
            Arc::clone(&app.repos.users),
            Arc::new(RacingFollows(Arc::clone(&app.repos.follows))),
        );

        assert_eq!(
            racing.follow(&reader, "author").await.unwrap(),
            FollowOutcome::Created
        );
        assert_eq!(
            racing.follow(&reader, "author").await.unwrap(),
            FollowOutcome::AlreadyFollowing
        );
        assert!(racing.unfollow(&reader, "author").await.is_ok());
        assert!(!app.repos.follows.exists(reader.id, author.id).await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_follows_create_one_edge() {
        let app = TestApp::new();
        let reader = app.user("reader").await;
        let author = app.user("author").await;

        let service = app.services.follow.clone();
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                let reader = reader.clone();
                tokio::spawn(async move { service.follow(&reader, "author").await })
            })
            .collect();

        let mut created = 0;
        for task in tasks {
            if task.await.unwrap().unwrap() == FollowOutcome::Created {
                created += 1;
            }
        }
        assert_eq!(created, 1);

        app.services.follow.unfollow(&reader, "author").await.unwrap();
        let err = app
            .services
            .follow
            .unfollow(&reader, "author")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(!app.repos.follows.exists(reader.id, author.id).await.unwrap());
    }
}
