//! In-process storage backend with the same constraint and cascade rules as
//! the PostgreSQL schema. Selected with `DATABASE_URL=memory`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::data::comment_repository::CommentRepository;
use crate::data::follow_repository::FollowRepository;
use crate::data::group_repository::GroupRepository;
use crate::data::post_repository::PostRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::comment::{Comment, NewComment};
use crate::domain::error::DomainError;
use crate::domain::feed::FeedScope;
use crate::domain::follow::Follow;
use crate::domain::group::{Group, NewGroup};
use crate::domain::post::{NewPost, Post, PostChanges};
use crate::domain::user::User;

#[derive(Debug, Clone)]
struct PostRow {
    id: i64,
    text: String,
    created_at: DateTime<Utc>,
    author_id: Uuid,
    group_id: Option<i64>,
    image: Option<String>,
}

#[derive(Debug, Clone)]
struct CommentRow {
    id: i64,
    post_id: i64,
    author_id: Uuid,
    text: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<Uuid, User>,
    groups: BTreeMap<i64, Group>,
    posts: BTreeMap<i64, PostRow>,
    comments: BTreeMap<i64, CommentRow>,
    follows: BTreeMap<i64, Follow>,
    last_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn username(&self, id: Uuid) -> Result<String, DomainError> {
        self.users
            .get(&id)
            .map(|u| u.username.clone())
            .ok_or_else(|| DomainError::Internal(format!("dangling user reference {}", id)))
    }

    fn post(&self, row: &PostRow) -> Result<Post, DomainError> {
        Ok(Post {
            id: row.id,
            text: row.text.clone(),
            created_at: row.created_at,
            author_id: row.author_id,
            author_username: self.username(row.author_id)?,
            group_id: row.group_id,
            image: row.image.clone(),
        })
    }

    fn comment(&self, row: &CommentRow) -> Result<Comment, DomainError> {
        Ok(Comment {
            id: row.id,
            post_id: row.post_id,
            author_id: row.author_id,
            author_username: self.username(row.author_id)?,
            text: row.text.clone(),
            created_at: row.created_at,
        })
    }

    fn in_scope(&self, row: &PostRow, scope: FeedScope) -> bool {
        match scope {
            FeedScope::All => true,
            FeedScope::Group(group_id) => row.group_id == Some(group_id),
            FeedScope::Author(author_id) => row.author_id == author_id,
            FeedScope::FollowedBy(follower_id) => self
                .follows
                .values()
                .any(|f| f.follower_id == follower_id && f.author_id == row.author_id),
        }
    }

    fn scoped(&self, scope: FeedScope) -> Vec<&PostRow> {
        let mut rows: Vec<&PostRow> = self
            .posts
            .values()
            .filter(|row| self.in_scope(row, scope))
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        rows
    }

    fn delete_post_cascade(&mut self, post_id: i64) -> bool {
        if self.posts.remove(&post_id).is_none() {
            return false;
        }
        self.comments.retain(|_, c| c.post_id != post_id);
        true
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(DomainError::UserAlreadyExists(
                "email already registered".to_string(),
            ));
        }
        if state.users.values().any(|u| u.username == user.username) {
            return Err(DomainError::UserAlreadyExists(user.username));
        }
        state.users.insert(user.id, user.clone());
        info!(user_id = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut state = self.state.write().await;
        if state.users.remove(&id).is_none() {
            return Ok(false);
        }
        let owned: Vec<i64> = state
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in owned {
            state.delete_post_cascade(post_id);
        }
        state.comments.retain(|_, c| c.author_id != id);
        state
            .follows
            .retain(|_, f| f.follower_id != id && f.author_id != id);
        info!(user_id = %id, "user deleted");
        Ok(true)
    }
}

#[async_trait]
impl GroupRepository for MemoryStore {
    async fn create(&self, group: NewGroup) -> Result<Group, DomainError> {
        let mut state = self.state.write().await;
        if state.groups.values().any(|g| g.slug == group.slug) {
            return Err(DomainError::Conflict(format!(
                "group slug already taken: {}",
                group.slug
            )));
        }
        let created = Group {
            id: state.next_id(),
            title: group.title,
            slug: group.slug,
            description: group.description,
        };
        state.groups.insert(created.id, created.clone());
        info!(group_id = created.id, slug = %created.slug, "group created");
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Group>, DomainError> {
        Ok(self.state.read().await.groups.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, DomainError> {
        let state = self.state.read().await;
        Ok(state.groups.values().find(|g| g.slug == slug).cloned())
    }

    async fn list(&self) -> Result<Vec<Group>, DomainError> {
        let state = self.state.read().await;
        let mut groups: Vec<Group> = state.groups.values().cloned().collect();
        groups.sort_by(|a, b| (&a.title, a.id).cmp(&(&b.title, b.id)));
        Ok(groups)
    }

    async fn delete(&self, id: i64) -> Result<bool, DomainError> {
        let mut state = self.state.write().await;
        if state.groups.remove(&id).is_none() {
            return Ok(false);
        }
        for post in state.posts.values_mut() {
            if post.group_id == Some(id) {
                post.group_id = None;
            }
        }
        info!(group_id = id, "group deleted");
        Ok(true)
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create(&self, post: NewPost) -> Result<Post, DomainError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&post.author_id) {
            return Err(DomainError::Internal(format!(
                "unknown author {}",
                post.author_id
            )));
        }
        if let Some(group_id) = post.group_id {
            if !state.groups.contains_key(&group_id) {
                return Err(DomainError::Internal(format!("unknown group {}", group_id)));
            }
        }
        let row = PostRow {
            id: state.next_id(),
            text: post.text,
            created_at: post.created_at,
            author_id: post.author_id,
            group_id: post.group_id,
            image: post.image,
        };
        state.posts.insert(row.id, row.clone());
        info!(post_id = row.id, author_id = %row.author_id, "post created");
        state.post(&row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let state = self.state.read().await;
        state.posts.get(&id).map(|row| state.post(row)).transpose()
    }

    async fn update(&self, id: i64, changes: PostChanges) -> Result<Option<Post>, DomainError> {
        let mut state = self.state.write().await;
        let Some(row) = state.posts.get_mut(&id) else {
            return Ok(None);
        };
        row.text = changes.text;
        row.group_id = changes.group_id;
        if let Some(image) = changes.image {
            row.image = Some(image);
        }
        let row = row.clone();
        info!(post_id = id, "post updated");
        state.post(&row).map(Some)
    }

    async fn delete(&self, id: i64) -> Result<bool, DomainError> {
        let deleted = self.state.write().await.delete_post_cascade(id);
        if deleted {
            info!(post_id = id, "post deleted");
        }
        Ok(deleted)
    }

    async fn list(
        &self,
        scope: FeedScope,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Post>, DomainError> {
        let state = self.state.read().await;
        state
            .scoped(scope)
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| state.post(row))
            .collect()
    }

    async fn count(&self, scope: FeedScope) -> Result<usize, DomainError> {
        Ok(self.state.read().await.scoped(scope).len())
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create(&self, comment: NewComment) -> Result<Comment, DomainError> {
        let mut state = self.state.write().await;
        if !state.posts.contains_key(&comment.post_id) {
            return Err(DomainError::PostNotFound(comment.post_id));
        }
        let row = CommentRow {
            id: state.next_id(),
            post_id: comment.post_id,
            author_id: comment.author_id,
            text: comment.text,
            created_at: comment.created_at,
        };
        state.comments.insert(row.id, row.clone());
        info!(comment_id = row.id, post_id = row.post_id, author_id = %row.author_id, "comment created");
        state.comment(&row)
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, DomainError> {
        let state = self.state.read().await;
        let mut rows: Vec<&CommentRow> = state
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        rows.into_iter().map(|row| state.comment(row)).collect()
    }
}

#[async_trait]
impl FollowRepository for MemoryStore {
    async fn create(&self, follower_id: Uuid, author_id: Uuid) -> Result<Follow, DomainError> {
        let mut state = self.state.write().await;
        if state
            .follows
            .values()
            .any(|f| f.follower_id == follower_id && f.author_id == author_id)
        {
            return Err(DomainError::Conflict(
                "follows_follower_author_key".to_string(),
            ));
        }
        let follow = Follow {
            id: state.next_id(),
            follower_id,
            author_id,
        };
        state.follows.insert(follow.id, follow.clone());
        info!(follower_id = %follower_id, author_id = %author_id, "follow created");
        Ok(follow)
    }

    async fn exists(&self, follower_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .follows
            .values()
            .any(|f| f.follower_id == follower_id && f.author_id == author_id))
    }

    async fn delete(&self, follower_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        let mut state = self.state.write().await;
        let before = state.follows.len();
        state
            .follows
            .retain(|_, f| !(f.follower_id == follower_id && f.author_id == author_id));
        let deleted = state.follows.len() < before;
        if deleted {
            info!(follower_id = %follower_id, author_id = %author_id, "follow deleted");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    async fn seed_user(store: &MemoryStore, username: &str) -> User {
        UserRepository::create(
            store,
            User::new(
                username.to_string(),
                format!("{username}@example.com"),
                "hash".into(),
            ),
        )
        .await
        .unwrap()
    }

    fn new_post(author_id: Uuid, text: &str, group_id: Option<i64>, secs: i64) -> NewPost {
        NewPost {
            author_id,
            text: text.to_string(),
            group_id,
            image: None,
            created_at: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn equal_timestamps_order_by_id_desc() {
        let store = MemoryStore::default();
        let author = seed_user(&store, "leo").await;
        let first = PostRepository::create(&store, new_post(author.id, "a", None, 0))
            .await
            .unwrap();
        let second = PostRepository::create(&store, new_post(author.id, "b", None, 0))
            .await
            .unwrap();
        let older = PostRepository::create(&store, new_post(author.id, "c", None, -10))
            .await
            .unwrap();

        let ids: Vec<i64> = PostRepository::list(&store, FeedScope::All, 10, 0)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id, older.id]);
    }

    #[tokio::test]
    async fn duplicate_follow_is_a_conflict() {
        let store = MemoryStore::default();
        let reader = seed_user(&store, "reader").await;
        let author = seed_user(&store, "author").await;

        FollowRepository::create(&store, reader.id, author.id)
            .await
            .unwrap();
        let err = FollowRepository::create(&store, reader.id, author.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn deleting_group_clears_reference_and_keeps_posts() {
        let store = MemoryStore::default();
        let author = seed_user(&store, "leo").await;
        let group = GroupRepository::create(
            &store,
            NewGroup {
                title: "Cats".into(),
                slug: "cats".into(),
                description: String::new(),
            },
        )
        .await
        .unwrap();
        let post = PostRepository::create(&store, new_post(author.id, "meow", Some(group.id), 0))
            .await
            .unwrap();

        assert!(GroupRepository::delete(&store, group.id).await.unwrap());

        let kept = PostRepository::find_by_id(&store, post.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kept.group_id, None);
        assert_eq!(store.count(FeedScope::Group(group.id)).await.unwrap(), 0);
        assert_eq!(store.count(FeedScope::All).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn deleting_user_cascades_posts_comments_and_follows() {
        let store = MemoryStore::default();
        let author = seed_user(&store, "author").await;
        let reader = seed_user(&store, "reader").await;
        let post = PostRepository::create(&store, new_post(author.id, "hi", None, 0))
            .await
            .unwrap();
        let reader_post = PostRepository::create(&store, new_post(reader.id, "yo", None, 1))
            .await
            .unwrap();
        CommentRepository::create(
            &store,
            NewComment {
                post_id: reader_post.id,
                author_id: author.id,
                text: "nice".into(),
                created_at: Utc::now(),
            },
        )
        .await
        .unwrap();
        FollowRepository::create(&store, reader.id, author.id)
            .await
            .unwrap();

        assert!(UserRepository::delete(&store, author.id).await.unwrap());

        assert!(PostRepository::find_by_id(&store, post.id).await.unwrap().is_none());
        assert!(store.list_for_post(reader_post.id).await.unwrap().is_empty());
        assert!(!store.exists(reader.id, author.id).await.unwrap());
        assert_eq!(store.count(FeedScope::All).await.unwrap(), 1);
    }
}
