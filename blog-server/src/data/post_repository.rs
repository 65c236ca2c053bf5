use crate::domain::error::DomainError;
use crate::domain::feed::FeedScope;
use crate::domain::post::{NewPost, Post, PostChanges};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{error, info};

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: NewPost) -> Result<Post, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, DomainError>;
    async fn update(&self, id: i64, changes: PostChanges) -> Result<Option<Post>, DomainError>;
    async fn delete(&self, id: i64) -> Result<bool, DomainError>;
    /// Posts in `scope`, newest first with higher ids winning timestamp ties.
    async fn list(
        &self,
        scope: FeedScope,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Post>, DomainError>;
    async fn count(&self, scope: FeedScope) -> Result<usize, DomainError>;
}

const SELECT_POSTS: &str = r#"
    SELECT p.id, p.text, p.created_at, p.author_id, u.username AS author_username,
           p.group_id, p.image
    FROM posts p
    JOIN users u ON u.id = p.author_id
"#;

fn push_scope(qb: &mut QueryBuilder<'_, Postgres>, scope: FeedScope) {
    match scope {
        FeedScope::All => {}
        FeedScope::Group(group_id) => {
            qb.push(" WHERE p.group_id = ").push_bind(group_id);
        }
        FeedScope::Author(author_id) => {
            qb.push(" WHERE p.author_id = ").push_bind(author_id);
        }
        FeedScope::FollowedBy(follower_id) => {
            qb.push(" WHERE p.author_id IN (SELECT f.author_id FROM follows f WHERE f.follower_id = ")
                .push_bind(follower_id)
                .push(")");
        }
    }
}

#[derive(Clone)]
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, post: NewPost) -> Result<Post, DomainError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO posts (text, created_at, author_id, group_id, image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&post.text)
        .bind(post.created_at)
        .bind(post.author_id)
        .bind(post.group_id)
        .bind(&post.image)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create post: {}", e);
            DomainError::Internal(format!("database error: {}", e))
        })?;

        info!(post_id = id, author_id = %post.author_id, "post created");
        self.find_by_id(id)
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_POSTS);
        qb.push(" WHERE p.id = ").push_bind(id);
        qb.build_query_as::<Post>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("db error find_by_id {}: {}", id, e);
                DomainError::Internal(e.to_string())
            })
    }

    async fn update(&self, id: i64, changes: PostChanges) -> Result<Option<Post>, DomainError> {
        let updated = sqlx::query(
            r#"
            UPDATE posts
            SET
                text = $1,
                group_id = $2,
                image = COALESCE($3, image)
            WHERE id = $4
            "#,
        )
        .bind(&changes.text)
        .bind(changes.group_id)
        .bind(&changes.image)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to update post {}: {}", id, e);
            DomainError::Internal(e.to_string())
        })?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        info!(post_id = id, "post updated");
        self.find_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        if deleted.rows_affected() > 0 {
            info!(post_id = id, "post deleted");
        }
        Ok(deleted.rows_affected() > 0)
    }

    async fn list(
        &self,
        scope: FeedScope,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Post>, DomainError> {
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_POSTS);
        push_scope(&mut qb, scope);
        qb.push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset as i64);

        qb.build_query_as::<Post>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(?scope, "db error while fetching posts: {}", e);
                DomainError::Internal(e.to_string())
            })
    }

    async fn count(&self, scope: FeedScope) -> Result<usize, DomainError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts p");
        push_scope(&mut qb, scope);
        let count: i64 = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!(?scope, "db error while counting posts: {}", e);
                DomainError::Internal(e.to_string())
            })?;
        Ok(count as usize)
    }
}
