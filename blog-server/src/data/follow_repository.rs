use crate::data::violated_unique_constraint;
use crate::domain::error::DomainError;
use crate::domain::follow::Follow;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Fails with `Conflict` when the edge already exists; the unique
    /// constraint decides, not any earlier lookup.
    async fn create(&self, follower_id: Uuid, author_id: Uuid) -> Result<Follow, DomainError>;
    async fn exists(&self, follower_id: Uuid, author_id: Uuid) -> Result<bool, DomainError>;
    /// Returns false when there was no edge to remove.
    async fn delete(&self, follower_id: Uuid, author_id: Uuid) -> Result<bool, DomainError>;
}

#[derive(Clone)]
pub struct PostgresFollowRepository {
    pool: PgPool,
}

impl PostgresFollowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FollowRepository for PostgresFollowRepository {
    async fn create(&self, follower_id: Uuid, author_id: Uuid) -> Result<Follow, DomainError> {
        let follow = sqlx::query_as::<_, Follow>(
            r#"
            INSERT INTO follows (follower_id, author_id)
            VALUES ($1, $2)
            RETURNING id, follower_id, author_id
            "#,
        )
        .bind(follower_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match violated_unique_constraint(&e) {
            Some(constraint) => DomainError::Conflict(constraint),
            None => {
                error!("failed to create follow: {}", e);
                DomainError::Internal(format!("database error: {}", e))
            }
        })?;

        info!(follower_id = %follower_id, author_id = %author_id, "follow created");
        Ok(follow)
    }

    async fn exists(&self, follower_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND author_id = $2)",
        )
        .bind(follower_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::Internal(e.to_string()))
    }

    async fn delete(&self, follower_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND author_id = $2")
            .bind(follower_id)
            .bind(author_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        if deleted.rows_affected() > 0 {
            info!(follower_id = %follower_id, author_id = %author_id, "follow deleted");
        }
        Ok(deleted.rows_affected() > 0)
    }
}
