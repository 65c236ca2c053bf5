use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Directed edge: `follower_id` wants `author_id`'s posts in their followed feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Follow {
    pub id: i64,
    pub follower_id: Uuid,
    pub author_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowOutcome {
    Created,
    AlreadyFollowing,
    SelfFollowRejected,
}
