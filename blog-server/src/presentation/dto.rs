use serde::{Deserialize, Serialize};

use crate::domain::follow::FollowOutcome;
use crate::domain::post::PostForm;

// ======================= AUTH =======================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

// ======================= POSTS =======================

#[derive(Debug, Deserialize)]
pub struct PostRequest {
    pub text: String,
    #[serde(default)]
    pub group: Option<i64>,
    #[serde(default)]
    pub image: Option<String>,
}

impl From<PostRequest> for PostForm {
    fn from(req: PostRequest) -> Self {
        PostForm {
            text: req.text,
            group_id: req.group,
            image: req.image,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

/// Raw `?page=` value; extracted in `presentation::utils`.
#[derive(Debug, Default)]
pub struct PageQuery {
    pub page: Option<String>,
}

// ======================= FOLLOWS =======================

#[derive(Debug, Serialize)]
pub struct FollowResponse {
    pub author: String,
    pub outcome: FollowOutcome,
}
