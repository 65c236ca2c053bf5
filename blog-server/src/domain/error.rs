use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("user already exists: {0}")]
    UserAlreadyExists(String),
    #[error("group not found: {0}")]
    GroupNotFound(String),
    #[error("post not found: {0}")]
    PostNotFound(i64),
    #[error("not following {0}")]
    FollowNotFound(String),
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("permission denied")]
    PermissionDenied,
    #[error("unauthorized")]
    Unauthorized,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        DomainError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DomainError::UserNotFound(_)
                | DomainError::GroupNotFound(_)
                | DomainError::PostNotFound(_)
                | DomainError::FollowNotFound(_)
        )
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::Internal(format!("database error: {}", err))
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            DomainError::UserNotFound(_)
            | DomainError::GroupNotFound(_)
            | DomainError::PostNotFound(_)
            | DomainError::FollowNotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            DomainError::Unauthorized => StatusCode::UNAUTHORIZED,
            DomainError::PermissionDenied => StatusCode::FORBIDDEN,
            DomainError::UserAlreadyExists(_) | DomainError::Conflict(_) => StatusCode::CONFLICT,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = self.to_string();
        let details = match self {
            DomainError::UserNotFound(resource)
            | DomainError::GroupNotFound(resource)
            | DomainError::FollowNotFound(resource) => Some(json!({ "resource": resource })),
            DomainError::PostNotFound(id) => Some(json!({ "resource": id })),
            DomainError::Validation { field, message } => {
                Some(json!({ "field": field, "message": message }))
            }
            // internals stay in the logs
            DomainError::Internal(_) => {
                return HttpResponse::build(self.status_code())
                    .json(json!({ "error": "internal error" }));
            }
            _ => None,
        };
        let body = ErrorBody {
            error: message.as_str(),
            details,
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_taxonomy_to_status_codes() {
        assert_eq!(
            DomainError::PostNotFound(7).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            DomainError::validation("text", "must not be empty").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            DomainError::PermissionDenied.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            DomainError::Conflict("follow".into()).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn not_found_covers_every_missing_resource() {
        assert!(DomainError::UserNotFound("leo".into()).is_not_found());
        assert!(DomainError::GroupNotFound("cats".into()).is_not_found());
        assert!(DomainError::FollowNotFound("leo".into()).is_not_found());
        assert!(!DomainError::Unauthorized.is_not_found());
    }
}
