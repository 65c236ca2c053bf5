use std::sync::Arc;

use tracing::instrument;

use crate::data::group_repository::GroupRepository;
use crate::domain::error::DomainError;
use crate::domain::group::{Group, NewGroup};

pub const TITLE_MAX_LEN: usize = 200;
pub const DESCRIPTION_MAX_LEN: usize = 400;

#[derive(Clone)]
pub struct GroupService {
    repo: Arc<dyn GroupRepository>,
}

fn is_slug(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl GroupService {
    pub fn new(repo: Arc<dyn GroupRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<Group>, DomainError> {
        self.repo.list().await
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Group, DomainError> {
        self.repo
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::GroupNotFound(slug.to_string()))
    }

    #[instrument(skip(self))]
    pub async fn create(&self, group: NewGroup) -> Result<Group, DomainError> {
        if group.title.trim().is_empty() {
            return Err(DomainError::validation("title", "must not be empty"));
        }
        if group.title.chars().count() > TITLE_MAX_LEN {
            return Err(DomainError::validation(
                "title",
                format!("at most {} characters", TITLE_MAX_LEN),
            ));
        }
        if group.description.chars().count() > DESCRIPTION_MAX_LEN {
            return Err(DomainError::validation(
                "description",
                format!("at most {} characters", DESCRIPTION_MAX_LEN),
            ));
        }
        if !is_slug(&group.slug) {
            return Err(DomainError::validation(
                "slug",
                "only letters, digits, '-' and '_' are allowed",
            ));
        }
        self.repo.create(group).await
    }

    /// Posts in the group stay, ungrouped.
    #[instrument(skip(self))]
    pub async fn delete(&self, slug: &str) -> Result<(), DomainError> {
        let group = self.get_by_slug(slug).await?;
        self.repo.delete(group.id).await?;
        Ok(())
    }
}
