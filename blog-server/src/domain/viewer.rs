use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub username: String,
}

/// Identity behind the current request, as resolved by the auth middleware.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Viewer {
    #[default]
    Anonymous,
    Authenticated(AuthenticatedUser),
}

impl Viewer {
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        match self {
            Viewer::Anonymous => None,
            Viewer::Authenticated(user) => Some(user),
        }
    }

    pub fn id(&self) -> Option<Uuid> {
        self.user().map(|u| u.id)
    }
}

impl From<AuthenticatedUser> for Viewer {
    fn from(user: AuthenticatedUser) -> Self {
        Viewer::Authenticated(user)
    }
}
