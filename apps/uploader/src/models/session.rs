use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The signed-in user as mirrored from the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl Session {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("anonymous")
    }
}
