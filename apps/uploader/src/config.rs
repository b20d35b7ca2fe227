use std::time::Duration;

use anyhow::{Context, Result};
use uuid::Uuid;

use crate::models::session::Session;

const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";

/// Application configuration loaded from environment variables.
/// `USER_ID` is only required by commands that talk to the backend.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: String,
    pub user_id: Option<Uuid>,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    pub upload_timeout: Duration,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let user_id = optional_env("USER_ID")
            .map(|v| Uuid::parse_str(&v).context("USER_ID must be a valid UUID"))
            .transpose()?;

        Ok(Config {
            backend_url: optional_env("BACKEND_URL")
                .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
            user_id,
            user_email: optional_env("USER_EMAIL"),
            user_name: optional_env("USER_NAME"),
            upload_timeout: Duration::from_secs(
                optional_env("UPLOAD_TIMEOUT_SECS")
                    .unwrap_or_else(|| "300".to_string())
                    .parse::<u64>()
                    .context("UPLOAD_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// The signed-in user, as handed over by the identity provider.
    pub fn session(&self) -> Result<Session> {
        let user_id = self
            .user_id
            .context("Required environment variable 'USER_ID' is not set")?;
        Ok(Session {
            user_id,
            email: self.user_email.clone(),
            name: self.user_name.clone(),
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(user_id: Option<Uuid>) -> Config {
        Config {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            user_id,
            user_email: Some("ada@example.com".into()),
            user_name: None,
            upload_timeout: Duration::from_secs(300),
            rust_log: "info".into(),
        }
    }

    #[test]
    fn test_session_requires_user_id() {
        let err = config(None).session().unwrap_err();
        assert!(err.to_string().contains("USER_ID"));
    }

    #[test]
    fn test_session_from_config() {
        let id = Uuid::new_v4();
        let session = config(Some(id)).session().unwrap();
        assert_eq!(session.user_id, id);
        assert_eq!(session.display_name(), "ada@example.com");
    }
}
