use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::PortalError;
use crate::models::Student;

/// Credential for admin-gated calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    token: String,
}

impl AdminSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Token to send as a bearer credential; a blank one is never dispatched.
    pub fn bearer(&self) -> Result<&str, PortalError> {
        if self.token.trim().is_empty() {
            return Err(PortalError::Authorization("Admin token is missing".into()));
        }
        Ok(&self.token)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentSession {
    pub student: Student,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    #[serde(default)]
    pub admin_token: Option<String>,
    #[serde(default)]
    pub is_authenticated: bool,
    #[serde(default)]
    pub student: Option<Student>,
}

impl StoredSession {
    pub fn admin(&self) -> Option<AdminSession> {
        self.admin_token
            .as_deref()
            .filter(|token| self.is_authenticated && !token.is_empty())
            .map(AdminSession::new)
    }

    pub fn student(&self) -> Option<StudentSession> {
        self.student.clone().map(|student| StudentSession { student })
    }
}

/// File-backed key/value store for the signed-in identities. Expiry is never
/// checked locally; a rejected token is the only expiry signal.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<StoredSession, PortalError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no stored session");
                Ok(StoredSession::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn save_admin(&self, session: &AdminSession) -> Result<(), PortalError> {
        let mut stored = self.load().await?;
        stored.admin_token = Some(session.token().to_string());
        stored.is_authenticated = true;
        self.write(&stored).await?;
        info!("admin session stored");
        Ok(())
    }

    pub async fn save_student(&self, session: &StudentSession) -> Result<(), PortalError> {
        let mut stored = self.load().await?;
        stored.student = Some(session.student.clone());
        self.write(&stored).await?;
        info!(roll_number = %session.student.roll_number, "student session stored");
        Ok(())
    }

    pub async fn clear_admin(&self) -> Result<(), PortalError> {
        let mut stored = self.load().await?;
        stored.admin_token = None;
        stored.is_authenticated = false;
        self.write(&stored).await
    }

    pub async fn clear(&self) -> Result<(), PortalError> {
        self.write(&StoredSession::default()).await
    }

    async fn write(&self, stored: &StoredSession) -> Result<(), PortalError> {
        let body = serde_json::to_vec_pretty(stored)?;
        tokio::fs::write(&self.path, body).await?;
        Ok(())
    }
}
