use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::domain::{entities::admins::AdminEntity, repositories::admins::AdminRepository};

#[derive(Debug, Error)]
pub enum AdminGateError {
    #[error("not an administrator")]
    Unauthorized,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AdminGateError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            AdminGateError::Unauthorized => StatusCode::FORBIDDEN,
            AdminGateError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A valid token only proves who the caller is; administrative rights come
/// from the admin registry, checked here on every admin request.
pub struct AdminGate<A>
where
    A: AdminRepository + Send + Sync,
{
    admin_repository: Arc<A>,
}

impl<A> AdminGate<A>
where
    A: AdminRepository + Send + Sync,
{
    pub fn new(admin_repository: Arc<A>) -> Self {
        Self { admin_repository }
    }

    pub async fn authorize(&self, subject: &str) -> Result<AdminEntity, AdminGateError> {
        match self
            .admin_repository
            .find_by_subject(subject.to_string())
            .await?
        {
            Some(admin) => Ok(admin),
            None => {
                warn!(subject, "admin gate: subject not in admin registry");
                Err(AdminGateError::Unauthorized)
            }
        }
    }
}
