use anyhow::Result;
use async_trait::async_trait;

use crate::domain::entities::admins::AdminEntity;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdminRepository {
    async fn find_by_subject(&self, subject: String) -> Result<Option<AdminEntity>>;
}
