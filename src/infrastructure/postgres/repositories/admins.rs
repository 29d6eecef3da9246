use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, prelude::*};
use tokio::task;

use crate::{
    domain::{entities::admins::AdminEntity, repositories::admins::AdminRepository},
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::admins},
};

pub struct AdminPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl AdminPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl AdminRepository for AdminPostgres {
    async fn find_by_subject(&self, subject: String) -> Result<Option<AdminEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Option<AdminEntity>> {
            let mut conn = db_pool.get()?;

            let result = admins::table
                .select(AdminEntity::as_select())
                .filter(admins::subject.eq(subject))
                .first::<AdminEntity>(&mut conn)
                .optional()?;

            Ok(result)
        })
        .await??)
    }
}
