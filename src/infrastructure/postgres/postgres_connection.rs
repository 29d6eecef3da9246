use anyhow::Result;
use diesel::{
    Connection, PgConnection,
    r2d2::{ConnectionManager, Pool},
    result::{DatabaseErrorKind, Error as DieselError},
};

pub type PgPoolSquad = Pool<ConnectionManager<PgConnection>>;

const TRANSACTION_RETRIES: usize = 3;

pub fn establish_connection(database_url: &str) -> Result<PgPoolSquad> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder().build(manager)?;
    Ok(pool)
}

/// Runs `body` in its own transaction, retrying up to a bounded number of
/// times when Postgres aborts it with a serialization failure or a deadlock.
/// `body` must therefore be safe to re-run from scratch.
pub fn transaction_with_retry<T, F>(conn: &mut PgConnection, mut body: F) -> Result<T>
where
    F: FnMut(&mut PgConnection) -> Result<T>,
{
    let mut attempts = 0;
    loop {
        match conn.transaction::<T, anyhow::Error, _>(&mut body) {
            Err(err) if attempts < TRANSACTION_RETRIES && is_retryable(&err) => {
                attempts += 1;
            }
            result => return result,
        }
    }
}

fn is_retryable(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<DieselError>() {
        Some(DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _)) => true,
        Some(DieselError::DatabaseError(DatabaseErrorKind::Unknown, info)) => {
            info.message().contains("deadlock detected")
        }
        _ => false,
    }
}
