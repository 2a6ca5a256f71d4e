use diesel::sqlite::SqliteConnection;
use diesel::Connection;
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;

use crate::error::{ReachPosterError, Result};

const BUSY_TIMEOUT_PRAGMA: &str = "PRAGMA busy_timeout = 5000";

pub fn open_connection_sync(database_url: &str) -> Result<SqliteConnection> {
    let mut conn = SqliteConnection::establish(database_url)
        .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
    diesel::RunQueryDsl::execute(diesel::sql_query(BUSY_TIMEOUT_PRAGMA), &mut conn)
        .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
    Ok(conn)
}

pub async fn apply_pragmas_async(conn: &mut SyncConnectionWrapper<SqliteConnection>) -> Result<()> {
    diesel_async::RunQueryDsl::execute(diesel::sql_query(BUSY_TIMEOUT_PRAGMA), conn)
        .await
        .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
    Ok(())
}
