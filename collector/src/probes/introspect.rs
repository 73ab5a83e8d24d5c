use crate::error::{
    Error,
    Result,
};
use sqlx::{
    sqlite::{
        SqliteConnectOptions,
        SqliteConnection,
    },
    Connection as _,
};
use std::{
    path::Path,
    time::Duration,
};

const CARD_COUNT_QUERY: &str = "SELECT COUNT(*) FROM cards";

/// The sync server may hold a write lock while a client syncs; do not wait
/// on it for longer than a poll interval would tolerate.
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// Number of rows in the `cards` table of the collection database at `path`.
/// The file is opened read-only and never created.
pub async fn card_count(path: &Path) -> Result<u64> {
    let db_err = |source| Error::Database {
        path: path.to_path_buf(),
        source,
    };

    let options = SqliteConnectOptions::new()
        .filename(path)
        .read_only(true)
        .create_if_missing(false)
        .busy_timeout(BUSY_TIMEOUT);
    let mut conn = SqliteConnection::connect_with(&options).await.map_err(db_err)?;

    let count = sqlx::query_scalar::<_, i64>(CARD_COUNT_QUERY)
        .fetch_one(&mut conn)
        .await
        .map_err(db_err);

    if let Err(e) = conn.close().await {
        debug!(path = %path.display(), error = %e, "closing collection database failed");
    }

    Ok(count?.max(0) as u64)
}

/// [`card_count`] with the introspection policy applied: a collection that
/// cannot be read reports zero cards instead of failing its user's record.
pub async fn inspect(path: &Path) -> u64 {
    card_count(path).await.unwrap_or_else(|e| {
        debug!(error = %e, "collection introspection failed, reporting 0 cards");
        0
    })
}
