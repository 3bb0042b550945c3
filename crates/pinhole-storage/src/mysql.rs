use async_trait::async_trait;
use jiff::Timestamp;
use pinhole_core::repository::{ReadRepository, Repository, Result, VisitUpdate};
use pinhole_core::{ExpirationMode, Lookup, ShortCode, ShortLink, StorageError, Visit};
use sqlx::mysql::{MySqlDatabaseError, MySqlRow};
use sqlx::{MySqlConnection, MySqlPool, Row};
use tracing::{trace, warn};

const SELECT_LINK: &str = r#"
    SELECT code, target_url, created_at, expires_at, visit_count, max_visits,
           expiration_mode, is_custom, owner_id,
           last_visit_at, last_referrer, last_user_agent, last_source
    FROM short_links
"#;

/// Attempts for an insert that the server aborts on lock contention.
const MAX_INSERT_ATTEMPTS: u32 = 3;

const ER_LOCK_WAIT_TIMEOUT: u16 = 1205;
const ER_LOCK_DEADLOCK: u16 = 1213;

/// MySQL implementation of the repository contract.
///
/// Timestamps are stored as unix seconds. Deleting a link removes its row.
/// Code uniqueness is enforced by the `uq_short_links_code` key, so a
/// concurrent insert of the same code fails with a unique violation that is
/// reported as [`StorageError::Conflict`].
///
/// The `active_urls` table maps the SHA-256 of a target URL to the code of
/// its newest generated record. A non-custom insert upserts that row first,
/// which creates or locks it, so concurrent shortenings of one URL serialize
/// on a key the server checks whether or not a record exists yet. Inserts
/// aborted by a deadlock or lock wait timeout are retried.
#[derive(Debug, Clone)]
pub struct MySqlRepository {
    pool: MySqlPool,
}

impl MySqlRepository {
    /// Creates a repository from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a repository by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    async fn try_insert(&self, record: &ShortLink) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        if !record.is_custom {
            lock_active_url(&mut tx, record).await?;
        }

        let result = sqlx::query(
            r#"
            INSERT INTO short_links
              (code, target_url, created_at, expires_at, visit_count, max_visits,
               expiration_mode, is_custom, owner_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.code.as_str())
        .bind(&record.target_url)
        .bind(record.created_at.as_second())
        .bind(record.expires_at.map(|ts| ts.as_second()))
        .bind(record.visit_count)
        .bind(record.max_visits)
        .bind(record.expiration_mode.as_str())
        .bind(record.is_custom)
        .bind(record.owner_id.as_deref())
        .execute(&mut *tx)
        .await;

        match result {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(StorageError::Conflict(record.code.to_string()))
            }
            Err(err) => return Err(map_sqlx_error(err)),
        }

        if !record.is_custom {
            sqlx::query("UPDATE active_urls SET code = ? WHERE url_hash = SHA2(?, 256)")
                .bind(record.code.as_str())
                .bind(&record.target_url)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)
    }

    async fn delete_with(
        &self,
        code: &ShortCode,
        query: sqlx::query::Query<'_, sqlx::MySql, sqlx::mysql::MySqlArguments>,
    ) -> Result<bool> {
        let result = query.execute(&self.pool).await.map_err(map_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }

        // The code may already belong to a newer record by now.
        sqlx::query(
            r#"
            DELETE FROM active_urls
            WHERE code = ?
              AND NOT EXISTS (SELECT 1 FROM short_links WHERE short_links.code = active_urls.code)
            "#,
        )
        .bind(code.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(true)
    }
}

/// Takes the lock row for the record's target URL and fails with
/// [`StorageError::ActiveUrlExists`] if the code it maps to is still active.
///
/// The lock is held until the surrounding transaction ends.
async fn lock_active_url(conn: &mut MySqlConnection, record: &ShortLink) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO active_urls (url_hash, code)
        VALUES (SHA2(?, 256), ?)
        ON DUPLICATE KEY UPDATE url_hash = url_hash
        "#,
    )
    .bind(&record.target_url)
    .bind(record.code.as_str())
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    let mapped: String =
        sqlx::query_scalar("SELECT code FROM active_urls WHERE url_hash = SHA2(?, 256) FOR UPDATE")
            .bind(&record.target_url)
            .fetch_one(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;
    if mapped == record.code.as_str() {
        return Ok(());
    }

    let sql = format!("{SELECT_LINK} WHERE code = ? LIMIT 1 LOCK IN SHARE MODE");
    let row = sqlx::query(&sql)
        .bind(&mapped)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    if let Some(row) = row {
        let existing = link_from_row(&row)?;
        if existing.target_url == record.target_url
            && !existing.is_custom
            && existing.is_active_at(Timestamp::now())
        {
            trace!(code = %existing.code, "active record already exists for url");
            return Err(StorageError::ActiveUrlExists(Box::new(existing)));
        }
    }
    Ok(())
}

fn parse_timestamp(column: &str, seconds: i64) -> Result<Timestamp> {
    Timestamp::from_second(seconds).map_err(|e| {
        StorageError::InvalidData(format!("invalid {column} timestamp '{seconds}': {e}"))
    })
}

fn link_from_row(row: &MySqlRow) -> Result<ShortLink> {
    let code: String = row.try_get("code").map_err(map_sqlx_error)?;
    let target_url: String = row.try_get("target_url").map_err(map_sqlx_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
    let expires_at: Option<i64> = row.try_get("expires_at").map_err(map_sqlx_error)?;
    let visit_count: u64 = row.try_get("visit_count").map_err(map_sqlx_error)?;
    let max_visits: Option<u64> = row.try_get("max_visits").map_err(map_sqlx_error)?;
    let expiration_mode: String = row.try_get("expiration_mode").map_err(map_sqlx_error)?;
    let is_custom: bool = row.try_get("is_custom").map_err(map_sqlx_error)?;
    let owner_id: Option<String> = row.try_get("owner_id").map_err(map_sqlx_error)?;
    let last_visit_at: Option<i64> = row.try_get("last_visit_at").map_err(map_sqlx_error)?;

    let last_visit = match last_visit_at {
        Some(at) => Some(Visit {
            referrer: row.try_get("last_referrer").map_err(map_sqlx_error)?,
            user_agent: row.try_get("last_user_agent").map_err(map_sqlx_error)?,
            source: row.try_get("last_source").map_err(map_sqlx_error)?,
            at: parse_timestamp("last_visit_at", at)?,
        }),
        None => None,
    };

    Ok(ShortLink {
        code: ShortCode::new_unchecked(code),
        target_url,
        created_at: parse_timestamp("created_at", created_at)?,
        expires_at: expires_at
            .map(|seconds| parse_timestamp("expires_at", seconds))
            .transpose()?,
        visit_count,
        max_visits,
        expiration_mode: expiration_mode
            .parse::<ExpirationMode>()
            .map_err(StorageError::InvalidData)?,
        is_custom,
        owner_id,
        last_visit,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn is_lock_contention(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.try_downcast_ref::<MySqlDatabaseError>())
        .is_some_and(|db| matches!(db.number(), ER_LOCK_DEADLOCK | ER_LOCK_WAIT_TIMEOUT))
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();
    if is_lock_contention(&err) {
        return StorageError::Contention(message);
    }

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl ReadRepository for MySqlRepository {
    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        let exists = sqlx::query(
            r#"
            SELECT 1
            FROM short_links
            WHERE code = ?
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .is_some();

        Ok(exists)
    }

    async fn find_by_code(&self, code: &ShortCode) -> Result<Lookup<ShortLink>> {
        let sql = format!("{SELECT_LINK} WHERE code = ? LIMIT 1");
        let row = sqlx::query(&sql)
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => Ok(Lookup::Found(link_from_row(&row)?)),
            None => Ok(Lookup::NotFound),
        }
    }

    async fn find_active_by_url(&self, url: &str, now: Timestamp) -> Result<Lookup<ShortLink>> {
        // Only the mapped record for a URL can be active: a new one replaces
        // the mapping only once the previous one has expired.
        let sql = format!(
            "{SELECT_LINK} WHERE code = (SELECT code FROM active_urls WHERE url_hash = SHA2(?, 256)) \
             AND target_url = ? AND is_custom = FALSE LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(url)
            .bind(url)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let link = row.map(|row| link_from_row(&row)).transpose()?;
        Ok(Lookup::from(link).filter(|link| link.is_active_at(now)))
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<ShortLink>> {
        let sql = format!("{SELECT_LINK} ORDER BY id DESC LIMIT ?");
        let rows = sqlx::query(&sql)
            .bind(limit as u64)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(link_from_row).collect()
    }

    async fn find_expired(&self, now: Timestamp) -> Result<Vec<ShortLink>> {
        let sql = format!(
            "{SELECT_LINK} WHERE expires_at IS NOT NULL AND expires_at <= ? ORDER BY expires_at"
        );
        let rows = sqlx::query(&sql)
            .bind(now.as_second())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(link_from_row).collect()
    }
}

#[async_trait]
impl Repository for MySqlRepository {
    async fn insert(&self, record: ShortLink) -> Result<ShortLink> {
        let mut attempt = 1;
        loop {
            let result = self.try_insert(&record).await;
            match result {
                Err(StorageError::Contention(message)) if attempt < MAX_INSERT_ATTEMPTS => {
                    warn!(
                        code = %record.code,
                        attempt,
                        error = %message,
                        "insert aborted by lock contention, retrying"
                    );
                    attempt += 1;
                }
                result => return result.map(|()| record),
            }
        }
    }

    async fn update(&self, record: &ShortLink) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE short_links
            SET expires_at = ?, max_visits = ?, expiration_mode = ?, owner_id = ?
            WHERE code = ?
            "#,
        )
        .bind(record.expires_at.map(|ts| ts.as_second()))
        .bind(record.max_visits)
        .bind(record.expiration_mode.as_str())
        .bind(record.owner_id.as_deref())
        .bind(record.code.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        // MySQL reports changed rows, so an update that rewrites identical
        // values affects zero rows without the record being gone.
        if result.rows_affected() == 0 && !self.exists(&record.code).await? {
            return Err(StorageError::NotFound(record.code.to_string()));
        }
        Ok(())
    }

    async fn increment_visits(
        &self,
        code: &ShortCode,
        expected: u64,
        visit: Option<Visit>,
    ) -> Result<VisitUpdate> {
        let result = match &visit {
            Some(visit) => {
                sqlx::query(
                    r#"
                    UPDATE short_links
                    SET visit_count = visit_count + 1,
                        last_visit_at = ?, last_referrer = ?, last_user_agent = ?, last_source = ?
                    WHERE code = ? AND visit_count = ?
                    "#,
                )
                .bind(visit.at.as_second())
                .bind(visit.referrer.as_deref())
                .bind(visit.user_agent.as_deref())
                .bind(visit.source.as_deref())
                .bind(code.as_str())
                .bind(expected)
                .execute(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"
                    UPDATE short_links
                    SET visit_count = visit_count + 1
                    WHERE code = ? AND visit_count = ?
                    "#,
                )
                .bind(code.as_str())
                .bind(expected)
                .execute(&self.pool)
                .await
            }
        }
        .map_err(map_sqlx_error)?;

        // The re-read may already include increments made after ours.
        let current = match self.find_by_code(code).await? {
            Lookup::Found(link) => link,
            Lookup::NotFound => return Err(StorageError::NotFound(code.to_string())),
        };

        if result.rows_affected() > 0 {
            Ok(VisitUpdate::Applied(current))
        } else {
            Ok(VisitUpdate::Stale(current))
        }
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        let query = sqlx::query(
            r#"
            DELETE FROM short_links
            WHERE code = ?
            "#,
        )
        .bind(code.as_str());
        self.delete_with(code, query).await
    }

    async fn delete_if_expired(&self, code: &ShortCode, now: Timestamp) -> Result<bool> {
        let query = sqlx::query(
            r#"
            DELETE FROM short_links
            WHERE code = ? AND expires_at IS NOT NULL AND expires_at <= ?
            "#,
        )
        .bind(code.as_str())
        .bind(now.as_second());
        self.delete_with(code, query).await
    }
}
