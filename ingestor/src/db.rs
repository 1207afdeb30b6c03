use crate::errors::{Error, Result};
use crate::metrics::{DB_FAILURES_TOTAL, INSERT_LATENCY_SECONDS, SKIPPED_ROWS_TOTAL};
use crate::model::StoredReading;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

const MAX_INSERT_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 25;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS sensor_data (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        deviceid TEXT,
        temp REAL,
        hum REAL,
        press REAL,
        timestamp TEXT
    );
    CREATE INDEX IF NOT EXISTS sensor_data_timestamp_idx ON sensor_data (timestamp);
"#;

#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub max_connections: u32,
    pub busy_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            max_connections: 4,
            busy_timeout: Duration::from_millis(250),
        }
    }
}

/// Process-wide handle to the reading store.
///
/// Cloning is cheap; all clones share one connection pool. SQLite serializes
/// individual statements, so writers and readers need no extra locking here.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if absent) the database file and ensure the schema.
    pub async fn open(path: &Path, options: &StoreOptions) -> Result<Self> {
        info!("Opening database at {}", path.display());
        let connect = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(options.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(options.max_connections.max(1))
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(connect)
            .await
            .map_err(Error::StorageSetup)?;

        let store = Self { pool };
        store.ensure_schema().await?;
        info!("Database ready");
        Ok(store)
    }

    /// Create the `sensor_data` table and its index if missing. Safe to repeat.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(Error::StorageSetup)?;
        Ok(())
    }

    /// Append one reading as a single-row insert. Returns the new row id.
    ///
    /// Lock contention is retried a few times with a short backoff; any other
    /// failure is returned immediately.
    pub async fn insert(&self, reading: &StoredReading) -> Result<i64> {
        let start = Instant::now();
        let mut attempts = 0;

        loop {
            attempts += 1;
            match insert_inner(&self.pool, reading).await {
                Ok(id) => {
                    INSERT_LATENCY_SECONDS.observe(start.elapsed().as_secs_f64());
                    if attempts > 1 {
                        info!("Insert for {} succeeded on attempt {}", reading.device_id, attempts);
                    }
                    return Ok(id);
                }
                Err(e) => {
                    DB_FAILURES_TOTAL.inc();
                    if attempts >= MAX_INSERT_ATTEMPTS || !is_transient_error(&e) {
                        error!(
                            "Insert for {} failed after {} attempts: {}",
                            reading.device_id, attempts, e
                        );
                        return Err(Error::StorageWrite {
                            device_id: reading.device_id.clone(),
                            source: e,
                        });
                    }

                    let wait_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempts - 1);
                    warn!(
                        "Insert for {} failed (attempt {}/{}), retrying in {}ms: {}",
                        reading.device_id, attempts, MAX_INSERT_ATTEMPTS, wait_ms, e
                    );
                    tokio::time::sleep(Duration::from_millis(wait_ms)).await;
                }
            }
        }
    }

    /// Stored readings, newest first. Ties on timestamp put the most recently
    /// inserted row first. `None` returns every row.
    ///
    /// Rows that fail to decode are logged and skipped.
    pub async fn latest(&self, limit: Option<u32>) -> Result<Vec<StoredReading>> {
        // SQLite treats a negative LIMIT as unbounded.
        let limit = limit.map(i64::from).unwrap_or(-1);

        let rows = sqlx::query(
            "SELECT id, deviceid, temp, hum, press, timestamp FROM sensor_data \
             ORDER BY timestamp DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DB_FAILURES_TOTAL.inc();
            Error::StorageRead(e)
        })?;

        let mut readings = Vec::with_capacity(rows.len());
        for row in &rows {
            match StoredReading::from_row(row) {
                Ok(reading) => readings.push(reading),
                Err(e) => {
                    SKIPPED_ROWS_TOTAL.inc();
                    let id: Option<i64> = sqlx::Row::try_get(row, "id").ok();
                    warn!("Skipping undecodable row {:?}: {}", id, e);
                }
            }
        }

        debug!("Loaded {} readings", readings.len());
        Ok(readings)
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn insert_inner(
    pool: &SqlitePool,
    reading: &StoredReading,
) -> std::result::Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO sensor_data (deviceid, temp, hum, press, timestamp) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&reading.device_id)
    .bind(reading.temperature)
    .bind(reading.humidity)
    .bind(reading.pressure)
    .bind(&reading.timestamp)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

fn is_transient_error(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => true,
        sqlx::Error::Database(db_err) => {
            // Primary result code lives in the low byte of the extended code.
            db_err
                .code()
                .and_then(|code| code.parse::<i32>().ok())
                .is_some_and(|code| {
                    let primary = code & 0xff;
                    primary == 5 || // SQLITE_BUSY
                    primary == 6 // SQLITE_LOCKED
                })
        }
        _ => false,
    }
}
