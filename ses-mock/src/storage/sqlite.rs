//! SQLite storage backend

use crate::audit::{AuditEntry, AuditStatus};
use crate::error::{Result, SesError};
use crate::registry::{AddressFilter, AddressRecord, BlockState, Cooldown};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::{debug, info};

use super::Storage;

const ADDRESS_COLUMNS: &str = "email_address, is_blocked, reason, block_kind, self_cooldown_date, \
     self_cooldown_days, is_subscribed, category, created_at, updated_at";

/// Address registry and audit log in one SQLite database
#[derive(Clone)]
pub struct SqliteStorage {
    db: SqlitePool,
}

impl SqliteStorage {
    /// Wrap an existing pool. Call [`init_db`](Self::init_db) before use.
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Open `database_url` and create the tables
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = if database_url.contains(":memory:") {
            // Every connection to an in-memory database is a separate database,
            // and it is gone once that connection closes
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let db = options.connect(database_url).await?;

        let storage = Self::new(db);
        storage.init_db().await?;

        info!("Database connection established and tables initialized");
        Ok(storage)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }

    /// Initialize database tables
    pub async fn init_db(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS emails (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email_address TEXT NOT NULL UNIQUE,
                is_blocked BOOLEAN NOT NULL DEFAULT 0,
                reason TEXT NOT NULL DEFAULT '',
                block_kind TEXT,
                self_cooldown_date TEXT,
                self_cooldown_days INTEGER,
                is_subscribed BOOLEAN NOT NULL DEFAULT 0,
                category TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                deleted_at TEXT
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS email_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                from_address TEXT NOT NULL,
                to_address TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                deleted_at TEXT
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_email_logs_status
            ON email_logs(status)
            "#,
        )
        .execute(&self.db)
        .await?;

        Ok(())
    }

    fn row_to_record(row: SqliteRow) -> Result<AddressRecord> {
        use sqlx::Row;

        let is_blocked: bool = row.try_get("is_blocked")?;
        let reason: String = row.try_get("reason")?;
        let block_kind: Option<String> = row.try_get("block_kind")?;
        let cooldown_date: Option<String> = row.try_get("self_cooldown_date")?;
        let cooldown_days: Option<i64> = row.try_get("self_cooldown_days")?;
        let created_at: String = row.try_get("created_at")?;
        let updated_at: String = row.try_get("updated_at")?;

        let cooldown = match (cooldown_date, cooldown_days) {
            (Some(date), Some(days)) => Some(Cooldown {
                until: parse_timestamp(&date)?,
                days,
            }),
            _ => None,
        };

        let block = match (is_blocked, block_kind.as_deref(), cooldown) {
            (false, _, _) => BlockState::Unblocked,
            (true, Some("self_cooldown"), Some(c)) => BlockState::SelfCooldown {
                until: c.until,
                days: c.days,
            },
            (true, _, _) => BlockState::AdminBlocked { reason },
        };

        Ok(AddressRecord {
            address: row.try_get("email_address")?,
            block,
            cooldown,
            subscribed: row.try_get("is_subscribed")?,
            category: row.try_get("category")?,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| SesError::Parse(e.to_string()))
}

#[async_trait::async_trait]
impl Storage for SqliteStorage {
    async fn find_address(&self, address: &str) -> Result<Option<AddressRecord>> {
        let sql = format!(
            "SELECT {} FROM emails WHERE email_address = ? AND deleted_at IS NULL",
            ADDRESS_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(address)
            .fetch_optional(&self.db)
            .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn upsert_address(&self, record: &AddressRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO emails (
                email_address, is_blocked, reason, block_kind, self_cooldown_date,
                self_cooldown_days, is_subscribed, category, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(email_address) DO UPDATE SET
                is_blocked = excluded.is_blocked,
                reason = excluded.reason,
                block_kind = excluded.block_kind,
                self_cooldown_date = excluded.self_cooldown_date,
                self_cooldown_days = excluded.self_cooldown_days,
                is_subscribed = excluded.is_subscribed,
                category = excluded.category,
                updated_at = excluded.updated_at,
                deleted_at = NULL
            "#,
        )
        .bind(&record.address)
        .bind(record.block.is_flagged())
        .bind(record.block.reason().unwrap_or_default())
        .bind(record.block.kind())
        .bind(record.cooldown.map(|c| c.until.to_rfc3339()))
        .bind(record.cooldown.map(|c| c.days))
        .bind(record.subscribed)
        .bind(&record.category)
        .bind(record.created_at.to_rfc3339())
        .bind(record.updated_at.to_rfc3339())
        .execute(&self.db)
        .await?;

        debug!("Saved address record for {}", record.address);
        Ok(())
    }

    async fn list_addresses(&self, filter: AddressFilter) -> Result<Vec<AddressRecord>> {
        let condition = match filter {
            AddressFilter::Blocked => "is_blocked = 1",
            AddressFilter::Subscribed => "is_subscribed = 1",
        };
        let sql = format!(
            "SELECT {} FROM emails WHERE {} AND deleted_at IS NULL ORDER BY id",
            ADDRESS_COLUMNS, condition
        );

        let rows = sqlx::query(&sql).fetch_all(&self.db).await?;
        rows.into_iter().map(Self::row_to_record).collect()
    }

    async fn append_audit(&self, entries: &[AuditEntry]) -> Result<()> {
        let mut tx = self.db.begin().await?;

        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO email_logs (from_address, to_address, status, created_at)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(&entry.from)
            .bind(&entry.to)
            .bind(entry.status.as_str())
            .bind(entry.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn count_audit(&self, status: AuditStatus) -> Result<u64> {
        let (count,) = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM email_logs WHERE status = ? AND deleted_at IS NULL",
        )
        .bind(status.as_str())
        .fetch_one(&self.db)
        .await?;

        Ok(count.max(0) as u64)
    }
}
