//! User documents kept as JSON text in a single SQLite table.
//!
//! The configured database name becomes the table prefix, so several
//! logical databases can share one file: `app` lives in `app_users`.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::debug;

use super::{StoreError, UserStore};
use crate::config::StorageSettings;
use crate::model::{UserDraft, UserId, UserRecord};

/// Stored body of a document; the id lives in its own column.
#[derive(Serialize)]
struct Document<'a> {
    name: &'a str,
    age: i64,
    email: &'a str,
}

impl<'a> From<&'a UserRecord> for Document<'a> {
    fn from(r: &'a UserRecord) -> Self {
        Self { name: &r.name, age: r.age, email: &r.email }
    }
}

/// SQLite-backed [`UserStore`].
pub struct SqliteStore {
    pool: SqlitePool,
    table: String,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `settings.server` and
    /// makes sure the collection table exists.
    pub async fn connect(settings: &StorageSettings) -> Result<Self, StoreError> {
        if !is_collection_name(&settings.database) {
            return Err(StoreError::Backend(format!(
                "invalid database name `{}`",
                settings.database
            )));
        }

        let options = SqliteConnectOptions::from_str(&settings.server)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .acquire_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .connect_with(options)
            .await?;

        let store = Self { pool, table: format!("{}_users", settings.database) };
        store.create_table().await?;
        Ok(store)
    }

    async fn create_table(&self) -> Result<(), StoreError> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (id TEXT PRIMARY KEY NOT NULL, doc TEXT NOT NULL)",
            self.table
        );
        sqlx::query(&sql).execute(&self.pool).await?;
        debug!(table = %self.table, "collection ready");
        Ok(())
    }

    fn decode(id: &str, doc: &str) -> Result<UserRecord, StoreError> {
        let id = UserId::parse(id)
            .ok_or_else(|| StoreError::Backend(format!("stored id `{id}` is malformed")))?;
        let draft: UserDraft = serde_json::from_str(doc)?;
        Ok(draft.with_id(id))
    }
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn list_all(&self) -> Result<Vec<UserRecord>, StoreError> {
        let sql = format!(
            "SELECT id, doc FROM {} ORDER BY json_extract(doc, '$.age') DESC, id ASC",
            self.table
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                let id: String = row.try_get("id")?;
                let doc: String = row.try_get("doc")?;
                Self::decode(&id, &doc)
            })
            .collect()
    }

    async fn find_by_id(&self, id: &UserId) -> Result<UserRecord, StoreError> {
        let sql = format!("SELECT doc FROM {} WHERE id = ?", self.table);
        let row = sqlx::query(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let doc: String = row.try_get("doc")?;
        Self::decode(id.as_str(), &doc)
    }

    async fn insert(&self, draft: UserDraft) -> Result<UserId, StoreError> {
        let record = draft.with_id(UserId::generate());
        let doc = serde_json::to_string(&Document::from(&record))?;
        let sql = format!("INSERT INTO {} (id, doc) VALUES (?, ?)", self.table);
        sqlx::query(&sql)
            .bind(record.id.as_str())
            .bind(doc)
            .execute(&self.pool)
            .await?;
        Ok(record.id)
    }

    async fn update(&self, record: &UserRecord) -> Result<(), StoreError> {
        let doc = serde_json::to_string(&Document::from(record))?;
        let sql = format!(
            "INSERT INTO {} (id, doc) VALUES (?, ?) \
             ON CONFLICT(id) DO UPDATE SET doc = excluded.doc",
            self.table
        );
        sqlx::query(&sql)
            .bind(record.id.as_str())
            .bind(doc)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &UserId) -> Result<UserRecord, StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = ? RETURNING doc", self.table);
        let row = sqlx::query(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let doc: String = row.try_get("doc")?;
        Self::decode(id.as_str(), &doc)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Database names end up inside SQL identifiers: `^[A-Za-z0-9_]+$`.
fn is_collection_name(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}
