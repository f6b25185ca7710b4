//! Storage seam for user documents.
//!
//! The HTTP layer only ever talks to [`UserStore`]. Which backend sits behind
//! it is decided once, at startup, from the connection string:
//!
//! | Scheme | Backend |
//! |---|---|
//! | `memory://` | [`MemoryStore`], process-local, gone on exit |
//! | `sqlite:` | [`SqliteStore`], JSON documents in a SQLite table |
//! | `mongodb://`, `mongodb+srv://` | [`MongoStore`], the `users` collection of `database` |

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::config::StorageSettings;
use crate::model::{UserDraft, UserId, UserRecord};

mod memory;
mod mongo;
mod sqlite;

pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use sqlite::SqliteStore;

/// Failure reported by a [`UserStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user {0} not found")]
    NotFound(UserId),
    #[error("storage backend: {0}")]
    Backend(String),
    #[error("sqlite: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("mongodb: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("stored document is not a valid user: {0}")]
    Codec(#[from] serde_json::Error),
}

/// The five document operations the API is built on, plus a liveness ping.
///
/// Implementations must be safe to call from many requests at once. No
/// ordering is promised between concurrent writes to the same id.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Every user, oldest first by `age` (descending).
    async fn list_all(&self) -> Result<Vec<UserRecord>, StoreError>;

    async fn find_by_id(&self, id: &UserId) -> Result<UserRecord, StoreError>;

    /// Stores `draft` under a freshly minted id and returns that id.
    async fn insert(&self, draft: UserDraft) -> Result<UserId, StoreError>;

    /// Replaces the whole document at `record.id`, creating it if absent.
    async fn update(&self, record: &UserRecord) -> Result<(), StoreError>;

    /// Removes the document and hands back what was stored.
    async fn delete(&self, id: &UserId) -> Result<UserRecord, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Opens the backend named by `settings.server` and checks it answers.
pub async fn connect(settings: &StorageSettings) -> Result<Arc<dyn UserStore>, StoreError> {
    let uri = settings.server.as_str();
    let store: Arc<dyn UserStore> = if uri.starts_with("memory:") {
        Arc::new(MemoryStore::new())
    } else if uri.starts_with("sqlite:") {
        Arc::new(SqliteStore::connect(settings).await?)
    } else if uri.starts_with("mongodb://") || uri.starts_with("mongodb+srv://") {
        Arc::new(MongoStore::connect(settings).await?)
    } else {
        return Err(StoreError::Backend(format!("unsupported connection string `{uri}`")));
    };
    store.ping().await?;
    info!(database = %settings.database, "storage connected");
    Ok(store)
}

/// Sorts by age, highest first; ties keep a stable order by id.
pub(crate) fn sort_by_age_desc(users: &mut [UserRecord]) {
    users.sort_by(|a, b| b.age.cmp(&a.age).then_with(|| a.id.cmp(&b.id)));
}
