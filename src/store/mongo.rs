//! User documents in a MongoDB collection.
//!
//! Documents live in `<database>.users`. Ids minted here are ObjectIds and
//! travel over HTTP as their 24-digit hex form; an id that is not an ObjectId
//! in hex (created by `PUT` with a free-form id) is stored as a string `_id`.

use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{StoreError, UserStore};
use crate::config::StorageSettings;
use crate::model::{UserDraft, UserId, UserRecord};

const COLLECTION: &str = "users";

#[derive(Debug, Deserialize, Serialize)]
struct StoredUser {
    #[serde(rename = "_id")]
    id: Bson,
    #[serde(default)]
    name: String,
    #[serde(default)]
    age: i64,
    #[serde(default)]
    email: String,
}

impl StoredUser {
    fn new(id: Bson, draft: UserDraft) -> Self {
        Self { id, name: draft.name, age: draft.age, email: draft.email }
    }

    fn into_record(self) -> Result<UserRecord, StoreError> {
        let id = match &self.id {
            Bson::ObjectId(oid) => UserId::parse(&oid.to_hex()),
            Bson::String(s) => UserId::parse(s),
            _ => None,
        }
        .ok_or_else(|| StoreError::Backend(format!("stored _id `{}` is not a user id", self.id)))?;
        Ok(UserRecord { id, name: self.name, age: self.age, email: self.email })
    }
}

/// `_id` value for a user id: ObjectId when it is one in hex, else a string.
fn key(id: &UserId) -> Bson {
    match ObjectId::parse_str(id.as_str()) {
        Ok(oid) => Bson::ObjectId(oid),
        Err(_) => Bson::String(id.as_str().to_owned()),
    }
}

fn by_id(id: &UserId) -> Document {
    doc! { "_id": key(id) }
}

/// MongoDB-backed [`UserStore`].
pub struct MongoStore {
    db: Database,
    users: Collection<StoredUser>,
}

impl MongoStore {
    /// Builds a client for `settings.server`. No round trip happens here;
    /// the first operation (or [`UserStore::ping`]) opens the connection.
    pub async fn connect(settings: &StorageSettings) -> Result<Self, StoreError> {
        let timeout = Duration::from_secs(settings.connect_timeout_secs);
        let mut options = ClientOptions::parse(settings.server.as_str()).await?;
        options.app_name = Some("userbase".to_owned());
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);

        let client = Client::with_options(options)?;
        let db = client.database(&settings.database);
        let users = db.collection::<StoredUser>(COLLECTION);
        debug!(database = %settings.database, collection = COLLECTION, "mongodb client ready");
        Ok(Self { db, users })
    }
}

#[async_trait]
impl UserStore for MongoStore {
    async fn list_all(&self) -> Result<Vec<UserRecord>, StoreError> {
        let stored: Vec<StoredUser> = self
            .users
            .find(doc! {})
            .sort(doc! { "age": -1, "_id": 1 })
            .await?
            .try_collect()
            .await?;
        stored.into_iter().map(StoredUser::into_record).collect()
    }

    async fn find_by_id(&self, id: &UserId) -> Result<UserRecord, StoreError> {
        match self.users.find_one(by_id(id)).await? {
            Some(stored) => stored.into_record(),
            None => Err(StoreError::NotFound(id.clone())),
        }
    }

    async fn insert(&self, draft: UserDraft) -> Result<UserId, StoreError> {
        let oid = ObjectId::new();
        self.users.insert_one(StoredUser::new(Bson::ObjectId(oid), draft)).await?;
        UserId::parse(&oid.to_hex())
            .ok_or_else(|| StoreError::Backend(format!("minted id `{oid}` is not a user id")))
    }

    async fn update(&self, record: &UserRecord) -> Result<(), StoreError> {
        let draft = UserDraft {
            name: record.name.clone(),
            age: record.age,
            email: record.email.clone(),
        };
        self.users
            .replace_one(by_id(&record.id), StoredUser::new(key(&record.id), draft))
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &UserId) -> Result<UserRecord, StoreError> {
        match self.users.find_one_and_delete(by_id(id)).await? {
            Some(stored) => stored.into_record(),
            None => Err(StoreError::NotFound(id.clone())),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
