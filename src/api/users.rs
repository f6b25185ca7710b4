//! The five user endpoints.
//!
//! Each handler decodes what it needs from the request into fresh values,
//! makes exactly one store call, and lets [`ApiError`] decide the status of
//! anything that went wrong.

use std::sync::Arc;

use tracing::info;

use super::ApiError;
use crate::model::{UserDraft, UserId, UserRecord};
use crate::request::Request;
use crate::response::Json;
use crate::status::Status;
use crate::store::UserStore;

/// `GET /users`
pub async fn list(
    store: Arc<dyn UserStore>,
    _req: Request,
) -> Result<Json<Vec<UserRecord>>, ApiError> {
    Ok(Json(store.list_all().await?))
}

/// `POST /users/new`
pub async fn create(
    store: Arc<dyn UserStore>,
    req: Request,
) -> Result<(Status, Json<UserRecord>), ApiError> {
    let draft: UserDraft = req.json()?;
    let id = store.insert(draft.clone()).await?;
    info!(%id, "user created");
    Ok((Status::Created, Json(draft.with_id(id))))
}

/// `GET /users/find/{id}`
pub async fn find(store: Arc<dyn UserStore>, req: Request) -> Result<Json<UserRecord>, ApiError> {
    let id = path_id(&req)?;
    Ok(Json(store.find_by_id(&id).await?))
}

/// `PUT /users/update/{id}`
///
/// Full replace: fields missing from the body are stored empty/zero. The
/// path id always wins over anything in the body, and an unknown id is
/// created rather than rejected.
pub async fn update(store: Arc<dyn UserStore>, req: Request) -> Result<Json<UserRecord>, ApiError> {
    let id = path_id(&req)?;
    let draft: UserDraft = req.json()?;
    let record = draft.with_id(id);
    store.update(&record).await?;
    info!(id = %record.id, "user updated");
    Ok(Json(record))
}

/// `DELETE /users/delete/{id}`
pub async fn delete(store: Arc<dyn UserStore>, req: Request) -> Result<Json<UserRecord>, ApiError> {
    let id = path_id(&req)?;
    let removed = store.delete(&id).await?;
    info!(%id, "user deleted");
    Ok(Json(removed))
}

fn path_id(req: &Request) -> Result<UserId, ApiError> {
    req.param("id").and_then(UserId::parse).ok_or(ApiError::InvalidId)
}
