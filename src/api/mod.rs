//! HTTP surface of the user collection.
//!
//! | Method | Path | Operation |
//! |---|---|---|
//! | GET | `/users` | list, age descending |
//! | POST | `/users/new` | create → 201 |
//! | GET | `/users/find/{id}` | find |
//! | PUT | `/users/update/{id}` | replace (upsert) |
//! | DELETE | `/users/delete/{id}` | delete, returns the removed user |
//!
//! `{id}` must match `^[a-z0-9]+$`; anything else is a plain 404.

use std::sync::Arc;

use crate::handler::with_state;
use crate::health;
use crate::method::Method;
use crate::model::UserId;
use crate::router::Router;
use crate::store::UserStore;

mod error;
pub mod users;

pub use error::ApiError;

/// Builds the full application router around one shared store.
pub fn routes(store: Arc<dyn UserStore>) -> Router {
    Router::new()
        .on(Method::Get,    "/users",              with_state(store.clone(), users::list))
        .on(Method::Post,   "/users/new",          with_state(store.clone(), users::create))
        .on(Method::Get,    "/users/find/{id}",    with_state(store.clone(), users::find))
        .on(Method::Put,    "/users/update/{id}",  with_state(store.clone(), users::update))
        .on(Method::Delete, "/users/delete/{id}",  with_state(store.clone(), users::delete))
        .on(Method::Get,    "/healthz",            health::liveness)
        .on(Method::Get,    "/readyz",             with_state(store,         health::readiness))
        .guard("id", UserId::is_valid)
}
