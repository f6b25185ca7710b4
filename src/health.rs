//! Health-check handlers.
//!
//! | Check | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? |
//! | **Readiness** | `/readyz` | Does storage answer? |
//!
//! Both are mounted by [`api::routes`](crate::api::routes).

use std::sync::Arc;

use tracing::warn;

use crate::store::UserStore;
use crate::{Request, Response, Status};

/// Always `200 OK` with body `"ok"`. No dependencies.
pub async fn liveness(_req: Request) -> Response {
    Response::text("ok")
}

/// `200 OK` with body `"ready"` while the store answers a ping,
/// `503 Service Unavailable` with a JSON error body otherwise.
pub async fn readiness(store: Arc<dyn UserStore>, _req: Request) -> Response {
    match store.ping().await {
        Ok(()) => Response::text("ready"),
        Err(e) => {
            warn!("readiness check failed: {e}");
            Response::error(Status::ServiceUnavailable, "storage unavailable")
        }
    }
}
