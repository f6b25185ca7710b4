//! # userbase
//!
//! A small JSON HTTP service over a collection of user documents
//! (`id`, `name`, `age`, `email`).
//!
//! Each request is routed by method and path to one of five operations
//! (list, create, find, update, delete), the single matching store call
//! runs, and its result or error is written back as JSON:
//!
//! | Outcome | Status |
//! |---|---|
//! | success | 200, 201 for create |
//! | bad or missing body, bad id | 400 `{"error": …}` |
//! | unknown user | 404 `{"error": …}` |
//! | storage failure | 500 `{"error": …}` |
//! | no such route | 404, empty body |
//!
//! ## Running
//!
//! ```rust,no_run
//! use userbase::{api, store, Server, Settings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), userbase::Error> {
//!     let settings = Settings::load("conf.json")?;
//!     let store = store::connect(&settings.storage()).await?;
//!     Server::bind(&settings.listen).await?.serve(api::routes(store)).await
//! }
//! ```
//!
//! Storage sits behind [`store::UserStore`]; `memory://`, `sqlite:` and
//! `mongodb://` connection strings are understood.

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod api;
pub mod config;
pub mod health;
pub mod model;
pub mod store;
pub mod telemetry;

pub use crate::config::Settings;
pub use error::Error;
pub use handler::{with_state, BoxFuture, Handler, WithState};
pub use method::Method;
pub use request::{BodyError, Request};
pub use response::{IntoResponse, Json, Response, ResponseBuilder};
pub use router::{ParamGuard, Router};
pub use server::{Server, DEFAULT_MAX_BODY_BYTES};
pub use status::Status;
