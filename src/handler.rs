//! Route handlers.
//!
//! A [`Handler`] turns one [`Request`] into a boxed future of one
//! [`Response`]. Two shapes are accepted by [`Router::on`](crate::Router::on):
//!
//! - a stateless `async fn(Request) -> impl IntoResponse`,
//! - an `async fn(S, Request) -> impl IntoResponse` bound to a cloneable
//!   state value with [`with_state`].
//!
//! The router keeps every handler as `Arc<dyn Handler>` so routes of
//! different concrete types live in one tree.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// What a handler hands back to the router.
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

pub(crate) type BoxedHandler = Arc<dyn Handler>;

/// Something that can answer a routed request.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: Request) -> BoxFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoResponse,
{
    fn call(&self, req: Request) -> BoxFuture {
        respond(self(req))
    }
}

/// A handler that receives its own clone of `state` on every call.
pub struct WithState<S, F> {
    state: S,
    f: F,
}

/// Binds `state` as the first argument of `f`.
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use userbase::{with_state, Method, Request, Response, Router};
/// async fn greet(name: Arc<str>, _req: Request) -> Response {
///     Response::text(format!("hello {name}"))
/// }
/// Router::new().on(Method::Get, "/hello", with_state(Arc::<str>::from("ana"), greet));
/// ```
pub fn with_state<S, F, Fut>(state: S, f: F) -> WithState<S, F>
where
    S: Clone + Send + Sync + 'static,
    F: Fn(S, Request) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoResponse,
{
    WithState { state, f }
}

impl<S, F, Fut> Handler for WithState<S, F>
where
    S: Clone + Send + Sync + 'static,
    F: Fn(S, Request) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoResponse,
{
    fn call(&self, req: Request) -> BoxFuture {
        respond((self.f)(self.state.clone(), req))
    }
}

fn respond<Fut>(fut: Fut) -> BoxFuture
where
    Fut: Future + Send + 'static,
    Fut::Output: IntoResponse,
{
    Box::pin(async move { fut.await.into_response() })
}
