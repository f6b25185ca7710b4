//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup. Path parameters can be
//! guarded by a predicate; a guarded parameter that fails its check makes
//! the whole route miss. There is no 405: a wrong method, a wrong path and
//! a rejected parameter all answer `404 Not Found` with an empty body.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// Predicate a path parameter must satisfy for its route to match.
pub type ParamGuard = fn(&str) -> bool;

/// The application router.
///
/// Build it once at startup and pass it to [`Server::serve`](crate::Server::serve).
/// Registration methods return `self` so calls chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    guards: HashMap<String, ParamGuard>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), guards: HashMap::new() }
    }

    /// Register a handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them:
    ///
    /// ```rust,no_run
    /// # use userbase::{Method, Request, Response, Router};
    /// # async fn find_user(_: Request) -> Response { Response::text("") }
    /// # async fn list_users(_: Request) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::Get, "/users",           list_users)
    ///     .on(Method::Get, "/users/find/{id}", find_user);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for `method`. Routes are fixed at startup.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, Arc::new(handler) as BoxedHandler)
            .unwrap_or_else(|e| panic!("invalid route `{method} {path}`: {e}"));
        self
    }

    /// Require every parameter called `name`, on every route, to satisfy `guard`.
    pub fn guard(mut self, name: &str, guard: ParamGuard) -> Self {
        self.guards.insert(name.to_owned(), guard);
        self
    }

    pub(crate) fn lookup(
        &self,
        method: Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(&method)?;
        let matched = tree.at(path).ok()?;
        let mut params = HashMap::new();
        for (k, v) in matched.params.iter() {
            if let Some(guard) = self.guards.get(k) {
                if !guard(v) {
                    return None;
                }
            }
            params.insert(k.to_owned(), v.to_owned());
        }
        Some((Arc::clone(matched.value), params))
    }

    /// Routes one request and produces one response.
    ///
    /// `path` is matched as received, still percent-encoded.
    pub async fn dispatch(&self, method: &http::Method, path: &str, body: Bytes) -> Response {
        let Ok(method) = Method::try_from(method) else {
            return Response::status(Status::NotFound);
        };
        match self.lookup(method, path) {
            Some((handler, params)) => handler.call(Request::new(body, params)).await,
            None => Response::status(Status::NotFound),
        }
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn echo_id(req: Request) -> Response {
        Response::text(req.param("id").unwrap_or_default().to_owned())
    }

    fn digits_only(s: &str) -> bool {
        s.bytes().all(|b| b.is_ascii_digit())
    }

    fn router() -> Router {
        Router::new()
            .on(Method::Get, "/items/{id}", echo_id)
            .guard("id", digits_only)
    }

    #[tokio::test]
    async fn extracts_guarded_param() {
        let res = router().dispatch(&http::Method::GET, "/items/42", Bytes::new()).await;
        assert_eq!(res.status_code(), Status::Ok);
        assert_eq!(res.body(), b"42");
    }

    #[tokio::test]
    async fn failed_guard_is_not_found() {
        let res = router().dispatch(&http::Method::GET, "/items/4x2", Bytes::new()).await;
        assert_eq!(res.status_code(), Status::NotFound);
        assert!(res.body().is_empty());
    }

    #[tokio::test]
    async fn wrong_method_is_not_found() {
        let res = router().dispatch(&http::Method::POST, "/items/42", Bytes::new()).await;
        assert_eq!(res.status_code(), Status::NotFound);

        let purge = http::Method::from_bytes(b"PURGE").unwrap();
        let res = router().dispatch(&purge, "/items/42", Bytes::new()).await;
        assert_eq!(res.status_code(), Status::NotFound);
    }

    #[tokio::test]
    async fn unmatched_path_is_not_found() {
        for path in ["/items", "/items/", "/items/42/extra", "/other"] {
            let res = router().dispatch(&http::Method::GET, path, Bytes::new()).await;
            assert_eq!(res.status_code(), Status::NotFound, "{path}");
        }
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn conflicting_route_panics() {
        let _ = Router::new()
            .on(Method::Get, "/items/{id}", echo_id)
            .on(Method::Get, "/items/{key}", echo_id);
    }
}
