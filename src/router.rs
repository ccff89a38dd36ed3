//! Route registration contract.
//!
//! Implementations provide two primitives, [`Router::route`] and
//! [`Router::group`]. The per-method shortcuts on [`RouterExt`] accept any
//! [`HandlerFunc`] and work on `dyn Router` too.

use crate::handler::{BoxedHandler, HandlerFunc};
use crate::method::Method;

/// Something routes can be registered on.
pub trait Router {
    /// Registers `handler` for `method` + `path`.
    ///
    /// Path parameters use `{name}` syntax and are read back with
    /// [`Context::param`](crate::Context::param).
    fn route(&mut self, method: Method, path: &str, handler: BoxedHandler);

    /// A router whose every registration is prefixed with `prefix`.
    ///
    /// ```rust
    /// # use switchyard::{BoxContext, Error, Router, RouterExt};
    /// # async fn list(_: BoxContext) -> Result<(), Error> { Ok(()) }
    /// fn mount(router: &mut dyn Router) {
    ///     let mut api = router.group("/api");
    ///     api.get("/users", list); // served at /api/users
    /// }
    /// ```
    fn group(&mut self, prefix: &str) -> Box<dyn Router + '_>;
}

/// Per-method registration shortcuts. Each returns `self` so calls chain.
pub trait RouterExt: Router {
    fn get(&mut self, path: &str, handler: impl HandlerFunc) -> &mut Self {
        self.route(Method::Get, path, handler.into_boxed_handler());
        self
    }

    fn post(&mut self, path: &str, handler: impl HandlerFunc) -> &mut Self {
        self.route(Method::Post, path, handler.into_boxed_handler());
        self
    }

    fn put(&mut self, path: &str, handler: impl HandlerFunc) -> &mut Self {
        self.route(Method::Put, path, handler.into_boxed_handler());
        self
    }

    fn delete(&mut self, path: &str, handler: impl HandlerFunc) -> &mut Self {
        self.route(Method::Delete, path, handler.into_boxed_handler());
        self
    }

    fn patch(&mut self, path: &str, handler: impl HandlerFunc) -> &mut Self {
        self.route(Method::Patch, path, handler.into_boxed_handler());
        self
    }
}

impl<R: Router + ?Sized> RouterExt for R {}

/// Joins a group prefix and a route path.
///
/// Exactly one slash separates the two; a trailing slash on `path` is kept
/// and an empty `path` yields the prefix itself.
///
/// ```rust
/// use switchyard::router::join_path;
///
/// assert_eq!(join_path("/api", "/users"), "/api/users");
/// assert_eq!(join_path("/api/", "users/"), "/api/users/");
/// assert_eq!(join_path("/api", ""), "/api");
/// ```
pub fn join_path(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let mut joined = String::with_capacity(prefix.len() + path.len() + 2);
    if !prefix.is_empty() && !prefix.starts_with('/') {
        joined.push('/');
    }
    joined.push_str(prefix);
    if !path.is_empty() {
        joined.push('/');
        joined.push_str(path.trim_start_matches('/'));
    }
    if joined.is_empty() {
        joined.push('/');
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::join_path;

    #[test]
    fn joins_with_single_slash() {
        assert_eq!(join_path("/api", "/users"), "/api/users");
        assert_eq!(join_path("/api/", "/users"), "/api/users");
        assert_eq!(join_path("api", "users"), "/api/users");
        assert_eq!(join_path("/api/v1", "/users/{id}"), "/api/v1/users/{id}");
    }

    #[test]
    fn keeps_trailing_slash_and_handles_empty_parts() {
        assert_eq!(join_path("/api", "/"), "/api/");
        assert_eq!(join_path("/api", ""), "/api");
        assert_eq!(join_path("", "/users"), "/users");
        assert_eq!(join_path("", ""), "/");
        assert_eq!(join_path("/", "/"), "/");
    }
}
