//! Radix-tree route table.
//!
//! One tree per HTTP method, O(path-length) lookup. Groups write straight
//! into the parent table with their prefix applied, so there is nothing to
//! merge at startup.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;
use percent_encoding::percent_decode_str;
use tracing::debug;

use crate::handler::BoxedHandler;
use crate::method::Method;
use crate::router::{Router, join_path};

/// The application's routes. Build it once at startup, hand it to
/// [`HyperServer::new`](super::HyperServer::new).
pub struct RouteTable {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

/// Result of matching a request against the table.
pub(crate) enum Lookup {
    Found(BoxedHandler, HashMap<String, String>),
    /// The path exists, but not for this method.
    MethodNotAllowed(Vec<Method>),
    /// A path parameter did not percent-decode to UTF-8.
    MalformedParam(String),
    NotFound,
}

impl RouteTable {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// # Panics
    ///
    /// Panics if `path` is not a valid pattern or conflicts with a route
    /// already registered for `method`. Both are startup-time programming
    /// errors.
    fn insert(&mut self, method: Method, path: &str, handler: BoxedHandler) {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler)
            .unwrap_or_else(|e| panic!("invalid route `{method} {path}`: {e}"));
        debug!(%method, path, "route registered");
    }

    pub(crate) fn lookup(&self, method: Method, path: &str) -> Lookup {
        if let Some(matched) = self.routes.get(&method).and_then(|tree| tree.at(path).ok()) {
            let mut params = HashMap::new();
            for (name, raw) in matched.params.iter() {
                match percent_decode_str(raw).decode_utf8() {
                    Ok(value) => params.insert(name.to_owned(), value.into_owned()),
                    Err(_) => return Lookup::MalformedParam(name.to_owned()),
                };
            }
            return Lookup::Found(Arc::clone(matched.value), params);
        }

        let allowed = self.allowed(path);
        if allowed.is_empty() {
            return Lookup::NotFound;
        }
        Lookup::MethodNotAllowed(allowed)
    }

    /// Methods registered for `path`, sorted.
    pub(crate) fn allowed(&self, path: &str) -> Vec<Method> {
        let mut allowed: Vec<Method> = self.routes.iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(m, _)| *m)
            .collect();
        allowed.sort();
        allowed
    }
}

impl Default for RouteTable {
    fn default() -> Self { Self::new() }
}

impl Router for RouteTable {
    fn route(&mut self, method: Method, path: &str, handler: BoxedHandler) {
        self.insert(method, &join_path("", path), handler);
    }

    fn group(&mut self, prefix: &str) -> Box<dyn Router + '_> {
        Box::new(Group { table: self, prefix: join_path("", prefix) })
    }
}

/// A prefixed view onto a [`RouteTable`].
struct Group<'a> {
    table: &'a mut RouteTable,
    prefix: String,
}

impl Router for Group<'_> {
    fn route(&mut self, method: Method, path: &str, handler: BoxedHandler) {
        self.table.insert(method, &join_path(&self.prefix, path), handler);
    }

    fn group(&mut self, prefix: &str) -> Box<dyn Router + '_> {
        Box::new(Group { table: &mut *self.table, prefix: join_path(&self.prefix, prefix) })
    }
}
