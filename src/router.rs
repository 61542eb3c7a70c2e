//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup via [`matchit`]. Routes
//! are also kept as a flat list so a whole router can be mounted under a
//! path prefix — the `/todo` resource registers its operations against `/`
//! and `/{id}` and the application mounts it in one call.

use std::collections::HashMap;

use http::Method;
use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};

/// The application router.
///
/// Build it once at startup; pass it to
/// [`Server::serve`](crate::Server::serve). Every registration method
/// returns `self` so calls chain naturally.
pub struct Router {
    trees: HashMap<Method, MatchitRouter<BoxedHandler>>,
    routes: Vec<(Method, String, BoxedHandler)>,
}

impl Router {
    pub fn new() -> Self {
        Self { trees: HashMap::new(), routes: Vec::new() }
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.add(Method::GET, path, handler.into_boxed_handler())
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.add(Method::POST, path, handler.into_boxed_handler())
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.add(Method::PUT, path, handler.into_boxed_handler())
    }

    pub fn patch(self, path: &str, handler: impl Handler) -> Self {
        self.add(Method::PATCH, path, handler.into_boxed_handler())
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.add(Method::DELETE, path, handler.into_boxed_handler())
    }

    /// Mounts every route of `other` under `prefix`.
    ///
    /// A sub-route of `/` maps to the prefix itself: mounting a router with
    /// `GET /` and `PUT /{id}` under `/todo` yields `GET /todo` and
    /// `PUT /todo/{id}`.
    pub fn mount(mut self, prefix: &str, other: Router) -> Self {
        for (method, path, handler) in other.routes {
            let full = join_paths(prefix, &path);
            self = self.add(method, &full, handler);
        }
        self
    }

    fn add(mut self, method: Method, path: &str, handler: BoxedHandler) -> Self {
        self.trees
            .entry(method.clone())
            .or_default()
            .insert(path, handler.clone())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self.routes.push((method, path.to_owned(), handler));
        self
    }

    pub(crate) fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.trees.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = matched.value.clone();
        let params = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

fn join_paths(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    match path.trim_start_matches('/') {
        "" => prefix.to_owned(),
        rest => format!("{prefix}/{rest}"),
    }
}
