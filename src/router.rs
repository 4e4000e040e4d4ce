//! The router adapter: maps a method and path to an endpoint.
//!
//! The mux never matches paths itself. It hands wrapped handlers
//! ([`Endpoint`]s) to a [`RouterAdapter`] and asks it to serve each request.
//! The default adapter, [`Router`], keeps one [`matchit::Router`] per request
//! method.
//!
//! Route patterns can use httprouter style parameters as well as matchit's
//! native syntax:
//! ```text
//!  Syntax              Type
//!  :name  or {name}    named parameter
//!  *name  or {*name}   catch-all parameter
//! ```
//!
//! A named parameter may follow a static prefix within its segment, as in
//! `/user_:name`.
//!
//! Named parameters are dynamic path segments. They match anything until the
//! next '/' or the path end:
//! ```text
//!  Path: /blog/:category/:post
//!
//!  /blog/rust/request-routers            match: category="rust", post="request-routers"
//!  /blog/rust/request-routers/           no match, but the router would redirect
//!  /blog/rust/                           no match
//! ```
//!
//! Catch-all parameters match anything until the path end and must be the
//! final path element. Literal braces in a pattern are written `{{` and `}}`.
//!
//! Requests are matched against their percent-decoded path, so parameter
//! values arrive decoded and a route like `/café` is reachable as
//! `/caf%C3%A9`. A path that does not decode to UTF-8 gets `400 Bad Request`.
use crate::error::Error;
use crate::params::Params;
use crate::response::ResponseWriter;
use crate::Request;

use http::header::{self, HeaderValue};
use http::{Method, StatusCode};
use percent_encoding::percent_decode_str;

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

/// A handler as stored in a router: it receives the parameters captured by the match.
pub type Endpoint = Arc<dyn Fn(&mut ResponseWriter, &Request, Params) + Send + Sync>;

/// The outcome of looking up a request in a [`RouterAdapter`].
pub enum Lookup<'r> {
    /// A route matched.
    Found {
        endpoint: &'r Endpoint,
        params: Params,
    },
    /// No route matched, but one exists with (without) a trailing slash.
    /// Holds the corrected path.
    Redirect(String),
    /// No route matched for this method, but these other methods would.
    MethodNotAllowed(Vec<Method>),
    /// Nothing matched. Holds the not-found endpoint, if one was configured.
    NotFound(Option<&'r Endpoint>),
}

/// The path matching capability the mux is built on.
pub trait RouterAdapter: Send + Sync {
    /// Registers an endpoint for a method and route pattern.
    fn insert(&mut self, method: Method, pattern: &str, endpoint: Endpoint) -> Result<(), Error>;

    /// Sets the endpoint invoked when no route matches.
    fn set_not_found(&mut self, endpoint: Endpoint);

    /// Enables automatic redirection if the current route can't be matched but a
    /// route for the path with (without) the trailing slash exists.
    fn set_redirect_trailing_slash(&mut self, enabled: bool);

    /// If enabled, a request that matches no route for its own method but does
    /// match for other methods is answered with `405 Method Not Allowed`.
    fn set_handle_method_not_allowed(&mut self, enabled: bool);

    /// Looks up the endpoint for a method and path.
    fn lookup(&self, method: &Method, path: &str) -> Lookup<'_>;

    /// Serves a request: calls the matched endpoint, or answers with a
    /// redirect, a `405`, the not-found endpoint or a plain `404`.
    ///
    /// The path is percent-decoded before the lookup. Redirects use
    /// `301 Moved Permanently` and keep the query string.
    fn serve(&self, w: &mut ResponseWriter, req: &Request) {
        let raw = req.uri().path();
        let path = match percent_decode_str(raw).decode_utf8() {
            Ok(path) => path,
            Err(err) => {
                debug!("rejecting {} {}: {}", req.method(), raw, err);
                w.error(StatusCode::BAD_REQUEST, "400 bad request");
                return;
            }
        };

        match self.lookup(req.method(), &path) {
            Lookup::Found { endpoint, params } => endpoint(w, req, params),
            Lookup::Redirect(fixed) => {
                // The location keeps the path encoded the way the client sent it.
                let fixed = match path {
                    Cow::Borrowed(_) => fixed,
                    Cow::Owned(_) => toggle_trailing_slash(raw),
                };
                let location = match req.uri().query() {
                    Some(query) => format!("{}?{}", fixed, query),
                    None => fixed,
                };
                debug!("redirecting {} {} to {}", req.method(), raw, location);
                w.redirect(&location, StatusCode::MOVED_PERMANENTLY);
            }
            Lookup::MethodNotAllowed(allowed) => {
                let allow = allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                if let Ok(value) = HeaderValue::from_str(&allow) {
                    w.headers_mut().insert(header::ALLOW, value);
                }
                w.error(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
            }
            Lookup::NotFound(Some(endpoint)) => endpoint(w, req, Params::new()),
            Lookup::NotFound(None) => w.error(StatusCode::NOT_FOUND, "404 page not found"),
        }
    }
}

/// The default [`RouterAdapter`], backed by one [`matchit::Router`] per method.
///
/// All options start disabled.
#[derive(Default)]
pub struct Router {
    trees: HashMap<Method, matchit::Router<Endpoint>>,
    not_found: Option<Endpoint>,
    redirect_trailing_slash: bool,
    handle_method_not_allowed: bool,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the methods, other than `method`, that have a route matching `path`.
    pub fn allowed(&self, method: &Method, path: &str) -> Vec<Method> {
        let mut allowed = self
            .trees
            .iter()
            .filter(|(m, tree)| *m != method && tree.at(path).is_ok())
            .map(|(m, _)| m.clone())
            .collect::<Vec<_>>();

        allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        allowed
    }
}

impl RouterAdapter for Router {
    fn insert(&mut self, method: Method, pattern: &str, endpoint: Endpoint) -> Result<(), Error> {
        if !pattern.starts_with('/') {
            return Err(Error::InvalidPattern {
                pattern: pattern.to_owned(),
            });
        }

        self.trees
            .entry(method.clone())
            .or_default()
            .insert(to_matchit_syntax(pattern), endpoint)
            .map_err(|source| Error::Insert {
                method,
                pattern: pattern.to_owned(),
                source,
            })
    }

    fn set_not_found(&mut self, endpoint: Endpoint) {
        self.not_found = Some(endpoint);
    }

    fn set_redirect_trailing_slash(&mut self, enabled: bool) {
        self.redirect_trailing_slash = enabled;
    }

    fn set_handle_method_not_allowed(&mut self, enabled: bool) {
        self.handle_method_not_allowed = enabled;
    }

    fn lookup(&self, method: &Method, path: &str) -> Lookup<'_> {
        if let Some(tree) = self.trees.get(method) {
            if let Ok(matched) = tree.at(path) {
                return Lookup::Found {
                    endpoint: matched.value,
                    params: matched.params.into(),
                };
            }

            if self.redirect_trailing_slash && *method != Method::CONNECT && path != "/" {
                let fixed = toggle_trailing_slash(path);
                if tree.at(&fixed).is_ok() {
                    return Lookup::Redirect(fixed);
                }
            }
        }

        if self.handle_method_not_allowed {
            let allowed = self.allowed(method, path);
            if !allowed.is_empty() {
                return Lookup::MethodNotAllowed(allowed);
            }
        }

        Lookup::NotFound(self.not_found.as_ref())
    }
}

fn toggle_trailing_slash(path: &str) -> String {
    match path.strip_suffix('/') {
        Some(stripped) => stripped.to_owned(),
        None => format!("{}/", path),
    }
}

// Rewrites `:name` and `*name` into matchit's `{name}` and `{*name}`.
// Segments already in matchit syntax are left alone.
fn to_matchit_syntax(pattern: &str) -> String {
    let mut route = String::with_capacity(pattern.len() + 4);

    for (i, segment) in pattern.split('/').enumerate() {
        if i > 0 {
            route.push('/');
        }

        if segment.contains('{') {
            route.push_str(segment);
        } else if let Some(name) = segment.strip_prefix('*') {
            route.push_str("{*");
            route.push_str(name);
            route.push('}');
        } else if let Some((prefix, name)) = segment.split_once(':') {
            route.push_str(prefix);
            route.push('{');
            route.push_str(name);
            route.push('}');
        } else {
            route.push_str(segment);
        }
    }

    route
}
