//! The registration surface and entry point.
//!
//! A [`Mux`] binds handlers to methods and route patterns. Every handler runs
//! through the same pipeline: the base context is built (by the configured
//! context maker, or empty), the route's path parameters are added to it, and
//! the handler is called with the result. Errors from the context maker or the
//! handler go to the error handler; panics go to the panic handler, if one is
//! configured, and otherwise propagate to the caller of [`Mux::serve`].
//!
//! ```rust
//! use ctxmux::Mux;
//! use std::io::Write;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut mux = Mux::builder()
//!     .error_handler(|_ctx, w, _req, err| {
//!         w.error(http::StatusCode::BAD_REQUEST, &err.to_string());
//!     })
//!     .build()?;
//!
//! mux.get("/items/:id", |ctx, w, _req| {
//!     let id = ctx.params().get("id").ok_or("missing id")?;
//!     write!(w, "{}", id)?;
//!     Ok(())
//! })?;
//!
//! let req = http::Request::get("/items/42").body(Default::default())?;
//! let res = mux.serve(&req);
//! assert_eq!(res.body().as_ref(), b"42");
//! # Ok(())
//! # }
//! ```
use crate::context::Context;
use crate::dispatch::Dispatcher;
use crate::error::{BoxError, Error};
use crate::handler::{
    http_handler, ContextMaker, ErrorHandler, Handler, HandlerResult, PanicHandler, PanicPayload,
};
use crate::response::{Response, ResponseWriter};
use crate::router::{Endpoint, Router, RouterAdapter};
use crate::Request;

use http::Method;

use std::fmt;
use std::sync::Arc;

/// Mux configuration. Fixed once the mux is built.
#[derive(Clone)]
pub struct Config {
    /// Creates the base context for each request. If it returns an error the
    /// handler is skipped and the error goes to the error handler along with
    /// an empty context. Defaults to an empty context.
    pub context_maker: Option<ContextMaker>,
    /// Receives errors returned by handlers or by the context maker and writes
    /// the response. Defaults to [`default_error_handler`], which logs the
    /// error and replies with `500 Internal Server Error`.
    ///
    /// [`default_error_handler`]: crate::default_error_handler
    pub error_handler: Option<ErrorHandler>,
    /// Receives panics raised while the context maker or a handler runs. If
    /// unset, panics propagate to the caller of [`Mux::serve`].
    pub panic_handler: Option<PanicHandler>,
    /// Invoked, through the same pipeline as any other handler, for requests
    /// no route matches. Defaults to a plain `404 page not found`.
    pub not_found: Option<Handler>,
    /// Redirect with `301 Moved Permanently` when a route only exists with
    /// (without) a trailing slash.
    pub redirect_trailing_slash: bool,
    /// Answer with `405 Method Not Allowed` when the path matches routes of
    /// other methods only.
    pub handle_method_not_allowed: bool,
    /// Whether plain handlers mounted with [`Mux::handle_http`] run the full
    /// pipeline. If `false` they skip the context maker and only get panic
    /// recovery. Defaults to `true`.
    pub http_handlers_use_context: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            context_maker: None,
            error_handler: None,
            panic_handler: None,
            not_found: None,
            redirect_trailing_slash: false,
            handle_method_not_allowed: false,
            http_handlers_use_context: true,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("context_maker", &self.context_maker.is_some())
            .field("error_handler", &self.error_handler.is_some())
            .field("panic_handler", &self.panic_handler.is_some())
            .field("not_found", &self.not_found.is_some())
            .field("redirect_trailing_slash", &self.redirect_trailing_slash)
            .field("handle_method_not_allowed", &self.handle_method_not_allowed)
            .field("http_handlers_use_context", &self.http_handlers_use_context)
            .finish()
    }
}

/// Builds a [`Mux`], applying configuration steps in the order they are given.
///
/// The first step that fails is remembered and every later step is skipped;
/// [`build`](MuxBuilder::build) then returns that failure.
#[must_use]
pub struct MuxBuilder {
    config: Config,
    router: Option<Box<dyn RouterAdapter>>,
    error: Option<BoxError>,
}

impl MuxBuilder {
    fn new() -> Self {
        MuxBuilder {
            config: Config::default(),
            router: None,
            error: None,
        }
    }

    /// Applies a fallible configuration step.
    pub fn option<F, E>(mut self, option: F) -> Self
    where
        F: FnOnce(&mut Config) -> Result<(), E>,
        E: Into<BoxError>,
    {
        if self.error.is_none() {
            if let Err(err) = option(&mut self.config) {
                self.error = Some(err.into());
            }
        }
        self
    }

    fn set(mut self, f: impl FnOnce(&mut Config)) -> Self {
        if self.error.is_none() {
            f(&mut self.config);
        }
        self
    }

    pub fn context_maker<F>(self, maker: F) -> Self
    where
        F: Fn(&Request) -> Result<Context, BoxError> + Send + Sync + 'static,
    {
        self.set(|config| config.context_maker = Some(Arc::new(maker)))
    }

    pub fn error_handler<F>(self, handler: F) -> Self
    where
        F: Fn(&Context, &mut ResponseWriter, &Request, BoxError) + Send + Sync + 'static,
    {
        self.set(|config| config.error_handler = Some(Arc::new(handler)))
    }

    pub fn panic_handler<F>(self, handler: F) -> Self
    where
        F: Fn(&Context, &mut ResponseWriter, &Request, PanicPayload) + Send + Sync + 'static,
    {
        self.set(|config| config.panic_handler = Some(Arc::new(handler)))
    }

    pub fn not_found<H>(self, handler: H) -> Self
    where
        H: Fn(&Context, &mut ResponseWriter, &Request) -> HandlerResult + Send + Sync + 'static,
    {
        self.set(|config| config.not_found = Some(Arc::new(handler)))
    }

    pub fn redirect_trailing_slash(self, enabled: bool) -> Self {
        self.set(|config| config.redirect_trailing_slash = enabled)
    }

    pub fn handle_method_not_allowed(self, enabled: bool) -> Self {
        self.set(|config| config.handle_method_not_allowed = enabled)
    }

    pub fn http_handlers_use_context(self, enabled: bool) -> Self {
        self.set(|config| config.http_handlers_use_context = enabled)
    }

    /// Uses a custom router adapter instead of the default [`Router`].
    pub fn router(mut self, router: impl RouterAdapter + 'static) -> Self {
        if self.error.is_none() {
            self.router = Some(Box::new(router));
        }
        self
    }

    pub fn build(self) -> Result<Mux, Error> {
        if let Some(err) = self.error {
            return Err(Error::Config(err));
        }

        let router = self.router.unwrap_or_else(|| Box::new(Router::new()));
        Ok(Mux::from_parts(self.config, router))
    }
}

/// Dispatches requests to context-aware handlers.
///
/// Registration needs `&mut Mux`; serving only needs `&Mux`, so once set up a
/// mux can be shared between threads, typically behind an [`Arc`].
pub struct Mux {
    router: Box<dyn RouterAdapter>,
    dispatcher: Arc<Dispatcher>,
    http_handlers_use_context: bool,
}

impl Mux {
    /// Creates a mux with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn builder() -> MuxBuilder {
        MuxBuilder::new()
    }

    pub fn with_config(config: Config) -> Self {
        Self::from_parts(config, Box::new(Router::new()))
    }

    /// Creates a mux on top of a custom router adapter. The adapter's options
    /// are overwritten with the ones in `config`.
    pub fn with_router(config: Config, router: impl RouterAdapter + 'static) -> Self {
        Self::from_parts(config, Box::new(router))
    }

    fn from_parts(config: Config, mut router: Box<dyn RouterAdapter>) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(
            config.context_maker,
            config.error_handler,
            config.panic_handler,
        ));

        router.set_redirect_trailing_slash(config.redirect_trailing_slash);
        router.set_handle_method_not_allowed(config.handle_method_not_allowed);
        if let Some(handler) = config.not_found {
            router.set_not_found(dispatcher.wrap(handler));
        }

        Mux {
            router,
            dispatcher,
            http_handlers_use_context: config.http_handlers_use_context,
        }
    }

    /// Registers a handler for a method and route pattern.
    pub fn handle<H>(&mut self, method: Method, path: &str, handler: H) -> Result<(), Error>
    where
        H: Fn(&Context, &mut ResponseWriter, &Request) -> HandlerResult + Send + Sync + 'static,
    {
        let endpoint = self.dispatcher.wrap(Arc::new(handler));
        self.insert(method, path, endpoint)
    }

    /// Registers a plain handler. Whether it goes through the context maker
    /// is decided by [`Config::http_handlers_use_context`].
    pub fn handle_http<F>(&mut self, method: Method, path: &str, handler: F) -> Result<(), Error>
    where
        F: Fn(&mut ResponseWriter, &Request) + Send + Sync + 'static,
    {
        let endpoint = if self.http_handlers_use_context {
            self.dispatcher.wrap(Arc::new(http_handler(handler)))
        } else {
            self.dispatcher.wrap_http(Arc::new(handler))
        };
        self.insert(method, path, endpoint)
    }

    fn insert(&mut self, method: Method, path: &str, endpoint: Endpoint) -> Result<(), Error> {
        debug!("registering {} {}", method, path);
        self.router.insert(method, path, endpoint)
    }

    /// Register a handler for HEAD requests
    pub fn head<H>(&mut self, path: &str, handler: H) -> Result<(), Error>
    where
        H: Fn(&Context, &mut ResponseWriter, &Request) -> HandlerResult + Send + Sync + 'static,
    {
        self.handle(Method::HEAD, path, handler)
    }

    /// Register a handler for GET requests
    pub fn get<H>(&mut self, path: &str, handler: H) -> Result<(), Error>
    where
        H: Fn(&Context, &mut ResponseWriter, &Request) -> HandlerResult + Send + Sync + 'static,
    {
        self.handle(Method::GET, path, handler)
    }

    /// Register a handler for POST requests
    pub fn post<H>(&mut self, path: &str, handler: H) -> Result<(), Error>
    where
        H: Fn(&Context, &mut ResponseWriter, &Request) -> HandlerResult + Send + Sync + 'static,
    {
        self.handle(Method::POST, path, handler)
    }

    /// Register a handler for PUT requests
    pub fn put<H>(&mut self, path: &str, handler: H) -> Result<(), Error>
    where
        H: Fn(&Context, &mut ResponseWriter, &Request) -> HandlerResult + Send + Sync + 'static,
    {
        self.handle(Method::PUT, path, handler)
    }

    /// Register a handler for DELETE requests
    pub fn delete<H>(&mut self, path: &str, handler: H) -> Result<(), Error>
    where
        H: Fn(&Context, &mut ResponseWriter, &Request) -> HandlerResult + Send + Sync + 'static,
    {
        self.handle(Method::DELETE, path, handler)
    }

    /// Register a handler for PATCH requests
    pub fn patch<H>(&mut self, path: &str, handler: H) -> Result<(), Error>
    where
        H: Fn(&Context, &mut ResponseWriter, &Request) -> HandlerResult + Send + Sync + 'static,
    {
        self.handle(Method::PATCH, path, handler)
    }

    /// Register a handler for OPTIONS requests
    pub fn options<H>(&mut self, path: &str, handler: H) -> Result<(), Error>
    where
        H: Fn(&Context, &mut ResponseWriter, &Request) -> HandlerResult + Send + Sync + 'static,
    {
        self.handle(Method::OPTIONS, path, handler)
    }

    /// Serves a request, recording the response into `w`.
    pub fn serve_http(&self, w: &mut ResponseWriter, req: &Request) {
        self.router.serve(w, req);
    }

    /// Serves a request and returns the response the handlers wrote.
    pub fn serve(&self, req: &Request) -> Response {
        let mut w = ResponseWriter::new();
        self.serve_http(&mut w, req);
        w.into_response()
    }
}

impl Default for Mux {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Mux {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mux")
            .field("http_handlers_use_context", &self.http_handlers_use_context)
            .finish_non_exhaustive()
    }
}
