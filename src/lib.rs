//! An opinionated HTTP mux built around a per-request [`Context`].
//!
//! Handlers have the signature
//!
//! ```text
//! Fn(&Context, &mut ResponseWriter, &Request) -> Result<(), BoxError>
//! ```
//!
//! The mux provides a hook to control context creation when a request
//! arrives, and adds the route's path parameters to that context before the
//! handler runs. An error returned by a handler is passed to the error
//! handler, which is responsible for sending a response and possibly logging
//! it. Panics are likewise handed to the panic handler.
//!
//! Path matching is delegated to a [`RouterAdapter`]; the default [`Router`]
//! is built on [`matchit`].
#![deny(clippy::all)]
#![forbid(unsafe_code)]

#[macro_use]
extern crate log;

mod context;
mod dispatch;
mod error;
mod handler;
mod mux;
mod params;
mod response;
pub mod router;
mod service;

pub use context::{Context, ContextKey};
pub use error::{BoxError, Error};
pub use handler::{
    default_error_handler, http_handler, panic_message, ContextMaker, ErrorHandler, Handler,
    HandlerResult, HttpHandler, PanicHandler, PanicPayload,
};
pub use mux::{Config, Mux, MuxBuilder};
pub use params::{Param, Params, ParamsIter};
pub use response::{Response, ResponseWriter};
pub use router::{Endpoint, Lookup, Router, RouterAdapter};
pub use service::MuxService;

/// The request type handlers receive: the body is fully buffered.
pub type Request = http::Request<hyper::body::Bytes>;
