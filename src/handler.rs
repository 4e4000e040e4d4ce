use crate::context::Context;
use crate::error::BoxError;
use crate::response::ResponseWriter;
use crate::Request;

use http::StatusCode;

use std::any::Any;
use std::sync::Arc;

/// What a handler returns. An `Err` is passed to the mux's error handler.
pub type HandlerResult = Result<(), BoxError>;

/// A context-aware request handler.
///
/// Any `Fn(&Context, &mut ResponseWriter, &Request) -> HandlerResult` that is
/// `Send + Sync + 'static` can be registered directly; this is the shared form
/// the mux keeps them in.
pub type Handler = Arc<dyn Fn(&Context, &mut ResponseWriter, &Request) -> HandlerResult + Send + Sync>;

/// Builds the base context for each request.
pub type ContextMaker = Arc<dyn Fn(&Request) -> Result<Context, BoxError> + Send + Sync>;

/// Invoked with errors returned by handlers or by the context maker.
/// Responsible for writing a response.
pub type ErrorHandler = Arc<dyn Fn(&Context, &mut ResponseWriter, &Request, BoxError) + Send + Sync>;

/// The value a panicking handler unwound with.
pub type PanicPayload = Box<dyn Any + Send + 'static>;

/// Invoked with panics raised during context creation or while the handler runs.
pub type PanicHandler = Arc<dyn Fn(&Context, &mut ResponseWriter, &Request, PanicPayload) + Send + Sync>;

/// A plain request handler that knows nothing about contexts or errors.
pub type HttpHandler = Arc<dyn Fn(&mut ResponseWriter, &Request) + Send + Sync>;

/// Adapts a plain handler into a context-aware one that ignores its context
/// and never fails.
///
/// ```rust
/// use ctxmux::{http_handler, Mux};
///
/// let mut mux = Mux::new();
/// mux.get("/health", http_handler(|w, _req| w.write_body("ok"))).unwrap();
/// ```
pub fn http_handler<F>(handler: F) -> impl Fn(&Context, &mut ResponseWriter, &Request) -> HandlerResult + Send + Sync + 'static
where
    F: Fn(&mut ResponseWriter, &Request) + Send + Sync + 'static,
{
    move |_: &Context, w: &mut ResponseWriter, req: &Request| -> HandlerResult {
        handler(w, req);
        Ok(())
    }
}

/// The error handler used when none is configured: logs the error and replies
/// with `500 Internal Server Error`.
pub fn default_error_handler(_: &Context, w: &mut ResponseWriter, req: &Request, err: BoxError) {
    error!("{} {}: {}", req.method(), req.uri().path(), err);
    w.error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error");
}

/// Returns a human readable message for a panic payload, if it carries one.
///
/// Panics raised with `panic!("..")` carry a `&'static str` or a `String`;
/// anything else yields `None`.
pub fn panic_message(payload: &PanicPayload) -> Option<&str> {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> Request {
        http::Request::get("/boom").body(Default::default()).unwrap()
    }

    #[test]
    fn http_handler_ignores_context() {
        let handler = http_handler(|w, req| w.write_body(req.uri().path()));

        let mut w = ResponseWriter::new();
        assert!(handler(&Context::empty(), &mut w, &request()).is_ok());
        assert_eq!(w.body(), b"/boom");
    }

    #[test]
    fn default_error_handler_replies_500() {
        let mut w = ResponseWriter::new();
        default_error_handler(&Context::empty(), &mut w, &request(), "boom".into());

        assert_eq!(w.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(w.body(), b"internal server error\n");
    }

    #[test]
    fn panic_messages() {
        let payload: PanicPayload = Box::new("static");
        assert_eq!(panic_message(&payload), Some("static"));

        let payload: PanicPayload = Box::new(String::from("owned"));
        assert_eq!(panic_message(&payload), Some("owned"));

        let payload: PanicPayload = Box::new(42);
        assert_eq!(panic_message(&payload), None);
    }
}
