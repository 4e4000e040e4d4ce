use crate::context::Context;
use crate::error::BoxError;
use crate::handler::{
    default_error_handler, ContextMaker, ErrorHandler, Handler, HttpHandler, PanicHandler,
};
use crate::params::Params;
use crate::response::ResponseWriter;
use crate::router::Endpoint;
use crate::Request;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Turns handlers into router endpoints that build the request context and
/// route errors and panics to the configured handlers.
pub(crate) struct Dispatcher {
    context_maker: Option<ContextMaker>,
    error_handler: ErrorHandler,
    panic_handler: Option<PanicHandler>,
}

impl Dispatcher {
    pub(crate) fn new(
        context_maker: Option<ContextMaker>,
        error_handler: Option<ErrorHandler>,
        panic_handler: Option<PanicHandler>,
    ) -> Self {
        Dispatcher {
            context_maker,
            error_handler: error_handler.unwrap_or_else(|| Arc::new(default_error_handler)),
            panic_handler,
        }
    }

    /// Wraps a context-aware handler.
    pub(crate) fn wrap(self: &Arc<Self>, handler: Handler) -> Endpoint {
        let dispatcher = Arc::clone(self);

        Arc::new(move |w: &mut ResponseWriter, req: &Request, params: Params| {
            trace!("dispatching {} {}", req.method(), req.uri().path());
            dispatcher.recover(w, req, |ctx, w| {
                dispatcher.run(&handler, ctx, w, req, params)
            });
        })
    }

    /// Wraps a plain handler. It gets panic recovery but bypasses the context maker.
    pub(crate) fn wrap_http(self: &Arc<Self>, handler: HttpHandler) -> Endpoint {
        let dispatcher = Arc::clone(self);

        Arc::new(move |w: &mut ResponseWriter, req: &Request, params: Params| {
            trace!("dispatching {} {}", req.method(), req.uri().path());
            dispatcher.recover(w, req, |ctx, w| {
                *ctx = ctx.with_params(params);
                handler(w, req);
            });
        })
    }

    // Runs `f` with the request's context slot. `ctx` lives outside the unwind
    // boundary so the panic handler sees whatever it held when the panic hit.
    fn recover<F>(&self, w: &mut ResponseWriter, req: &Request, f: F)
    where
        F: FnOnce(&mut Context, &mut ResponseWriter),
    {
        let mut ctx = Context::empty();

        let Some(panic_handler) = &self.panic_handler else {
            return f(&mut ctx, w);
        };

        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| f(&mut ctx, &mut *w))) {
            debug!(
                "recovered panic while serving {} {}",
                req.method(),
                req.uri().path()
            );
            panic_handler(&ctx, w, req, payload);
        }
    }

    fn run(
        &self,
        handler: &Handler,
        ctx: &mut Context,
        w: &mut ResponseWriter,
        req: &Request,
        params: Params,
    ) {
        match self.make_context(req) {
            Ok(base) => *ctx = base,
            Err(err) => return (self.error_handler)(ctx, w, req, err),
        }

        *ctx = ctx.with_params(params);

        if let Err(err) = handler(ctx, w, req) {
            (self.error_handler)(ctx, w, req, err);
        }
    }

    fn make_context(&self, req: &Request) -> Result<Context, BoxError> {
        match &self.context_maker {
            Some(make) => make(req),
            None => Ok(Context::empty()),
        }
    }
}
