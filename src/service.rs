//! Serving a [`Mux`] with hyper.
//!
//! ```rust,no_run
//! use ctxmux::Mux;
//! use hyper::server::conn::http1;
//! use hyper_util::rt::TokioIo;
//! use tokio::net::TcpListener;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let mut mux = Mux::new();
//! mux.get("/", |_, w, _| {
//!     w.write_body("Hello, World!");
//!     Ok(())
//! })?;
//!
//! let service = mux.into_service();
//! let listener = TcpListener::bind(("127.0.0.1", 3000)).await?;
//! loop {
//!     let (tcp, _) = listener.accept().await?;
//!     let service = service.clone();
//!     tokio::task::spawn(async move {
//!         let _ = http1::Builder::new()
//!             .serve_connection(TokioIo::new(tcp), service)
//!             .await;
//!     });
//! }
//! # }
//! ```
use crate::error::BoxError;
use crate::mux::Mux;

use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::service::Service;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A hyper [`Service`] that buffers the request body and hands the request
/// to a shared [`Mux`].
#[derive(Clone)]
pub struct MuxService(Arc<Mux>);

impl MuxService {
    pub fn new(mux: Arc<Mux>) -> Self {
        MuxService(mux)
    }
}

impl From<Arc<Mux>> for MuxService {
    fn from(mux: Arc<Mux>) -> Self {
        MuxService(mux)
    }
}

impl<B> Service<http::Request<B>> for MuxService
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    type Response = http::Response<Full<Bytes>>;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        Box::pin(serve(Arc::clone(&self.0), req))
    }
}

async fn serve<B>(mux: Arc<Mux>, req: http::Request<B>) -> Result<http::Response<Full<Bytes>>, BoxError>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => return Err(err.into()),
    };

    let res = mux.serve(&http::Request::from_parts(parts, body));
    Ok(res.map(Full::new))
}

impl Mux {
    /// Converts the `Mux` into a hyper `Service`.
    pub fn into_service(self) -> MuxService {
        MuxService(Arc::new(self))
    }
}
