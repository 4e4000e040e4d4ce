use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use ctxmux::{panic_message, Context, ContextKey, Mux};
use http::StatusCode;
use hyper::server::conn::http1::Builder as ConnectionBuilder;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

// Every request gets an id, made available to handlers through the context.
struct RequestId;

impl ContextKey for RequestId {
    type Value = u64;
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut mux = Mux::builder()
        .context_maker(|_req| {
            let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
            Ok(Context::empty().with_value::<RequestId>(id))
        })
        .error_handler(|ctx, w, _req, err| {
            let id = ctx.value::<RequestId>().copied().unwrap_or_default();
            println!("request {} failed: {}", id, err);
            w.error(StatusCode::BAD_REQUEST, &err.to_string());
        })
        .panic_handler(|ctx, w, _req, payload| {
            let id = ctx.value::<RequestId>().copied().unwrap_or_default();
            println!(
                "request {} panicked: {}",
                id,
                panic_message(&payload).unwrap_or("<unknown>")
            );
            w.error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error");
        })
        .redirect_trailing_slash(true)
        .build()?;

    // GET /
    mux.get("/", |_, w, _| {
        w.write_body("Hello, world!");
        Ok(())
    })?;

    // GET /items/:id
    mux.get("/items/:id", |ctx, w, _| {
        let id: u64 = ctx.params().get("id").unwrap_or_default().parse()?;
        let request = ctx.value::<RequestId>().copied().unwrap_or_default();
        write!(w, "item {} (request {})", id, request)?;
        Ok(())
    })?;

    // GET /panic
    mux.get("/panic", |_, _, _| panic!("handler panicked"))?;

    let service = mux.into_service();
    let listener = TcpListener::bind(("127.0.0.1", 3000)).await?;

    loop {
        let (tcp, _) = listener.accept().await?;
        let service = service.clone();
        tokio::task::spawn(async move {
            if let Err(err) = ConnectionBuilder::new()
                .serve_connection(TokioIo::new(tcp), service)
                .await
            {
                println!("Error serving connection: {:?}", err);
            }
        });
    }
}
