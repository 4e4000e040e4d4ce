use http::header::{self, HeaderMap, HeaderValue};
use http::StatusCode;
use hyper::body::Bytes;

use std::io;

/// The response type produced by [`Mux::serve`](crate::Mux::serve).
pub type Response = http::Response<Bytes>;

/// Records the response a handler writes.
///
/// The status is committed by the first call to [`write_header`] or the first
/// body write, whichever comes first; later status changes are ignored. This
/// means an error handler running after a handler has already written a body
/// cannot replace the status, only append to the body.
///
/// [`write_header`]: ResponseWriter::write_header
///
/// ```rust
/// use ctxmux::ResponseWriter;
/// use http::StatusCode;
///
/// let mut w = ResponseWriter::new();
/// w.write_body("hello");
/// w.write_header(StatusCode::NOT_FOUND);
///
/// assert_eq!(w.status(), StatusCode::OK);
/// assert_eq!(w.body(), b"hello");
/// ```
#[derive(Debug, Default)]
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    wrote_header: bool,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Sets the response status. Only the first call has any effect.
    pub fn write_header(&mut self, status: StatusCode) {
        if self.wrote_header {
            warn!(
                "superfluous write_header({}), status already committed as {}",
                status, self.status
            );
            return;
        }

        self.status = status;
        self.wrote_header = true;
    }

    /// Appends to the response body, committing a `200 OK` status if none was set.
    pub fn write_body(&mut self, data: impl AsRef<[u8]>) {
        if !self.wrote_header {
            self.write_header(StatusCode::OK);
        }
        self.body.extend_from_slice(data.as_ref());
    }

    /// Returns `true` once the status has been committed.
    pub fn written(&self) -> bool {
        self.wrote_header
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Replies with a plain text error message.
    pub fn error(&mut self, status: StatusCode, message: &str) {
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        self.headers.insert(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        );
        self.write_header(status);
        self.write_body(message);
        self.write_body("\n");
    }

    /// Replies with a redirect to `location`.
    ///
    /// A location that is not a valid header value is answered with
    /// `500 Internal Server Error` instead.
    pub fn redirect(&mut self, location: &str, status: StatusCode) {
        match HeaderValue::try_from(location) {
            Ok(value) => {
                self.headers.insert(header::LOCATION, value);
                self.write_header(status);
            }
            Err(err) => {
                error!("invalid redirect location {:?}: {}", location, err);
                self.error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error");
            }
        }
    }

    /// Consumes the writer, producing the recorded response.
    pub fn into_response(self) -> Response {
        let mut res = http::Response::new(Bytes::from(self.body));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

impl io::Write for ResponseWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_body(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_to_ok() {
        let w = ResponseWriter::new();
        assert!(!w.written());

        let res = w.into_response();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.body().is_empty());
    }

    #[test]
    fn first_status_wins() {
        let mut w = ResponseWriter::new();
        w.write_header(StatusCode::CREATED);
        w.write_header(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(w.status(), StatusCode::CREATED);
    }

    #[test]
    fn io_write_appends_body() {
        let mut w = ResponseWriter::new();
        write!(w, "id={}", 42).unwrap();
        assert_eq!(w.body(), b"id=42");
        assert!(w.written());
    }

    #[test]
    fn error_sets_plain_text() {
        let mut w = ResponseWriter::new();
        w.error(StatusCode::BAD_REQUEST, "bad request");

        let res = w.into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            res.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(res.body().as_ref(), b"bad request\n");
    }

    #[test]
    fn redirect_sets_location() {
        let mut w = ResponseWriter::new();
        w.redirect("/foo", StatusCode::MOVED_PERMANENTLY);

        assert_eq!(w.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(w.headers()[header::LOCATION], "/foo");
    }
}
