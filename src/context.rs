//! Per-request context abstraction.
//!
//! A [`Context`] wraps one request/response pair. Adapters implement the
//! object-safe core; the generic serde helpers live on [`ContextExt`], which
//! every `Context` (including `dyn Context`) gets for free.
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use switchyard::{BoxContext, Context, ContextExt, Error, Status};
//!
//! #[derive(Deserialize, Serialize)]
//! struct NewUser { name: String }
//!
//! async fn create_user(mut ctx: BoxContext) -> Result<(), Error> {
//!     let user: NewUser = ctx.bind_json()?;
//!     ctx.set_header("location", &format!("/users/{}", user.name))?;
//!     ctx.json(Status::Created, &user)
//! }
//! ```

use std::io;

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::error::{BindError, Error, WriteError};
use crate::status::Status;

/// `Content-Type` written by [`ContextExt::json`].
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
/// `Content-Type` written by [`Context::string`].
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// The owned context a handler receives.
pub type BoxContext = Box<dyn Context>;

/// Uniform read/write surface over one request/response pair.
///
/// None of these operations suspend. A context belongs to exactly one
/// request; once that request is answered the adapter stops listening to it.
///
/// At most one of [`string`](Context::string), [`blob`](Context::blob) or
/// [`ContextExt::json`] commits the response. Any later attempt fails with
/// [`WriteError::Committed`] and leaves the committed status and body as they
/// were.
pub trait Context: Send {
    /// The underlying request, body already buffered.
    fn request(&self) -> &http::Request<Bytes>;

    /// Cancelled once the request is over, whether it completed or the server's
    /// shutdown deadline cut it short.
    fn cancellation(&self) -> &CancellationToken;

    /// Path parameter captured by the route pattern, `""` when absent.
    fn param(&self, name: &str) -> &str;

    /// First value of a query parameter, `""` when absent.
    fn query(&self, name: &str) -> &str;

    /// First value of a query parameter, `default` when the key is absent.
    /// A key present with an empty value yields `""`.
    fn query_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str;

    /// Request header value, `""` when absent or not valid UTF-8.
    fn header(&self, name: &str) -> &str;

    /// Sets a single-valued response header, replacing any previous value.
    fn set_header(&mut self, name: &str, value: &str) -> Result<(), Error>;

    /// Commits a `text/plain` response.
    fn string(&mut self, status: Status, body: &str) -> Result<(), Error>;

    /// Commits a response with an explicit content type.
    fn blob(&mut self, status: Status, content_type: &str, body: Vec<u8>) -> Result<(), Error>;

    /// Sets the status code without committing. Ignored once committed.
    fn status(&mut self, status: Status);

    /// Raw body sink. The first write commits the response with the current
    /// status and headers; writes after a commit fail.
    fn writer(&mut self) -> &mut dyn io::Write;
}

/// serde-powered helpers available on every [`Context`].
pub trait ContextExt: Context {
    /// Decodes the body strictly as JSON.
    ///
    /// The value is built fresh, so a malformed payload can never leave a
    /// half-written target behind.
    fn bind_json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_slice(self.request().body()).map_err(BindError::Json)?)
    }

    /// Decodes the request according to its method and `Content-Type`.
    ///
    /// | Request | Source |
    /// |---|---|
    /// | `GET` / `HEAD` | query string |
    /// | `application/json`, `*/*+json` | body as JSON |
    /// | `application/x-www-form-urlencoded` | body as form |
    ///
    /// Anything else fails with [`BindError::UnsupportedMediaType`].
    fn bind<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let req = self.request();
        if *req.method() == http::Method::GET || *req.method() == http::Method::HEAD {
            let query = req.uri().query().unwrap_or("");
            return Ok(serde_urlencoded::from_str(query).map_err(BindError::Form)?);
        }

        let content_type = self.header("content-type");
        let mime = content_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match mime.as_str() {
            "application/json" => self.bind_json(),
            m if m.ends_with("+json") => self.bind_json(),
            "application/x-www-form-urlencoded" => {
                Ok(serde_urlencoded::from_bytes(req.body()).map_err(BindError::Form)?)
            }
            _ => Err(BindError::UnsupportedMediaType(content_type.to_owned()).into()),
        }
    }

    /// Commits an `application/json` response.
    ///
    /// A value that fails to serialize is reported as
    /// [`WriteError::Serialize`] and nothing is committed.
    fn json<T: Serialize + ?Sized>(&mut self, status: Status, value: &T) -> Result<(), Error> {
        let body = serde_json::to_vec(value).map_err(WriteError::Serialize)?;
        self.blob(status, JSON_CONTENT_TYPE, body)
    }
}

impl<C: Context + ?Sized> ContextExt for C {}
