//! Pending response state behind a [`RequestContext`](super::RequestContext).
//!
//! The response is built up in place (status, headers, body) and handed to
//! the dispatcher over a oneshot channel exactly once: either when a handler
//! commits it, or when the context is dropped without a commit. The channel
//! sender doubles as the "not yet committed" flag.

use std::io;
use std::mem;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use http_body_util::Full;
use tokio::sync::oneshot;

use crate::error::{Error, WriteError};
use crate::status::Status;

/// What the dispatcher receives once a request's context lets go.
pub(crate) struct Outcome {
    pub(crate) response: http::Response<Full<Bytes>>,
    /// `false` when the handler never wrote a body or committed explicitly.
    pub(crate) committed: bool,
}

pub(crate) struct ResponseState {
    status: Status,
    headers: HeaderMap,
    body: Vec<u8>,
    streamed: bool,
    sink: Option<oneshot::Sender<Outcome>>,
}

impl ResponseState {
    pub(crate) fn new(sink: oneshot::Sender<Outcome>) -> Self {
        Self {
            status: Status::Ok,
            headers: HeaderMap::new(),
            body: Vec::new(),
            streamed: false,
            sink: Some(sink),
        }
    }

    pub(crate) fn is_committed(&self) -> bool {
        self.streamed || self.sink.is_none()
    }

    pub(crate) fn set_status(&mut self, status: Status) {
        if self.is_committed() {
            tracing::debug!(%status, "status ignored, response already committed");
            return;
        }
        self.status = status;
    }

    pub(crate) fn set_header(&mut self, name: &str, value: &str) -> Result<(), Error> {
        if self.is_committed() {
            return Err(WriteError::Committed.into());
        }
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| Error::Header(format!("`{name}` is not a valid header name")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| Error::Header(format!("invalid value for `{name}`")))?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Finalises the response with `body` and sends it to the dispatcher.
    pub(crate) fn commit(&mut self, status: Status, content_type: &str, body: Vec<u8>) -> Result<(), Error> {
        if self.is_committed() {
            return Err(WriteError::Committed.into());
        }
        let content_type = HeaderValue::from_str(content_type)
            .map_err(|_| Error::Header(format!("`{content_type}` is not a valid content type")))?;
        self.headers.insert(CONTENT_TYPE, content_type);
        self.status = status;
        self.body = body;
        self.send(true)
    }

    fn send(&mut self, committed: bool) -> Result<(), Error> {
        let sink = self.sink.take().ok_or(WriteError::Committed)?;
        let mut response = http::Response::new(Full::new(Bytes::from(mem::take(&mut self.body))));
        *response.status_mut() = self.status.into();
        *response.headers_mut() = mem::take(&mut self.headers);
        sink.send(Outcome { response, committed })
            .map_err(|_| WriteError::Disconnected.into())
    }
}

/// Raw body sink. Bytes accumulate until the context is dropped.
impl io::Write for ResponseState {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.sink.is_none() {
            return Err(io::Error::other(WriteError::Committed));
        }
        self.streamed = true;
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ResponseState {
    fn drop(&mut self) {
        if self.sink.is_some() {
            // The dispatcher may already be gone (client disconnected).
            let _ = self.send(self.streamed);
        }
    }
}
