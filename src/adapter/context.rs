//! [`Context`] implementation over a buffered `http::Request`.

use std::collections::HashMap;
use std::io;

use bytes::Bytes;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use super::response::{Outcome, ResponseState};
use crate::context::{Context, TEXT_CONTENT_TYPE};
use crate::error::Error;
use crate::status::Status;

/// The context handed to handlers by [`HyperServer`](super::HyperServer).
pub struct RequestContext {
    request: http::Request<Bytes>,
    params: HashMap<String, String>,
    query: Vec<(String, String)>,
    token: CancellationToken,
    response: ResponseState,
}

impl RequestContext {
    pub(crate) fn new(
        request: http::Request<Bytes>,
        params: HashMap<String, String>,
        token: CancellationToken,
        sink: oneshot::Sender<Outcome>,
    ) -> Self {
        // A malformed query string reads as an empty one.
        let query = request
            .uri()
            .query()
            .and_then(|q| serde_urlencoded::from_str(q).ok())
            .unwrap_or_default();
        Self { request, params, query, token, response: ResponseState::new(sink) }
    }

    fn first_query(&self, name: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

impl Context for RequestContext {
    fn request(&self) -> &http::Request<Bytes> { &self.request }
    fn cancellation(&self) -> &CancellationToken { &self.token }

    fn param(&self, name: &str) -> &str {
        self.params.get(name).map_or("", String::as_str)
    }

    fn query(&self, name: &str) -> &str {
        self.first_query(name).unwrap_or("")
    }

    fn query_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.first_query(name).unwrap_or(default)
    }

    fn header(&self, name: &str) -> &str {
        self.request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    fn set_header(&mut self, name: &str, value: &str) -> Result<(), Error> {
        self.response.set_header(name, value)
    }

    fn string(&mut self, status: Status, body: &str) -> Result<(), Error> {
        self.response.commit(status, TEXT_CONTENT_TYPE, body.as_bytes().to_vec())
    }

    fn blob(&mut self, status: Status, content_type: &str, body: Vec<u8>) -> Result<(), Error> {
        self.response.commit(status, content_type, body)
    }

    fn status(&mut self, status: Status) {
        self.response.set_status(status);
    }

    fn writer(&mut self) -> &mut dyn io::Write {
        &mut self.response
    }
}
