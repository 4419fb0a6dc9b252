//! HTTP request wrapper.

use bytes::Bytes;
use http::{Method, Uri};
use std::net::SocketAddr;

/// Buffered HTTP request.
#[derive(Debug)]
pub struct Request {
    method: Method,
    uri: Uri,
    body: Bytes,
    remote_addr: Option<SocketAddr>,
}

impl Request {
    pub fn new(method: Method, uri: Uri, body: Bytes) -> Self {
        Self {
            method,
            uri,
            body,
            remote_addr: None,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request path without trailing slashes (`/` stays `/`).
    pub fn path(&self) -> &str {
        let path = self.uri.path();
        match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        }
    }

    /// Parse body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    pub fn set_remote_addr(&mut self, addr: SocketAddr) {
        self.remote_addr = Some(addr);
    }
}
