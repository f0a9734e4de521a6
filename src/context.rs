// src/context.rs

//! Request metadata handed to the engine by the dispatch layer

// dependencies
use http::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;

/// Stable name of a protected operation, e.g. `OrderService.create`.
///
/// Used as the base key segment when the config carries no `key_prefix`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationIdentity {
    owner: String,
    operation: String,
}

impl OperationIdentity {
    pub fn new(owner: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            operation: operation.into(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl fmt::Display for OperationIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.operation)
    }
}

/// What the transport and authentication layers know about a request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    headers: HeaderMap,
    peer_addr: Option<SocketAddr>,
    claims: Option<BTreeMap<String, Value>>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_headers(headers: HeaderMap) -> Self {
        Self {
            headers,
            ..Self::default()
        }
    }

    /// Builder-style: add a request header
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Builder-style: set the transport-level peer address
    pub fn with_peer_addr(mut self, addr: SocketAddr) -> Self {
        self.peer_addr = Some(addr);
        self
    }

    /// Builder-style: attach the claims of an authenticated principal
    pub fn with_claims(mut self, claims: BTreeMap<String, Value>) -> Self {
        self.claims = Some(claims);
        self
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    pub fn claims(&self) -> Option<&BTreeMap<String, Value>> {
        self.claims.as_ref()
    }

    // first header value that is valid visible ASCII
    pub(crate) fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
