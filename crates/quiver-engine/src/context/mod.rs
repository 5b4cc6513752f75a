//! Per-request context — one instance per inbound request, threaded
//! mutably through every middleware stage and the terminal execute stage.
//!
//! Three facets plus a side channel:
//! - [`HttpContext`] — transport: the raw inbound request and the mutable
//!   outbound status, headers, and unserialized body.
//! - [`GraphqlContext`] — protocol: query text, parsed document, variables,
//!   the bound executable schema, and per-resolver invocation state.
//! - [`RuntimeContext`] — environment: host bindings snapshot, lifecycle
//!   handle, and the adapter-declared runtime classification.
//!
//! The side channel is an opaque key→value map for inter-middleware
//! communication, created lazily on first write and never cleared for the
//! lifetime of the request.

pub mod graphql;
pub mod http;
pub mod runtime;

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;

pub use graphql::{GraphqlContext, ResolverInfo};
pub use http::{HttpContext, ResponseFormat};
pub use runtime::{Environment, Lifecycle, RuntimeContext, RuntimeKind};

/// The unified per-request context.
pub struct Context {
    pub http: HttpContext,
    pub graphql: GraphqlContext,
    pub runtime: RuntimeContext,
    channel: Option<HashMap<String, Value>>,
}

impl Context {
    pub fn new(
        request: ::http::Request<Bytes>,
        env: Option<Arc<Environment>>,
        lifecycle: Option<Arc<dyn Lifecycle>>,
        kind: RuntimeKind,
    ) -> Self {
        Self {
            http: HttpContext::new(request),
            graphql: GraphqlContext::default(),
            runtime: RuntimeContext::new(kind, env, lifecycle),
            channel: None,
        }
    }

    /// Populate the protocol facet from the inbound request (content
    /// negotiation plus query-string fallback, then document parsing).
    pub fn read_request(&mut self) -> Result<(), quiver_protocol::PayloadError> {
        let Self { http, graphql, .. } = self;
        graphql.read_request(http.request())
    }

    /// Store a value in the side channel (created on first write).
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.channel
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
    }

    /// Read a value from the side channel.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.channel.as_ref()?.get(key)
    }

    /// Serialize the transport facet into the outbound response.
    pub fn into_response(self) -> ::http::Response<Bytes> {
        self.http.into_response()
    }
}
