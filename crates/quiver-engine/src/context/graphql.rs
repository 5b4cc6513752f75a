//! Protocol facet — GraphQL request fields, parsed document, bound schema,
//! and per-resolver invocation state.

use std::sync::Arc;

use bytes::Bytes;
use graphql_parser::parse_query;
use graphql_parser::query::Document;
use http::Request;
use http::header::{CONTENT_TYPE, HeaderMap};
use serde_json::{Map, Value};

use quiver_protocol::{GraphQLPayload, PayloadError};

use crate::schema::{ExecutableSchema, RootType};

/// Execution info handed to a resolver — which field is being resolved,
/// under which root type and operation.
#[derive(Debug, Clone)]
pub struct ResolverInfo {
    pub field: String,
    pub alias: Option<String>,
    pub root_type: RootType,
    pub operation_name: Option<String>,
}

/// GraphQL-specific request state.
///
/// `document` is populated only when `query` parsed successfully; a syntax
/// failure leaves it `None` and is surfaced downstream as a client error,
/// never as a crash. `parent`, `args`, and `info` are written immediately
/// before each resolver invocation so a resolver sees its own call frame
/// through the context.
#[derive(Default)]
pub struct GraphqlContext {
    pub query: Option<String>,
    pub operation_name: Option<String>,
    pub variables: Option<Map<String, Value>>,
    pub extensions: Option<Map<String, Value>>,
    pub document: Option<Document<'static, String>>,
    pub schema: Option<Arc<ExecutableSchema>>,

    pub parent: Value,
    pub args: Map<String, Value>,
    pub info: Option<ResolverInfo>,
}

impl GraphqlContext {
    /// Populate the facet from the inbound request by content negotiation.
    ///
    /// - `application/graphql`: the body is the query text.
    /// - `application/json`: the body is a `GraphQLPayload` object.
    /// - `application/x-www-form-urlencoded`: key/value pairs with
    ///   `variables` JSON-encoded.
    /// - anything else: the query stays unset.
    ///
    /// A URL query string fills any fields the body left open (the GET
    /// path). Undecodable bodies are client errors; a query that fails
    /// GraphQL parsing is recorded with `document` left unset.
    pub fn read_request(&mut self, request: &Request<Bytes>) -> Result<(), PayloadError> {
        let mut payload = match content_type_essence(request.headers()).as_deref() {
            Some("application/graphql") => GraphQLPayload::from_graphql(request.body())?,
            Some("application/json") => GraphQLPayload::from_json(request.body())?,
            Some("application/x-www-form-urlencoded") => {
                GraphQLPayload::from_form(request.body())?
            }
            _ => GraphQLPayload::default(),
        };

        if let Some(raw) = request.uri().query() {
            payload.merge_missing(GraphQLPayload::from_query_string(raw)?);
        }

        self.query = payload.query;
        self.operation_name = payload.operation_name;
        self.variables = payload.variables;
        self.extensions = payload.extensions;

        if let Some(query) = &self.query {
            match parse_query::<String>(query) {
                Ok(document) => self.document = Some(document.into_static()),
                Err(err) => {
                    tracing::debug!(%err, "query text failed to parse");
                    self.document = None;
                }
            }
        }

        Ok(())
    }
}

/// The content type without parameters, lowercased
/// (`application/json; charset=utf-8` → `application/json`).
fn content_type_essence(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    Some(raw.split(';').next().unwrap_or(raw).trim().to_ascii_lowercase())
}
