//! Request and response payload shapes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{GraphQLError, PayloadError};

/// The GraphQL-over-HTTP request payload.
///
/// Decodable from a JSON body, a urlencoded form body, or a URL query
/// string. Every field is optional at this layer; deciding what a missing
/// `query` means is the dispatcher's business.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
}

/// Urlencoded carrier for [`GraphQLPayload`] — `variables` arrives as a
/// JSON-encoded string and unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
struct FormPayload {
    query: Option<String>,
    #[serde(rename = "operationName")]
    operation_name: Option<String>,
    variables: Option<String>,
}

impl GraphQLPayload {
    /// Decode an `application/json` body.
    pub fn from_json(body: &[u8]) -> Result<Self, PayloadError> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Decode an `application/graphql` body — the whole body is the query.
    pub fn from_graphql(body: &[u8]) -> Result<Self, PayloadError> {
        let query = std::str::from_utf8(body).map_err(|_| PayloadError::InvalidUtf8)?;
        Ok(Self {
            query: Some(query.to_string()),
            ..Self::default()
        })
    }

    /// Decode an `application/x-www-form-urlencoded` body.
    pub fn from_form(body: &[u8]) -> Result<Self, PayloadError> {
        let form: FormPayload = serde_urlencoded::from_bytes(body)?;
        Self::from_form_payload(form)
    }

    /// Decode a URL query string (`?query=...&variables=...`), the GET path.
    pub fn from_query_string(raw: &str) -> Result<Self, PayloadError> {
        let form: FormPayload = serde_urlencoded::from_str(raw)?;
        Self::from_form_payload(form)
    }

    fn from_form_payload(form: FormPayload) -> Result<Self, PayloadError> {
        let variables = match form.variables {
            Some(raw) => {
                Some(serde_json::from_str(&raw).map_err(PayloadError::InvalidVariables)?)
            }
            None => None,
        };
        Ok(Self {
            query: form.query,
            operation_name: form.operation_name,
            variables,
            extensions: None,
        })
    }

    /// Merge fields from `other` into any still-unset fields of `self`.
    /// Used to let a URL query string fill gaps the body left open.
    pub fn merge_missing(&mut self, other: GraphQLPayload) {
        if self.query.is_none() {
            self.query = other.query;
        }
        if self.operation_name.is_none() {
            self.operation_name = other.operation_name;
        }
        if self.variables.is_none() {
            self.variables = other.variables;
        }
        if self.extensions.is_none() {
            self.extensions = other.extensions;
        }
    }
}

/// The GraphQL-over-HTTP response payload: `{data, errors?}`.
///
/// `errors` is omitted from the wire when empty, so a clean result
/// serializes to exactly `{"data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsePayload {
    pub data: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQLError>,
}

impl ResponsePayload {
    pub fn data(data: Value) -> Self {
        Self {
            data,
            errors: Vec::new(),
        }
    }

    /// A failed result: `data` is null and `errors` holds a single entry.
    pub fn error(error: GraphQLError) -> Self {
        Self {
            data: Value::Null,
            errors: vec![error],
        }
    }

    pub fn is_error(&self) -> bool {
        !self.errors.is_empty()
    }
}
