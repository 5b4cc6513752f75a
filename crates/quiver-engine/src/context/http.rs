//! Transport facet — inbound request handle and outbound response state.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use http::{Method, Request, Response, StatusCode, Uri};
use serde_json::Value;

/// How the accumulated body is serialized into the outbound response.
/// JSON is the default; middleware may opt into text or HTML.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseFormat {
    #[default]
    Json,
    Text,
    Html,
}

/// Transport-level request/response state.
///
/// `status` defaults to 200 if no stage ever sets it. Headers are
/// case-insensitively keyed by construction (`http::HeaderMap`). `body`
/// stays an unserialized `serde_json::Value` until the dispatcher turns the
/// facet into a response. `status_text` is advisory — HTTP/1.1 reason
/// phrases are not representable in `http` responses, but middleware and
/// logging may still read it.
pub struct HttpContext {
    request: Request<Bytes>,
    pub status: Option<StatusCode>,
    pub status_text: Option<String>,
    pub headers: HeaderMap,
    pub body: Value,
    pub format: ResponseFormat,
}

impl HttpContext {
    pub fn new(request: Request<Bytes>) -> Self {
        Self {
            request,
            status: None,
            status_text: None,
            headers: HeaderMap::new(),
            body: Value::Null,
            format: ResponseFormat::Json,
        }
    }

    /// The raw inbound request.
    pub fn request(&self) -> &Request<Bytes> {
        &self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn uri(&self) -> &Uri {
        self.request.uri()
    }

    /// Serialize into the outbound response using the selected format.
    pub fn into_response(self) -> Response<Bytes> {
        let status = self.status.unwrap_or(StatusCode::OK);

        let (content_type, body) = match self.format {
            ResponseFormat::Json => (
                "application/json",
                serde_json::to_vec(&self.body).unwrap_or_else(|_| b"null".to_vec()),
            ),
            ResponseFormat::Text => ("text/plain", body_text(&self.body).into_bytes()),
            ResponseFormat::Html => ("text/html", body_text(&self.body).into_bytes()),
        };

        // 204 and friends carry no body.
        let body = if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED {
            Bytes::new()
        } else {
            Bytes::from(body)
        };

        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = self.headers;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        response
    }
}

/// Text rendering of the body: strings verbatim, everything else as JSON.
fn body_text(body: &Value) -> String {
    match body {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
