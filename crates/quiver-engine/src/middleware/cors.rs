//! CORS response-header middleware.
//!
//! Decorates simple responses only; preflight never reaches the pipeline
//! because the dispatcher rejects non-GET/POST methods up front.

use futures_util::future::BoxFuture;
use http::header::{HeaderName, HeaderValue};

use crate::compose::{Middleware, Next};
use crate::context::Context;
use crate::error::PipelineError;

/// CORS policy configuration. The default allows any origin and exposes
/// nothing extra.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub origin: String,
    pub expose_headers: Vec<String>,
    pub credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origin: "*".to_string(),
            expose_headers: Vec::new(),
            credentials: false,
        }
    }
}

/// Sets `Access-Control-Allow-Origin` (plus `Vary: Origin` for non-wildcard
/// origins), exposed headers, and the credentials flag on every response.
#[derive(Default)]
pub struct Cors {
    config: CorsConfig,
}

impl Cors {
    pub fn new(config: CorsConfig) -> Self {
        Self { config }
    }
}

impl Middleware for Cors {
    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<(), PipelineError>> {
        Box::pin(async move {
            set_header(ctx, "access-control-allow-origin", &self.config.origin);
            if self.config.origin != "*" {
                set_header(ctx, "vary", "Origin");
            }
            if !self.config.expose_headers.is_empty() {
                set_header(
                    ctx,
                    "access-control-expose-headers",
                    &self.config.expose_headers.join(","),
                );
            }
            if self.config.credentials {
                set_header(ctx, "access-control-allow-credentials", "true");
            }
            next.run(ctx).await
        })
    }

    fn name(&self) -> &str {
        "cors"
    }
}

fn set_header(ctx: &mut Context, name: &'static str, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        ctx.http
            .headers
            .insert(HeaderName::from_static(name), value);
    }
}
