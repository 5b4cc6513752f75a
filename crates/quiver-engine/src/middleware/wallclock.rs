//! Wallclock timing middleware.

use std::time::Instant;

use futures_util::future::BoxFuture;
use http::header::{HeaderName, HeaderValue};

use crate::compose::{Middleware, Next};
use crate::context::Context;
use crate::error::PipelineError;

/// Response header carrying the downstream elapsed time in milliseconds.
pub const WALLCLOCK_HEADER: &str = "x-quiver-wallclock";

/// Stamps [`WALLCLOCK_HEADER`] with how long the rest of the pipeline took.
/// Register it first so the measurement covers every downstream stage.
pub struct Wallclock;

impl Middleware for Wallclock {
    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<(), PipelineError>> {
        Box::pin(async move {
            let started = Instant::now();
            next.run(ctx).await?;
            let elapsed = started.elapsed().as_millis().to_string();
            if let Ok(value) = HeaderValue::from_str(&elapsed) {
                ctx.http
                    .headers
                    .insert(HeaderName::from_static(WALLCLOCK_HEADER), value);
            }
            Ok(())
        })
    }

    fn name(&self) -> &str {
        "wallclock"
    }
}
