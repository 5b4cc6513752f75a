//! Onion-model middleware composition.
//!
//! A [`Pipeline`] is built from an ordered list of stages. Invoking it
//! dispatches stage 0; each stage receives the request [`Context`] and a
//! [`Next`] continuation that advances to the following stage (or, once the
//! list is exhausted, to a caller-supplied terminal [`Endpoint`]). Code a
//! stage runs after awaiting its continuation observes the effects of every
//! downstream stage — the onion ordering.
//!
//! The continuation may be invoked at most once per stage. The guard is a
//! high-water mark over the whole call tree, created fresh for every
//! pipeline invocation, so a later stage calling `Next::run` never resets
//! the check for an earlier one and concurrent invocations over independent
//! contexts cannot interfere.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use futures_util::future::BoxFuture;

use crate::context::Context;
use crate::error::PipelineError;

/// A middleware stage: `(context, proceed) -> outcome`.
///
/// A stage that completes without calling `next` short-circuits the rest of
/// the pipeline. A stage that matches on the result of `next.run` can
/// intercept and recover from downstream failures — this is how
/// cross-cutting concerns (timing, error translation) are written.
pub trait Middleware: Send + Sync {
    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<(), PipelineError>>;

    /// Stage name for diagnostics.
    fn name(&self) -> &str {
        "middleware"
    }
}

/// The final, non-middleware link of a pipeline.
pub trait Endpoint: Send + Sync {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<(), PipelineError>>;
}

/// Continuation handed to each stage — advances the pipeline to the next
/// stage when run.
pub struct Next<'a> {
    stack: &'a [Arc<dyn Middleware>],
    terminal: Option<&'a dyn Endpoint>,
    reached: &'a AtomicI64,
    index: usize,
}

impl Next<'_> {
    /// Run the remainder of the pipeline against `ctx`.
    ///
    /// Running the same continuation a second time fails with
    /// [`PipelineError::MultipleProceed`].
    pub async fn run(&self, ctx: &mut Context) -> Result<(), PipelineError> {
        dispatch(self.stack, self.terminal, self.reached, self.index, ctx).await
    }
}

impl Endpoint for Next<'_> {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<(), PipelineError>> {
        Box::pin(self.run(ctx))
    }
}

fn dispatch<'a>(
    stack: &'a [Arc<dyn Middleware>],
    terminal: Option<&'a dyn Endpoint>,
    reached: &'a AtomicI64,
    index: usize,
    ctx: &'a mut Context,
) -> BoxFuture<'a, Result<(), PipelineError>> {
    Box::pin(async move {
        let i = index as i64;
        if i <= reached.load(Ordering::Acquire) {
            return Err(PipelineError::MultipleProceed);
        }
        reached.store(i, Ordering::Release);

        match stack.get(index) {
            Some(stage) => {
                tracing::trace!(stage = stage.name(), index, "dispatching middleware");
                let next = Next {
                    stack,
                    terminal,
                    reached,
                    index: index + 1,
                };
                stage.handle(ctx, next).await
            }
            None => match terminal {
                Some(endpoint) => endpoint.call(ctx).await,
                None => Ok(()),
            },
        }
    })
}

/// An ordered middleware pipeline, invocable repeatedly and concurrently
/// against independent contexts.
#[derive(Clone)]
pub struct Pipeline {
    stages: Arc<[Arc<dyn Middleware>]>,
}

impl Pipeline {
    /// Compose an ordered list of stages into one invocable pipeline.
    pub fn new(stages: Vec<Arc<dyn Middleware>>) -> Self {
        Self {
            stages: stages.into(),
        }
    }

    /// Run the pipeline with no terminal stage.
    pub async fn run(&self, ctx: &mut Context) -> Result<(), PipelineError> {
        self.run_with(ctx, None).await
    }

    /// Run the pipeline; `terminal` runs as the final link once every stage
    /// has proceeded.
    ///
    /// Invocation state lives in this call alone — running the same pipeline
    /// twice (or concurrently) never shares the continuation guard.
    pub async fn run_with(
        &self,
        ctx: &mut Context,
        terminal: Option<&dyn Endpoint>,
    ) -> Result<(), PipelineError> {
        let reached = AtomicI64::new(-1);
        dispatch(&self.stages, terminal, &reached, 0, ctx).await
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// A pipeline nests inside another pipeline as a single stage. The outer
/// continuation becomes the inner pipeline's terminal, so every inner stage
/// completes, in order, before the outer pipeline proceeds past this slot.
impl Middleware for Pipeline {
    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<(), PipelineError>> {
        Box::pin(async move { self.run_with(ctx, Some(&next)).await })
    }

    fn name(&self) -> &str {
        "pipeline"
    }
}
