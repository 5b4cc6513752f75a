//! Host lifecycle backed by the tokio runtime.

use futures_util::future::BoxFuture;
use quiver_engine::Lifecycle;

/// [`Lifecycle`] for a native tokio process — background work scheduled via
/// `wait_until` is simply spawned onto the runtime, which keeps it alive
/// after the response has been returned.
#[derive(Default)]
pub struct TokioLifecycle;

impl Lifecycle for TokioLifecycle {
    fn wait_until(&self, task: BoxFuture<'static, ()>) {
        tokio::spawn(task);
    }
}
