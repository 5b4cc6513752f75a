//! Environment facet — host-supplied bindings, lifecycle handle, and
//! runtime classification.
//!
//! Nothing here is probed: the runtime adapter declares its identity and
//! bindings explicitly when invoking the dispatcher.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::Value;

/// Which hosting runtime is executing the request, as declared by the
/// adapter. A closed set of known hosts plus `Unknown`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RuntimeKind {
    /// A native tokio process (the `quiver-axum` adapter).
    Native,
    /// Cloudflare's workerd.
    Workerd,
    /// A WASI-based serverless host.
    Wasi,
    #[default]
    Unknown,
}

impl RuntimeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Workerd => "workerd",
            Self::Wasi => "wasi",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable snapshot of host environment bindings, taken once at
/// dispatcher invocation.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    bindings: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style binding insertion, for use before the snapshot is
    /// shared with requests.
    pub fn bind(mut self, key: impl Into<String>, value: Value) -> Self {
        self.bindings.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.bindings.get(key)
    }
}

/// Host-provided execution lifecycle handle.
///
/// Lets middleware schedule background work that outlives the response and
/// ask the host to suppress exceptions; the engine itself never uses it to
/// interrupt an in-flight pipeline.
pub trait Lifecycle: Send + Sync {
    /// Keep `task` running after the response has been returned.
    fn wait_until(&self, task: BoxFuture<'static, ()>);

    /// Ask the host to pass the request through on an uncaught failure.
    fn pass_through_on_exception(&self) {}
}

/// Environment facet of the request context.
pub struct RuntimeContext {
    pub kind: RuntimeKind,
    env: Option<Arc<Environment>>,
    lifecycle: Option<Arc<dyn Lifecycle>>,
}

impl RuntimeContext {
    pub fn new(
        kind: RuntimeKind,
        env: Option<Arc<Environment>>,
        lifecycle: Option<Arc<dyn Lifecycle>>,
    ) -> Self {
        Self {
            kind,
            env,
            lifecycle,
        }
    }

    pub fn env(&self) -> Option<&Environment> {
        self.env.as_deref()
    }

    pub fn lifecycle(&self) -> Option<&Arc<dyn Lifecycle>> {
        self.lifecycle.as_ref()
    }

    /// Schedule background work on the host, if a lifecycle handle was
    /// supplied. A no-op otherwise.
    pub fn wait_until(&self, task: BoxFuture<'static, ()>) {
        if let Some(lifecycle) = &self.lifecycle {
            lifecycle.wait_until(task);
        }
    }
}
