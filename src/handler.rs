//! Adapters which turn plain closures into a [`Handler`](crate::Handler).
//!
//! ```no_run
//! use invocation_shim::{handler_fn, sync_handler_fn, Context};
//!
//! let async_handler = handler_fn(|event: serde_json::Value, context: Context| async move {
//!     Ok::<_, anyhow::Error>(serde_json::json!({ "event": event, "requestId": context.request_id }))
//! });
//!
//! let sync_handler = sync_handler_fn(|event: serde_json::Value, _context: &Context| {
//!     Ok(event)
//! });
//! # let _ = (async_handler, sync_handler);
//! ```

use crate::context::Context;
use std::future::Future;

/// Handler created by [`handler_fn`]
#[derive(Clone, Copy)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F> std::fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerFn").field("f", &"[...]").finish()
    }
}

/// Wraps an async closure receiving the event and an owned copy of the
/// context. The returned value must be serializable to JSON.
pub fn handler_fn<F, Fut, R>(f: F) -> HandlerFn<F>
where
    F: Fn(serde_json::Value, Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    R: serde::Serialize + Send + 'static,
{
    HandlerFn { f }
}

#[async_trait::async_trait]
impl<F, Fut, R> crate::Handler for HandlerFn<F>
where
    F: Fn(serde_json::Value, Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    R: serde::Serialize + Send + 'static,
{
    async fn invoke(
        &self,
        event: serde_json::Value,
        context: &Context,
    ) -> anyhow::Result<serde_json::Value> {
        let result = (self.f)(event, context.clone()).await?;
        to_json(&result)
    }
}

/// Handler created by [`sync_handler_fn`]
#[derive(Clone, Copy)]
pub struct SyncHandlerFn<F> {
    f: F,
}

impl<F> std::fmt::Debug for SyncHandlerFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncHandlerFn").field("f", &"[...]").finish()
    }
}

/// Wraps a synchronous closure. It runs on the shim's thread, so long
/// computations block the invocation (and its timeout) until they return.
pub fn sync_handler_fn<F, R>(f: F) -> SyncHandlerFn<F>
where
    F: Fn(serde_json::Value, &Context) -> anyhow::Result<R> + Send + Sync + 'static,
    R: serde::Serialize + Send + 'static,
{
    SyncHandlerFn { f }
}

#[async_trait::async_trait]
impl<F, R> crate::Handler for SyncHandlerFn<F>
where
    F: Fn(serde_json::Value, &Context) -> anyhow::Result<R> + Send + Sync + 'static,
    R: serde::Serialize + Send + 'static,
{
    async fn invoke(
        &self,
        event: serde_json::Value,
        context: &Context,
    ) -> anyhow::Result<serde_json::Value> {
        let result = (self.f)(event, context)?;
        to_json(&result)
    }
}

fn to_json<R: serde::Serialize>(result: &R) -> anyhow::Result<serde_json::Value> {
    use anyhow::Context as _;

    serde_json::to_value(result).context("Handler returned a value which is not JSON-serializable")
}
