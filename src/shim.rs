//! The invocation flow: read → parse → (delay) → setup → invoke → write.

use crate::context::Context;
use crate::error::{Result, ShimError};
use crate::event::{parse_event, requested_delay};
use crate::Handler;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Tunables of the invocation flow. The default imposes no limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Upper bound for the delay requested through `sleep`
    pub max_sleep: Option<Duration>,
    /// Deadline for the handler call, excluding the requested delay
    pub timeout: Option<Duration>,
}

/// Runs a single invocation of `H`
#[derive(Debug)]
pub struct Shim<H> {
    handler: H,
    options: Options,
}

impl<H: Handler> Shim<H> {
    /// Creates a shim around `handler`
    pub const fn new(handler: H, options: Options) -> Self {
        Self { handler, options }
    }

    /// Runs the whole invocation. `input` is consumed up to end-of-stream
    /// before parsing starts. `output` only receives data if the invocation
    /// succeeded.
    pub async fn run<R, W>(&self, context: Context, input: R, output: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let raw = read_input(input).await?;
        let event = parse_event(&raw)?;
        log::info!(
            "Received invocation {} of {}",
            context.request_id,
            context.function_name
        );

        if let Some(delay) = requested_delay(&event, self.options.max_sleep) {
            log::info!("Sleeping for {:?} before invocation", delay);
            tokio::time::sleep(delay).await;
        }

        let result = self.invoke(event, &context).await?;
        let payload = serde_json::to_string(&result)
            .map_err(|e| ShimError::Execution(anyhow::Error::new(e)))?;
        write_output(output, &payload).await?;
        log::info!("Completed invocation {}", context.request_id);
        Ok(())
    }

    async fn invoke(&self, event: serde_json::Value, context: &Context) -> Result<serde_json::Value> {
        use anyhow::{anyhow, Context as _};
        use futures::FutureExt;
        use std::panic::AssertUnwindSafe;

        self.handler
            .setup()
            .await
            .context("Error loading function")
            .map_err(ShimError::Execution)?;

        let mut call = AssertUnwindSafe(self.handler.invoke(event, context))
            .catch_unwind()
            .fuse();
        let res = if let Some(timeout) = self.options.timeout {
            let mut deadline = Box::pin(tokio::time::sleep(timeout).fuse());
            futures::select! {
                res = call => res,
                _ = deadline => Ok(Err(anyhow!(
                    "Function execution timed out after {:?}",
                    timeout
                ))),
            }
        } else {
            call.await
        };

        match res {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(err)) => {
                log::debug!("Handler failed: {:?}", err);
                Err(ShimError::Execution(err))
            }
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_owned())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic payload".to_owned());
                Err(ShimError::Execution(anyhow!("Handler panicked: {}", message)))
            }
        }
    }
}

/// Reads the whole input up to end-of-stream
pub async fn read_input<R: AsyncRead + Unpin>(mut input: R) -> Result<String> {
    use anyhow::Context as _;

    let mut raw = String::new();
    let _ = input
        .read_to_string(&mut raw)
        .await
        .context("Unable to read input as UTF-8 text")
        .map_err(ShimError::Parse)?;
    Ok(raw)
}

/// Writes the serialized result once, without trailing newline
pub async fn write_output<W: AsyncWrite + Unpin>(mut output: W, payload: &str) -> Result<()> {
    output.write_all(payload.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}
