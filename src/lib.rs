//! This crate provides a shim which bridges a process boundary to a single
//! function handler. It reads one JSON event from stdin, optionally waits,
//! invokes the handler with the event and a [`Context`], and writes the JSON
//! result to stdout. Every failure is reported on stderr and ends the process
//! with exit code 1, so stdout only ever carries a successful result.
//!
//! # Handler in an executable
//!
//! The `invocation-shim` binary runs a [`ProcessHandler`] located at
//! `/function/function` (see [`Config`] for the available options):
//!
//! ```text
//! $ echo '{"name": "world"}' | FUNCTION_NAME=hello invocation-shim
//! {"message":"Hello, world!"}
//! ```
//!
//! # Handler in rust
//!
//! Any type implementing [`Handler`] can be used with [`exec`] or
//! [`exec_tokio`]:
//!
//! ```no_run
//! struct Greeter;
//!
//! #[async_trait::async_trait]
//! impl invocation_shim::Handler for Greeter {
//!     async fn invoke(
//!         &self,
//!         event: serde_json::Value,
//!         context: &invocation_shim::Context,
//!     ) -> anyhow::Result<serde_json::Value> {
//!         let name = event["name"].as_str().unwrap_or("Anonymous");
//!         Ok(serde_json::json!({
//!             "message": format!("Hello, {}!", name),
//!             "requestId": context.request_id,
//!         }))
//!     }
//! }
//!
//! pub fn main() {
//!     if let Err(err) = invocation_shim::exec_tokio(Greeter, Default::default()) {
//!         eprint!("{}", err.report());
//!         std::process::exit(err.exit_code());
//!     }
//! }
//! ```
//!
//! Closures can be used through [`handler_fn`] and [`sync_handler_fn`].
//!
//! # Artificial delay
//!
//! If the event is an object with a numeric `sleep` field, the shim waits for
//! that many seconds before invoking the handler. This is used to test
//! timeouts enforced by whoever runs the shim. The delay can be capped with
//! [`Options::max_sleep`]; by default it is unbounded.
//!
//! # Timeout handling
//!
//! The shim itself imposes no timeout unless [`Options::timeout`] is set. In
//! that case the handler call (not the artificial delay) fails with an
//! execution error once the deadline passes. As with any cooperative
//! deadline, a synchronous handler which never yields cannot be interrupted
//! before it returns.
//!

#![warn(
    absolute_paths_not_starting_with_crate,
    anonymous_parameters,
    deprecated_in_future,
    elided_lifetimes_in_paths,
    explicit_outlives_requirements,
    keyword_idents,
    macro_use_extern_crate,
    meta_variable_misuse,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    non_ascii_idents,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unsafe_code,
    unstable_features,
    unused_extern_crates,
    unused_import_braces,
    unused_lifetimes,
    unused_qualifications,
    unused_results,
    variant_size_differences
)]
#![warn(
    clippy::correctness,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cargo,
    clippy::nursery
)]
#![allow(clippy::multiple_crate_versions, clippy::future_not_send)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod config;
mod context;
mod error;
mod event;
mod handler;
mod process;
mod shim;

pub use config::{init_logging, Config};
pub use context::{Context, FUNCTION_NAME_VAR, REQUEST_ID_VAR};
pub use error::{Result, ShimError};
pub use event::{parse_event, requested_delay, SLEEP_FIELD};
pub use handler::{handler_fn, sync_handler_fn, HandlerFn, SyncHandlerFn};
pub use process::{ProcessHandler, DEFAULT_HANDLER_PATH};
pub use shim::{read_input, write_output, Options, Shim};

/// Business logic executed for one invocation.
///
/// A handler receives the decoded event and the [`Context`] of the
/// invocation and returns a JSON value which is written to stdout. Returning
/// an error (or panicking) fails the invocation.
#[async_trait::async_trait]
pub trait Handler: Send + Sync {
    /// Invoked once, after the event was decoded and right before
    /// [`Handler::invoke`]. Used to locate and load the handler. An error
    /// fails the invocation without calling [`Handler::invoke`].
    async fn setup(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Invoked with the event of the current invocation
    async fn invoke(
        &self,
        event: serde_json::Value,
        context: &Context,
    ) -> anyhow::Result<serde_json::Value>;
}

#[async_trait::async_trait]
impl<H: Handler + ?Sized> Handler for Box<H> {
    async fn setup(&self) -> anyhow::Result<()> {
        (**self).setup().await
    }

    async fn invoke(
        &self,
        event: serde_json::Value,
        context: &Context,
    ) -> anyhow::Result<serde_json::Value> {
        (**self).invoke(event, context).await
    }
}

/// Shim entrypoint. This function builds a current-thread tokio runtime and
/// executes [`exec`]. If you already have your own runtime, use the [`exec`]
/// function.
pub fn exec_tokio<H: Handler>(handler: H, options: Options) -> Result<()> {
    use anyhow::Context as _;
    use tokio::runtime::Builder;

    Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Unable to build tokio runtime")
        .map_err(ShimError::Unhandled)?
        .block_on(exec(handler, options))
}

/// Shim entrypoint. Runs one invocation on the process' stdin and stdout,
/// with a [`Context`] taken from the environment. Requires a running tokio
/// runtime; alternatively use [`exec_tokio`] which creates one.
pub async fn exec<H: Handler>(handler: H, options: Options) -> Result<()> {
    let context = Context::from_env();
    log::debug!("Starting shim with {:?}", options);
    Shim::new(handler, options)
        .run(context, tokio::io::stdin(), tokio::io::stdout())
        .await
}

/// `TestData` which can be used to run invocations locally in combination
/// with [`exec_test`].
///
/// ```json
/// {
///     "functionName": "hello",
///     "requestId": "exec-1",
///     "invocations": [{"name": "world"}, {"sleep": 0.1}]
/// }
/// ```
#[derive(serde::Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TestData {
    function_name: Option<String>,
    request_id: Option<String>,
    invocations: Vec<serde_json::Value>,
}

/// Local entrypoint. Runs every invocation of `test_data` (see [`TestData`])
/// through the complete shim flow, as if each event was given on stdin, and
/// returns what would have been written to stdout, in order.
///
/// Stops at the first failing invocation.
pub fn exec_test<H: Handler>(
    test_data: &str,
    handler: H,
    options: Options,
) -> anyhow::Result<Vec<String>> {
    use anyhow::Context as _;
    use tokio::runtime::Builder;

    let test_data: TestData =
        serde_json::from_str(test_data).context("Unable to deserialize test_data")?;
    log::info!("Creating tokio runtime");
    Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Unable to build tokio runtime")?
        .block_on(async {
            let shim = Shim::new(handler, options);
            let mut outputs = Vec::with_capacity(test_data.invocations.len());
            for (i, event) in test_data.invocations.iter().enumerate() {
                log::info!("Invocation: {}", i);
                let input = serde_json::to_vec(event).context("Unable to serialize event")?;
                let context = Context::from_lookup(|key| match key {
                    FUNCTION_NAME_VAR => test_data.function_name.clone(),
                    REQUEST_ID_VAR => test_data.request_id.clone(),
                    _ => None,
                });
                let mut output = Vec::new();
                shim.run(context, input.as_slice(), &mut output)
                    .await
                    .with_context(|| format!("Invocation {} failed", i))?;
                outputs.push(String::from_utf8(output).context("Output is not UTF-8")?);
            }
            Ok::<_, anyhow::Error>(outputs)
        })
}
