//! Handler living in an executable at a fixed location.
//!
//! The executable receives one JSON document on stdin,
//!
//! ```json
//! {"event": <event>, "context": {"functionName": "...", "requestId": "...", "startTime": 0}}
//! ```
//!
//! and answers by printing the result as JSON on stdout and exiting with
//! status 0. Any other exit status fails the invocation, with the
//! executable's stderr as the error message. `FUNCTION_NAME` and
//! `REQUEST_ID` are also set in its environment.

use crate::context::{Context, FUNCTION_NAME_VAR, REQUEST_ID_VAR};
use std::path::{Path, PathBuf};

/// Well-known location of the function handler
pub const DEFAULT_HANDLER_PATH: &str = "/function/function";

/// [`Handler`](crate::Handler) which runs an external executable for each
/// invocation
#[derive(Debug, Clone)]
pub struct ProcessHandler {
    path: PathBuf,
}

#[derive(serde::Serialize)]
struct Request<'a> {
    event: &'a serde_json::Value,
    context: &'a Context,
}

impl ProcessHandler {
    /// Creates a handler for the executable at `path`. The file is only
    /// checked by [`Handler::setup`](crate::Handler::setup).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the executable
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn check(&self) -> anyhow::Result<()> {
        use anyhow::{bail, Context as _};

        let metadata = match std::fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                bail!(missing_handler_message(&self.path))
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Unable to inspect {}", self.path.display()))
            }
        };
        if !metadata.is_file() {
            bail!("{} is not a regular file", self.path.display());
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            if metadata.permissions().mode() & 0o111 == 0 {
                bail!("{} is not executable", self.path.display());
            }
        }
        Ok(())
    }
}

fn missing_handler_message(path: &Path) -> String {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    match std::fs::read_dir(dir) {
        Ok(entries) => {
            let mut names: Vec<String> = entries
                .filter_map(Result::ok)
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            format!(
                "{} not found. Directory contents: [{}]",
                path.display(),
                names.join(", ")
            )
        }
        Err(_) => format!(
            "{} not found. Directory {} does not exist",
            path.display(),
            dir.display()
        ),
    }
}

#[async_trait::async_trait]
impl crate::Handler for ProcessHandler {
    async fn setup(&self) -> anyhow::Result<()> {
        self.check()?;
        log::debug!("Loaded handler from {}", self.path.display());
        Ok(())
    }

    async fn invoke(
        &self,
        event: serde_json::Value,
        context: &Context,
    ) -> anyhow::Result<serde_json::Value> {
        use anyhow::{bail, Context as _};
        use std::process::Stdio;
        use tokio::io::AsyncWriteExt;

        let request = serde_json::to_vec(&Request {
            event: &event,
            context,
        })
        .context("Unable to encode handler request")?;

        let mut child = tokio::process::Command::new(&self.path)
            .env(FUNCTION_NAME_VAR, &context.function_name)
            .env(REQUEST_ID_VAR, &context.request_id)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Unable to start {}", self.path.display()))?;
        log::debug!("Started handler process {:?}", child.id());

        let mut stdin = child.stdin.take().context("Handler stdin was not captured")?;
        let write = async move {
            stdin.write_all(&request).await?;
            stdin.shutdown().await
        };
        let (written, output) = futures::join!(write, child.wait_with_output());
        let output = output.context("Unable to wait for handler process")?;
        if let Err(e) = written {
            // A handler may exit without reading its input
            log::debug!("Unable to write request to handler: {}", e);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            bail!(
                "Handler process exited with {}: {}",
                output.status,
                stderr.trim_end()
            );
        }
        if !stderr.is_empty() {
            let mut our_stderr = tokio::io::stderr();
            our_stderr.write_all(&output.stderr).await?;
            our_stderr.flush().await?;
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();
        if stdout.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(stdout).context("Handler output is not valid JSON")
    }
}
