use thiserror::Error;

/// Failures which terminate a shim invocation.
///
/// Every variant is terminal: the diagnostic is written to stderr and the
/// process exits with [`ShimError::exit_code`]. Nothing is written to stdout.
#[derive(Error, Debug)]
pub enum ShimError {
    /// Input was absent or not valid JSON
    #[error(transparent)]
    Parse(anyhow::Error),

    /// Handler could not be loaded, failed, timed out or returned an
    /// unserializable value
    #[error(transparent)]
    Execution(anyhow::Error),

    /// Any other fault of the shim itself
    #[error(transparent)]
    Unhandled(anyhow::Error),
}

impl ShimError {
    /// Label used in the `Error <phase>: <message>` diagnostic
    pub const fn phase(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parsing input data",
            Self::Execution(_) => "executing function",
            Self::Unhandled(_) => "in entrypoint",
        }
    }

    /// Process exit code for this failure
    pub const fn exit_code(&self) -> i32 {
        1
    }

    /// Underlying error including its cause chain
    pub const fn source_error(&self) -> &anyhow::Error {
        match self {
            Self::Parse(e) | Self::Execution(e) | Self::Unhandled(e) => e,
        }
    }

    /// Renders the stderr diagnostic: `Error <phase>: <message>` followed by
    /// the cause chain, and a backtrace when `RUST_BACKTRACE` captured one.
    pub fn report(&self) -> String {
        format!(
            "Error {}: {}\n{:?}\n",
            self.phase(),
            self.source_error(),
            self.source_error()
        )
    }
}

impl From<std::io::Error> for ShimError {
    fn from(e: std::io::Error) -> Self {
        Self::Unhandled(e.into())
    }
}

/// Result type of the shim
pub type Result<T> = std::result::Result<T, ShimError>;
