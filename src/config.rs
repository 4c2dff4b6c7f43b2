use std::path::PathBuf;
use std::time::Duration;

/// Command line and environment configuration of the shim binary.
///
/// Every option has an environment variable so the shim can be configured
/// from a container image without changing its command.
#[derive(Debug, Clone, clap::Parser)]
#[command(
    name = "invocation-shim",
    version,
    about = "Reads a JSON event from stdin, invokes the function handler and writes its JSON result to stdout"
)]
pub struct Config {
    /// Location of the handler executable
    #[arg(long, env = "HANDLER_PATH", default_value = crate::process::DEFAULT_HANDLER_PATH)]
    pub handler_path: PathBuf,

    /// Upper bound for the delay requested through the event's `sleep` field
    #[arg(long = "max-sleep-secs", env = "SHIM_MAX_SLEEP_SECS", value_parser = parse_secs)]
    pub max_sleep: Option<Duration>,

    /// Fail the invocation if the handler does not complete in time
    #[arg(long = "timeout-secs", env = "SHIM_TIMEOUT_SECS", value_parser = parse_secs)]
    pub timeout: Option<Duration>,

    /// Log level of the diagnostics written to stderr
    #[arg(long, env = "SHIM_LOG", default_value = "warn", value_parser = parse_level)]
    pub log_level: log::LevelFilter,
}

impl Config {
    /// Options of the invocation flow
    pub const fn options(&self) -> crate::shim::Options {
        crate::shim::Options {
            max_sleep: self.max_sleep,
            timeout: self.timeout,
        }
    }
}

fn parse_secs(value: &str) -> Result<Duration, String> {
    let secs: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("`{value}` is not a number of seconds: {e}"))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("`{value}` is not a valid duration: {e}"))
}

fn parse_level(value: &str) -> Result<log::LevelFilter, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("`{value}` is not one of off, error, warn, info, debug, trace"))
}

/// Sets up the `log` backend. Records go to stderr so that stdout only
/// carries the handler result.
pub fn init_logging(level: log::LevelFilter) -> anyhow::Result<()> {
    use anyhow::Context;

    simple_logger::SimpleLogger::new()
        .with_level(level)
        .with_utc_timestamps()
        .init()
        .context("Unable to setup logging")
}
