use crate::error::{Result, ShimError};
use std::time::Duration;

/// Name of the event field which requests an artificial delay
pub const SLEEP_FIELD: &str = "sleep";

/// Decodes the raw input into an event. Surrounding whitespace is ignored.
pub fn parse_event(raw: &str) -> Result<serde_json::Value> {
    use anyhow::Context;

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ShimError::Parse(anyhow::anyhow!(
            "No input received from stdin"
        )));
    }
    serde_json::from_str(trimmed)
        .context("Input is not valid JSON")
        .map_err(ShimError::Parse)
}

/// Delay requested by the event through a numeric `sleep` field, in seconds.
///
/// Only JSON numbers count. Zero, negative and out of range values request no
/// delay. `max` clamps the returned duration.
pub fn requested_delay(event: &serde_json::Value, max: Option<Duration>) -> Option<Duration> {
    let secs = event.as_object()?.get(SLEEP_FIELD)?.as_f64()?;
    let delay = Duration::try_from_secs_f64(secs).ok()?;
    if delay.is_zero() {
        return None;
    }
    Some(max.map_or(delay, |max| delay.min(max)))
}
