//! Tests of the `invocation-shim` binary with shell script handlers.

#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Create a unique temp directory for test isolation.
fn temp_dir_unique(prefix: &str) -> PathBuf {
    use std::time::SystemTime;
    let d = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap();
    let dir = std::env::temp_dir().join(format!(
        "shim-cli-{prefix}-{}-{}-{}",
        std::process::id(),
        d.as_secs(),
        d.subsec_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Write an executable handler script and return its path.
fn write_handler(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("function");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

struct Outcome {
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

/// Run the shim binary with `input` on stdin and the given environment.
async fn run_shim(handler: &Path, input: &str, env: &[(&str, &str)]) -> Outcome {
    use tokio::io::AsyncWriteExt;

    let bin = env!("CARGO_BIN_EXE_invocation-shim");
    let mut command = tokio::process::Command::new(bin);
    command
        .env_remove("FUNCTION_NAME")
        .env_remove("REQUEST_ID")
        .env_remove("SHIM_MAX_SLEEP_SECS")
        .env_remove("SHIM_TIMEOUT_SECS")
        .env("HANDLER_PATH", handler)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for (key, value) in env {
        let _ = command.env(key, value);
    }
    let mut child = command.spawn().expect("failed to spawn invocation-shim");

    let mut stdin = child.stdin.take().unwrap();
    stdin.write_all(input.as_bytes()).await.unwrap();
    drop(stdin);

    let output = tokio::time::timeout(Duration::from_secs(30), child.wait_with_output())
        .await
        .expect("timeout waiting for shim exit")
        .expect("shim should have exited");
    Outcome {
        code: output.status.code(),
        stdout: String::from_utf8(output.stdout).unwrap(),
        stderr: String::from_utf8(output.stderr).unwrap(),
    }
}

const ECHO_EVENT: &str = r#"read -r request
printf '%s' "$request""#;

// ─────────────────────────────────────────────────────────────────────────────
// Success path
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_result_is_written_to_stdout() {
    let dir = temp_dir_unique("echo");
    let handler = write_handler(&dir, ECHO_EVENT);

    let outcome = run_shim(
        &handler,
        "  {\"name\": \"world\"}\n",
        &[("FUNCTION_NAME", "hello"), ("REQUEST_ID", "exec-7")],
    )
    .await;

    assert_eq!(outcome.code, Some(0), "stderr: {}", outcome.stderr);
    assert!(!outcome.stdout.ends_with('\n'));
    let result: serde_json::Value = serde_json::from_str(&outcome.stdout).unwrap();
    assert_eq!(result["event"], serde_json::json!({"name": "world"}));
    assert_eq!(result["context"]["functionName"], "hello");
    assert_eq!(result["context"]["requestId"], "exec-7");
    assert!(result["context"]["startTime"].is_u64());

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_context_defaults_to_unknown() {
    let dir = temp_dir_unique("defaults");
    let handler = write_handler(&dir, ECHO_EVENT);

    let outcome = run_shim(&handler, "{}", &[]).await;

    assert_eq!(outcome.code, Some(0), "stderr: {}", outcome.stderr);
    let result: serde_json::Value = serde_json::from_str(&outcome.stdout).unwrap();
    assert_eq!(result["context"]["functionName"], "unknown");
    assert_eq!(result["context"]["requestId"], "unknown");

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_identical_invocations_are_byte_identical() {
    let dir = temp_dir_unique("idempotent");
    let handler = write_handler(&dir, "cat > /dev/null\nprintf '{\"answer\": [4, 2]}'");

    let first = run_shim(&handler, "{\"q\": 1}", &[]).await;
    let second = run_shim(&handler, "{\"q\": 1}", &[]).await;

    assert_eq!(first.code, Some(0));
    assert_eq!(first.stdout, r#"{"answer":[4,2]}"#);
    assert_eq!(first.stdout, second.stdout);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_result_is_written_verbatim() {
    let dir = temp_dir_unique("verbatim");
    let handler = write_handler(
        &dir,
        "cat > /dev/null\nprintf '{\"zeta\":1,\"alpha\":12345678901234567890123,\"mid\":[2.5,{\"b\":1,\"a\":2}]}'",
    );

    let outcome = run_shim(&handler, "{}", &[]).await;

    assert_eq!(outcome.code, Some(0), "stderr: {}", outcome.stderr);
    assert_eq!(
        outcome.stdout,
        r#"{"zeta":1,"alpha":12345678901234567890123,"mid":[2.5,{"b":1,"a":2}]}"#
    );

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sleep_delays_output() {
    let dir = temp_dir_unique("sleep");
    let handler = write_handler(&dir, "cat > /dev/null\nprintf 'true'");

    let started = Instant::now();
    let outcome = run_shim(&handler, r#"{"sleep": 1}"#, &[]).await;

    assert_eq!(outcome.code, Some(0), "stderr: {}", outcome.stderr);
    assert_eq!(outcome.stdout, "true");
    assert!(started.elapsed() >= Duration::from_secs(1));

    let _ = std::fs::remove_dir_all(&dir);
}

// ─────────────────────────────────────────────────────────────────────────────
// Failure paths
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_malformed_input_exits_with_parse_error() {
    let dir = temp_dir_unique("malformed");
    let handler = write_handler(&dir, ECHO_EVENT);

    let outcome = run_shim(&handler, "not json", &[]).await;

    assert_eq!(outcome.code, Some(1));
    assert!(outcome.stdout.is_empty());
    assert!(
        outcome.stderr.contains("Error parsing input data"),
        "stderr: {}",
        outcome.stderr
    );

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_input_exits_with_parse_error() {
    let dir = temp_dir_unique("empty");
    let handler = write_handler(&dir, ECHO_EVENT);

    let outcome = run_shim(&handler, "", &[]).await;

    assert_eq!(outcome.code, Some(1));
    assert!(outcome.stdout.is_empty());
    assert!(outcome.stderr.contains("No input received from stdin"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failing_handler_exits_with_execution_error() {
    let dir = temp_dir_unique("throws");
    let handler = write_handler(
        &dir,
        "cat > /dev/null\necho 'ValueError: missing field name' >&2\nexit 1",
    );

    let outcome = run_shim(&handler, "{}", &[]).await;

    assert_eq!(outcome.code, Some(1));
    assert!(outcome.stdout.is_empty());
    assert!(outcome.stderr.contains("Error executing function"));
    assert!(outcome.stderr.contains("missing field name"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_handler_lists_directory() {
    let dir = temp_dir_unique("missing");
    std::fs::write(dir.join("function.js"), "").unwrap();

    let outcome = run_shim(&dir.join("function"), "{}", &[]).await;

    assert_eq!(outcome.code, Some(1));
    assert!(outcome.stdout.is_empty());
    assert!(outcome.stderr.contains("Error executing function: Error loading function"));
    assert!(outcome.stderr.contains("[function.js]"), "stderr: {}", outcome.stderr);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_timeout_fails_slow_handler() {
    let dir = temp_dir_unique("timeout");
    let handler = write_handler(&dir, "cat > /dev/null\nsleep 20\nprintf 'null'");

    let started = Instant::now();
    let outcome = run_shim(&handler, "{}", &[("SHIM_TIMEOUT_SECS", "0.5")]).await;

    assert_eq!(outcome.code, Some(1));
    assert!(outcome.stdout.is_empty());
    assert!(outcome.stderr.contains("timed out"), "stderr: {}", outcome.stderr);
    assert!(started.elapsed() < Duration::from_secs(20));

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_max_sleep_clamps_delay() {
    let dir = temp_dir_unique("clamp");
    let handler = write_handler(&dir, "cat > /dev/null\nprintf '1'");

    let started = Instant::now();
    let outcome = run_shim(&handler, r#"{"sleep": 60}"#, &[("SHIM_MAX_SLEEP_SECS", "0.2")]).await;

    assert_eq!(outcome.code, Some(0), "stderr: {}", outcome.stderr);
    assert_eq!(outcome.stdout, "1");
    assert!(started.elapsed() < Duration::from_secs(30));

    let _ = std::fs::remove_dir_all(&dir);
}
