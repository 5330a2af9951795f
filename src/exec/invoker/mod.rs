//! Retrying invoker
//!
//! Runs one remote call, retries transient failures with a constant delay,
//! and folds the outcome into an [`Envelope`].

use regex::Regex;
use serde_json::Value;
use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};

use super::classify::is_retryable;
use super::envelope::Envelope;


/// Code used when the raw failure carries no recognisable structure
pub const DEFAULT_ERROR_CODE: &str = "AWS_CLI_Error";

static CLI_ERROR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)An error occurred \(([^)]+)\) when calling the \S+ operation(?: \(reached max retries: \d+\))?: (.*)",
    )
    .expect("static regex is valid")
});

/// Output of a call that succeeded
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawOutput {
    pub stdout: String,
    pub request_id: Option<String>,
}

impl RawOutput {
    pub fn new(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            request_id: None,
        }
    }
}

/// Output of a call that failed
#[derive(Debug, Clone, PartialEq)]
pub struct RawFailure {
    pub text: String,
    pub exit_status: i32,
}

impl RawFailure {
    pub fn new(text: impl Into<String>, exit_status: i32) -> Self {
        Self {
            text: text.into(),
            exit_status,
        }
    }
}

pub type RawResult = Result<RawOutput, RawFailure>;

/// Attempt bound, delay between attempts and per-attempt timeout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Suspension between attempts
pub trait Pause {
    fn pause(&self, delay: Duration) -> impl Future<Output = ()>;
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

impl Pause for TokioPause {
    async fn pause(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Error code, message and request id recovered from a failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedError {
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

pub struct Invoker<P = TokioPause> {
    policy: RetryPolicy,
    pause: P,
}

impl Invoker<TokioPause> {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            pause: TokioPause,
        }
    }
}

impl<P: Pause> Invoker<P> {
    /// Create an invoker with a custom pause
    #[cfg(test)]
    pub fn with_pause(policy: RetryPolicy, pause: P) -> Self {
        Self { policy, pause }
    }

    pub fn pause_handle(&self) -> &P {
        &self.pause
    }

    /// Run `call` until it succeeds, fails permanently, or attempts run out
    pub async fn invoke<F, Fut>(&self, operation: &str, resource_type: &str, mut call: F) -> Envelope
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RawResult>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            debug!(operation, resource_type, attempt, "invoking");

            let failure = match call().await {
                Ok(output) => {
                    return success_envelope(operation, resource_type, output)
                        .with_attempts(attempt);
                }
                Err(failure) => failure,
            };

            let retryable = is_retryable(&failure.text, failure.exit_status);
            if retryable && attempt < max_attempts {
                warn!(
                    operation,
                    resource_type,
                    attempt,
                    max_attempts,
                    delay_secs = self.policy.delay.as_secs_f64(),
                    "transient failure, retrying: {}",
                    first_line(&failure.text)
                );
                self.pause.pause(self.policy.delay).await;
                attempt += 1;
                continue;
            }

            let parsed = parse_error(&failure.text, failure.exit_status);
            debug!(
                operation,
                resource_type,
                attempt,
                code = %parsed.code,
                retryable,
                "call failed"
            );

            let envelope = Envelope::error(
                operation,
                resource_type,
                parsed.code,
                parsed.message,
                parsed.request_id,
            )
            .with_attempts(attempt)
            .with_exit_status(failure.exit_status);

            return if retryable {
                envelope.with_retries_exhausted()
            } else {
                envelope
            };
        }
    }
}

fn success_envelope(operation: &str, resource_type: &str, output: RawOutput) -> Envelope {
    let payload = parse_payload(&output.stdout);
    let request_id = output.request_id.or_else(|| extract_request_id(&payload));
    Envelope::success(operation, resource_type, payload, request_id)
}

/// Parse call output as JSON; empty output is `null`, anything else a string
pub fn parse_payload(stdout: &str) -> Value {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

/// Find a request id in a response document
pub fn extract_request_id(payload: &Value) -> Option<String> {
    [
        payload.get("RequestId"),
        payload.pointer("/ResponseMetadata/RequestId"),
        payload.get("requestId"),
    ]
    .into_iter()
    .flatten()
    .find_map(|v| v.as_str())
    .map(str::to_string)
}

/// Recover a code and message from raw failure text
///
/// Structured `Error.Code`/`Error.Message` wins, then `__type`/`message`,
/// then the AWS CLI's own "An error occurred (Code)" line. Otherwise the
/// raw text becomes the message under [`DEFAULT_ERROR_CODE`].
pub fn parse_error(raw: &str, exit_status: i32) -> ParsedError {
    let trimmed = raw.trim();

    if let Ok(doc) = serde_json::from_str::<Value>(trimmed) {
        let request_id = extract_request_id(&doc);

        if let Some(code) = doc.pointer("/Error/Code").and_then(Value::as_str) {
            let message = doc
                .pointer("/Error/Message")
                .and_then(Value::as_str)
                .unwrap_or(code);
            return ParsedError {
                code: code.to_string(),
                message: message.to_string(),
                request_id,
            };
        }

        if let Some(kind) = doc.get("__type").and_then(Value::as_str) {
            let code = kind.rsplit('#').next().unwrap_or(kind);
            let message = doc
                .get("message")
                .or_else(|| doc.get("Message"))
                .and_then(Value::as_str)
                .unwrap_or(code);
            return ParsedError {
                code: code.to_string(),
                message: message.to_string(),
                request_id,
            };
        }
    }

    if let Some(caps) = CLI_ERROR.captures(trimmed) {
        return ParsedError {
            code: caps[1].to_string(),
            message: caps[2].trim().to_string(),
            request_id: None,
        };
    }

    let message = if trimmed.is_empty() {
        format!("command failed with exit status {exit_status}")
    } else {
        trimmed.to_string()
    };

    ParsedError {
        code: DEFAULT_ERROR_CODE.to_string(),
        message,
        request_id: None,
    }
}

fn first_line(text: &str) -> &str {
    text.trim().lines().next().unwrap_or_default()
}
