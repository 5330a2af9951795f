//! Result envelope: success-with-payload or failure-with-code

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

use super::error::ExecError;

/// Error code and message carried by a failed envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ErrorDetail {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Correlation data attached to every envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub request_id: String,
    pub operation: String,
    pub resource_type: String,
    pub timestamp: DateTime<Utc>,
    /// Attempts made before this result was produced
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_status: Option<i32>,
    /// Set when the failure was still transient on the last allowed attempt
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub retries_exhausted: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum Outcome {
    Success(Value),
    Failure(ErrorDetail),
}

/// Normalized result of one invocation (all of its attempts)
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    outcome: Outcome,
    meta: Metadata,
}

fn metadata(operation: &str, resource_type: &str, request_id: Option<String>) -> Metadata {
    Metadata {
        request_id: request_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        operation: operation.to_string(),
        resource_type: resource_type.to_string(),
        timestamp: Utc::now(),
        attempts: 1,
        exit_status: None,
        retries_exhausted: false,
    }
}

impl Envelope {
    /// Build a success envelope; a request id is generated when none is given
    pub fn success(
        operation: &str,
        resource_type: &str,
        payload: Value,
        request_id: Option<String>,
    ) -> Self {
        Self {
            outcome: Outcome::Success(payload),
            meta: metadata(operation, resource_type, request_id),
        }
    }

    /// Build an error envelope
    pub fn error(
        operation: &str,
        resource_type: &str,
        code: impl Into<String>,
        message: impl Into<String>,
        request_id: Option<String>,
    ) -> Self {
        Self {
            outcome: Outcome::Failure(ErrorDetail::new(code, message)),
            meta: metadata(operation, resource_type, request_id),
        }
    }

    pub(crate) fn with_attempts(mut self, attempts: u32) -> Self {
        self.meta.attempts = attempts;
        self
    }

    pub(crate) fn with_exit_status(mut self, status: i32) -> Self {
        self.meta.exit_status = Some(status);
        self
    }

    pub(crate) fn with_retries_exhausted(mut self) -> Self {
        self.meta.retries_exhausted = true;
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    /// Payload of a successful envelope
    pub fn payload(&self) -> Result<&Value, ExecError> {
        match &self.outcome {
            Outcome::Success(payload) => Ok(payload),
            Outcome::Failure(err) => Err(ExecError::InvalidState(format!(
                "{} on {} failed ({}); no payload",
                self.meta.operation, self.meta.resource_type, err.code
            ))),
        }
    }

    /// Error detail of a failed envelope
    pub fn error_detail(&self) -> Result<&ErrorDetail, ExecError> {
        match &self.outcome {
            Outcome::Failure(err) => Ok(err),
            Outcome::Success(_) => Err(ExecError::InvalidState(format!(
                "{} on {} succeeded; no error",
                self.meta.operation, self.meta.resource_type
            ))),
        }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.meta
    }

    pub fn request_id(&self) -> &str {
        &self.meta.request_id
    }

    /// Consume the envelope, turning failures into typed errors
    pub fn into_result(self) -> Result<Value, ExecError> {
        match self.outcome {
            Outcome::Success(payload) => Ok(payload),
            Outcome::Failure(err) if self.meta.retries_exhausted => {
                Err(ExecError::MaxRetriesExceeded {
                    attempts: self.meta.attempts,
                    code: err.code,
                    message: err.message,
                    exit_status: self.meta.exit_status,
                })
            }
            Outcome::Failure(err) => Err(ExecError::Remote {
                code: err.code,
                message: err.message,
            }),
        }
    }
}

#[derive(Serialize)]
struct Wire<'a> {
    success: bool,
    error_code: Option<&'a str>,
    error_message: Option<&'a str>,
    data: Option<&'a Value>,
    metadata: &'a Metadata,
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match &self.outcome {
            Outcome::Success(payload) => Wire {
                success: true,
                error_code: None,
                error_message: None,
                data: Some(payload),
                metadata: &self.meta,
            },
            Outcome::Failure(err) => Wire {
                success: false,
                error_code: Some(&err.code),
                error_message: Some(&err.message),
                data: None,
                metadata: &self.meta,
            },
        };
        wire.serialize(serializer)
    }
}
