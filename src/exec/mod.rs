//! Normalized external-call executor
//!
//! - `envelope`: success/error result wrapper with correlation metadata
//! - `classify`: transient-failure detection
//! - `invoker`: retrying call runner producing envelopes
//! - `upsert`: existence probe and create-or-update helpers

mod classify;
mod envelope;
mod error;
mod invoker;
mod upsert;

pub use envelope::Envelope;
pub use error::ExecError;
pub use invoker::{Invoker, Pause, RawFailure, RawOutput, RawResult, RetryPolicy, TokioPause};
pub use upsert::{write, Describe, WriteOperation};
