//! Existence probe and create-or-update on top of the invoker
//!
//! The probe and the write are separate remote calls. Another actor may
//! create the resource in between; the create then fails with the remote
//! "already exists" error, which is returned to the caller unchanged.

use clap::ValueEnum;
use std::future::Future;
use tracing::debug;

use super::envelope::Envelope;
use crate::resource::{ResourceId, ResourceType};

/// Something that can describe a resource through the invoker
pub trait Describe {
    fn describe(
        &self,
        resource_type: ResourceType,
        id: &ResourceId,
    ) -> impl Future<Output = Envelope>;
}

/// Requested write mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum WriteOperation {
    Create,
    Update,
    #[default]
    Upsert,
}

/// Write that will actually be issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAction {
    Create,
    Update,
}

impl WriteOperation {
    /// Only upsert needs to know whether the resource exists
    pub fn needs_probe(&self) -> bool {
        matches!(self, WriteOperation::Upsert)
    }
}

/// Decide which write to issue
pub fn plan_write(operation: WriteOperation, exists: bool) -> WriteAction {
    match operation {
        WriteOperation::Create => WriteAction::Create,
        WriteOperation::Update => WriteAction::Update,
        WriteOperation::Upsert if exists => WriteAction::Update,
        WriteOperation::Upsert => WriteAction::Create,
    }
}

/// True when a describe call for the resource succeeds
pub async fn exists(
    describer: &impl Describe,
    resource_type: ResourceType,
    id: &ResourceId,
) -> bool {
    let envelope = describer.describe(resource_type, id).await;
    if let Ok(err) = envelope.error_detail() {
        debug!(%resource_type, %id, code = %err.code, "existence probe failed");
    }
    envelope.is_success()
}

/// Update the resource if it exists, otherwise create it
pub async fn upsert<C, CF, U, UF>(
    describer: &impl Describe,
    resource_type: ResourceType,
    id: &ResourceId,
    create: C,
    update: U,
) -> Envelope
where
    C: FnOnce() -> CF,
    CF: Future<Output = Envelope>,
    U: FnOnce() -> UF,
    UF: Future<Output = Envelope>,
{
    let found = exists(describer, resource_type, id).await;
    match plan_write(WriteOperation::Upsert, found) {
        WriteAction::Update => update().await,
        WriteAction::Create => create().await,
    }
}

/// Issue the write selected by `operation`, probing only for upsert
pub async fn write<C, CF, U, UF>(
    describer: &impl Describe,
    operation: WriteOperation,
    resource_type: ResourceType,
    id: &ResourceId,
    create: C,
    update: U,
) -> Envelope
where
    C: FnOnce() -> CF,
    CF: Future<Output = Envelope>,
    U: FnOnce() -> UF,
    UF: Future<Output = Envelope>,
{
    if operation.needs_probe() {
        return upsert(describer, resource_type, id, create, update).await;
    }
    match plan_write(operation, false) {
        WriteAction::Create => create().await,
        WriteAction::Update => update().await,
    }
}
