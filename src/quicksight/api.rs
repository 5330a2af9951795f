//! QuickSight calls over the AWS CLI

use serde_json::{Map, Value};

use super::types::Kind;
use crate::awscli::{AwsCall, AwsClient, AwsRunner, Scratch};
use crate::exec::{Describe, Envelope, ExecError, Pause};
use crate::resource::{ResourceId, ResourceType};

const SERVICE: &str = "quicksight";

/// Resolve the caller's account id
pub async fn account_id<R: AwsRunner, P: Pause>(
    client: &AwsClient<R, P>,
) -> Result<String, ExecError> {
    let payload = client
        .call(&AwsCall::new("sts", "get-caller-identity"), "account")
        .await
        .into_result()
        .map_err(|e| match e {
            ExecError::MaxRetriesExceeded { .. } => e,
            other => ExecError::Initialization(format!("could not resolve AWS account: {other}")),
        })?;

    payload
        .get("Account")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            ExecError::Initialization("get-caller-identity returned no Account".to_string())
        })
}

/// QuickSight API bound to one account
pub struct QuickSight<'a, R, P> {
    client: &'a AwsClient<R, P>,
    account_id: String,
}

impl<'a, R: AwsRunner, P: Pause> QuickSight<'a, R, P> {
    pub fn new(client: &'a AwsClient<R, P>, account_id: impl Into<String>) -> Self {
        Self {
            client,
            account_id: account_id.into(),
        }
    }

    /// Resolve the account through STS, then bind to it
    pub async fn connect(client: &'a AwsClient<R, P>) -> Result<Self, ExecError> {
        let account = account_id(client).await?;
        Ok(Self::new(client, account))
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    fn base(&self, verb: &str) -> AwsCall {
        AwsCall::new(SERVICE, verb).opt("--aws-account-id", self.account_id.as_str())
    }

    fn with_id(&self, verb: &str, kind: Kind, id: &ResourceId) -> AwsCall {
        self.base(verb).opt(&kind.id_flag(), id.as_str())
    }

    pub async fn list(&self, kind: Kind) -> Envelope {
        self.client
            .call(&self.base(kind.list_verb()), kind.resource_type().as_str())
            .await
    }

    pub async fn describe(&self, kind: Kind, id: &ResourceId) -> Envelope {
        let call = self.with_id(&kind.verb("describe"), kind, id);
        self.client.call(&call, kind.resource_type().as_str()).await
    }

    pub async fn describe_definition(&self, id: &ResourceId) -> Envelope {
        let call = self.with_id("describe-analysis-definition", Kind::Analyses, id);
        self.client
            .call(&call, ResourceType::Analysis.as_str())
            .await
    }

    pub async fn describe_permissions(&self, kind: Kind, id: &ResourceId) -> Envelope {
        let call = self.with_id(&kind.permissions_verb("describe"), kind, id);
        self.client.call(&call, kind.resource_type().as_str()).await
    }

    /// Write call with the request document passed via `--cli-input-json`
    async fn write_input(
        &self,
        verb: &str,
        kind: Kind,
        mut input: Map<String, Value>,
        scratch: &Scratch,
    ) -> Envelope {
        let resource_type = kind.resource_type().as_str();
        input.insert(
            "AwsAccountId".to_string(),
            Value::String(self.account_id.clone()),
        );

        let reference = match scratch.input_json(verb, &input) {
            Ok(reference) => reference,
            Err(e) => {
                return Envelope::error(verb, resource_type, "InvalidParameter", e.to_string(), None)
            }
        };

        let call = AwsCall::new(SERVICE, verb).opt("--cli-input-json", reference);
        self.client.mutate(&call, resource_type).await
    }

    pub async fn create(&self, kind: Kind, input: Map<String, Value>, scratch: &Scratch) -> Envelope {
        self.write_input(&kind.verb("create"), kind, input, scratch)
            .await
    }

    pub async fn update(&self, kind: Kind, input: Map<String, Value>, scratch: &Scratch) -> Envelope {
        self.write_input(&kind.verb("update"), kind, input, scratch)
            .await
    }

    pub async fn grant_permissions(
        &self,
        kind: Kind,
        id: &ResourceId,
        grants: Value,
        scratch: &Scratch,
    ) -> Envelope {
        let mut input = Map::new();
        input.insert(kind.id_field().to_string(), Value::String(id.to_string()));
        input.insert("GrantPermissions".to_string(), grants);
        self.write_input(&kind.permissions_verb("update"), kind, input, scratch)
            .await
    }

    pub async fn delete(&self, kind: Kind, id: &ResourceId) -> Envelope {
        let call = self.with_id(&kind.verb("delete"), kind, id);
        self.client.mutate(&call, kind.resource_type().as_str()).await
    }
}

impl<R: AwsRunner, P: Pause> Describe for QuickSight<'_, R, P> {
    async fn describe(&self, resource_type: ResourceType, id: &ResourceId) -> Envelope {
        let kind = match resource_type {
            ResourceType::Analysis => Kind::Analyses,
            ResourceType::Dataset => Kind::Datasets,
            ResourceType::Instance => {
                return Envelope::error(
                    "describe",
                    resource_type.as_str(),
                    "InvalidParameter",
                    "not a QuickSight resource",
                    None,
                )
            }
        };
        QuickSight::describe(self, kind, id).await
    }
}
