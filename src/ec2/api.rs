//! EC2 calls over the AWS CLI

use super::types::TargetState;
use crate::awscli::{AwsCall, AwsClient, AwsRunner};
use crate::exec::{Envelope, Pause};
use crate::resource::{ResourceId, ResourceType};

const SERVICE: &str = "ec2";

pub struct Ec2<'a, R, P> {
    client: &'a AwsClient<R, P>,
}

fn with_ids(call: AwsCall, ids: &[ResourceId]) -> AwsCall {
    if ids.is_empty() {
        return call;
    }
    call.arg("--instance-ids")
        .args(ids.iter().map(ResourceId::to_string))
}

impl<'a, R: AwsRunner, P: Pause> Ec2<'a, R, P> {
    pub fn new(client: &'a AwsClient<R, P>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &AwsClient<R, P> {
        self.client
    }

    /// Describe `ids`, or every instance when empty
    pub async fn describe_instances(&self, ids: &[ResourceId]) -> Envelope {
        let call = with_ids(AwsCall::new(SERVICE, "describe-instances"), ids);
        self.client
            .call(&call, ResourceType::Instance.as_str())
            .await
    }

    /// `start-instances` / `stop-instances` for all `ids` in one call
    pub async fn change_state(
        &self,
        target: TargetState,
        ids: &[ResourceId],
        force: bool,
    ) -> Envelope {
        let mut call = with_ids(AwsCall::new(SERVICE, target.verb()), ids);
        if force && target == TargetState::Stopped {
            call = call.arg("--force");
        }
        self.client
            .mutate(&call, ResourceType::Instance.as_str())
            .await
    }
}
