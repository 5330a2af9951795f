//! EC2 state transitions
//!
//! Instances are described first, each one gets a planned [`Transition`],
//! and only the actionable ids go out in a single start/stop call.

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::api::Ec2;
use super::types::{
    instances_from, state_changes, Instance, InstanceState, TargetState, Transition,
    TransitionItem, TransitionReport,
};
use crate::awscli::AwsRunner;
use crate::exec::{ExecError, Pause};
use crate::resource::ResourceId;

#[cfg(test)]
mod tests;

/// Error code EC2 returns for the whole call when any requested id is unknown
const NOT_FOUND_CODE: &str = "InvalidInstanceID.NotFound";

static INSTANCE_ID_IN_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"i-[0-9a-f]{8,17}").expect("static regex is valid"));

/// How `--wait` polls for the target state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub interval: Duration,
    pub max_polls: u32,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            max_polls: 40,
        }
    }
}

/// Decide what to do with an instance in `current` to reach `target`
pub fn plan_transition(current: InstanceState, target: TargetState) -> Transition {
    use InstanceState as S;

    match (target, current) {
        (TargetState::Running, S::Running | S::Pending) => Transition::AlreadyThere,
        (TargetState::Running, S::Stopped) => Transition::Start,
        (TargetState::Running, S::Stopping) => {
            Transition::Blocked("instance is stopping; start it once it has stopped".to_string())
        }
        (TargetState::Stopped, S::Stopped | S::Stopping) => Transition::AlreadyThere,
        (TargetState::Stopped, S::Running) => Transition::Stop,
        (TargetState::Stopped, S::Pending) => {
            Transition::Blocked("instance is pending; stop it once it is running".to_string())
        }
        (_, S::ShuttingDown | S::Terminated) => {
            Transition::Blocked(format!("instance is {current}"))
        }
        (_, S::Unknown) => Transition::Blocked("instance state is unknown".to_string()),
    }
}

/// Describe instances; empty `ids` means all of them
pub async fn describe<R: AwsRunner, P: Pause>(
    api: &Ec2<'_, R, P>,
    ids: &[ResourceId],
) -> Result<Vec<Instance>> {
    let payload = api
        .describe_instances(ids)
        .await
        .into_result()
        .context("Failed to describe instances")?;
    Ok(instances_from(&payload))
}

/// Ids named by a not-found error, limited to the ones that were requested
fn missing_ids(err: &ExecError, requested: &[ResourceId]) -> Vec<ResourceId> {
    if err.code() != NOT_FOUND_CODE {
        return Vec::new();
    }
    let text = err.to_string();
    let named: HashSet<&str> = INSTANCE_ID_IN_TEXT
        .find_iter(&text)
        .map(|m| m.as_str())
        .collect();
    requested
        .iter()
        .filter(|id| named.contains(id.as_str()))
        .cloned()
        .collect()
}

/// Describe `ids`, setting aside the ones EC2 reports as not found
///
/// Returns the described instances and the missing ids. Any other failure,
/// or a not-found error that names none of the requested ids, is returned.
pub async fn describe_found<R: AwsRunner, P: Pause>(
    api: &Ec2<'_, R, P>,
    ids: &[ResourceId],
) -> Result<(Vec<Instance>, Vec<ResourceId>)> {
    let mut remaining = ids.to_vec();
    let mut missing = Vec::new();

    while !remaining.is_empty() {
        let envelope = api.describe_instances(&remaining).await;
        let request_id = envelope.request_id().to_string();
        let err = match envelope.into_result() {
            Ok(payload) => return Ok((instances_from(&payload), missing)),
            Err(err) => err,
        };
        let gone = missing_ids(&err, &remaining);
        if gone.is_empty() {
            return Err(anyhow::Error::from(err).context("Failed to describe instances"));
        }

        warn!(%request_id, missing = gone.len(), "some instances do not exist");
        remaining.retain(|id| !gone.contains(id));
        missing.extend(gone);
    }

    Ok((Vec::new(), missing))
}

/// Drop repeated ids, keeping the first occurrence
fn unique(ids: &[ResourceId]) -> Vec<ResourceId> {
    let mut seen = HashSet::new();
    ids.iter().filter(|id| seen.insert(*id)).cloned().collect()
}

/// One planned item per requested id, in request order
pub fn plan(ids: &[ResourceId], instances: &[Instance], target: TargetState) -> Vec<TransitionItem> {
    let by_id: HashMap<&str, &Instance> = instances.iter().map(|i| (i.id.as_str(), i)).collect();

    ids.iter()
        .map(|id| match by_id.get(id.as_str()) {
            Some(instance) => TransitionItem {
                id: id.to_string(),
                name: instance.name.clone(),
                before: instance.state,
                transition: plan_transition(instance.state, target),
                after: None,
            },
            None => TransitionItem {
                id: id.to_string(),
                name: None,
                before: InstanceState::Unknown,
                transition: Transition::Blocked("instance not found".to_string()),
                after: None,
            },
        })
        .collect()
}

/// Move `ids` to `target`, optionally waiting until they get there
pub async fn change_state<R: AwsRunner, P: Pause>(
    api: &Ec2<'_, R, P>,
    ids: &[ResourceId],
    target: TargetState,
    force: bool,
    wait: Option<WaitPolicy>,
) -> Result<TransitionReport> {
    if ids.is_empty() {
        return Err(ExecError::InvalidParameter("at least one instance id is required".into()).into());
    }

    let ids = unique(ids);
    let (instances, missing) = describe_found(api, &ids).await?;
    if !missing.is_empty() {
        debug!(?missing, "planning missing instances as blocked");
    }
    let mut items = plan(&ids, &instances, target);

    let actionable: Vec<ResourceId> = ids
        .iter()
        .zip(&items)
        .filter(|(_, item)| item.transition.is_actionable())
        .map(|(id, _)| id.clone())
        .collect();

    let mut report = TransitionReport {
        target,
        items: Vec::new(),
        waited: false,
    };

    if actionable.is_empty() {
        info!(state = target.state().as_str(), "nothing to do");
        report.items = items;
        return Ok(report);
    }

    let payload = api
        .change_state(target, &actionable, force)
        .await
        .into_result()
        .with_context(|| format!("Failed to call {}", target.verb()))?;

    let changes: HashMap<String, InstanceState> =
        state_changes(&payload, target).into_iter().collect();
    for item in &mut items {
        item.after = changes.get(&item.id).copied();
    }

    if let Some(policy) = wait {
        if !api.client().is_dry_run() {
            let reached = wait_for(api, &actionable, target, policy).await?;
            for item in &mut items {
                if let Some(state) = reached.get(&item.id) {
                    item.after = Some(*state);
                }
            }
            report.waited = true;
        }
    }

    report.items = items;
    Ok(report)
}

/// Poll until every id is in the target state
pub async fn wait_for<R: AwsRunner, P: Pause>(
    api: &Ec2<'_, R, P>,
    ids: &[ResourceId],
    target: TargetState,
    policy: WaitPolicy,
) -> Result<HashMap<String, InstanceState>> {
    let goal = target.state();

    for poll in 1..=policy.max_polls {
        api.client().pause().pause(policy.interval).await;

        let instances = describe(api, ids).await?;
        let states: HashMap<String, InstanceState> =
            instances.into_iter().map(|i| (i.id, i.state)).collect();

        let pending: Vec<&ResourceId> = ids
            .iter()
            .filter(|id| states.get(id.as_str()) != Some(&goal))
            .collect();

        if pending.is_empty() {
            return Ok(states);
        }

        if let Some(id) = pending.iter().find(|id| {
            matches!(
                states.get(id.as_str()),
                Some(InstanceState::Terminated | InstanceState::ShuttingDown)
            )
        }) {
            anyhow::bail!("Instance {id} was terminated while waiting for {goal}");
        }

        debug!(poll, remaining = pending.len(), "waiting for {goal}");
    }

    anyhow::bail!(
        "Timed out waiting for instances to reach {goal} after {} polls",
        policy.max_polls
    )
}
