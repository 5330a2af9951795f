use super::*;
use crate::awscli::mock::{client, client_with, ScriptedRunner};
use crate::resource::ResourceType;
use serde_json::{json, Value};

const WEB: &str = "i-0123456789abcdef0";
const DB: &str = "i-0fedcba9876543210";

fn ids(raw: &[&str]) -> Vec<ResourceId> {
    let raw: Vec<String> = raw.iter().map(|s| s.to_string()).collect();
    ResourceId::parse_all(ResourceType::Instance, &raw).unwrap()
}

fn described(states: &[(&str, &str)]) -> Value {
    let instances: Vec<Value> = states
        .iter()
        .map(|(id, state)| json!({"InstanceId": id, "State": {"Name": state}}))
        .collect();
    json!({"Reservations": [{"Instances": instances}]})
}

fn fast_wait() -> WaitPolicy {
    WaitPolicy {
        interval: Duration::from_secs(15),
        max_polls: 3,
    }
}

#[test]
fn start_plans() {
    assert_eq!(
        plan_transition(InstanceState::Stopped, TargetState::Running),
        Transition::Start
    );
    assert_eq!(
        plan_transition(InstanceState::Running, TargetState::Running),
        Transition::AlreadyThere
    );
    assert_eq!(
        plan_transition(InstanceState::Pending, TargetState::Running),
        Transition::AlreadyThere
    );
    assert!(matches!(
        plan_transition(InstanceState::Stopping, TargetState::Running),
        Transition::Blocked(_)
    ));
    assert_eq!(
        plan_transition(InstanceState::Terminated, TargetState::Running),
        Transition::Blocked("instance is terminated".to_string())
    );
}

#[test]
fn stop_plans() {
    assert_eq!(
        plan_transition(InstanceState::Running, TargetState::Stopped),
        Transition::Stop
    );
    assert_eq!(
        plan_transition(InstanceState::Stopping, TargetState::Stopped),
        Transition::AlreadyThere
    );
    assert!(matches!(
        plan_transition(InstanceState::Pending, TargetState::Stopped),
        Transition::Blocked(_)
    ));
    assert_eq!(
        plan_transition(InstanceState::ShuttingDown, TargetState::Stopped),
        Transition::Blocked("instance is shutting-down".to_string())
    );
    assert!(matches!(
        plan_transition(InstanceState::Unknown, TargetState::Stopped),
        Transition::Blocked(_)
    ));
}

#[test]
fn plan_marks_missing_instances() {
    let requested = ids(&[WEB, DB]);
    let instances = instances_from(&described(&[(WEB, "stopped")]));
    let items = plan(&requested, &instances, TargetState::Running);

    assert_eq!(items[0].transition, Transition::Start);
    assert_eq!(
        items[1].transition,
        Transition::Blocked("instance not found".to_string())
    );
}

#[tokio::test]
async fn describe_without_ids_lists_everything() {
    let runner = ScriptedRunner::new().ok("describe-instances", described(&[(WEB, "running")]));
    let client = client(runner);
    let api = Ec2::new(&client);

    let instances = describe(&api, &[]).await.unwrap();

    assert_eq!(instances.len(), 1);
    assert!(client.runner().calls()[0].args.is_empty());
}

#[tokio::test]
async fn start_sends_only_actionable_ids() {
    let runner = ScriptedRunner::new()
        .ok(
            "describe-instances",
            described(&[(WEB, "stopped"), (DB, "running")]),
        )
        .ok(
            "start-instances",
            json!({"StartingInstances": [{"InstanceId": WEB, "CurrentState": {"Name": "pending"}}]}),
        );
    let client = client(runner);
    let api = Ec2::new(&client);

    let report = change_state(&api, &ids(&[WEB, DB]), TargetState::Running, false, None)
        .await
        .unwrap();

    let start = client
        .runner()
        .calls()
        .into_iter()
        .find(|c| c.verb == "start-instances")
        .unwrap();
    assert_eq!(start.args, vec!["--instance-ids", WEB]);
    assert_eq!(report.items[0].after, Some(InstanceState::Pending));
    assert_eq!(report.items[1].transition, Transition::AlreadyThere);
    assert!(!report.waited);
}

#[tokio::test]
async fn nothing_actionable_makes_no_write() {
    let runner = ScriptedRunner::new().ok("describe-instances", described(&[(WEB, "stopped")]));
    let client = client(runner);
    let api = Ec2::new(&client);

    let report = change_state(&api, &ids(&[WEB]), TargetState::Stopped, false, Some(fast_wait()))
        .await
        .unwrap();

    assert_eq!(client.runner().verbs(), vec!["describe-instances"]);
    assert_eq!(report.items[0].transition, Transition::AlreadyThere);
}

#[tokio::test]
async fn blocked_instances_are_reported() {
    let runner = ScriptedRunner::new().ok("describe-instances", described(&[(WEB, "terminated")]));
    let client = client(runner);
    let api = Ec2::new(&client);

    let report = change_state(&api, &ids(&[WEB]), TargetState::Running, false, None)
        .await
        .unwrap();

    assert_eq!(report.blocked(), 1);
    assert_eq!(client.runner().count("start-instances"), 0);
}

#[tokio::test]
async fn stop_with_force() {
    let runner = ScriptedRunner::new()
        .ok("describe-instances", described(&[(WEB, "running")]))
        .ok("stop-instances", json!({"StoppingInstances": []}));
    let client = client(runner);
    let api = Ec2::new(&client);

    change_state(&api, &ids(&[WEB]), TargetState::Stopped, true, None)
        .await
        .unwrap();

    let stop = &client.runner().calls()[1];
    assert_eq!(stop.args, vec!["--instance-ids", WEB, "--force"]);
}

#[tokio::test]
async fn wait_polls_until_target_state() {
    let runner = ScriptedRunner::new()
        .ok("describe-instances", described(&[(WEB, "running")]))
        .ok("describe-instances", described(&[(WEB, "stopping")]))
        .ok("describe-instances", described(&[(WEB, "stopped")]))
        .ok(
            "stop-instances",
            json!({"StoppingInstances": [{"InstanceId": WEB, "CurrentState": {"Name": "stopping"}}]}),
        );
    let client = client(runner);
    let api = Ec2::new(&client);

    let report = change_state(&api, &ids(&[WEB]), TargetState::Stopped, false, Some(fast_wait()))
        .await
        .unwrap();

    assert!(report.waited);
    assert_eq!(report.items[0].after, Some(InstanceState::Stopped));
    assert_eq!(client.runner().count("describe-instances"), 3);
}

#[tokio::test]
async fn wait_gives_up_after_max_polls() {
    let runner = ScriptedRunner::new()
        .ok("describe-instances", described(&[(WEB, "stopped")]))
        .ok("describe-instances", described(&[(WEB, "pending")]))
        .ok(
            "start-instances",
            json!({"StartingInstances": [{"InstanceId": WEB, "CurrentState": {"Name": "pending"}}]}),
        );
    let client = client(runner);
    let api = Ec2::new(&client);

    let err = change_state(&api, &ids(&[WEB]), TargetState::Running, false, Some(fast_wait()))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("after 3 polls"));
    assert_eq!(client.runner().count("describe-instances"), 4);
}

#[tokio::test]
async fn wait_fails_fast_on_termination() {
    let runner = ScriptedRunner::new()
        .ok("describe-instances", described(&[(WEB, "stopped")]))
        .ok("describe-instances", described(&[(WEB, "terminated")]))
        .ok("start-instances", json!({"StartingInstances": []}));
    let client = client(runner);
    let api = Ec2::new(&client);

    let err = change_state(&api, &ids(&[WEB]), TargetState::Running, false, Some(fast_wait()))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("terminated"));
    assert_eq!(client.runner().count("describe-instances"), 2);
}

#[tokio::test]
async fn dry_run_skips_write_and_wait() {
    let runner = ScriptedRunner::new().ok("describe-instances", described(&[(WEB, "stopped")]));
    let client = client_with(runner, true);
    let api = Ec2::new(&client);

    let report = change_state(&api, &ids(&[WEB]), TargetState::Running, false, Some(fast_wait()))
        .await
        .unwrap();

    assert_eq!(client.runner().verbs(), vec!["describe-instances"]);
    assert!(!report.waited);
    assert_eq!(report.items[0].transition, Transition::Start);
}

#[tokio::test]
async fn empty_ids_rejected_before_any_call() {
    let client = client(ScriptedRunner::new());
    let api = Ec2::new(&client);

    let err = change_state(&api, &[], TargetState::Running, false, None)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ExecError>(),
        Some(ExecError::InvalidParameter(_))
    ));
    assert!(client.runner().calls().is_empty());
}

fn not_found(raw: &[&str]) -> String {
    let quoted = raw.join(", ");
    format!(
        "An error occurred (InvalidInstanceID.NotFound) when calling the DescribeInstances operation: The instance IDs '{quoted}' do not exist"
    )
}

#[tokio::test]
async fn unknown_id_is_blocked_and_others_still_start() {
    let runner = ScriptedRunner::new()
        .fail_for("describe-instances", DB, &not_found(&[DB]))
        .ok("describe-instances", described(&[(WEB, "stopped")]))
        .ok(
            "start-instances",
            json!({"StartingInstances": [{"InstanceId": WEB, "CurrentState": {"Name": "pending"}}]}),
        );
    let client = client(runner);
    let api = Ec2::new(&client);

    let report = change_state(&api, &ids(&[WEB, DB]), TargetState::Running, false, None)
        .await
        .unwrap();

    let describes: Vec<Vec<String>> = client
        .runner()
        .calls()
        .into_iter()
        .filter(|c| c.verb == "describe-instances")
        .map(|c| c.args)
        .collect();
    assert_eq!(
        describes,
        vec![
            vec!["--instance-ids".to_string(), WEB.to_string(), DB.to_string()],
            vec!["--instance-ids".to_string(), WEB.to_string()],
        ]
    );
    assert_eq!(client.runner().count("start-instances"), 1);
    assert_eq!(report.items[0].transition, Transition::Start);
    assert_eq!(
        report.items[1].transition,
        Transition::Blocked("instance not found".to_string())
    );
    assert_eq!(report.blocked(), 1);
}

#[tokio::test]
async fn all_ids_unknown_makes_no_write() {
    let runner = ScriptedRunner::new().fail("describe-instances", &not_found(&[WEB, DB]));
    let client = client(runner);
    let api = Ec2::new(&client);

    let report = change_state(&api, &ids(&[WEB, DB]), TargetState::Stopped, false, None)
        .await
        .unwrap();

    assert_eq!(report.blocked(), 2);
    assert_eq!(client.runner().verbs(), vec!["describe-instances"]);
}

#[tokio::test]
async fn not_found_naming_no_requested_id_propagates() {
    let runner = ScriptedRunner::new().fail("describe-instances", &not_found(&["i-00000000aaaaaaaa"]));
    let client = client(runner);
    let api = Ec2::new(&client);

    let err = change_state(&api, &ids(&[WEB]), TargetState::Running, false, None)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ExecError>(),
        Some(ExecError::Remote { code, .. }) if code == "InvalidInstanceID.NotFound"
    ));
}

#[tokio::test]
async fn describe_failure_propagates_remote_code() {
    let runner = ScriptedRunner::new().fail(
        "describe-instances",
        "An error occurred (UnauthorizedOperation) when calling the DescribeInstances operation: You are not authorized to perform this operation.",
    );
    let client = client(runner);
    let api = Ec2::new(&client);

    let err = change_state(&api, &ids(&[WEB]), TargetState::Running, false, None)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ExecError>(),
        Some(ExecError::Remote { code, .. }) if code == "UnauthorizedOperation"
    ));
    assert_eq!(client.runner().count("describe-instances"), 1);
}

#[tokio::test]
async fn repeated_ids_are_sent_once() {
    let runner = ScriptedRunner::new()
        .ok("describe-instances", described(&[(WEB, "stopped")]))
        .ok("start-instances", json!({"StartingInstances": []}));
    let client = client(runner);
    let api = Ec2::new(&client);

    let report = change_state(&api, &ids(&[WEB, WEB]), TargetState::Running, false, None)
        .await
        .unwrap();

    assert_eq!(report.items.len(), 1);
    for call in client.runner().calls() {
        assert_eq!(call.args, vec!["--instance-ids", WEB]);
    }
}
