use super::mock::{client, client_with, ScriptedRunner};
use super::*;

fn ctx(profile: Option<&str>, region: Option<&str>) -> AwsContext {
    AwsContext {
        profile: profile.map(str::to_string),
        region: region.map(str::to_string),
    }
}

#[test]
fn to_args_basic() {
    let call = AwsCall::new("quicksight", "list-analyses").opt("--aws-account-id", "123456789012");
    assert_eq!(
        call.to_args(&AwsContext::default()),
        vec![
            "quicksight",
            "list-analyses",
            "--aws-account-id",
            "123456789012",
            "--output",
            "json"
        ]
    );
}

#[test]
fn to_args_with_profile_and_region() {
    let call = AwsCall::new("ec2", "describe-instances");
    assert_eq!(
        call.to_args(&ctx(Some("prod"), Some("eu-west-1"))),
        vec![
            "ec2",
            "describe-instances",
            "--output",
            "json",
            "--profile",
            "prod",
            "--region",
            "eu-west-1"
        ]
    );
}

#[test]
fn args_appends_in_order() {
    let call = AwsCall::new("ec2", "start-instances")
        .arg("--instance-ids")
        .args(["i-0123abcd", "i-0456abcd"]);
    assert_eq!(call.args, vec!["--instance-ids", "i-0123abcd", "i-0456abcd"]);
}

#[test]
fn display_quotes_unsafe_arguments() {
    let call = AwsCall::new("sts", "assume-role")
        .opt("--role-session-name", "my session")
        .opt("--role-arn", "arn:aws:iam::123456789012:role/Admin");
    let shown = call.display(&AwsContext::default());
    assert_eq!(
        shown,
        "aws sts assume-role --role-session-name 'my session' --role-arn arn:aws:iam::123456789012:role/Admin --output json"
    );
}

#[test]
fn shell_quote_escapes_single_quotes() {
    assert_eq!(shell_quote("it's"), r"'it'\''s'");
    assert_eq!(shell_quote(""), "''");
    assert_eq!(shell_quote("file:///tmp/x.json"), "file:///tmp/x.json");
}

#[tokio::test]
async fn call_retries_transient_failures() {
    let runner = ScriptedRunner::new()
        .fail("list-analyses", "HTTP 503 Service Unavailable")
        .ok("list-analyses", serde_json::json!({"AnalysisSummaryList": []}));
    let client = client(runner);

    let env = client
        .call(&AwsCall::new("quicksight", "list-analyses"), "analysis")
        .await;

    assert!(env.is_success());
    assert_eq!(client.runner().count("list-analyses"), 2);
}

#[tokio::test]
async fn mutate_in_dry_run_skips_runner() {
    let client = client_with(ScriptedRunner::new(), true);
    let call = AwsCall::new("ec2", "stop-instances").opt("--instance-ids", "i-0123abcd");

    let env = client.mutate(&call, "instance").await;

    assert!(env.is_success());
    assert!(client.runner().calls().is_empty());
    let payload = env.payload().unwrap();
    assert_eq!(payload["DryRun"], serde_json::json!(true));
    assert!(payload["Command"]
        .as_str()
        .unwrap()
        .starts_with("aws ec2 stop-instances --instance-ids i-0123abcd"));
}

#[tokio::test]
async fn reads_still_run_in_dry_run() {
    let runner = ScriptedRunner::new().ok("describe-instances", serde_json::json!({"Reservations": []}));
    let client = client_with(runner, true);

    let env = client
        .call(&AwsCall::new("ec2", "describe-instances"), "instance")
        .await;

    assert!(env.is_success());
    assert_eq!(client.runner().count("describe-instances"), 1);
}

#[tokio::test]
async fn interactive_in_dry_run_is_skipped() {
    let client = client_with(ScriptedRunner::new(), true);
    client
        .interactive(&AwsCall::new("sso", "login"))
        .await
        .unwrap();
    assert!(client.runner().calls().is_empty());
}

#[test]
fn scratch_writes_file_reference() {
    let scratch = Scratch::new().unwrap();
    let reference = scratch
        .input_json("create-analysis", &serde_json::json!({"AnalysisId": "a-1"}))
        .unwrap();
    let path = reference.strip_prefix("file://").unwrap();
    let body = std::fs::read_to_string(path).unwrap();
    assert!(body.contains("\"AnalysisId\": \"a-1\""));
}

#[test]
fn scratch_removed_on_drop() {
    let scratch = Scratch::new().unwrap();
    let dir = scratch.path().to_path_buf();
    assert!(dir.exists());
    drop(scratch);
    assert!(!dir.exists());
}
