//! Scripted runner for tests

use anyhow::Result;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use super::{AwsCall, AwsClient, AwsContext, AwsRunner};
use crate::exec::{Invoker, Pause, RawFailure, RawOutput, RawResult, RetryPolicy};

/// Pause that returns immediately
#[derive(Debug, Default)]
pub struct NoPause;

impl Pause for NoPause {
    async fn pause(&self, _delay: Duration) {}
}

struct Script {
    verb: String,
    needle: Option<String>,
    responses: VecDeque<RawResult>,
}

/// Answers calls from per-verb queues; the last response repeats
#[derive(Default)]
pub struct ScriptedRunner {
    scripts: Mutex<Vec<Script>>,
    calls: Mutex<Vec<AwsCall>>,
    inputs: Mutex<Vec<Value>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, verb: &str, needle: Option<&str>, result: RawResult) -> Self {
        {
            let mut scripts = self.scripts.lock().unwrap();
            let existing = scripts
                .iter_mut()
                .find(|s| s.verb == verb && s.needle.as_deref() == needle);
            match existing {
                Some(script) => script.responses.push_back(result),
                None => scripts.push(Script {
                    verb: verb.to_string(),
                    needle: needle.map(str::to_string),
                    responses: VecDeque::from([result]),
                }),
            }
        }
        self
    }

    pub fn ok(self, verb: &str, payload: Value) -> Self {
        self.push(verb, None, Ok(RawOutput::new(payload.to_string())))
    }

    pub fn fail(self, verb: &str, text: &str) -> Self {
        self.push(verb, None, Err(RawFailure::new(text, 254)))
    }

    /// Response used only when some argument equals `arg`
    pub fn ok_for(self, verb: &str, arg: &str, payload: Value) -> Self {
        self.push(verb, Some(arg), Ok(RawOutput::new(payload.to_string())))
    }

    pub fn fail_for(self, verb: &str, arg: &str, text: &str) -> Self {
        self.push(verb, Some(arg), Err(RawFailure::new(text, 254)))
    }

    pub fn calls(&self) -> Vec<AwsCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn verbs(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.verb).collect()
    }

    pub fn count(&self, verb: &str) -> usize {
        self.calls().iter().filter(|c| c.verb == verb).count()
    }

    /// JSON documents passed by `file://` reference, in call order
    pub fn inputs(&self) -> Vec<Value> {
        self.inputs.lock().unwrap().clone()
    }

    fn record(&self, call: &AwsCall) {
        for arg in &call.args {
            if let Some(path) = arg.strip_prefix("file://") {
                if let Ok(body) = std::fs::read_to_string(path) {
                    if let Ok(doc) = serde_json::from_str(&body) {
                        self.inputs.lock().unwrap().push(doc);
                    }
                }
            }
        }
        self.calls.lock().unwrap().push(call.clone());
    }

    fn next(&self, call: &AwsCall) -> RawResult {
        let mut scripts = self.scripts.lock().unwrap();
        let matches = |s: &Script| {
            s.verb == call.verb
                && s.needle
                    .as_ref()
                    .map_or(true, |n| call.args.iter().any(|a| a == n))
        };
        let index = scripts
            .iter()
            .position(|s| s.needle.is_some() && matches(s))
            .or_else(|| scripts.iter().position(|s| matches(s)));

        match index {
            Some(i) => {
                let responses = &mut scripts[i].responses;
                if responses.len() > 1 {
                    responses.pop_front().unwrap()
                } else {
                    responses.front().cloned().unwrap()
                }
            }
            None => Err(RawFailure::new(
                format!("no scripted response for {} {}", call.service, call.verb),
                1,
            )),
        }
    }
}

impl AwsRunner for ScriptedRunner {
    async fn run(&self, call: &AwsCall) -> RawResult {
        self.record(call);
        self.next(call)
    }

    async fn run_interactive(&self, call: &AwsCall) -> Result<()> {
        self.record(call);
        Ok(())
    }
}

/// Client over a scripted runner with three immediate attempts
pub fn client(runner: ScriptedRunner) -> AwsClient<ScriptedRunner, NoPause> {
    client_with(runner, false)
}

pub fn client_with(runner: ScriptedRunner, dry_run: bool) -> AwsClient<ScriptedRunner, NoPause> {
    AwsClient::new(
        runner,
        Invoker::with_pause(
            RetryPolicy {
                max_attempts: 3,
                delay: Duration::ZERO,
                timeout: Duration::from_secs(5),
            },
            NoPause,
        ),
        AwsContext::default(),
        dry_run,
    )
}
