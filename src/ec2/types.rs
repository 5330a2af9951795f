use serde::Serialize;
use serde_json::Value;

/// EC2 instance lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstanceState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
    Unknown,
}

impl InstanceState {
    pub fn from_name(name: &str) -> Self {
        match name {
            "pending" => InstanceState::Pending,
            "running" => InstanceState::Running,
            "shutting-down" => InstanceState::ShuttingDown,
            "terminated" => InstanceState::Terminated,
            "stopping" => InstanceState::Stopping,
            "stopped" => InstanceState::Stopped,
            _ => InstanceState::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceState::Pending => "pending",
            InstanceState::Running => "running",
            InstanceState::ShuttingDown => "shutting-down",
            InstanceState::Terminated => "terminated",
            InstanceState::Stopping => "stopping",
            InstanceState::Stopped => "stopped",
            InstanceState::Unknown => "unknown",
        }
    }

    /// `{"Code": 16, "Name": "running"}`
    fn from_state_object(value: Option<&Value>) -> Self {
        value
            .and_then(|s| s.get("Name"))
            .and_then(Value::as_str)
            .map(Self::from_name)
            .unwrap_or(InstanceState::Unknown)
    }
}

impl std::fmt::Display for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State requested by start/stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetState {
    Running,
    Stopped,
}

impl TargetState {
    pub fn state(&self) -> InstanceState {
        match self {
            TargetState::Running => InstanceState::Running,
            TargetState::Stopped => InstanceState::Stopped,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            TargetState::Running => "start-instances",
            TargetState::Stopped => "stop-instances",
        }
    }

    /// Key of the state-change list in the start/stop response
    pub fn response_key(&self) -> &'static str {
        match self {
            TargetState::Running => "StartingInstances",
            TargetState::Stopped => "StoppingInstances",
        }
    }
}

/// What to do with one instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Start,
    Stop,
    AlreadyThere,
    Blocked(String),
}

impl Transition {
    pub fn is_actionable(&self) -> bool {
        matches!(self, Transition::Start | Transition::Stop)
    }

    pub fn label(&self) -> &str {
        match self {
            Transition::Start => "start",
            Transition::Stop => "stop",
            Transition::AlreadyThere => "none",
            Transition::Blocked(_) => "blocked",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instance {
    pub id: String,
    pub name: Option<String>,
    pub state: InstanceState,
    pub instance_type: Option<String>,
    pub private_ip: Option<String>,
    pub public_ip: Option<String>,
    pub launch_time: Option<String>,
}

fn string_at(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

impl Instance {
    pub fn from_value(value: &Value) -> Option<Self> {
        let name = value
            .get("Tags")
            .and_then(Value::as_array)
            .and_then(|tags| {
                tags.iter()
                    .find(|t| t.get("Key").and_then(Value::as_str) == Some("Name"))
            })
            .and_then(|t| string_at(t, "Value"));

        Some(Self {
            id: string_at(value, "InstanceId")?,
            name,
            state: InstanceState::from_state_object(value.get("State")),
            instance_type: string_at(value, "InstanceType"),
            private_ip: string_at(value, "PrivateIpAddress"),
            public_ip: string_at(value, "PublicIpAddress"),
            launch_time: string_at(value, "LaunchTime"),
        })
    }
}

/// Flatten `Reservations[].Instances[]`
pub fn instances_from(response: &Value) -> Vec<Instance> {
    response
        .get("Reservations")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|r| r.get("Instances").and_then(Value::as_array))
        .flatten()
        .filter_map(Instance::from_value)
        .collect()
}

/// `(id, current state)` pairs from a start/stop response
pub fn state_changes(response: &Value, target: TargetState) -> Vec<(String, InstanceState)> {
    response
        .get(target.response_key())
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|change| {
            let id = string_at(change, "InstanceId")?;
            Some((
                id,
                InstanceState::from_state_object(change.get("CurrentState")),
            ))
        })
        .collect()
}

/// Outcome for one requested instance
#[derive(Debug, Clone, Serialize)]
pub struct TransitionItem {
    pub id: String,
    pub name: Option<String>,
    pub before: InstanceState,
    pub transition: Transition,
    pub after: Option<InstanceState>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransitionReport {
    pub target: TargetState,
    pub items: Vec<TransitionItem>,
    pub waited: bool,
}

impl TransitionReport {
    pub fn blocked(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.transition, Transition::Blocked(_)))
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Table
        }
    }
}
