//! QuickSight resource kinds and summaries

use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

use crate::resource::ResourceType;

/// Analyses or datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    #[value(alias = "analysis")]
    Analyses,
    #[value(alias = "dataset", alias = "data-sets")]
    Datasets,
}

impl Kind {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Kind::Analyses => ResourceType::Analysis,
            Kind::Datasets => ResourceType::Dataset,
        }
    }

    /// Subdirectory holding basic descriptions
    pub fn dir_name(&self) -> &'static str {
        match self {
            Kind::Analyses => "analyses",
            Kind::Datasets => "datasets",
        }
    }

    pub fn ids_file(&self) -> &'static str {
        match self {
            Kind::Analyses => "analysis-ids.json",
            Kind::Datasets => "dataset-ids.json",
        }
    }

    pub fn summary_file(&self) -> &'static str {
        match self {
            Kind::Analyses => "analysis-summary.json",
            Kind::Datasets => "dataset-summary.json",
        }
    }

    /// CLI noun used in verbs (`describe-<noun>`)
    pub fn noun(&self) -> &'static str {
        match self {
            Kind::Analyses => "analysis",
            Kind::Datasets => "data-set",
        }
    }

    pub fn list_verb(&self) -> &'static str {
        match self {
            Kind::Analyses => "list-analyses",
            Kind::Datasets => "list-data-sets",
        }
    }

    /// Array of summaries in the list response
    pub fn list_key(&self) -> &'static str {
        match self {
            Kind::Analyses => "AnalysisSummaryList",
            Kind::Datasets => "DataSetSummaries",
        }
    }

    /// Object in the describe response
    pub fn describe_key(&self) -> &'static str {
        match self {
            Kind::Analyses => "Analysis",
            Kind::Datasets => "DataSet",
        }
    }

    /// Id field, in summaries and request inputs
    pub fn id_field(&self) -> &'static str {
        match self {
            Kind::Analyses => "AnalysisId",
            Kind::Datasets => "DataSetId",
        }
    }

    /// `--analysis-id` / `--data-set-id`
    pub fn id_flag(&self) -> String {
        format!("--{}-id", self.noun())
    }

    pub fn verb(&self, action: &str) -> String {
        format!("{action}-{}", self.noun())
    }

    /// `describe-analysis-permissions` / `update-data-set-permissions`
    pub fn permissions_verb(&self, action: &str) -> String {
        format!("{action}-{}-permissions", self.noun())
    }

    /// Which kind a saved describe response belongs to
    pub fn detect(doc: &Value) -> Option<Kind> {
        [Kind::Analyses, Kind::Datasets]
            .into_iter()
            .find(|k| doc.get(k.describe_key()).is_some_and(Value::is_object))
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Which kinds a batch command covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Target {
    Analyses,
    Datasets,
    #[default]
    All,
}

impl Target {
    pub fn kinds(&self) -> Vec<Kind> {
        match self {
            Target::Analyses => vec![Kind::Analyses],
            Target::Datasets => vec![Kind::Datasets],
            Target::All => vec![Kind::Analyses, Kind::Datasets],
        }
    }

    /// Datasets go first so restored analyses can reference them
    pub fn restore_order(&self) -> Vec<Kind> {
        let mut kinds = self.kinds();
        kinds.reverse();
        kinds
    }
}

/// One entry from a list response; `raw` is kept for the summary file
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub id: String,
    pub name: String,
    pub status: Option<String>,
    pub last_updated: Option<String>,
    #[serde(skip)]
    pub raw: Value,
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

impl Summary {
    pub fn from_value(kind: Kind, raw: &Value) -> Option<Self> {
        let id = raw.get(kind.id_field())?.as_str()?.to_string();
        let name = raw
            .get("Name")
            .and_then(Value::as_str)
            .unwrap_or(&id)
            .to_string();
        let status = match kind {
            Kind::Analyses => text(raw.get("Status")),
            Kind::Datasets => text(raw.get("ImportMode")),
        };
        Some(Self {
            id,
            name,
            status,
            last_updated: text(raw.get("LastUpdatedTime")),
            raw: raw.clone(),
        })
    }

    /// Parse every summary of a list response, in listing order
    pub fn list_from(kind: Kind, response: &Value) -> Vec<Self> {
        response
            .get(kind.list_key())
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| Self::from_value(kind, item))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Result of backing up one resource
#[derive(Debug, Clone, Serialize)]
pub struct BackupItem {
    pub id: String,
    pub name: String,
    pub files: Vec<PathBuf>,
    pub error: Option<String>,
}

/// Result of backing up one kind
#[derive(Debug, Clone, Serialize)]
pub struct BackupReport {
    pub kind: Kind,
    pub root: PathBuf,
    pub items: Vec<BackupItem>,
}

impl BackupReport {
    pub fn failed(&self) -> usize {
        self.items.iter().filter(|i| i.error.is_some()).count()
    }

    pub fn succeeded(&self) -> usize {
        self.items.len() - self.failed()
    }
}

/// Result of restoring one resource file
#[derive(Debug, Clone, Serialize)]
pub struct RestoreItem {
    pub source: PathBuf,
    pub kind: Option<Kind>,
    pub id: Option<String>,
    pub name: Option<String>,
    /// Verb that was issued (`create-analysis`, `update-data-set`, ...)
    pub operation: Option<String>,
    pub permissions_applied: bool,
    pub error: Option<String>,
}

impl RestoreItem {
    pub fn new(source: PathBuf) -> Self {
        Self {
            source,
            kind: None,
            id: None,
            name: None,
            operation: None,
            permissions_applied: false,
            error: None,
        }
    }
}

/// Output format
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
