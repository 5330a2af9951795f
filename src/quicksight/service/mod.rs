//! QuickSight service layer - business logic that returns data
//!
//! Items in a batch are processed one at a time, in listing order. A failed
//! item is recorded in the report and the batch moves on.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::api::QuickSight;
use super::backup::{file_stem, read_json, read_json_opt, stem_of, write_json, BackupLayout};
use super::types::{BackupItem, BackupReport, Kind, RestoreItem, Summary, Target};
use crate::awscli::{AwsRunner, Scratch};
use crate::exec::{write, Envelope, ExecError, Pause, WriteOperation};
use crate::resource::ResourceId;


/// Fields of a saved analysis definition accepted by create/update-analysis
const ANALYSIS_FIELDS: &[&str] = &["AnalysisId", "Name", "Definition", "ThemeArn"];
const ANALYSIS_REQUIRED: &[&str] = &["AnalysisId", "Name", "Definition"];

/// Fields of a saved data set accepted by create/update-data-set
const DATASET_FIELDS: &[&str] = &[
    "DataSetId",
    "Name",
    "PhysicalTableMap",
    "LogicalTableMap",
    "ImportMode",
    "ColumnGroups",
    "FieldFolders",
    "RowLevelPermissionDataSet",
    "RowLevelPermissionTagConfiguration",
    "ColumnLevelPermissionRules",
    "DataSetUsageConfiguration",
    "DatasetParameters",
];
const DATASET_REQUIRED: &[&str] = &["DataSetId", "Name", "PhysicalTableMap", "ImportMode"];

/// Machine-readable code of a failed batch item
fn error_code(err: &anyhow::Error) -> &str {
    err.downcast_ref::<ExecError>().map_or("Error", ExecError::code)
}

/// List analyses or datasets
pub async fn list<R: AwsRunner, P: Pause>(
    api: &QuickSight<'_, R, P>,
    kind: Kind,
) -> Result<Vec<Summary>> {
    let payload = api
        .list(kind)
        .await
        .into_result()
        .with_context(|| format!("Failed to list {kind}"))?;
    Ok(Summary::list_from(kind, &payload))
}

/// Back up every resource of `kind` into `layout`
pub async fn backup<R: AwsRunner, P: Pause>(
    api: &QuickSight<'_, R, P>,
    layout: &BackupLayout,
    kind: Kind,
    permissions: bool,
) -> Result<BackupReport> {
    let summaries = list(api, kind).await?;
    layout.prepare(kind, permissions)?;

    let mut items = Vec::with_capacity(summaries.len());
    for (index, summary) in summaries.iter().enumerate() {
        info!(%kind, id = %summary.id, "backing up {}/{}", index + 1, summaries.len());
        let mut item = BackupItem {
            id: summary.id.clone(),
            name: summary.name.clone(),
            files: Vec::new(),
            error: None,
        };
        if let Err(e) = backup_files(api, layout, kind, summary, permissions, &mut item.files).await
        {
            warn!(%kind, id = %summary.id, code = error_code(&e), "backup failed: {e:#}");
            item.error = Some(format!("{e:#}"));
        }
        items.push(item);
    }

    let ids: Vec<String> = summaries.iter().map(|s| s.id.clone()).collect();
    layout.write_ids(kind, &ids)?;
    let raw: Vec<Value> = summaries.iter().map(|s| s.raw.clone()).collect();
    layout.write_summaries(kind, &raw)?;

    Ok(BackupReport {
        kind,
        root: layout.root().to_path_buf(),
        items,
    })
}

async fn backup_files<R: AwsRunner, P: Pause>(
    api: &QuickSight<'_, R, P>,
    layout: &BackupLayout,
    kind: Kind,
    summary: &Summary,
    permissions: bool,
    files: &mut Vec<PathBuf>,
) -> Result<()> {
    let id = ResourceId::parse(kind.resource_type(), &summary.id)?;
    let stem = file_stem(&summary.name, &summary.id);

    let description = api.describe(kind, &id).await.into_result()?;
    let path = layout.resource_path(kind, &stem);
    write_json(&path, &description)?;
    files.push(path);

    if kind == Kind::Analyses {
        let definition = api.describe_definition(&id).await.into_result()?;
        let path = layout.definition_path(&stem);
        write_json(&path, &definition)?;
        files.push(path);
    }

    if permissions {
        let grants = api.describe_permissions(kind, &id).await.into_result()?;
        let path = layout.permissions_path(&stem);
        write_json(&path, &grants)?;
        files.push(path);
    }

    Ok(())
}

/// Resource files to restore: one file, or every file of `target` in a backup dir
pub fn collect_sources(
    file: Option<&Path>,
    dir: Option<&Path>,
    target: Target,
) -> Result<Vec<PathBuf>> {
    match (file, dir) {
        (Some(file), _) => {
            if !file.is_file() {
                return Err(ExecError::InvalidParameter(format!(
                    "backup file not found: {}",
                    file.display()
                ))
                .into());
            }
            Ok(vec![file.to_path_buf()])
        }
        (None, Some(dir)) => {
            if !dir.is_dir() {
                return Err(ExecError::InvalidParameter(format!(
                    "backup directory not found: {}",
                    dir.display()
                ))
                .into());
            }
            let layout = BackupLayout::new(dir);
            let mut files = Vec::new();
            for kind in target.restore_order() {
                let found = layout.resource_files(kind)?;
                if layout.ids_path(kind).is_file() {
                    let recorded = layout.read_ids(kind)?.len();
                    if found.len() < recorded {
                        warn!(
                            %kind,
                            recorded,
                            found = found.len(),
                            "backup is missing resource files"
                        );
                    }
                }
                files.extend(found);
            }
            if files.is_empty() {
                return Err(ExecError::InvalidParameter(format!(
                    "no backup files found in {}",
                    dir.display()
                ))
                .into());
            }
            Ok(files)
        }
        (None, None) => {
            Err(ExecError::InvalidParameter("either --file or --dir is required".to_string()).into())
        }
    }
}

fn copy_fields(
    source: &Value,
    fields: &[&str],
    required: &[&str],
    what: &str,
) -> Result<Map<String, Value>, ExecError> {
    let mut input = Map::new();
    for field in fields {
        if let Some(value) = source.get(*field).filter(|v| !v.is_null()) {
            input.insert(field.to_string(), value.clone());
        }
    }
    if let Some(missing) = required.iter().find(|f| !input.contains_key(**f)) {
        return Err(ExecError::InvalidParameter(format!(
            "{what} is missing {missing}"
        )));
    }
    Ok(input)
}

/// create/update-analysis request from a saved definition document
pub fn analysis_input(definition: &Value) -> Result<Map<String, Value>, ExecError> {
    copy_fields(
        definition,
        ANALYSIS_FIELDS,
        ANALYSIS_REQUIRED,
        "analysis definition",
    )
}

/// create/update-data-set request from a saved `DataSet` object
pub fn dataset_input(data_set: &Value) -> Result<Map<String, Value>, ExecError> {
    copy_fields(data_set, DATASET_FIELDS, DATASET_REQUIRED, "data set backup")
}

/// Restore every source file, sequentially
pub async fn restore<R: AwsRunner, P: Pause>(
    api: &QuickSight<'_, R, P>,
    sources: &[PathBuf],
    operation: WriteOperation,
    permissions: bool,
) -> Result<Vec<RestoreItem>> {
    let scratch = Scratch::new()?;
    let mut items = Vec::with_capacity(sources.len());

    for source in sources {
        let mut item = RestoreItem::new(source.clone());
        if let Err(e) = restore_one(api, &scratch, source, operation, permissions, &mut item).await
        {
            warn!(source = %source.display(), code = error_code(&e), "restore failed: {e:#}");
            item.error = Some(format!("{e:#}"));
        }
        items.push(item);
    }

    Ok(items)
}

async fn restore_one<R: AwsRunner, P: Pause>(
    api: &QuickSight<'_, R, P>,
    scratch: &Scratch,
    source: &Path,
    operation: WriteOperation,
    permissions: bool,
    item: &mut RestoreItem,
) -> Result<()> {
    let doc = read_json(source)?;
    let kind = Kind::detect(&doc).with_context(|| {
        format!(
            "{} is not an analysis or data set backup",
            source.display()
        )
    })?;
    item.kind = Some(kind);

    let resource = &doc[kind.describe_key()];
    let raw_id = resource
        .get(kind.id_field())
        .and_then(Value::as_str)
        .with_context(|| format!("{} has no {}", source.display(), kind.id_field()))?;
    let id = ResourceId::parse(kind.resource_type(), raw_id)?;
    item.id = Some(id.to_string());
    item.name = resource
        .get("Name")
        .and_then(Value::as_str)
        .map(str::to_string);

    let layout = BackupLayout::for_resource_file(source)
        .with_context(|| format!("{} is not inside a backup directory", source.display()))?;
    let stem = stem_of(source).with_context(|| format!("Bad file name {}", source.display()))?;

    let input = match kind {
        Kind::Analyses => {
            let path = layout.definition_path(&stem);
            let definition = read_json_opt(&path)?.ok_or_else(|| {
                ExecError::InvalidParameter(format!(
                    "analysis definition not found: {}",
                    path.display()
                ))
            })?;
            analysis_input(&definition)?
        }
        Kind::Datasets => dataset_input(resource)?,
    };

    let grants = if permissions {
        let path = layout.permissions_path(&stem);
        let saved = read_json_opt(&path)?.ok_or_else(|| {
            ExecError::InvalidParameter(format!("permissions backup not found: {}", path.display()))
        })?;
        saved
            .get("Permissions")
            .filter(|p| p.as_array().is_some_and(|a| !a.is_empty()))
            .cloned()
    } else {
        None
    };

    let update_input = input.clone();
    let envelope: Envelope = write(
        api,
        operation,
        kind.resource_type(),
        &id,
        move || api.create(kind, input, scratch),
        move || api.update(kind, update_input, scratch),
    )
    .await;
    item.operation = Some(envelope.metadata().operation.clone());
    match (envelope.payload(), envelope.error_detail()) {
        (Ok(payload), _) => debug!(
            %id,
            request_id = envelope.request_id(),
            arn = payload.get("Arn").and_then(serde_json::Value::as_str).unwrap_or("-"),
            "write accepted"
        ),
        (_, Ok(err)) => warn!(
            %id,
            request_id = envelope.request_id(),
            code = %err.code,
            "write rejected"
        ),
        _ => {}
    }
    envelope.into_result()?;

    if let Some(grants) = grants {
        api.grant_permissions(kind, &id, grants, scratch)
            .await
            .into_result()?;
        item.permissions_applied = true;
    }

    Ok(())
}

/// Delete one analysis or data set
pub async fn delete<R: AwsRunner, P: Pause>(
    api: &QuickSight<'_, R, P>,
    kind: Kind,
    id: &ResourceId,
) -> Result<Value> {
    let payload = api.delete(kind, id).await.into_result()?;
    Ok(payload)
}
