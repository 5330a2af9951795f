//! Backup directory layout
//!
//! ```text
//! <root>/
//!   analyses|datasets/<safe-name>-<id>.json
//!   definitions/<safe-name>-<id>-definition.json
//!   permissions/<safe-name>-<id>-permissions.json
//!   analysis-ids.json | dataset-ids.json
//!   analysis-summary.json | dataset-summary.json
//! ```

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use super::types::Kind;


const DEFINITIONS_DIR: &str = "definitions";
const PERMISSIONS_DIR: &str = "permissions";
const DEFINITION_SUFFIX: &str = "-definition";
const PERMISSIONS_SUFFIX: &str = "-permissions";

/// Replace characters that are unsafe in file names with `_`
pub fn safe_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect()
}

/// `<safe-name>-<id>`
pub fn file_stem(name: &str, id: &str) -> String {
    format!("{}-{}", safe_name(name), id)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupLayout {
    root: PathBuf,
}

impl BackupLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Layout that owns a resource file (`<root>/<kind>/<file>`)
    pub fn for_resource_file(file: &Path) -> Option<Self> {
        file.parent()?.parent().map(Self::new)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn kind_dir(&self, kind: Kind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    pub fn resource_path(&self, kind: Kind, stem: &str) -> PathBuf {
        self.kind_dir(kind).join(format!("{stem}.json"))
    }

    pub fn definition_path(&self, stem: &str) -> PathBuf {
        self.root
            .join(DEFINITIONS_DIR)
            .join(format!("{stem}{DEFINITION_SUFFIX}.json"))
    }

    pub fn permissions_path(&self, stem: &str) -> PathBuf {
        self.root
            .join(PERMISSIONS_DIR)
            .join(format!("{stem}{PERMISSIONS_SUFFIX}.json"))
    }

    pub fn ids_path(&self, kind: Kind) -> PathBuf {
        self.root.join(kind.ids_file())
    }

    pub fn summary_path(&self, kind: Kind) -> PathBuf {
        self.root.join(kind.summary_file())
    }

    /// Create the directories a backup of `kind` writes into
    pub fn prepare(&self, kind: Kind, permissions: bool) -> Result<()> {
        let mut dirs = vec![self.kind_dir(kind)];
        if kind == Kind::Analyses {
            dirs.push(self.root.join(DEFINITIONS_DIR));
        }
        if permissions {
            dirs.push(self.root.join(PERMISSIONS_DIR));
        }
        for dir in dirs {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }
        Ok(())
    }

    pub fn write_ids(&self, kind: Kind, ids: &[String]) -> Result<PathBuf> {
        let path = self.ids_path(kind);
        write_json(&path, &ids)?;
        Ok(path)
    }

    pub fn write_summaries(&self, kind: Kind, summaries: &[Value]) -> Result<PathBuf> {
        let path = self.summary_path(kind);
        write_json(&path, &summaries)?;
        Ok(path)
    }

    /// Ids recorded by a previous backup of `kind`
    pub fn read_ids(&self, kind: Kind) -> Result<Vec<String>> {
        let path = self.ids_path(kind);
        let doc = read_json(&path)?;
        serde_json::from_value(doc)
            .with_context(|| format!("{} is not a JSON array of ids", path.display()))
    }

    /// Resource description files of `kind`, sorted by file name
    pub fn resource_files(&self, kind: Kind) -> Result<Vec<PathBuf>> {
        let dir = self.kind_dir(kind);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files: Vec<PathBuf> = fs::read_dir(&dir)
            .with_context(|| format!("Failed to read {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();
        Ok(files)
    }
}

/// Stem of a resource description file
pub fn stem_of(file: &Path) -> Option<String> {
    file.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
}

/// Write pretty JSON with a trailing newline
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let mut body = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    body.push('\n');
    fs::write(path, body).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn read_json(path: &Path) -> Result<Value> {
    let body =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&body).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Read `path` if it exists
pub fn read_json_opt(path: &Path) -> Result<Option<Value>> {
    if path.exists() {
        read_json(path).map(Some)
    } else {
        Ok(None)
    }
}
