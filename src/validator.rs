//! Upstream file validation against a JSON Schema.
//!
//! The schema is compiled once and every candidate file is checked against it.
//! A bad file never stops the run: each file gets its own [`FileReport`] and
//! the caller decides what to do with the aggregated [`ValidationSummary`].
//!
//! Supported documents:
//! - `.json`: one document
//! - `.yml` / `.yaml`: one document
//! - `.ndjson`: one document per non-empty line

use std::fmt;
use std::path::{Path, PathBuf};

use jsonschema::Validator;
use serde_json::Value;

use crate::utils::error::{Result, SchedError};

pub const DEFAULT_EXTENSIONS: &[&str] = &["json", "ndjson", "yml", "yaml"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// 1-based line for NDJSON files.
    pub line: Option<usize>,
    pub instance_path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(line) = self.line {
            write!(f, "line {}: ", line)?;
        }
        if self.instance_path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Passed { documents: usize },
    Failed(Vec<Violation>),
    Unreadable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
}

impl FileReport {
    pub fn passed(&self) -> bool {
        matches!(self.status, FileStatus::Passed { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationSummary {
    pub reports: Vec<FileReport>,
    /// Files whose extension is not in the filter.
    pub skipped: Vec<PathBuf>,
}

impl ValidationSummary {
    pub fn passed_count(&self) -> usize {
        self.reports.iter().filter(|r| r.passed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.reports.len() - self.passed_count()
    }

    pub fn all_passed(&self) -> bool {
        self.failed_count() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentFormat {
    Json,
    NdJson,
    Yaml,
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

fn format_of(path: &Path) -> Option<DocumentFormat> {
    match extension_of(path)?.as_str() {
        "json" => Some(DocumentFormat::Json),
        "ndjson" => Some(DocumentFormat::NdJson),
        "yml" | "yaml" => Some(DocumentFormat::Yaml),
        _ => None,
    }
}

fn parse_documents(path: &Path, content: &str) -> Result<Vec<(Option<usize>, Value)>> {
    match format_of(path) {
        Some(DocumentFormat::Json) => Ok(vec![(None, serde_json::from_str(content)?)]),
        Some(DocumentFormat::Yaml) => Ok(vec![(None, serde_yaml::from_str(content)?)]),
        Some(DocumentFormat::NdJson) => content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line)
                    .map(|value| (Some(i + 1), value))
                    .map_err(|e| SchedError::ValidationError {
                        message: format!("line {}: {}", i + 1, e),
                    })
            })
            .collect(),
        None => Err(SchedError::ValidationError {
            message: format!("unsupported document type: {}", path.display()),
        }),
    }
}

/// A compiled schema, reused for every file.
pub struct SchemaChecker {
    name: String,
    validator: Validator,
}

impl SchemaChecker {
    pub fn from_value(name: impl Into<String>, schema: &Value) -> Result<Self> {
        let name = name.into();
        let validator = jsonschema::validator_for(schema).map_err(|e| SchedError::SchemaError {
            schema: name.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { name, validator })
    }

    /// Load a schema written as JSON or YAML.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| SchedError::SchemaError {
            schema: name.clone(),
            reason: e.to_string(),
        })?;

        let schema: Value = match format_of(path) {
            Some(DocumentFormat::Json) => serde_json::from_str(&content)?,
            Some(DocumentFormat::Yaml) => serde_yaml::from_str(&content)?,
            _ => {
                return Err(SchedError::SchemaError {
                    schema: name,
                    reason: "schema must be a .json, .yml or .yaml file".to_string(),
                })
            }
        };

        Self::from_value(name, &schema)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn check_value(&self, instance: &Value, line: Option<usize>) -> Vec<Violation> {
        self.validator
            .iter_errors(instance)
            .map(|e| Violation {
                line,
                instance_path: e.instance_path.to_string(),
                message: e.to_string(),
            })
            .collect()
    }

    pub fn check_file(&self, path: &Path) -> FileReport {
        let status = match std::fs::read_to_string(path)
            .map_err(SchedError::from)
            .and_then(|content| parse_documents(path, &content))
        {
            Ok(documents) => {
                let violations: Vec<Violation> = documents
                    .iter()
                    .flat_map(|(line, doc)| self.check_value(doc, *line))
                    .collect();
                if violations.is_empty() {
                    FileStatus::Passed {
                        documents: documents.len(),
                    }
                } else {
                    FileStatus::Failed(violations)
                }
            }
            Err(e) => FileStatus::Unreadable(e.to_string()),
        };

        FileReport {
            path: path.to_path_buf(),
            status,
        }
    }

    /// Check every file whose extension is in `extensions`, never stopping early.
    pub fn check_files<P: AsRef<Path>>(
        &self,
        paths: &[P],
        extensions: &[String],
    ) -> ValidationSummary {
        let mut summary = ValidationSummary::default();

        for path in paths {
            let path = path.as_ref();
            let wanted = extension_of(path)
                .map(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(&ext)))
                .unwrap_or(false);
            if !wanted {
                tracing::debug!("Skipping {} (extension not selected)", path.display());
                summary.skipped.push(path.to_path_buf());
                continue;
            }

            let report = self.check_file(path);
            match &report.status {
                FileStatus::Passed { documents } => {
                    tracing::info!("✅ {} ({} documents)", path.display(), documents);
                }
                FileStatus::Failed(violations) => {
                    tracing::warn!("❌ {} ({} violations)", path.display(), violations.len());
                }
                FileStatus::Unreadable(reason) => {
                    tracing::warn!("❌ {} could not be read: {}", path.display(), reason);
                }
            }
            summary.reports.push(report);
        }

        summary
    }
}
