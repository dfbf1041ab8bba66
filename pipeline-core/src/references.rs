//! Reference validation
//!
//! Assets referenced into an animation scene must be published `_MASTER` files.
//! References whose file name starts with one of the configured prefixes are
//! checked for the suffix; anything else is exempt. Invalid references can be
//! swapped to the master file computed from their versioned path, provided that
//! file exists on disk.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::SceneError;
use crate::path_utils::{file_name, join_path, normalize_path, parent_dir, split_extension};
use crate::port::{FileSystem, SceneGraph};
use crate::types::{PipelineConfig, ReferenceId};

static VERSION_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_v\d+$").unwrap());

pub const MASTER_SUFFIX: &str = "_MASTER";
pub const VERSIONS_DIR: &str = "versions";

pub const REASON_EXEMPT: &str = "not subject to validation";
pub const REASON_MISSING_MASTER: &str = "missing _MASTER suffix";
pub const REASON_NO_PATH: &str = "could not get file path";

/// Validation result for one reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceRecord {
    #[serde(skip)]
    pub reference: ReferenceId,
    pub node: String,
    pub file_path: Option<String>,
    pub file_name: Option<String>,

    /// Matched prefix without its trailing underscore (`CH`, `PRP`)
    pub prefix: Option<String>,
    pub has_master_suffix: bool,
    pub is_valid: bool,
    pub reason: String,
}

impl ReferenceRecord {
    /// Whether the record was exempt from the suffix check
    pub fn is_exempt(&self) -> bool {
        self.prefix.is_none() && self.is_valid
    }

    /// Best name to show for the reference
    pub fn display_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or(&self.node)
    }
}

fn matching_prefix<'a>(stem: &str, prefixes: &'a [String]) -> Option<&'a str> {
    prefixes
        .iter()
        .find(|p| stem.starts_with(p.as_str()))
        .map(|p| p.as_str())
}

/// Classify a reference from its host name and backing path
pub fn classify_path(
    reference: ReferenceId,
    node: &str,
    path: Option<&str>,
    config: &PipelineConfig,
) -> ReferenceRecord {
    let mut record = ReferenceRecord {
        reference,
        node: node.to_string(),
        file_path: None,
        file_name: None,
        prefix: None,
        has_master_suffix: false,
        is_valid: true,
        reason: String::new(),
    };

    let Some(path) = path.filter(|p| !p.is_empty()) else {
        record.is_valid = false;
        record.reason = REASON_NO_PATH.to_string();
        return record;
    };

    let name = file_name(path);
    let (stem, _) = split_extension(name);
    record.file_path = Some(path.to_string());
    record.file_name = Some(name.to_string());

    let Some(prefix) = matching_prefix(stem, &config.master_prefixes) else {
        record.reason = REASON_EXEMPT.to_string();
        return record;
    };
    record.prefix = Some(prefix.trim_end_matches('_').to_string());

    if stem.contains(MASTER_SUFFIX) {
        record.has_master_suffix = true;
    } else {
        record.is_valid = false;
        record.reason = REASON_MISSING_MASTER.to_string();
    }
    record
}

/// Classify a live reference
pub fn classify<S: SceneGraph + ?Sized>(
    scene: &S,
    reference: ReferenceId,
    config: &PipelineConfig,
) -> Result<ReferenceRecord, SceneError> {
    let node = scene.reference_name(reference)?;
    let path = scene.reference_path(reference)?;
    Ok(classify_path(reference, &node, path.as_deref(), config))
}

/// Master path for a versioned file, `None` without a recognized prefix
///
/// `<dir>/versions/CH_X_rig_v007.ma` becomes `<dir>/CH_X_rig_MASTER.ma`: the
/// version suffix is dropped, `_MASTER` appended, and the file placed in the
/// parent of the `versions` directory.
pub fn compute_master_path(current_path: &str, config: &PipelineConfig) -> Option<String> {
    if current_path.is_empty() {
        return None;
    }
    let current = normalize_path(current_path);
    let (stem, extension) = split_extension(file_name(&current));
    matching_prefix(stem, &config.master_prefixes)?;

    let mut master_stem = VERSION_SUFFIX_RE.replace(stem, "").into_owned();
    if !master_stem.ends_with(MASTER_SUFFIX) {
        master_stem.push_str(MASTER_SUFFIX);
    }

    let dir = parent_dir(&current);
    let segments: Vec<&str> = dir.split('/').collect();
    let master_dir = match segments.iter().rposition(|s| *s == VERSIONS_DIR) {
        // `/versions` sits directly under the root
        Some(1) if segments[0].is_empty() => "/".to_string(),
        Some(idx) => segments[..idx].join("/"),
        None => dir.clone(),
    };
    Some(join_path(&master_dir, &format!("{}{}", master_stem, extension)))
}

/// Outcome of a single fix attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixResult {
    pub success: bool,
    pub master_path: Option<String>,
    pub error: String,
}

/// Swap a reference to its master file if that file exists
///
/// Nothing in the scene changes unless the master path resolves and exists.
pub fn fix_reference<S, F>(
    scene: &mut S,
    fs: &F,
    reference: ReferenceId,
    current_path: Option<&str>,
    config: &PipelineConfig,
) -> FixResult
where
    S: SceneGraph + ?Sized,
    F: FileSystem + ?Sized,
{
    let mut result = FixResult {
        success: false,
        master_path: None,
        error: String::new(),
    };

    let Some(master_path) = current_path.and_then(|p| compute_master_path(p, config)) else {
        result.error = "Could not construct master path".to_string();
        return result;
    };
    result.master_path = Some(master_path.clone());

    if !fs.exists(Path::new(&master_path)) {
        result.error = format!("Master file does not exist: {}", master_path);
        return result;
    }

    match scene.replace_reference(reference, &master_path) {
        Ok(()) => {
            tracing::info!("Reference updated to {}", file_name(&master_path));
            result.success = true;
        }
        Err(e) => result.error = format!("Failed to load reference: {}", e),
    }
    result
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedReference {
    pub node: String,
    pub old_file: String,
    pub new_file: String,
    pub master_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedFix {
    pub node: String,
    pub file: String,
    pub error: String,
    pub master_path: Option<String>,
}

/// Result of [`auto_fix_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AutoFixResult {
    pub fixed: Vec<FixedReference>,
    pub failed: Vec<FailedFix>,
}

impl AutoFixResult {
    pub fn total(&self) -> usize {
        self.fixed.len() + self.failed.len()
    }
}

/// Attempt every fix independently
pub fn auto_fix_all<S, F>(
    scene: &mut S,
    fs: &F,
    invalid: &[ReferenceRecord],
    config: &PipelineConfig,
) -> AutoFixResult
where
    S: SceneGraph + ?Sized,
    F: FileSystem + ?Sized,
{
    let mut outcome = AutoFixResult::default();
    for record in invalid {
        let result = fix_reference(scene, fs, record.reference, record.file_path.as_deref(), config);
        match (result.success, result.master_path) {
            (true, Some(master_path)) => outcome.fixed.push(FixedReference {
                node: record.node.clone(),
                old_file: record.display_name().to_string(),
                new_file: file_name(&master_path).to_string(),
                master_path,
            }),
            (_, master_path) => {
                tracing::warn!("Could not fix {}: {}", record.display_name(), result.error);
                outcome.failed.push(FailedFix {
                    node: record.node.clone(),
                    file: record.display_name().to_string(),
                    error: result.error,
                    master_path,
                });
            }
        }
    }
    tracing::info!(
        "Auto-fix: {} total, {} fixed, {} failed",
        outcome.total(),
        outcome.fixed.len(),
        outcome.failed.len()
    );
    outcome
}

/// Counts and records from a full reference scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceReport {
    pub total: usize,

    /// References that were subject to the suffix check
    pub checked: usize,
    pub valid: usize,
    pub invalid: Vec<ReferenceRecord>,
    pub skipped: Vec<ReferenceRecord>,
}

impl ReferenceReport {
    pub fn passed(&self) -> bool {
        self.invalid.is_empty()
    }
}

/// Classify every reference in the scene
pub fn check_references<S: SceneGraph + ?Sized>(
    scene: &S,
    config: &PipelineConfig,
) -> Result<ReferenceReport, SceneError> {
    let references = scene.references();
    let mut report = ReferenceReport {
        total: references.len(),
        ..Default::default()
    };

    for reference in references {
        let record = classify(scene, reference, config)?;
        if record.is_exempt() {
            tracing::debug!("[SKIP] {} - {}", record.display_name(), record.reason);
            report.skipped.push(record);
            continue;
        }

        report.checked += 1;
        if record.is_valid {
            tracing::debug!("[OK] {}", record.display_name());
            report.valid += 1;
        } else {
            tracing::warn!("[ERROR] {} - {}", record.display_name(), record.reason);
            report.invalid.push(record);
        }
    }

    tracing::info!(
        "References: {} total, {} checked, {} valid, {} invalid, {} skipped",
        report.total,
        report.checked,
        report.valid,
        report.invalid.len(),
        report.skipped.len()
    );
    Ok(report)
}
