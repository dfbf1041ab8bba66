//! Export graph resolution
//!
//! Turns a selection into the set of exportable groups, resolves each group's
//! skeleton and output path, and drives the export engine one unit at a time. A
//! unit that fails never stops the batch.

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;

use crate::attributes::{get_string, is_flag_set};
use crate::error::SceneError;
use crate::naming::frame_range_from_name;
use crate::path_utils::{join_path, resolve_workspace_path};
use crate::port::{BakePreset, BakeRequest, ExportEngine, FileSystem, SceneGraph};
use crate::types::{names, FrameRange, NodeId, NodeKind, PipelineConfig, SceneContext};

/// Reason recorded for units without a marked skeleton
pub const NO_SKELETON_REASON: &str = "no exportable skeleton";

/// Reason recorded for units whose group has `Exportable` turned off
pub const EXPORT_DISABLED_REASON: &str = "export disabled on group";

/// Whether `node` has non-empty `ExportedName` and `Path` and `Exportable = true`
pub fn is_exportable<S: SceneGraph + ?Sized>(scene: &S, node: NodeId) -> bool {
    let non_empty = |attr: &str| matches!(get_string(scene, node, attr), Ok(Some(v)) if !v.is_empty());
    non_empty(names::EXPORTED_NAME)
        && non_empty(names::PATH)
        && is_flag_set(scene, node, names::EXPORTABLE)
}

/// Direct children of `node` that are exportable
pub fn exportable_children<S: SceneGraph + ?Sized>(
    scene: &S,
    node: NodeId,
) -> Result<Vec<NodeId>, SceneError> {
    Ok(scene
        .children(node)?
        .into_iter()
        .filter(|child| is_exportable(scene, *child))
        .collect())
}

/// Every exportable node in the scene
pub fn all_exportable<S: SceneGraph + ?Sized>(scene: &S) -> Vec<NodeId> {
    scene
        .nodes()
        .into_iter()
        .filter(|id| is_exportable(scene, *id))
        .collect()
}

/// Outcome of [`resolve_selection`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSelection {
    /// Exportable groups, deduplicated, in discovery order
    pub nodes: Vec<NodeId>,

    /// Selected nodes that were neither a container nor exportable
    pub ignored: Vec<String>,
}

/// Expand a selection into exportable groups
///
/// A selected container (by `Hierarchy` label) that is not itself exportable stands
/// for its exportable direct children. An exportable node stands for itself.
pub fn resolve_selection<S: SceneGraph + ?Sized>(
    scene: &S,
    selected: &[NodeId],
    config: &PipelineConfig,
) -> Result<ResolvedSelection, SceneError> {
    let mut resolved = ResolvedSelection::default();
    let mut seen = HashSet::new();

    for &node in selected {
        let exportable = is_exportable(scene, node);
        let is_container = matches!(
            get_string(scene, node, names::HIERARCHY),
            Ok(Some(h)) if config.is_container(&h)
        );

        if is_container && !exportable {
            tracing::debug!("Container '{}' selected, collecting children", scene.name(node)?);
            for child in exportable_children(scene, node)? {
                if seen.insert(child) {
                    resolved.nodes.push(child);
                }
            }
        } else if exportable {
            if seen.insert(node) {
                resolved.nodes.push(node);
            }
        } else {
            let name = scene.name(node)?;
            tracing::info!("Skipping '{}': not an exportable group or container", name);
            resolved.ignored.push(name);
        }
    }
    Ok(resolved)
}

/// Replace the workspace placeholder in a `Path` template and normalize separators
pub fn resolve_output_path(path_template: &str, workspace_root: &str, config: &PipelineConfig) -> String {
    resolve_workspace_path(path_template, &config.workspace_token, workspace_root)
}

/// First descendant joint flagged `FBX_exportable = true`
pub fn find_export_skeleton<S: SceneGraph + ?Sized>(
    scene: &S,
    node: NodeId,
) -> Result<Option<NodeId>, SceneError> {
    for id in scene.descendants(node)? {
        if scene.kind(id)? == NodeKind::Joint && is_flag_set(scene, id, names::FBX_EXPORTABLE) {
            return Ok(Some(id));
        }
    }
    Ok(None)
}

/// Bake range for a target: a `_FR_<start>_<end>` range in its name wins over playback
pub fn bake_range(target_name: &str, playback: FrameRange) -> FrameRange {
    frame_range_from_name(target_name).unwrap_or(playback)
}

/// A resolved export entity, built per run and never persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportUnit {
    /// Group carrying the export attributes
    pub node: NodeId,
    pub node_name: String,
    pub exported_name: String,
    pub path_template: String,

    /// Whether the group was exportable when the unit was built; disabled units fail
    pub exportable: bool,

    /// Node handed to the engine (skeleton root or camera)
    pub target: Option<NodeId>,

    pub preset: BakePreset,

    /// Range fixed at resolution time; playback is used when absent
    pub range: Option<FrameRange>,
}

/// Build a skeleton export unit from an exportable group
pub fn skeleton_unit<S: SceneGraph + ?Sized>(
    scene: &S,
    node: NodeId,
) -> Result<ExportUnit, SceneError> {
    Ok(ExportUnit {
        node,
        node_name: scene.name(node)?,
        exported_name: get_string(scene, node, names::EXPORTED_NAME)?.unwrap_or_default(),
        path_template: get_string(scene, node, names::PATH)?.unwrap_or_default(),
        exportable: is_exportable(scene, node),
        target: find_export_skeleton(scene, node)?,
        preset: BakePreset::Skeleton,
        range: None,
    })
}

/// How a single unit ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum UnitOutcome {
    Exported { path: String },
    SkippedNoSkeleton { reason: String },
    Failed { reason: String },
}

/// Per-unit result for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitReport {
    pub node: String,
    pub exported_name: String,
    #[serde(flatten)]
    pub outcome: UnitOutcome,
}

/// Batch export summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub succeeded: Vec<UnitReport>,
    pub skipped_no_skeleton: Vec<UnitReport>,
    pub failed: Vec<UnitReport>,
}

impl ExportSummary {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.skipped_no_skeleton.len() + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.skipped_no_skeleton.is_empty()
    }

    fn record(&mut self, report: UnitReport) {
        match report.outcome {
            UnitOutcome::Exported { .. } => self.succeeded.push(report),
            UnitOutcome::SkippedNoSkeleton { .. } => self.skipped_no_skeleton.push(report),
            UnitOutcome::Failed { .. } => self.failed.push(report),
        }
    }
}

/// Collaborators and settings shared by every unit of a batch
pub struct ExportJob<'a, F: FileSystem + ?Sized, E: ExportEngine + ?Sized> {
    pub fs: &'a F,
    pub engine: &'a mut E,
    pub config: &'a PipelineConfig,
    pub workspace_root: &'a str,
    pub playback: FrameRange,
}

impl<'a, F: FileSystem + ?Sized, E: ExportEngine + ?Sized> ExportJob<'a, F, E> {
    pub fn new(fs: &'a F, engine: &'a mut E, config: &'a PipelineConfig, ctx: &'a SceneContext) -> Self {
        Self {
            fs,
            engine,
            config,
            workspace_root: &ctx.workspace_root,
            playback: ctx.playback,
        }
    }

    /// Export one unit: resolve and create the directory, bake, then verify the file
    pub fn export_unit<S: SceneGraph + ?Sized>(&mut self, scene: &S, unit: &ExportUnit) -> UnitOutcome {
        tracing::info!("Processing '{}' as '{}'", unit.node_name, unit.exported_name);

        if !unit.exportable {
            tracing::error!("'{}' failed: {}", unit.node_name, EXPORT_DISABLED_REASON);
            return UnitOutcome::Failed {
                reason: EXPORT_DISABLED_REASON.to_string(),
            };
        }

        let Some(target) = unit.target else {
            tracing::warn!("'{}' skipped: {}", unit.node_name, NO_SKELETON_REASON);
            return UnitOutcome::SkippedNoSkeleton {
                reason: NO_SKELETON_REASON.to_string(),
            };
        };

        let export_dir = resolve_output_path(&unit.path_template, self.workspace_root, self.config);
        if !self.fs.exists(Path::new(&export_dir)) {
            if let Err(e) = self.fs.create_dir_all(Path::new(&export_dir)) {
                tracing::error!("Could not create directory {}: {}", export_dir, e);
                return UnitOutcome::Failed {
                    reason: format!("Could not create directory: {}", e),
                };
            }
            tracing::debug!("Directory created: {}", export_dir);
        }

        let file_path = join_path(
            &export_dir,
            &format!("{}.{}", unit.exported_name, self.config.export_extension),
        );

        let request = match self.bake_request(scene, unit, target, &file_path) {
            Ok(request) => request,
            Err(e) => {
                return UnitOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        if let Err(e) = self.engine.export(&request) {
            tracing::error!("'{}' failed: {}", unit.node_name, e);
            return UnitOutcome::Failed {
                reason: e.to_string(),
            };
        }

        if self.fs.exists(Path::new(&file_path)) {
            tracing::info!("Exported {}", file_path);
            UnitOutcome::Exported { path: file_path }
        } else {
            tracing::error!("'{}' reported success but {} is missing", unit.node_name, file_path);
            UnitOutcome::Failed {
                reason: "File was not created".to_string(),
            }
        }
    }

    fn bake_request<S: SceneGraph + ?Sized>(
        &self,
        scene: &S,
        unit: &ExportUnit,
        target: NodeId,
        file_path: &str,
    ) -> Result<BakeRequest, SceneError> {
        let mut members = vec![scene.name(target)?];
        for id in scene.descendants(target)? {
            members.push(scene.name(id)?);
        }
        Ok(BakeRequest {
            target: scene.name(target)?,
            members,
            file_path: file_path.to_string(),
            range: unit.range.unwrap_or(self.playback),
            preset: unit.preset,
        })
    }

    /// Export every unit in order; failures are collected, never propagated
    pub fn export_all<S: SceneGraph + ?Sized>(&mut self, scene: &S, units: &[ExportUnit]) -> ExportSummary {
        let mut summary = ExportSummary::default();
        for unit in units {
            let outcome = self.export_unit(scene, unit);
            summary.record(UnitReport {
                node: unit.node_name.clone(),
                exported_name: unit.exported_name.clone(),
                outcome,
            });
        }
        tracing::info!(
            "Export finished: {} succeeded, {} without skeleton, {} failed",
            summary.succeeded.len(),
            summary.skipped_no_skeleton.len(),
            summary.failed.len()
        );
        summary
    }
}
