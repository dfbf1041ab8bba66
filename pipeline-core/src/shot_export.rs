//! Export workflows
//!
//! Selection export, whole-scene export and the shot camera export. All three
//! resolve [`ExportUnit`]s from the scene and hand them to an [`ExportJob`].

use crate::attributes::{get_bool, get_string, is_flag_set};
use crate::error::{PipelineError, Result};
use crate::export::{
    all_exportable, bake_range, resolve_selection, skeleton_unit, ExportJob, ExportSummary,
    ExportUnit, UnitReport,
};
use crate::hierarchy::CAMERA_LABEL;
use crate::port::{BakePreset, ExportEngine, FileSystem, SceneGraph};
use crate::types::{names, FrameRange, NodeId, NodeKind, PipelineConfig, SceneContext};

fn export_units<S, F, E>(
    scene: &S,
    nodes: &[NodeId],
    job: &mut ExportJob<'_, F, E>,
) -> Result<ExportSummary>
where
    S: SceneGraph + ?Sized,
    F: FileSystem + ?Sized,
    E: ExportEngine + ?Sized,
{
    let units = nodes
        .iter()
        .map(|node| skeleton_unit(scene, *node))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(job.export_all(scene, &units))
}

/// Export the groups reachable from the current selection
pub fn export_selected<S, F, E>(
    scene: &S,
    ctx: &SceneContext,
    config: &PipelineConfig,
    fs: &F,
    engine: &mut E,
) -> Result<ExportSummary>
where
    S: SceneGraph + ?Sized,
    F: FileSystem + ?Sized,
    E: ExportEngine + ?Sized,
{
    if ctx.selection.is_empty() {
        return Err(PipelineError::NoSelection);
    }
    let resolved = resolve_selection(scene, &ctx.selection, config)?;
    if resolved.nodes.is_empty() {
        return Err(PipelineError::NothingToExport);
    }
    tracing::info!("Exporting {} group(s) from selection", resolved.nodes.len());

    let mut job = ExportJob::new(fs, engine, config, ctx);
    export_units(scene, &resolved.nodes, &mut job)
}

/// Export every exportable group in the scene
pub fn export_scene<S, F, E>(
    scene: &S,
    ctx: &SceneContext,
    config: &PipelineConfig,
    fs: &F,
    engine: &mut E,
) -> Result<ExportSummary>
where
    S: SceneGraph + ?Sized,
    F: FileSystem + ?Sized,
    E: ExportEngine + ?Sized,
{
    let nodes = all_exportable(scene);
    if nodes.is_empty() {
        return Err(PipelineError::NothingToExport);
    }
    tracing::info!("Exporting {} group(s) from scene", nodes.len());

    let mut job = ExportJob::new(fs, engine, config, ctx);
    export_units(scene, &nodes, &mut job)
}

/// First camera under `CAMERA` flagged `UnrealCamera = true`
pub fn find_unreal_camera<S: SceneGraph + ?Sized>(scene: &S) -> Result<Option<NodeId>> {
    let Some(container) = scene.find(CAMERA_LABEL) else {
        return Ok(None);
    };
    for node in scene.descendants(container)? {
        if scene.kind(node)? == NodeKind::Camera && is_flag_set(scene, node, names::UNREAL_CAMERA) {
            return Ok(Some(node));
        }
    }
    Ok(None)
}

/// Camera unit built from the `CAMERA` container's export attributes
///
/// A `_FR_<start>_<end>` range in the camera name overrides playback.
pub fn camera_unit<S: SceneGraph + ?Sized>(scene: &S, playback: FrameRange) -> Result<ExportUnit> {
    let camera = find_unreal_camera(scene)?.ok_or(PipelineError::NoUnrealCamera)?;
    let container = scene
        .find(CAMERA_LABEL)
        .ok_or_else(|| PipelineError::MissingGroup(CAMERA_LABEL.to_string()))?;

    let exported_name = get_string(scene, container, names::EXPORTED_NAME)?.unwrap_or_default();
    let path_template = get_string(scene, container, names::PATH)?.unwrap_or_default();
    if exported_name.is_empty() || path_template.is_empty() {
        return Err(PipelineError::MissingCameraInfo);
    }
    // An absent flag counts as enabled
    if get_bool(scene, container, names::EXPORTABLE)? == Some(false) {
        return Err(PipelineError::CameraExportDisabled);
    }

    let camera_name = scene.name(camera)?;
    let range = bake_range(&camera_name, playback);
    tracing::info!("Camera '{}' bakes frames {}", camera_name, range);

    Ok(ExportUnit {
        node: container,
        node_name: CAMERA_LABEL.to_string(),
        exported_name,
        path_template,
        exportable: true,
        target: Some(camera),
        preset: BakePreset::Camera,
        range: Some(range),
    })
}

/// Export the shot camera
pub fn export_camera<S, F, E>(
    scene: &S,
    ctx: &SceneContext,
    config: &PipelineConfig,
    fs: &F,
    engine: &mut E,
) -> Result<UnitReport>
where
    S: SceneGraph + ?Sized,
    F: FileSystem + ?Sized,
    E: ExportEngine + ?Sized,
{
    let unit = camera_unit(scene, ctx.playback)?;
    let mut job = ExportJob::new(fs, engine, config, ctx);
    let outcome = job.export_unit(scene, &unit);
    Ok(UnitReport {
        node: unit.node_name,
        exported_name: unit.exported_name,
        outcome,
    })
}
