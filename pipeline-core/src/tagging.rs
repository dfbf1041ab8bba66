//! Asset tagging workflows
//!
//! Operations run from asset and layout scenes to prepare nodes for the animation
//! organizer: wrapping an asset in its master group, flagging the shot camera and
//! flagging the exportable skeleton root.

use serde::Serialize;

use crate::attributes::{ensure_attribute, set_locked_string};
use crate::error::{PipelineError, Result};
use crate::hierarchy::CAMERA_LABEL;
use crate::naming::{has_camtools_pattern, parse_asset_identity, AssetIdentity};
use crate::port::SceneGraph;
use crate::templates::TEMPLATE_PATTERN;
use crate::types::{names, NodeId, NodeKind, SceneContext};

/// Whether a master group was built or an existing one re-stamped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum MasterGroupOutcome {
    Created { grouped: Vec<String> },
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MasterGroupReport {
    pub group: String,
    pub identity: AssetIdentity,
    #[serde(flatten)]
    pub outcome: MasterGroupOutcome,
}

fn stamp_master_attributes<S: SceneGraph + ?Sized>(
    scene: &mut S,
    group: NodeId,
    identity: &AssetIdentity,
) -> Result<()> {
    set_locked_string(scene, group, names::HIERARCHY, TEMPLATE_PATTERN)?;
    set_locked_string(scene, group, names::CATEGORY, &identity.category)?;
    set_locked_string(scene, group, names::NAME, &identity.asset_name)?;
    set_locked_string(scene, group, names::ID, &identity.discipline_id)?;
    Ok(())
}

/// Root nodes that belong inside the asset's master group
fn groupable_roots<S: SceneGraph + ?Sized>(scene: &S) -> Result<Vec<NodeId>> {
    let mut roots = Vec::new();
    for id in scene.nodes() {
        if scene.parent(id)?.is_some() {
            continue;
        }
        match scene.kind(id)? {
            NodeKind::Camera | NodeKind::Light => continue,
            NodeKind::Group | NodeKind::Transform | NodeKind::Mesh | NodeKind::Joint => {
                roots.push(id)
            }
        }
    }
    Ok(roots)
}

/// Wrap the asset in `<CAT>_<NAME>_<ID>_MASTER_GRP`, named from the scene file
///
/// An existing master group only gets its attributes re-stamped.
pub fn create_master_group<S: SceneGraph + ?Sized>(
    scene: &mut S,
    ctx: &SceneContext,
) -> Result<MasterGroupReport> {
    let stem = ctx.scene_stem().ok_or(PipelineError::UnsavedScene)?;
    let identity = parse_asset_identity(stem);
    let group_name = identity.master_group_name();
    tracing::info!(
        "Asset {}: category {}, name {}, id {}",
        stem,
        identity.category,
        identity.asset_name,
        identity.discipline_id
    );

    if let Some(existing) = scene.find(&group_name) {
        tracing::info!("'{}' already exists, updating attributes", group_name);
        stamp_master_attributes(scene, existing, &identity)?;
        return Ok(MasterGroupReport {
            group: group_name,
            identity,
            outcome: MasterGroupOutcome::Updated,
        });
    }

    let roots = groupable_roots(scene)?;
    if roots.is_empty() {
        return Err(PipelineError::NothingToGroup);
    }

    let group = scene.create_group(&group_name)?;
    let mut grouped = Vec::with_capacity(roots.len());
    for node in roots {
        scene.set_parent(node, Some(group))?;
        grouped.push(scene.name(node)?);
    }
    stamp_master_attributes(scene, group, &identity)?;
    tracing::info!("Grouped {} nodes under '{}'", grouped.len(), group_name);

    Ok(MasterGroupReport {
        group: group_name,
        identity,
        outcome: MasterGroupOutcome::Created { grouped },
    })
}

/// Attributes stamped on the shot camera
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraReport {
    pub camera: String,
    pub camtools_logic: bool,
    pub is_in_group: bool,
}

/// First selected node, checked against the expected kind
fn selected_of_kind<S: SceneGraph + ?Sized>(
    scene: &S,
    ctx: &SceneContext,
    expected: NodeKind,
) -> Result<NodeId> {
    let node = *ctx.selection.first().ok_or(PipelineError::NoSelection)?;
    let actual = scene.kind(node)?;
    if actual != expected {
        return Err(PipelineError::WrongNodeKind {
            name: scene.name(node)?,
            expected,
            actual,
        });
    }
    Ok(node)
}

/// Mark the selected camera as the one exported for the engine
pub fn set_camera<S: SceneGraph + ?Sized>(scene: &mut S, ctx: &SceneContext) -> Result<CameraReport> {
    let camera = selected_of_kind(scene, ctx, NodeKind::Camera)?;
    let name = scene.name(camera)?;
    let camtools_logic = has_camtools_pattern(&name);
    let is_in_group = scene.parent(camera)?.is_some();

    set_locked_string(scene, camera, names::HIERARCHY, CAMERA_LABEL)?;
    ensure_attribute(scene, camera, names::UNREAL_CAMERA, true, false)?;
    ensure_attribute(scene, camera, names::CAMTOOLS_LOGIC, camtools_logic, false)?;
    ensure_attribute(scene, camera, names::IS_IN_GROUP, is_in_group, false)?;
    tracing::info!(
        "Camera '{}' set (CamToolsLogic = {}, IsInGroup = {})",
        name,
        camtools_logic,
        is_in_group
    );

    Ok(CameraReport {
        camera: name,
        camtools_logic,
        is_in_group,
    })
}

/// Flag the selected joint as the skeleton root to export; returns its name
pub fn mark_skeleton<S: SceneGraph + ?Sized>(scene: &mut S, ctx: &SceneContext) -> Result<String> {
    let joint = selected_of_kind(scene, ctx, NodeKind::Joint)?;
    ensure_attribute(scene, joint, names::FBX_EXPORTABLE, true, false)?;
    let name = scene.name(joint)?;
    tracing::info!("Skeleton '{}' marked as exportable", name);
    Ok(name)
}
