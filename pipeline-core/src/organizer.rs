//! Animation scene organizer
//!
//! Builds the `ANIMATION` hierarchy of a shot scene: the root group carrying the
//! shot's export path, one container per category, the camera container's export
//! attributes, then template expansion and hierarchy resolution over everything.

use serde::Serialize;

use crate::attributes::{ensure_attribute, get_string, has_attribute, set_locked_string};
use crate::error::{PipelineError, Result};
use crate::hierarchy::{organize, OrganizeReport, CAMERA_LABEL};
use crate::naming::{export_root, parse_shot_identity, ShotIdentity};
use crate::port::SceneGraph;
use crate::templates::{expand_templates, stamp_export_attributes};
use crate::types::{names, FrameRange, NodeId, PipelineConfig, SceneContext};

/// Root group of an animation scene
pub const ANIMATION_GROUP: &str = "ANIMATION";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationReport {
    pub shot: ShotIdentity,
    pub export_root: String,

    /// `ExportedName` given to the camera container, if there is one
    pub camera_exported_name: Option<String>,

    /// Existing export groups whose attributes were re-derived
    pub refreshed: Vec<String>,

    /// Groups created from templates
    pub created: Vec<String>,

    pub organized: OrganizeReport,
}

/// `CAM_<SQ>_<SH>_<start>_<end>`
pub fn camera_exported_name(shot: &ShotIdentity, range: FrameRange) -> String {
    format!("CAM_{}_{}_{}_{}", shot.sequence, shot.shot, range.start, range.end)
}

/// Find or create `name`, make sure it sits under `parent` and declares itself
fn ensure_container<S: SceneGraph + ?Sized>(
    scene: &mut S,
    parent: NodeId,
    name: &str,
) -> Result<NodeId> {
    let node = match scene.find(name) {
        Some(node) => node,
        None => {
            tracing::debug!("Creating container '{}'", name);
            scene.create_group(name)?
        }
    };
    if scene.parent(node)? != Some(parent) {
        scene.set_parent(node, Some(parent))?;
    }
    set_locked_string(scene, node, names::HIERARCHY, name)?;
    Ok(node)
}

fn setup_camera_container<S: SceneGraph + ?Sized>(
    scene: &mut S,
    camera: NodeId,
    shot: &ShotIdentity,
    root: &str,
    playback: FrameRange,
) -> Result<String> {
    let exported_name = camera_exported_name(shot, playback);
    set_locked_string(scene, camera, names::EXPORTED_NAME, &exported_name)?;
    set_locked_string(scene, camera, names::PATH, &format!("{}/Camera", root))?;
    ensure_attribute(scene, camera, names::EXPORTABLE, true, false)?;
    tracing::info!("CAMERA configured as '{}'", exported_name);
    Ok(exported_name)
}

/// Re-derive export attributes of every group already carrying `ExportedName`
///
/// The camera container is left out, it follows its own naming rule.
fn refresh_export_groups<S: SceneGraph + ?Sized>(
    scene: &mut S,
    shot: &ShotIdentity,
    root: &str,
) -> Result<Vec<String>> {
    let mut refreshed = Vec::new();
    for node in scene.nodes() {
        let name = scene.name(node)?;
        if name == CAMERA_LABEL || !has_attribute(scene, node, names::EXPORTED_NAME) {
            continue;
        }
        let Ok(Some(category)) = get_string(scene, node, names::HIERARCHY) else {
            continue;
        };
        stamp_export_attributes(scene, node, &category, shot, root)?;
        refreshed.push(name);
    }
    Ok(refreshed)
}

/// Organize a shot scene named `..._anim_...`
pub fn organize_animation<S: SceneGraph + ?Sized>(
    scene: &mut S,
    ctx: &SceneContext,
    config: &PipelineConfig,
) -> Result<AnimationReport> {
    let scene_name = ctx.scene_name().ok_or(PipelineError::UnsavedScene)?;
    if !scene_name
        .to_lowercase()
        .contains(&config.animation_marker.to_lowercase())
    {
        return Err(PipelineError::NotAnimationScene(scene_name.to_string()));
    }

    let shot = parse_shot_identity(scene_name);
    let root = export_root(&shot, config);
    tracing::info!("Organizing {} ({} {}) -> {}", scene_name, shot.sequence, shot.shot, root);

    let animation = match scene.find(ANIMATION_GROUP) {
        Some(node) => node,
        None => scene.create_group(ANIMATION_GROUP)?,
    };
    set_locked_string(scene, animation, names::EXPORTED_PATH, &root)?;
    set_locked_string(scene, animation, names::SEQUENCE, &shot.sequence)?;
    set_locked_string(scene, animation, names::SHOT, &shot.shot)?;

    for container in &config.containers {
        ensure_container(scene, animation, container)?;
    }

    let camera_exported_name = match scene.find(CAMERA_LABEL) {
        Some(camera) => Some(setup_camera_container(
            scene,
            camera,
            &shot,
            &root,
            ctx.playback,
        )?),
        None => None,
    };

    let refreshed = refresh_export_groups(scene, &shot, &root)?;
    let created = expand_templates(scene, &shot, &root)?;

    let mut organized = organize(scene, ANIMATION_GROUP)?;
    for container in &config.containers {
        organized.merge(organize(scene, container)?);
    }

    tracing::info!(
        "Organized: {} groups created, {} refreshed, {} moves",
        created.len(),
        refreshed.len(),
        organized.moves.len()
    );

    Ok(AnimationReport {
        shot,
        export_root: root,
        camera_exported_name,
        refreshed,
        created,
        organized,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::get_bool;
    use crate::memory::MemoryScene;
    use crate::templates::TEMPLATE_PATTERN;
    use crate::types::{Attribute, NodeKind};

    const SCENE: &str = "/proj/scenes/PKL_S02_SH030_anim_v004.ma";
    const ROOT: &str = "<workspace_root>/Unreal/animation/PKL_S02/SH030";

    fn shot_ctx() -> SceneContext {
        SceneContext {
            scene_path: Some(SCENE.to_string()),
            workspace_root: "/proj".to_string(),
            playback: FrameRange::new(1001, 1120),
            selection: vec![],
        }
    }

    fn referenced_asset(scene: &mut MemoryScene, node: &str, category: &str, name: &str) -> NodeId {
        let id = scene.add_node(node, NodeKind::Group, None).unwrap();
        set_locked_string(scene, id, names::HIERARCHY, TEMPLATE_PATTERN).unwrap();
        set_locked_string(scene, id, names::CATEGORY, category).unwrap();
        set_locked_string(scene, id, names::NAME, name).unwrap();
        id
    }

    #[test]
    fn test_preconditions() {
        let mut scene = MemoryScene::new();
        let config = PipelineConfig::default();

        assert!(matches!(
            organize_animation(&mut scene, &SceneContext::default(), &config),
            Err(PipelineError::UnsavedScene)
        ));
        let ctx = SceneContext {
            scene_path: Some("/proj/CH_Hero_001_rig_v03.ma".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            organize_animation(&mut scene, &ctx, &config),
            Err(PipelineError::NotAnimationScene(_))
        ));
        assert_eq!(scene.node_count(), 0);
    }

    #[test]
    fn test_builds_animation_hierarchy() {
        let mut scene = MemoryScene::new();
        let hero = referenced_asset(&mut scene, "hero:CH_HERO_RIG_MASTER_GRP", "CH", "Hero");
        let lamp = referenced_asset(&mut scene, "lamp:PR_LAMP_MODEL_MASTER_GRP", "PR", "Lamp");
        let cam = scene.add_node("shotCam", NodeKind::Camera, None).unwrap();
        set_locked_string(&mut scene, cam, names::HIERARCHY, "CAMERA").unwrap();

        let report = organize_animation(&mut scene, &shot_ctx(), &PipelineConfig::default()).unwrap();
        assert_eq!(report.export_root, ROOT);
        assert_eq!(report.created, vec!["Hero_1".to_string(), "Lamp_1".to_string()]);
        assert_eq!(report.camera_exported_name.as_deref(), Some("CAM_S02_SH030_1001_1120"));

        let animation = scene.find(ANIMATION_GROUP).unwrap();
        assert_eq!(
            scene.attribute(animation, names::EXPORTED_PATH).unwrap(),
            Some(Attribute::locked(ROOT))
        );
        assert_eq!(
            get_string(&scene, animation, names::SHOT).unwrap(),
            Some("SH030".to_string())
        );

        let ch = scene.find("CH").unwrap();
        let pr = scene.find("PR").unwrap();
        let camera = scene.find("CAMERA").unwrap();
        for container in [ch, pr, camera] {
            assert_eq!(scene.parent(container).unwrap(), Some(animation));
        }

        let hero_1 = scene.find("Hero_1").unwrap();
        assert_eq!(scene.parent(hero_1).unwrap(), Some(ch));
        assert_eq!(scene.parent(hero).unwrap(), Some(hero_1));
        assert_eq!(scene.parent(scene.find("Lamp_1").unwrap()).unwrap(), Some(pr));
        assert_eq!(scene.parent(lamp).unwrap(), scene.find("Lamp_1"));
        assert_eq!(scene.parent(cam).unwrap(), Some(camera));

        assert_eq!(
            get_string(&scene, camera, names::PATH).unwrap(),
            Some(format!("{}/Camera", ROOT))
        );
        assert_eq!(get_bool(&scene, camera, names::EXPORTABLE).unwrap(), Some(true));
        assert_eq!(
            get_string(&scene, hero_1, names::EXPORTED_NAME).unwrap(),
            Some("CH_Hero_1_S02_SH030".to_string())
        );
    }

    #[test]
    fn test_second_run_is_stable() {
        let mut scene = MemoryScene::new();
        referenced_asset(&mut scene, "hero:CH_HERO_RIG_MASTER_GRP", "CH", "Hero");
        let config = PipelineConfig::default();

        organize_animation(&mut scene, &shot_ctx(), &config).unwrap();
        let count = scene.node_count();

        let report = organize_animation(&mut scene, &shot_ctx(), &config).unwrap();
        assert!(report.created.is_empty());
        assert!(report.organized.moves.is_empty());
        assert_eq!(report.refreshed, vec!["Hero_1".to_string()]);
        assert_eq!(scene.node_count(), count);
    }

    #[test]
    fn test_refresh_follows_new_shot() {
        let mut scene = MemoryScene::new();
        referenced_asset(&mut scene, "hero:CH_HERO_RIG_MASTER_GRP", "CH", "Hero");
        let config = PipelineConfig::default();
        organize_animation(&mut scene, &shot_ctx(), &config).unwrap();

        let mut ctx = shot_ctx();
        ctx.scene_path = Some("/proj/scenes/PKL_S05_SH100_anim_v001.ma".to_string());
        ctx.playback = FrameRange::new(1, 48);
        organize_animation(&mut scene, &ctx, &config).unwrap();

        let hero_1 = scene.find("Hero_1").unwrap();
        assert_eq!(
            get_string(&scene, hero_1, names::EXPORTED_NAME).unwrap(),
            Some("CH_Hero_1_S05_SH100".to_string())
        );
        assert_eq!(
            get_string(&scene, hero_1, names::PATH).unwrap(),
            Some("<workspace_root>/Unreal/animation/PKL_S05/SH100/CH".to_string())
        );
        let camera = scene.find("CAMERA").unwrap();
        assert_eq!(
            get_string(&scene, camera, names::EXPORTED_NAME).unwrap(),
            Some("CAM_S05_SH100_1_48".to_string())
        );
    }

    #[test]
    fn test_existing_containers_are_moved_under_animation() {
        let mut scene = MemoryScene::new();
        let ch = scene.create_group("CH").unwrap();
        let config = PipelineConfig::default();
        organize_animation(&mut scene, &shot_ctx(), &config).unwrap();
        assert_eq!(scene.parent(ch).unwrap(), scene.find(ANIMATION_GROUP));
    }

    #[test]
    fn test_grouped_camera_stays_put() {
        let mut scene = MemoryScene::new();
        let rig = scene.create_group("camRig").unwrap();
        let cam = scene.add_node("shotCam_FR_10_40", NodeKind::Camera, Some(rig)).unwrap();
        set_locked_string(&mut scene, cam, names::HIERARCHY, "CAMERA").unwrap();
        ensure_attribute(&mut scene, cam, names::IS_IN_GROUP, true, false).unwrap();

        let report = organize_animation(&mut scene, &shot_ctx(), &PipelineConfig::default()).unwrap();
        assert_eq!(scene.parent(cam).unwrap(), Some(rig));
        assert_eq!(report.organized.skipped.len(), 1);
    }
}
