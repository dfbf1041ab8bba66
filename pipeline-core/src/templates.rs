//! Template expansion
//!
//! A template is a node declaring `Category`, `Name` and a `Hierarchy` containing
//! `{Name}_#`. Each template gets wrapped in a fresh numbered group
//! (`<Name>_<N>`) carrying the export attributes for its category.

use crate::attributes::{ensure_attribute, get_string, set_locked_string};
use crate::error::SceneError;
use crate::naming::ShotIdentity;
use crate::port::SceneGraph;
use crate::types::{names, NodeId};

/// Hierarchy pattern marking a template node
pub const TEMPLATE_PATTERN: &str = "{Name}_#";

/// A template node's declared identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub node: NodeId,
    pub category: String,
    pub name: String,
}

/// Read the template triple from `node`, if it declares one
pub fn as_template<S: SceneGraph + ?Sized>(scene: &S, node: NodeId) -> Option<Template> {
    let category = get_string(scene, node, names::CATEGORY).ok()??;
    let hierarchy = get_string(scene, node, names::HIERARCHY).ok()??;
    let name = get_string(scene, node, names::NAME).ok()??;
    if !hierarchy.contains(TEMPLATE_PATTERN) {
        return None;
    }
    Some(Template {
        node,
        category,
        name,
    })
}

/// `<Category>_<group>_<sequence>_<shot>`
pub fn group_exported_name(category: &str, group: &str, shot: &ShotIdentity) -> String {
    format!("{}_{}_{}_{}", category, group, shot.sequence, shot.shot)
}

/// Stamp `ExportedName` and `Path` (locked) and `Exportable` on a group
///
/// The exported name is derived from the group's current name, so this is also how
/// existing groups are refreshed after a scene is renamed to another shot.
pub fn stamp_export_attributes<S: SceneGraph + ?Sized>(
    scene: &mut S,
    node: NodeId,
    category: &str,
    shot: &ShotIdentity,
    export_root: &str,
) -> Result<(), SceneError> {
    let group = scene.name(node)?;
    set_locked_string(
        scene,
        node,
        names::EXPORTED_NAME,
        &group_exported_name(category, &group, shot),
    )?;
    set_locked_string(
        scene,
        node,
        names::PATH,
        &format!("{}/{}", export_root, category),
    )?;
    ensure_attribute(scene, node, names::EXPORTABLE, true, false)
}

/// Stamp a fresh export group: locked `Hierarchy` plus the export attributes
pub fn stamp_export_group<S: SceneGraph + ?Sized>(
    scene: &mut S,
    node: NodeId,
    category: &str,
    shot: &ShotIdentity,
    export_root: &str,
) -> Result<(), SceneError> {
    set_locked_string(scene, node, names::HIERARCHY, category)?;
    stamp_export_attributes(scene, node, category, shot, export_root)
}

/// Whether the template already sits in a group instantiated for it
fn already_instantiated<S: SceneGraph + ?Sized>(
    scene: &S,
    template: &Template,
) -> Result<bool, SceneError> {
    let Some(parent) = scene.parent(template.node)? else {
        return Ok(false);
    };
    let parent_name = scene.name(parent)?;
    let Some(suffix) = parent_name.strip_prefix(&format!("{}_", template.name)) else {
        return Ok(false);
    };
    if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_digit()) {
        return Ok(false);
    }
    Ok(matches!(
        get_string(scene, parent, names::HIERARCHY),
        Ok(Some(h)) if h == template.category
    ))
}

/// Smallest `N >= 1` such that `<base>_<N>` is not a node name
pub fn next_available_number<S: SceneGraph + ?Sized>(scene: &S, base: &str) -> u32 {
    let mut number = 1;
    while scene.find(&format!("{}_{}", base, number)).is_some() {
        number += 1;
    }
    number
}

/// Wrap every pending template in a new numbered group; returns the new group names
///
/// Templates already parented under a matching `<Name>_<digits>` group are left
/// alone, so running this twice creates nothing the second time.
pub fn expand_templates<S: SceneGraph + ?Sized>(
    scene: &mut S,
    shot: &ShotIdentity,
    export_root: &str,
) -> Result<Vec<String>, SceneError> {
    let templates: Vec<Template> = scene
        .nodes()
        .into_iter()
        .filter_map(|id| as_template(scene, id))
        .collect();

    let mut created = Vec::new();
    for template in templates {
        if already_instantiated(scene, &template)? {
            continue;
        }

        let number = next_available_number(scene, &template.name);
        let group_name = format!("{}_{}", template.name, number);
        let group = scene.create_group(&group_name)?;
        stamp_export_group(scene, group, &template.category, shot, export_root)?;
        scene.set_parent(template.node, Some(group))?;

        tracing::info!(
            "Group '{}' created from template '{}'",
            group_name,
            scene.name(template.node)?
        );
        created.push(group_name);
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::get_bool;
    use crate::memory::MemoryScene;
    use crate::types::Attribute;

    const ROOT: &str = "<workspace_root>/Unreal/animation/PKL_S01/SH010";

    fn shot() -> ShotIdentity {
        ShotIdentity {
            sequence: "S01".to_string(),
            shot: "SH010".to_string(),
        }
    }

    fn add_template(scene: &mut MemoryScene, node: &str, category: &str, name: &str) -> NodeId {
        let id = scene.create_group(node).unwrap();
        set_locked_string(scene, id, names::HIERARCHY, TEMPLATE_PATTERN).unwrap();
        set_locked_string(scene, id, names::CATEGORY, category).unwrap();
        set_locked_string(scene, id, names::NAME, name).unwrap();
        id
    }

    #[test]
    fn test_expands_template() {
        let mut scene = MemoryScene::new();
        let master = add_template(&mut scene, "CH_HERO_RIG_MASTER_GRP", "CH", "Hero");

        let created = expand_templates(&mut scene, &shot(), ROOT).unwrap();
        assert_eq!(created, vec!["Hero_1".to_string()]);

        let group = scene.find("Hero_1").unwrap();
        assert_eq!(scene.parent(master).unwrap(), Some(group));
        assert_eq!(
            scene.attribute(group, names::HIERARCHY).unwrap(),
            Some(Attribute::locked("CH"))
        );
        assert_eq!(
            scene.attribute(group, names::EXPORTED_NAME).unwrap(),
            Some(Attribute::locked("CH_Hero_1_S01_SH010"))
        );
        assert_eq!(
            scene.attribute(group, names::PATH).unwrap(),
            Some(Attribute::locked(format!("{}/CH", ROOT)))
        );
        assert_eq!(
            scene.attribute(group, names::EXPORTABLE).unwrap(),
            Some(Attribute::new(true))
        );
    }

    #[test]
    fn test_second_run_creates_nothing() {
        let mut scene = MemoryScene::new();
        add_template(&mut scene, "CH_HERO_RIG_MASTER_GRP", "CH", "Hero");
        add_template(&mut scene, "PR_LAMP_MODEL_MASTER_GRP", "PR", "Lamp");

        let first = expand_templates(&mut scene, &shot(), ROOT).unwrap();
        assert_eq!(first.len(), 2);
        let count = scene.node_count();

        let second = expand_templates(&mut scene, &shot(), ROOT).unwrap();
        assert!(second.is_empty());
        assert_eq!(scene.node_count(), count);
    }

    #[test]
    fn test_probes_for_unused_number() {
        let mut scene = MemoryScene::new();
        scene.create_group("Hero_1").unwrap();
        scene.create_group("Hero_2").unwrap();
        add_template(&mut scene, "CH_HERO_RIG_MASTER_GRP", "CH", "Hero");

        let created = expand_templates(&mut scene, &shot(), ROOT).unwrap();
        assert_eq!(created, vec!["Hero_3".to_string()]);
    }

    #[test]
    fn test_two_instances_of_same_asset() {
        let mut scene = MemoryScene::new();
        add_template(&mut scene, "heroA:CH_HERO_RIG_MASTER_GRP", "CH", "Hero");
        add_template(&mut scene, "heroB:CH_HERO_RIG_MASTER_GRP", "CH", "Hero");

        let created = expand_templates(&mut scene, &shot(), ROOT).unwrap();
        assert_eq!(created, vec!["Hero_1".to_string(), "Hero_2".to_string()]);
    }

    #[test]
    fn test_parent_with_wrong_category_is_not_an_instance() {
        let mut scene = MemoryScene::new();
        let stale = scene.create_group("Hero_1").unwrap();
        set_locked_string(&mut scene, stale, names::HIERARCHY, "PR").unwrap();
        let master = add_template(&mut scene, "CH_HERO_RIG_MASTER_GRP", "CH", "Hero");
        scene.set_parent(master, Some(stale)).unwrap();

        let created = expand_templates(&mut scene, &shot(), ROOT).unwrap();
        assert_eq!(created, vec!["Hero_2".to_string()]);
    }

    #[test]
    fn test_requires_full_triple() {
        let mut scene = MemoryScene::new();
        let partial = scene.create_group("partial").unwrap();
        set_locked_string(&mut scene, partial, names::HIERARCHY, TEMPLATE_PATTERN).unwrap();
        set_locked_string(&mut scene, partial, names::NAME, "Hero").unwrap();
        let plain = scene.create_group("plain").unwrap();
        set_locked_string(&mut scene, plain, names::HIERARCHY, "CH").unwrap();
        set_locked_string(&mut scene, plain, names::CATEGORY, "CH").unwrap();
        set_locked_string(&mut scene, plain, names::NAME, "Hero").unwrap();

        assert!(as_template(&scene, partial).is_none());
        assert!(as_template(&scene, plain).is_none());
        assert!(expand_templates(&mut scene, &shot(), ROOT).unwrap().is_empty());
    }

    #[test]
    fn test_stamp_export_group_refreshes_values() {
        let mut scene = MemoryScene::new();
        let group = scene.create_group("Lamp_1").unwrap();
        stamp_export_group(&mut scene, group, "PR", &shot(), ROOT).unwrap();

        let next = ShotIdentity {
            sequence: "S02".to_string(),
            shot: "SH020".to_string(),
        };
        stamp_export_group(&mut scene, group, "PR", &next, ROOT).unwrap();
        assert_eq!(
            get_string(&scene, group, names::EXPORTED_NAME).unwrap(),
            Some("PR_Lamp_1_S02_SH020".to_string())
        );
        assert_eq!(get_bool(&scene, group, names::EXPORTABLE).unwrap(), Some(true));
    }
}
