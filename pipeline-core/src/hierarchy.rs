//! Hierarchy resolution
//!
//! Every node may declare the container it belongs under through its `Hierarchy`
//! attribute. [`organize`] moves all nodes declaring a label under the node of that
//! name, then repeats with each moved node's own name as the label, so nodes can
//! act as intermediate containers for their own declared children.

use std::collections::HashSet;

use serde::Serialize;

use crate::attributes::{get_string, is_flag_set};
use crate::error::SceneError;
use crate::port::SceneGraph;
use crate::types::{names, NodeId};

/// Label of the camera container, which has its own grouping rule
pub const CAMERA_LABEL: &str = "CAMERA";

/// A node moved under a new parent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reparent {
    pub node: String,
    pub parent: String,
}

/// A node that declared a container but was left in place
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedNode {
    pub node: String,
    pub reason: String,
}

/// Result of organizing one or more labels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrganizeReport {
    pub moves: Vec<Reparent>,
    pub skipped: Vec<SkippedNode>,
}

impl OrganizeReport {
    pub fn merge(&mut self, other: OrganizeReport) {
        self.moves.extend(other.moves);
        self.skipped.extend(other.skipped);
    }
}

/// Nodes whose `Hierarchy` attribute equals `label`
pub fn nodes_declaring<S: SceneGraph + ?Sized>(scene: &S, label: &str) -> Vec<NodeId> {
    scene
        .nodes()
        .into_iter()
        .filter(|id| {
            matches!(get_string(scene, *id, names::HIERARCHY), Ok(Some(v)) if v == label)
        })
        .collect()
}

/// Move every node declaring `root_label` under the container of that name, recursively
///
/// Cameras flagged `IsInGroup` stay where they are when organizing `CAMERA`. Each
/// container is expanded at most once per call, so declarations that loop back on
/// themselves terminate; a move the scene refuses is recorded as skipped.
pub fn organize<S: SceneGraph + ?Sized>(
    scene: &mut S,
    root_label: &str,
) -> Result<OrganizeReport, SceneError> {
    let mut report = OrganizeReport::default();
    let mut visited = HashSet::new();
    organize_label(scene, root_label, &mut visited, &mut report)?;
    Ok(report)
}

fn organize_label<S: SceneGraph + ?Sized>(
    scene: &mut S,
    label: &str,
    visited: &mut HashSet<NodeId>,
    report: &mut OrganizeReport,
) -> Result<(), SceneError> {
    let Some(container) = scene.find(label) else {
        return Ok(());
    };
    if !visited.insert(container) {
        tracing::debug!("'{}' already organized in this pass", label);
        return Ok(());
    }

    for node in nodes_declaring(scene, label) {
        if node == container {
            continue;
        }
        let node_name = scene.name(node)?;

        if label == CAMERA_LABEL && is_flag_set(scene, node, names::IS_IN_GROUP) {
            tracing::info!("'{}' skipped (IsInGroup = true)", node_name);
            report.skipped.push(SkippedNode {
                node: node_name,
                reason: "IsInGroup = true".to_string(),
            });
            continue;
        }

        if scene.parent(node)? != Some(container) {
            match scene.set_parent(node, Some(container)) {
                Ok(()) => {
                    tracing::info!("'{}' parented to '{}'", node_name, label);
                    report.moves.push(Reparent {
                        node: node_name.clone(),
                        parent: label.to_string(),
                    });
                }
                Err(err @ SceneError::CycleDetected { .. }) => {
                    tracing::warn!("{}", err);
                    report.skipped.push(SkippedNode {
                        node: node_name,
                        reason: err.to_string(),
                    });
                    continue;
                }
                Err(err) => return Err(err),
            }
        }

        organize_label(scene, &node_name, visited, report)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{ensure_attribute, set_locked_string};
    use crate::memory::MemoryScene;
    use crate::types::NodeKind;

    fn declare(scene: &mut MemoryScene, name: &str, kind: NodeKind, label: &str) -> NodeId {
        let id = scene.add_node(name, kind, None).unwrap();
        set_locked_string(scene, id, names::HIERARCHY, label).unwrap();
        id
    }

    #[test]
    fn test_reparents_declared_nodes() {
        let mut scene = MemoryScene::new();
        let ch = scene.create_group("CH").unwrap();
        let hero = declare(&mut scene, "Hero_1", NodeKind::Group, "CH");
        let villain = declare(&mut scene, "Villain_1", NodeKind::Group, "CH");
        let prop = declare(&mut scene, "Lamp_1", NodeKind::Group, "PR");

        let report = organize(&mut scene, "CH").unwrap();

        assert_eq!(scene.parent(hero).unwrap(), Some(ch));
        assert_eq!(scene.parent(villain).unwrap(), Some(ch));
        assert_eq!(scene.parent(prop).unwrap(), None);
        assert_eq!(report.moves.len(), 2);
        assert_eq!(
            report.moves[0],
            Reparent {
                node: "Hero_1".to_string(),
                parent: "CH".to_string()
            }
        );
    }

    #[test]
    fn test_recurses_into_moved_nodes() {
        let mut scene = MemoryScene::new();
        scene.create_group("CH").unwrap();
        let hero = declare(&mut scene, "Hero_1", NodeKind::Group, "CH");
        let master = declare(&mut scene, "CH_HERO_RIG_MASTER_GRP", NodeKind::Group, "Hero_1");

        organize(&mut scene, "CH").unwrap();
        assert_eq!(scene.parent(master).unwrap(), Some(hero));
    }

    #[test]
    fn test_already_parented_nodes_still_recurse() {
        let mut scene = MemoryScene::new();
        let ch = scene.create_group("CH").unwrap();
        let hero = declare(&mut scene, "Hero_1", NodeKind::Group, "CH");
        scene.set_parent(hero, Some(ch)).unwrap();
        let master = declare(&mut scene, "master", NodeKind::Group, "Hero_1");

        let report = organize(&mut scene, "CH").unwrap();
        assert_eq!(report.moves.len(), 1);
        assert_eq!(scene.parent(master).unwrap(), Some(hero));
    }

    #[test]
    fn test_camera_in_group_is_never_moved() {
        let mut scene = MemoryScene::new();
        let camera_grp = scene.create_group("CAMERA").unwrap();
        let rig = scene.create_group("camRig").unwrap();
        let grouped = declare(&mut scene, "shotCam", NodeKind::Camera, "CAMERA");
        scene.set_parent(grouped, Some(rig)).unwrap();
        ensure_attribute(&mut scene, grouped, names::IS_IN_GROUP, true, false).unwrap();
        let loose = declare(&mut scene, "looseCam", NodeKind::Camera, "CAMERA");
        ensure_attribute(&mut scene, loose, names::IS_IN_GROUP, false, false).unwrap();

        let report = organize(&mut scene, "CAMERA").unwrap();

        assert_eq!(scene.parent(grouped).unwrap(), Some(rig));
        assert_eq!(scene.parent(loose).unwrap(), Some(camera_grp));
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].node, "shotCam");
    }

    #[test]
    fn test_in_group_only_matters_for_camera() {
        let mut scene = MemoryScene::new();
        let pr = scene.create_group("PR").unwrap();
        let lamp = declare(&mut scene, "Lamp_1", NodeKind::Group, "PR");
        ensure_attribute(&mut scene, lamp, names::IS_IN_GROUP, true, false).unwrap();

        organize(&mut scene, "PR").unwrap();
        assert_eq!(scene.parent(lamp).unwrap(), Some(pr));
    }

    #[test]
    fn test_missing_container_is_noop() {
        let mut scene = MemoryScene::new();
        let lamp = declare(&mut scene, "Lamp_1", NodeKind::Group, "PR");
        let report = organize(&mut scene, "PR").unwrap();
        assert_eq!(report, OrganizeReport::default());
        assert_eq!(scene.parent(lamp).unwrap(), None);
    }

    #[test]
    fn test_cyclic_declarations_terminate() {
        let mut scene = MemoryScene::new();
        // ROOT -> A -> B -> ROOT
        let root = declare(&mut scene, "ROOT", NodeKind::Group, "B");
        let a = declare(&mut scene, "A", NodeKind::Group, "ROOT");
        let b = declare(&mut scene, "B", NodeKind::Group, "A");

        let report = organize(&mut scene, "ROOT").unwrap();
        assert_eq!(scene.parent(a).unwrap(), Some(root));
        assert_eq!(scene.parent(b).unwrap(), Some(a));
        assert_eq!(scene.parent(root).unwrap(), None);
        assert_eq!(report.moves.len(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].node, "ROOT");
    }

    #[test]
    fn test_mutual_declaration_is_skipped() {
        let mut scene = MemoryScene::new();
        let a = declare(&mut scene, "A", NodeKind::Group, "B");
        let b = declare(&mut scene, "B", NodeKind::Group, "A");

        let report = organize(&mut scene, "A").unwrap();
        assert_eq!(scene.parent(b).unwrap(), Some(a));
        assert_eq!(scene.parent(a).unwrap(), None);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].node, "A");
    }
}
