//! In-memory scene graph
//!
//! `MemoryScene` implements [`SceneGraph`] over an arena of nodes with unique names.
//! It backs the CLI (scenes are loaded from and saved to a [`SceneDocument`]) and
//! serves as the scene fake in tests.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::port::SceneGraph;
use crate::types::{
    Attribute, AttributeKind, AttributeValue, FrameRange, NodeId, NodeKind, ReferenceId,
    SceneContext,
};

#[derive(Debug, Clone)]
struct NodeData {
    name: String,
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: Vec<(String, Attribute)>,
}

impl NodeData {
    fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, a)| a)
    }

    fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, a)| a)
    }
}

#[derive(Debug, Clone)]
struct ReferenceData {
    name: String,
    path: Option<String>,
}

/// Arena-backed scene graph
#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    nodes: Vec<NodeData>,
    by_name: HashMap<String, NodeId>,
    references: Vec<ReferenceData>,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node of any kind, optionally under `parent`
    pub fn add_node(
        &mut self,
        name: &str,
        kind: NodeKind,
        parent: Option<NodeId>,
    ) -> Result<NodeId, SceneError> {
        if self.by_name.contains_key(name) {
            return Err(SceneError::DuplicateName(name.to_string()));
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            name: name.to_string(),
            kind,
            parent: None,
            children: Vec::new(),
            attributes: Vec::new(),
        });
        self.by_name.insert(name.to_string(), id);
        if parent.is_some() {
            self.set_parent(id, parent)?;
        }
        Ok(id)
    }

    /// Attach a file reference
    pub fn add_reference(&mut self, name: &str, path: Option<&str>) -> ReferenceId {
        let id = ReferenceId(self.references.len());
        self.references.push(ReferenceData {
            name: name.to_string(),
            path: path.map(str::to_string),
        });
        id
    }

    /// Set an attribute directly, bypassing lock checks
    pub fn insert_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        attribute: Attribute,
    ) -> Result<(), SceneError> {
        let node = self.node_mut(id)?;
        match node.attribute_mut(name) {
            Some(existing) => *existing = attribute,
            None => node.attributes.push((name.to_string(), attribute)),
        }
        Ok(())
    }

    /// Names of the attributes on `id`, in creation order
    pub fn attribute_names(&self, id: NodeId) -> Result<Vec<String>, SceneError> {
        Ok(self
            .node(id)?
            .attributes
            .iter()
            .map(|(n, _)| n.clone())
            .collect())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node(&self, id: NodeId) -> Result<&NodeData, SceneError> {
        self.nodes.get(id.0).ok_or(SceneError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, SceneError> {
        self.nodes.get_mut(id.0).ok_or(SceneError::UnknownNode(id))
    }

    fn reference(&self, id: ReferenceId) -> Result<&ReferenceData, SceneError> {
        self.references
            .get(id.0)
            .ok_or(SceneError::UnknownReference(id))
    }

    fn is_ancestor(&self, candidate: NodeId, of: NodeId) -> Result<bool, SceneError> {
        let mut current = Some(of);
        while let Some(id) = current {
            if id == candidate {
                return Ok(true);
            }
            current = self.node(id)?.parent;
        }
        Ok(false)
    }
}

impl SceneGraph for MemoryScene {
    fn nodes(&self) -> Vec<NodeId> {
        (0..self.nodes.len()).map(NodeId).collect()
    }

    fn find(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    fn name(&self, id: NodeId) -> Result<String, SceneError> {
        Ok(self.node(id)?.name.clone())
    }

    fn kind(&self, id: NodeId) -> Result<NodeKind, SceneError> {
        Ok(self.node(id)?.kind)
    }

    fn parent(&self, id: NodeId) -> Result<Option<NodeId>, SceneError> {
        Ok(self.node(id)?.parent)
    }

    fn children(&self, id: NodeId) -> Result<Vec<NodeId>, SceneError> {
        Ok(self.node(id)?.children.clone())
    }

    fn create_group(&mut self, name: &str) -> Result<NodeId, SceneError> {
        self.add_node(name, NodeKind::Group, None)
    }

    fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) -> Result<(), SceneError> {
        let old_parent = self.node(id)?.parent;
        if old_parent == parent {
            return Ok(());
        }
        if let Some(new_parent) = parent {
            if self.is_ancestor(id, new_parent)? {
                return Err(SceneError::CycleDetected {
                    child: self.name(id)?,
                    parent: self.name(new_parent)?,
                });
            }
        }

        if let Some(old) = old_parent {
            self.node_mut(old)?.children.retain(|c| *c != id);
        }
        if let Some(new_parent) = parent {
            self.node_mut(new_parent)?.children.push(id);
        }
        self.node_mut(id)?.parent = parent;
        Ok(())
    }

    fn attribute(&self, id: NodeId, name: &str) -> Result<Option<Attribute>, SceneError> {
        Ok(self.node(id)?.attribute(name).cloned())
    }

    fn add_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        kind: AttributeKind,
    ) -> Result<(), SceneError> {
        let node = self.node_mut(id)?;
        if node.attribute(name).is_some() {
            return Err(SceneError::AttributeExists {
                node: node.name.clone(),
                attribute: name.to_string(),
            });
        }
        node.attributes
            .push((name.to_string(), Attribute::new(AttributeValue::empty(kind))));
        Ok(())
    }

    fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: AttributeValue,
    ) -> Result<(), SceneError> {
        let node = self.node_mut(id)?;
        let node_name = node.name.clone();
        let attr = node
            .attribute_mut(name)
            .ok_or_else(|| SceneError::MissingAttribute {
                node: node_name.clone(),
                attribute: name.to_string(),
            })?;
        if attr.locked {
            return Err(SceneError::AttributeLocked {
                node: node_name,
                attribute: name.to_string(),
            });
        }
        if attr.kind() != value.kind() {
            return Err(SceneError::TypeMismatch {
                node: node_name,
                attribute: name.to_string(),
                expected: attr.kind(),
                actual: value.kind(),
            });
        }
        attr.value = value;
        Ok(())
    }

    fn set_locked(&mut self, id: NodeId, name: &str, locked: bool) -> Result<(), SceneError> {
        let node = self.node_mut(id)?;
        let node_name = node.name.clone();
        let attr = node
            .attribute_mut(name)
            .ok_or_else(|| SceneError::MissingAttribute {
                node: node_name,
                attribute: name.to_string(),
            })?;
        attr.locked = locked;
        Ok(())
    }

    fn references(&self) -> Vec<ReferenceId> {
        (0..self.references.len()).map(ReferenceId).collect()
    }

    fn reference_name(&self, reference: ReferenceId) -> Result<String, SceneError> {
        Ok(self.reference(reference)?.name.clone())
    }

    fn reference_path(&self, reference: ReferenceId) -> Result<Option<String>, SceneError> {
        Ok(self.reference(reference)?.path.clone())
    }

    fn replace_reference(&mut self, reference: ReferenceId, path: &str) -> Result<(), SceneError> {
        let data = self
            .references
            .get_mut(reference.0)
            .ok_or(SceneError::UnknownReference(reference))?;
        data.path = Some(path.to_string());
        Ok(())
    }
}

/// Serialized scene snapshot (`.json`, `.yaml` or `.yml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    /// Full path of the scene file, absent when unsaved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_path: Option<String>,

    /// Project root directory
    #[serde(default)]
    pub workspace_root: String,

    /// Active playback range
    #[serde(default)]
    pub playback: FrameRange,

    /// Selected node names, in selection order
    #[serde(default)]
    pub selection: Vec<String>,

    #[serde(default)]
    pub nodes: Vec<NodeSpec>,

    #[serde(default)]
    pub references: Vec<ReferenceSpec>,
}

/// A node entry in a scene document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    pub name: String,

    #[serde(default)]
    pub kind: NodeKind,

    /// Parent node name, absent for root nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeSpec>,
}

/// An attribute entry in a scene document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeSpec {
    pub name: String,

    pub value: AttributeValue,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub locked: bool,
}

/// A file reference entry in a scene document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceSpec {
    /// Reference node name
    pub node: String,

    /// Backing file, absent when unresolvable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Errors loading or saving a scene document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Failed to read scene document: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON scene document: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse YAML scene document: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Unsupported scene document format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid scene document: {0}")]
    Scene(#[from] SceneError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentFormat {
    Json,
    Yaml,
}

fn document_format(path: &Path) -> Result<DocumentFormat, DocumentError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(DocumentFormat::Json),
        Some("yaml") | Some("yml") => Ok(DocumentFormat::Yaml),
        _ => Err(DocumentError::UnsupportedFormat(path.display().to_string())),
    }
}

impl SceneDocument {
    /// Read a scene document, choosing the format from the file extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let format = document_format(path)?;
        let content = fs::read_to_string(path)?;
        let document = match format {
            DocumentFormat::Json => serde_json::from_str(&content)?,
            DocumentFormat::Yaml => serde_yaml::from_str(&content)?,
        };
        Ok(document)
    }

    /// Write a scene document, choosing the format from the file extension
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), DocumentError> {
        let path = path.as_ref();
        let content = match document_format(path)? {
            DocumentFormat::Json => serde_json::to_string_pretty(self)?,
            DocumentFormat::Yaml => serde_yaml::to_string(self)?,
        };
        fs::write(path, content)?;
        Ok(())
    }

    /// Build the live scene and the invocation context
    pub fn into_scene(self) -> Result<(MemoryScene, SceneContext), DocumentError> {
        let mut scene = MemoryScene::new();

        // Parents may be declared after their children
        for spec in &self.nodes {
            let id = scene.add_node(&spec.name, spec.kind, None)?;
            for attr in &spec.attributes {
                scene.insert_attribute(
                    id,
                    &attr.name,
                    Attribute {
                        value: attr.value.clone(),
                        locked: attr.locked,
                    },
                )?;
            }
        }
        for spec in &self.nodes {
            if let Some(parent_name) = &spec.parent {
                let id = lookup(&scene, &spec.name)?;
                let parent = lookup(&scene, parent_name)?;
                scene.set_parent(id, Some(parent))?;
            }
        }
        for reference in &self.references {
            scene.add_reference(&reference.node, reference.path.as_deref());
        }

        let selection = self
            .selection
            .iter()
            .map(|name| lookup(&scene, name))
            .collect::<Result<Vec<_>, _>>()?;

        let ctx = SceneContext {
            scene_path: self.scene_path,
            workspace_root: self.workspace_root,
            playback: self.playback,
            selection,
        };
        Ok((scene, ctx))
    }
}

fn lookup(scene: &MemoryScene, name: &str) -> Result<NodeId, SceneError> {
    scene
        .find(name)
        .ok_or_else(|| SceneError::NodeNotFound(name.to_string()))
}

impl MemoryScene {
    /// Snapshot the scene together with its context
    pub fn to_document(&self, ctx: &SceneContext) -> SceneDocument {
        let name_of = |id: NodeId| self.nodes.get(id.0).map(|n| n.name.clone());

        let nodes = self
            .nodes
            .iter()
            .map(|node| NodeSpec {
                name: node.name.clone(),
                kind: node.kind,
                parent: node.parent.and_then(name_of),
                attributes: node
                    .attributes
                    .iter()
                    .map(|(name, attr)| AttributeSpec {
                        name: name.clone(),
                        value: attr.value.clone(),
                        locked: attr.locked,
                    })
                    .collect(),
            })
            .collect();

        let references = self
            .references
            .iter()
            .map(|r| ReferenceSpec {
                node: r.name.clone(),
                path: r.path.clone(),
            })
            .collect();

        SceneDocument {
            scene_path: ctx.scene_path.clone(),
            workspace_root: ctx.workspace_root.clone(),
            playback: ctx.playback,
            selection: ctx.selection.iter().filter_map(|id| name_of(*id)).collect(),
            nodes,
            references,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unique_names() {
        let mut scene = MemoryScene::new();
        scene.create_group("CH").unwrap();
        assert_eq!(
            scene.create_group("CH"),
            Err(SceneError::DuplicateName("CH".to_string()))
        );
    }

    #[test]
    fn test_reparent_updates_children() {
        let mut scene = MemoryScene::new();
        let a = scene.create_group("a").unwrap();
        let b = scene.create_group("b").unwrap();
        let child = scene.add_node("child", NodeKind::Mesh, Some(a)).unwrap();

        assert_eq!(scene.children(a).unwrap(), vec![child]);
        scene.set_parent(child, Some(b)).unwrap();
        assert!(scene.children(a).unwrap().is_empty());
        assert_eq!(scene.children(b).unwrap(), vec![child]);
        assert_eq!(scene.parent(child).unwrap(), Some(b));

        scene.set_parent(child, None).unwrap();
        assert_eq!(scene.parent(child).unwrap(), None);
    }

    #[test]
    fn test_reparent_refuses_cycle() {
        let mut scene = MemoryScene::new();
        let a = scene.create_group("a").unwrap();
        let b = scene.add_node("b", NodeKind::Group, Some(a)).unwrap();

        let err = scene.set_parent(a, Some(b)).unwrap_err();
        assert!(matches!(err, SceneError::CycleDetected { .. }));
        assert!(matches!(
            scene.set_parent(a, Some(a)),
            Err(SceneError::CycleDetected { .. })
        ));
    }

    #[test]
    fn test_locked_and_typed_attributes() {
        let mut scene = MemoryScene::new();
        let grp = scene.create_group("grp").unwrap();
        scene.add_attribute(grp, "Path", AttributeKind::String).unwrap();
        scene.set_attribute(grp, "Path", "x".into()).unwrap();

        assert!(matches!(
            scene.set_attribute(grp, "Path", true.into()),
            Err(SceneError::TypeMismatch { .. })
        ));

        scene.set_locked(grp, "Path", true).unwrap();
        assert!(matches!(
            scene.set_attribute(grp, "Path", "y".into()),
            Err(SceneError::AttributeLocked { .. })
        ));
        assert!(matches!(
            scene.add_attribute(grp, "Path", AttributeKind::String),
            Err(SceneError::AttributeExists { .. })
        ));
        assert!(matches!(
            scene.set_attribute(grp, "Missing", "y".into()),
            Err(SceneError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn test_document_roundtrip_preserves_structure() {
        let json = r#"{
            "scenePath": "/proj/scenes/PKL_S02_SH020_anim_v01.ma",
            "workspaceRoot": "/proj/",
            "playback": { "start": 1001, "end": 1050 },
            "selection": ["CH"],
            "nodes": [
                { "name": "hero_root", "kind": "joint", "parent": "CH",
                  "attributes": [{ "name": "FBX_exportable", "value": true }] },
                { "name": "CH", "attributes": [{ "name": "Hierarchy", "value": "CH", "locked": true }] }
            ],
            "references": [
                { "node": "heroRN", "path": "/proj/assets/CH_HERO_MASTER.ma" },
                { "node": "brokenRN" }
            ]
        }"#;

        let document: SceneDocument = serde_json::from_str(json).unwrap();
        let (scene, ctx) = document.into_scene().unwrap();

        let ch = scene.find("CH").unwrap();
        let joint = scene.find("hero_root").unwrap();
        assert_eq!(scene.parent(joint).unwrap(), Some(ch));
        assert_eq!(scene.kind(joint).unwrap(), NodeKind::Joint);
        assert_eq!(ctx.selection, vec![ch]);
        assert_eq!(ctx.playback, FrameRange::new(1001, 1050));
        assert_eq!(scene.references().len(), 2);
        assert_eq!(scene.reference_path(ReferenceId(1)).unwrap(), None);

        let hierarchy = scene.attribute(ch, "Hierarchy").unwrap().unwrap();
        assert!(hierarchy.locked);

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("scene.yaml");
        scene.to_document(&ctx).write_to(&path).unwrap();

        let (reloaded, reloaded_ctx) = SceneDocument::from_file(&path)
            .unwrap()
            .into_scene()
            .unwrap();
        assert_eq!(reloaded.node_count(), 2);
        assert_eq!(
            reloaded.parent(reloaded.find("hero_root").unwrap()).unwrap(),
            reloaded.find("CH")
        );
        assert_eq!(reloaded_ctx.scene_path, ctx.scene_path);
    }

    #[test]
    fn test_document_unknown_parent() {
        let document = SceneDocument {
            nodes: vec![NodeSpec {
                name: "orphan".to_string(),
                kind: NodeKind::Group,
                parent: Some("missing".to_string()),
                attributes: Vec::new(),
            }],
            ..Default::default()
        };
        assert!(matches!(
            document.into_scene(),
            Err(DocumentError::Scene(SceneError::NodeNotFound(_)))
        ));
    }

    #[test]
    fn test_unsupported_format() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("scene.ma");
        assert!(matches!(
            SceneDocument::default().write_to(&path),
            Err(DocumentError::UnsupportedFormat(_))
        ));
    }
}
