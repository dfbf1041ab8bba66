//! Host collaborator interfaces
//!
//! The pipeline never talks to the DCC host directly. Everything it reads or mutates
//! goes through these traits: the scene graph, the filesystem and the bake/export
//! engine. `MemoryScene`, `LocalFileSystem` and `ManifestExporter` are the shipped
//! implementations.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::types::{Attribute, AttributeKind, AttributeValue, FrameRange, NodeId, NodeKind, ReferenceId};

/// Narrow view of the host scene graph
pub trait SceneGraph {
    /// All nodes, in creation order
    fn nodes(&self) -> Vec<NodeId>;

    /// Look up a node by its unique name
    fn find(&self, name: &str) -> Option<NodeId>;

    fn name(&self, id: NodeId) -> Result<String, SceneError>;

    fn kind(&self, id: NodeId) -> Result<NodeKind, SceneError>;

    fn parent(&self, id: NodeId) -> Result<Option<NodeId>, SceneError>;

    /// Direct children, in order
    fn children(&self, id: NodeId) -> Result<Vec<NodeId>, SceneError>;

    /// All descendants, depth-first pre-order
    fn descendants(&self, id: NodeId) -> Result<Vec<NodeId>, SceneError> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id)?.into_iter().rev().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next)?.into_iter().rev());
        }
        Ok(out)
    }

    /// Create an empty group at the scene root
    fn create_group(&mut self, name: &str) -> Result<NodeId, SceneError>;

    /// Reparent a node; `None` moves it to the scene root
    fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) -> Result<(), SceneError>;

    fn attribute(&self, id: NodeId, name: &str) -> Result<Option<Attribute>, SceneError>;

    /// Add an attribute holding the zero value of `kind`
    fn add_attribute(&mut self, id: NodeId, name: &str, kind: AttributeKind) -> Result<(), SceneError>;

    /// Overwrite an attribute value; fails when locked or when the kind differs
    fn set_attribute(&mut self, id: NodeId, name: &str, value: AttributeValue) -> Result<(), SceneError>;

    fn set_locked(&mut self, id: NodeId, name: &str, locked: bool) -> Result<(), SceneError>;

    /// External file references attached to the scene
    fn references(&self) -> Vec<ReferenceId>;

    /// Host-side name of the reference node
    fn reference_name(&self, reference: ReferenceId) -> Result<String, SceneError>;

    /// Backing file path, `None` when the host cannot resolve it
    fn reference_path(&self, reference: ReferenceId) -> Result<Option<String>, SceneError>;

    /// Swap the backing file of a reference
    fn replace_reference(&mut self, reference: ReferenceId, path: &str) -> Result<(), SceneError>;
}

/// Filesystem operations the pipeline performs around exports and fixes
pub trait FileSystem {
    fn exists(&self, path: &Path) -> bool;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// `FileSystem` backed by `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }
}

/// Option set handed to the export engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BakePreset {
    /// Skinned skeleton: skins, blend shapes, input connections, constraints
    Skeleton,

    /// Camera: cameras only, no skins, resampled quaternions, step 1
    Camera,
}

/// A single bake + export call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BakeRequest {
    /// Node selected for export (skeleton root or camera)
    pub target: String,

    /// Names of every node exported under the target
    pub members: Vec<String>,

    /// Absolute output file path
    pub file_path: String,

    /// Bake range
    pub range: FrameRange,

    pub preset: BakePreset,
}

/// Failure reported by an export engine
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Export failed: {0}")]
    Engine(String),

    #[error("Failed to write export: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to encode export: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Bake/export collaborator
pub trait ExportEngine {
    fn export(&mut self, request: &BakeRequest) -> Result<(), ExportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryScene;
    use tempfile::TempDir;

    #[test]
    fn test_default_descendants_order() {
        let mut scene = MemoryScene::new();
        let root = scene.create_group("root").unwrap();
        let a = scene.create_group("a").unwrap();
        let a1 = scene.create_group("a1").unwrap();
        let b = scene.create_group("b").unwrap();
        scene.set_parent(a, Some(root)).unwrap();
        scene.set_parent(a1, Some(a)).unwrap();
        scene.set_parent(b, Some(root)).unwrap();

        assert_eq!(scene.descendants(root).unwrap(), vec![a, a1, b]);
        assert!(scene.descendants(b).unwrap().is_empty());
    }

    #[test]
    fn test_local_file_system() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        let fs = LocalFileSystem;

        assert!(!fs.exists(&nested));
        fs.create_dir_all(&nested).unwrap();
        assert!(fs.exists(&nested));
    }
}
