//! Scene handles and per-invocation context

use serde::{Deserialize, Serialize};

/// Opaque handle to a scene-graph node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Opaque handle to an external file reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReferenceId(pub usize);

/// Node type as reported by the host
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    /// Empty transform used as a container
    #[default]
    Group,

    /// Transform with no recognized shape
    Transform,

    /// Transform carrying polygon geometry
    Mesh,

    /// Skeletal joint
    Joint,

    /// Transform carrying a camera shape
    Camera,

    /// Transform carrying a light shape
    Light,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Group => write!(f, "group"),
            NodeKind::Transform => write!(f, "transform"),
            NodeKind::Mesh => write!(f, "mesh"),
            NodeKind::Joint => write!(f, "joint"),
            NodeKind::Camera => write!(f, "camera"),
            NodeKind::Light => write!(f, "light"),
        }
    }
}

/// Inclusive frame range
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrameRange {
    pub start: i64,
    pub end: i64,
}

impl FrameRange {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }
}

impl Default for FrameRange {
    fn default() -> Self {
        Self { start: 1, end: 100 }
    }
}

impl std::fmt::Display for FrameRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Host state a workflow needs, passed in explicitly instead of queried
#[derive(Debug, Clone, Default)]
pub struct SceneContext {
    /// Full path of the open scene file, `None` when unsaved
    pub scene_path: Option<String>,

    /// Project root substituted for the workspace placeholder
    pub workspace_root: String,

    /// Active playback range
    pub playback: FrameRange,

    /// Current selection, in selection order
    pub selection: Vec<NodeId>,
}

impl SceneContext {
    /// File name of the open scene (with extension)
    pub fn scene_name(&self) -> Option<&str> {
        let path = self.scene_path.as_deref()?;
        let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }

    /// File name of the open scene without its extension
    pub fn scene_stem(&self) -> Option<&str> {
        let name = self.scene_name()?;
        match name.rfind('.') {
            Some(idx) if idx > 0 => Some(&name[..idx]),
            _ => Some(name),
        }
    }
}
