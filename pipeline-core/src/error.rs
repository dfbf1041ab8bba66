//! Error types
//!
//! `SceneError` covers failures of the scene-graph port itself. `PipelineError` is
//! what a workflow returns when a precondition fails and the requested operation is
//! aborted before any mutation. Per-unit business outcomes (skipped exports, invalid
//! references) are never errors; they are reported as values.

use crate::types::{AttributeKind, NodeId, NodeKind, ReferenceId};

/// Failures raised by a scene-graph implementation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("Unknown node: {0:?}")]
    UnknownNode(NodeId),

    #[error("Unknown reference: {0:?}")]
    UnknownReference(ReferenceId),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("A node named '{0}' already exists")]
    DuplicateName(String),

    #[error("Attribute '{attribute}' does not exist on '{node}'")]
    MissingAttribute { node: String, attribute: String },

    #[error("Attribute '{node}.{attribute}' already exists")]
    AttributeExists { node: String, attribute: String },

    #[error("Attribute '{node}.{attribute}' is locked")]
    AttributeLocked { node: String, attribute: String },

    #[error("Attribute '{node}.{attribute}' is {actual}, not {expected}")]
    TypeMismatch {
        node: String,
        attribute: String,
        expected: AttributeKind,
        actual: AttributeKind,
    },

    #[error("Cannot parent '{child}' under '{parent}': it would become its own ancestor")]
    CycleDetected { child: String, parent: String },

    #[error("Reference could not be replaced: {0}")]
    ReferenceReplace(String),
}

/// Precondition failures that abort a single workflow
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Scene must be saved first")]
    UnsavedScene,

    #[error("'{0}' is not an animation scene or is not in the pipeline workflow")]
    NotAnimationScene(String),

    #[error("Nothing is selected")]
    NoSelection,

    #[error("Selected node '{name}' is a {actual}, expected a {expected}")]
    WrongNodeKind {
        name: String,
        expected: NodeKind,
        actual: NodeKind,
    },

    #[error("No valid objects found to group")]
    NothingToGroup,

    #[error("Nothing valid selected for export")]
    NothingToExport,

    #[error("Group '{0}' not found in scene")]
    MissingGroup(String),

    #[error("No Unreal camera found inside the CAMERA group")]
    NoUnrealCamera,

    #[error("CAMERA group is missing export attributes")]
    MissingCameraInfo,

    #[error("CAMERA group has Exportable set to false")]
    CameraExportDisabled,

    #[error(transparent)]
    Scene(#[from] SceneError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
