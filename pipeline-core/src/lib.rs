//! PKL Pipeline Core Library
//!
//! This crate provides the core functionality for the PKL animation pipeline:
//! - Naming conventions for assets, shots and scene types
//! - Attribute tagging with lock semantics over an abstract scene graph
//! - Hierarchy organization and template expansion for shot scenes
//! - Export set resolution, output paths and batch export
//! - Reference validation against published `_MASTER` files
//! - Pipeline configuration and scene documents

pub mod attributes;
pub mod decision;
pub mod error;
pub mod export;
pub mod hierarchy;
pub mod manifest;
pub mod memory;
pub mod naming;
pub mod organizer;
pub mod path_utils;
pub mod port;
pub mod references;
pub mod shot_export;
pub mod tagging;
pub mod templates;
pub mod types;

// Re-export commonly used types
pub use decision::{auto_fix_prompt, AutoFixSummary, Decision, Prompt};
pub use error::{PipelineError, SceneError};
pub use export::{ExportJob, ExportSummary, ExportUnit, UnitOutcome, UnitReport};
pub use hierarchy::{organize, OrganizeReport};
pub use manifest::ManifestExporter;
pub use memory::{DocumentError, MemoryScene, SceneDocument};
pub use naming::{
    classify_scene, parse_asset_identity, parse_shot_identity, AssetIdentity, SceneType,
    ShotIdentity,
};
pub use organizer::{organize_animation, AnimationReport, ANIMATION_GROUP};
pub use port::{
    BakePreset, BakeRequest, ExportEngine, ExportError, FileSystem, LocalFileSystem, SceneGraph,
};
pub use references::{auto_fix_all, check_references, AutoFixResult, ReferenceRecord, ReferenceReport};
pub use shot_export::{export_camera, export_scene, export_selected};
pub use tagging::{create_master_group, mark_skeleton, set_camera, MasterGroupReport};
pub use types::{
    Attribute, AttributeKind, AttributeValue, ConfigError, FrameRange, NodeId, NodeKind,
    PipelineConfig, ReferenceId, SceneContext,
};
pub use path_utils::{normalize_path, resolve_workspace_path};
