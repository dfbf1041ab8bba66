//! Manifest export engine
//!
//! Stands in for a real FBX engine outside the host: each bake request is written
//! as pretty JSON at the requested output path, so a batch run leaves one file per
//! exported unit that downstream tooling can inspect.

use std::fs;

use crate::port::{BakePreset, BakeRequest, ExportEngine, ExportError};

#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestExporter;

impl ExportEngine for ManifestExporter {
    fn export(&mut self, request: &BakeRequest) -> Result<(), ExportError> {
        let content = serde_json::to_string_pretty(request)?;
        fs::write(&request.file_path, content)?;
        tracing::debug!(
            "Wrote {} manifest for '{}' ({} nodes, frames {})",
            match request.preset {
                BakePreset::Skeleton => "skeleton",
                BakePreset::Camera => "camera",
            },
            request.target,
            request.members.len(),
            request.range
        );
        Ok(())
    }
}
