//! Naming conventions
//!
//! Derives scene identity from file and scene names. Every rule is first-match-wins
//! with an explicit default, so parsing never fails.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::types::{FrameRange, PipelineConfig};

static CATEGORY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([A-Za-z]+)_").unwrap());
static ASSET_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]+_([A-Za-z]+)_\d+_").unwrap());
static DISCIPLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(rig|textures|model)").unwrap());
static SEQUENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_S(\d+)_").unwrap());
static SHOT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_SH(\d+)_").unwrap());
static FRAME_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_FR_(\d+)_(\d+)").unwrap());

pub const DEFAULT_CATEGORY: &str = "UKN";
pub const DEFAULT_ASSET_NAME: &str = "Unknown";
pub const DEFAULT_ASSET_GROUP_NAME: &str = "UNKNOWN";
pub const DEFAULT_DISCIPLINE: &str = "RIG";
pub const DEFAULT_SEQUENCE: &str = "S01";
pub const DEFAULT_SHOT: &str = "SH010";

/// Identity of an asset file, parsed from its base name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIdentity {
    /// Upper-cased first token (`CH`, `PR`, ...)
    pub category: String,

    /// Asset name in title case, as stored in the `Name` attribute
    pub asset_name: String,

    /// Asset name upper-cased, as used in group names
    pub asset_group_name: String,

    /// Discipline (`RIG`, `MODEL`)
    pub discipline_id: String,
}

impl AssetIdentity {
    /// `<CAT>_<NAME>_<ID>_MASTER_GRP`
    pub fn master_group_name(&self) -> String {
        format!(
            "{}_{}_{}_MASTER_GRP",
            self.category, self.asset_group_name, self.discipline_id
        )
    }
}

/// Sequence and shot of an animation scene
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShotIdentity {
    pub sequence: String,
    pub shot: String,
}

impl Default for ShotIdentity {
    fn default() -> Self {
        Self {
            sequence: DEFAULT_SEQUENCE.to_string(),
            shot: DEFAULT_SHOT.to_string(),
        }
    }
}

/// Parse category, asset name and discipline from a file base name
///
/// `textures` maps to `RIG`. Downstream group names already depend on that, so it
/// stays.
pub fn parse_asset_identity(file_base_name: &str) -> AssetIdentity {
    let category = CATEGORY_RE
        .captures(file_base_name)
        .map(|c| c[1].to_uppercase())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    let (asset_name, asset_group_name) = match ASSET_NAME_RE.captures(file_base_name) {
        Some(c) => (capitalize(&c[1]), c[1].to_uppercase()),
        None => (
            DEFAULT_ASSET_NAME.to_string(),
            DEFAULT_ASSET_GROUP_NAME.to_string(),
        ),
    };

    let discipline_id = match DISCIPLINE_RE.captures(file_base_name) {
        Some(c) => {
            let found = c[1].to_lowercase();
            if found == "textures" {
                DEFAULT_DISCIPLINE.to_string()
            } else {
                found.to_uppercase()
            }
        }
        None => DEFAULT_DISCIPLINE.to_string(),
    };

    AssetIdentity {
        category,
        asset_name,
        asset_group_name,
        discipline_id,
    }
}

/// Parse sequence (`_S01_` -> `S01`) and shot (`_SH010_` -> `SH010`) from a scene name
pub fn parse_shot_identity(scene_name: &str) -> ShotIdentity {
    let sequence = SEQUENCE_RE
        .captures(scene_name)
        .map(|c| format!("S{}", &c[1]))
        .unwrap_or_else(|| DEFAULT_SEQUENCE.to_string());
    let shot = SHOT_RE
        .captures(scene_name)
        .map(|c| format!("SH{}", &c[1]))
        .unwrap_or_else(|| DEFAULT_SHOT.to_string());
    ShotIdentity { sequence, shot }
}

/// Frame range embedded in a name as `_FR_<start>_<end>`
pub fn frame_range_from_name(name: &str) -> Option<FrameRange> {
    let caps = FRAME_RANGE_RE.captures(name)?;
    let start = caps[1].parse().ok()?;
    let end = caps[2].parse().ok()?;
    Some(FrameRange::new(start, end))
}

/// Whether a camera name follows the CamTools `_FR_` convention
pub fn has_camtools_pattern(name: &str) -> bool {
    FRAME_RANGE_RE.is_match(name)
}

/// Export root for a shot, with the workspace placeholder left in place
pub fn export_root(shot: &ShotIdentity, config: &PipelineConfig) -> String {
    config
        .export_template
        .replace("{prefix}", &config.project_prefix)
        .replace("{sequence}", &shot.sequence)
        .replace("{shot}", &shot.shot)
}

/// Scene role inferred from the scene name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SceneType {
    Unsaved,
    Animation,
    Modeling,
    Rig,
    Texturing,
    Layout,
    Unidentified,
}

impl std::fmt::Display for SceneType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneType::Unsaved => write!(f, "UNSAVED SCENE"),
            SceneType::Animation => write!(f, "Animation Scene"),
            SceneType::Modeling => write!(f, "Modeling Scene"),
            SceneType::Rig => write!(f, "Rig Scene"),
            SceneType::Texturing => write!(f, "Texturing Scene"),
            SceneType::Layout => write!(f, "Layout Scene"),
            SceneType::Unidentified => write!(f, "UNIDENTIFIED"),
        }
    }
}

const SCENE_TYPE_MARKERS: &[(&str, SceneType)] = &[
    ("_anim_", SceneType::Animation),
    ("_model_", SceneType::Modeling),
    ("_rig_", SceneType::Rig),
    ("_texture_", SceneType::Texturing),
    ("_textures_", SceneType::Texturing),
    ("_layout_", SceneType::Layout),
];

/// Classify a scene by name; an existing `ANIMATION` group marks an animation scene
pub fn classify_scene(scene_name: Option<&str>, has_animation_group: bool) -> SceneType {
    let Some(name) = scene_name.filter(|n| !n.is_empty()) else {
        return SceneType::Unsaved;
    };
    let lower = name.to_lowercase();
    for (marker, scene_type) in SCENE_TYPE_MARKERS {
        if lower.contains(marker) {
            return *scene_type;
        }
    }
    if has_animation_group {
        SceneType::Animation
    } else {
        SceneType::Unidentified
    }
}

fn capitalize(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
