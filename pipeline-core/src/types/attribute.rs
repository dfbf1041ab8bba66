//! Scene node metadata attributes
//!
//! Attributes are the only channel through which pipeline tools declare intent on a
//! node: structure (`Hierarchy`), export (`ExportedName`, `Path`, `Exportable`) and
//! classification (`Category`, `Name`, `ID`, `UnrealCamera`, ...).

use serde::{Deserialize, Serialize};

/// Well-known attribute names stamped by the pipeline
pub mod names {
    pub const HIERARCHY: &str = "Hierarchy";
    pub const CATEGORY: &str = "Category";
    pub const NAME: &str = "Name";
    pub const ID: &str = "ID";
    pub const EXPORTED_NAME: &str = "ExportedName";
    pub const EXPORTED_PATH: &str = "ExportedPath";
    pub const PATH: &str = "Path";
    pub const EXPORTABLE: &str = "Exportable";
    pub const SEQUENCE: &str = "SQ";
    pub const SHOT: &str = "SH";
    pub const UNREAL_CAMERA: &str = "UnrealCamera";
    pub const CAMTOOLS_LOGIC: &str = "CamToolsLogic";
    pub const IS_IN_GROUP: &str = "IsInGroup";
    pub const FBX_EXPORTABLE: &str = "FBX_exportable";
}

/// Declared type of an attribute
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AttributeKind {
    String,
    Bool,
}

impl std::fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeKind::String => write!(f, "string"),
            AttributeKind::Bool => write!(f, "bool"),
        }
    }
}

/// Attribute value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    String(String),
}

impl AttributeValue {
    pub fn kind(&self) -> AttributeKind {
        match self {
            AttributeValue::String(_) => AttributeKind::String,
            AttributeValue::Bool(_) => AttributeKind::Bool,
        }
    }

    /// Zero value for a freshly added attribute of `kind`
    pub fn empty(kind: AttributeKind) -> Self {
        match kind {
            AttributeKind::String => AttributeValue::String(String::new()),
            AttributeKind::Bool => AttributeValue::Bool(false),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            AttributeValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            AttributeValue::String(_) => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::String(s) => write!(f, "{}", s),
            AttributeValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// An attribute attached to a node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub value: AttributeValue,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub locked: bool,
}

impl Attribute {
    pub fn new(value: impl Into<AttributeValue>) -> Self {
        Self {
            value: value.into(),
            locked: false,
        }
    }

    pub fn locked(value: impl Into<AttributeValue>) -> Self {
        Self {
            value: value.into(),
            locked: true,
        }
    }

    pub fn kind(&self) -> AttributeKind {
        self.value.kind()
    }
}
