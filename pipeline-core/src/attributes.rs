//! Attribute store operations
//!
//! Create-or-update semantics over [`SceneGraph`] attributes. A locked attribute is
//! unlocked before it is written; afterwards the lock state requested by the caller
//! is applied, whatever the previous state was.

use crate::error::SceneError;
use crate::port::SceneGraph;
use crate::types::{AttributeKind, AttributeValue, NodeId};

/// Ensure `name` exists on `node` with `value`, then apply `lock`
///
/// The attribute kind comes from `value`. Re-declaring an existing attribute with a
/// different kind fails with [`SceneError::TypeMismatch`] instead of coercing.
pub fn ensure_attribute<S: SceneGraph + ?Sized>(
    scene: &mut S,
    node: NodeId,
    name: &str,
    value: impl Into<AttributeValue>,
    lock: bool,
) -> Result<(), SceneError> {
    let value = value.into();
    match scene.attribute(node, name)? {
        None => {
            scene.add_attribute(node, name, value.kind())?;
            scene.set_attribute(node, name, value)?;
        }
        Some(current) => {
            if current.kind() != value.kind() {
                return Err(SceneError::TypeMismatch {
                    node: scene.name(node)?,
                    attribute: name.to_string(),
                    expected: current.kind(),
                    actual: value.kind(),
                });
            }
            if current.locked {
                scene.set_locked(node, name, false)?;
            }
            if current.value != value {
                scene.set_attribute(node, name, value)?;
            }
        }
    }
    // Only touch the lock when it differs from what is now in place
    let now_locked = scene
        .attribute(node, name)?
        .map(|a| a.locked)
        .unwrap_or(false);
    if now_locked != lock {
        scene.set_locked(node, name, lock)?;
    }
    Ok(())
}

/// Ensure a locked string attribute
pub fn set_locked_string<S: SceneGraph + ?Sized>(
    scene: &mut S,
    node: NodeId,
    name: &str,
    value: &str,
) -> Result<(), SceneError> {
    ensure_attribute(scene, node, name, value, true)
}

/// Whether `node` carries `name`; unknown nodes have no attributes
pub fn has_attribute<S: SceneGraph + ?Sized>(scene: &S, node: NodeId, name: &str) -> bool {
    matches!(scene.attribute(node, name), Ok(Some(_)))
}

/// Raw attribute value, or `default` when the node or attribute is absent
pub fn get_attribute<S: SceneGraph + ?Sized>(
    scene: &S,
    node: NodeId,
    name: &str,
    default: AttributeValue,
) -> AttributeValue {
    match scene.attribute(node, name) {
        Ok(Some(attr)) => attr.value,
        _ => default,
    }
}

/// String attribute value; `Ok(None)` when absent, error when it holds a bool
pub fn get_string<S: SceneGraph + ?Sized>(
    scene: &S,
    node: NodeId,
    name: &str,
) -> Result<Option<String>, SceneError> {
    typed(scene, node, name, AttributeKind::String, |v| match v {
        AttributeValue::String(s) => Some(s),
        AttributeValue::Bool(_) => None,
    })
}

/// Bool attribute value; `Ok(None)` when absent, error when it holds a string
pub fn get_bool<S: SceneGraph + ?Sized>(
    scene: &S,
    node: NodeId,
    name: &str,
) -> Result<Option<bool>, SceneError> {
    typed(scene, node, name, AttributeKind::Bool, |v| v.as_bool())
}

/// Bool attribute that counts as set only when present and `true`
pub fn is_flag_set<S: SceneGraph + ?Sized>(scene: &S, node: NodeId, name: &str) -> bool {
    matches!(get_bool(scene, node, name), Ok(Some(true)))
}

fn typed<S, T, F>(
    scene: &S,
    node: NodeId,
    name: &str,
    expected: AttributeKind,
    extract: F,
) -> Result<Option<T>, SceneError>
where
    S: SceneGraph + ?Sized,
    F: FnOnce(AttributeValue) -> Option<T>,
{
    let Some(attr) = scene.attribute(node, name)? else {
        return Ok(None);
    };
    let actual = attr.kind();
    match extract(attr.value) {
        Some(v) => Ok(Some(v)),
        None => Err(SceneError::TypeMismatch {
            node: scene.name(node)?,
            attribute: name.to_string(),
            expected,
            actual,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryScene;
    use crate::types::Attribute;

    fn scene_with_group() -> (MemoryScene, NodeId) {
        let mut scene = MemoryScene::new();
        let grp = scene.create_group("grp").unwrap();
        (scene, grp)
    }

    #[test]
    fn test_creates_missing_attribute() {
        let (mut scene, grp) = scene_with_group();
        ensure_attribute(&mut scene, grp, "Hierarchy", "CH", true).unwrap();

        let attr = scene.attribute(grp, "Hierarchy").unwrap().unwrap();
        assert_eq!(attr, Attribute::locked("CH"));
    }

    #[test]
    fn test_overwrites_locked_attribute() {
        let (mut scene, grp) = scene_with_group();
        set_locked_string(&mut scene, grp, "Path", "old").unwrap();
        set_locked_string(&mut scene, grp, "Path", "new").unwrap();

        let attr = scene.attribute(grp, "Path").unwrap().unwrap();
        assert_eq!(attr, Attribute::locked("new"));
    }

    #[test]
    fn test_caller_lock_state_wins() {
        let (mut scene, grp) = scene_with_group();
        ensure_attribute(&mut scene, grp, "Exportable", true, true).unwrap();
        ensure_attribute(&mut scene, grp, "Exportable", true, false).unwrap();

        let attr = scene.attribute(grp, "Exportable").unwrap().unwrap();
        assert_eq!(attr, Attribute::new(true));
    }

    #[test]
    fn test_idempotent() {
        let (mut once, a) = scene_with_group();
        ensure_attribute(&mut once, a, "ExportedName", "CH_Hero_1_S01_SH010", true).unwrap();

        let (mut twice, b) = scene_with_group();
        ensure_attribute(&mut twice, b, "ExportedName", "CH_Hero_1_S01_SH010", true).unwrap();
        ensure_attribute(&mut twice, b, "ExportedName", "CH_Hero_1_S01_SH010", true).unwrap();

        assert_eq!(
            once.attribute(a, "ExportedName").unwrap(),
            twice.attribute(b, "ExportedName").unwrap()
        );
        assert_eq!(twice.attribute_names(b).unwrap().len(), 1);
    }

    #[test]
    fn test_redeclare_with_other_kind_fails() {
        let (mut scene, grp) = scene_with_group();
        ensure_attribute(&mut scene, grp, "Exportable", true, false).unwrap();
        let err = ensure_attribute(&mut scene, grp, "Exportable", "yes", false).unwrap_err();
        assert!(matches!(err, SceneError::TypeMismatch { .. }));
        assert_eq!(get_bool(&scene, grp, "Exportable").unwrap(), Some(true));
    }

    #[test]
    fn test_typed_accessors() {
        let (mut scene, grp) = scene_with_group();
        set_locked_string(&mut scene, grp, "Category", "CH").unwrap();
        ensure_attribute(&mut scene, grp, "UnrealCamera", false, false).unwrap();

        assert!(has_attribute(&scene, grp, "Category"));
        assert!(!has_attribute(&scene, grp, "Name"));
        assert!(!has_attribute(&scene, NodeId(99), "Category"));

        assert_eq!(get_string(&scene, grp, "Category").unwrap(), Some("CH".to_string()));
        assert_eq!(get_string(&scene, grp, "Name").unwrap(), None);
        assert!(get_string(&scene, grp, "UnrealCamera").is_err());
        assert!(get_bool(&scene, grp, "Category").is_err());
        assert!(!is_flag_set(&scene, grp, "UnrealCamera"));
        assert!(!is_flag_set(&scene, grp, "Category"));

        assert_eq!(
            get_attribute(&scene, grp, "Missing", AttributeValue::from("fallback")),
            AttributeValue::from("fallback")
        );
        assert_eq!(
            get_attribute(&scene, grp, "Category", AttributeValue::from("fallback")),
            AttributeValue::from("CH")
        );
    }
}
