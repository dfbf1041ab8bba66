//! Cross-platform path utilities
//!
//! Host paths arrive with either separator. Everything the pipeline stores or
//! compares uses forward slashes, so these helpers work on `&str` rather than
//! `Path`, which would interpret separators per platform.

/// Normalize path to forward slashes
#[inline]
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Replace the workspace placeholder with the project root and normalize
///
/// A trailing slash on `root` is dropped so `<workspace_root>/Unreal` never
/// produces a doubled separator.
pub fn resolve_workspace_path(template: &str, token: &str, root: &str) -> String {
    let root = normalize_path(root);
    let root = root.trim_end_matches('/');
    normalize_path(&template.replace(token, root))
}

/// Join a directory and a file name with a single forward slash
pub fn join_path(dir: &str, file_name: &str) -> String {
    let dir = normalize_path(dir);
    if dir.is_empty() {
        return file_name.to_string();
    }
    format!("{}/{}", dir.trim_end_matches('/'), file_name)
}

/// Final path component
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Split a file name into stem and extension (extension keeps its dot)
pub fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => file_name.split_at(idx),
        _ => (file_name, ""),
    }
}

/// Directory part of a path, normalized, without trailing slash
///
/// A file directly under the root keeps `/` as its directory.
pub fn parent_dir(path: &str) -> String {
    let normalized = normalize_path(path);
    match normalized.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => normalized[..idx].to_string(),
        None => String::new(),
    }
}
