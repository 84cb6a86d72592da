// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace containment checks.
//!
//! Every file operation driven by a client-supplied relative path goes
//! through [`resolve_within`] first.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Errors from path containment checks
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("path escapes workspace: {0}")]
    Traversal(String),
    #[error("invalid path: {0}")]
    Invalid(String),
}

/// True when `candidate` is `work_dir` itself or nested under it, comparing
/// canonical absolute paths. Paths that do not exist yet are canonicalized
/// through their deepest existing ancestor.
pub fn contains_path(work_dir: &Path, candidate: &Path) -> bool {
    match (canonicalize_lenient(work_dir), canonicalize_lenient(candidate)) {
        (Some(base), Some(candidate)) => candidate.starts_with(&base),
        _ => false,
    }
}

/// Join `rel` onto `work_dir`, rejecting absolute paths and anything that
/// resolves outside the workspace.
pub fn resolve_within(work_dir: &Path, rel: &str) -> Result<PathBuf, PathError> {
    if rel.is_empty() || rel.contains('\0') {
        return Err(PathError::Invalid(rel.to_string()));
    }
    let rel_path = Path::new(rel);
    if rel_path.is_absolute() {
        return Err(PathError::Traversal(rel.to_string()));
    }
    let candidate = work_dir.join(rel_path);
    if !contains_path(work_dir, &candidate) {
        return Err(PathError::Traversal(rel.to_string()));
    }
    Ok(candidate)
}

/// Canonicalize the deepest existing ancestor of `path`, then apply the
/// remaining components lexically. An entry that exists but cannot be
/// canonicalized (a dangling or looping symlink) yields `None`: its real
/// destination is unknown.
fn canonicalize_lenient(path: &Path) -> Option<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(path)
    };

    for ancestor in absolute.ancestors() {
        let Ok(mut resolved) = ancestor.canonicalize() else {
            if ancestor.symlink_metadata().is_ok() {
                return None;
            }
            continue;
        };
        let rest = absolute.strip_prefix(ancestor).ok()?;
        for component in rest.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }
        return Some(resolved);
    }
    None
}

#[cfg(test)]
#[path = "containment_tests.rs"]
mod tests;
