// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Target identifiers and workspace layout.
//!
//! A target identifier names one hosted workspace. Its shape alone decides
//! which kind of workspace it is:
//!
//! - `u<digits>|<file>`: a file uploaded by user `<digits>`
//! - `<slug>|<path>`: a file inside a cloned repository
//! - anything without `|`: a legacy single script in the uploads root

use std::path::{Path, PathBuf};

use crate::user::UserId;

crate::define_id! {
    /// Opaque identifier of a hosted target, e.g. `u42|bot.py` or `site_u42|src/app.py`.
    pub struct TargetId;
}

/// Separator between the workspace part and the file part of an identifier.
pub const SEPARATOR: char = '|';

/// Entry name used for a cloned repository before a file has been selected.
pub const PLACEHOLDER_ENTRY: &str = "PLACEHOLDER";

impl TargetId {
    /// Identifier for a file uploaded by `owner`.
    pub fn user_file(owner: UserId, file_name: &str) -> Self {
        Self(format!("u{owner}{SEPARATOR}{file_name}"))
    }

    /// Identifier for a file inside a cloned repository.
    pub fn repo(slug: &str, rel_path: &str) -> Self {
        Self(format!("{slug}{SEPARATOR}{rel_path}"))
    }

    pub fn kind(&self) -> TargetKind {
        classify(&self.0)
    }

    pub fn is_repo(&self) -> bool {
        matches!(self.kind(), TargetKind::Repo { .. })
    }

    /// File-name-safe form of the identifier: `|` and path separators
    /// replaced by `_`, so the result is always a single path component.
    pub fn file_stem(&self) -> String {
        self.0.replace([SEPARATOR, '/', '\\'], "_")
    }
}

/// The three workspace kinds a target identifier can name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetKind {
    /// `owner` is the digit run exactly as written, leading zeros included
    UserFile { owner: String, file_name: String },
    Repo { slug: String, rel_path: String },
    Legacy { name: String },
}

impl TargetKind {
    pub fn label(&self) -> &'static str {
        match self {
            TargetKind::UserFile { .. } => "file",
            TargetKind::Repo { .. } => "repo",
            TargetKind::Legacy { .. } => "legacy",
        }
    }
}

/// Classify an identifier string. Total and exclusive: every string maps to
/// exactly one kind.
///
/// A user file needs a leading `u`, exactly one separator, and a non-empty
/// run of ASCII digits between them. Every other string containing a
/// separator is a repo target.
pub fn classify(id: &str) -> TargetKind {
    let Some((head, tail)) = id.split_once(SEPARATOR) else {
        return TargetKind::Legacy {
            name: id.to_string(),
        };
    };

    if let Some(owner) = user_file_owner(head, tail) {
        return TargetKind::UserFile {
            owner: owner.to_string(),
            file_name: tail.to_string(),
        };
    }

    TargetKind::Repo {
        slug: head.to_string(),
        rel_path: tail.to_string(),
    }
}

fn user_file_owner<'a>(head: &'a str, tail: &str) -> Option<&'a str> {
    if tail.contains(SEPARATOR) {
        return None;
    }
    let digits = head.strip_prefix('u')?;
    (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())).then_some(digits)
}

/// Filesystem layout of a target's workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPaths {
    /// Directory the process runs in
    pub work_dir: PathBuf,
    /// Script path relative to `work_dir`
    pub script_rel: String,
    /// Env override file
    pub env_file: PathBuf,
    /// Python requirements file
    pub requirements_file: PathBuf,
    /// `work_dir` joined with `script_rel`
    pub full_script: PathBuf,
}

/// Derive a target's workspace layout under `uploads_root`. Pure: touches no
/// filesystem state.
pub fn resolve_paths(uploads_root: &Path, id: &TargetId) -> TargetPaths {
    match id.kind() {
        TargetKind::UserFile { owner, file_name } => {
            workspace_paths(uploads_root.join(owner), file_name)
        }
        TargetKind::Repo { slug, rel_path } => workspace_paths(uploads_root.join(slug), rel_path),
        TargetKind::Legacy { name } => TargetPaths {
            work_dir: uploads_root.to_path_buf(),
            env_file: uploads_root.join(format!("{name}.env")),
            requirements_file: uploads_root.join(format!("{name}_req.txt")),
            full_script: uploads_root.join(&name),
            script_rel: name,
        },
    }
}

fn workspace_paths(work_dir: PathBuf, script_rel: String) -> TargetPaths {
    TargetPaths {
        env_file: work_dir.join(".env"),
        requirements_file: work_dir.join("requirements.txt"),
        full_script: work_dir.join(&script_rel),
        script_rel,
        work_dir,
    }
}

#[cfg(test)]
#[path = "target_tests.rs"]
mod tests;
