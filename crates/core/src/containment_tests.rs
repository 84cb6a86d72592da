// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

fn workspace() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let work = dir.path().join("42");
    std::fs::create_dir_all(work.join("src")).unwrap();
    std::fs::write(work.join("src/app.py"), "print(1)").unwrap();
    (dir, work)
}

#[test]
fn accepts_work_dir_itself() {
    let (_dir, work) = workspace();
    assert!(contains_path(&work, &work));
    assert!(contains_path(&work, &work.join(".")));
}

#[yare::parameterized(
    existing_file    = { "src/app.py" },
    new_file         = { "notes.txt" },
    new_nested_file  = { "a/b/c/d.txt" },
    dot_segments     = { "./src/../src/app.py" },
    inner_parent     = { "new/../other.txt" },
)]
fn accepts_nested_paths(rel: &str) {
    let (_dir, work) = workspace();
    assert!(contains_path(&work, &work.join(rel)), "{rel} should be inside");
    assert!(resolve_within(&work, rel).is_ok());
}

#[yare::parameterized(
    parent             = { ".." },
    sibling            = { "../43/secret.py" },
    deep_escape        = { "src/../../43" },
    escape_through_new = { "missing/../../../etc/passwd" },
)]
fn rejects_traversal(rel: &str) {
    let (_dir, work) = workspace();
    assert!(!contains_path(&work, &work.join(rel)), "{rel} should be outside");
    assert_eq!(
        resolve_within(&work, rel),
        Err(PathError::Traversal(rel.to_string()))
    );
}

#[test]
fn rejects_sibling_with_shared_prefix() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("4")).unwrap();
    std::fs::create_dir_all(dir.path().join("42")).unwrap();
    assert!(!contains_path(&dir.path().join("4"), &dir.path().join("42/x")));
}

#[test]
fn rejects_absolute_relative_path() {
    let (_dir, work) = workspace();
    assert!(matches!(
        resolve_within(&work, "/etc/passwd"),
        Err(PathError::Traversal(_))
    ));
}

#[test]
fn rejects_empty_relative_path() {
    let (_dir, work) = workspace();
    assert!(matches!(resolve_within(&work, ""), Err(PathError::Invalid(_))));
}

#[test]
fn rejects_symlink_pointing_outside() {
    let (dir, work) = workspace();
    let outside = dir.path().join("outside");
    std::fs::create_dir_all(&outside).unwrap();
    std::os::unix::fs::symlink(&outside, work.join("link")).unwrap();

    assert!(!contains_path(&work, &work.join("link/file.txt")));
}

#[test]
fn works_before_work_dir_exists() {
    let dir = TempDir::new().unwrap();
    let work = dir.path().join("not-yet");
    assert!(contains_path(&work, &work.join("bot.py")));
    assert!(!contains_path(&work, &work.join("../bot.py")));
}

#[test]
fn resolve_within_returns_joined_path() {
    let (_dir, work) = workspace();
    assert_eq!(resolve_within(&work, "src/app.py").unwrap(), work.join("src/app.py"));
}

#[test]
fn rejects_dangling_symlink() {
    let (dir, work) = workspace();
    let missing = dir.path().join("escaped.txt");
    std::os::unix::fs::symlink(&missing, work.join("link")).unwrap();

    assert!(!contains_path(&work, &work.join("link")));
    assert_eq!(
        resolve_within(&work, "link"),
        Err(PathError::Traversal("link".to_string()))
    );
    assert!(resolve_within(&work, "link/below.txt").is_err());
}

#[test]
fn rejects_dangling_symlink_even_when_target_is_inside() {
    let (_dir, work) = workspace();
    std::os::unix::fs::symlink(work.join("later.txt"), work.join("link")).unwrap();

    assert!(resolve_within(&work, "link").is_err());
}
