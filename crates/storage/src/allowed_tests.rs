// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn add_remove_and_list() {
    let dir = tempdir().unwrap();
    let users = AllowedUsers::new(dir.path().join("allowed_users.json"));

    assert!(users.list().unwrap().is_empty());
    assert!(users.add(UserId(9)).unwrap());
    assert!(users.add(UserId(3)).unwrap());
    assert!(!users.add(UserId(3)).unwrap());

    assert_eq!(users.list().unwrap(), vec![UserId(3), UserId(9)]);
    assert!(users.contains(UserId(9)).unwrap());

    assert!(users.remove(UserId(9)).unwrap());
    assert!(!users.remove(UserId(9)).unwrap());
    assert!(!users.contains(UserId(9)).unwrap());
}

#[test]
fn persisted_as_plain_array() {
    let dir = tempdir().unwrap();
    let users = AllowedUsers::new(dir.path().join("allowed_users.json"));
    users.add(UserId(5)).unwrap();

    let raw: Vec<i64> =
        serde_json::from_str(&std::fs::read_to_string(users.path()).unwrap()).unwrap();
    assert_eq!(raw, vec![5]);
}

#[test]
fn corrupt_list_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("allowed_users.json");
    std::fs::write(&path, "{}").unwrap();
    let users = AllowedUsers::new(path);

    assert!(users.contains(UserId(1)).unwrap_err().is_corrupt());
    assert!(users.add(UserId(1)).unwrap_err().is_corrupt());
}
