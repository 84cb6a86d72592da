// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

#[yare::parameterized(
    python = { "bot.py" },
    node   = { "index.js" },
    shell  = { "run.sh" },
    dotted = { "my.bot.py" },
)]
fn accepts_upload_names(name: &str) {
    assert!(validate_upload_name(name).is_ok());
}

#[yare::parameterized(
    wrong_extension = { "notes.txt" },
    no_extension    = { "bot" },
    nested          = { "src/bot.py" },
    parent          = { "../bot.py" },
    separator       = { "a|b.py" },
    empty           = { "" },
)]
fn rejects_upload_names(name: &str) {
    assert!(matches!(validate_upload_name(name), Err(HostError::InvalidUpload(_))));
}

#[yare::parameterized(
    https          = { "https://github.com/me/site.git", "site_u42" },
    no_suffix      = { "https://github.com/me/site", "site_u42" },
    trailing_slash = { "https://github.com/me/site/", "site_u42" },
    ssh            = { "git@github.com:me/tool.git", "tool_u42" },
)]
fn derives_repo_slug(url: &str, expected: &str) {
    assert_eq!(repo_slug(url, UserId(42)).unwrap(), expected);
}

#[yare::parameterized(
    bare_suffix = { "https://github.com/me/.git" },
    empty       = { "" },
    separator   = { "https://host/a|b" },
)]
fn rejects_unsafe_slugs(url: &str) {
    assert!(matches!(repo_slug(url, UserId(42)), Err(HostError::Clone(_))));
}

#[tokio::test]
async fn install_without_manifests_does_nothing() {
    let dir = TempDir::new().unwrap();
    let summary = install_deps(dir.path(), "python3", Duration::from_secs(5)).await;
    assert!(summary.is_empty());
    assert!(summary.succeeded());
    assert_eq!(summary.render(), "[berth] no dependency manifests found\n");
}

#[tokio::test]
async fn missing_installer_is_reported_as_failed_step() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("requirements.txt"), "").unwrap();

    let summary = install_deps(dir.path(), "/nonexistent/python", Duration::from_secs(5)).await;

    assert_eq!(summary.steps.len(), 1);
    assert_eq!(summary.steps[0].name, "pip install");
    assert!(!summary.succeeded());
    assert!(summary.render().starts_with("[berth] pip install: failed\n"));
}

#[tokio::test]
async fn clone_of_missing_source_fails() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("does-not-exist");
    let err = git_clone(
        &src.display().to_string(),
        &dir.path().join("dest"),
        Duration::from_secs(30),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, HostError::Clone(_)));
}

#[test]
fn render_includes_failure_detail() {
    let summary = InstallSummary {
        steps: vec![
            InstallStep {
                name: "pip install",
                ok: true,
                detail: "Successfully installed".to_string(),
            },
            InstallStep {
                name: "npm install",
                ok: false,
                detail: "npm ERR! missing script".to_string(),
            },
        ],
    };
    assert_eq!(
        summary.render(),
        "[berth] pip install: ok\n[berth] npm install: failed\nnpm ERR! missing script\n"
    );
}
