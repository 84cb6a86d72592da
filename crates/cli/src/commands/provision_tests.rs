// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use berth_core::AccessKey;
use berth_engine::StartOutcome;

#[test]
fn upload_name_prefers_override() {
    let name = upload_name(Path::new("/tmp/local.py"), Some("bot.py")).unwrap();
    assert_eq!(name, "bot.py");
}

#[test]
fn upload_name_falls_back_to_file_name() {
    let name = upload_name(Path::new("/tmp/work/bot.py"), None).unwrap();
    assert_eq!(name, "bot.py");
    assert!(upload_name(Path::new("/"), None).is_err());
}

#[test]
fn clone_summary_lists_runnable_files() {
    let outcome = CloneOutcome {
        id: TargetId::new("site_u42|PLACEHOLDER"),
        key: AccessKey::new("k"),
        runnable: vec!["app.py".to_string(), "src/run.sh".to_string()],
        install_started: true,
    };
    let text = clone_summary(&outcome);
    assert_eq!(
        text,
        "Cloned site_u42|PLACEHOLDER\n\
         Key: k\n\
         Installing dependencies in the background\n\
         Runnable files:\n  app.py\n  src/run.sh\n\
         Choose one with: berth select 'site_u42|PLACEHOLDER' <file>\n"
    );
}

#[test]
fn clone_summary_without_runnable_files() {
    let outcome = CloneOutcome {
        id: TargetId::new("docs_u42|PLACEHOLDER"),
        key: AccessKey::new("k"),
        runnable: Vec::new(),
        install_started: false,
    };
    let text = clone_summary(&outcome);
    assert!(text.ends_with("No runnable files found\n"));
    assert!(!text.contains("Installing"));
}

#[test]
fn selection_summary_mentions_start() {
    let mut selection = EntrySelection {
        id: TargetId::new("site_u42|app.py"),
        key: AccessKey::new("k"),
        started: None,
    };
    assert_eq!(selection_summary(&selection), "Selected site_u42|app.py\nKey: k\n");

    selection.started = Some(StartOutcome {
        pid: 99,
        command: "python3 -u app.py".to_string(),
        chosen: None,
    });
    assert!(selection_summary(&selection).ends_with("Started (pid 99): python3 -u app.py\n"));
}
