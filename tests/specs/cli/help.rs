// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI help specs

use crate::prelude::*;

#[test]
fn help_lists_command_groups() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("daemon")
        .stdout_has("target")
        .stdout_has("upload")
        .stdout_has("clone")
        .stdout_has("select")
        .stdout_has("env")
        .stdout_has("admin");
}

#[test]
fn no_arguments_prints_help() {
    cli().passes().stdout_has("Usage:");
}

#[test]
fn version_flag() {
    cli().args(&["--version"]).passes().stdout_has("berth ");
}

#[test]
fn target_help_lists_subcommands() {
    cli()
        .args(&["target", "--help"])
        .passes()
        .stdout_has("clear-logs")
        .stdout_has("restart")
        .stdout_has("put");
}
