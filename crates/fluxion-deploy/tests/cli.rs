// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

mod common;

use clap::Parser;
use clap::error::ErrorKind as ClapErrorKind;
use common::{FakeGit, RecordingRuntime, ScriptedPrompter, Toolkit};
use fluxion_deploy::cli::{self, Cli, Command, FAILURE_STATUS};
use fluxion_deploy::{ErrorKind, ToolkitConfig};
use std::path::Path;
use tempfile::TempDir;

fn config(toolkit: &Toolkit) -> ToolkitConfig {
    ToolkitConfig::load(&toolkit.root).unwrap()
}

#[test]
fn test_upgrade_help_exits_zero() {
    let err = Cli::try_parse_from(["fluxion-deploy", "upgrade", "--help"]).unwrap_err();
    assert_eq!(err.kind(), ClapErrorKind::DisplayHelp);
    assert_eq!(err.exit_code(), 0);
}

#[test]
fn test_compose_arguments_pass_through() {
    let opts = Cli::try_parse_from([
        "fluxion-deploy",
        "--root",
        "/opt/fluxion",
        "compose",
        "--debug",
        "logs",
        "-f",
        "--tail",
        "50",
    ])
    .unwrap();

    assert_eq!(opts.root.as_deref(), Some(Path::new("/opt/fluxion")));
    match opts.command {
        Command::Compose { debug, args } => {
            assert!(debug);
            assert_eq!(args, vec!["logs", "-f", "--tail", "50"]);
        }
        Command::Upgrade => panic!("parsed as upgrade"),
    }
}

#[test]
fn test_runtime_exit_code_is_forwarded() {
    let toolkit = Toolkit::new("4.2.9", "4.2.9");
    let runtime = RecordingRuntime::failing(false, 3);

    let status = cli::run_compose(&config(&toolkit), &runtime, false, &["up", "-d"]).unwrap();

    assert_eq!(status, 3);
    assert_eq!(runtime.subcommands(), vec!["up -d"]);
    assert_eq!(runtime.images.borrow()[0], "ghcr.io/solare-cz/fluxion:4.2.9");
}

#[test]
fn test_successful_compose_exits_zero() {
    let toolkit = Toolkit::new("4.2.9", "4.2.9");
    let runtime = RecordingRuntime::new(false);

    let status = cli::run_compose(&config(&toolkit), &runtime, true, &["ps"]).unwrap();
    assert_eq!(status, 0);
}

#[test]
fn test_unrepresentable_exit_codes_are_failures() {
    assert_eq!(cli::exit_status(0), 0);
    assert_eq!(cli::exit_status(255), 255);
    assert_eq!(cli::exit_status(256), FAILURE_STATUS);
    assert_eq!(cli::exit_status(-1), FAILURE_STATUS);
    assert_eq!(FAILURE_STATUS, 1);
}

#[test]
fn test_missing_root_is_configuration_error() {
    let dir = TempDir::new().unwrap();

    let err = cli::load_toolkit(None, dir.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);

    let err = cli::load_toolkit(Some(Path::new("elsewhere")), dir.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_missing_deploy_env_is_configuration_error() {
    let toolkit = Toolkit::new("4.2.9", "4.2.9");
    std::fs::remove_file(toolkit.path("deploy.env")).unwrap();

    let err = cli::load_toolkit(None, &toolkit.path("compose")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_invalid_installed_version_runs_nothing() {
    let toolkit = Toolkit::new("4.2", "4.2.9");
    let runtime = RecordingRuntime::new(true);

    let err = cli::run_compose(&config(&toolkit), &runtime, false, &["up", "-d"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(runtime.subcommands().is_empty());
}

#[test]
fn test_upgrade_report_summary() {
    let toolkit = Toolkit::new("4.2.9", "4.3.0");
    let git = FakeGit::quiet();
    let runtime = RecordingRuntime::new(false);
    // upgrade, proceed
    let prompter = ScriptedPrompter::new(&[true, true]);

    let report = cli::run_upgrade(&config(&toolkit), &git, &runtime, &prompter).unwrap();
    let lines = cli::report_lines(&report);

    assert_eq!(
        lines,
        vec![
            "Toolkit code: up to date",
            "FluxION version: upgraded 4.2.9 -> 4.3.0",
            "Start services with `fluxion-deploy compose up -d` when ready.",
        ]
    );
    assert_eq!(toolkit.read(".installed-version"), "4.3.0\n");
}
