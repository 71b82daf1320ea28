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

//! Shared fixtures: a temporary toolkit root and scripted collaborators

#![allow(dead_code)]

use fluxion_deploy::compose::ComposeInvocation;
use fluxion_deploy::error::Result;
use fluxion_deploy::git::SourceControl;
use fluxion_deploy::prompt::Prompter;
use fluxion_deploy::runtime::ContainerRuntime;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct Toolkit {
    _tmp: TempDir,
    pub root: PathBuf,
}

impl Toolkit {
    pub fn new(installed: &str, seed: &str) -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let root = tmp.path().to_path_buf();

        fs::create_dir_all(root.join("compose")).expect("create compose dir");
        for overlay in ["base", "cache", "datastore", "docker-socket", "proxy"] {
            fs::write(root.join(format!("compose/{overlay}.yml")), "services: {}\n")
                .expect("write overlay");
        }
        fs::write(root.join("deploy.env"), "PROJECT_NAME=fluxion-test\n").expect("write config");
        fs::write(root.join("VERSION"), format!("{seed}\n")).expect("write seed");
        fs::write(root.join(".installed-version"), format!("{installed}\n"))
            .expect("write installed");

        Self { _tmp: tmp, root }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).expect("read file")
    }

    pub fn write(&self, rel: &str, content: &str) {
        fs::write(self.path(rel), content).expect("write file");
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    /// Byte contents of every version slot, for before/after comparisons
    pub fn version_files(&self) -> Vec<Option<Vec<u8>>> {
        ["VERSION", ".installed-version", ".installed-version.bak"]
            .iter()
            .map(|f| fs::read(self.path(f)).ok())
            .collect()
    }
}

/// Answers prompts from a fixed script; an unscripted prompt fails the test
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<bool>>,
    pub questions: RefCell<Vec<String>>,
    pub notes: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[bool]) -> Self {
        Self {
            answers: RefCell::new(answers.iter().copied().collect()),
            ..Default::default()
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.borrow().len()
    }

    pub fn noted(&self, needle: &str) -> bool {
        self.notes.borrow().iter().any(|n| n.contains(needle))
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, question: &str) -> Result<bool> {
        self.questions.borrow_mut().push(question.to_owned());
        let answer = self
            .answers
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected prompt: {question}"));
        Ok(answer)
    }

    fn notify(&self, message: &str) {
        self.notes.borrow_mut().push(message.to_owned());
    }
}

/// Records every compose call; `stop` and `up` flip the running state
pub struct RecordingRuntime {
    running: Cell<bool>,
    exit_code: Cell<i32>,
    pub calls: RefCell<Vec<Vec<String>>>,
    pub images: RefCell<Vec<String>>,
}

impl RecordingRuntime {
    pub fn new(running: bool) -> Self {
        Self {
            running: Cell::new(running),
            exit_code: Cell::new(0),
            calls: RefCell::new(Vec::new()),
            images: RefCell::new(Vec::new()),
        }
    }

    pub fn failing(running: bool, exit_code: i32) -> Self {
        let runtime = Self::new(running);
        runtime.exit_code.set(exit_code);
        runtime
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn subcommands(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.join(" ")).collect()
    }

    fn record(&self, invocation: &ComposeInvocation) {
        self.calls.borrow_mut().push(invocation.args.clone());
        self.images
            .borrow_mut()
            .push(invocation.env["APP_IMAGE"].clone());
    }
}

impl ContainerRuntime for RecordingRuntime {
    fn execute(&self, invocation: &ComposeInvocation) -> Result<i32> {
        self.record(invocation);
        let code = self.exit_code.get();
        if code == 0 {
            match invocation.args.first().map(String::as_str) {
                Some("stop" | "down") => self.running.set(false),
                Some("up") => self.running.set(true),
                _ => {}
            }
        }
        Ok(code)
    }

    fn services_running(&self, invocation: &ComposeInvocation) -> Result<bool> {
        self.record(&invocation.with_args(&["top"]));
        Ok(self.running.get())
    }
}

pub struct FakeGit {
    pub has_updates: bool,
    pub matches_remote: bool,
    pub changelog_diff: String,
    pub calls: RefCell<Vec<&'static str>>,
    commit: RefCell<String>,
}

impl FakeGit {
    pub fn new(has_updates: bool, matches_remote: bool, changelog_diff: &str) -> Self {
        Self {
            has_updates,
            matches_remote,
            changelog_diff: changelog_diff.to_owned(),
            calls: RefCell::new(Vec::new()),
            commit: RefCell::new("a1b2c3d".to_owned()),
        }
    }

    pub fn quiet() -> Self {
        Self::new(false, true, "")
    }

    pub fn called(&self, name: &str) -> bool {
        self.calls.borrow().iter().any(|c| *c == name)
    }
}

impl SourceControl for FakeGit {
    fn current_branch(&self) -> Result<String> {
        Ok("main".to_owned())
    }

    fn short_commit(&self) -> Result<String> {
        Ok(self.commit.borrow().clone())
    }

    fn remote_has_updates(&self) -> Result<bool> {
        self.calls.borrow_mut().push("fetch --dry-run");
        Ok(self.has_updates)
    }

    fn fetch(&self) -> Result<()> {
        self.calls.borrow_mut().push("fetch");
        Ok(())
    }

    fn local_matches_remote(&self) -> Result<bool> {
        self.calls.borrow_mut().push("rev-parse");
        Ok(self.matches_remote)
    }

    fn changelog_diff(&self) -> Result<String> {
        self.calls.borrow_mut().push("diff");
        Ok(self.changelog_diff.clone())
    }

    fn pull_fast_forward(&self) -> Result<()> {
        self.calls.borrow_mut().push("pull");
        *self.commit.borrow_mut() = "e4f5a6b".to_owned();
        Ok(())
    }
}
