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

//! Operator confirmations
//!
//! The upgrade workflow asks every yes/no question through [`Prompter`], so
//! tests can drive it with scripted answers instead of a terminal.

use crate::error::Result;
use std::io::{self, BufRead, Write};

pub trait Prompter {
    /// Ask a yes/no question. Blocks until answered.
    fn confirm(&self, question: &str) -> Result<bool>;

    /// Print an informational line to the operator
    fn notify(&self, message: &str);
}

/// Reads answers from stdin, `y`/`yes` meaning yes
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&self, question: &str) -> Result<bool> {
        print!("{question} (y/N)? ");
        io::stdout().flush()?;

        let mut response = String::new();
        // EOF reads as an empty answer
        io::stdin().lock().read_line(&mut response)?;
        Ok(is_affirmative(&response))
    }

    fn notify(&self, message: &str) {
        println!("{message}");
    }
}

pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}
