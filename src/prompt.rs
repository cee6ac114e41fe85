//! Yes/no confirmation for the key generation prompt.
//!
//! The save workflow asks through the [`Confirm`] trait so it can run against a
//! terminal, a fixed answer from `--yes`/`--no`, or a scripted answer in tests.

use crate::errors::AppResult;
use std::io::{self, BufRead, Write};

/// Something that can answer a yes/no question.
pub trait Confirm {
    /// Asks `question` and returns the answer.
    fn confirm(&self, question: &str) -> AppResult<bool>;
}

impl<C: Confirm + ?Sized> Confirm for &C {
    fn confirm(&self, question: &str) -> AppResult<bool> {
        (**self).confirm(question)
    }
}

/// Always gives the same answer without asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedAnswer(pub bool);

impl Confirm for FixedAnswer {
    fn confirm(&self, _question: &str) -> AppResult<bool> {
        Ok(self.0)
    }
}

/// Asks on stderr and reads the answer from stdin.
///
/// An empty answer or end of input counts as "no".
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

impl Confirm for TerminalPrompt {
    fn confirm(&self, question: &str) -> AppResult<bool> {
        let stdin = io::stdin();
        prompt_yes_no(question, &mut stdin.lock(), &mut io::stderr())
    }
}

/// Prompts for a yes/no answer, repeating until it gets one.
///
/// Defaults to `false` on an empty line or closed input.
pub fn prompt_yes_no<R: BufRead, W: Write>(
    question: &str,
    input: &mut R,
    output: &mut W,
) -> AppResult<bool> {
    loop {
        write!(output, "{} [y/N] ", question)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(false);
        }

        match line.trim().to_lowercase().as_str() {
            "" | "n" | "no" => return Ok(false),
            "y" | "yes" => return Ok(true),
            _ => writeln!(output, "Please answer yes or no.")?,
        }
    }
}
