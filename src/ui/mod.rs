//! User interface module - interaction (prompts) and formatting.
//!
//! Separates concerns:
//! - `formatter` - Output only
//! - This module - The [Prompter] seam used by every command, with a terminal
//!   implementation and a scripted one for tests

use crate::error::{CdToolsError, Result};
use console::Term;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use std::collections::VecDeque;
use std::sync::Mutex;

pub mod formatter;

pub use crate::warning::ReleaseWarning;
pub use formatter::{
    display_error, display_hint, display_manual_merge_instruction, display_release_warning,
    display_status, display_success, display_version_plan,
};

/// Questions the release commands ask
pub trait Prompter: Send + Sync {
    /// Pick one of `items`, returning its index
    fn select(&self, prompt: &str, items: &[String], default: usize) -> Result<usize>;

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;

    /// Free text; an empty answer yields `default` when one is given
    fn input(&self, prompt: &str, default: Option<&str>) -> Result<String>;
}

/// Interactive prompts on the controlling terminal
pub struct TerminalPrompter {
    term: Term,
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        TerminalPrompter {
            term: Term::stderr(),
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

fn prompt_error(e: dialoguer::Error) -> CdToolsError {
    CdToolsError::prompt(e.to_string())
}

impl Prompter for TerminalPrompter {
    fn select(&self, prompt: &str, items: &[String], default: usize) -> Result<usize> {
        if items.is_empty() {
            return Err(CdToolsError::prompt(format!("nothing to choose for '{}'", prompt)));
        }
        Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(default.min(items.len() - 1))
            .interact_on(&self.term)
            .map_err(prompt_error)
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact_on(&self.term)
            .map_err(prompt_error)
    }

    fn input(&self, prompt: &str, default: Option<&str>) -> Result<String> {
        let mut input = Input::<String>::with_theme(&self.theme).with_prompt(prompt);
        if let Some(default) = default {
            input = input.default(default.to_string());
        } else {
            input = input.allow_empty(true);
        }
        let answer = input.interact_text_on(&self.term).map_err(prompt_error)?;
        Ok(answer.trim().to_string())
    }
}

/// One pre-recorded answer for [ScriptedPrompter]
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Select(usize),
    Confirm(bool),
    Text(String),
}

impl Answer {
    pub fn text(s: impl Into<String>) -> Self {
        Answer::Text(s.into())
    }
}

/// Answers prompts from a fixed script, in order.
///
/// Running out of answers, or receiving the wrong kind of answer for a
/// prompt, is a `Prompt` error naming the prompt.
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<Answer>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        ScriptedPrompter {
            answers: Mutex::new(answers.into_iter().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Prompts seen so far, in order
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn remaining(&self) -> usize {
        self.answers.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn next(&self, prompt: &str) -> Result<Answer> {
        self.asked
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.to_string());
        self.answers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .ok_or_else(|| CdToolsError::prompt(format!("no scripted answer for '{}'", prompt)))
    }
}

impl Prompter for ScriptedPrompter {
    fn select(&self, prompt: &str, items: &[String], _default: usize) -> Result<usize> {
        match self.next(prompt)? {
            Answer::Select(idx) if idx < items.len() => Ok(idx),
            Answer::Select(idx) => Err(CdToolsError::prompt(format!(
                "answer {} out of range for '{}' ({} items)",
                idx,
                prompt,
                items.len()
            ))),
            other => Err(mismatch(prompt, "a selection", &other)),
        }
    }

    fn confirm(&self, prompt: &str, _default: bool) -> Result<bool> {
        match self.next(prompt)? {
            Answer::Confirm(yes) => Ok(yes),
            other => Err(mismatch(prompt, "a confirmation", &other)),
        }
    }

    fn input(&self, prompt: &str, default: Option<&str>) -> Result<String> {
        match self.next(prompt)? {
            Answer::Text(text) if text.trim().is_empty() => {
                Ok(default.unwrap_or_default().to_string())
            }
            Answer::Text(text) => Ok(text.trim().to_string()),
            other => Err(mismatch(prompt, "text", &other)),
        }
    }
}

fn mismatch(prompt: &str, expected: &str, got: &Answer) -> CdToolsError {
    CdToolsError::prompt(format!("'{}' expected {}, script has {:?}", prompt, expected, got))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_answers_in_order() {
        let prompter = ScriptedPrompter::new([
            Answer::Select(1),
            Answer::Confirm(false),
            Answer::text(""),
            Answer::text("  feat/login "),
        ]);
        let items = vec!["alpha".to_string(), "rc".to_string()];

        assert_eq!(prompter.select("Tag", &items, 0).unwrap(), 1);
        assert!(!prompter.confirm("Overwrite?", true).unwrap());
        assert_eq!(prompter.input("Paths", Some(".")).unwrap(), ".");
        assert_eq!(prompter.input("Slug", None).unwrap(), "feat/login");
        assert_eq!(prompter.remaining(), 0);
        assert_eq!(prompter.asked(), vec!["Tag", "Overwrite?", "Paths", "Slug"]);
    }

    #[test]
    fn test_scripted_exhausted_or_mismatched() {
        let prompter = ScriptedPrompter::new([Answer::Confirm(true)]);
        let err = prompter.input("Slug", None).unwrap_err();
        assert!(matches!(err, CdToolsError::Prompt(_)));
        assert!(err.to_string().contains("Slug"));

        let err = prompter.confirm("Merge?", false).unwrap_err();
        assert!(err.to_string().contains("no scripted answer"));
    }

    #[test]
    fn test_scripted_select_out_of_range() {
        let prompter = ScriptedPrompter::new([Answer::Select(3)]);
        let items = vec!["merge".to_string()];
        assert!(prompter.select("Method", &items, 0).is_err());
    }
}
