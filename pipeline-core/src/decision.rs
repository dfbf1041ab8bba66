//! User decisions around reference validation
//!
//! The core never opens dialogs. It hands the caller a [`Prompt`] describing what
//! would be asked, takes a [`Decision`] back, and summarizes the outcome as an
//! [`AutoFixSummary`] the caller can render however it likes.

use serde::Serialize;

use crate::references::{AutoFixResult, ReferenceReport};
use crate::types::PipelineConfig;

/// Number of file names listed before the rest is collapsed
pub const MAX_LISTED: usize = 5;

/// Number of failures detailed in a partial fix summary
pub const MAX_FAILURES_LISTED: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Decision {
    Proceed,
    Cancel,
}

/// A question the caller should put to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub title: String,
    pub message: String,
    pub default: Decision,
}

fn list_names<'a>(message: &mut String, names: impl ExactSizeIterator<Item = &'a str>) {
    let total = names.len();
    for name in names.take(MAX_LISTED) {
        message.push_str(&format!("- {}\n", name));
    }
    if total > MAX_LISTED {
        message.push_str(&format!("\n... and {} more.\n", total - MAX_LISTED));
    }
}

/// `CH_ and PRP_` style listing of the checked prefixes
fn prefix_list(prefixes: &[String]) -> String {
    match prefixes {
        [] => String::new(),
        [only] => only.clone(),
        [rest @ .., last] => format!("{} and {}", rest.join(", "), last),
    }
}

/// `CH/PRP` style label for the checked prefixes
fn prefix_label(prefixes: &[String]) -> String {
    prefixes
        .iter()
        .map(|p| p.trim_end_matches('_'))
        .collect::<Vec<_>>()
        .join("/")
}

/// Auto-fix prompt for a failed validation, `None` when everything passed
pub fn auto_fix_prompt(report: &ReferenceReport, config: &PipelineConfig) -> Option<Prompt> {
    if report.passed() {
        return None;
    }

    let mut message = format!("Found {} invalid reference(s):\n\n", report.invalid.len());
    list_names(&mut message, report.invalid.iter().map(|r| r.display_name()));
    message.push_str(&format!(
        "\nAll {} assets must have _MASTER suffix.\n\n",
        prefix_list(&config.master_prefixes)
    ));
    message.push_str("Would you like to auto-fix these references?");

    Some(Prompt {
        title: "Validation Failed".to_string(),
        message,
        default: Decision::Proceed,
    })
}

/// Message for a validation that passed
pub fn validation_passed_message(report: &ReferenceReport, config: &PipelineConfig) -> String {
    let label = prefix_label(&config.master_prefixes);
    let mut message = format!(
        "Scene validation passed!\n\nChecked {} {} reference(s)\nAll references have _MASTER suffix.\n",
        report.checked, label
    );
    if !report.skipped.is_empty() {
        message.push_str(&format!(
            "\nSkipped {} other reference(s) (not {})",
            report.skipped.len(),
            label
        ));
    }
    message
}

/// Overall outcome of an auto-fix run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AutoFixSummary {
    AllFixed,
    Partial,
    NoneFixed,
}

impl AutoFixSummary {
    pub fn classify(result: &AutoFixResult) -> Self {
        match (result.fixed.is_empty(), result.failed.is_empty()) {
            (false, true) => AutoFixSummary::AllFixed,
            (false, false) => AutoFixSummary::Partial,
            (true, _) => AutoFixSummary::NoneFixed,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AutoFixSummary::AllFixed => "Auto-Fix Complete",
            AutoFixSummary::Partial => "Auto-Fix Partial",
            AutoFixSummary::NoneFixed => "Auto-Fix Failed",
        }
    }

    /// Human-readable summary of `result`
    pub fn message(&self, result: &AutoFixResult) -> String {
        match self {
            AutoFixSummary::AllFixed => {
                let mut message = format!(
                    "All references fixed successfully!\n\nFixed {} reference(s):\n\n",
                    result.fixed.len()
                );
                list_names(&mut message, result.fixed.iter().map(|f| f.new_file.as_str()));
                message
            }
            AutoFixSummary::Partial => {
                let mut message = format!(
                    "Partial auto-fix completed:\n\nFixed: {}\nFailed: {}\n\nFailed references:\n\n",
                    result.fixed.len(),
                    result.failed.len()
                );
                for failed in result.failed.iter().take(MAX_FAILURES_LISTED) {
                    message.push_str(&format!("- {}\n  {}\n\n", failed.file, failed.error));
                }
                message.truncate(message.trim_end().len());
                message
            }
            AutoFixSummary::NoneFixed => "Auto-fix failed for all references.\n\n\
                 Common issues:\n\
                 - Master files do not exist\n\
                 - Incorrect file paths"
                .to_string(),
        }
    }
}
