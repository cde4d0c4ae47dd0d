//! Formatting of everything cdtools prints.
//!
//! Prompts live in the parent module; this module only writes.

use crate::warning::ReleaseWarning;
use console::style;
use std::collections::BTreeMap;

pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Print a remediation hint under an error
pub fn display_hint(hint: &str) {
    eprintln!("  {} {}", style("hint:").cyan(), hint);
}

pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

pub fn display_release_warning(warning: &ReleaseWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// Table of the versions about to be written, path -> version
pub fn display_version_plan(tag: &str, versions: &BTreeMap<String, String>) {
    println!("\n{}", style(format!("Versions for '{}':", tag)).bold());
    let width = versions.keys().map(String::len).max().unwrap_or(0);
    for (path, version) in versions {
        println!("  {:width$}  {}", path, style(version).green(), width = width);
    }
}

/// Tell the user how to finish a merge that failed from the command line
pub fn display_manual_merge_instruction(url: &str) {
    println!(
        "\n{} Merge the pull request manually at {}\n  or run: {}",
        style("→").yellow(),
        style(url).cyan(),
        style(format!("gh pr merge {}", url)).cyan()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_functions_do_not_panic() {
        display_error("test error");
        display_hint("Run `cdtools init` first");
        display_success("test success");
        display_status("test status");
        display_release_warning(&ReleaseWarning::NoProjectChanges {
            parent: "main".to_string(),
        });
        display_version_plan("rc", &BTreeMap::new());
        display_manual_merge_instruction("https://github.com/acme/app/pull/1");
    }
}
