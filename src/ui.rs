use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input};

/// Everything the program asks of the user or tells them.
///
/// Prompts return `None` when the user cancels; the caller treats that as
/// "stop quietly", never as an error.
pub trait Prompter {
    fn info(&mut self, title: &str, message: &str);
    fn warn(&mut self, title: &str, message: &str);
    fn error(&mut self, title: &str, message: &str);

    /// Ask for a folder. `start` pre-seeds the answer when it is an existing directory.
    fn pick_folder(&mut self, title: &str, start: Option<&Path>) -> Option<PathBuf>;

    fn text(&mut self, title: &str, label: &str, default: &str) -> Option<String>;

    /// Yes/no question. A cancelled question counts as `false`.
    fn confirm(&mut self, title: &str, question: &str, default: bool) -> bool;

    /// Short pause between consecutive wizard prompts.
    fn pace(&mut self) {}
}

/// Console prompts built on dialoguer. Messages block until Enter so the console
/// window opened by the context menu stays up long enough to be read.
pub struct TerminalPrompter {
    theme: ColorfulTheme,
    pace: Duration,
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self {
            theme: ColorfulTheme::default(),
            pace: Duration::from_millis(500),
        }
    }
}

impl TerminalPrompter {
    fn show(&self, label: &str, title: &str, message: &str) {
        println!("\n[{}] {}\n{}", label, title, message);
        let _ = Input::<String>::with_theme(&self.theme)
            .with_prompt("Press Enter to continue")
            .allow_empty(true)
            .report(false)
            .interact_text();
    }
}

impl Prompter for TerminalPrompter {
    fn info(&mut self, title: &str, message: &str) {
        self.show("info", title, message);
    }

    fn warn(&mut self, title: &str, message: &str) {
        self.show("warning", title, message);
    }

    fn error(&mut self, title: &str, message: &str) {
        self.show("error", title, message);
    }

    fn pick_folder(&mut self, title: &str, start: Option<&Path>) -> Option<PathBuf> {
        println!("\n{}", title);
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt("Folder (leave empty to cancel)")
            .allow_empty(true)
            .validate_with(|s: &String| -> Result<(), String> {
                let s = s.trim();
                if s.is_empty() || Path::new(s).is_dir() {
                    Ok(())
                } else {
                    Err(format!("'{}' is not an existing folder", s))
                }
            });
        if let Some(dir) = start.filter(|d| d.is_dir()) {
            input = input.with_initial_text(dir.display().to_string());
        }
        match input.interact_text() {
            Ok(answer) => {
                let answer = answer.trim();
                if answer.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(answer))
                }
            }
            Err(e) => {
                tracing::debug!("folder prompt aborted: {}", e);
                None
            }
        }
    }

    fn text(&mut self, title: &str, label: &str, default: &str) -> Option<String> {
        println!("\n{}", title);
        Input::<String>::with_theme(&self.theme)
            .with_prompt(label)
            .with_initial_text(default)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| tracing::debug!("text prompt aborted: {}", e))
            .ok()
    }

    fn confirm(&mut self, title: &str, question: &str, default: bool) -> bool {
        println!("\n{}", title);
        Confirm::with_theme(&self.theme)
            .with_prompt(question.replace('\n', " "))
            .default(default)
            .interact_opt()
            .ok()
            .flatten()
            .unwrap_or(false)
    }

    fn pace(&mut self) {
        thread::sleep(self.pace);
    }
}
