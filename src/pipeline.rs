use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};

use crate::APP_NAME;
use crate::clipboard::ClipboardAccess;
use crate::config::{self, Config, Startup};
use crate::git::{CommitStatus, VersionControl};
use crate::shell::{RegistryStore, ShortcutCreator, refresh_context_menu};
use crate::text::derive_filename;
use crate::ui::Prompter;

const FOLDER_PROMPT: &str =
    "Be sure you have COPIED YOUR CODE TO THE CLIPBOARD FIRST, then select the folder to save it into";

/// The outside world, as seen by one run.
pub struct Capabilities<'a> {
    pub ui: &'a mut dyn Prompter,
    pub clipboard: &'a mut dyn ClipboardAccess,
    pub git: &'a dyn VersionControl,
    pub registry: &'a mut dyn RegistryStore,
    pub shortcut: &'a mut dyn ShortcutCreator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoFolder,
    EmptyClipboard,
    EmptyFirstLine,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Skipped(SkipReason),
    Saved {
        path: PathBuf,
        commit: Option<CommitStatus>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    SetupCancelled,
    /// Setup just finished; nothing is saved on the first run.
    FirstRun,
    Save(SaveOutcome),
}

/// One launch: load (or create) the settings, refresh the context menu, then save
/// the clipboard. Fatal errors are shown to the user before being returned.
pub fn run(
    folder_arg: Option<&str>,
    config_path: &Path,
    exe: Option<&Path>,
    caps: &mut Capabilities<'_>,
) -> Result<RunOutcome> {
    let startup = match config::load(config_path, caps.ui, caps.shortcut) {
        Ok(startup) => startup,
        Err(e) => return Err(fatal(caps.ui, "Could not save settings:", e)),
    };
    let (cfg, first_run) = match startup {
        Startup::Cancelled => return Ok(RunOutcome::SetupCancelled),
        Startup::FirstRun(cfg) => (cfg, true),
        Startup::Existing(cfg) => (cfg, false),
    };

    let refreshed = exe
        .ok_or_else(|| anyhow!("Could not resolve the executable path"))
        .and_then(|exe| refresh_context_menu(caps.registry, exe));
    if let Err(e) = refreshed {
        return Err(fatal(
            caps.ui,
            "Setup Error:\nFailed to update registry settings.",
            e,
        ));
    }

    if first_run {
        return Ok(RunOutcome::FirstRun);
    }

    let Some(dir) = resolve_save_dir(folder_arg, &cfg, caps.ui) else {
        tracing::info!("no folder chosen, nothing to do");
        return Ok(RunOutcome::Save(SaveOutcome::Skipped(SkipReason::NoFolder)));
    };
    save_clipboard(&dir, &cfg, caps).map(RunOutcome::Save)
}

/// Pick the folder to save into: the command-line folder, the default folder in
/// auto-save mode, or whatever the user chooses. `None` means stop quietly.
pub fn resolve_save_dir(folder_arg: Option<&str>, cfg: &Config, ui: &mut dyn Prompter) -> Option<PathBuf> {
    if let Some(arg) = folder_arg {
        let arg = arg.trim();
        return (!arg.is_empty()).then(|| PathBuf::from(arg));
    }

    let default_dir = Path::new(&cfg.start_dir);
    if cfg.auto_save && default_dir.exists() {
        tracing::debug!("auto-save into {}", default_dir.display());
        return Some(default_dir.to_path_buf());
    }

    let start = default_dir.is_dir().then_some(default_dir);
    ui.pick_folder(FOLDER_PROMPT, start)
        .filter(|d| !d.as_os_str().is_empty())
}

/// Write the clipboard into `dir`, then commit, clear the clipboard and notify as configured.
pub fn save_clipboard(dir: &Path, cfg: &Config, caps: &mut Capabilities<'_>) -> Result<SaveOutcome> {
    let content = match caps.clipboard.read_text() {
        Ok(text) if !text.is_empty() => text,
        Ok(_) => return Ok(SaveOutcome::Skipped(SkipReason::EmptyClipboard)),
        Err(e) => {
            tracing::debug!("clipboard unreadable: {:#}", e);
            return Ok(SaveOutcome::Skipped(SkipReason::EmptyClipboard));
        }
    };
    tracing::debug!("read {} bytes from the clipboard", content.len());

    let Some(filename) = derive_filename(&content, &cfg.prefix_to_strip, &cfg.extension) else {
        tracing::info!("first clipboard line is blank, nothing saved");
        return Ok(SaveOutcome::Skipped(SkipReason::EmptyFirstLine));
    };

    let path = dir.join(&filename);
    if let Err(e) = fs::write(&path, content.as_bytes()) {
        return Err(fatal(caps.ui, "Error saving file:", anyhow!("{}: {}", path.display(), e)));
    }
    tracing::info!("saved {}", path.display());

    let commit = cfg.git_auto_commit.then(|| match caps.git.commit_file(dir, &filename) {
        Ok(()) => CommitStatus::Committed,
        Err(e) => {
            tracing::warn!("auto-commit failed: {:#}", e);
            CommitStatus::Failed(format!("{:#}", e))
        }
    });

    if let Err(e) = caps.clipboard.clear() {
        tracing::debug!("clipboard not cleared: {:#}", e);
    }

    if cfg.show_success {
        caps.ui.info(APP_NAME, &success_message(&path, commit.as_ref()));
    }

    Ok(SaveOutcome::Saved { path, commit })
}

pub fn success_message(path: &Path, commit: Option<&CommitStatus>) -> String {
    let git_line = commit.map(|c| format!("\n{}", c)).unwrap_or_default();
    format!("Saved to:\n{}{}\n\n(Clipboard Cleared)", path.display(), git_line)
}

fn fatal(ui: &mut dyn Prompter, headline: &str, err: anyhow::Error) -> anyhow::Error {
    ui.error(APP_NAME, &format!("{}\n{:#}", headline, err));
    let summary = headline.replace('\n', " ");
    tracing::error!("{} {:#}", summary, err);
    err.context(summary.trim_end_matches(':').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::fake::MemoryClipboard;
    use crate::config::CONFIG_FILE_NAME;
    use crate::git::fake::RecordingGit;
    use crate::shell::fake::{MemoryRegistry, RecordingShortcut};
    use crate::ui::fake::{Answer, ScriptedPrompter, Shown};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const EXE: &str = r"C:\tools\dggit.exe";

    struct World {
        ui: ScriptedPrompter,
        clipboard: MemoryClipboard,
        git: RecordingGit,
        registry: MemoryRegistry,
        shortcut: RecordingShortcut,
    }

    impl World {
        fn new(clipboard: MemoryClipboard) -> Self {
            Self {
                ui: ScriptedPrompter::default(),
                clipboard,
                git: RecordingGit::default(),
                registry: MemoryRegistry::default(),
                shortcut: RecordingShortcut::default(),
            }
        }

        fn caps(&mut self) -> Capabilities<'_> {
            Capabilities {
                ui: &mut self.ui,
                clipboard: &mut self.clipboard,
                git: &self.git,
                registry: &mut self.registry,
                shortcut: &mut self.shortcut,
            }
        }
    }

    fn config_for(dir: &Path) -> Config {
        Config {
            start_dir: dir.display().to_string(),
            prefix_to_strip: "void |int |string ".into(),
            ..Config::default()
        }
    }

    #[test]
    fn test_auto_save_uses_default_dir_without_prompt() {
        let dir = TempDir::new().unwrap();
        let cfg = Config {
            auto_save: true,
            ..config_for(dir.path())
        };
        let mut ui = ScriptedPrompter::default();

        let resolved = resolve_save_dir(None, &cfg, &mut ui);

        assert_eq!(resolved.as_deref(), Some(dir.path()));
        assert!(ui.folder_prompts.is_empty());
    }

    #[test]
    fn test_auto_save_with_missing_dir_prompts_unseeded() {
        let dir = TempDir::new().unwrap();
        let chosen = dir.path().join("chosen");
        let cfg = Config {
            auto_save: true,
            ..config_for(&dir.path().join("gone"))
        };
        let mut ui = ScriptedPrompter::new([Answer::Folder(Some(chosen.clone()))]);

        let resolved = resolve_save_dir(None, &cfg, &mut ui);

        assert_eq!(resolved, Some(chosen));
        assert_eq!(ui.folder_prompts, vec![None]);
    }

    #[test]
    fn test_prompt_is_seeded_with_existing_default() {
        let dir = TempDir::new().unwrap();
        let cfg = config_for(dir.path());
        let mut ui = ScriptedPrompter::new([Answer::Folder(None)]);

        assert_eq!(resolve_save_dir(None, &cfg, &mut ui), None);
        assert_eq!(ui.folder_prompts, vec![Some(dir.path().to_path_buf())]);
    }

    #[test]
    fn test_folder_argument_wins() {
        let dir = TempDir::new().unwrap();
        let cfg = Config {
            auto_save: true,
            ..config_for(dir.path())
        };
        let mut ui = ScriptedPrompter::default();

        let resolved = resolve_save_dir(Some("  D:\\other  "), &cfg, &mut ui);

        assert_eq!(resolved, Some(PathBuf::from("D:\\other")));
        assert_eq!(resolve_save_dir(Some("   "), &cfg, &mut ui), None);
        assert!(ui.folder_prompts.is_empty());
    }

    #[test]
    fn test_saves_clipboard_under_derived_name() {
        let dir = TempDir::new().unwrap();
        let content = "int main(){}\nbody";
        let mut world = World::new(MemoryClipboard::with_text(content));

        let outcome = save_clipboard(dir.path(), &config_for(dir.path()), &mut world.caps()).unwrap();

        let path = dir.path().join("main(){}.dg");
        assert_eq!(
            outcome,
            SaveOutcome::Saved {
                path: path.clone(),
                commit: None
            }
        );
        assert_eq!(fs::read(&path).unwrap(), content.as_bytes());
        assert!(world.clipboard.cleared);
        assert_eq!(
            world.ui.shown,
            vec![Shown::Info(
                APP_NAME.into(),
                format!("Saved to:\n{}\n\n(Clipboard Cleared)", path.display())
            )]
        );
    }

    #[test]
    fn test_existing_file_is_overwritten() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("foo().dg"), "old contents that are longer").unwrap();
        let mut world = World::new(MemoryClipboard::with_text("void foo()"));

        save_clipboard(dir.path(), &config_for(dir.path()), &mut world.caps()).unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("foo().dg")).unwrap(), "void foo()");
    }

    #[test]
    fn test_empty_or_unreadable_clipboard_is_silent() {
        let dir = TempDir::new().unwrap();
        for clipboard in [MemoryClipboard::with_text(""), MemoryClipboard::default()] {
            let mut world = World::new(clipboard);

            let outcome = save_clipboard(dir.path(), &config_for(dir.path()), &mut world.caps()).unwrap();

            assert_eq!(outcome, SaveOutcome::Skipped(SkipReason::EmptyClipboard));
            assert!(world.ui.shown.is_empty());
            assert!(!world.clipboard.cleared);
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_blank_first_line_is_silent() {
        let dir = TempDir::new().unwrap();
        let mut world = World::new(MemoryClipboard::with_text("   \r\nfn body() {}"));

        let outcome = save_clipboard(dir.path(), &config_for(dir.path()), &mut world.caps()).unwrap();

        assert_eq!(outcome, SaveOutcome::Skipped(SkipReason::EmptyFirstLine));
        assert!(world.ui.shown.is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_write_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        let mut world = World::new(MemoryClipboard::with_text("void foo()"));

        let result = save_clipboard(&missing, &config_for(dir.path()), &mut world.caps());

        assert!(result.is_err());
        assert_eq!(world.ui.errors().len(), 1);
        assert!(!world.clipboard.cleared);
    }

    #[test]
    fn test_commit_success_is_reported() {
        let dir = TempDir::new().unwrap();
        let cfg = Config {
            git_auto_commit: true,
            ..config_for(dir.path())
        };
        let mut world = World::new(MemoryClipboard::with_text("string greet()\n..."));

        let outcome = save_clipboard(dir.path(), &cfg, &mut world.caps()).unwrap();

        assert!(matches!(outcome, SaveOutcome::Saved { commit: Some(CommitStatus::Committed), .. }));
        assert_eq!(
            world.git.commits.borrow().as_slice(),
            &[(dir.path().to_path_buf(), "greet().dg".to_string())]
        );
        assert!(matches!(&world.ui.shown[0], Shown::Info(_, msg) if msg.contains("\n(Git Commit Successful)")));
    }

    #[test]
    fn test_commit_failure_keeps_file() {
        let dir = TempDir::new().unwrap();
        let cfg = Config {
            git_auto_commit: true,
            ..config_for(dir.path())
        };
        let mut world = World::new(MemoryClipboard::with_text("void foo()"));
        world.git.fail_with = Some("git not found".into());

        let outcome = save_clipboard(dir.path(), &cfg, &mut world.caps()).unwrap();

        assert!(matches!(outcome, SaveOutcome::Saved { commit: Some(CommitStatus::Failed(_)), .. }));
        assert!(dir.path().join("foo().dg").exists());
        assert!(world.clipboard.cleared);
        assert!(matches!(&world.ui.shown[0], Shown::Info(_, msg) if msg.contains("(Git Commit Failed: git not found)")));
    }

    #[test]
    fn test_success_message_can_be_disabled() {
        let dir = TempDir::new().unwrap();
        let cfg = Config {
            show_success: false,
            ..config_for(dir.path())
        };
        let mut world = World::new(MemoryClipboard::with_text("void foo()"));

        save_clipboard(dir.path(), &cfg, &mut world.caps()).unwrap();

        assert!(world.ui.shown.is_empty());
        assert!(dir.path().join("foo().dg").exists());
    }

    #[test]
    fn test_first_run_cancelled_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        let mut world = World::new(MemoryClipboard::with_text("void foo()"));
        world.ui = ScriptedPrompter::new([Answer::Folder(None)]);

        let outcome = run(None, &config_path, Some(Path::new(EXE)), &mut world.caps()).unwrap();

        assert_eq!(outcome, RunOutcome::SetupCancelled);
        assert!(!config_path.exists());
        assert_eq!(world.registry.writes, 0);
        assert_eq!(world.clipboard.content.as_deref(), Some("void foo()"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_first_run_registers_menu_but_does_not_save() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        let mut world = World::new(MemoryClipboard::with_text("void foo()"));
        world.ui = ScriptedPrompter::new([
            Answer::Folder(Some(dir.path().to_path_buf())),
            Answer::Text(Some(".dg".into())),
            Answer::Text(Some("void ".into())),
            Answer::Confirm(false),
            Answer::Confirm(true),
            Answer::Confirm(false),
        ]);

        let outcome = run(None, &config_path, Some(Path::new(EXE)), &mut world.caps()).unwrap();

        assert_eq!(outcome, RunOutcome::FirstRun);
        assert!(config_path.exists());
        assert!(world.registry.writes > 0);
        assert!(!dir.path().join("foo().dg").exists());
        assert!(!world.clipboard.cleared);
    }

    #[test]
    fn test_registry_failure_stops_the_run() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        config::save(&config_path, &Config { auto_save: true, ..config_for(dir.path()) }).unwrap();
        let mut world = World::new(MemoryClipboard::with_text("void foo()"));
        world.registry.read_only = true;

        let result = run(None, &config_path, Some(Path::new(EXE)), &mut world.caps());

        assert!(result.is_err());
        assert!(matches!(world.ui.errors()[0], Shown::Error(_, msg) if msg.starts_with("Setup Error:")));
        assert!(!dir.path().join("foo().dg").exists());
    }

    #[test]
    fn test_unknown_executable_path_stops_the_run() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        config::save(&config_path, &Config { auto_save: true, ..config_for(dir.path()) }).unwrap();
        let mut world = World::new(MemoryClipboard::with_text("void foo()"));

        let result = run(None, &config_path, None, &mut world.caps());

        assert!(result.is_err());
        assert_eq!(world.registry.writes, 0);
        assert!(matches!(world.ui.errors()[0], Shown::Error(_, msg)
            if msg.starts_with("Setup Error:") && msg.contains("executable path")));
        assert!(!dir.path().join("foo().dg").exists());
    }

    #[test]
    fn test_existing_config_auto_saves() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        let cfg = Config {
            auto_save: true,
            show_success: false,
            ..config_for(dir.path())
        };
        config::save(&config_path, &cfg).unwrap();
        let mut world = World::new(MemoryClipboard::with_text("void foo(){}\n{ }"));

        let outcome = run(None, &config_path, Some(Path::new(EXE)), &mut world.caps()).unwrap();

        assert_eq!(
            outcome,
            RunOutcome::Save(SaveOutcome::Saved {
                path: dir.path().join("foo(){}.dg"),
                commit: None
            })
        );
        assert!(world.ui.folder_prompts.is_empty());
        assert_eq!(
            world.registry.value(r"Software\Classes\Directory\shell\dgGit\command", ""),
            Some(r#""C:\tools\dggit.exe" "%1""#)
        );
    }
}
