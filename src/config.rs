use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::shell::ShortcutCreator;
use crate::ui::Prompter;
use crate::wizard::run_setup_wizard;

pub const CONFIG_FILE_NAME: &str = "dggit.cfg";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub start_dir: String,
    pub extension: String,
    /// Pipe-delimited prefixes, tried in order.
    pub prefix_to_strip: String,
    pub show_success: bool,
    pub auto_save: bool,
    pub git_auto_commit: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_dir: ".".to_string(),
            extension: ".dg".to_string(),
            prefix_to_strip: "void ".to_string(),
            show_success: true,
            auto_save: false,
            git_auto_commit: false,
        }
    }
}

/// How the configuration came to be for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Startup {
    /// A settings file already existed.
    Existing(Config),
    /// No settings file existed and the setup wizard just wrote one.
    FirstRun(Config),
    /// No settings file existed and the user cancelled setup.
    Cancelled,
}

/// `dggit.cfg` next to the running executable, or in the working directory when
/// the executable path cannot be determined.
pub fn config_path() -> PathBuf {
    let dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    dir.join(CONFIG_FILE_NAME)
}

/// Load the settings file, running the setup wizard when it does not exist yet.
pub fn load(
    path: &Path,
    ui: &mut dyn Prompter,
    shortcut: &mut dyn ShortcutCreator,
) -> Result<Startup> {
    if !path.exists() {
        tracing::info!("no config at {}, starting setup", path.display());
        return Ok(match run_setup_wizard(path, ui, shortcut)? {
            Some(cfg) => Startup::FirstRun(cfg),
            None => Startup::Cancelled,
        });
    }
    Ok(Startup::Existing(read_config(path)))
}

/// Read a settings file. Unreadable files yield the built-in defaults.
pub fn read_config(path: &Path) -> Config {
    match fs::read_to_string(path) {
        Ok(content) => parse_config(&content),
        Err(e) => {
            tracing::warn!("could not read {}: {}; using defaults", path.display(), e);
            Config::default()
        }
    }
}

/// Parse `key=value` lines on top of the defaults. Comments, blank lines, lines
/// without `=` and unknown keys are skipped.
pub fn parse_config(content: &str) -> Config {
    let mut cfg = Config::default();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, val)) = line.split_once('=') else {
            continue;
        };
        let val = val.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "startdir" => cfg.start_dir = val.to_string(),
            "extension" => cfg.extension = val.to_string(),
            // Quotes let the value keep its trailing spaces.
            "prefixtostrip" => cfg.prefix_to_strip = unquote(val).to_string(),
            "showsuccessmessage" => cfg.show_success = val == "true",
            "autosave" => cfg.auto_save = val == "true",
            "gitautocommit" => cfg.git_auto_commit = val == "true",
            other => tracing::debug!("ignoring unknown config key '{}'", other),
        }
    }
    cfg
}

/// Remove one pair of enclosing double quotes, if present.
fn unquote(val: &str) -> &str {
    val.strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(val)
}

/// Overwrite `path` with the commented settings file for `cfg`.
pub fn save(path: &Path, cfg: &Config) -> Result<()> {
    fs::write(path, render_config(cfg))
        .with_context(|| format!("Failed to write config file {}", path.display()))
}

pub fn render_config(cfg: &Config) -> String {
    format!(
        r#"# dgGit settings
# Edit by hand, or delete this file to run the setup wizard again.

# Folder files are saved to, unless you right-click a specific folder.
StartDir={start_dir}

# Extension added to every saved file (e.g. .dg, .txt, .js).
Extension={extension}

# Text removed from the start of the first line to build the file name.
# Separate alternatives with "|"; the first one that matches is removed.
# Keep the quotes so trailing spaces are preserved.
PrefixToStrip="{prefix}"

# Show a message after each save? (true/false)
ShowSuccessMessage={show_success}

# Save straight to StartDir without asking for a folder? (true/false)
AutoSave={auto_save}

# Run 'git add' and 'git commit' after saving? (true/false)
# Git must be on PATH and the target folder must be inside a repository.
GitAutoCommit={git_auto_commit}
"#,
        start_dir = cfg.start_dir,
        extension = cfg.extension,
        prefix = cfg.prefix_to_strip,
        show_success = cfg.show_success,
        auto_save = cfg.auto_save,
        git_auto_commit = cfg.git_auto_commit,
    )
}
