mod cli;
mod clipboard;
mod config;
mod git;
mod pipeline;
mod shell;
mod text;
mod ui;
mod wizard;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::Cli;
use crate::clipboard::SystemClipboard;
use crate::git::GitCli;
use crate::pipeline::{Capabilities, run};
use crate::shell::{DesktopShortcut, PlatformRegistry};
use crate::ui::TerminalPrompter;

pub const APP_NAME: &str = "dgGit";

fn main() -> Result<()> {
    let cli = Cli::parse();

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let exe = std::env::current_exe()
        .map_err(|e| tracing::warn!("could not resolve executable path: {}", e))
        .ok();
    let config_path = config::config_path();
    tracing::debug!("config file {}", config_path.display());

    let mut ui = TerminalPrompter::default();
    let mut clipboard = SystemClipboard;
    let git = GitCli;
    let mut registry = PlatformRegistry::default();
    let mut shortcut = DesktopShortcut { exe: exe.clone() };
    let mut caps = Capabilities {
        ui: &mut ui,
        clipboard: &mut clipboard,
        git: &git,
        registry: &mut registry,
        shortcut: &mut shortcut,
    };

    // The error was already shown to the user; only the exit code is left.
    match run(cli.folder(), &config_path, exe.as_deref(), &mut caps) {
        Ok(outcome) => tracing::debug!("finished: {:?}", outcome),
        Err(e) => {
            tracing::error!("{:#}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}
