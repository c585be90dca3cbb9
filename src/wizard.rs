use std::path::Path;

use anyhow::Result;

use crate::APP_NAME;
use crate::config::{self, Config};
use crate::shell::ShortcutCreator;
use crate::ui::Prompter;

pub const DEFAULT_EXTENSION: &str = ".dg";
pub const DEFAULT_PREFIXES: &str = "void |int |string ";

const WELCOME: &str = "Welcome to dgGit!\n\n\
This looks like the first run. dgGit saves whatever code is on your clipboard \
into a file named after its first line, and can commit it to a local git repository.\n\n\
A few preferences need to be set first.";

const STEP1_HELP: &str = "Pick the folder your code should be saved to by default.\n\n\
The folder prompt starts here every time, so a repository (or its parent) works well. \
Right-clicking a specific folder always saves into that folder instead.\n\n\
You can change this later in the config file, or delete it to run this setup again.";

const STEP2_HELP: &str = "Enter the extension for saved files.\n(e.g. .dg, .txt, .js)";

const STEP3_HELP: &str = "Enter the text to remove from the start of the first line \
when building the file name.\n\n\
Separate alternatives with a pipe (|); the first one that matches is removed.\n\n\
Example: 'void |int |string '\n(mind the space after each word)";

/// Ask for every setting, persist them to `config_path`, and optionally create the
/// desktop shortcut. Returns `None` when the user cancels; nothing is written then.
pub fn run_setup_wizard(
    config_path: &Path,
    ui: &mut dyn Prompter,
    shortcut: &mut dyn ShortcutCreator,
) -> Result<Option<Config>> {
    ui.info(APP_NAME, WELCOME);

    ui.info("Step 1 Instructions", STEP1_HELP);
    ui.pace();
    let Some(start_dir) = ui.pick_folder(
        "Step 1: Select the folder to save clipboard code into (a local repo?)",
        None,
    ) else {
        return Ok(cancelled(ui));
    };

    ui.pace();
    ui.info("Step 2 Instructions", STEP2_HELP);
    ui.pace();
    let Some(extension) = ui.text("Step 2: File Extension", "File extension", DEFAULT_EXTENSION) else {
        return Ok(cancelled(ui));
    };

    ui.pace();
    ui.info("Step 3 Instructions", STEP3_HELP);
    ui.pace();
    let Some(prefix_to_strip) =
        ui.text("Step 3: Prefix Stripping", "Prefixes (separate with |)", DEFAULT_PREFIXES)
    else {
        return Ok(cancelled(ui));
    };

    ui.pace();
    let git_auto_commit = ui.confirm(
        "Step 4: Git Integration",
        "Run 'git add' and 'git commit' automatically after each save?",
        false,
    );

    ui.pace();
    let auto_save = ui.confirm(
        "Step 5: Auto-Save Mode",
        "Skip the folder prompt and always save to the default folder?",
        false,
    );

    ui.pace();
    let create_shortcut = ui.confirm("Step 6: Desktop Shortcut", "Create a shortcut on your Desktop?", true);

    let cfg = Config {
        start_dir: start_dir.display().to_string(),
        extension,
        prefix_to_strip,
        show_success: true,
        auto_save,
        git_auto_commit,
    };
    config::save(config_path, &cfg)?;
    tracing::info!("wrote config to {}", config_path.display());

    if create_shortcut {
        if let Err(e) = shortcut.create_shortcut() {
            tracing::warn!("shortcut creation failed: {:#}", e);
            ui.error(APP_NAME, &format!("Could not create shortcut:\n{:#}", e));
        }
    }

    ui.info(
        APP_NAME,
        &format!(
            "Setup Complete!\n\nSettings saved to:\n{}\n\n(Edit this file to change settings later)\n\n\
             You can now use the right-click menu or the desktop shortcut.",
            config_path.display()
        ),
    );
    Ok(Some(cfg))
}

fn cancelled(ui: &mut dyn Prompter) -> Option<Config> {
    tracing::info!("setup cancelled");
    ui.warn(APP_NAME, "Setup was cancelled.");
    None
}
