use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "dggit", version, about = "Save the clipboard to a file named after its first line, optionally committing it with git", long_about = None)]
pub struct Cli {
    /// Folder to save into. Passed by the folder right-click menu; when omitted the
    /// default folder (auto-save) or a folder prompt is used
    pub folder: Option<String>,
}

impl Cli {
    /// The folder argument, trimmed.
    pub fn folder(&self) -> Option<&str> {
        self.folder.as_deref().map(str::trim)
    }
}
