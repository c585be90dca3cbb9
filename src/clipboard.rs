use anyhow::{Result, anyhow};

pub trait ClipboardAccess {
    fn read_text(&mut self) -> Result<String>;
    fn clear(&mut self) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct SystemClipboard;

#[cfg(target_os = "windows")]
impl ClipboardAccess for SystemClipboard {
    fn read_text(&mut self) -> Result<String> {
        clipboard_win::get_clipboard_string()
            .map_err(|e| anyhow!("Windows clipboard error: {}", e))
    }

    fn clear(&mut self) -> Result<()> {
        clipboard_win::set_clipboard_string("")
            .map_err(|e| anyhow!("Windows clipboard error: {}", e))
    }
}

#[cfg(not(target_os = "windows"))]
impl ClipboardAccess for SystemClipboard {
    fn read_text(&mut self) -> Result<String> {
        Err(anyhow!("Clipboard access is only supported on Windows in this build."))
    }

    fn clear(&mut self) -> Result<()> {
        Err(anyhow!("Clipboard access is only supported on Windows in this build."))
    }
}
