use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use crate::APP_NAME;

/// Folder background right-click: save into the folder prompt / default folder.
const BACKGROUND_MENU: &str = r"Software\Classes\Directory\Background\shell";
/// Folder icon right-click: the folder is passed as the first argument.
const FOLDER_MENU: &str = r"Software\Classes\Directory\shell";
/// Old per-file entry that is no longer used.
const LEGACY_FILE_MENU: &str = r"Software\Classes\*\shell";

const MENU_ICON: &str = "shell32.dll,259";

/// String values under the current user's registry hive. Key paths are relative
/// to that hive; `name` of `""` is the key's default value.
pub trait RegistryStore {
    fn get_string(&self, key: &str, name: &str) -> Option<String>;
    /// Create `key` if needed and store `value`.
    fn set_string(&mut self, key: &str, name: &str, value: &str) -> Result<()>;
    fn delete_key(&mut self, key: &str) -> Result<()>;
}

pub trait ShortcutCreator {
    fn create_shortcut(&mut self) -> Result<()>;
}

/// Command line stored for a menu entry.
pub fn menu_command(exe: &Path, pass_folder: bool) -> String {
    if pass_folder {
        format!("\"{}\" \"%1\"", exe.display())
    } else {
        format!("\"{}\"", exe.display())
    }
}

/// (Re)create both folder context-menu entries pointing at `exe` and drop the
/// legacy file entry. Safe to call on every launch.
pub fn refresh_context_menu(reg: &mut dyn RegistryStore, exe: &Path) -> Result<()> {
    set_menu_key(reg, BACKGROUND_MENU, exe, false)?;
    set_menu_key(reg, FOLDER_MENU, exe, true)?;

    let legacy = format!(r"{}\{}", LEGACY_FILE_MENU, APP_NAME);
    for key in [format!(r"{}\command", legacy), legacy] {
        if let Err(e) = reg.delete_key(&key) {
            tracing::debug!("legacy key {} not removed: {:#}", key, e);
        }
    }
    Ok(())
}

fn set_menu_key(reg: &mut dyn RegistryStore, base: &str, exe: &Path, pass_folder: bool) -> Result<()> {
    let key = format!(r"{}\{}", base, APP_NAME);
    let command_key = format!(r"{}\command", key);

    reg.set_string(&key, "", APP_NAME)
        .with_context(|| format!("Failed to write {}", key))?;
    reg.set_string(&key, "Icon", MENU_ICON)
        .with_context(|| format!("Failed to write {}", key))?;

    let command = menu_command(exe, pass_folder);
    if reg.get_string(&command_key, "").as_deref() != Some(command.as_str()) {
        tracing::info!("updating context menu command at {}", command_key);
        reg.set_string(&command_key, "", &command)
            .with_context(|| format!("Failed to write {}", command_key))?;
    }
    Ok(())
}

/// `<Desktop>\dgGit.lnk` pointing at the executable, written through PowerShell's
/// `WScript.Shell` COM object.
pub struct DesktopShortcut {
    pub exe: Option<PathBuf>,
}

impl ShortcutCreator for DesktopShortcut {
    #[cfg(target_os = "windows")]
    fn create_shortcut(&mut self) -> Result<()> {
        use std::process::Command;

        let exe = self
            .exe
            .as_deref()
            .ok_or_else(|| anyhow!("Could not resolve the executable path"))?;
        let desktop = dirs::desktop_dir().ok_or_else(|| anyhow!("Could not find the Desktop folder"))?;
        let link = desktop.join(format!("{}.lnk", APP_NAME));
        let script = format!(
            "$s=(New-Object -COM WScript.Shell).CreateShortcut('{}');$s.TargetPath='{}';$s.Save()",
            ps_quote(&link.display().to_string()),
            ps_quote(&exe.display().to_string()),
        );

        let output = Command::new("powershell")
            .args(["-NoProfile", "-NonInteractive", "-Command", &script])
            .output()
            .context("Failed to execute 'powershell'")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "'powershell' failed with exit code {:?}: {}",
                output.status.code(),
                stderr.trim()
            ));
        }
        tracing::info!("created shortcut {}", link.display());
        Ok(())
    }

    #[cfg(not(target_os = "windows"))]
    fn create_shortcut(&mut self) -> Result<()> {
        Err(anyhow!("Desktop shortcuts are only supported on Windows"))
    }
}

/// Escape a string for a single-quoted PowerShell literal.
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
fn ps_quote(s: &str) -> String {
    s.replace('\'', "''")
}

#[cfg(target_os = "windows")]
pub use self::windows_registry::CurrentUserRegistry as PlatformRegistry;

#[cfg(not(target_os = "windows"))]
pub use self::NullRegistry as PlatformRegistry;

/// Explorer context menus only exist on Windows; elsewhere nothing is stored.
#[cfg(not(target_os = "windows"))]
#[derive(Debug, Default)]
pub struct NullRegistry;

#[cfg(not(target_os = "windows"))]
impl RegistryStore for NullRegistry {
    fn get_string(&self, _key: &str, _name: &str) -> Option<String> {
        None
    }

    fn set_string(&mut self, key: &str, name: &str, _value: &str) -> Result<()> {
        tracing::debug!("no registry on this platform, skipping {}[{}]", key, name);
        Ok(())
    }

    fn delete_key(&mut self, _key: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(target_os = "windows")]
mod windows_registry {
    use anyhow::{Result, anyhow};
    use windows::Win32::Foundation::ERROR_SUCCESS;
    use windows::Win32::System::Registry::{
        HKEY, HKEY_CURRENT_USER, KEY_ALL_ACCESS, REG_OPTION_NON_VOLATILE, REG_SZ, RRF_RT_REG_SZ,
        RegCloseKey, RegCreateKeyExW, RegDeleteKeyW, RegGetValueW, RegSetValueExW,
    };
    use windows::core::{HSTRING, PCWSTR};

    use super::RegistryStore;

    #[derive(Debug, Default)]
    pub struct CurrentUserRegistry;

    impl RegistryStore for CurrentUserRegistry {
        fn get_string(&self, key: &str, name: &str) -> Option<String> {
            let key = HSTRING::from(key);
            let name = HSTRING::from(name);
            unsafe {
                let mut size: u32 = 0;
                let status = RegGetValueW(
                    HKEY_CURRENT_USER,
                    &key,
                    &name,
                    RRF_RT_REG_SZ,
                    None,
                    None,
                    Some(&mut size),
                );
                if status != ERROR_SUCCESS || size == 0 {
                    return None;
                }
                let mut buf = vec![0u16; (size as usize).div_ceil(2)];
                let status = RegGetValueW(
                    HKEY_CURRENT_USER,
                    &key,
                    &name,
                    RRF_RT_REG_SZ,
                    None,
                    Some(buf.as_mut_ptr().cast()),
                    Some(&mut size),
                );
                if status != ERROR_SUCCESS {
                    return None;
                }
                let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
                Some(String::from_utf16_lossy(&buf[..len]))
            }
        }

        fn set_string(&mut self, key: &str, name: &str, value: &str) -> Result<()> {
            let key_w = HSTRING::from(key);
            let name_w = HSTRING::from(name);
            let data: Vec<u8> = value
                .encode_utf16()
                .chain(std::iter::once(0))
                .flat_map(u16::to_le_bytes)
                .collect();
            unsafe {
                let mut hkey = HKEY::default();
                RegCreateKeyExW(
                    HKEY_CURRENT_USER,
                    &key_w,
                    None,
                    PCWSTR::null(),
                    REG_OPTION_NON_VOLATILE,
                    KEY_ALL_ACCESS,
                    None,
                    &mut hkey,
                    None,
                )
                .ok()
                .map_err(|e| anyhow!("failed to open HKCU\\{}: {e}", key))?;
                let written = RegSetValueExW(hkey, &name_w, None, REG_SZ, Some(data.as_slice()))
                    .ok()
                    .map_err(|e| anyhow!("failed to set HKCU\\{}[{}]: {e}", key, name));
                let _ = RegCloseKey(hkey);
                written
            }
        }

        fn delete_key(&mut self, key: &str) -> Result<()> {
            let key_w = HSTRING::from(key);
            unsafe {
                RegDeleteKeyW(HKEY_CURRENT_USER, &key_w)
                    .ok()
                    .map_err(|e| anyhow!("failed to delete HKCU\\{}: {e}", key))
            }
        }
    }
}
