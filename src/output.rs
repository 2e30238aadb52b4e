//! Output sinks for rendered reports: clipboard and file.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Nothing to export: the report is empty")]
    EmptyReport,
    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),
    #[error("Failed to save {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Something that can take text for pasting elsewhere.
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<(), String>;

    /// Whether `set_text` blocks until another program takes the clipboard.
    fn holds_until_replaced(&self) -> bool {
        false
    }
}

/// The system clipboard.
///
/// The handle is opened lazily on first copy; on Linux the clipboard
/// contents live only as long as the handle, so it is kept afterwards.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
    hold: bool,
}

impl SystemClipboard {
    /// A clipboard for short-lived processes. On Linux, `set_text` keeps
    /// serving the text until something else is copied, since X11 and
    /// Wayland drop the contents when the owning process exits.
    pub fn holding() -> Self {
        Self {
            inner: None,
            hold: cfg!(target_os = "linux"),
        }
    }
}

#[cfg(target_os = "linux")]
fn set_and_hold(clipboard: &mut arboard::Clipboard, text: &str) -> Result<(), arboard::Error> {
    use arboard::SetExtLinux;
    clipboard.set().wait().text(text.to_owned())
}

#[cfg(not(target_os = "linux"))]
fn set_and_hold(clipboard: &mut arboard::Clipboard, text: &str) -> Result<(), arboard::Error> {
    clipboard.set_text(text)
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), String> {
        if self.inner.is_none() {
            self.inner = Some(arboard::Clipboard::new().map_err(|e| e.to_string())?);
        }
        let Some(clipboard) = self.inner.as_mut() else {
            return Err("clipboard not initialized".to_string());
        };
        let result = if self.hold {
            set_and_hold(clipboard, text)
        } else {
            clipboard.set_text(text)
        };
        result.map_err(|e| e.to_string())
    }

    fn holds_until_replaced(&self) -> bool {
        self.hold
    }
}

/// Copy `text` to `clipboard`.
///
/// Returns Ok only once the clipboard write itself has succeeded.
pub fn copy_to_clipboard(clipboard: &mut dyn Clipboard, text: &str) -> Result<(), ExportError> {
    if text.is_empty() {
        return Err(ExportError::EmptyReport);
    }
    clipboard.set_text(text).map_err(|e| {
        warn!(error = %e, "clipboard_write_failed");
        ExportError::Clipboard(e)
    })?;
    info!(bytes = text.len(), "report_copied");
    Ok(())
}

/// Write `text` to `dir/filename` exactly as given.
///
/// Returns the path written. An existing file of the same name is replaced.
pub fn download_as_file(dir: &Path, filename: &str, text: &str) -> Result<PathBuf, ExportError> {
    if text.is_empty() {
        return Err(ExportError::EmptyReport);
    }
    fs::create_dir_all(dir).map_err(|source| ExportError::Write {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(filename);
    fs::write(&path, text.as_bytes()).map_err(|source| {
        warn!(path = ?path, error = %source, "report_save_failed");
        ExportError::Write {
            path: path.clone(),
            source,
        }
    })?;
    info!(path = ?path, bytes = text.len(), "report_saved");
    Ok(path)
}
