//! Window discovery over the top-level window list
//!
//! All searches preserve enumeration order, which on Windows is z-order
//! (topmost first), so the first match is usually the window the user sees.
//!
//! # Examples
//!
//! ```
//! use wincap_core::capture::{discovery, MockDesktop, MockWindow};
//!
//! let desktop = MockDesktop::new()
//!     .with_window(MockWindow::new(1, "Notepad"))
//!     .with_window(MockWindow::new(2, "note.txt - Notepad"))
//!     .with_window(MockWindow::new(3, "Calculator"));
//!
//! let found = discovery::find_windows_by_title_substring(&desktop, "NOTEPAD").unwrap();
//! assert_eq!(found.len(), 2);
//! ```

use crate::{
    error::CaptureResult,
    model::{WindowHandle, WindowInfo, WindowStatus},
};

use super::traits::{WindowEnumerator, WindowInspector};

/// Windows whose title contains `text`, ignoring case
///
/// An empty `text` matches every window.
pub fn find_windows_by_title_substring<E: WindowEnumerator + ?Sized>(
    enumerator: &E,
    text: &str,
) -> CaptureResult<Vec<WindowInfo>> {
    let windows = enumerator.list_windows()?;
    Ok(filter_by_title_substring(windows, text))
}

/// First window whose title equals `title` exactly
pub fn find_window_by_exact_title<E: WindowEnumerator + ?Sized>(
    enumerator: &E,
    title: &str,
) -> CaptureResult<Option<WindowHandle>> {
    enumerator.find_by_exact_title(title)
}

/// Windows owned by process `pid`
pub fn find_windows_by_owning_process<E: WindowEnumerator + ?Sized>(
    enumerator: &E,
    pid: u32,
) -> CaptureResult<Vec<WindowInfo>> {
    Ok(enumerator
        .list_windows()?
        .into_iter()
        .filter(|w| w.pid == pid)
        .collect())
}

/// Diagnostic listing of every window with a non-blank title
///
/// Logs one line per window and a total at `info` level.
pub fn list_all_windows<D: WindowEnumerator + WindowInspector + ?Sized>(
    desktop: &D,
) -> CaptureResult<Vec<WindowStatus>> {
    let foreground = desktop.foreground_window();

    let statuses: Vec<WindowStatus> = desktop
        .list_windows()?
        .into_iter()
        .filter(|w| !w.title.trim().is_empty())
        .map(|w| WindowStatus {
            foreground: Some(w.handle) == foreground,
            handle:     w.handle,
            title:      w.title,
            pid:        w.pid,
            visible:    w.visible,
            minimized:  w.minimized,
        })
        .collect();

    for status in &statuses {
        tracing::info!(
            title = %status.title,
            handle = %status.handle,
            pid = status.pid,
            status = %status.status_label(),
            "Window"
        );
    }
    tracing::info!(count = statuses.len(), "Total windows with titles");

    Ok(statuses)
}

pub(crate) fn filter_by_title_substring(windows: Vec<WindowInfo>, text: &str) -> Vec<WindowInfo> {
    let needle = text.to_lowercase();
    windows
        .into_iter()
        .filter(|w| w.title.to_lowercase().contains(&needle))
        .collect()
}
