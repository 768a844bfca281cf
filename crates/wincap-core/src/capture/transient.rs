//! Scoped save/mutate/restore of desktop state
//!
//! Focus and the target's minimized state belong to the whole desktop, not
//! to this process. Each capture snapshots them on its own stack and hands
//! the snapshot to a guard whose `Drop` puts everything back, so every exit
//! path (early return, `?`, panic unwinding) runs the restoration.
//!
//! Guards are declared in the order they take effect. Rust drops locals in
//! reverse, so the focus guard, created first, always restores last.
//! Restoration is best-effort: a failure is logged as a warning and never
//! replaces the capture's own result.

use crate::{
    error::{CaptureError, CaptureResult},
    model::{FocusSnapshot, LayerState, WindowHandle, WindowSnapshot},
};

use super::traits::{TransientStateController, WindowInspector};

/// Gives focus back to whichever window held it when the guard was created
pub(crate) struct FocusGuard<'a, D: WindowInspector + TransientStateController + ?Sized> {
    desktop:  &'a D,
    snapshot: FocusSnapshot,
}

impl<'a, D: WindowInspector + TransientStateController + ?Sized> FocusGuard<'a, D> {
    pub(crate) fn capture(desktop: &'a D) -> Self {
        let snapshot = FocusSnapshot::new(desktop.foreground_window());
        Self { desktop, snapshot }
    }
}

impl<D: WindowInspector + TransientStateController + ?Sized> Drop for FocusGuard<'_, D> {
    fn drop(&mut self) {
        let Some(owner) = self.snapshot.owner() else {
            return;
        };
        if self.desktop.foreground_window() == Some(owner) {
            return;
        }
        if !self.desktop.is_window(owner) {
            tracing::debug!(handle = %owner, "Previous focus owner is gone, not restoring focus");
            return;
        }

        if self.desktop.set_foreground(owner) {
            tracing::debug!(handle = %owner, "Restored focus");
        } else {
            tracing::warn!(handle = %owner, "Failed to restore focus to previous window");
        }
    }
}

/// Shows a minimized window for the duration of a capture
///
/// Dropping the guard re-minimizes the window first, while it is still
/// transparent, and only then puts its opacity back.
pub(crate) struct TransientGuard<'a, D: WindowInspector + TransientStateController + ?Sized> {
    desktop:        &'a D,
    handle:         WindowHandle,
    snapshot:       WindowSnapshot,
    original_layer: Option<LayerState>,
}

impl<'a, D: WindowInspector + TransientStateController + ?Sized> TransientGuard<'a, D> {
    /// Hides the restore flash and forces the window visible
    ///
    /// On failure the returned error drops the guard, which undoes whatever
    /// part of the mutation already happened.
    pub(crate) fn engage(
        desktop: &'a D,
        handle: WindowHandle,
        snapshot: WindowSnapshot,
        flash_alpha: u8,
    ) -> CaptureResult<Self> {
        let mut guard = Self {
            desktop,
            handle,
            snapshot,
            original_layer: None,
        };

        guard.hide_flash(flash_alpha);

        if !desktop.unminimize_without_activating(handle) {
            tracing::error!(%handle, "Failed to show minimized window without activation");
            return Err(CaptureError::TransientStateFailure { handle });
        }

        Ok(guard)
    }

    fn hide_flash(&mut self, alpha: u8) {
        let original = match self.desktop.layer_state(self.handle) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(handle = %self.handle, error = %e, "Could not read layered state, restore will be visible");
                return;
            }
        };

        if original.is_per_pixel() {
            tracing::info!(handle = %self.handle, "Window uses per-pixel alpha, restore will be visible");
            return;
        }

        // Record before mutating so a partial failure is still undone
        self.original_layer = Some(original);
        if !self.desktop.hide_flash(self.handle, alpha) {
            tracing::warn!(handle = %self.handle, alpha, "Failed to make window transparent, restore will be visible");
        }
    }
}

impl<D: WindowInspector + TransientStateController + ?Sized> Drop for TransientGuard<'_, D> {
    fn drop(&mut self) {
        let handle = self.handle;

        if self.snapshot.was_minimized()
            && !self.desktop.is_minimized(handle)
            && !self.desktop.reminimize(handle)
        {
            tracing::warn!(%handle, "Failed to re-minimize window");
        }

        if !self.snapshot.was_visible()
            && self.desktop.is_visible(handle)
            && !self.desktop.hide_window(handle)
        {
            tracing::warn!(%handle, "Failed to hide window again");
        }

        if let Some(original) = self.original_layer {
            if !self.desktop.restore_opacity(handle, original) {
                tracing::warn!(%handle, "Failed to restore window opacity");
            }
        }
    }
}
