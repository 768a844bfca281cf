//! Capability traits between the capture engine and the desktop
//!
//! The engine never calls the OS directly. Each component of a capture
//! reaches the desktop through one of these traits, so the same state
//! machine drives both the Win32 backend and the simulated desktop used in
//! tests.
//!
//! # Trait Hierarchy
//!
//! - [`WindowInspector`]: Side-effect-free reads of window state and geometry
//! - [`TransientStateController`]: Reversible mutations made during a capture
//! - [`SurfaceRenderer`]: Off-screen surfaces and render attempts
//! - [`CaptureSurface`]: One scoped context/bitmap pair
//! - [`WindowEnumerator`]: Top-level window enumeration
//! - [`DesktopBackend`]: Everything above, implemented automatically

use crate::{
    error::CaptureResult,
    model::{
        CaptureArea, CaptureMode, ClientGeometry, ClientRect, LayerState, Point, WindowHandle,
        WindowInfo, WindowRect,
    },
};

use super::{extract::RawBitmap, render::RenderStrategy};

// ============================================================================
// State and geometry
// ============================================================================

/// Capability: read window state without changing it.
///
/// Queries on a handle whose window has closed return
/// [`CaptureError::InvalidHandle`](crate::error::CaptureError::InvalidHandle)
/// for geometry and `false` for boolean state.
pub trait WindowInspector: Send + Sync {
    /// Whether the handle still refers to an existing window
    fn is_window(&self, handle: WindowHandle) -> bool;

    fn is_minimized(&self, handle: WindowHandle) -> bool;

    fn is_visible(&self, handle: WindowHandle) -> bool;

    /// The window currently holding input focus, if any
    fn foreground_window(&self) -> Option<WindowHandle>;

    /// Window rectangle in screen coordinates
    fn window_rect(&self, handle: WindowHandle) -> CaptureResult<WindowRect>;

    /// Client rectangle in window-local coordinates, anchored at (0, 0)
    fn client_rect(&self, handle: WindowHandle) -> CaptureResult<ClientRect>;

    /// Screen position of the client area's (0, 0)
    fn client_origin(&self, handle: WindowHandle) -> CaptureResult<Point>;

    /// The rectangle a capture in `mode` covers
    ///
    /// Client-only captures get a client-anchored rectangle with the screen
    /// offsets zeroed. A non-positive width or height is returned as-is; it
    /// is up to the caller to reject it.
    fn dimensions(&self, handle: WindowHandle, mode: CaptureMode) -> CaptureResult<CaptureArea> {
        Ok(match mode {
            CaptureMode::Full => CaptureArea::from_rect(self.window_rect(handle)?),
            CaptureMode::ClientOnly => CaptureArea::from_client(self.client_rect(handle)?),
        })
    }

    /// Samples everything needed to crop the client area out of a
    /// full-window image
    fn client_geometry(&self, handle: WindowHandle) -> CaptureResult<ClientGeometry> {
        Ok(ClientGeometry {
            window:        self.window_rect(handle)?,
            client:        self.client_rect(handle)?,
            client_origin: self.client_origin(handle)?,
        })
    }
}

// ============================================================================
// Reversible mutations
// ============================================================================

/// Capability: temporarily make a minimized window capturable.
///
/// Every mutation here has an inverse, and all of them are best-effort:
/// they report success as a `bool` and never fail the capture on their own.
pub trait TransientStateController: Send + Sync {
    /// Layered style and constant alpha as they are right now
    fn layer_state(&self, handle: WindowHandle) -> CaptureResult<LayerState>;

    /// Makes the window layered and sets it to `alpha` (0-255)
    fn hide_flash(&self, handle: WindowHandle, alpha: u8) -> bool;

    /// Puts the layered style and alpha back to `original`
    fn restore_opacity(&self, handle: WindowHandle, original: LayerState) -> bool;

    /// Shows a minimized window without giving it focus
    ///
    /// Implementations should issue two independent directives and report
    /// success if either one took effect.
    fn unminimize_without_activating(&self, handle: WindowHandle) -> bool;

    /// Returns the window to the minimized state without activating it
    fn reminimize(&self, handle: WindowHandle) -> bool;

    /// Hides a window that was shown only for the capture
    fn hide_window(&self, handle: WindowHandle) -> bool;

    /// Gives input focus back to `handle`
    fn set_foreground(&self, handle: WindowHandle) -> bool;
}

// ============================================================================
// Rendering
// ============================================================================

/// An off-screen pixel buffer bound to a rendering context
///
/// Created fresh for each capture and dropped before the capture returns.
/// Dropping it releases every OS resource it holds.
pub trait CaptureSurface {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Copies the buffer's current contents out as 32-bit BGRX
    fn read_pixels(&mut self) -> CaptureResult<RawBitmap>;
}

/// Capability: paint a window into an off-screen surface.
pub trait SurfaceRenderer: Send + Sync {
    type Surface: CaptureSurface;

    /// Allocates a context and `width` x `height` buffer for `handle`
    ///
    /// The context covers the client area or the whole window depending on
    /// `mode`.
    fn create_surface(
        &self,
        handle: WindowHandle,
        mode: CaptureMode,
        width: u32,
        height: u32,
    ) -> CaptureResult<Self::Surface>;

    /// Performs a single render attempt; `true` means the OS reported success
    fn attempt(
        &self,
        handle: WindowHandle,
        surface: &mut Self::Surface,
        strategy: RenderStrategy,
    ) -> bool;
}

// ============================================================================
// Enumeration
// ============================================================================

/// Capability: list top-level windows.
pub trait WindowEnumerator: Send + Sync {
    /// All top-level windows in the order the OS reports them
    fn list_windows(&self) -> CaptureResult<Vec<WindowInfo>>;

    /// First window whose title equals `title` exactly
    fn find_by_exact_title(&self, title: &str) -> CaptureResult<Option<WindowHandle>> {
        Ok(self
            .list_windows()?
            .into_iter()
            .find(|w| w.title == title)
            .map(|w| w.handle))
    }
}

/// A complete desktop: everything a [`WindowCapturer`](super::WindowCapturer)
/// needs.
///
/// Implemented automatically for any type providing all capabilities.
pub trait DesktopBackend:
    WindowInspector + TransientStateController + SurfaceRenderer + WindowEnumerator
{
}

impl<T> DesktopBackend for T where
    T: WindowInspector + TransientStateController + SurfaceRenderer + WindowEnumerator
{
}
