//! Window capture engine and desktop backends
//!
//! # Architecture
//!
//! A capture is split into components that each reach the OS through one
//! capability trait:
//!
//! - [`WindowInspector`] - read window state and geometry
//! - [`TransientStateController`] - temporarily show minimized windows
//! - [`SurfaceRenderer`] / [`CaptureSurface`] - paint into off-screen buffers
//! - [`WindowEnumerator`] - list top-level windows
//!
//! [`WindowCapturer`] drives them through the capture state machine and
//! guarantees that every piece of desktop state it changes is put back.
//!
//! ## Backends
//!
//! | Backend | Platform | Notes |
//! |---------|----------|-------|
//! | `Win32Desktop` | Windows | GDI `PrintWindow` / `BitBlt` |
//! | [`MockDesktop`] | all | Simulated windows for tests |
//!
//! # Core Types
//!
//! - [`RasterImage`] - RGB8 capture result
//! - [`RenderStrategy`] - one entry of the render fallback chain
//! - [`RawBitmap`] - surface bytes before conversion

use crate::error::CaptureResult;

pub mod discovery;
pub mod extract;
pub mod mock;
pub mod orchestrator;
pub mod raster;
pub mod render;
pub mod traits;
mod transient;

#[cfg(target_os = "windows")]
pub mod windows_backend;

pub use extract::{RawBitmap, RowOrder};
pub use mock::{MockDesktop, MockEvent, MockSurface, MockWindow, MockWindowState};
pub use orchestrator::WindowCapturer;
pub use raster::RasterImage;
pub use render::{RenderStrategy, RenderedSurface};
pub use traits::{
    CaptureSurface, DesktopBackend, SurfaceRenderer, TransientStateController, WindowEnumerator,
    WindowInspector,
};
#[cfg(target_os = "windows")]
pub use windows_backend::Win32Desktop;

/// The desktop backend for the platform this crate was built for
#[cfg(target_os = "windows")]
pub type PlatformDesktop = Win32Desktop;

/// The desktop backend for the platform this crate was built for
///
/// There is no real backend off Windows; [`default_backend`] always fails.
#[cfg(not(target_os = "windows"))]
pub type PlatformDesktop = MockDesktop;

/// Creates the real desktop backend for this platform
///
/// Returns [`BackendNotAvailable`](crate::error::CaptureError::BackendNotAvailable)
/// on anything but Windows.
#[cfg(target_os = "windows")]
pub fn default_backend() -> CaptureResult<PlatformDesktop> {
    Ok(Win32Desktop::new())
}

/// Creates the real desktop backend for this platform
///
/// Returns [`BackendNotAvailable`](crate::error::CaptureError::BackendNotAvailable)
/// on anything but Windows.
#[cfg(not(target_os = "windows"))]
pub fn default_backend() -> CaptureResult<PlatformDesktop> {
    Err(crate::error::CaptureError::BackendNotAvailable {
        platform: std::env::consts::OS.to_string(),
    })
}
