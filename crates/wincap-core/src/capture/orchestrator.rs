//! Capture orchestration
//!
//! [`WindowCapturer`] runs the capture state machine against any
//! [`DesktopBackend`]:
//!
//! ```text
//! snapshot focus and window state
//!   -> [minimized] hide flash, show without activating, settle
//!   -> measure, render, extract
//!   -> [minimized] re-minimize, restore opacity
//!   -> restore focus
//! ```
//!
//! Restoration is owned by scoped guards rather than the success path, so
//! it runs on every exit. Client-area captures that no render strategy can
//! produce fall back to a full-window capture cropped to the client area.

use std::{path::Path, thread, time::Instant};

use crate::{
    config::CaptureSettings,
    error::{CaptureError, CaptureResult, CaptureStage},
    model::{CaptureMode, WindowHandle, WindowInfo, WindowSnapshot, WindowStatus},
};

use super::{
    discovery,
    extract::extract,
    raster::RasterImage,
    render::{RenderStrategy, RenderedSurface, render},
    traits::DesktopBackend,
    transient::{FocusGuard, TransientGuard},
};

/// Result of one complete capture session
///
/// `sample` holds whatever the caller measured while the window was shown.
struct Session<T> {
    image:    RasterImage,
    strategy: RenderStrategy,
    sample:   T,
}

/// Public entry point for window discovery and capture
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use wincap_core::{
///     capture::{MockDesktop, MockWindow, WindowCapturer},
///     config::CaptureSettings,
///     model::WindowHandle,
/// };
///
/// let desktop = MockDesktop::new().with_window(MockWindow::new(7, "Report.pdf - Viewer"));
/// let capturer = WindowCapturer::with_settings(
///     desktop,
///     CaptureSettings::default().with_settle_delay(Duration::ZERO),
/// );
///
/// let full = capturer.capture_full(WindowHandle::from_raw(7), None).unwrap();
/// assert_eq!(full.dimensions(), (816, 639));
/// ```
#[derive(Debug)]
pub struct WindowCapturer<B> {
    backend:  B,
    settings: CaptureSettings,
}

impl<B: DesktopBackend> WindowCapturer<B> {
    /// Creates a capturer using settings from the environment
    pub fn new(backend: B) -> Self {
        Self::with_settings(backend, CaptureSettings::from_env())
    }

    pub fn with_settings(backend: B, settings: CaptureSettings) -> Self {
        Self { backend, settings }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    // ------------------------------------------------------------------------
    // Discovery
    // ------------------------------------------------------------------------

    pub fn find_windows_by_title_substring(&self, text: &str) -> CaptureResult<Vec<WindowInfo>> {
        discovery::find_windows_by_title_substring(&self.backend, text)
    }

    pub fn find_window_by_exact_title(&self, title: &str) -> CaptureResult<Option<WindowHandle>> {
        discovery::find_window_by_exact_title(&self.backend, title)
    }

    pub fn find_windows_by_owning_process(&self, pid: u32) -> CaptureResult<Vec<WindowInfo>> {
        discovery::find_windows_by_owning_process(&self.backend, pid)
    }

    pub fn list_all_windows(&self) -> CaptureResult<Vec<WindowStatus>> {
        discovery::list_all_windows(&self.backend)
    }

    // ------------------------------------------------------------------------
    // Capture
    // ------------------------------------------------------------------------

    /// Captures the whole window, decorations included
    #[tracing::instrument(skip_all, fields(handle = %handle, mode = "full"))]
    pub fn try_capture_full(&self, handle: WindowHandle) -> CaptureResult<RasterImage> {
        self.run_session(handle, CaptureMode::Full, |_| Ok(()))
            .map(|session| session.image)
    }

    /// Captures the client area, falling back to a cropped full-window
    /// capture when no client-area render strategy works
    #[tracing::instrument(skip_all, fields(handle = %handle, mode = "client"))]
    pub fn try_capture_client(&self, handle: WindowHandle) -> CaptureResult<RasterImage> {
        match self.run_session(handle, CaptureMode::ClientOnly, |_| Ok(())) {
            Ok(session) => Ok(session.image),
            Err(e) if matches!(e.stage(), CaptureStage::Render | CaptureStage::Extract) => {
                tracing::info!(%handle, error = %e, "Direct client capture failed, falling back to crop");
                self.try_capture_client_crop(handle)
            }
            Err(e) => Err(e),
        }
    }

    /// Captures the client area by cropping a full-window capture
    ///
    /// The client geometry is sampled inside the capture session, while a
    /// minimized window is still shown, so the crop uses its real on-screen
    /// rectangle.
    #[tracing::instrument(skip_all, fields(handle = %handle, mode = "client_crop"))]
    pub fn try_capture_client_crop(&self, handle: WindowHandle) -> CaptureResult<RasterImage> {
        let session = self.run_session(handle, CaptureMode::Full, |desktop| {
            desktop.client_geometry(handle)
        })?;
        let geometry = session.sample;

        let (image_width, image_height) = session.image.dimensions();
        let region = geometry.crop_region(image_width, image_height).inspect_err(|_| {
            tracing::error!(
                %handle,
                border = ?geometry.border_offset(),
                client_width = geometry.client.width(),
                client_height = geometry.client.height(),
                image_width,
                image_height,
                "Client area does not fit inside the window image"
            );
        })?;

        let client = session.image.crop(region)?;
        tracing::info!(
            %handle,
            strategy = %session.strategy,
            width = client.width(),
            height = client.height(),
            "Crop capture succeeded"
        );
        Ok(client)
    }

    /// Captures the whole window, optionally saving it as PNG
    ///
    /// Returns `None` if the capture failed; the failing stage is logged.
    /// A failure to save is logged but does not discard the image.
    pub fn capture_full(&self, handle: WindowHandle, output: Option<&Path>) -> Option<RasterImage> {
        let result = self.try_capture_full(handle);
        finish(handle, CaptureMode::Full, result, output)
    }

    /// Captures the client area, optionally saving it as PNG
    ///
    /// Same contract as [`capture_full`](Self::capture_full).
    pub fn capture_client(
        &self,
        handle: WindowHandle,
        output: Option<&Path>,
    ) -> Option<RasterImage> {
        let result = self.try_capture_client(handle);
        finish(handle, CaptureMode::ClientOnly, result, output)
    }

    fn run_session<T>(
        &self,
        handle: WindowHandle,
        mode: CaptureMode,
        sample: impl FnOnce(&B) -> CaptureResult<T>,
    ) -> CaptureResult<Session<T>> {
        let start = Instant::now();
        let desktop = &self.backend;

        if !desktop.is_window(handle) {
            return Err(CaptureError::InvalidHandle { handle });
        }

        // Declaration order matters: guards restore in reverse, focus last
        let _focus = FocusGuard::capture(desktop);
        let snapshot = WindowSnapshot::new(desktop.is_minimized(handle), desktop.is_visible(handle));

        let _transient = if snapshot.was_minimized() {
            tracing::info!(%handle, "Window is minimized, showing it transiently without activation");
            let guard = TransientGuard::engage(desktop, handle, snapshot, self.settings.flash_alpha)?;
            if !self.settings.settle_delay.is_zero() {
                thread::sleep(self.settings.settle_delay);
            }
            Some(guard)
        } else {
            None
        };

        let area = desktop.dimensions(handle, mode)?;
        let Some((width, height)) = area.positive_size() else {
            tracing::error!(%handle, %mode, width = area.width, height = area.height, "Invalid dimensions");
            return Err(CaptureError::InvalidDimensions {
                width:  area.width,
                height: area.height,
            });
        };

        let sample = sample(desktop)?;

        let RenderedSurface {
            mut surface,
            strategy,
        } = render(desktop, handle, mode, width, height)?;
        let image = extract(&mut surface)?;
        drop(surface);

        tracing::info!(
            %handle,
            %mode,
            %strategy,
            width,
            height,
            duration_ms = start.elapsed().as_millis() as u64,
            "Capture completed"
        );

        Ok(Session {
            image,
            strategy,
            sample,
        })
    }
}

/// Converts a capture result into the `Option` API, persisting on success
fn finish(
    handle: WindowHandle,
    mode: CaptureMode,
    result: CaptureResult<RasterImage>,
    output: Option<&Path>,
) -> Option<RasterImage> {
    match result {
        Ok(image) => {
            if let Some(path) = output {
                match image.save_png(path) {
                    Ok(()) => tracing::info!(%handle, path = %path.display(), "Image saved"),
                    Err(e) => tracing::warn!(
                        %handle,
                        path = %path.display(),
                        error = %e,
                        "Failed to save image, returning it anyway"
                    ),
                }
            }
            Some(image)
        }
        Err(e) => {
            tracing::error!(
                %handle,
                %mode,
                stage = %e.stage(),
                error = %e,
                hint = e.remediation_hint(),
                "Capture failed"
            );
            None
        }
    }
}
