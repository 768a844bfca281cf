//! Simulated desktop for testing
//!
//! [`MockDesktop`] implements every capability trait against an in-memory
//! model of top-level windows, so the capture state machine can be exercised
//! on any platform without a real window system.
//!
//! # Features
//!
//! - **Window geometry:** window rectangle, client size and border offset,
//!   with the iconic placeholder geometry Windows reports for minimized
//!   windows
//! - **Desktop state:** minimized, visible and layered state per window and
//!   a single foreground slot
//! - **Deterministic content:** every window paints a seeded pattern in
//!   window coordinates, so a client-area render equals the matching crop of
//!   a full-window render
//! - **Fault injection:** per-strategy render refusal, empty bitmaps, failing
//!   un-minimize, focus theft on restore, windows closing mid-capture
//! - **Accounting:** an ordered [`MockEvent`] log of every mutation and
//!   counters for surfaces created and still alive
//!
//! # Examples
//!
//! ```
//! use wincap_core::{
//!     capture::{MockDesktop, MockWindow, WindowCapturer},
//!     config::CaptureSettings,
//!     model::WindowHandle,
//! };
//! use std::time::Duration;
//!
//! let desktop = MockDesktop::new()
//!     .with_window(MockWindow::new(1, "Editor"))
//!     .with_window(MockWindow::new(2, "Player").minimized())
//!     .with_foreground(1);
//!
//! let settings = CaptureSettings::default().with_settle_delay(Duration::ZERO);
//! let capturer = WindowCapturer::with_settings(desktop.clone(), settings);
//!
//! let image = capturer.try_capture_client(WindowHandle::from_raw(2)).unwrap();
//! assert_eq!(image.dimensions(), (800, 600));
//!
//! let player = desktop.window_state(WindowHandle::from_raw(2)).unwrap();
//! assert!(player.minimized);
//! assert_eq!(desktop.foreground(), Some(WindowHandle::from_raw(1)));
//! assert_eq!(desktop.live_surfaces(), 0);
//! ```

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    error::{CaptureError, CaptureResult},
    model::{
        CaptureMode, ClientRect, LayerState, Point, WindowHandle, WindowInfo, WindowRect,
    },
};

use super::{
    extract::{BYTES_PER_PIXEL, RawBitmap, RowOrder},
    raster::RasterImage,
    render::RenderStrategy,
    traits::{
        CaptureSurface, SurfaceRenderer, TransientStateController, WindowEnumerator,
        WindowInspector,
    },
};

/// Rectangle Windows reports for a minimized window
pub const ICONIC_RECT: WindowRect = WindowRect::new(-32000, -32000, -31840, -31972);

/// One observable interaction with the simulated desktop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockEvent {
    HideFlash { handle: WindowHandle, alpha: u8 },
    RestoreOpacity { handle: WindowHandle, layer: LayerState },
    Unminimize(WindowHandle),
    Reminimize(WindowHandle),
    HideWindow(WindowHandle),
    SetForeground(WindowHandle),
    SurfaceCreated { handle: WindowHandle, mode: CaptureMode },
    RenderAttempt { handle: WindowHandle, strategy: RenderStrategy, success: bool },
    PixelsRead(WindowHandle),
    SurfaceReleased(WindowHandle),
}

/// Builder and state for one simulated window
#[derive(Debug, Clone)]
pub struct MockWindow {
    handle:            WindowHandle,
    title:             String,
    pid:               u32,
    rect:              WindowRect,
    client_size:       (i32, i32),
    border:            Point,
    minimized:         bool,
    visible:           bool,
    layer:             LayerState,
    seed:              u8,
    refused:           Vec<RenderStrategy>,
    empty_bitmap:      bool,
    unminimize_fails:  bool,
    steals_focus:      bool,
    closes_on_restore: bool,
    closed:            bool,
}

impl MockWindow {
    /// An 816x639 window at (100, 100) with an 800x600 client area
    /// offset by an 8 px border and a 31 px title bar
    pub fn new(raw: isize, title: impl Into<String>) -> Self {
        Self {
            handle:            WindowHandle::from_raw(raw),
            title:             title.into(),
            pid:               1000,
            rect:              WindowRect::new(100, 100, 916, 739),
            client_size:       (800, 600),
            border:            Point::new(8, 31),
            minimized:         false,
            visible:           true,
            layer:             LayerState::opaque(),
            seed:              raw as u8,
            refused:           Vec::new(),
            empty_bitmap:      false,
            unminimize_fails:  false,
            steals_focus:      false,
            closes_on_restore: false,
            closed:            false,
        }
    }

    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = pid;
        self
    }

    pub fn with_rect(mut self, rect: WindowRect) -> Self {
        self.rect = rect;
        self
    }

    /// Client area size and its offset from the window's top-left corner
    pub fn with_client(mut self, width: i32, height: i32, border: Point) -> Self {
        self.client_size = (width, height);
        self.border = border;
        self
    }

    pub fn with_seed(mut self, seed: u8) -> Self {
        self.seed = seed;
        self
    }

    pub fn minimized(mut self) -> Self {
        self.minimized = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Starts out layered with the given constant alpha (`None` for
    /// per-pixel alpha)
    pub fn layered(mut self, alpha: Option<u8>) -> Self {
        self.layer = LayerState {
            layered: true,
            alpha,
        };
        self
    }

    /// Makes `strategy` report failure for this window
    pub fn refusing(mut self, strategy: RenderStrategy) -> Self {
        self.refused.push(strategy);
        self
    }

    pub fn refusing_all(mut self) -> Self {
        self.refused = vec![
            RenderStrategy::PrintClientOnly,
            RenderStrategy::PrintDefault,
            RenderStrategy::PrintFullContent,
            RenderStrategy::BitBlt,
        ];
        self
    }

    /// Render attempts succeed but leave zero bytes of pixel data
    pub fn with_empty_bitmap(mut self) -> Self {
        self.empty_bitmap = true;
        self
    }

    pub fn failing_unminimize(mut self) -> Self {
        self.unminimize_fails = true;
        self
    }

    /// Takes the foreground slot when shown, as some applications do
    pub fn stealing_focus(mut self) -> Self {
        self.steals_focus = true;
        self
    }

    /// The window closes as soon as it is un-minimized
    pub fn closing_on_restore(mut self) -> Self {
        self.closes_on_restore = true;
        self
    }

    pub fn closed(mut self) -> Self {
        self.closed = true;
        self
    }

    /// The RGB value this window paints at window-relative (x, y)
    pub fn pixel_at(&self, x: u32, y: u32) -> [u8; 3] {
        [
            (x ^ y) as u8,
            (y.wrapping_mul(13)) as u8,
            (x.wrapping_mul(7) as u8).wrapping_add(self.seed),
        ]
    }

    /// What a render sees at (x, y) of a buffer whose top-left sits at
    /// `origin` in window coordinates; black outside the window
    fn rendered_pixel(&self, origin: Point, x: u32, y: u32) -> [u8; 3] {
        let wx = i64::from(origin.x) + i64::from(x);
        let wy = i64::from(origin.y) + i64::from(y);
        if (0..self.rect.width()).contains(&wx) && (0..self.rect.height()).contains(&wy) {
            // Both lie in 0..width of an i32-based rect, which fits u32
            self.pixel_at(wx as u32, wy as u32)
        } else {
            [0, 0, 0]
        }
    }

    fn alive(&self) -> bool {
        !self.closed
    }

    fn info(&self) -> WindowInfo {
        WindowInfo::new(self.handle, self.title.clone(), self.pid, self.visible, self.minimized)
    }
}

/// Snapshot of a simulated window's mutable state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockWindowState {
    pub minimized: bool,
    pub visible:   bool,
    pub layer:     LayerState,
    pub closed:    bool,
}

#[derive(Debug, Default)]
struct MockState {
    windows:          Vec<MockWindow>,
    foreground:       Option<WindowHandle>,
    refuse_focus:     bool,
    events:           Vec<MockEvent>,
    surfaces_created: usize,
    live_surfaces:    usize,
}

impl MockState {
    fn window(&self, handle: WindowHandle) -> Option<&MockWindow> {
        self.windows.iter().find(|w| w.handle == handle)
    }

    fn window_mut(&mut self, handle: WindowHandle) -> Option<&mut MockWindow> {
        self.windows.iter_mut().find(|w| w.handle == handle)
    }

    fn live_window(&self, handle: WindowHandle) -> CaptureResult<&MockWindow> {
        self.window(handle)
            .filter(|w| w.alive())
            .ok_or(CaptureError::InvalidHandle { handle })
    }
}

/// In-memory desktop implementing every capture capability
///
/// Cloning shares the underlying state, so a test can keep one clone for
/// assertions while a [`WindowCapturer`](super::WindowCapturer) owns another.
#[derive(Debug, Clone, Default)]
pub struct MockDesktop {
    state: Arc<Mutex<MockState>>,
}

impl MockDesktop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(self, window: MockWindow) -> Self {
        self.state.lock().windows.push(window);
        self
    }

    /// Gives the foreground slot to window `raw`
    pub fn with_foreground(self, raw: isize) -> Self {
        self.state.lock().foreground = Some(WindowHandle::from_raw(raw));
        self
    }

    /// Makes every `set_foreground` call fail
    pub fn refusing_focus(self) -> Self {
        self.state.lock().refuse_focus = true;
        self
    }

    /// Simulates the user closing a window
    pub fn close_window(&self, handle: WindowHandle) {
        if let Some(window) = self.state.lock().window_mut(handle) {
            window.closed = true;
        }
    }

    pub fn foreground(&self) -> Option<WindowHandle> {
        self.state.lock().foreground
    }

    pub fn window_state(&self, handle: WindowHandle) -> Option<MockWindowState> {
        self.state.lock().window(handle).map(|w| MockWindowState {
            minimized: w.minimized,
            visible:   w.visible,
            layer:     w.layer,
            closed:    w.closed,
        })
    }

    /// Every recorded interaction, oldest first
    pub fn events(&self) -> Vec<MockEvent> {
        self.state.lock().events.clone()
    }

    pub fn surfaces_created(&self) -> usize {
        self.state.lock().surfaces_created
    }

    /// Surfaces created but not yet dropped
    pub fn live_surfaces(&self) -> usize {
        self.state.lock().live_surfaces
    }

    /// What a perfect full-window capture of `handle` looks like
    pub fn expected_full_image(&self, handle: WindowHandle) -> Option<RasterImage> {
        let state = self.state.lock();
        let window = state.window(handle)?;
        Some(paint(window, Point::new(0, 0), window.rect.width(), window.rect.height()))
    }

    /// What a perfect client-area capture of `handle` looks like
    pub fn expected_client_image(&self, handle: WindowHandle) -> Option<RasterImage> {
        let state = self.state.lock();
        let window = state.window(handle)?;
        Some(paint(
            window,
            window.border,
            i64::from(window.client_size.0),
            i64::from(window.client_size.1),
        ))
    }

    fn record(&self, event: MockEvent) {
        self.state.lock().events.push(event);
    }

    /// Applies `f` to a live window; `false` if the window is gone
    fn mutate(&self, handle: WindowHandle, f: impl FnOnce(&mut MockWindow)) -> bool {
        match self.state.lock().window_mut(handle) {
            Some(window) if window.alive() => {
                f(window);
                true
            }
            _ => false,
        }
    }
}

fn paint(window: &MockWindow, origin: Point, width: i64, height: i64) -> RasterImage {
    let width = u32::try_from(width).unwrap_or(0);
    let height = u32::try_from(height).unwrap_or(0);
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb(window.rendered_pixel(origin, x, y))
    });
    RasterImage::from_rgb8(img)
}

// ============================================================================
// Capability implementations
// ============================================================================

impl WindowInspector for MockDesktop {
    fn is_window(&self, handle: WindowHandle) -> bool {
        self.state.lock().live_window(handle).is_ok()
    }

    fn is_minimized(&self, handle: WindowHandle) -> bool {
        self.state
            .lock()
            .live_window(handle)
            .map(|w| w.minimized)
            .unwrap_or(false)
    }

    fn is_visible(&self, handle: WindowHandle) -> bool {
        self.state
            .lock()
            .live_window(handle)
            .map(|w| w.visible)
            .unwrap_or(false)
    }

    fn foreground_window(&self) -> Option<WindowHandle> {
        self.state.lock().foreground
    }

    fn window_rect(&self, handle: WindowHandle) -> CaptureResult<WindowRect> {
        let state = self.state.lock();
        let window = state.live_window(handle)?;
        Ok(if window.minimized {
            ICONIC_RECT
        } else {
            window.rect
        })
    }

    fn client_rect(&self, handle: WindowHandle) -> CaptureResult<ClientRect> {
        let state = self.state.lock();
        let window = state.live_window(handle)?;
        Ok(if window.minimized {
            ClientRect::with_size(0, 0)
        } else {
            ClientRect::with_size(window.client_size.0, window.client_size.1)
        })
    }

    fn client_origin(&self, handle: WindowHandle) -> CaptureResult<Point> {
        let state = self.state.lock();
        let window = state.live_window(handle)?;
        Ok(if window.minimized {
            ICONIC_RECT.top_left()
        } else {
            Point::new(
                window.rect.left.saturating_add(window.border.x),
                window.rect.top.saturating_add(window.border.y),
            )
        })
    }
}

impl TransientStateController for MockDesktop {
    fn layer_state(&self, handle: WindowHandle) -> CaptureResult<LayerState> {
        Ok(self.state.lock().live_window(handle)?.layer)
    }

    fn hide_flash(&self, handle: WindowHandle, alpha: u8) -> bool {
        self.record(MockEvent::HideFlash { handle, alpha });
        self.mutate(handle, |w| {
            w.layer = LayerState {
                layered: true,
                alpha:   Some(alpha),
            }
        })
    }

    fn restore_opacity(&self, handle: WindowHandle, original: LayerState) -> bool {
        self.record(MockEvent::RestoreOpacity {
            handle,
            layer: original,
        });
        self.mutate(handle, |w| w.layer = original)
    }

    fn unminimize_without_activating(&self, handle: WindowHandle) -> bool {
        self.record(MockEvent::Unminimize(handle));
        let mut state = self.state.lock();
        let Some(window) = state.window_mut(handle).filter(|w| w.alive()) else {
            return false;
        };
        if window.unminimize_fails {
            return false;
        }

        window.minimized = false;
        window.visible = true;
        if window.closes_on_restore {
            window.closed = true;
        }
        let steals_focus = window.steals_focus;
        if steals_focus {
            state.foreground = Some(handle);
        }
        true
    }

    fn reminimize(&self, handle: WindowHandle) -> bool {
        self.record(MockEvent::Reminimize(handle));
        self.mutate(handle, |w| w.minimized = true)
    }

    fn hide_window(&self, handle: WindowHandle) -> bool {
        self.record(MockEvent::HideWindow(handle));
        self.mutate(handle, |w| w.visible = false)
    }

    fn set_foreground(&self, handle: WindowHandle) -> bool {
        self.record(MockEvent::SetForeground(handle));
        let mut state = self.state.lock();
        if state.refuse_focus || state.live_window(handle).is_err() {
            return false;
        }
        state.foreground = Some(handle);
        true
    }
}

/// Off-screen buffer handed out by [`MockDesktop`]
#[derive(Debug)]
pub struct MockSurface {
    handle: WindowHandle,
    mode:   CaptureMode,
    width:  u32,
    height: u32,
    /// BGRX, bottom-up, as a real DIB section would hold it
    pixels: Vec<u8>,
    state:  Arc<Mutex<MockState>>,
}

impl CaptureSurface for MockSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn read_pixels(&mut self) -> CaptureResult<RawBitmap> {
        self.state.lock().events.push(MockEvent::PixelsRead(self.handle));
        Ok(RawBitmap::packed(
            self.width,
            self.height,
            RowOrder::BottomUp,
            self.pixels.clone(),
        ))
    }
}

impl Drop for MockSurface {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.live_surfaces -= 1;
        state.events.push(MockEvent::SurfaceReleased(self.handle));
    }
}

impl SurfaceRenderer for MockDesktop {
    type Surface = MockSurface;

    fn create_surface(
        &self,
        handle: WindowHandle,
        mode: CaptureMode,
        width: u32,
        height: u32,
    ) -> CaptureResult<MockSurface> {
        let mut state = self.state.lock();
        if state.live_window(handle).is_err() {
            return Err(CaptureError::SurfaceUnavailable {
                handle,
                resource: "device context",
            });
        }

        state.surfaces_created += 1;
        state.live_surfaces += 1;
        state.events.push(MockEvent::SurfaceCreated { handle, mode });

        // A fresh compatible bitmap is black
        Ok(MockSurface {
            handle,
            mode,
            width,
            height,
            pixels: vec![0; width as usize * height as usize * BYTES_PER_PIXEL],
            state: Arc::clone(&self.state),
        })
    }

    fn attempt(
        &self,
        handle: WindowHandle,
        surface: &mut MockSurface,
        strategy: RenderStrategy,
    ) -> bool {
        let mut state = self.state.lock();
        let success = match state.live_window(handle) {
            Ok(window) if !window.refused.contains(&strategy) => {
                if window.empty_bitmap {
                    surface.pixels.clear();
                } else {
                    let origin = match surface.mode {
                        CaptureMode::Full => Point::new(0, 0),
                        CaptureMode::ClientOnly => window.border,
                    };
                    surface.pixels = paint_bgrx_bottom_up(window, origin, surface.width, surface.height);
                }
                true
            }
            _ => false,
        };

        state.events.push(MockEvent::RenderAttempt {
            handle,
            strategy,
            success,
        });
        success
    }
}

fn paint_bgrx_bottom_up(window: &MockWindow, origin: Point, width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(width as usize * height as usize * BYTES_PER_PIXEL);
    for y in (0..height).rev() {
        for x in 0..width {
            let [r, g, b] = window.rendered_pixel(origin, x, y);
            bytes.extend_from_slice(&[b, g, r, 0]);
        }
    }
    bytes
}

impl WindowEnumerator for MockDesktop {
    fn list_windows(&self) -> CaptureResult<Vec<WindowInfo>> {
        Ok(self
            .state
            .lock()
            .windows
            .iter()
            .filter(|w| w.alive())
            .map(MockWindow::info)
            .collect())
    }
}
