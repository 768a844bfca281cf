//! Win32 desktop backend using GDI
//!
//! This module implements every capture capability on Windows:
//!
//! - **Window Enumeration**: `EnumWindows`, `FindWindowW`
//! - **State and Geometry**: `IsIconic`, `GetWindowRect`, `GetClientRect`,
//!   `ClientToScreen`
//! - **Transient State**: layered-window alpha, `ShowWindow` and
//!   `SetWindowPos` without activation
//! - **Rendering**: `PrintWindow` (client-only, default and full-content)
//!   with a `BitBlt` fallback, read back through `GetDIBits`
//!
//! # Why GDI
//!
//! Windows Graphics Capture cannot see minimized windows and draws a yellow
//! border on Windows 10. `PrintWindow` asks the window itself to paint into
//! a memory DC, which works for restored-but-transparent windows and for
//! windows covered by others.
//!
//! # Examples
//!
//! ```rust,ignore
//! use wincap_core::capture::{Win32Desktop, WindowCapturer};
//!
//! let capturer = WindowCapturer::new(Win32Desktop::new());
//! if let Some(handle) = capturer.find_window_by_exact_title("Untitled - Notepad")? {
//!     let image = capturer.try_capture_client(handle)?;
//! }
//! ```

use std::{
    ffi::{OsString, c_void},
    iter, mem,
    os::windows::ffi::OsStringExt,
    ptr,
};

use windows_sys::Win32::{
    Foundation::{HWND, POINT, RECT},
    Graphics::{
        Gdi::{
            BI_RGB, BITMAPINFO, BITMAPINFOHEADER, BitBlt, ClientToScreen, CreateCompatibleBitmap,
            CreateCompatibleDC, DIB_RGB_COLORS, DeleteDC, DeleteObject, GetDC, GetDIBits,
            GetWindowDC, HBITMAP, HDC, HGDIOBJ, ReleaseDC, SRCCOPY, SelectObject,
        },
    },
    Storage::Xps::{PRINT_WINDOW_FLAGS, PW_CLIENTONLY, PrintWindow},
    UI::WindowsAndMessaging::{
        EnumWindows, FindWindowW, GWL_EXSTYLE, GetClientRect, GetForegroundWindow,
        GetLayeredWindowAttributes, GetWindowLongW, GetWindowRect, GetWindowTextLengthW,
        GetWindowTextW, GetWindowThreadProcessId, IsIconic, IsWindow, IsWindowVisible, LWA_ALPHA,
        LWA_COLORKEY, SW_HIDE, SW_SHOWMINNOACTIVE, SW_SHOWNOACTIVATE, SWP_NOACTIVATE, SWP_NOMOVE,
        SWP_NOSIZE, SWP_NOZORDER, SWP_SHOWWINDOW, SetForegroundWindow, SetLayeredWindowAttributes,
        SetWindowLongW, SetWindowPos, ShowWindow, WS_EX_LAYERED,
    },
};

// BOOL type alias (windows-sys 0.61 re-exports it from windows_sys::core)
type BOOL = i32;
const TRUE: BOOL = 1;
const FALSE: BOOL = 0;

/// Not exported by windows-sys; asks DWM for the composed window content
const PW_RENDERFULLCONTENT: PRINT_WINDOW_FLAGS = 0x0000_0002;

use super::{
    extract::{BYTES_PER_PIXEL, RawBitmap, RowOrder},
    render::RenderStrategy,
    traits::{
        CaptureSurface, SurfaceRenderer, TransientStateController, WindowEnumerator,
        WindowInspector,
    },
};
use crate::{
    error::{CaptureError, CaptureResult},
    model::{
        CaptureMode, ClientRect, LayerState, Point, WindowHandle, WindowInfo, WindowRect,
    },
};

fn hwnd(handle: WindowHandle) -> HWND {
    handle.as_raw() as HWND
}

fn handle_of(hwnd: HWND) -> WindowHandle {
    WindowHandle::from_raw(hwnd as isize)
}

fn to_wide(text: &str) -> Vec<u16> {
    text.encode_utf16().chain(iter::once(0)).collect()
}

/// Windows desktop backend
///
/// Stateless: every call goes straight to Win32, so one instance can be
/// shared freely.
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32Desktop {
    _private: (),
}

impl Win32Desktop {
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn require_window(handle: WindowHandle) -> CaptureResult<HWND> {
        let hwnd = hwnd(handle);
        // SAFETY: IsWindow accepts any value and only reports validity
        if unsafe { IsWindow(hwnd) } == FALSE {
            return Err(CaptureError::InvalidHandle { handle });
        }
        Ok(hwnd)
    }

    /// Gets the title of a window
    ///
    /// `GetWindowTextLengthW` excludes the terminator, so the buffer is
    /// `len + 1` wide.
    fn window_title(hwnd: HWND) -> String {
        const MAX_TITLE_LEN: i32 = 32768;
        unsafe {
            let len = GetWindowTextLengthW(hwnd).min(MAX_TITLE_LEN);
            if len <= 0 {
                return String::new();
            }

            let mut buffer: Vec<u16> = vec![0; (len + 1) as usize];
            let copied = GetWindowTextW(hwnd, buffer.as_mut_ptr(), buffer.len() as i32);
            if copied <= 0 {
                return String::new();
            }

            buffer.truncate(copied as usize);
            OsString::from_wide(&buffer).to_string_lossy().into_owned()
        }
    }

    fn window_info(hwnd: HWND) -> WindowInfo {
        let mut pid: u32 = 0;
        // SAFETY: hwnd comes from EnumWindows and pid outlives the call
        let (visible, minimized) = unsafe {
            GetWindowThreadProcessId(hwnd, &mut pid);
            (IsWindowVisible(hwnd) != FALSE, IsIconic(hwnd) != FALSE)
        };

        WindowInfo::new(handle_of(hwnd), Self::window_title(hwnd), pid, visible, minimized)
    }

    fn enumerate_window_handles() -> Vec<HWND> {
        let mut handles: Vec<HWND> = Vec::new();

        unsafe extern "system" fn enum_callback(hwnd: HWND, lparam: isize) -> BOOL {
            // SAFETY: lparam is the Vec<HWND> passed to EnumWindows below,
            // which outlives the enumeration
            let handles = unsafe { &mut *(lparam as *mut Vec<HWND>) };
            handles.push(hwnd);
            TRUE
        }

        unsafe {
            EnumWindows(Some(enum_callback), &mut handles as *mut Vec<HWND> as isize);
        }

        tracing::debug!("Enumerated {} window handles", handles.len());
        handles
    }
}

// ============================================================================
// Capability Trait Implementations
// ============================================================================

impl WindowInspector for Win32Desktop {
    fn is_window(&self, handle: WindowHandle) -> bool {
        unsafe { IsWindow(hwnd(handle)) != FALSE }
    }

    fn is_minimized(&self, handle: WindowHandle) -> bool {
        unsafe { IsIconic(hwnd(handle)) != FALSE }
    }

    fn is_visible(&self, handle: WindowHandle) -> bool {
        unsafe { IsWindowVisible(hwnd(handle)) != FALSE }
    }

    fn foreground_window(&self) -> Option<WindowHandle> {
        let hwnd = unsafe { GetForegroundWindow() };
        (!hwnd.is_null()).then(|| handle_of(hwnd))
    }

    fn window_rect(&self, handle: WindowHandle) -> CaptureResult<WindowRect> {
        let hwnd = Self::require_window(handle)?;
        // SAFETY: RECT is plain data and zero is a valid value
        let mut rect: RECT = unsafe { mem::zeroed() };
        if unsafe { GetWindowRect(hwnd, &mut rect) } == FALSE {
            return Err(CaptureError::InvalidHandle { handle });
        }
        Ok(WindowRect::new(rect.left, rect.top, rect.right, rect.bottom))
    }

    fn client_rect(&self, handle: WindowHandle) -> CaptureResult<ClientRect> {
        let hwnd = Self::require_window(handle)?;
        let mut rect: RECT = unsafe { mem::zeroed() };
        if unsafe { GetClientRect(hwnd, &mut rect) } == FALSE {
            return Err(CaptureError::InvalidHandle { handle });
        }
        Ok(ClientRect {
            left:   rect.left,
            top:    rect.top,
            right:  rect.right,
            bottom: rect.bottom,
        })
    }

    fn client_origin(&self, handle: WindowHandle) -> CaptureResult<Point> {
        let hwnd = Self::require_window(handle)?;
        let mut origin = POINT { x: 0, y: 0 };
        if unsafe { ClientToScreen(hwnd, &mut origin) } == FALSE {
            return Err(CaptureError::InvalidHandle { handle });
        }
        Ok(Point::new(origin.x, origin.y))
    }
}

impl TransientStateController for Win32Desktop {
    fn layer_state(&self, handle: WindowHandle) -> CaptureResult<LayerState> {
        let hwnd = Self::require_window(handle)?;
        let ex_style = unsafe { GetWindowLongW(hwnd, GWL_EXSTYLE) } as u32;
        if ex_style & WS_EX_LAYERED == 0 {
            return Ok(LayerState::opaque());
        }

        let mut key = 0u32;
        let mut alpha = 0u8;
        let mut flags = 0;
        // Fails for windows layered through UpdateLayeredWindow (per-pixel alpha)
        let ok = unsafe { GetLayeredWindowAttributes(hwnd, &mut key, &mut alpha, &mut flags) };

        // A colour key cannot be carried through the transparent restore
        let constant_alpha =
            ok != FALSE && flags & LWA_ALPHA != 0 && flags & LWA_COLORKEY == 0;
        Ok(LayerState {
            layered: true,
            alpha:   constant_alpha.then_some(alpha),
        })
    }

    fn hide_flash(&self, handle: WindowHandle, alpha: u8) -> bool {
        let hwnd = hwnd(handle);
        unsafe {
            let ex_style = GetWindowLongW(hwnd, GWL_EXSTYLE);
            SetWindowLongW(hwnd, GWL_EXSTYLE, ex_style | WS_EX_LAYERED as i32);
            SetLayeredWindowAttributes(hwnd, 0, alpha, LWA_ALPHA) != FALSE
        }
    }

    fn restore_opacity(&self, handle: WindowHandle, original: LayerState) -> bool {
        let hwnd = hwnd(handle);
        unsafe {
            if !original.layered {
                let ex_style = GetWindowLongW(hwnd, GWL_EXSTYLE);
                SetWindowLongW(hwnd, GWL_EXSTYLE, ex_style & !(WS_EX_LAYERED as i32));
                return GetWindowLongW(hwnd, GWL_EXSTYLE) as u32 & WS_EX_LAYERED == 0;
            }
            match original.alpha {
                Some(alpha) => SetLayeredWindowAttributes(hwnd, 0, alpha, LWA_ALPHA) != FALSE,
                None => true,
            }
        }
    }

    /// `ShowWindow` returns the previous visibility rather than success, so
    /// its effect is read back through `IsIconic`.
    fn unminimize_without_activating(&self, handle: WindowHandle) -> bool {
        let hwnd = hwnd(handle);
        unsafe {
            ShowWindow(hwnd, SW_SHOWNOACTIVATE);
            let repositioned = SetWindowPos(
                hwnd,
                ptr::null_mut(),
                0,
                0,
                0,
                0,
                SWP_SHOWWINDOW | SWP_NOACTIVATE | SWP_NOZORDER | SWP_NOMOVE | SWP_NOSIZE,
            ) != FALSE;

            repositioned || IsIconic(hwnd) == FALSE
        }
    }

    fn reminimize(&self, handle: WindowHandle) -> bool {
        let hwnd = hwnd(handle);
        unsafe {
            ShowWindow(hwnd, SW_SHOWMINNOACTIVE);
            IsIconic(hwnd) != FALSE
        }
    }

    fn hide_window(&self, handle: WindowHandle) -> bool {
        let hwnd = hwnd(handle);
        unsafe {
            ShowWindow(hwnd, SW_HIDE);
            IsWindowVisible(hwnd) == FALSE
        }
    }

    fn set_foreground(&self, handle: WindowHandle) -> bool {
        let hwnd = hwnd(handle);
        if unsafe { SetForegroundWindow(hwnd) } != FALSE {
            return true;
        }

        // Foreground lock: raise it to the top of the z-order instead
        tracing::debug!(%handle, "SetForegroundWindow refused, raising window instead");
        unsafe {
            SetWindowPos(
                hwnd,
                ptr::null_mut(), // HWND_TOP
                0,
                0,
                0,
                0,
                SWP_NOMOVE | SWP_NOSIZE | SWP_SHOWWINDOW,
            ) != FALSE
        }
    }
}

// ============================================================================
// GDI surface
// ============================================================================

struct WindowDc {
    hwnd: HWND,
    hdc:  HDC,
}

impl Drop for WindowDc {
    fn drop(&mut self) {
        unsafe {
            ReleaseDC(self.hwnd, self.hdc);
        }
    }
}

struct MemoryDc(HDC);

impl Drop for MemoryDc {
    fn drop(&mut self) {
        unsafe {
            DeleteDC(self.0);
        }
    }
}

struct OwnedBitmap(HBITMAP);

impl Drop for OwnedBitmap {
    fn drop(&mut self) {
        unsafe {
            DeleteObject(self.0 as HGDIOBJ);
        }
    }
}

/// Memory DC with a compatible bitmap selected into it
///
/// Fields drop in declaration order after `Drop::drop` has put the DC's
/// original bitmap back: bitmap, then memory DC, then the window DC.
pub struct GdiSurface {
    width:     u32,
    height:    u32,
    /// Object the memory DC held before our bitmap; null once deselected
    displaced: HGDIOBJ,
    bitmap:    OwnedBitmap,
    memory_dc: MemoryDc,
    window_dc: WindowDc,
}

impl GdiSurface {
    fn create(
        handle: WindowHandle,
        mode: CaptureMode,
        width: u32,
        height: u32,
    ) -> CaptureResult<Self> {
        let unavailable = |resource| CaptureError::SurfaceUnavailable { handle, resource };
        let hwnd = hwnd(handle);

        let window_dc = unsafe {
            match mode {
                CaptureMode::ClientOnly => GetDC(hwnd),
                CaptureMode::Full => GetWindowDC(hwnd),
            }
        };
        if window_dc.is_null() {
            return Err(unavailable("window device context"));
        }
        let window_dc = WindowDc {
            hwnd,
            hdc: window_dc,
        };

        let memory_dc = unsafe { CreateCompatibleDC(window_dc.hdc) };
        if memory_dc.is_null() {
            return Err(unavailable("memory device context"));
        }
        let memory_dc = MemoryDc(memory_dc);

        let bitmap = unsafe { CreateCompatibleBitmap(window_dc.hdc, width as i32, height as i32) };
        if bitmap.is_null() {
            return Err(unavailable("compatible bitmap"));
        }
        let bitmap = OwnedBitmap(bitmap);

        let displaced = unsafe { SelectObject(memory_dc.0, bitmap.0 as HGDIOBJ) };
        if displaced.is_null() {
            return Err(unavailable("bitmap selection"));
        }

        Ok(Self {
            width,
            height,
            displaced,
            bitmap,
            memory_dc,
            window_dc,
        })
    }

    fn deselect(&mut self) {
        if !self.displaced.is_null() {
            unsafe {
                SelectObject(self.memory_dc.0, self.displaced);
            }
            self.displaced = ptr::null_mut();
        }
    }
}

impl Drop for GdiSurface {
    fn drop(&mut self) {
        self.deselect();
    }
}

impl CaptureSurface for GdiSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    /// `GetDIBits` requires the bitmap not to be selected into a DC, so this
    /// deselects it first; the surface cannot be rendered into afterwards.
    fn read_pixels(&mut self) -> CaptureResult<RawBitmap> {
        self.deselect();

        let stride = self.width as usize * BYTES_PER_PIXEL;
        let mut bytes = vec![0u8; stride * self.height as usize];

        // SAFETY: BITMAPINFO is plain data and zero is a valid value
        let mut info: BITMAPINFO = unsafe { mem::zeroed() };
        info.bmiHeader = BITMAPINFOHEADER {
            biSize: mem::size_of::<BITMAPINFOHEADER>() as u32,
            biWidth: self.width as i32,
            // Negative height requests top-down rows
            biHeight: -(self.height as i32),
            biPlanes: 1,
            biBitCount: 32,
            biCompression: BI_RGB,
            ..unsafe { mem::zeroed() }
        };

        // SAFETY: bytes holds exactly height rows of 32-bit pixels
        let lines = unsafe {
            GetDIBits(
                self.memory_dc.0,
                self.bitmap.0,
                0,
                self.height,
                bytes.as_mut_ptr() as *mut c_void,
                &mut info,
                DIB_RGB_COLORS,
            )
        };

        // Zero lines means the read failed; let the extractor reject it
        let lines = lines.max(0) as usize;
        bytes.truncate(lines * stride);

        Ok(RawBitmap {
            width: self.width,
            height: self.height,
            stride,
            row_order: RowOrder::TopDown,
            bytes,
        })
    }
}

impl SurfaceRenderer for Win32Desktop {
    type Surface = GdiSurface;

    fn create_surface(
        &self,
        handle: WindowHandle,
        mode: CaptureMode,
        width: u32,
        height: u32,
    ) -> CaptureResult<GdiSurface> {
        GdiSurface::create(handle, mode, width, height)
    }

    fn attempt(
        &self,
        handle: WindowHandle,
        surface: &mut GdiSurface,
        strategy: RenderStrategy,
    ) -> bool {
        let hwnd = hwnd(handle);
        let target = surface.memory_dc.0;
        unsafe {
            match strategy {
                RenderStrategy::PrintClientOnly => PrintWindow(hwnd, target, PW_CLIENTONLY) != FALSE,
                RenderStrategy::PrintDefault => PrintWindow(hwnd, target, 0) != FALSE,
                RenderStrategy::PrintFullContent => {
                    PrintWindow(hwnd, target, PW_RENDERFULLCONTENT) != FALSE
                }
                RenderStrategy::BitBlt => {
                    BitBlt(
                        target,
                        0,
                        0,
                        surface.width as i32,
                        surface.height as i32,
                        surface.window_dc.hdc,
                        0,
                        0,
                        SRCCOPY,
                    ) != FALSE
                }
            }
        }
    }
}

impl WindowEnumerator for Win32Desktop {
    #[tracing::instrument(skip(self), fields(backend = "windows"))]
    fn list_windows(&self) -> CaptureResult<Vec<WindowInfo>> {
        Ok(Self::enumerate_window_handles()
            .into_iter()
            .map(Self::window_info)
            .collect())
    }

    fn find_by_exact_title(&self, title: &str) -> CaptureResult<Option<WindowHandle>> {
        let wide = to_wide(title);
        let hwnd = unsafe { FindWindowW(ptr::null(), wide.as_ptr()) };
        Ok((!hwnd.is_null()).then(|| handle_of(hwnd)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_wide_is_nul_terminated() {
        assert_eq!(to_wide("ab"), vec![97, 98, 0]);
        assert_eq!(to_wide(""), vec![0]);
    }

    #[test]
    fn test_handle_conversion_roundtrip() {
        let handle = WindowHandle::from_raw(0x1234);
        assert_eq!(handle_of(hwnd(handle)), handle);
    }

    #[test]
    fn test_null_handle_is_not_a_window() {
        let desktop = Win32Desktop::new();
        let null = WindowHandle::from_raw(0);

        assert!(!desktop.is_window(null));
        assert!(matches!(
            desktop.window_rect(null),
            Err(CaptureError::InvalidHandle { .. })
        ));
        assert!(desktop.layer_state(null).is_err());
    }

    #[test]
    fn test_enumeration_returns_windows() {
        let desktop = Win32Desktop::new();
        let windows = desktop.list_windows().unwrap();
        assert!(!windows.is_empty());
    }

    #[test]
    fn test_find_missing_exact_title() {
        let desktop = Win32Desktop::new();
        let found = desktop
            .find_by_exact_title("wincap test window that does not exist 7f3a")
            .unwrap();
        assert!(found.is_none());
    }
}
