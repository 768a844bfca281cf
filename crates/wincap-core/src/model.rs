//! Data models and type definitions for wincap
//!
//! This module defines the plain value types that flow through a capture:
//! - Window handles and capture modes
//! - Screen and client rectangles plus the geometry needed for cropping
//! - Snapshots of the desktop state taken before any mutation
//! - Enumeration results used by window discovery

use std::{fmt, num::ParseIntError, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{CaptureError, CaptureResult};

/// Opaque identifier of an OS-owned top-level window
///
/// The engine never creates or destroys windows, it only references them.
/// A handle may become invalid at any time (the window can close between
/// discovery and capture), so every operation taking one must tolerate that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowHandle(isize);

impl WindowHandle {
    /// Wraps a raw OS handle value
    pub const fn from_raw(raw: isize) -> Self {
        Self(raw)
    }

    /// Returns the raw OS handle value
    pub const fn as_raw(self) -> isize {
        self.0
    }

    /// Whether this is the null handle
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Parses either a `0x`-prefixed hexadecimal or a plain decimal handle
impl FromStr for WindowHandle {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let raw = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => isize::from_str_radix(hex, 16)?,
            None => s.parse()?,
        };
        Ok(Self(raw))
    }
}

/// Which part of a window a capture covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// Whole window including title bar, borders and menus
    Full,
    /// Content region only
    #[serde(rename = "client")]
    ClientOnly,
}

impl CaptureMode {
    /// Returns the mode as a lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureMode::Full => "full",
            CaptureMode::ClientOnly => "client",
        }
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A point in screen coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Window rectangle in screen coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRect {
    pub left:   i32,
    pub top:    i32,
    pub right:  i32,
    pub bottom: i32,
}

impl WindowRect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Width in pixels; may be zero or negative for degenerate windows
    ///
    /// Widened to `i64` so that garbage coordinates cannot overflow.
    pub const fn width(&self) -> i64 {
        self.right as i64 - self.left as i64
    }

    /// Height in pixels; may be zero or negative for degenerate windows
    pub const fn height(&self) -> i64 {
        self.bottom as i64 - self.top as i64
    }

    pub const fn top_left(&self) -> Point {
        Point::new(self.left, self.top)
    }
}

/// Client area rectangle in window-local coordinates, anchored at (0, 0)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRect {
    pub left:   i32,
    pub top:    i32,
    pub right:  i32,
    pub bottom: i32,
}

impl ClientRect {
    /// Creates an origin-anchored client rectangle of the given size
    pub const fn with_size(width: i32, height: i32) -> Self {
        Self {
            left:   0,
            top:    0,
            right:  width,
            bottom: height,
        }
    }

    pub const fn width(&self) -> i64 {
        self.right as i64 - self.left as i64
    }

    pub const fn height(&self) -> i64 {
        self.bottom as i64 - self.top as i64
    }
}

/// Largest width or height a capture accepts
///
/// Anything bigger than this comes from corrupt geometry, not a real window.
pub const MAX_CAPTURE_EXTENT: u32 = 1 << 16;

/// The rectangle a capture will cover and its size
///
/// For client-only captures `rect` is anchored at (0, 0). Width or height
/// may be zero or negative; callers must check before rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureArea {
    pub rect:   WindowRect,
    pub width:  i64,
    pub height: i64,
}

impl CaptureArea {
    pub const fn from_rect(rect: WindowRect) -> Self {
        Self {
            rect,
            width: rect.width(),
            height: rect.height(),
        }
    }

    /// Area of a client rectangle, re-anchored at (0, 0)
    pub const fn from_client(client: ClientRect) -> Self {
        Self {
            rect:   WindowRect::new(
                0,
                0,
                client.right.saturating_sub(client.left),
                client.bottom.saturating_sub(client.top),
            ),
            width:  client.width(),
            height: client.height(),
        }
    }

    /// Both dimensions as pixel counts, or `None` unless each lies in
    /// `1..=MAX_CAPTURE_EXTENT`
    pub fn positive_size(&self) -> Option<(u32, u32)> {
        let valid = 1..=MAX_CAPTURE_EXTENT;
        match (u32::try_from(self.width), u32::try_from(self.height)) {
            (Ok(w), Ok(h)) if valid.contains(&w) && valid.contains(&h) => Some((w, h)),
            _ => None,
        }
    }
}

/// Rectangular region of an image in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x:      u32,
    pub y:      u32,
    pub width:  u32,
    pub height: u32,
}

impl Region {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Everything needed to locate the client area inside a full-window image
///
/// `client_origin` is the screen position of the client area's (0, 0),
/// so the border offset is `client_origin - window.top_left()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientGeometry {
    pub window:        WindowRect,
    pub client:        ClientRect,
    pub client_origin: Point,
}

impl ClientGeometry {
    /// Offset from the window's top-left corner to the client area's,
    /// as `(x, y)`
    pub const fn border_offset(&self) -> (i64, i64) {
        (
            self.client_origin.x as i64 - self.window.left as i64,
            self.client_origin.y as i64 - self.window.top as i64,
        )
    }

    /// Computes the client area's region inside a full-window image
    ///
    /// Rejects any region that would start before the image origin or read
    /// past its right or bottom edge.
    pub fn crop_region(&self, image_width: u32, image_height: u32) -> CaptureResult<Region> {
        let (left, top) = self.border_offset();
        let width = self.client.width();
        let height = self.client.height();

        let out_of_bounds = || CaptureError::CropOutOfBounds {
            left,
            top,
            width,
            height,
            image_width,
            image_height,
        };

        if left < 0 || top < 0 || width <= 0 || height <= 0 {
            return Err(out_of_bounds());
        }

        // Every term is a difference of two i32s, so these sums cannot overflow
        if left + width > i64::from(image_width) || top + height > i64::from(image_height) {
            return Err(out_of_bounds());
        }

        // All four now lie in 0..=image size, which fits u32
        Ok(Region::new(left as u32, top as u32, width as u32, height as u32))
    }
}

/// Window presentation state recorded before any transient mutation
///
/// Taken once at the start of a capture and consumed exactly once by the
/// matching restore step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSnapshot {
    was_minimized: bool,
    was_visible:   bool,
}

impl WindowSnapshot {
    pub(crate) const fn new(was_minimized: bool, was_visible: bool) -> Self {
        Self {
            was_minimized,
            was_visible,
        }
    }

    pub const fn was_minimized(&self) -> bool {
        self.was_minimized
    }

    pub const fn was_visible(&self) -> bool {
        self.was_visible
    }
}

/// The window that held input focus when a capture began
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusSnapshot(Option<WindowHandle>);

impl FocusSnapshot {
    pub(crate) const fn new(owner: Option<WindowHandle>) -> Self {
        Self(owner)
    }

    pub const fn owner(&self) -> Option<WindowHandle> {
        self.0
    }
}

/// Layered-window attributes as they were before the flash was hidden
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerState {
    /// Whether the window already carried the layered style
    pub layered: bool,
    /// Its constant alpha, when one was set and readable
    pub alpha:   Option<u8>,
}

impl LayerState {
    /// The state of an ordinary, non-layered window
    pub const fn opaque() -> Self {
        Self {
            layered: false,
            alpha:   None,
        }
    }

    /// Layered, but with no readable constant alpha (per-pixel layered)
    pub const fn is_per_pixel(&self) -> bool {
        self.layered && self.alpha.is_none()
    }
}

/// A top-level window as reported by enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub handle:    WindowHandle,
    pub title:     String,
    pub pid:       u32,
    pub visible:   bool,
    pub minimized: bool,
}

impl WindowInfo {
    pub fn new(
        handle: WindowHandle,
        title: impl Into<String>,
        pid: u32,
        visible: bool,
        minimized: bool,
    ) -> Self {
        Self {
            handle,
            title: title.into(),
            pid,
            visible,
            minimized,
        }
    }
}

/// Diagnostic view of a titled window, as produced by `list_all_windows`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowStatus {
    pub handle:     WindowHandle,
    pub title:      String,
    pub pid:        u32,
    pub visible:    bool,
    pub minimized:  bool,
    pub foreground: bool,
}

impl WindowStatus {
    /// Human-readable status flags, e.g. `"visible, foreground"` or `"none"`
    pub fn status_label(&self) -> String {
        let flags: Vec<&str> = [
            (self.visible, "visible"),
            (self.minimized, "minimized"),
            (self.foreground, "foreground"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect();

        if flags.is_empty() {
            "none".to_string()
        } else {
            flags.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_handle_parse_decimal_and_hex() {
        assert_eq!("4660".parse::<WindowHandle>().unwrap(), WindowHandle::from_raw(0x1234));
        assert_eq!("0x1234".parse::<WindowHandle>().unwrap(), WindowHandle::from_raw(0x1234));
        assert_eq!(" 0XFF ".parse::<WindowHandle>().unwrap(), WindowHandle::from_raw(255));
        assert!("not-a-handle".parse::<WindowHandle>().is_err());
    }

    #[test]
    fn test_window_handle_display_roundtrip() {
        let handle = WindowHandle::from_raw(0x12345678);
        assert_eq!(handle.to_string(), "0x12345678");
        assert_eq!(handle.to_string().parse::<WindowHandle>().unwrap(), handle);
    }

    #[test]
    fn test_window_handle_serializes_as_number() {
        let json = serde_json::to_string(&WindowHandle::from_raw(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_capture_mode_serialization() {
        assert_eq!(serde_json::to_string(&CaptureMode::Full).unwrap(), r#""full""#);
        assert_eq!(serde_json::to_string(&CaptureMode::ClientOnly).unwrap(), r#""client""#);
        assert_eq!(CaptureMode::ClientOnly.to_string(), "client");
    }

    #[test]
    fn test_window_rect_dimensions() {
        let rect = WindowRect::new(100, 50, 900, 650);
        assert_eq!(rect.width(), 800);
        assert_eq!(rect.height(), 600);
        assert_eq!(rect.top_left(), Point::new(100, 50));

        let degenerate = WindowRect::new(10, 10, 10, 5);
        assert_eq!(degenerate.width(), 0);
        assert_eq!(degenerate.height(), -5);
    }

    #[test]
    fn test_capture_area_positive_size() {
        let area = CaptureArea::from_rect(WindowRect::new(10, 20, 110, 70));
        assert_eq!(area.positive_size(), Some((100, 50)));

        let flat = CaptureArea::from_rect(WindowRect::new(10, 20, 110, 20));
        assert_eq!(flat.positive_size(), None);

        let inverted = CaptureArea::from_rect(WindowRect::new(10, 20, 5, 70));
        assert_eq!(inverted.positive_size(), None);
    }

    fn geometry(window: WindowRect, client: (i32, i32), origin: (i32, i32)) -> ClientGeometry {
        ClientGeometry {
            window,
            client: ClientRect::with_size(client.0, client.1),
            client_origin: Point::new(origin.0, origin.1),
        }
    }

    #[test]
    fn test_border_offset() {
        let geo = geometry(WindowRect::new(100, 100, 916, 739), (800, 600), (108, 131));
        assert_eq!(geo.border_offset(), (8, 31));
    }

    #[test]
    fn test_crop_region_within_bounds() {
        let geo = geometry(WindowRect::new(100, 100, 916, 739), (800, 600), (108, 131));
        let region = geo.crop_region(816, 639).unwrap();
        assert_eq!(region, Region::new(8, 31, 800, 600));
    }

    #[test]
    fn test_crop_region_exact_fit() {
        let geo = geometry(WindowRect::new(0, 0, 200, 100), (200, 100), (0, 0));
        assert_eq!(geo.crop_region(200, 100).unwrap(), Region::new(0, 0, 200, 100));
    }

    #[test]
    fn test_crop_region_client_larger_than_window() {
        let geo = geometry(WindowRect::new(0, 0, 100, 100), (200, 200), (8, 30));
        let err = geo.crop_region(100, 100).unwrap_err();
        assert!(matches!(err, CaptureError::CropOutOfBounds { .. }));
    }

    #[test]
    fn test_crop_region_negative_offset() {
        let geo = geometry(WindowRect::new(100, 100, 300, 300), (50, 50), (90, 120));
        assert!(matches!(geo.crop_region(200, 200), Err(CaptureError::CropOutOfBounds { .. })));
    }

    #[test]
    fn test_crop_region_overflow_safe() {
        let geo = geometry(WindowRect::new(0, 0, 10, 10), (i32::MAX, 5), (1, 1));
        assert!(geo.crop_region(10, 10).is_err());
    }

    #[test]
    fn test_border_offset_at_coordinate_extremes() {
        let geo = geometry(WindowRect::new(i32::MIN, 0, 10, 10), (5, 5), (100, 0));
        assert_eq!(geo.border_offset(), (100 - i64::from(i32::MIN), 0));

        let err = geo.crop_region(10, 10).unwrap_err();
        assert!(matches!(err, CaptureError::CropOutOfBounds { left, .. } if left > i64::from(i32::MAX)));

        let geo = geometry(WindowRect::new(i32::MAX, i32::MAX, 0, 0), (5, 5), (i32::MIN, i32::MIN));
        assert!(matches!(
            geo.crop_region(10, 10),
            Err(CaptureError::CropOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_extreme_rect_size_does_not_overflow() {
        let rect = WindowRect::new(-2_000_000_000, 0, 2_000_000_000, 10);
        assert_eq!(rect.width(), 4_000_000_000);
        assert_eq!(CaptureArea::from_rect(rect).positive_size(), None);

        let whole_range = WindowRect::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert_eq!(whole_range.height(), i64::from(u32::MAX));

        let client = ClientRect {
            left:   i32::MAX,
            top:    0,
            right:  i32::MIN,
            bottom: 10,
        };
        assert_eq!(CaptureArea::from_client(client).positive_size(), None);
    }

    #[test]
    fn test_positive_size_upper_bound() {
        let largest = MAX_CAPTURE_EXTENT as i32;
        let at_limit = CaptureArea::from_rect(WindowRect::new(0, 0, largest, 1));
        assert_eq!(at_limit.positive_size(), Some((MAX_CAPTURE_EXTENT, 1)));

        let beyond = CaptureArea::from_rect(WindowRect::new(0, 0, largest + 1, 1));
        assert_eq!(beyond.positive_size(), None);
    }

    #[test]
    fn test_layer_state() {
        assert!(!LayerState::opaque().layered);
        assert!(!LayerState::opaque().is_per_pixel());
        assert!(LayerState { layered: true, alpha: None }.is_per_pixel());
        assert!(!LayerState { layered: true, alpha: Some(200) }.is_per_pixel());
    }

    #[test]
    fn test_status_label() {
        let mut status = WindowStatus {
            handle:     WindowHandle::from_raw(1),
            title:      "Notepad".to_string(),
            pid:        10,
            visible:    true,
            minimized:  false,
            foreground: true,
        };
        assert_eq!(status.status_label(), "visible, foreground");

        status.visible = false;
        status.foreground = false;
        assert_eq!(status.status_label(), "none");
    }
}
