//! Error types for window capture operations
//!
//! Every failure a capture can hit maps onto one [`CaptureError`] variant,
//! each with a user-facing message and an actionable remediation hint.
//! [`CaptureError::stage`] names the step of the capture state machine that
//! failed, which is what the `Option`-returning capture API logs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    capture::RenderStrategy,
    model::{CaptureMode, WindowHandle},
};

/// Result type alias for capture operations
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Step of a capture call at which a failure was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStage {
    /// Looking up the target window
    Lookup,
    /// Forcing a minimized window visible
    Transient,
    /// Measuring the window or client rectangle
    Dimensions,
    /// Painting the window into an off-screen surface
    Render,
    /// Reading and converting the surface's pixels
    Extract,
    /// Cropping the client area out of a full-window image
    Crop,
    /// Writing the image to disk
    Persist,
    /// Backend or platform setup
    Backend,
}

impl CaptureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureStage::Lookup => "lookup",
            CaptureStage::Transient => "transient",
            CaptureStage::Dimensions => "dimensions",
            CaptureStage::Render => "render",
            CaptureStage::Extract => "extract",
            CaptureStage::Crop => "crop",
            CaptureStage::Persist => "persist",
            CaptureStage::Backend => "backend",
        }
    }
}

impl fmt::Display for CaptureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Comprehensive error type for window capture operations
///
/// Each variant includes detailed context and provides remediation hints
/// through the `remediation_hint()` method.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// Target window no longer exists or was never valid
    #[error("Window handle {handle} is not valid")]
    InvalidHandle {
        /// The handle that failed validation
        handle: WindowHandle,
    },

    /// Computed capture width or height is not positive, or is beyond
    /// [`MAX_CAPTURE_EXTENT`](crate::model::MAX_CAPTURE_EXTENT)
    #[error("Invalid capture dimensions {width}x{height}")]
    InvalidDimensions {
        /// Computed width in pixels
        width:  i64,
        /// Computed height in pixels
        height: i64,
    },

    /// A device context or off-screen bitmap could not be allocated
    #[error("Could not acquire {resource} for window {handle}")]
    SurfaceUnavailable {
        /// Window the surface was requested for
        handle:   WindowHandle,
        /// Which OS resource failed to allocate
        resource: &'static str,
    },

    /// Every rendering strategy in the chain reported failure
    #[error("All render strategies failed for {mode} capture (tried {attempted:?})")]
    RenderFailure {
        /// Capture mode that was attempted
        mode:      CaptureMode,
        /// Strategies tried, in order
        attempted: Vec<RenderStrategy>,
    },

    /// Renderer reported success but the pixel data is empty or unreadable
    #[error("Rendered bitmap is empty or corrupt: {reason}")]
    EmptyOrCorruptBitmap {
        /// What was wrong with the pixel data
        reason: String,
    },

    /// The client-area crop would read outside the full-window image
    #[error(
        "Client crop {width}x{height} at ({left}, {top}) exceeds {image_width}x{image_height} \
         window image"
    )]
    CropOutOfBounds {
        /// Horizontal border offset
        left:         i64,
        /// Vertical border offset
        top:          i64,
        /// Client width
        width:        i64,
        /// Client height
        height:       i64,
        /// Full-window image width
        image_width:  u32,
        /// Full-window image height
        image_height: u32,
    },

    /// A minimized window could not be made visible for capture
    #[error("Could not restore minimized window {handle} for capture")]
    TransientStateFailure {
        /// The minimized window
        handle: WindowHandle,
    },

    /// No window matched a discovery query
    #[error("No window matches '{query}'")]
    WindowNotFound {
        /// The title or process query that matched nothing
        query: String,
    },

    /// Image encoding failed
    #[error("Failed to encode image as {format}: {reason}")]
    EncodingFailed {
        /// Image format that failed
        format: String,
        /// Reason for encoding failure
        reason: String,
    },

    /// No capture backend exists for this platform
    #[error("Window capture is not available on {platform}")]
    BackendNotAvailable {
        /// Platform the caller is running on
        platform: String,
    },

    /// I/O error occurred
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CaptureError {
    /// Returns an actionable remediation hint for this error
    ///
    /// # Examples
    ///
    /// ```
    /// use wincap_core::{error::CaptureError, model::WindowHandle};
    ///
    /// let error = CaptureError::InvalidHandle {
    ///     handle: WindowHandle::from_raw(0x1234),
    /// };
    /// assert!(error.remediation_hint().contains("closed"));
    /// ```
    pub fn remediation_hint(&self) -> &str {
        match self {
            CaptureError::InvalidHandle { .. } => {
                "The window was closed or the handle is stale. Enumerate windows again and \
                 capture using a fresh handle."
            }
            CaptureError::InvalidDimensions { .. } => {
                "The window has no visible area or reports an implausible size. Windows that are \
                 zero-sized or still being created cannot be captured; wait until the window is \
                 laid out and retry."
            }
            CaptureError::SurfaceUnavailable { .. } => {
                "The system ran out of GDI resources or the window refused a device context. \
                 Close unused applications and retry."
            }
            CaptureError::RenderFailure { mode, .. } => match mode {
                CaptureMode::ClientOnly => {
                    "The window refused every client-area render method. A full-window capture \
                     followed by a crop is attempted automatically; if that also failed, the \
                     window may be protected from capture."
                }
                CaptureMode::Full => {
                    "The window refused every render method. It may be protected from capture \
                     or rendered exclusively by the GPU compositor."
                }
            },
            CaptureError::EmptyOrCorruptBitmap { .. } => {
                "The window reported a successful paint but produced no pixels. This happens \
                 with windows that draw lazily; retry after the window has repainted."
            }
            CaptureError::CropOutOfBounds { .. } => {
                "The window reported a client area larger than itself. Use a full-window capture \
                 for this window instead."
            }
            CaptureError::TransientStateFailure { .. } => {
                "The minimized window could not be shown without activation. Restore the window \
                 manually and retry the capture."
            }
            CaptureError::WindowNotFound { .. } => {
                "Use `wincap list` to see available windows. Window titles may change \
                 dynamically; try a shorter substring."
            }
            CaptureError::EncodingFailed { .. } => {
                "PNG encoding failed. Check that the image dimensions are valid."
            }
            CaptureError::BackendNotAvailable { .. } => {
                "Window capture requires Windows. On other platforms only the simulated desktop \
                 is available."
            }
            CaptureError::IoError(_) => {
                "An I/O error occurred. Check file permissions, disk space, and that the output \
                 directory exists."
            }
        }
    }

    /// Returns the capture stage this error originated from
    pub fn stage(&self) -> CaptureStage {
        match self {
            CaptureError::InvalidHandle { .. } | CaptureError::WindowNotFound { .. } => {
                CaptureStage::Lookup
            }
            CaptureError::TransientStateFailure { .. } => CaptureStage::Transient,
            CaptureError::InvalidDimensions { .. } => CaptureStage::Dimensions,
            CaptureError::SurfaceUnavailable { .. } | CaptureError::RenderFailure { .. } => {
                CaptureStage::Render
            }
            CaptureError::EmptyOrCorruptBitmap { .. } => CaptureStage::Extract,
            CaptureError::CropOutOfBounds { .. } => CaptureStage::Crop,
            CaptureError::EncodingFailed { .. } | CaptureError::IoError(_) => {
                CaptureStage::Persist
            }
            CaptureError::BackendNotAvailable { .. } => CaptureStage::Backend,
        }
    }

    /// Whether retrying the same capture may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CaptureError::SurfaceUnavailable { .. }
                | CaptureError::RenderFailure { .. }
                | CaptureError::EmptyOrCorruptBitmap { .. }
                | CaptureError::TransientStateFailure { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_handle_message() {
        let error = CaptureError::InvalidHandle {
            handle: WindowHandle::from_raw(0xbeef),
        };

        let msg = error.to_string();
        assert!(msg.contains("0xbeef"));
        assert!(msg.contains("not valid"));
        assert_eq!(error.stage(), CaptureStage::Lookup);
        assert!(!error.is_transient());
    }

    #[test]
    fn test_invalid_dimensions_message() {
        let error = CaptureError::InvalidDimensions {
            width:  0,
            height: 480,
        };

        assert!(error.to_string().contains("0x480"));
        assert_eq!(error.stage(), CaptureStage::Dimensions);
        assert!(error.remediation_hint().contains("no visible area"));
    }

    #[test]
    fn test_render_failure_lists_attempts() {
        let error = CaptureError::RenderFailure {
            mode:      CaptureMode::ClientOnly,
            attempted: RenderStrategy::chain(CaptureMode::ClientOnly).to_vec(),
        };

        let msg = error.to_string();
        assert!(msg.contains("client"));
        assert!(msg.contains("PrintClientOnly"));
        assert!(msg.contains("BitBlt"));
        assert!(error.remediation_hint().contains("crop"));
        assert!(error.is_transient());
    }

    #[test]
    fn test_render_failure_full_hint() {
        let error = CaptureError::RenderFailure {
            mode:      CaptureMode::Full,
            attempted: vec![RenderStrategy::PrintFullContent],
        };
        assert!(error.remediation_hint().contains("compositor"));
    }

    #[test]
    fn test_crop_out_of_bounds_message() {
        let error = CaptureError::CropOutOfBounds {
            left:         8,
            top:          31,
            width:        1920,
            height:       1080,
            image_width:  800,
            image_height: 600,
        };

        let msg = error.to_string();
        assert!(msg.contains("1920x1080"));
        assert!(msg.contains("(8, 31)"));
        assert!(msg.contains("800x600"));
        assert_eq!(error.stage(), CaptureStage::Crop);
    }

    #[test]
    fn test_transient_state_failure() {
        let error = CaptureError::TransientStateFailure {
            handle: WindowHandle::from_raw(1),
        };
        assert_eq!(error.stage(), CaptureStage::Transient);
        assert!(error.remediation_hint().contains("manually"));
    }

    #[test]
    fn test_empty_bitmap_stage() {
        let error = CaptureError::EmptyOrCorruptBitmap {
            reason: "zero bytes".to_string(),
        };
        assert!(error.to_string().contains("zero bytes"));
        assert_eq!(error.stage(), CaptureStage::Extract);
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error: CaptureError = io.into();

        assert!(matches!(error, CaptureError::IoError(_)));
        assert_eq!(error.stage(), CaptureStage::Persist);
        assert!(error.remediation_hint().contains("permissions"));
    }

    #[test]
    fn test_backend_not_available() {
        let error = CaptureError::BackendNotAvailable {
            platform: "linux".to_string(),
        };
        assert!(error.to_string().contains("linux"));
        assert!(error.remediation_hint().contains("Windows"));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(CaptureStage::Render.to_string(), "render");
        assert_eq!(
            serde_json::to_string(&CaptureStage::Transient).unwrap(),
            r#""transient""#
        );
    }
}
