//! Surface rendering with an ordered fallback chain
//!
//! No single Win32 paint API works for every window. Legacy windows ignore
//! the client-only flag, GPU-composited ones only paint with full-content
//! rendering, and some only show up in a raw copy of their live surface.
//! [`render`] walks a fixed list of strategies for the capture mode and
//! stops at the first one the OS reports as successful.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    error::{CaptureError, CaptureResult},
    model::{CaptureMode, WindowHandle},
};

use super::traits::SurfaceRenderer;

/// One way of painting a window into an off-screen surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderStrategy {
    /// `PrintWindow` restricted to the client area
    PrintClientOnly,
    /// `PrintWindow` without flags
    PrintDefault,
    /// `PrintWindow` asking for DWM-composed content
    PrintFullContent,
    /// Raw `BitBlt` copy from the window's device context
    BitBlt,
}

const CLIENT_CHAIN: [RenderStrategy; 3] = [
    RenderStrategy::PrintClientOnly,
    RenderStrategy::PrintDefault,
    RenderStrategy::BitBlt,
];

const FULL_CHAIN: [RenderStrategy; 2] = [RenderStrategy::PrintFullContent, RenderStrategy::BitBlt];

impl RenderStrategy {
    /// Strategies to try for `mode`, in order
    ///
    /// ```
    /// use wincap_core::{capture::RenderStrategy, model::CaptureMode};
    ///
    /// assert_eq!(RenderStrategy::chain(CaptureMode::Full).last(), Some(&RenderStrategy::BitBlt));
    /// ```
    pub fn chain(mode: CaptureMode) -> &'static [RenderStrategy] {
        match mode {
            CaptureMode::ClientOnly => &CLIENT_CHAIN,
            CaptureMode::Full => &FULL_CHAIN,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStrategy::PrintClientOnly => "print_client_only",
            RenderStrategy::PrintDefault => "print_default",
            RenderStrategy::PrintFullContent => "print_full_content",
            RenderStrategy::BitBlt => "bitblt",
        }
    }
}

impl fmt::Display for RenderStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A surface holding a rendered window, tagged with the strategy that won
#[derive(Debug)]
pub struct RenderedSurface<S> {
    pub surface:  S,
    pub strategy: RenderStrategy,
}

/// Renders `handle` into a fresh `width` x `height` surface
///
/// The surface is dropped, releasing its OS resources, if every strategy
/// fails.
pub fn render<R: SurfaceRenderer + ?Sized>(
    renderer: &R,
    handle: WindowHandle,
    mode: CaptureMode,
    width: u32,
    height: u32,
) -> CaptureResult<RenderedSurface<R::Surface>> {
    let mut surface = renderer.create_surface(handle, mode, width, height)?;

    let chain = RenderStrategy::chain(mode);
    for (index, &strategy) in chain.iter().enumerate() {
        if renderer.attempt(handle, &mut surface, strategy) {
            if index > 0 {
                tracing::info!(%handle, %mode, %strategy, "Render succeeded with fallback strategy");
            } else {
                tracing::debug!(%handle, %mode, %strategy, "Render succeeded");
            }
            return Ok(RenderedSurface { surface, strategy });
        }
        tracing::debug!(%handle, %mode, %strategy, "Render strategy failed");
    }

    Err(CaptureError::RenderFailure {
        mode,
        attempted: chain.to_vec(),
    })
}
