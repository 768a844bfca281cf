//! wincap-core: Capture the pixels of any top-level window
//!
//! This library renders a window's content into an in-memory raster image,
//! including windows that are minimized, partially obscured or unfocused,
//! and restores every piece of desktop state it touched (minimized state,
//! layered opacity, input focus) before a capture call returns.
//!
//! The engine talks to the OS only through the capability traits in
//! [`capture::traits`]; the Win32 backend implements them on Windows and
//! [`capture::MockDesktop`] simulates them everywhere else.

pub mod capture;
pub mod config;
pub mod error;
pub mod model;
pub mod util;
