//! Win32 backend integration tests
//!
//! These tests drive real windows on the interactive desktop, so they are
//! ignored by default.
//!
//! # Running Tests
//!
//! ```powershell
//! # Run all Windows integration tests with full output
//! cargo test -p wincap-core --test windows_integration_tests -- --ignored --nocapture
//!
//! # Run with debug logging
//! set RUST_LOG=wincap_core=debug
//! cargo test -p wincap-core --test windows_integration_tests -- --ignored --nocapture
//! ```
//!
//! # Requirements
//!
//! - An interactive desktop session (not a service or SSH session)
//! - At least one titled top-level window open, ideally one minimized
//!   (Notepad works well)

#![cfg(target_os = "windows")]

use std::{path::PathBuf, time::Duration};

use wincap_core::{
    capture::{Win32Desktop, WindowCapturer, WindowInspector},
    config::CaptureSettings,
    model::{WindowHandle, WindowStatus},
};

fn capturer() -> WindowCapturer<Win32Desktop> {
    WindowCapturer::with_settings(
        Win32Desktop::new(),
        CaptureSettings::default().with_settle_delay(Duration::from_millis(150)),
    )
}

fn test_output_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_output")
}

/// First titled window matching `pred`, skipping shell windows
fn pick_window(pred: impl Fn(&WindowStatus) -> bool) -> Option<WindowStatus> {
    capturer()
        .list_all_windows()
        .expect("Failed to list windows")
        .into_iter()
        .filter(|w| w.title != "Program Manager")
        .find(|w| pred(w))
}

fn observe(desktop: &Win32Desktop, handle: WindowHandle) -> (bool, bool, Option<WindowHandle>) {
    (
        desktop.is_minimized(handle),
        desktop.is_visible(handle),
        desktop.foreground_window(),
    )
}

#[test]
#[ignore = "requires an interactive Windows desktop"]
fn test_list_windows_real() {
    let windows = capturer().list_all_windows().expect("Failed to list windows");

    println!("Found {} windows:", windows.len());
    for window in &windows {
        println!(
            "  {} pid={} '{}' [{}]",
            window.handle,
            window.pid,
            window.title,
            window.status_label()
        );
    }

    assert!(!windows.is_empty(), "Expected at least one titled window");
}

#[test]
#[ignore = "requires an interactive Windows desktop"]
fn test_exact_title_lookup_real() {
    let target = pick_window(|_| true).expect("No windows available");

    let found = capturer()
        .find_window_by_exact_title(&target.title)
        .expect("Lookup failed");

    assert!(found.is_some(), "'{}' should be found by exact title", target.title);
}

#[test]
#[ignore = "requires an interactive Windows desktop"]
fn test_capture_visible_window_real() {
    let target = pick_window(|w| w.visible && !w.minimized).expect("No visible window");
    println!("Capturing '{}' ({})", target.title, target.handle);

    let out = test_output_dir();
    std::fs::create_dir_all(&out).expect("Failed to create test_output directory");

    let capturer = capturer();
    let full = capturer
        .capture_full(target.handle, Some(&out.join("visible_full.png")))
        .expect("Full capture failed");
    let client = capturer
        .capture_client(target.handle, Some(&out.join("visible_client.png")))
        .expect("Client capture failed");

    println!("Full: {:?}, client: {:?}", full.dimensions(), client.dimensions());
    assert!(client.width() <= full.width());
    assert!(client.height() <= full.height());
    assert!(full.as_bytes().iter().any(|&b| b != 0), "Image should not be all black");
}

#[test]
#[ignore = "requires an interactive Windows desktop with a minimized window"]
fn test_capture_minimized_window_restores_state_real() {
    let Some(target) = pick_window(|w| w.minimized) else {
        println!("No minimized window found, skipping");
        return;
    };
    println!("Capturing minimized '{}' ({})", target.title, target.handle);

    let capturer = capturer();
    let before = observe(capturer.backend(), target.handle);

    let image = capturer
        .capture_client(target.handle, None)
        .expect("Client capture of minimized window failed");

    assert!(image.width() > 0 && image.height() > 0);
    assert_eq!(observe(capturer.backend(), target.handle), before);
}

#[test]
#[ignore = "requires an interactive Windows desktop"]
fn test_crop_path_matches_client_size_real() {
    let target = pick_window(|w| w.visible && !w.minimized).expect("No visible window");
    let capturer = capturer();

    let cropped = capturer
        .try_capture_client_crop(target.handle)
        .expect("Crop capture failed");
    let client = capturer
        .backend()
        .client_rect(target.handle)
        .expect("Failed to read client rect");

    assert_eq!(i64::from(cropped.width()), client.width());
    assert_eq!(i64::from(cropped.height()), client.height());
}

#[test]
#[ignore = "requires an interactive Windows desktop"]
fn test_stale_handle_real() {
    // Far above any handle value a normal session hands out
    let stale = WindowHandle::from_raw(0x7fff_fffe);

    assert!(capturer().capture_full(stale, None).is_none());
    assert!(capturer().capture_client(stale, None).is_none());
}
