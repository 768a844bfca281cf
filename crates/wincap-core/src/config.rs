//! Runtime configuration for the capture engine
//!
//! Both tunables can be overridden through environment variables:
//!
//! | Environment Variable | Default | Description |
//! |---------------------|---------|-------------|
//! | `WINCAP_SETTLE_DELAY_MS` | 100 | Pause after un-minimizing, before rendering |
//! | `WINCAP_FLASH_ALPHA` | 1 | Opacity (0-255) applied while a minimized window is shown |
//!
//! # Settle delay
//!
//! Forcing a minimized window to show is asynchronous from the compositor's
//! point of view. The settle delay gives it time to lay out and paint the
//! restored window before its pixels are read. It is a heuristic: a slow
//! application can still be captured mid-repaint.
//!
//! # Flash alpha
//!
//! While a minimized window is briefly restored it is made nearly
//! transparent so the user does not see it appear. `0` hides it completely
//! but some compositors skip painting fully transparent windows, so the
//! default is the smallest visible value.

use std::time::Duration;

/// Default pause after forcing a minimized window visible.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 100;

/// Default layered alpha used to hide the restore flash (out of 255).
pub const DEFAULT_FLASH_ALPHA: u8 = 1;

/// Environment variable overriding [`DEFAULT_SETTLE_DELAY_MS`]
pub const SETTLE_DELAY_ENV: &str = "WINCAP_SETTLE_DELAY_MS";

/// Environment variable overriding [`DEFAULT_FLASH_ALPHA`]
pub const FLASH_ALPHA_ENV: &str = "WINCAP_FLASH_ALPHA";

fn get_from_env<T: std::str::FromStr>(env_var: &str, default: T) -> T {
    std::env::var(env_var)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Tunables for one [`WindowCapturer`](crate::capture::WindowCapturer)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    /// Pause after un-minimizing a window, before rendering it
    pub settle_delay: Duration,
    /// Layered alpha applied while a minimized window is transiently shown
    pub flash_alpha:  u8,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            flash_alpha:  DEFAULT_FLASH_ALPHA,
        }
    }
}

impl CaptureSettings {
    /// Builds settings from the environment, falling back to defaults for
    /// unset or unparseable values
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use wincap_core::config::{CaptureSettings, SETTLE_DELAY_ENV};
    ///
    /// let settings = temp_env::with_var(SETTLE_DELAY_ENV, Some("250"), CaptureSettings::from_env);
    /// assert_eq!(settings.settle_delay, Duration::from_millis(250));
    /// ```
    pub fn from_env() -> Self {
        Self {
            settle_delay: Duration::from_millis(get_from_env(
                SETTLE_DELAY_ENV,
                DEFAULT_SETTLE_DELAY_MS,
            )),
            flash_alpha:  get_from_env(FLASH_ALPHA_ENV, DEFAULT_FLASH_ALPHA),
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_flash_alpha(mut self, alpha: u8) -> Self {
        self.flash_alpha = alpha;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = CaptureSettings::default();
        assert_eq!(settings.settle_delay, Duration::from_millis(100));
        assert_eq!(settings.flash_alpha, 1);
    }

    #[test]
    fn test_from_env_without_overrides() {
        temp_env::with_vars_unset([SETTLE_DELAY_ENV, FLASH_ALPHA_ENV], || {
            assert_eq!(CaptureSettings::from_env(), CaptureSettings::default());
        });
    }

    #[test]
    fn test_env_override_with_value() {
        temp_env::with_vars([(SETTLE_DELAY_ENV, Some("250")), (FLASH_ALPHA_ENV, Some("0"))], || {
            let settings = CaptureSettings::from_env();
            assert_eq!(settings.settle_delay, Duration::from_millis(250));
            assert_eq!(settings.flash_alpha, 0);
        });
    }

    #[test]
    fn test_env_override_invalid_value() {
        temp_env::with_var(SETTLE_DELAY_ENV, Some("soon"), || {
            assert_eq!(CaptureSettings::from_env().settle_delay, Duration::from_millis(100));
        });

        // 300 does not fit in a u8
        temp_env::with_var(FLASH_ALPHA_ENV, Some("300"), || {
            assert_eq!(CaptureSettings::from_env().flash_alpha, DEFAULT_FLASH_ALPHA);
        });

        temp_env::with_var(SETTLE_DELAY_ENV, Some("-5"), || {
            assert_eq!(CaptureSettings::from_env().settle_delay, Duration::from_millis(100));
        });
    }

    #[test]
    fn test_builders() {
        let settings = CaptureSettings::default()
            .with_settle_delay(Duration::ZERO)
            .with_flash_alpha(128);
        assert!(settings.settle_delay.is_zero());
        assert_eq!(settings.flash_alpha, 128);
    }
}
