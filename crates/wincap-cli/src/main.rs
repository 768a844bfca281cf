//! wincap: Command-line harness for the window capture engine
//!
//! Lists windows, searches them by title or process, and captures a window's
//! full frame or client area to PNG, including windows that are minimized.

use std::{path::PathBuf, time::Duration};

use anyhow::{Result, bail};
use clap::{ArgGroup, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};
use wincap_core::{
    capture::{PlatformDesktop, WindowCapturer, default_backend},
    config::CaptureSettings,
    error::CaptureError,
    model::{WindowHandle, WindowInfo},
};

#[derive(Parser)]
#[command(name = "wincap")]
#[command(about = "Capture window pixels, even from minimized or hidden windows")]
struct Cli {
    /// Emit log records as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every window with a title
    List {
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },
    /// Find windows by title or owning process
    #[command(group(ArgGroup::new("query").required(true).args(["title", "pid", "exact"])))]
    Find {
        /// Case-insensitive title substring
        #[arg(long)]
        title: Option<String>,
        /// Owning process ID
        #[arg(long)]
        pid: Option<u32>,
        /// Exact, case-sensitive window title
        #[arg(long)]
        exact: Option<String>,
    },
    /// Capture a window to a PNG file
    #[command(group(ArgGroup::new("target").required(true).args(["hwnd", "title", "exact"])))]
    Capture {
        /// Window handle, decimal or 0x-prefixed hex
        #[arg(long)]
        hwnd: Option<WindowHandle>,
        /// Case-insensitive title substring; the first match is captured
        #[arg(long)]
        title: Option<String>,
        /// Exact, case-sensitive window title
        #[arg(long)]
        exact: Option<String>,
        /// Capture only the client area (default)
        #[arg(long, conflicts_with = "full")]
        client: bool,
        /// Capture the whole window including its frame
        #[arg(long)]
        full: bool,
        /// Output file path (default: capture_<timestamp>.png)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Milliseconds to wait after showing a minimized window
        #[arg(long)]
        settle_ms: Option<u64>,
        /// Opacity used while a minimized window is shown (0-255)
        #[arg(long)]
        alpha: Option<u8>,
    },
}

const DEFAULT_LOG_FILTER: &str = "wincap=info,wincap_core=info";

/// Respects RUST_LOG. Logs go to stderr so `list --json` output stays parseable.
fn init_logging(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false);

    if json {
        builder.json().with_current_span(false).with_span_list(false).init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    match cli.command {
        Commands::List { json } => list_windows(json),
        Commands::Find { title, pid, exact } => find_windows(title, pid, exact),
        Commands::Capture {
            hwnd,
            title,
            exact,
            client: _,
            full,
            out,
            settle_ms,
            alpha,
        } => {
            let mut settings = CaptureSettings::from_env();
            if let Some(ms) = settle_ms {
                settings = settings.with_settle_delay(Duration::from_millis(ms));
            }
            if let Some(alpha) = alpha {
                settings = settings.with_flash_alpha(alpha);
            }

            let capturer = WindowCapturer::with_settings(default_backend()?, settings);
            let handle = resolve_target(&capturer, hwnd, title, exact)?;
            capture_window(&capturer, handle, full, out)
        }
    }
}

fn list_windows(json: bool) -> Result<()> {
    let capturer = WindowCapturer::new(default_backend()?);
    let statuses = capturer.list_all_windows()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    println!("Found {} windows:\n", statuses.len());
    for status in statuses {
        println!("  Handle: {}", status.handle);
        println!("  Title:  {}", status.title);
        println!("  PID:    {}", status.pid);
        println!("  Status: {}", status.status_label());
        println!();
    }
    Ok(())
}

fn find_windows(title: Option<String>, pid: Option<u32>, exact: Option<String>) -> Result<()> {
    let capturer = WindowCapturer::new(default_backend()?);

    if let Some(exact) = exact {
        match capturer.find_window_by_exact_title(&exact)? {
            Some(handle) => println!("{handle}  {exact}"),
            None => return Err(CaptureError::WindowNotFound { query: exact }.into()),
        }
        return Ok(());
    }

    let windows = match (title, pid) {
        (Some(title), _) => capturer.find_windows_by_title_substring(&title)?,
        (None, Some(pid)) => capturer.find_windows_by_owning_process(pid)?,
        (None, None) => bail!("One of --title, --pid or --exact must be specified"),
    };

    if windows.is_empty() {
        bail!("No matching windows");
    }
    print_windows(&windows);
    Ok(())
}

fn print_windows(windows: &[WindowInfo]) {
    for window in windows {
        println!(
            "{}  pid={:<6} {}{}",
            window.handle,
            window.pid,
            window.title,
            if window.minimized { "  (minimized)" } else { "" }
        );
    }
}

fn resolve_target(
    capturer: &WindowCapturer<PlatformDesktop>,
    hwnd: Option<WindowHandle>,
    title: Option<String>,
    exact: Option<String>,
) -> Result<WindowHandle> {
    if let Some(handle) = hwnd {
        return Ok(handle);
    }

    if let Some(exact) = exact {
        let found = capturer.find_window_by_exact_title(&exact)?;
        return found.ok_or_else(|| CaptureError::WindowNotFound { query: exact }.into());
    }

    let Some(title) = title else {
        bail!("One of --hwnd, --title or --exact must be specified");
    };
    let matches = capturer.find_windows_by_title_substring(&title)?;
    let Some(first) = matches.first() else {
        return Err(CaptureError::WindowNotFound { query: title }.into());
    };
    if matches.len() > 1 {
        info!(count = matches.len(), handle = %first.handle, title = %first.title, "Several windows match, capturing the first");
    }
    Ok(first.handle)
}

fn capture_window(
    capturer: &WindowCapturer<PlatformDesktop>,
    handle: WindowHandle,
    full: bool,
    out: Option<PathBuf>,
) -> Result<()> {
    let out = out.unwrap_or_else(default_output_path);

    let image = if full {
        capturer.capture_full(handle, Some(&out))
    } else {
        capturer.capture_client(handle, Some(&out))
    };

    let Some(image) = image else {
        bail!("Capture of window {handle} produced no image");
    };

    println!("Captured {}x{} from window {handle}", image.width(), image.height());
    println!("Saved to: {}", out.display());
    Ok(())
}

fn default_output_path() -> PathBuf {
    PathBuf::from(format!("capture_{}.png", chrono::Local::now().format("%Y%m%d_%H%M%S")))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_capture_requires_a_target() {
        assert!(Cli::try_parse_from(["wincap", "capture"]).is_err());
        assert!(Cli::try_parse_from(["wincap", "capture", "--hwnd", "0x1a2b"]).is_ok());
    }

    #[test]
    fn test_capture_targets_are_exclusive() {
        let result = Cli::try_parse_from(["wincap", "capture", "--hwnd", "12", "--title", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_client_and_full_conflict() {
        let result =
            Cli::try_parse_from(["wincap", "capture", "--hwnd", "12", "--client", "--full"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_hwnd_accepts_hex_and_decimal() {
        let Commands::Capture { hwnd, .. } =
            Cli::try_parse_from(["wincap", "capture", "--hwnd", "0x10"]).unwrap().command
        else {
            panic!("expected capture command");
        };
        assert_eq!(hwnd, Some(WindowHandle::from_raw(16)));
    }

    #[test]
    fn test_log_json_flag_is_global() {
        assert!(!Cli::try_parse_from(["wincap", "list"]).unwrap().log_json);
        assert!(Cli::try_parse_from(["wincap", "--log-json", "list"]).unwrap().log_json);

        let cli = Cli::try_parse_from(["wincap", "capture", "--hwnd", "12", "--log-json"]).unwrap();
        assert!(cli.log_json);
        assert!(matches!(cli.command, Commands::Capture { .. }));
    }

    #[test]
    fn test_default_output_path_is_png() {
        let path = default_output_path();
        let name = path.to_string_lossy();
        assert!(name.starts_with("capture_"));
        assert!(name.ends_with(".png"));
    }
}
