//! Opening deep links in the system browser.

use anyhow::{Context, Result, bail};
use tracing::info;

/// Attempt to open a URL in the system default browser.
pub fn open_url(url: &str) -> Result<()> {
    if url.trim().is_empty() {
        bail!("no link to open");
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .context("failed to open browser")?;
    }

    info!(url, "opened link");
    Ok(())
}
