//! Opening the authorize URL for the user.

/// Something that can show a URL to the user.
pub trait BrowserLauncher: Send + Sync {
    fn open(&self, url: &str) -> std::io::Result<()>;
}

/// Launches the platform's default browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> std::io::Result<()> {
        open::that_detached(url)
    }
}

/// Only logs the URL, for headless machines.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOnly;

impl BrowserLauncher for LogOnly {
    fn open(&self, url: &str) -> std::io::Result<()> {
        tracing::info!(url, "open this URL in a browser to continue");
        Ok(())
    }
}
