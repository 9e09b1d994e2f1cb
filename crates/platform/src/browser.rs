//! Browser-context detection via process scanning.
//!
//! This layer only knows whether a browser is running; it cannot see tab
//! URLs from outside the browser. Real domains arrive through the
//! extension bridge - the placeholder returned here exists so website
//! rules are evaluated at all during unattended polling.

use crate::BrowserContext;
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use sysinfo::{ProcessesToUpdate, System};
use tracing::debug;

/// Process names treated as browsers.
pub const BROWSER_PROCESSES: &[&str] = &["chrome", "msedge", "firefox", "opera", "brave", "chromium"];

/// How long one process scan stays fresh.
const SCAN_TTL: Duration = Duration::from_secs(5);

/// Placeholder domain reported while a browser is running.
pub const BROWSER_DETECTED: &str = "browser-detected";

/// Check whether a process name belongs to a known browser.
pub fn is_browser_process(name: &str) -> bool {
    let name = name.to_lowercase();
    BROWSER_PROCESSES.iter().any(|b| name.contains(b))
}

/// [`BrowserContext`] that scans the process table for running browsers.
///
/// Scans are cached for a few seconds; the poller fires every second or
/// so and a full process refresh per tick would be wasteful.
#[derive(Default)]
pub struct ProcessScanBrowserContext {
    cache: Mutex<Option<(Instant, bool)>>,
}

impl ProcessScanBrowserContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn browser_running(&self) -> bool {
        let mut cache = self.cache.lock().expect("browser cache mutex poisoned");
        if let Some((scanned_at, hit)) = *cache {
            if scanned_at.elapsed() < SCAN_TTL {
                return hit;
            }
        }

        let hit = scan_for_browsers();
        debug!(browser_running = hit, "process scan refreshed");
        *cache = Some((Instant::now(), hit));
        hit
    }
}

fn scan_for_browsers() -> bool {
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::All, true);
    sys.processes()
        .values()
        .any(|p| is_browser_process(&p.name().to_string_lossy()))
}

#[async_trait]
impl BrowserContext for ProcessScanBrowserContext {
    async fn is_website_active(&self) -> bool {
        self.browser_running()
    }

    async fn current_website(&self) -> Option<String> {
        self.browser_running().then(|| BROWSER_DETECTED.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_process_names() {
        assert!(is_browser_process("chrome"));
        assert!(is_browser_process("Google-chrome-stable"));
        assert!(is_browser_process("FIREFOX"));
        assert!(!is_browser_process("code"));
        assert!(!is_browser_process("xterm"));
    }

    #[tokio::test]
    async fn test_scan_result_is_cached() {
        let context = ProcessScanBrowserContext::new();

        let first = context.is_website_active().await;
        // Second call inside the TTL must serve the cache and agree.
        let second = context.is_website_active().await;
        assert_eq!(first, second);

        // The placeholder only appears when a browser was seen.
        let website = context.current_website().await;
        assert_eq!(website.is_some(), first);
    }
}
