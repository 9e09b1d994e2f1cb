//! Platform capabilities for keyflow.
//!
//! These traits abstract the OS-specific mechanics of reading the
//! foreground application and reading/writing the active input source, so
//! the dispatch engine stays pure and testable. Implementations are
//! best-effort by contract: they absorb platform failures and degrade to
//! sentinels instead of surfacing errors to the engine.

pub mod browser;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "linux")]
pub use linux::LinuxInputSources;

pub use browser::ProcessScanBrowserContext;

use async_trait::async_trait;
use std::sync::Arc;

/// Sentinel returned when the foreground application or the active input
/// source cannot be determined. Callers treat it as "no context", not as
/// an error.
pub const UNKNOWN: &str = "unknown";

/// Capability for reading and switching the active input source.
///
/// All operations may block on OS or subprocess round-trips, hence async.
/// Implementations must not panic or return errors; failures degrade to
/// the [`UNKNOWN`] sentinel or `false`.
#[async_trait]
pub trait InputSourceProvider: Send + Sync {
    /// Name of the foreground application/process, or [`UNKNOWN`].
    async fn current_application(&self) -> String;

    /// Human-readable name of the active input source, or [`UNKNOWN`].
    async fn current_input_source(&self) -> String;

    /// Installed input sources. May be empty.
    async fn available_input_sources(&self) -> Vec<String>;

    /// Request a switch to the named input source.
    ///
    /// Returns whether the request was issued, not whether the OS applied
    /// it. An unknown name falls back to the hotkey cycle rather than
    /// failing.
    async fn switch_to_input_source(&self, name: &str) -> bool;

    /// Cycle to the next input source without naming a target.
    async fn switch_by_hotkey(&self) -> bool;
}

/// Capability reporting whether a website-like context is active.
///
/// Both operations are best-effort; an implementation may legitimately be
/// unable to determine the real browser URL. Absence means "no website
/// context", never an error.
#[async_trait]
pub trait BrowserContext: Send + Sync {
    async fn is_website_active(&self) -> bool;

    /// Domain (or descriptive string) of the active website.
    async fn current_website(&self) -> Option<String>;
}

pub type InputSourceProviderRef = Arc<dyn InputSourceProvider>;
pub type BrowserContextRef = Arc<dyn BrowserContext>;

/// Null provider for tests and unsupported platforms.
#[derive(Debug, Default)]
pub struct NullInputSources;

impl NullInputSources {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl InputSourceProvider for NullInputSources {
    async fn current_application(&self) -> String {
        UNKNOWN.to_string()
    }

    async fn current_input_source(&self) -> String {
        UNKNOWN.to_string()
    }

    async fn available_input_sources(&self) -> Vec<String> {
        Vec::new()
    }

    async fn switch_to_input_source(&self, _name: &str) -> bool {
        false
    }

    async fn switch_by_hotkey(&self) -> bool {
        false
    }
}

/// Null browser context: never reports an active website.
#[derive(Debug, Default)]
pub struct NullBrowserContext;

impl NullBrowserContext {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BrowserContext for NullBrowserContext {
    async fn is_website_active(&self) -> bool {
        false
    }

    async fn current_website(&self) -> Option<String> {
        None
    }
}

// The concrete provider for the current platform.
#[cfg(target_os = "linux")]
pub type PlatformInputSources = LinuxInputSources;

#[cfg(not(target_os = "linux"))]
pub type PlatformInputSources = NullInputSources;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_input_sources_degrade_to_sentinels() {
        let provider = NullInputSources::new();

        assert_eq!(provider.current_application().await, UNKNOWN);
        assert_eq!(provider.current_input_source().await, UNKNOWN);
        assert!(provider.available_input_sources().await.is_empty());
        assert!(!provider.switch_to_input_source("English (US)").await);
        assert!(!provider.switch_by_hotkey().await);
    }

    #[tokio::test]
    async fn test_null_browser_context_reports_no_website() {
        let browser = NullBrowserContext::new();

        assert!(!browser.is_website_active().await);
        assert!(browser.current_website().await.is_none());
    }
}
