//! Periodic dispatch driver.

use crate::DispatchEngine;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Default cadence between unattended dispatch evaluations.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1200);

/// Drives the engine unattended: every tick it reads the current context
/// from the platform and runs the rules.
///
/// The poller owns no state beyond the task handle; the engine and store
/// stay shared. Stopping is idempotent, and dropping a running poller
/// stops it. A tick in flight when `stop` is called may be cancelled
/// mid-dispatch; the underlying switch request is fire-and-forget at the
/// OS layer, so this is safe.
pub struct DispatchPoller {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Default for DispatchPoller {
    fn default() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }
}

impl DispatchPoller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start polling at [`DEFAULT_POLL_INTERVAL`].
    pub fn start(&mut self, engine: Arc<DispatchEngine>) {
        self.start_with_interval(engine, DEFAULT_POLL_INTERVAL);
    }

    /// Start polling at a custom interval.
    pub fn start_with_interval(&mut self, engine: Arc<DispatchEngine>, interval: Duration) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("dispatch poller already running");
            return;
        }

        let running = Arc::clone(&self.running);
        let handle = tokio::spawn(async move {
            info!(interval_ms = interval.as_millis() as u64, "dispatch poller started");

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            while running.load(Ordering::SeqCst) {
                ticker.tick().await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                engine.poll_once().await;
            }

            info!("dispatch poller stopped");
        });

        self.handle = Some(handle);
    }

    /// Stop the poller. Idempotent.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for DispatchPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use keyflow_platform::{InputSourceProvider, NullBrowserContext};
    use keyflow_rules::{Rule, RuleKind, RuleStore};
    use std::sync::atomic::AtomicUsize;

    /// Counts polls through `current_application`.
    struct CountingProvider {
        polls: AtomicUsize,
    }

    #[async_trait]
    impl InputSourceProvider for CountingProvider {
        async fn current_application(&self) -> String {
            self.polls.fetch_add(1, Ordering::SeqCst);
            "testapp".to_string()
        }

        async fn current_input_source(&self) -> String {
            "English".to_string()
        }

        async fn available_input_sources(&self) -> Vec<String> {
            Vec::new()
        }

        async fn switch_to_input_source(&self, _name: &str) -> bool {
            true
        }

        async fn switch_by_hotkey(&self) -> bool {
            true
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_poller_lifecycle() {
        let store = Arc::new(RuleStore::new());
        store.add(Rule::new(
            "Test",
            RuleKind::Application,
            "testapp",
            "Chinese",
        ));

        let provider = Arc::new(CountingProvider {
            polls: AtomicUsize::new(0),
        });
        let engine = Arc::new(DispatchEngine::new(
            store,
            provider.clone(),
            Arc::new(NullBrowserContext::new()),
        ));

        let mut poller = DispatchPoller::new();
        assert!(!poller.is_running());

        poller.start_with_interval(engine, Duration::from_millis(20));
        assert!(poller.is_running());

        tokio::time::sleep(Duration::from_millis(200)).await;

        poller.stop();
        assert!(!poller.is_running());

        // At least the immediate first tick must have dispatched.
        assert!(provider.polls.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_double_start_is_rejected() {
        let store = Arc::new(RuleStore::new());
        let provider = Arc::new(CountingProvider {
            polls: AtomicUsize::new(0),
        });
        let engine = Arc::new(DispatchEngine::new(
            store,
            provider,
            Arc::new(NullBrowserContext::new()),
        ));

        let mut poller = DispatchPoller::new();
        poller.start_with_interval(engine.clone(), Duration::from_millis(50));
        let first_handle_exists = poller.handle.is_some();

        poller.start_with_interval(engine, Duration::from_millis(50));

        assert!(first_handle_exists);
        assert!(poller.is_running());
        poller.stop();
    }
}
