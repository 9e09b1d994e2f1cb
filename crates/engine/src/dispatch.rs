//! The dispatch engine: match rules, pick a winner, switch.

use keyflow_platform::{BrowserContextRef, InputSourceProviderRef};
use keyflow_rules::{
    eq_ignore_case, matching_rules, matching_website_rules, select_winner, Rule, RuleKind,
    RuleStore,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Decides, for the current context, which input source should be active
/// and performs the switch through the platform capability.
///
/// Every entry point returns a bare bool: `true` when a switch request
/// was issued, `false` for "no action taken" (no match, already active,
/// or the platform declined). Nothing on the dispatch path panics or
/// propagates errors - it runs unattended on a timer.
pub struct DispatchEngine {
    store: Arc<RuleStore>,
    input_sources: InputSourceProviderRef,
    browser: BrowserContextRef,
}

impl DispatchEngine {
    pub fn new(
        store: Arc<RuleStore>,
        input_sources: InputSourceProviderRef,
        browser: BrowserContextRef,
    ) -> Self {
        Self {
            store,
            input_sources,
            browser,
        }
    }

    pub fn store(&self) -> &Arc<RuleStore> {
        &self.store
    }

    /// Evaluate all rule kinds against the current context.
    ///
    /// `current_app` is matched both as an application target (exact) and
    /// a process target (substring); website rules join in when the
    /// browser context reports an active website.
    pub async fn execute_rules(&self, current_app: &str, current_input_source: &str) -> bool {
        let domain = if self.browser.is_website_active().await {
            self.browser.current_website().await
        } else {
            None
        };

        let rules = self.store.all();
        let matches = matching_rules(&rules, current_app, domain.as_deref());
        let Some(winner) = select_winner(&matches) else {
            debug!(current_app, "no matching rules");
            return false;
        };

        self.switch_and_record(winner, current_input_source).await
    }

    /// Evaluate website rules only, for callers that already know the
    /// domain (the extension bridge) and must not re-derive it from a
    /// browser-context poll.
    pub async fn execute_website_rules(&self, domain: &str, current_input_source: &str) -> bool {
        let rules = self.store.all();
        let matches = matching_website_rules(&rules, domain);
        let Some(winner) = select_winner(&matches) else {
            debug!(domain, "no matching website rules");
            return false;
        };

        self.switch_and_record(winner, current_input_source).await
    }

    /// One unattended poll: read the current context from the provider,
    /// then run the rules.
    pub async fn poll_once(&self) -> bool {
        let current_app = self.input_sources.current_application().await;
        let current_input_source = self.input_sources.current_input_source().await;
        self.execute_rules(&current_app, &current_input_source).await
    }

    /// Bridge entry point: read the current source, then run website
    /// rules for the pushed domain.
    pub async fn dispatch_website(&self, domain: &str) -> bool {
        let current_input_source = self.input_sources.current_input_source().await;
        self.execute_website_rules(domain, &current_input_source)
            .await
    }

    /// Common tail of the entry points: idempotence check, switch,
    /// statistics.
    async fn switch_and_record(&self, winner: &Rule, current_input_source: &str) -> bool {
        if eq_ignore_case(&winner.input_source, current_input_source) {
            debug!(rule = %winner.name, "input source already active");
            return false;
        }

        let switched = self
            .input_sources
            .switch_to_input_source(&winner.input_source)
            .await;

        if switched {
            // Under the store lock, so concurrent dispatches never lose
            // an increment.
            self.store.record_use(&winner.id);
            info!(
                rule = %winner.name,
                input_source = %winner.input_source,
                "switched input source"
            );
        } else {
            debug!(
                rule = %winner.name,
                input_source = %winner.input_source,
                "switch request declined"
            );
        }

        switched
    }

    /// Listing helper for rule-management UIs.
    pub async fn rules_for_application(&self, app: &str) -> Vec<Rule> {
        self.store.rules_for_application(app)
    }

    /// Listing helper for rule-management UIs.
    pub async fn rules_by_kind(&self, kind: RuleKind) -> Vec<Rule> {
        self.store.rules_by_kind(kind)
    }

    /// Listing helper for rule-management UIs.
    pub async fn rule_by_id(&self, id: &Uuid) -> Option<Rule> {
        self.store.rule_by_id(id)
    }
}
