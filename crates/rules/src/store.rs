//! Thread-safe in-memory rule collection.

use crate::matcher::eq_ignore_case;
use crate::rule::{Rule, RuleKind};
use chrono::Utc;
use std::sync::Mutex;
use uuid::Uuid;

/// The canonical rule collection, behind a single coarse lock.
///
/// Every operation locks the whole list. Rule counts are tens, not
/// thousands, so O(n) scans under one mutex are the intended trade-off;
/// the same lock also covers the usage-statistics update on dispatch, so
/// concurrent dispatches cannot lose counter increments.
#[derive(Default)]
pub struct RuleStore {
    rules: Mutex<Vec<Rule>>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule. Rules without a display name are silently ignored.
    pub fn add(&self, rule: Rule) {
        if rule.name.trim().is_empty() {
            return;
        }
        self.lock().push(rule);
    }

    /// Remove the rule with the given id, if present.
    pub fn remove(&self, id: &Uuid) {
        self.lock().retain(|r| r.id != *id);
    }

    /// Replace the stored rule carrying the same id with the given rule.
    ///
    /// Full replace, last write wins - not a field merge. No-op when the
    /// id is unknown.
    pub fn update(&self, rule: Rule) {
        let mut rules = self.lock();
        if let Some(existing) = rules.iter_mut().find(|r| r.id == rule.id) {
            *existing = rule;
        }
    }

    /// Snapshot of all rules, in insertion order.
    ///
    /// The snapshot is a copy; mutating it does not affect the store.
    pub fn all(&self) -> Vec<Rule> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Swap in a freshly loaded rule list (config hot-reload).
    ///
    /// Applies the same empty-name filter as `add`.
    pub fn replace_all(&self, rules: Vec<Rule>) {
        let filtered: Vec<Rule> = rules
            .into_iter()
            .filter(|r| !r.name.trim().is_empty())
            .collect();
        *self.lock() = filtered;
    }

    /// Application rules whose target equals the given app name,
    /// case-insensitively. Enabled state is not considered; this is a
    /// listing helper, not a match.
    pub fn rules_for_application(&self, app: &str) -> Vec<Rule> {
        self.lock()
            .iter()
            .filter(|r| r.kind == RuleKind::Application && eq_ignore_case(&r.target, app))
            .cloned()
            .collect()
    }

    pub fn rules_by_kind(&self, kind: RuleKind) -> Vec<Rule> {
        self.lock()
            .iter()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect()
    }

    pub fn rule_by_id(&self, id: &Uuid) -> Option<Rule> {
        self.lock().iter().find(|r| r.id == *id).cloned()
    }

    /// Record a successful dispatch: stamp `last_used` and bump
    /// `usage_count`, under the store lock.
    pub fn record_use(&self, id: &Uuid) {
        let mut rules = self.lock();
        if let Some(rule) = rules.iter_mut().find(|r| r.id == *id) {
            rule.last_used = Some(Utc::now());
            rule.usage_count += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Rule>> {
        self.rules.lock().expect("rule store mutex poisoned")
    }
}
