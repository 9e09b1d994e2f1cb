//! The rule model shared by the store, the matcher and the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which part of the current context a rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleKind {
    /// Exact match on the foreground application name.
    Application,
    /// Domain match, fed by the browser context or the extension bridge.
    Website,
    /// Substring match on the foreground process name.
    Process,
}

/// A stored mapping from a context predicate to a desired input source.
///
/// Serialized camelCase with the field names of the keyflow rule file, so
/// a document written by an older build keeps loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Unique id, generated at creation and immutable thereafter.
    pub id: Uuid,

    /// Display name. Rules with an empty name are rejected by the store.
    pub name: String,

    #[serde(rename = "type")]
    pub kind: RuleKind,

    /// Pattern whose matching semantics depend on `kind` (see the matcher).
    pub target: String,

    /// Input source to activate when this rule wins dispatch.
    #[serde(rename = "targetInputSource")]
    pub input_source: String,

    /// Disabled rules never match.
    #[serde(rename = "isEnabled")]
    pub enabled: bool,

    /// Higher value wins when several rules match.
    pub priority: i32,

    pub created_at: DateTime<Utc>,

    /// Set on each successful dispatch.
    pub last_used: Option<DateTime<Utc>>,

    /// Incremented on each successful dispatch, never reset individually.
    pub usage_count: u64,
}

impl Rule {
    /// Create an enabled rule with priority 0 and a fresh id.
    pub fn new(
        name: impl Into<String>,
        kind: RuleKind,
        target: impl Into<String>,
        input_source: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            target: target.into(),
            input_source: input_source.into(),
            enabled: true,
            priority: 0,
            created_at: Utc::now(),
            last_used: None,
            usage_count: 0,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rule_defaults() {
        let rule = Rule::new("Editor", RuleKind::Application, "code", "English (US)");

        assert!(rule.enabled);
        assert_eq!(rule.priority, 0);
        assert_eq!(rule.usage_count, 0);
        assert!(rule.last_used.is_none());
    }

    #[test]
    fn test_fresh_ids_are_unique() {
        let a = Rule::new("A", RuleKind::Application, "a", "x");
        let b = Rule::new("B", RuleKind::Application, "b", "x");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_serde_uses_rule_file_field_names() {
        let rule = Rule::new("GitHub", RuleKind::Website, "*.github.com", "English (US)")
            .with_priority(2);

        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["type"], "Website");
        assert_eq!(json["targetInputSource"], "English (US)");
        assert_eq!(json["isEnabled"], true);
        assert_eq!(json["usageCount"], 0);
        assert!(json.get("createdAt").is_some());

        let back: Rule = serde_json::from_value(json).unwrap();
        assert_eq!(back, rule);
    }
}
