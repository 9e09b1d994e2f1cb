//! First-run sample rules.

use keyflow_rules::{Rule, RuleKind};

/// The rule set written on first run, so a fresh install demonstrates
/// each rule kind without manual setup.
pub fn seed_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            "Notepad in Chinese",
            RuleKind::Application,
            "notepad",
            "Chinese (Simplified)",
        )
        .with_priority(1),
        Rule::new(
            "Code editor in English",
            RuleKind::Application,
            "code",
            "English (US)",
        )
        .with_priority(2),
        Rule::new(
            "Visual Studio in English",
            RuleKind::Application,
            "devenv",
            "English (US)",
        )
        .with_priority(3),
        Rule::new(
            "Chinese sites in Chinese",
            RuleKind::Website,
            "*.zhihu.com",
            "Chinese (Simplified)",
        )
        .with_priority(1),
        Rule::new(
            "Stack Overflow in English",
            RuleKind::Website,
            "*.stackoverflow.com",
            "English (US)",
        )
        .with_priority(1),
        Rule::new(
            "GitHub in English",
            RuleKind::Website,
            "*.github.com",
            "English (US)",
        )
        .with_priority(2),
        Rule::new(
            "Terminals in English",
            RuleKind::Process,
            "cmd",
            "English (US)",
        )
        .with_priority(1),
        Rule::new(
            "PowerShell in English",
            RuleKind::Process,
            "powershell",
            "English (US)",
        )
        .with_priority(1),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_rules_are_storable() {
        let rules = seed_rules();

        assert!(!rules.is_empty());
        // The store silently drops unnamed rules; seeds must all survive.
        assert!(rules.iter().all(|r| !r.name.trim().is_empty()));
        assert!(rules.iter().all(|r| r.enabled));
    }

    #[test]
    fn test_seed_rules_cover_every_kind() {
        let rules = seed_rules();

        for kind in [RuleKind::Application, RuleKind::Website, RuleKind::Process] {
            assert!(rules.iter().any(|r| r.kind == kind), "missing {kind:?}");
        }
    }
}
