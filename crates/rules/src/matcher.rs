//! Rule matching.
//!
//! Pure domain logic - no I/O, no platform dependencies. The engine feeds
//! it a snapshot of the store plus the current context and acts on the
//! winner it picks.

use crate::rule::{Rule, RuleKind};

/// Case-insensitive equality for app names, domains and input sources.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Website pattern predicate.
///
/// Three pattern forms, all case-insensitive:
/// - `*.suffix` matches `suffix` itself and any subdomain of it
/// - `*rest` (no dot after the star) matches any domain containing `rest`
/// - anything else must equal the domain exactly
pub fn website_matches(domain: &str, pattern: &str) -> bool {
    if domain.is_empty() || pattern.is_empty() {
        return false;
    }

    let domain = domain.to_lowercase();
    let pattern = pattern.to_lowercase();

    if let Some(suffix) = pattern.strip_prefix("*.") {
        // `*.zhihu.com` covers zhihu.com and www.zhihu.com, not notzhihu.com.
        domain == suffix || domain.ends_with(&format!(".{suffix}"))
    } else if let Some(rest) = pattern.strip_prefix('*') {
        // `*stack*` and `*stack` both mean "contains stack".
        let rest = rest.strip_suffix('*').unwrap_or(rest);
        domain.contains(rest)
    } else {
        domain == pattern
    }
}

fn rule_matches(rule: &Rule, current_app: &str, domain: Option<&str>) -> bool {
    if !rule.enabled {
        return false;
    }

    match rule.kind {
        RuleKind::Application => eq_ignore_case(&rule.target, current_app),
        RuleKind::Process => contains_ignore_case(current_app, &rule.target),
        RuleKind::Website => domain.is_some_and(|d| website_matches(d, &rule.target)),
    }
}

/// All enabled rules matching the current context, in input order.
///
/// The three rule kinds are evaluated independently and unioned; an
/// application rule and a process rule can both match the same app name.
pub fn matching_rules<'a>(
    rules: &'a [Rule],
    current_app: &str,
    domain: Option<&str>,
) -> Vec<&'a Rule> {
    rules
        .iter()
        .filter(|r| rule_matches(r, current_app, domain))
        .collect()
}

/// Enabled website rules matching the given domain, in input order.
///
/// For callers that already know the domain (the extension bridge) and
/// must not re-derive it from a browser-context poll.
pub fn matching_website_rules<'a>(rules: &'a [Rule], domain: &str) -> Vec<&'a Rule> {
    rules
        .iter()
        .filter(|r| r.kind == RuleKind::Website && r.enabled && website_matches(domain, &r.target))
        .collect()
}

/// Pick the dispatch winner: highest priority, first in input order on ties.
///
/// Explicit scan: `max_by_key` keeps the *last* maximum and would flip the
/// tie-break.
pub fn select_winner<'a>(matches: &[&'a Rule]) -> Option<&'a Rule> {
    let mut winner: Option<&'a Rule> = None;
    for &rule in matches {
        match winner {
            Some(w) if rule.priority <= w.priority => {}
            _ => winner = Some(rule),
        }
    }
    winner
}
