//! Rule model, storage and matching for keyflow.
//!
//! This is the pure domain layer: no I/O, no platform dependencies.
//! The dispatch engine combines it with the platform capabilities from
//! `keyflow-platform`.

mod matcher;
mod rule;
mod store;

pub use matcher::{
    eq_ignore_case, matching_rules, matching_website_rules, select_winner, website_matches,
};
pub use rule::{Rule, RuleKind};
pub use store::RuleStore;
