//! Hot-reload: watch the rule file and push fresh rule lists to a
//! callback.

use crate::{load_rules, Result};
use keyflow_rules::Rule;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

/// Invoked with the freshly loaded rules after each file change.
pub type ReloadCallback = Arc<dyn Fn(Vec<Rule>) + Send + Sync + 'static>;

/// Editors and the daemon itself write in bursts; changes inside this
/// window collapse into one reload.
const DEBOUNCE: Duration = Duration::from_millis(200);

/// Watches the rule file and reloads it on change.
///
/// The parent directory is watched rather than the file itself, so
/// atomic replace-on-save (the common editor strategy) keeps working.
/// The callback runs on the watcher's thread; keep it cheap - pushing
/// into `RuleStore::replace_all` is the intended use.
pub struct RuleFileWatcher {
    _watcher: RecommendedWatcher,
}

impl RuleFileWatcher {
    pub fn new(path: &Path, callback: ReloadCallback) -> Result<Self> {
        let file = path.to_path_buf();
        let dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        let last_reload: Mutex<Option<Instant>> = Mutex::new(None);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let Ok(event) = res else {
                return;
            };
            if !event.kind.is_modify() && !event.kind.is_create() {
                return;
            }
            if !event
                .paths
                .iter()
                .any(|p| p.file_name() == file.file_name())
            {
                return;
            }

            {
                let mut last = last_reload.lock().expect("watcher mutex poisoned");
                if last.is_some_and(|at| at.elapsed() < DEBOUNCE) {
                    return;
                }
                *last = Some(Instant::now());
            }

            let rules = load_rules(&file);
            debug!(path = %file.display(), count = rules.len(), "rule file changed");
            callback(rules);
        })?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        Ok(Self { _watcher: watcher })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::save_rules;
    use keyflow_rules::{Rule, RuleKind};
    use std::sync::mpsc;

    #[test]
    fn test_watcher_reloads_on_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        save_rules(&path, &[]).unwrap();

        let (tx, rx) = mpsc::channel();
        let _watcher = RuleFileWatcher::new(
            &path,
            Arc::new(move |rules| {
                let _ = tx.send(rules);
            }),
        )
        .unwrap();

        // Give the watcher a moment to arm before the write.
        std::thread::sleep(Duration::from_millis(200));

        let rule = Rule::new("Editor", RuleKind::Application, "code", "English (US)");
        save_rules(&path, &[rule.clone()]).unwrap();

        // Bursts may deliver several events; take the first non-empty load.
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok(rules) if !rules.is_empty() => {
                    assert_eq!(rules[0].id, rule.id);
                    break;
                }
                Ok(_) => continue,
                Err(e) => panic!("no reload observed: {e}"),
            }
        }
    }
}
