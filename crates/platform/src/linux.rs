//! Linux input sources, driven through ibus or fcitx.
//!
//! Everything here shells out: `which` to detect the installed framework,
//! `ibus`/`fcitx-remote` to read and switch engines, `xdotool`/`wmctrl`
//! for the foreground window. Any subprocess failure degrades to the
//! sentinel contract of [`InputSourceProvider`].

use crate::{InputSourceProvider, UNKNOWN};
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Input-method frameworks keyflow knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImeFramework {
    IBus,
    Fcitx,
    None,
}

/// Language name to ibus engine id.
const IBUS_ENGINES: &[(&str, &str)] = &[
    ("English (US)", "xkb:us::eng"),
    ("English (UK)", "xkb:gb::eng"),
    ("Chinese (Simplified)", "pinyin"),
    ("Chinese (Traditional)", "chewing"),
    ("Japanese", "mozc"),
    ("Korean", "hangul"),
    ("Russian", "xkb:ru::rus"),
    ("French", "xkb:fr::fra"),
    ("German", "xkb:de::ger"),
    ("Spanish", "xkb:es::spa"),
];

/// Language name to fcitx engine index (`fcitx-remote -s`).
const FCITX_ENGINES: &[(&str, i32)] = &[
    ("English (US)", 1),
    ("Chinese (Simplified)", 2),
    ("Chinese (Traditional)", 3),
    ("Japanese", 4),
    ("Korean", 5),
];

/// Sources reported when the framework cannot enumerate its engines.
const FALLBACK_SOURCES: &[&str] = &[
    "English (US)",
    "Chinese (Simplified)",
    "Japanese",
    "Korean",
];

/// Platform calls must fail fast, not hang a dispatch.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(1);

fn ibus_engine_for(name: &str) -> Option<&'static str> {
    IBUS_ENGINES
        .iter()
        .find(|(lang, _)| lang.eq_ignore_ascii_case(name))
        .map(|(_, engine)| *engine)
}

fn language_for_ibus_engine(engine: &str) -> Option<&'static str> {
    IBUS_ENGINES
        .iter()
        .find(|(_, id)| id.contains(engine) || engine.contains(id))
        .map(|(lang, _)| *lang)
}

fn fcitx_index_for(name: &str) -> Option<i32> {
    FCITX_ENGINES
        .iter()
        .find(|(lang, _)| lang.eq_ignore_ascii_case(name))
        .map(|(_, index)| *index)
}

fn language_for_fcitx_index(index: i32) -> Option<&'static str> {
    FCITX_ENGINES
        .iter()
        .find(|(_, i)| *i == index)
        .map(|(lang, _)| *lang)
}

/// Run a command, returning trimmed stdout when it exits cleanly.
async fn run(cmd: &str, args: &[&str]) -> Option<String> {
    match timeout(COMMAND_TIMEOUT, Command::new(cmd).args(args).output()).await {
        Ok(Ok(output)) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
        }
        Ok(Ok(output)) => {
            debug!(cmd, code = ?output.status.code(), "command exited nonzero");
            None
        }
        Ok(Err(e)) => {
            debug!(cmd, error = %e, "command could not be spawned");
            None
        }
        Err(_) => {
            warn!(cmd, "command timed out");
            None
        }
    }
}

/// [`InputSourceProvider`] backed by the ibus or fcitx CLI.
#[derive(Default)]
pub struct LinuxInputSources {
    framework: OnceCell<ImeFramework>,
}

impl LinuxInputSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Which framework is installed. Probed once, then cached.
    async fn framework(&self) -> ImeFramework {
        *self
            .framework
            .get_or_init(|| async {
                let framework = if run("which", &["ibus"]).await.is_some() {
                    ImeFramework::IBus
                } else if run("which", &["fcitx"]).await.is_some() {
                    ImeFramework::Fcitx
                } else {
                    ImeFramework::None
                };
                debug!(?framework, "input-method framework detected");
                framework
            })
            .await
    }

    async fn current_ibus_source(&self) -> Option<String> {
        let engine = run("ibus", &["engine"]).await?;
        if engine.is_empty() {
            return None;
        }
        // Unknown engines surface raw so rules can still target them.
        Some(
            language_for_ibus_engine(&engine)
                .map(str::to_string)
                .unwrap_or(engine),
        )
    }

    async fn current_fcitx_source(&self) -> Option<String> {
        let raw = run("fcitx-remote", &["-c"]).await?;
        if let Ok(index) = raw.parse::<i32>() {
            if let Some(lang) = language_for_fcitx_index(index) {
                return Some(lang.to_string());
            }
        }
        Some(format!("input source {raw}"))
    }

    async fn available_ibus_sources(&self) -> Vec<String> {
        let Some(listing) = run("ibus", &["list-engine"]).await else {
            return FALLBACK_SOURCES.iter().map(|s| s.to_string()).collect();
        };

        let mut sources = Vec::new();
        for line in listing.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(lang) = language_for_ibus_engine(line) {
                if !sources.iter().any(|s| s == lang) {
                    sources.push(lang.to_string());
                }
            }
        }

        if sources.is_empty() {
            FALLBACK_SOURCES.iter().map(|s| s.to_string()).collect()
        } else {
            sources
        }
    }
}

#[async_trait]
impl InputSourceProvider for LinuxInputSources {
    async fn current_application(&self) -> String {
        if let Some(class) = run("xdotool", &["getactivewindow", "getwindowclassname"]).await {
            if !class.is_empty() {
                return class;
            }
        }

        // Fallback when xdotool is missing or the compositor rejects it.
        if let Some(active) = run("wmctrl", &["-a", ":ACTIVE:", "-v"]).await {
            if !active.is_empty() {
                return active;
            }
        }

        UNKNOWN.to_string()
    }

    async fn current_input_source(&self) -> String {
        let source = match self.framework().await {
            ImeFramework::IBus => self.current_ibus_source().await,
            ImeFramework::Fcitx => self.current_fcitx_source().await,
            ImeFramework::None => None,
        };
        source.unwrap_or_else(|| UNKNOWN.to_string())
    }

    async fn available_input_sources(&self) -> Vec<String> {
        match self.framework().await {
            ImeFramework::IBus => self.available_ibus_sources().await,
            // fcitx has no cheap enumeration; report the mapped set.
            ImeFramework::Fcitx => FCITX_ENGINES
                .iter()
                .map(|(lang, _)| lang.to_string())
                .collect(),
            ImeFramework::None => FALLBACK_SOURCES.iter().map(|s| s.to_string()).collect(),
        }
    }

    async fn switch_to_input_source(&self, name: &str) -> bool {
        match self.framework().await {
            ImeFramework::IBus => match ibus_engine_for(name) {
                Some(engine) => run("ibus", &["engine", engine]).await.is_some(),
                None => {
                    debug!(name, "no ibus engine mapping, cycling instead");
                    self.switch_by_hotkey().await
                }
            },
            ImeFramework::Fcitx => match fcitx_index_for(name) {
                Some(index) => run("fcitx-remote", &["-s", &index.to_string()])
                    .await
                    .is_some(),
                None => {
                    debug!(name, "no fcitx engine mapping, cycling instead");
                    self.switch_by_hotkey().await
                }
            },
            ImeFramework::None => false,
        }
    }

    async fn switch_by_hotkey(&self) -> bool {
        match self.framework().await {
            ImeFramework::IBus => run("xdotool", &["key", "super+space"]).await.is_some(),
            ImeFramework::Fcitx => run("xdotool", &["key", "ctrl+space"]).await.is_some(),
            ImeFramework::None => false,
        }
    }
}
