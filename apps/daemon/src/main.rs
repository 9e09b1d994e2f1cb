//! keyflow daemon.
//!
//! Wires the rule store, dispatch engine, poller, config watcher and
//! browser bridge together and runs until interrupted.

use anyhow::Result;
use clap::Parser;
use keyflow_bridge::{UrlReceiver, DEFAULT_BRIDGE_ADDR};
use keyflow_config::{default_config_path, load_rules, save_rules, seed_rules, RuleFileWatcher};
use keyflow_engine::{DispatchEngine, DispatchPoller};
use keyflow_platform::{
    BrowserContextRef, InputSourceProviderRef, PlatformInputSources, ProcessScanBrowserContext,
};
use keyflow_rules::RuleStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "keyflow")]
#[command(about = "Switches the input source to follow the foreground app, process or website")]
struct Args {
    /// Rule file path (defaults to the per-user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dispatch poll interval in milliseconds
    #[arg(long, default_value_t = 1200)]
    interval_ms: u64,

    /// Listen address for the browser-extension bridge
    #[arg(long, default_value = DEFAULT_BRIDGE_ADDR)]
    bridge_addr: String,

    /// Disable the browser-extension bridge
    #[arg(long)]
    no_bridge: bool,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    info!("keyflow v{}", env!("CARGO_PKG_VERSION"));

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };

    let mut rules = load_rules(&config_path);
    if rules.is_empty() && !config_path.exists() {
        rules = seed_rules();
        if let Err(e) = save_rules(&config_path, &rules) {
            warn!(error = %e, "could not write seed rule file");
        }
        info!(count = rules.len(), "seeded default rules");
    }

    let store = Arc::new(RuleStore::new());
    store.replace_all(rules);
    info!(
        count = store.len(),
        path = %config_path.display(),
        "rules loaded"
    );

    let input_sources: InputSourceProviderRef = Arc::new(PlatformInputSources::new());
    let browser: BrowserContextRef = Arc::new(ProcessScanBrowserContext::new());
    let engine = Arc::new(DispatchEngine::new(store.clone(), input_sources, browser));

    // Hot-reload on rule file edits.
    let reload_store = store.clone();
    let _watcher = match RuleFileWatcher::new(
        &config_path,
        Arc::new(move |rules| {
            info!(count = rules.len(), "rule file changed, reloading");
            reload_store.replace_all(rules);
        }),
    ) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            warn!(error = %e, "rule file watching disabled");
            None
        }
    };

    let mut poller = DispatchPoller::new();
    poller.start_with_interval(engine.clone(), Duration::from_millis(args.interval_ms));

    if !args.no_bridge {
        let bridge_engine = engine.clone();
        let receiver = UrlReceiver::new(Arc::new(move |domain| {
            let engine = bridge_engine.clone();
            Box::pin(async move { engine.dispatch_website(&domain).await })
        }));

        let addr = args.bridge_addr.clone();
        tokio::spawn(async move {
            if let Err(e) = receiver.serve(&addr).await {
                error!(error = %e, "url receiver stopped");
            }
        });
    }

    signal::ctrl_c().await?;
    info!("shutting down");
    poller.stop();

    Ok(())
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    Ok(())
}
