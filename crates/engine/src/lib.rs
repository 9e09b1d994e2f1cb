//! Rule dispatch for keyflow.
//!
//! [`DispatchEngine`] evaluates the stored rules against the current
//! context (foreground app, process, active website) and asks the
//! platform to switch the input source when a rule wins. It is driven by
//! external triggers - the [`DispatchPoller`], the extension bridge, or a
//! hotkey handler - which may run concurrently.

mod dispatch;
mod poller;

pub use dispatch::DispatchEngine;
pub use poller::{DispatchPoller, DEFAULT_POLL_INTERVAL};
