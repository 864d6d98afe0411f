//! Tracing initialization.
//!
//! Gated behind the `RILL_LOG` environment variable so normal runs stay
//! silent. `RILL_LOG=debug rill repl` gets the tree-formatted spans.

use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::EnvFilter;

/// Initialize tracing from `RILL_LOG`, if set.
///
/// Does nothing when the variable is absent; logging must never change
/// the CLI's observable output by default.
pub fn init() {
    let Ok(filter) = std::env::var("RILL_LOG") else {
        return;
    };
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let tree = tracing_tree::HierarchicalLayer::new(2)
        .with_targets(true)
        .with_bracketed_fields(true);
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tree)
        .try_init();
}
