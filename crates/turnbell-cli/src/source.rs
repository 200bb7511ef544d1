//! JSON-lines lifecycle event source.
//!
//! The host runtime writes one [`LifecycleEvent`] per line. Malformed lines
//! and failed notifications are logged and skipped so a single bad event
//! never ends the session.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use turnbell::{HookRegistry, LifecycleEvent};

use crate::error::Result;

/// Counters for one event stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Events delivered to every handler without error
    pub dispatched: usize,
    /// Lines that were not valid lifecycle events
    pub skipped: usize,
    /// Events whose handlers returned an error
    pub failed: usize,
}

/// Reads events from `reader` until EOF and dispatches them to `registry`.
///
/// # Errors
///
/// Returns an error only if reading from `reader` fails.
pub async fn run<R>(reader: R, registry: &HookRegistry) -> Result<StreamStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = StreamStats::default();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event = match serde_json::from_str::<LifecycleEvent>(line) {
            Ok(event) => event,
            Err(e) => {
                warn!("Skipping malformed lifecycle event: {e}");
                stats.skipped += 1;
                continue;
            }
        };

        debug!(event = event.name(), "Received lifecycle event");

        match registry.dispatch(&event).await {
            Ok(()) => stats.dispatched += 1,
            Err(e) => {
                warn!(event = event.name(), "Turn notification failed: {e}");
                stats.failed += 1;
            }
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::anyhow;
    use turnbell::register_turn_completion_hooks;

    use super::*;

    fn counting_registry(fail_first: bool) -> (HookRegistry, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut registry = HookRegistry::new();
        register_turn_completion_hooks(&mut registry, move || {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if fail_first && attempt == 0 {
                    return Err(anyhow!("notifier unavailable"));
                }
                Ok(())
            }
        });
        (registry, calls)
    }

    #[tokio::test]
    async fn test_dispatches_each_line() {
        let input = concat!(
            "{\"type\":\"agent_start\"}\n",
            "\n",
            "{\"type\":\"message_end\",\"message\":{\"role\":\"assistant\",\"stopReason\":\"stop\"}}\n",
            "{\"type\":\"agent_end\"}\n",
        );
        let (registry, calls) = counting_registry(false);

        let stats = run(input.as_bytes(), &registry).await.unwrap();

        assert_eq!(
            stats,
            StreamStats {
                dispatched: 3,
                skipped: 0,
                failed: 0,
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_skips_malformed_lines() {
        let input = "not json\n{\"type\":\"turn_start\"}\n{\"type\":\"agent_start\"}\n{\"type\":\"agent_end\"}";
        let (registry, calls) = counting_registry(false);

        let stats = run(input.as_bytes(), &registry).await.unwrap();

        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.dispatched, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_notification_does_not_stop_stream() {
        let input = concat!(
            "{\"type\":\"agent_start\"}\n",
            "{\"type\":\"message_end\",\"message\":{\"role\":\"assistant\"}}\n",
            "{\"type\":\"agent_end\"}\n",
        );
        let (registry, calls) = counting_registry(true);

        let stats = run(input.as_bytes(), &registry).await.unwrap();

        assert_eq!(stats.failed, 1);
        assert_eq!(stats.dispatched, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
