//! Lifecycle hook registration.
//!
//! Agent runtimes expose a subscription surface with one handler per
//! lifecycle event. [`register_turn_completion_hooks`] builds a
//! [`TurnTracker`] and subscribes it to that surface; [`HookRegistry`] is an
//! in-process implementation of the surface for hosts that deliver events
//! themselves.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use log::debug;

use turnbell_common::{LifecycleEvent, MessageEndEvent};

use crate::error::Result;
use crate::tracker::TurnTracker;

/// Future returned by lifecycle handlers
pub type HookFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

/// Handler for events without a payload (`agent_start`, `agent_end`)
pub type SignalHandler = Box<dyn Fn() -> HookFuture + Send + Sync>;

/// Handler for `message_end`
pub type MessageEndHandler = Box<dyn Fn(MessageEndEvent) -> HookFuture + Send + Sync>;

/// A handler bound to the lifecycle event it subscribes to.
pub enum LifecycleHandler {
    AgentStart(SignalHandler),
    MessageEnd(MessageEndHandler),
    AgentEnd(SignalHandler),
}

impl LifecycleHandler {
    /// Returns the wire name of the subscribed event.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::AgentStart(_) => "agent_start",
            Self::MessageEnd(_) => "message_end",
            Self::AgentEnd(_) => "agent_end",
        }
    }
}

impl fmt::Debug for LifecycleHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LifecycleHandler")
            .field(&self.event_name())
            .finish()
    }
}

/// Subscription surface of an agent runtime.
pub trait LifecycleEvents {
    /// Subscribes `handler` to its event.
    fn on(&mut self, handler: LifecycleHandler);
}

/// Subscribes an existing tracker to `api`, one handler per event.
pub fn subscribe_tracker<A>(api: &mut A, tracker: &Arc<TurnTracker>)
where
    A: LifecycleEvents + ?Sized,
{
    let start = Arc::clone(tracker);
    api.on(LifecycleHandler::AgentStart(Box::new(move || {
        let tracker = Arc::clone(&start);
        Box::pin(async move {
            tracker.on_agent_start();
            Ok(())
        })
    })));

    let message_end = Arc::clone(tracker);
    api.on(LifecycleHandler::MessageEnd(Box::new(move |event| {
        let tracker = Arc::clone(&message_end);
        Box::pin(async move { tracker.on_message_end(&event).await })
    })));

    let end = Arc::clone(tracker);
    api.on(LifecycleHandler::AgentEnd(Box::new(move || {
        let tracker = Arc::clone(&end);
        Box::pin(async move { tracker.on_agent_end().await })
    })));
}

/// Creates a tracker for `on_turn_complete` and subscribes it to `api`.
///
/// Returns the tracker so the host can inspect the turn state.
pub fn register_turn_completion_hooks<A, F, Fut>(api: &mut A, on_turn_complete: F) -> Arc<TurnTracker>
where
    A: LifecycleEvents + ?Sized,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let tracker = Arc::new(TurnTracker::from_fn(on_turn_complete));
    subscribe_tracker(api, &tracker);
    tracker
}

/// In-process lifecycle event bus.
///
/// Handlers run sequentially in registration order.
#[derive(Default)]
pub struct HookRegistry {
    agent_start: Vec<SignalHandler>,
    message_end: Vec<MessageEndHandler>,
    agent_end: Vec<SignalHandler>,
}

impl HookRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of registered handlers across all events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agent_start.len() + self.message_end.len() + self.agent_end.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs every handler subscribed to `event`.
    ///
    /// # Errors
    ///
    /// Returns the first handler error; later handlers for the same event
    /// are not run.
    pub async fn dispatch(&self, event: &LifecycleEvent) -> Result<()> {
        debug!("Dispatching {}", event.name());

        match event {
            LifecycleEvent::AgentStart => {
                for handler in &self.agent_start {
                    handler().await?;
                }
            }
            LifecycleEvent::MessageEnd(payload) => {
                for handler in &self.message_end {
                    handler(payload.clone()).await?;
                }
            }
            LifecycleEvent::AgentEnd => {
                for handler in &self.agent_end {
                    handler().await?;
                }
            }
        }

        Ok(())
    }
}

impl LifecycleEvents for HookRegistry {
    fn on(&mut self, handler: LifecycleHandler) {
        debug!("Registering {} handler", handler.event_name());

        match handler {
            LifecycleHandler::AgentStart(handler) => self.agent_start.push(handler),
            LifecycleHandler::MessageEnd(handler) => self.message_end.push(handler),
            LifecycleHandler::AgentEnd(handler) => self.agent_end.push(handler),
        }
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("agent_start", &self.agent_start.len())
            .field("message_end", &self.message_end.len())
            .field("agent_end", &self.agent_end.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::anyhow;
    use turnbell_common::CompletionMessage;

    use super::*;

    /// Records which events were subscribed, like a host runtime would.
    #[derive(Default)]
    struct RecordingApi {
        subscribed: Vec<&'static str>,
    }

    impl LifecycleEvents for RecordingApi {
        fn on(&mut self, handler: LifecycleHandler) {
            self.subscribed.push(handler.event_name());
        }
    }

    fn message_end(stop_reason: &str) -> LifecycleEvent {
        LifecycleEvent::MessageEnd(CompletionMessage::assistant(stop_reason).into())
    }

    #[test]
    fn test_subscribes_each_event_once() {
        let mut api = RecordingApi::default();
        let _tracker = register_turn_completion_hooks(&mut api, || async { Ok(()) });

        assert_eq!(api.subscribed, vec!["agent_start", "message_end", "agent_end"]);
    }

    #[tokio::test]
    async fn test_wires_handlers_to_lifecycle_events() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut registry = HookRegistry::new();
        let tracker = register_turn_completion_hooks(&mut registry, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        });
        assert_eq!(registry.len(), 3);

        registry.dispatch(&LifecycleEvent::AgentStart).await.unwrap();
        registry.dispatch(&message_end("stop")).await.unwrap();
        registry.dispatch(&LifecycleEvent::AgentEnd).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(tracker.is_notified());
    }

    #[tokio::test]
    async fn test_failed_message_end_retried_by_agent_end() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut registry = HookRegistry::new();
        register_turn_completion_hooks(&mut registry, move || {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(anyhow!("notifier unavailable"))
                } else {
                    Ok(())
                }
            }
        });

        registry.dispatch(&LifecycleEvent::AgentStart).await.unwrap();
        let err = registry.dispatch(&message_end("stop")).await.unwrap_err();
        assert!(err.to_string().contains("notifier unavailable"));

        registry.dispatch(&LifecycleEvent::AgentEnd).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_dispatch_without_handlers() {
        let registry = HookRegistry::new();

        assert!(registry.is_empty());
        registry.dispatch(&LifecycleEvent::AgentEnd).await.unwrap();
    }

    #[tokio::test]
    async fn test_shared_tracker_across_registries() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let tracker = Arc::new(TurnTracker::from_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        }));

        let mut first = HookRegistry::new();
        let mut second = HookRegistry::new();
        subscribe_tracker(&mut first, &tracker);
        subscribe_tracker(&mut second, &tracker);

        first.dispatch(&LifecycleEvent::AgentStart).await.unwrap();
        first.dispatch(&LifecycleEvent::AgentEnd).await.unwrap();
        second.dispatch(&LifecycleEvent::AgentEnd).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
