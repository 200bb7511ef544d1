//! Turn completion tracking.
//!
//! A [`TurnTracker`] collapses the `message_end` and `agent_end` signals of a
//! turn into a single invocation of the completion callback. Triggers that
//! arrive while the callback is running join the same in-flight invocation
//! and observe its outcome instead of starting a second one.
//!
//! ## Turn states
//!
//! - `Idle`: no notification yet in this turn
//! - `Pending`: one callback invocation is running
//! - `Completed`: the callback succeeded; later triggers are no-ops
//!
//! `agent_start` moves any state back to `Idle`. A failed invocation also
//! returns to `Idle`, so the next trigger in the same turn retries.
//!
//! A started callback runs on its own Tokio task, so triggers must be awaited
//! inside a Tokio runtime. Dropping every awaiting caller, or starting a new
//! turn, only drops handles to the outcome; the callback always finishes.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::anyhow;
use futures::FutureExt;
use futures::future::Shared;
use log::{debug, warn};
use tokio::sync::oneshot;

use turnbell_common::{CompletionMessage, LifecycleEvent, MessageEndEvent};

use crate::error::{Result, TrackerError};

/// Type alias for async turn completion callbacks
pub type CompletionCallback =
    Box<dyn Fn() -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>> + Send + Sync>;

type InFlight = Shared<Pin<Box<dyn Future<Output = Result<()>> + Send>>>;

/// Returns true when a finished message should complete the turn.
///
/// See [`CompletionMessage::should_notify`].
#[must_use]
pub fn should_notify(message: &CompletionMessage) -> bool {
    message.should_notify()
}

/// Notification state of the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// No successful notification yet
    Idle,
    /// A callback invocation is running
    Pending,
    /// The callback succeeded for this turn
    Completed,
}

#[derive(Default)]
struct TrackerState {
    /// Generation of the current turn, bumped by every `agent_start`
    turn: u64,
    notified: bool,
    in_flight: Option<InFlight>,
}

/// Invokes a completion callback at most once per agent turn.
///
/// State is owned by the instance, so one tracker per agent session keeps
/// sessions independent. The tracker is `Send + Sync` and is usually shared
/// behind an [`Arc`] by the hook handlers that drive it.
pub struct TurnTracker {
    on_turn_complete: Arc<CompletionCallback>,
    // Never locked across an await or while the callback runs.
    state: Arc<Mutex<TrackerState>>,
}

impl TurnTracker {
    /// Creates a tracker that calls `on_turn_complete` once per turn.
    #[must_use]
    pub fn new(on_turn_complete: CompletionCallback) -> Self {
        Self {
            on_turn_complete: Arc::new(on_turn_complete),
            state: Arc::new(Mutex::new(TrackerState::default())),
        }
    }

    /// Creates a tracker from any closure returning a `Send` future.
    #[must_use]
    pub fn from_fn<F, Fut>(on_turn_complete: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::new(Box::new(move || Box::pin(on_turn_complete())))
    }

    /// Starts a new turn.
    ///
    /// Resets the notified flag and forgets any in-flight invocation. The
    /// previous invocation keeps running and its callers still receive its
    /// outcome, but it no longer affects this tracker's state.
    pub fn on_agent_start(&self) {
        let (turn, stale) = {
            let mut state = self.lock_state();
            state.turn = state.turn.wrapping_add(1);
            state.notified = false;
            (state.turn, state.in_flight.take())
        };

        if stale.is_some() {
            debug!("Turn {turn} started while a previous notification was still in flight");
        }
    }

    /// Handles a `message_end` signal.
    ///
    /// Triggers the notification only for completed assistant messages.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Callback`] if the completion callback fails.
    pub async fn on_message_end(&self, event: &MessageEndEvent) -> Result<()> {
        if !should_notify(&event.message) {
            return Ok(());
        }

        self.trigger_notify().await
    }

    /// Handles an `agent_end` signal.
    ///
    /// Always triggers, which covers turns that ended on a tool call or
    /// without any qualifying assistant message.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Callback`] if the completion callback fails.
    pub async fn on_agent_end(&self) -> Result<()> {
        self.trigger_notify().await
    }

    /// Routes a lifecycle event to the matching handler.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Callback`] if the completion callback fails.
    pub async fn on_event(&self, event: &LifecycleEvent) -> Result<()> {
        match event {
            LifecycleEvent::AgentStart => {
                self.on_agent_start();
                Ok(())
            }
            LifecycleEvent::MessageEnd(event) => self.on_message_end(event).await,
            LifecycleEvent::AgentEnd => self.on_agent_end().await,
        }
    }

    /// Returns true once the callback has succeeded for the current turn.
    #[must_use]
    pub fn is_notified(&self) -> bool {
        self.lock_state().notified
    }

    /// Returns the notification state of the current turn.
    #[must_use]
    pub fn phase(&self) -> TurnPhase {
        let state = self.lock_state();
        if state.notified {
            TurnPhase::Completed
        } else if state.in_flight.is_some() {
            TurnPhase::Pending
        } else {
            TurnPhase::Idle
        }
    }

    async fn trigger_notify(&self) -> Result<()> {
        let (in_flight, started) = {
            let mut state = self.lock_state();

            if state.notified {
                debug!("Turn {} already notified, skipping", state.turn);
                return Ok(());
            }

            if let Some(in_flight) = &state.in_flight {
                debug!("Joining in-flight notification for turn {}", state.turn);
                (in_flight.clone(), None)
            } else {
                debug!("Starting notification for turn {}", state.turn);
                let (sender, receiver) = oneshot::channel();
                let in_flight = outcome(receiver);
                state.in_flight = Some(in_flight.clone());
                (in_flight, Some((state.turn, sender)))
            }
        };

        if let Some((turn, sender)) = started {
            self.start_notification(turn, sender);
        }

        in_flight.await
    }

    /// Invokes the callback for `turn` and drives it on a spawned task.
    ///
    /// Bookkeeping runs on that task before the outcome is published, so it
    /// happens exactly once whether or not anyone is still awaiting.
    fn start_notification(&self, turn: u64, sender: oneshot::Sender<Result<()>>) {
        let operation = (self.on_turn_complete)();
        let state = Arc::clone(&self.state);

        tokio::spawn(async move {
            let result = AssertUnwindSafe(operation)
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(anyhow!("Completion callback panicked")))
                .map_err(TrackerError::from);

            {
                let mut state = lock(&state);
                if state.turn == turn {
                    if result.is_ok() {
                        state.notified = true;
                    }
                    state.in_flight = None;
                } else {
                    debug!(
                        "Notification for turn {turn} finished after turn {} started",
                        state.turn
                    );
                }
            }

            if let Err(Err(e)) = sender.send(result) {
                warn!("Notification for turn {turn} failed with no caller waiting: {e}");
            }
        });
    }

    fn lock_state(&self) -> MutexGuard<'_, TrackerState> {
        lock(&self.state)
    }
}

/// Shared view of the outcome published by a notification task.
fn outcome(receiver: oneshot::Receiver<Result<()>>) -> InFlight {
    let outcome: Pin<Box<dyn Future<Output = Result<()>> + Send>> = Box::pin(async move {
        receiver
            .await
            .unwrap_or_else(|_| Err(TrackerError::Interrupted))
    });
    outcome.shared()
}

fn lock(state: &Mutex<TrackerState>) -> MutexGuard<'_, TrackerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
