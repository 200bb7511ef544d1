//! # turnbell
//!
//! Once-per-turn completion notifications for LLM agent runtimes.
//!
//! An agent turn can end in several ways: a final assistant message, a tool
//! call followed by `agent_end`, or both in quick succession. Turnbell folds
//! these signals into exactly one call of a completion callback per turn, and
//! cleans up the text that ends up in the resulting notification.
//!
//! ## Quick Start
//!
//! ```rust
//! use turnbell::{HookRegistry, LifecycleEvent, register_turn_completion_hooks};
//! use turnbell::{CompletionMessage, sanitize_notification_text};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut hooks = HookRegistry::new();
//! let tracker = register_turn_completion_hooks(&mut hooks, || async {
//!     let body = sanitize_notification_text("Turn\ncomplete;", "Done", 80);
//!     println!("{body}");
//!     Ok(())
//! });
//!
//! hooks.dispatch(&LifecycleEvent::AgentStart).await?;
//! hooks
//!     .dispatch(&LifecycleEvent::MessageEnd(CompletionMessage::assistant("stop").into()))
//!     .await?;
//! hooks.dispatch(&LifecycleEvent::AgentEnd).await?;
//!
//! assert!(tracker.is_notified());
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Turn tracking**: at most one callback invocation per turn, with racing
//!   triggers sharing the in-flight invocation
//! - **Retry on failure**: a failed callback leaves the turn open for the next trigger
//! - **Sanitization**: control/format characters and `;` stripped, whitespace
//!   collapsed, length bounded

pub mod error;
pub mod hooks;
pub mod sanitize;
pub mod tracker;

pub use turnbell_common::*;

pub use error::TrackerError;
pub use hooks::{
    HookFuture, HookRegistry, LifecycleEvents, LifecycleHandler, register_turn_completion_hooks,
    subscribe_tracker,
};
pub use sanitize::{sanitize_notification_text, truncate_text};
pub use tracker::{CompletionCallback, TurnPhase, TurnTracker, should_notify};
