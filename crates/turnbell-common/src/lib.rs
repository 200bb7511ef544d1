//! # turnbell-common
//!
//! Lifecycle event types shared by the turnbell crates.
//!
//! An agent runtime reports each turn through three signals: `agent_start`,
//! `message_end` and `agent_end`. This crate models those signals and the
//! small slice of the assistant message (role and stop reason) that the
//! completion tracker needs.
//!
//! ## Example
//!
//! ```
//! use turnbell_common::{CompletionMessage, LifecycleEvent};
//!
//! let line = r#"{"type":"message_end","message":{"role":"assistant","stopReason":"stop"}}"#;
//! let event: LifecycleEvent = serde_json::from_str(line).unwrap();
//!
//! assert_eq!(event.name(), "message_end");
//! assert!(CompletionMessage::assistant("stop").should_notify());
//! ```

/// Lifecycle events and completion message views.
///
/// Provides the serde wire format consumed from the host runtime.
pub mod events;

pub use events::{CompletionMessage, LifecycleEvent, MessageEndEvent, NON_COMPLETION_STOP_REASONS};
