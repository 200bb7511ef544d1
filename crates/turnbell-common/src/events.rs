//! Lifecycle event types for turn tracking.
//!
//! The host runtime emits one `agent_start` per turn, any number of
//! `message_end` events, and a final `agent_end`. Only the role and stop
//! reason of a finished message matter here; any other message fields are
//! ignored on deserialization.

use serde::{Deserialize, Serialize};

/// Stop reasons that mean the turn is not a successful completion.
///
/// `toolUse` continues the turn with tool execution, while `error` and
/// `aborted` end it without a usable answer.
pub const NON_COMPLETION_STOP_REASONS: [&str; 3] = ["toolUse", "error", "aborted"];

/// View of the last assistant message in a turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionMessage {
    /// Message author role (e.g. "assistant", "user")
    pub role: Option<String>,

    /// Why generation ended (e.g. "stop", "toolUse")
    pub stop_reason: Option<String>,
}

impl CompletionMessage {
    /// Creates an assistant message view with the given stop reason.
    #[must_use]
    pub fn assistant(stop_reason: impl Into<String>) -> Self {
        Self {
            role: Some("assistant".to_string()),
            stop_reason: Some(stop_reason.into()),
        }
    }

    /// Sets the role.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Sets the stop reason.
    #[must_use]
    pub fn with_stop_reason(mut self, stop_reason: impl Into<String>) -> Self {
        self.stop_reason = Some(stop_reason.into());
        self
    }

    /// Returns true when this message marks a completed assistant turn.
    ///
    /// The role must be `assistant` and the stop reason, when present, must
    /// not be one of [`NON_COMPLETION_STOP_REASONS`].
    #[must_use]
    pub fn should_notify(&self) -> bool {
        if self.role.as_deref() != Some("assistant") {
            return false;
        }

        self.stop_reason
            .as_deref()
            .is_none_or(|reason| !NON_COMPLETION_STOP_REASONS.contains(&reason))
    }
}

/// Payload of a `message_end` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEndEvent {
    /// The message that just finished
    pub message: CompletionMessage,
}

impl From<CompletionMessage> for MessageEndEvent {
    fn from(message: CompletionMessage) -> Self {
        Self { message }
    }
}

/// A lifecycle signal from the agent runtime.
///
/// Serialized as a JSON object tagged by `type`:
///
/// ```json
/// {"type":"agent_start"}
/// {"type":"message_end","message":{"role":"assistant","stopReason":"stop"}}
/// {"type":"agent_end"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// A new turn began.
    AgentStart,

    /// A message finished streaming.
    MessageEnd(MessageEndEvent),

    /// The agent finished the turn.
    AgentEnd,
}

impl LifecycleEvent {
    /// Returns the wire name of this event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AgentStart => "agent_start",
            Self::MessageEnd(_) => "message_end",
            Self::AgentEnd => "agent_end",
        }
    }
}
