//! Canonical agent activity events and their mapping to character states.
//!
//! Events arrive as JSON objects, one per line:
//!
//! ```json
//! {"type":"session_start"}
//! {"type":"tool_use","tool":"Edit","message":"src/main.rs"}
//! {"type":"error","message":"tests failed"}
//! ```
//!
//! The feed thread parses them into [`AgentEvent`] and the ECS carries them as
//! messages. The only thing the scene asks of an event is
//! [`event_to_animation_state`].

use bevy_ecs::message::Message;
use serde::{Deserialize, Serialize};

use crate::components::animationstate::AnimationState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SessionStart,
    SessionEnd,
    ToolUse,
    ToolResult,
    Thinking,
    Error,
    TaskComplete,
    Idle,
    Stop,
    UserPrompt,
    #[serde(other)]
    Unknown,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::SessionStart => "session_start",
            EventKind::SessionEnd => "session_end",
            EventKind::ToolUse => "tool_use",
            EventKind::ToolResult => "tool_result",
            EventKind::Thinking => "thinking",
            EventKind::Error => "error",
            EventKind::TaskComplete => "task_complete",
            EventKind::Idle => "idle",
            EventKind::Stop => "stop",
            EventKind::UserPrompt => "user_prompt",
            EventKind::Unknown => "unknown",
        }
    }
}

#[derive(Message, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AgentEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            tool: None,
            message: None,
        }
    }

    pub fn tool_use(tool: impl Into<String>) -> Self {
        Self {
            tool: Some(tool.into()),
            ..Self::new(EventKind::ToolUse)
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Parse one JSON line.
    pub fn from_json(line: &str) -> Result<Self, String> {
        serde_json::from_str(line).map_err(|e| format!("invalid event: {}", e))
    }

    /// Short human-readable description for the status line.
    pub fn describe(&self) -> String {
        let base = match (self.kind, self.tool.as_deref()) {
            (EventKind::ToolUse, Some(tool)) => tool.to_string(),
            (kind, _) => kind.as_str().to_string(),
        };
        match self.message.as_deref() {
            Some(msg) if !msg.is_empty() => format!("{}: {}", base, msg),
            _ => base,
        }
    }
}

/// Tool name to the action it looks like. Case-insensitive.
pub fn tool_to_animation_state(tool: &str) -> AnimationState {
    match tool.trim().to_ascii_lowercase().as_str() {
        "edit" | "write" | "multiedit" | "notebook_edit" | "notebookedit" => {
            AnimationState::Inscribe
        }
        "read" | "grep" | "glob" | "ls" | "web_fetch" | "webfetch" | "web_search" | "websearch" => {
            AnimationState::Read
        }
        "bash" | "shell" | "run" => AnimationState::Forge,
        "task" | "agent" | "todo_write" | "todowrite" => AnimationState::Meditate,
        _ => AnimationState::Meditate,
    }
}

pub fn event_to_animation_state(event: &AgentEvent) -> AnimationState {
    match event.kind {
        EventKind::SessionStart => AnimationState::Enter,
        EventKind::SessionEnd => AnimationState::Exit,
        EventKind::ToolUse => event
            .tool
            .as_deref()
            .map_or(AnimationState::Meditate, tool_to_animation_state),
        EventKind::ToolResult => AnimationState::Idle,
        EventKind::Thinking => AnimationState::Meditate,
        EventKind::Error => AnimationState::Stagger,
        EventKind::TaskComplete => AnimationState::Victory,
        EventKind::Idle | EventKind::Stop => AnimationState::Rest,
        EventKind::UserPrompt => AnimationState::Idle,
        EventKind::Unknown => AnimationState::Idle,
    }
}
