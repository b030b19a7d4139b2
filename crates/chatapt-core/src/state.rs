//! Observable conversation state

use crate::message::Message;

/// Request phase of the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// No request in flight; `error` holds the last failure, if any
    Idle { error: Option<String> },
    /// A generation request is in flight
    Loading,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Idle { error: None }
    }
}

/// Everything a presentation layer needs to render the chat
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationState {
    /// Persisted log, ascending `id`
    pub messages: Vec<Message>,
    /// Unsent input text
    pub input: String,
    /// Canned prompts offered to the user
    pub templates: Vec<String>,
    pub phase: Phase,
}

impl ConversationState {
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading)
    }

    /// Error from the most recent failed send
    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            Phase::Idle { error } => error.as_deref(),
            Phase::Loading => None,
        }
    }

    /// Whether a send would be accepted right now
    pub fn can_send(&self) -> bool {
        !self.is_loading() && !self.input.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle_without_error() {
        let state = ConversationState::default();
        assert_eq!(state.phase, Phase::Idle { error: None });
        assert!(!state.is_loading());
        assert_eq!(state.error(), None);
    }

    #[test]
    fn test_can_send() {
        let mut state = ConversationState {
            input: "  ".into(),
            ..Default::default()
        };
        assert!(!state.can_send());

        state.input = "Hi".into();
        assert!(state.can_send());

        state.phase = Phase::Loading;
        assert!(!state.can_send());
    }

    #[test]
    fn test_error_accessor() {
        let state = ConversationState {
            phase: Phase::Idle {
                error: Some("API error (500): Internal Server Error".into()),
            },
            ..Default::default()
        };
        assert_eq!(state.error(), Some("API error (500): Internal Server Error"));
    }
}
