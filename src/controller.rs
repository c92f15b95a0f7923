use tracing::{debug, info, warn};

use crate::chat_log::{ChatLog, MessageId, Origin};
use crate::error::{ChatError, VoiceError};
use crate::history::TaskHistory;
use crate::voice::VoiceState;

pub const WELCOME: &str = "Hello! I'm your Task Management Assistant. I can help you with:\n\
• Creating tasks\n\
• Setting priorities\n\
• Managing deadlines\n\
• Organizing your workflow\n\
\n\
How can I help you today?";

pub const VOICE_UNSUPPORTED: &str = "Voice commands are not supported on this system";
pub const VOICE_FAILED: &str = "Voice recognition failed. Please try again.";

/// Chat state behind the window: input, message log, task history and
/// voice state. Network and speech work happen outside; their results are
/// fed back through [`ChatController::complete`] and
/// [`ChatController::voice_finished`].
#[derive(Debug)]
pub struct ChatController {
    input: String,
    log: ChatLog,
    history: TaskHistory,
    voice: VoiceState,
}

impl ChatController {
    pub fn new(history_max: usize) -> Self {
        ChatController {
            input: String::new(),
            log: ChatLog::new(),
            history: TaskHistory::new(history_max),
            voice: VoiceState::Idle,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, value: String) {
        self.input = value;
    }

    pub fn log(&self) -> &ChatLog {
        &self.log
    }

    pub fn history(&self) -> &TaskHistory {
        &self.history
    }

    pub fn voice_state(&self) -> VoiceState {
        self.voice
    }

    /// Starts a submission. Returns the text to send, or `None` when the
    /// input is blank and nothing happened.
    pub fn submit(&mut self) -> Option<String> {
        let message = self.input.trim().to_string();
        if message.is_empty() {
            return None;
        }
        self.log.add_message(&message, Origin::User);
        self.input.clear();
        self.log.show_loading();
        debug!(pending = self.log.loading_count(), "submitted message");
        Some(message)
    }

    /// Finishes a submission with the backend's result.
    pub fn complete(&mut self, result: Result<String, ChatError>) -> MessageId {
        self.log.remove_loading();
        match result {
            Ok(reply) => self.add_bot_message(&reply),
            Err(e) => self.add_bot_message(&e.user_message()),
        }
    }

    /// Renders a bot message and records it in the task history when it
    /// carries bullets.
    pub fn add_bot_message(&mut self, text: &str) -> MessageId {
        let id = self.log.add_message(text, Origin::Bot);
        self.history.record(text);
        id
    }

    /// Puts `command` into the input without sending it.
    pub fn fill_command(&mut self, command: &str) {
        self.input = command.to_string();
    }

    /// Replays a history entry into the input. Returns `false` for an
    /// unknown index.
    pub fn replay_history(&mut self, index: usize) -> bool {
        match self.history.get(index).map(|entry| entry.command.clone()) {
            Some(command) => {
                self.fill_command(&command);
                true
            }
            None => false,
        }
    }

    /// Returns `true` when the task became completed and should be celebrated.
    pub fn toggle_task(&mut self, message: MessageId, task: usize, checked: bool) -> bool {
        self.log.toggle_task(message, task, checked)
    }

    pub fn voice_started(&mut self) {
        self.voice = VoiceState::Listening;
    }

    pub fn voice_unavailable(&mut self) -> MessageId {
        self.voice = VoiceState::Idle;
        self.add_bot_message(VOICE_UNSUPPORTED)
    }

    /// Applies a recognition result. Returns the id of the message added
    /// for a failure.
    pub fn voice_finished(&mut self, result: Result<String, VoiceError>) -> Option<MessageId> {
        self.voice = VoiceState::Idle;
        match result {
            Ok(transcript) => {
                info!(len = transcript.len(), "voice transcript received");
                self.input = transcript;
                None
            }
            Err(VoiceError::Unsupported) => Some(self.voice_unavailable()),
            Err(e) => {
                warn!(error = %e, "voice recognition failed");
                Some(self.add_bot_message(VOICE_FAILED))
            }
        }
    }
}
