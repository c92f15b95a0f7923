use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tracing::trace;

use crate::formatter::{self, FormattedReply};
use crate::time_format::format_time;

/// How long a new message takes to fade in.
pub const FADE_IN: Duration = Duration::from_millis(300);

pub type MessageId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// User text, shown verbatim.
    Plain,
    Formatted(FormattedReply),
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: MessageId,
    pub origin: Origin,
    pub text: String,
    pub timestamp: DateTime<Local>,
    pub body: Body,
    created: Instant,
}

impl ChatMessage {
    pub fn time_label(&self) -> String {
        format_time(&self.timestamp)
    }

    /// Opacity for the fade-in, from 0.0 to 1.0.
    pub fn opacity(&self, now: Instant) -> f32 {
        let age = now.saturating_duration_since(self.created);
        (age.as_secs_f32() / FADE_IN.as_secs_f32()).min(1.0)
    }

    pub fn is_fading(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created) < FADE_IN
    }
}

/// The scrolling message log plus any loading placeholders.
#[derive(Debug, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
    next_id: MessageId,
    pending: usize,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_message(&mut self, text: &str, origin: Origin) -> MessageId {
        let id = self.next_id;
        self.next_id += 1;
        let body = match origin {
            Origin::User => Body::Plain,
            Origin::Bot => {
                let reply = formatter::format_reply(text);
                trace!(
                    tasks = reply.tasks().count(),
                    markup = %reply.to_markup(),
                    "formatted bot reply"
                );
                Body::Formatted(reply)
            }
        };
        self.messages.push(ChatMessage {
            id,
            origin,
            text: text.to_string(),
            timestamp: Local::now(),
            body,
            created: Instant::now(),
        });
        id
    }

    pub fn show_loading(&mut self) {
        self.pending += 1;
    }

    /// Removes one loading placeholder. Does nothing when none is shown.
    pub fn remove_loading(&mut self) {
        self.pending = self.pending.saturating_sub(1);
    }

    pub fn is_loading(&self) -> bool {
        self.pending > 0
    }

    pub fn loading_count(&self) -> usize {
        self.pending
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn any_fading(&self, now: Instant) -> bool {
        self.messages.iter().rev().any(|m| m.is_fading(now))
    }

    /// Sets the completion of a task in a bot message. Returns `true` only
    /// when the task exists and is now completed.
    pub fn toggle_task(&mut self, message: MessageId, task: usize, checked: bool) -> bool {
        let Some(msg) = self.messages.iter_mut().find(|m| m.id == message) else {
            return false;
        };
        match &mut msg.body {
            Body::Formatted(reply) => reply.set_task_completed(task, checked) && checked,
            Body::Plain => false,
        }
    }
}
