use std::collections::VecDeque;

use tracing::debug;

const LABEL_MAX_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// First line of the reply, shortened for display.
    pub label: String,
    /// Full first line, replayed into the input when selected.
    pub command: String,
}

impl HistoryEntry {
    fn from_reply(reply: &str) -> Self {
        let first_line = reply.split('\n').next().unwrap_or_default();
        let mut label: String = first_line.chars().take(LABEL_MAX_CHARS).collect();
        if first_line.chars().count() > LABEL_MAX_CHARS {
            label.push_str("...");
        }
        HistoryEntry {
            label,
            command: first_line.to_string(),
        }
    }
}

/// Most recent task-like bot replies, newest first.
#[derive(Debug, Clone)]
pub struct TaskHistory {
    entries: VecDeque<HistoryEntry>,
    max_items: usize,
}

impl TaskHistory {
    pub fn new(max_items: usize) -> Self {
        TaskHistory {
            entries: VecDeque::new(),
            max_items,
        }
    }

    /// Records `reply` if it contains a bullet. Returns whether it was recorded.
    pub fn record(&mut self, reply: &str) -> bool {
        if !reply.contains('•') {
            return false;
        }
        let entry = HistoryEntry::from_reply(reply);
        debug!(label = %entry.label, "recording task history entry");
        self.entries.push_front(entry);
        while self.entries.len() > self.max_items {
            self.entries.pop_back();
        }
        true
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
