//! Bounded conversation memory.

use std::collections::VecDeque;

use tabletalk_core::frame::TabularFrame;

// =============================================================================
// BoundedLog
// =============================================================================

/// FIFO log holding at most `capacity` entries. Capacity 0 keeps nothing.
#[derive(Debug, Clone)]
pub struct BoundedLog<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedLog<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest ones beyond capacity.
    pub fn push(&mut self, entry: T) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator + '_ {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&T> {
        self.entries.back()
    }
}

// =============================================================================
// ConversationMemory
// =============================================================================

/// One processed utterance. A failed turn has no frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub utterance: String,
    pub query: Option<String>,
    pub frame: Option<TabularFrame>,
}

/// The last K turns of the conversation.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    turns: BoundedLog<Turn>,
}

impl ConversationMemory {
    pub fn new(max_turns: usize) -> Self {
        Self {
            turns: BoundedLog::new(max_turns),
        }
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> impl DoubleEndedIterator<Item = &Turn> + ExactSizeIterator + '_ {
        self.turns.iter()
    }

    /// Most recent frame that has at least one row and one column.
    pub fn last_frame(&self) -> Option<&TabularFrame> {
        self.turns
            .iter()
            .rev()
            .filter_map(|t| t.frame.as_ref())
            .find(|f| !f.is_empty())
    }
}
