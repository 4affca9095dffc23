//! Conversation-related types.

use std::fmt::{self, Display, Formatter};

/// Number of turns read back when composing a follow-up prompt.
pub const HISTORY_WINDOW: usize = 4;

/// Who authored a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// The person at the keyboard.
    User,
    /// The model.
    Assistant,
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Assistant => f.write_str("assistant"),
        }
    }
}

/// One message of a conversation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
    /// Creates a user turn.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates an assistant turn.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Returns the author of this turn.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the content of this turn.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl Display for Turn {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.role, self.content)
    }
}

/// Represents a conversation, an append-only log of turns.
///
/// The log grows for the whole session. Earlier turns are never removed
/// or reordered, readers only look at the tail.
#[derive(Clone, Default, Debug)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    /// Adds a turn at the end.
    #[inline]
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Returns the last `n` turns in their original order, or all of them
    /// if there are fewer.
    #[inline]
    pub fn recent(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    /// Returns the number of turns.
    #[inline]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns `true` if nothing has been said yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Iterates the turns from oldest to newest.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }
}
