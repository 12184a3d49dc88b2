use std::collections::HashSet;

use crate::api::models::{Message, MessageId};
use crate::utils::format_time;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRow {
    pub key: MessageId,
    pub text: String,
    pub time: String,
    pub direction: Direction,
}

/// Messages of the open conversation in display order.
///
/// Between two calls to [`Thread::replace`] the thread only grows: messages
/// are appended once, keyed by id, and never removed or reordered. `epoch`
/// changes on every replace so a renderer knows when to start over.
#[derive(Debug, Default)]
pub struct Thread {
    messages: Vec<Message>,
    seen: HashSet<MessageId>,
    epoch: u64,
}

impl Thread {
    pub fn replace(&mut self, messages: Vec<Message>) {
        self.messages.clear();
        self.seen.clear();
        self.epoch += 1;
        self.append_new(messages);
    }

    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }

    /// Append the messages whose id is not shown yet. Returns how many were
    /// appended.
    pub fn append_new<I>(&mut self, messages: I) -> usize
    where
        I: IntoIterator<Item = Message>,
    {
        let before = self.messages.len();
        for message in messages {
            if self.seen.insert(message.id) {
                self.messages.push(message);
            }
        }
        self.messages.len() - before
    }

    pub fn push(&mut self, message: Message) {
        self.append_new(std::iter::once(message));
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn rows(&self, contact_name: &str) -> Vec<MessageRow> {
        self.messages
            .iter()
            .map(|m| MessageRow {
                key: m.id,
                text: m.message.clone(),
                time: format_time(m.created_at.as_deref()),
                direction: if m.sender_name == contact_name {
                    Direction::Received
                } else {
                    Direction::Sent
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(thread: &Thread) -> Vec<MessageId> {
        thread.messages.iter().map(|m| m.id).collect()
    }

    fn msg(id: i64, sender: &str) -> Message {
        Message {
            id,
            sender_name: sender.to_string(),
            message: format!("message {id}"),
            created_at: None,
            status: None,
        }
    }

    #[test]
    fn append_skips_known_ids_and_keeps_order() {
        let mut thread = Thread::default();
        thread.replace(vec![msg(1, "Alice"), msg(2, "Me")]);
        let appended = thread.append_new(vec![msg(2, "Me"), msg(1, "Alice"), msg(3, "Alice")]);
        assert_eq!(appended, 1);
        assert_eq!(ids(&thread), vec![1, 2, 3]);
    }

    #[test]
    fn append_never_drops_messages_missing_from_response() {
        let mut thread = Thread::default();
        thread.replace(vec![msg(1, "Alice"), msg(2, "Me")]);
        assert_eq!(thread.append_new(vec![msg(3, "Alice")]), 1);
        assert_eq!(ids(&thread), vec![1, 2, 3]);
    }

    #[test]
    fn replace_bumps_epoch() {
        let mut thread = Thread::default();
        let start = thread.epoch();
        thread.replace(vec![msg(1, "Alice")]);
        assert_eq!(thread.epoch(), start + 1);
        thread.push(msg(1, "Alice"));
        assert_eq!(ids(&thread), vec![1]);
        assert_eq!(thread.epoch(), start + 1);
        thread.clear();
        assert!(ids(&thread).is_empty());
        assert_eq!(thread.epoch(), start + 2);
    }

    #[test]
    fn direction_follows_contact_name() {
        let mut thread = Thread::default();
        thread.replace(vec![msg(1, "Alice"), msg(2, "Me")]);
        let rows = thread.rows("Alice");
        assert_eq!(rows[0].direction, Direction::Received);
        assert_eq!(rows[1].direction, Direction::Sent);
        assert_eq!(rows[1].time, "");
    }
}
