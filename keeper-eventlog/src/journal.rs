use std::collections::{HashMap, VecDeque};

use poise::serenity_prelude as serenity;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentRef {
    pub filename: String,
    pub url: String,
}

/// The parts of a message the log embeds need once the original is gone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageSnapshot {
    pub message_id: u64,
    pub guild_id: Option<u64>,
    pub channel_id: u64,
    pub author_id: u64,
    pub author_bot: bool,
    pub author_avatar: Option<String>,
    pub content: String,
    pub attachments: Vec<AttachmentRef>,
}

impl MessageSnapshot {
    pub fn from_message(message: &serenity::Message) -> Self {
        Self {
            message_id: message.id.get(),
            guild_id: message.guild_id.map(|id| id.get()),
            channel_id: message.channel_id.get(),
            author_id: message.author.id.get(),
            author_bot: message.author.bot,
            author_avatar: Some(message.author.face()),
            content: message.content.clone(),
            attachments: message
                .attachments
                .iter()
                .map(|attachment| AttachmentRef {
                    filename: attachment.filename.clone(),
                    url: attachment.url.clone(),
                })
                .collect(),
        }
    }
}

/// Bounded record of recent messages, oldest evicted first.
///
/// Edits and deletes only carry ids, so the before/after and deleted
/// content shown in the logs comes from here.
#[derive(Debug)]
pub struct MessageJournal {
    capacity: usize,
    order: VecDeque<u64>,
    messages: HashMap<u64, MessageSnapshot>,
}

impl MessageJournal {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity.min(1_024)),
            messages: HashMap::with_capacity(capacity.min(1_024)),
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn record(&mut self, snapshot: MessageSnapshot) {
        if self.capacity == 0 {
            return;
        }

        let message_id = snapshot.message_id;
        if self.messages.insert(message_id, snapshot).is_some() {
            return;
        }

        self.order.push_back(message_id);
        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.messages.remove(&evicted);
            }
        }
    }

    pub fn get(&self, message_id: u64) -> Option<&MessageSnapshot> {
        self.messages.get(&message_id)
    }

    /// Replace the stored content and return the version that was replaced.
    pub fn apply_edit(
        &mut self,
        message_id: u64,
        content: Option<&str>,
        attachments: Option<Vec<AttachmentRef>>,
    ) -> Option<MessageSnapshot> {
        let stored = self.messages.get_mut(&message_id)?;
        let before = stored.clone();

        if let Some(content) = content {
            stored.content = content.to_owned();
        }
        if let Some(attachments) = attachments {
            stored.attachments = attachments;
        }

        Some(before)
    }

    pub fn remove(&mut self, message_id: u64) -> Option<MessageSnapshot> {
        let removed = self.messages.remove(&message_id)?;
        self.order.retain(|id| *id != message_id);
        Some(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::{MessageJournal, MessageSnapshot};

    fn snapshot(message_id: u64, content: &str) -> MessageSnapshot {
        MessageSnapshot {
            message_id,
            guild_id: Some(1),
            channel_id: 2,
            author_id: 3,
            author_bot: false,
            author_avatar: None,
            content: content.to_owned(),
            attachments: Vec::new(),
        }
    }

    #[test]
    fn evicts_oldest_first() {
        let mut journal = MessageJournal::new(2);
        journal.record(snapshot(1, "a"));
        journal.record(snapshot(2, "b"));
        journal.record(snapshot(3, "c"));

        assert_eq!(journal.len(), 2);
        assert!(journal.get(1).is_none());
        assert_eq!(journal.get(3).map(|m| m.content.as_str()), Some("c"));
    }

    #[test]
    fn edits_return_previous_version() {
        let mut journal = MessageJournal::new(4);
        journal.record(snapshot(1, "before"));

        let before = journal.apply_edit(1, Some("after"), None).unwrap();
        assert_eq!(before.content, "before");
        assert_eq!(journal.get(1).unwrap().content, "after");
        assert!(journal.apply_edit(9, Some("x"), None).is_none());
    }

    #[test]
    fn removal_frees_the_slot() {
        let mut journal = MessageJournal::new(1);
        journal.record(snapshot(1, "a"));

        assert_eq!(journal.remove(1).unwrap().content, "a");
        assert!(journal.is_empty());

        journal.record(snapshot(2, "b"));
        assert_eq!(journal.len(), 1);
    }

    #[test]
    fn zero_capacity_records_nothing() {
        let mut journal = MessageJournal::new(0);
        journal.record(snapshot(1, "a"));
        assert!(journal.is_empty());
    }
}
