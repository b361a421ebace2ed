//! Message buffer of one open chat.
//!
//! Outgoing messages appear immediately with a local key and `Sending`
//! status, then flip to `Success` (taking the server id) or `Failed`.
//! When the realtime echo of a confirmed message arrives it is merged into
//! the existing entry instead of being shown twice.

use chrono::Utc;
use log::{debug, warn};
use uuid::Uuid;

use crate::client::services::chat_service::{ChatService, DEFAULT_PAGE_SIZE};
use crate::common::chat::{ChatId, ChatType, Message, MessageType, SendMessageRequest, SendStatus};
use crate::common::envelope::ApiResult;
use crate::common::models::UserId;

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Set for messages sent from this client.
    pub local_key: Option<Uuid>,
    pub message: Message,
}

#[derive(Debug, Clone)]
pub struct Conversation {
    chat_id: ChatId,
    self_id: UserId,
    self_name: String,
    entries: Vec<Entry>,
    next_page: u32,
    exhausted: bool,
}

impl Conversation {
    pub fn new(chat_id: ChatId, self_id: UserId, self_name: impl Into<String>) -> Self {
        Self { chat_id, self_id, self_name: self_name.into(), entries: Vec::new(), next_page: 1, exhausted: false }
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter().map(|e| &e.message)
    }

    /// True once a history page came back shorter than requested.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Prepends an older page, skipping ids already shown.
    pub fn load_history(&mut self, page: Vec<Message>) {
        let older: Vec<Entry> = page
            .into_iter()
            .filter(|m| !self.contains_id(m.id))
            .map(|mut message| {
                message.mark_self(self.self_id);
                Entry { local_key: None, message }
            })
            .collect();
        self.entries.splice(0..0, older);
    }

    /// Fetches the next older page and prepends it. Returns how many
    /// messages the server sent.
    pub async fn load_older(&mut self, chat: &ChatService) -> ApiResult<usize> {
        if self.exhausted {
            return Ok(0);
        }
        let page = chat.history(self.chat_id, self.next_page, DEFAULT_PAGE_SIZE).await?;
        let count = page.len();
        self.next_page += 1;
        self.exhausted = count < DEFAULT_PAGE_SIZE as usize;
        self.load_history(page);
        Ok(count)
    }

    /// Adds the local copy of an outgoing message and returns its key.
    pub fn push_outgoing(&mut self, content: impl Into<String>, message_type: MessageType) -> Uuid {
        let key = Uuid::new_v4();
        let message = Message {
            id: 0,
            chat_id: self.chat_id,
            sender_id: self.self_id,
            sender_name: self.self_name.clone(),
            sender_avatar: None,
            sender_role: None,
            content: content.into(),
            message_type,
            is_self: true,
            timestamp: Utc::now().timestamp_millis(),
            status: Some(SendStatus::Sending),
        };
        self.entries.push(Entry { local_key: Some(key), message });
        key
    }

    /// Marks an outgoing message delivered under the server's id. An echo
    /// that beat the confirmation is folded into it.
    pub fn confirm(&mut self, key: Uuid, message_id: u64) {
        if let Some(pos) = self.entries.iter().position(|e| e.local_key.is_none() && e.message.id == message_id) {
            debug!("[CHAT] Echo of {} arrived before confirmation", message_id);
            self.entries.remove(pos);
        }
        if let Some(entry) = self.entry_mut(key) {
            entry.message.id = message_id;
            entry.message.status = Some(SendStatus::Success);
        }
    }

    pub fn fail(&mut self, key: Uuid) {
        if let Some(entry) = self.entry_mut(key) {
            entry.message.status = Some(SendStatus::Failed);
        }
    }

    /// Adds a realtime message, or merges it into the entry with the same id.
    pub fn receive(&mut self, mut message: Message) {
        if !self.belongs_here(&message) {
            warn!("[CHAT] Ignoring message for {} in {}", message.chat_id, self.chat_id);
            return;
        }
        message.mark_self(self.self_id);
        match self.entries.iter_mut().find(|e| message.id != 0 && e.message.id == message.id) {
            Some(existing) => {
                let status = existing.message.status;
                existing.message = message;
                existing.message.status = status;
            }
            None => self.entries.push(Entry { local_key: None, message }),
        }
    }

    /// Private messages are addressed to the receiver, so a peer's message
    /// carries our own `user_<id>`. Either direction between the two users
    /// belongs to this chat.
    fn belongs_here(&self, message: &Message) -> bool {
        match self.chat_id.chat_type {
            ChatType::Team => message.chat_id == self.chat_id,
            ChatType::User => {
                let peer = self.chat_id.id;
                let between_us = [self.self_id, peer];
                message.chat_id.chat_type == ChatType::User
                    && between_us.contains(&message.chat_id.id)
                    && between_us.contains(&message.sender_id)
            }
        }
    }

    /// Sends over HTTP with the optimistic entry shown meanwhile.
    pub async fn send(&mut self, chat: &ChatService, content: &str, message_type: MessageType) -> ApiResult<u64> {
        let key = self.push_outgoing(content, message_type);
        let request = SendMessageRequest { chat_id: self.chat_id, content: content.to_string(), message_type };
        match chat.send(&request).await {
            Ok(response) => {
                self.confirm(key, response.message_id);
                Ok(response.message_id)
            }
            Err(e) => {
                self.fail(key);
                Err(e)
            }
        }
    }

    fn contains_id(&self, id: u64) -> bool {
        id != 0 && self.entries.iter().any(|e| e.message.id == id)
    }

    fn entry_mut(&mut self, key: Uuid) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.local_key == Some(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn incoming(id: u64, sender_id: UserId, content: &str) -> Message {
        Message {
            id,
            chat_id: ChatId::user(2),
            sender_id,
            sender_name: String::new(),
            sender_avatar: None,
            sender_role: None,
            content: content.to_string(),
            message_type: MessageType::Text,
            is_self: false,
            timestamp: id as i64,
            status: None,
        }
    }

    #[test]
    fn echo_after_confirm_is_merged() {
        let mut chat = Conversation::new(ChatId::user(2), 1, "amy");
        let key = chat.push_outgoing("hello", MessageType::Text);
        assert_eq!(chat.entries()[0].message.status, Some(SendStatus::Sending));

        chat.confirm(key, 55);
        chat.receive(incoming(55, 1, "hello"));

        assert_eq!(chat.entries().len(), 1);
        let message = &chat.entries()[0].message;
        assert!(message.is_self);
        assert_eq!(message.id, 55);
        assert_eq!(message.status, Some(SendStatus::Success));
    }

    #[test]
    fn echo_before_confirm_is_folded() {
        let mut chat = Conversation::new(ChatId::user(2), 1, "amy");
        let key = chat.push_outgoing("hello", MessageType::Text);
        chat.receive(incoming(55, 1, "hello"));
        assert_eq!(chat.entries().len(), 2);

        chat.confirm(key, 55);
        assert_eq!(chat.entries().len(), 1);
        assert_eq!(chat.entries()[0].local_key, Some(key));
    }

    #[test]
    fn failed_send_keeps_entry() {
        let mut chat = Conversation::new(ChatId::user(2), 1, "amy");
        let key = chat.push_outgoing("lost", MessageType::Text);
        chat.fail(key);
        assert_eq!(chat.entries()[0].message.status, Some(SendStatus::Failed));
    }

    #[test]
    fn history_prepends_and_dedupes() {
        let mut chat = Conversation::new(ChatId::user(2), 1, "amy");
        chat.receive(incoming(10, 2, "new"));
        chat.load_history(vec![incoming(8, 1, "old"), incoming(9, 2, "older"), incoming(10, 2, "new")]);

        let ids: Vec<u64> = chat.messages().map(|m| m.id).collect();
        assert_eq!(ids, vec![8, 9, 10]);
        assert!(chat.entries()[0].message.is_self);
        assert!(!chat.entries()[1].message.is_self);
    }

    #[test]
    fn other_chats_are_ignored() {
        let mut chat = Conversation::new(ChatId::user(2), 1, "amy");
        let mut stray = incoming(1, 3, "wrong room");
        stray.chat_id = ChatId::team(2);
        chat.receive(stray);
        assert!(chat.entries().is_empty());
    }

    #[test]
    fn peer_message_addressed_to_me_is_shown() {
        let mut chat = Conversation::new(ChatId::user(2), 1, "amy");
        let mut reply = incoming(3, 2, "hi amy");
        reply.chat_id = ChatId::user(1);
        chat.receive(reply);

        assert_eq!(chat.entries().len(), 1);
        assert!(!chat.entries()[0].message.is_self);
    }

    #[test]
    fn third_party_private_message_is_ignored() {
        let mut chat = Conversation::new(ChatId::user(2), 1, "amy");
        let mut other = incoming(4, 3, "not for this chat");
        other.chat_id = ChatId::user(1);
        chat.receive(other);
        assert!(chat.entries().is_empty());
    }
}
