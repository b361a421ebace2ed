//! Chat records: conversation ids, messages and the send request/response.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::models::{null_default, TeamId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    User,
    Team,
}

impl ChatType {
    fn prefix(self) -> &'static str {
        match self {
            ChatType::User => "user",
            ChatType::Team => "team",
        }
    }
}

/// Composite conversation key: `user_<id>` or `team_<id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChatId {
    pub chat_type: ChatType,
    pub id: u64,
}

impl ChatId {
    pub fn user(id: UserId) -> Self {
        Self { chat_type: ChatType::User, id }
    }

    pub fn team(id: TeamId) -> Self {
        Self { chat_type: ChatType::Team, id }
    }

    /// Builds the id from the `/chat/:type/:id` route params.
    pub fn from_route(chat_type: &str, id: &str) -> Result<Self, InvalidChatId> {
        format!("{}_{}", chat_type, id).parse()
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.chat_type.prefix(), self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid chat id: {0:?}")]
pub struct InvalidChatId(pub String);

impl FromStr for ChatId {
    type Err = InvalidChatId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidChatId(s.to_string());
        let (prefix, id) = s.split_once('_').ok_or_else(invalid)?;
        let chat_type = match prefix {
            "user" => ChatType::User,
            "team" => ChatType::Team,
            _ => return Err(invalid()),
        };
        let id = id.parse::<u64>().map_err(|_| invalid())?;
        Ok(Self { chat_type, id })
    }
}

impl TryFrom<String> for ChatId {
    type Error = InvalidChatId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChatId> for String {
    fn from(value: ChatId) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    Image,
    Voice,
}

/// Local-only delivery state of the sender's own messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendStatus {
    Sending,
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: u64,
    pub chat_id: ChatId,
    pub sender_id: UserId,
    #[serde(default, deserialize_with = "null_default")]
    pub sender_name: String,
    #[serde(default)]
    pub sender_avatar: Option<String>,
    /// Team chats only: 0 = member, 1 = captain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_role: Option<i32>,
    pub content: String,
    #[serde(default)]
    pub message_type: MessageType,
    #[serde(default)]
    pub is_self: bool,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SendStatus>,
}

impl Message {
    /// Recomputes `is_self` against the local user.
    pub fn mark_self(&mut self, local_user_id: UserId) {
        self.is_self = self.sender_id == local_user_id;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub chat_id: ChatId,
    pub content: String,
    pub message_type: MessageType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub message_id: u64,
}

/// Header data of an open conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatInfo {
    #[serde(rename = "type")]
    pub chat_type: ChatType,
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_count: Option<u32>,
}

impl ChatInfo {
    pub fn chat_id(&self) -> ChatId {
        ChatId { chat_type: self.chat_type, id: self.id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_id_parses_both_kinds() {
        assert_eq!("user_12".parse::<ChatId>().unwrap(), ChatId::user(12));
        assert_eq!("team_42".parse::<ChatId>().unwrap(), ChatId::team(42));
        assert_eq!(ChatId::team(42).to_string(), "team_42");
        assert_eq!(ChatId::from_route("user", "5").unwrap(), ChatId::user(5));
    }

    #[test]
    fn chat_id_rejects_garbage() {
        for bad in ["", "user", "user_", "group_1", "team_x", "user_-3"] {
            assert!(bad.parse::<ChatId>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn message_decodes_wire_frame() {
        let msg: Message = serde_json::from_value(json!({
            "id": 9,
            "chatId": "team_42",
            "senderId": 3,
            "senderName": "bo",
            "senderAvatar": null,
            "senderRole": 1,
            "content": "hi all",
            "messageType": "image",
            "isSelf": false,
            "timestamp": 1_700_000_000_000i64
        }))
        .unwrap();
        assert_eq!(msg.chat_id, ChatId::team(42));
        assert_eq!(msg.message_type, MessageType::Image);
        assert_eq!(msg.sender_role, Some(1));
        assert!(msg.status.is_none());
    }

    #[test]
    fn mark_self_compares_sender() {
        let mut msg: Message = serde_json::from_value(json!({
            "id": 1, "chatId": "user_2", "senderId": 2, "content": "x", "timestamp": 0
        }))
        .unwrap();
        msg.mark_self(2);
        assert!(msg.is_self);
        msg.mark_self(3);
        assert!(!msg.is_self);
    }

    #[test]
    fn send_request_serializes_chat_id_as_string() {
        let req = SendMessageRequest { chat_id: ChatId::user(7), content: "yo".into(), message_type: MessageType::Text };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v, json!({"chatId": "user_7", "content": "yo", "messageType": "text"}));
    }
}
