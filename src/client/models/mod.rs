pub mod conversation;
pub mod friend_store;
pub mod message_store;
pub mod team_store;
pub mod user_store;
