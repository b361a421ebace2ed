pub mod chat_service;
pub mod friends_service;
pub mod http_client;
pub mod notifier;
pub mod teams_service;
pub mod users_service;
pub mod websocket_client;
