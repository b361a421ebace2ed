use url::Url;

use crate::client::services::http_client::ApiClient;
use crate::client::services::websocket_client::{websocket_url, ChannelError};
use crate::common::chat::{ChatId, Message, SendMessageRequest, SendMessageResponse};
use crate::common::envelope::ApiResult;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Chat history and sending over HTTP; live frames go through
/// [`ChatChannel`](crate::client::services::websocket_client::ChatChannel).
#[derive(Debug, Clone)]
pub struct ChatService {
    api: ApiClient,
    ws_base_url: Option<String>,
}

impl ChatService {
    pub fn new(api: ApiClient, ws_base_url: Option<String>) -> Self {
        Self { api, ws_base_url }
    }

    /// One page of history, oldest first as the backend returns it.
    pub async fn history(&self, chat_id: ChatId, page: u32, page_size: u32) -> ApiResult<Vec<Message>> {
        self.api
            .get(
                "/chat/history",
                &[
                    ("chatId", chat_id.to_string()),
                    ("page", page.max(1).to_string()),
                    ("pageSize", page_size.to_string()),
                ],
            )
            .await
    }

    pub async fn send(&self, request: &SendMessageRequest) -> ApiResult<SendMessageResponse> {
        self.api.post("/chat/send", request).await
    }

    /// Realtime endpoint for `chat_id`, from `WS_BASE_URL` or the API host.
    pub fn websocket_url(&self, chat_id: ChatId) -> Result<Url, ChannelError> {
        let base = self.ws_base_url.as_deref().unwrap_or_else(|| self.api.base_url());
        websocket_url(base, chat_id)
    }
}
