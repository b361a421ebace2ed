use async_trait::async_trait;
use serde::Serialize;

use crate::client::services::http_client::ApiClient;
use crate::common::envelope::ApiResult;
use crate::common::models::{FriendApplication, FriendList, FriendVo, UserId};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApplyRequest<'a> {
    receive_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    remark: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize)]
struct HandleRequest {
    id: u64,
    status: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct MarkReadRequest {
    friend_id: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct FriendsService {
    api: ApiClient,
}

impl FriendsService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> ApiResult<FriendList> {
        self.api.get("/friend/list", &[]).await
    }

    pub async fn search(&self, keyword: &str) -> ApiResult<Vec<FriendVo>> {
        self.api.get("/friend/search", &[("keyword", keyword.to_string())]).await
    }

    pub async fn delete(&self, friend_id: UserId) -> ApiResult<bool> {
        self.api.delete(&format!("/friend/delete/{}", friend_id)).await
    }

    pub async fn apply(&self, to_user_id: UserId, remark: Option<&str>) -> ApiResult<bool> {
        self.api
            .post("/friend/apply", &ApplyRequest { receive_id: to_user_id, remark })
            .await
    }

    pub async fn received(&self) -> ApiResult<Vec<FriendApplication>> {
        self.api.get("/friend/received", &[]).await
    }

    pub async fn sent(&self) -> ApiResult<Vec<FriendApplication>> {
        self.api.get("/friend/sent", &[]).await
    }

    /// Accepts (`1`) or rejects (`2`) a received application.
    pub async fn handle(&self, application_id: u64, status: i32) -> ApiResult<bool> {
        self.api
            .post("/friend/handle", &HandleRequest { id: application_id, status })
            .await
    }

    pub async fn revoke(&self, application_id: u64) -> ApiResult<bool> {
        self.api.delete(&format!("/friend/revoke/{}", application_id)).await
    }

    /// Marks one application read, or every unread one when `None`.
    pub async fn mark_read(&self, application_id: Option<u64>) -> ApiResult<bool> {
        self.api
            .post("/friend/mark/read", &MarkReadRequest { friend_id: application_id })
            .await
    }
}

/// Source of the authoritative friend list, used to rebuild the friend-id cache.
#[async_trait]
pub trait FriendDirectory: Send + Sync {
    async fn friend_list(&self) -> ApiResult<FriendList>;
}

#[async_trait]
impl FriendDirectory for FriendsService {
    async fn friend_list(&self) -> ApiResult<FriendList> {
        self.list().await
    }
}
