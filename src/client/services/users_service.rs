use serde::Serialize;

use crate::client::services::http_client::ApiClient;
use crate::common::envelope::ApiResult;
use crate::common::models::{PageResult, SearchUser, User, UserDetail, UserId};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub user_account: String,
    pub user_password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub user_account: String,
    pub user_password: String,
    pub check_password: String,
}

/// Free-text user search, paged.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_num: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_text: Option<String>,
}

/// Tag search; `tags` is a comma-separated list.
#[derive(Debug, Clone, Default)]
pub struct TagSearch {
    pub tags: Vec<String>,
    pub page_num: Option<u32>,
    pub page_size: Option<u32>,
}

/// Profile fields a user may change on their own account.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
    pub check_password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTagsRequest<'a> {
    id: UserId,
    tag_list: &'a [String],
}

#[derive(Debug, Clone)]
pub struct UsersService {
    api: ApiClient,
}

impl UsersService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn login(&self, request: &LoginRequest) -> ApiResult<User> {
        self.api.post("/user/login", request).await
    }

    /// Returns the new user's id.
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<u64> {
        self.api.post("/user/register", request).await
    }

    pub async fn logout(&self) -> ApiResult<i64> {
        self.api.post_empty("/user/loginOut").await
    }

    pub async fn current(&self) -> ApiResult<User> {
        self.api.get("/user/current", &[]).await
    }

    /// Recommended users; the best match comes first when logged in.
    pub async fn recommend(&self, limit: u32) -> ApiResult<Vec<SearchUser>> {
        self.api.get("/user/search", &[("limit", limit.to_string())]).await
    }

    pub async fn search_by_username(&self, username: &str) -> ApiResult<Vec<User>> {
        self.api.get("/user/search", &[("username", username.to_string())]).await
    }

    pub async fn query(&self, query: &UserQuery) -> ApiResult<PageResult<SearchUser>> {
        self.api.post("/user/search", query).await
    }

    pub async fn search_by_tags(&self, search: &TagSearch) -> ApiResult<PageResult<SearchUser>> {
        let mut params = vec![("tags", search.tags.join(","))];
        if let Some(n) = search.page_num {
            params.push(("pageNum", n.to_string()));
        }
        if let Some(n) = search.page_size {
            params.push(("pageSize", n.to_string()));
        }
        self.api.get("/user/search/tags", &params).await
    }

    pub async fn get(&self, id: UserId) -> ApiResult<User> {
        self.api.get(&format!("/user/{}", id), &[]).await
    }

    pub async fn detail(&self, id: UserId) -> ApiResult<UserDetail> {
        self.api.get(&format!("/user/{}/detail", id), &[]).await
    }

    pub async fn update(&self, update: &UserUpdate) -> ApiResult<bool> {
        self.api.post("/user/update", update).await
    }

    /// Replaces the tag list; returns the number of rows the backend touched.
    pub async fn update_tags(&self, id: UserId, tag_list: &[String]) -> ApiResult<i64> {
        self.api.post("/user/update/tags", &UpdateTagsRequest { id, tag_list }).await
    }

    pub async fn update_password(&self, change: &PasswordChange) -> ApiResult<bool> {
        self.api.post("/user/updatePassword", change).await
    }
}
