use serde::Serialize;

use crate::client::services::http_client::ApiClient;
use crate::common::envelope::ApiResult;
use crate::common::models::{TeamApplication, TeamBasic, TeamId, TeamList, TeamMembership, TeamVo, UserId};

pub const DEFAULT_LISTING_LIMIT: u32 = 20;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    pub team_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_avatar_url: Option<String>,
    pub max_num: u32,
    pub expire_time: String,
    pub team_status: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub announce: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeamRequest {
    pub id: TeamId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_num: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_status: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub announce: Option<String>,
}

/// Join a public team, or a password-gated one with `password`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinTeamRequest {
    pub team_id: TeamId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_message: Option<String>,
}

/// Application to a private team; also used for invitations (`invitee_id`).
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyTeamRequest {
    pub team_id: TeamId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invitee_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferTeamRequest {
    pub team_id: TeamId,
    pub user_account: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct TeamIdBody {
    team_id: TeamId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct KickRequest {
    team_id: TeamId,
    user_id: UserId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApproveRequest<'a> {
    apply_id: u64,
    status: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    reject_reason: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct TeamsService {
    api: ApiClient,
}

impl TeamsService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn by_user(&self, user_id: UserId) -> ApiResult<TeamList> {
        self.api.get(&format!("/team/user/{}", user_id), &[]).await
    }

    pub async fn get(&self, team_id: TeamId) -> ApiResult<TeamVo> {
        self.api.get(&format!("/team/{}", team_id), &[]).await
    }

    pub async fn basic(&self, team_id: TeamId) -> ApiResult<TeamBasic> {
        self.api.get(&format!("/team/{}/basic", team_id), &[]).await
    }

    pub async fn membership(&self, team_id: TeamId) -> ApiResult<TeamMembership> {
        self.api.get(&format!("/team/{}/membership", team_id), &[]).await
    }

    pub async fn create(&self, request: &CreateTeamRequest) -> ApiResult<bool> {
        self.api.post("/team/create", request).await
    }

    pub async fn update(&self, request: &UpdateTeamRequest) -> ApiResult<bool> {
        self.api.post("/team/update", request).await
    }

    pub async fn join(&self, request: &JoinTeamRequest) -> ApiResult<bool> {
        self.api.post("/team/join", request).await
    }

    /// Returns the id of the new application.
    pub async fn apply(&self, request: &ApplyTeamRequest) -> ApiResult<u64> {
        self.api.post("/team/apply", request).await
    }

    pub async fn invite(&self, team_id: TeamId, invitee_id: UserId, message: Option<String>) -> ApiResult<u64> {
        let request = ApplyTeamRequest { team_id, invitee_id: Some(invitee_id), apply_message: message };
        self.api.post("/team/invite", &request).await
    }

    pub async fn handle_invite(&self, apply_id: u64, status: i32) -> ApiResult<bool> {
        self.api
            .post("/team/invite/handle", &ApproveRequest { apply_id, status, reject_reason: None })
            .await
    }

    pub async fn transfer(&self, request: &TransferTeamRequest) -> ApiResult<bool> {
        self.api.post("/team/transfer", request).await
    }

    pub async fn quit(&self, team_id: TeamId) -> ApiResult<bool> {
        self.api.post_empty(&format!("/team/quit/{}", team_id)).await
    }

    pub async fn delete(&self, team_id: TeamId) -> ApiResult<bool> {
        self.api.post("/team/delete", &TeamIdBody { team_id }).await
    }

    pub async fn kick(&self, team_id: TeamId, user_id: UserId) -> ApiResult<bool> {
        self.api.post("/team/kickOutUser", &KickRequest { team_id, user_id }).await
    }

    pub async fn recommend(&self, limit: u32, page_num: u32) -> ApiResult<Vec<TeamVo>> {
        self.listing("/team/recommend", limit, page_num).await
    }

    pub async fn hot(&self, limit: u32, page_num: u32) -> ApiResult<Vec<TeamVo>> {
        self.listing("/team/hot", limit, page_num).await
    }

    pub async fn newest(&self, limit: u32, page_num: u32) -> ApiResult<Vec<TeamVo>> {
        self.listing("/team/new", limit, page_num).await
    }

    async fn listing(&self, path: &str, limit: u32, page_num: u32) -> ApiResult<Vec<TeamVo>> {
        self.api
            .get(path, &[("limit", limit.to_string()), ("pageNum", page_num.max(1).to_string())])
            .await
    }

    /// Matches team name, id, description and announcement.
    pub async fn search(&self, text: &str) -> ApiResult<Vec<TeamVo>> {
        self.api.get("/team/search", &[("text", text.to_string())]).await
    }

    /// Pending applications of a team the caller leads.
    pub async fn applications(&self, team_id: TeamId) -> ApiResult<Vec<TeamApplication>> {
        self.api.get(&format!("/team/applications/{}", team_id), &[]).await
    }

    /// Every application the caller submitted, any status.
    pub async fn my_applications(&self) -> ApiResult<Vec<TeamApplication>> {
        self.api.get("/team/my-applications", &[]).await
    }

    pub async fn application(&self, apply_id: u64) -> ApiResult<TeamApplication> {
        self.api.get(&format!("/team/application/{}", apply_id), &[]).await
    }

    /// Approves (`1`) or rejects (`2`) an application to the caller's team.
    pub async fn approve(&self, apply_id: u64, status: i32, reject_reason: Option<&str>) -> ApiResult<bool> {
        self.api
            .post("/team/approve", &ApproveRequest { apply_id, status, reject_reason })
            .await
    }

    pub async fn cancel_application(&self, team_id: TeamId) -> ApiResult<bool> {
        self.api.post_empty(&format!("/team/apply/cancel/{}", team_id)).await
    }
}
