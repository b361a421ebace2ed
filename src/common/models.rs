//! Records exchanged with the backend for users, friends and teams.
//!
//! Field names follow the wire format (camelCase). Lists the backend ships
//! as serialized JSON strings (`tags`, `teamIds`, `userIds`) stay strings on
//! the record and are parsed on demand.

use serde::{Deserialize, Deserializer, Serialize};

pub type UserId = u64;
pub type TeamId = u64;

/// Treats an explicit JSON `null` like a missing field.
pub(crate) fn null_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

fn parse_id_list(raw: Option<&str>) -> Result<Vec<u64>, serde_json::Error> {
    match raw.map(str::trim) {
        None | Some("") | Some("null") => Ok(Vec::new()),
        Some(text) => serde_json::from_str(text),
    }
}

// ---------------------------------------------------------------- users

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    #[serde(default, deserialize_with = "null_default")]
    pub username: String,
    #[serde(default, deserialize_with = "null_default")]
    pub user_account: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_role: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_status: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_delete: Option<i32>,
    /// JSON string array, e.g. `["java","rust"]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    /// JSON id array, e.g. `[100004,100005]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_ids: Option<String>,
    /// Friend ids as a JSON id array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_ids: Option<String>,
}

impl User {
    /// Copies `userAvatarUrl` into the `avatarUrl` alias older views read.
    pub fn normalized(mut self) -> Self {
        if self.user_avatar_url.is_some() {
            self.avatar_url = self.user_avatar_url.clone();
        }
        self
    }

    /// Parsed tag list; a malformed value yields an empty list.
    pub fn tag_list(&self) -> Vec<String> {
        match self.tags.as_deref().map(str::trim) {
            None | Some("") => Vec::new(),
            Some(text) => serde_json::from_str(text).unwrap_or_else(|e| {
                log::warn!("[MODELS] Ignoring malformed tags for user {}: {}", self.id, e);
                Vec::new()
            }),
        }
    }

    pub fn team_id_list(&self) -> Result<Vec<TeamId>, serde_json::Error> {
        parse_id_list(self.team_ids.as_deref())
    }

    pub fn friend_id_list(&self) -> Result<Vec<UserId>, serde_json::Error> {
        parse_id_list(self.user_ids.as_deref())
    }

    pub fn apply(&mut self, patch: &UserPatch) {
        if let Some(v) = &patch.username { self.username = v.clone(); }
        if let Some(v) = &patch.user_avatar_url {
            self.user_avatar_url = Some(v.clone());
            self.avatar_url = Some(v.clone());
        }
        if let Some(v) = &patch.user_desc { self.user_desc = Some(v.clone()); }
        if let Some(v) = patch.gender { self.gender = Some(v); }
        if let Some(v) = &patch.email { self.email = Some(v.clone()); }
        if let Some(v) = &patch.contact_info { self.contact_info = Some(v.clone()); }
        if let Some(v) = &patch.tags { self.tags = Some(v.clone()); }
        if let Some(v) = &patch.team_ids { self.team_ids = Some(v.clone()); }
        if let Some(v) = &patch.user_ids { self.user_ids = Some(v.clone()); }
    }
}

/// Shallow patch over [`User`]; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub username: Option<String>,
    pub user_avatar_url: Option<String>,
    pub user_desc: Option<String>,
    pub gender: Option<i32>,
    pub email: Option<String>,
    pub contact_info: Option<String>,
    pub tags: Option<String>,
    pub team_ids: Option<String>,
    pub user_ids: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchUser {
    pub id: UserId,
    #[serde(default, deserialize_with = "null_default")]
    pub username: String,
    #[serde(default)]
    pub user_avatar_url: Option<String>,
    #[serde(default)]
    pub gender: Option<i32>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    pub id: UserId,
    #[serde(default, deserialize_with = "null_default")]
    pub username: String,
    #[serde(default)]
    pub user_avatar_url: Option<String>,
    #[serde(default)]
    pub gender: Option<i32>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub contact_info: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    #[serde(default, deserialize_with = "null_default")]
    pub current: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub pages: u64,
    #[serde(default)]
    pub records: Vec<T>,
    #[serde(default, deserialize_with = "null_default")]
    pub size: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub total: u64,
}

// -------------------------------------------------------------- friends

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendApplyStatus {
    Pending = 0,
    Accepted = 1,
    Rejected = 2,
    Revoked = 3,
}

impl FriendApplyStatus {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Pending),
            1 => Some(Self::Accepted),
            2 => Some(Self::Rejected),
            3 => Some(Self::Revoked),
            _ => None,
        }
    }
}

/// Friend entry as returned by `/friend/list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendVo {
    pub id: UserId,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub user_account: Option<String>,
    #[serde(default)]
    pub user_desc: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub last_message_time: Option<String>,
}

impl From<&FriendVo> for User {
    fn from(f: &FriendVo) -> Self {
        User {
            id: f.id,
            username: f.name.clone(),
            user_account: f.user_account.clone().unwrap_or_default(),
            user_avatar_url: f.avatar.clone(),
            avatar_url: f.avatar.clone(),
            user_desc: f.user_desc.clone(),
            tags: f.tags.clone(),
            ..User::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FriendList {
    #[serde(default, deserialize_with = "null_default")]
    pub friends: Vec<FriendVo>,
    #[serde(default, deserialize_with = "null_default")]
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationUser {
    pub id: UserId,
    #[serde(default, deserialize_with = "null_default")]
    pub username: String,
    #[serde(default, deserialize_with = "null_default")]
    pub user_account: String,
    #[serde(default)]
    pub user_avatar_url: Option<String>,
}

/// Friend application record from `/friend/received` and `/friend/sent`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendApplication {
    pub id: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub from_user_id: UserId,
    #[serde(default, deserialize_with = "null_default")]
    pub to_user_id: UserId,
    #[serde(default)]
    pub remark: Option<String>,
    pub status: i32,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub apply_user: Option<ApplicationUser>,
}

/// Friend request as kept by the friend store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    pub id: u64,
    pub from_id: UserId,
    pub to_id: UserId,
    #[serde(default)]
    pub from_user: Option<User>,
    #[serde(default)]
    pub to_user: Option<User>,
    pub status: i32,
    #[serde(default)]
    pub create_time: Option<String>,
}

impl From<&FriendApplication> for FriendRequest {
    fn from(a: &FriendApplication) -> Self {
        FriendRequest {
            id: a.id,
            from_id: a.from_user_id,
            to_id: a.to_user_id,
            from_user: a.apply_user.as_ref().map(|u| User {
                id: u.id,
                username: u.username.clone(),
                user_account: u.user_account.clone(),
                user_avatar_url: u.user_avatar_url.clone(),
                avatar_url: u.user_avatar_url.clone(),
                ..User::default()
            }),
            to_user: None,
            status: a.status,
            create_time: a.create_time.clone(),
        }
    }
}

// ---------------------------------------------------------------- teams

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamApplyStatus {
    Pending = 0,
    Approved = 1,
    Rejected = 2,
    Cancelled = 3,
}

impl TeamApplyStatus {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Pending),
            1 => Some(Self::Approved),
            2 => Some(Self::Rejected),
            3 => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Team member (or captain) as embedded in a [`TeamVo`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: UserId,
    #[serde(default, deserialize_with = "null_default")]
    pub username: String,
    #[serde(default, deserialize_with = "null_default")]
    pub user_account: String,
    #[serde(default)]
    pub user_avatar_url: Option<String>,
    #[serde(default)]
    pub gender: Option<i32>,
    #[serde(default)]
    pub user_desc: Option<String>,
    #[serde(default)]
    pub user_role: Option<i32>,
    #[serde(default)]
    pub tags: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamVo {
    pub id: TeamId,
    #[serde(default, deserialize_with = "null_default")]
    pub team_name: String,
    #[serde(default)]
    pub team_avatar_url: Option<String>,
    #[serde(default)]
    pub team_password: Option<String>,
    #[serde(default)]
    pub team_desc: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub max_num: u32,
    #[serde(default)]
    pub expire_time: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub team_status: i32,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub announce: Option<String>,
    /// Captain.
    #[serde(default)]
    pub user: Option<TeamMember>,
    #[serde(default, deserialize_with = "null_default")]
    pub user_set: Vec<TeamMember>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamList {
    #[serde(default, deserialize_with = "null_default")]
    pub team_set: Vec<TeamVo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptainInfo {
    pub id: UserId,
    #[serde(default, deserialize_with = "null_default")]
    pub user_account: String,
    #[serde(default)]
    pub user_avatar_url: Option<String>,
    #[serde(default)]
    pub user_desc: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub username: String,
}

/// What a non-member can see of a team.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamBasic {
    pub id: TeamId,
    #[serde(default, deserialize_with = "null_default")]
    pub team_name: String,
    #[serde(default)]
    pub team_avatar_url: Option<String>,
    #[serde(default)]
    pub team_desc: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub max_num: u32,
    #[serde(default, deserialize_with = "null_default")]
    pub current_num: u32,
    #[serde(default)]
    pub expire_time: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub team_status: i32,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub announce: Option<String>,
    #[serde(default)]
    pub captain: Option<CaptainInfo>,
    #[serde(default, deserialize_with = "null_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub requirements: Option<String>,
    #[serde(default)]
    pub status_desc: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMembership {
    pub is_member: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub role: String,
}

/// Team join application (or invitation) record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamApplication {
    pub id: u64,
    pub team_id: TeamId,
    #[serde(default, deserialize_with = "null_default")]
    pub team_name: String,
    #[serde(default)]
    pub team_avatar: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub user_id: UserId,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_avatar: Option<String>,
    #[serde(default)]
    pub leader_id: Option<UserId>,
    #[serde(default)]
    pub leader_name: Option<String>,
    #[serde(default)]
    pub apply_type: Option<i32>,
    #[serde(default)]
    pub apply_type_desc: Option<String>,
    #[serde(default)]
    pub apply_message: Option<String>,
    pub apply_status: i32,
    #[serde(default)]
    pub status_desc: Option<String>,
    #[serde(default)]
    pub reject_reason: Option<String>,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub update_time: Option<String>,
}

/// Team as kept by the team store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamInfo {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub max_num: u32,
    #[serde(default)]
    pub expire_time: Option<String>,
    /// Captain id.
    pub user_id: UserId,
    pub status: i32,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub create_time: Option<String>,
    pub has_password: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub join_user_ids: Vec<UserId>,
    #[serde(default, deserialize_with = "null_default")]
    pub join_num: u32,
}

impl TeamInfo {
    pub fn apply(&mut self, patch: &TeamPatch) {
        if let Some(v) = &patch.name { self.name = v.clone(); }
        if let Some(v) = &patch.description { self.description = Some(v.clone()); }
        if let Some(v) = &patch.avatar_url { self.avatar_url = Some(v.clone()); }
        if let Some(v) = patch.max_num { self.max_num = v; }
        if let Some(v) = &patch.expire_time { self.expire_time = Some(v.clone()); }
        if let Some(v) = patch.user_id { self.user_id = v; }
        if let Some(v) = patch.status { self.status = v; }
        if let Some(v) = &patch.password {
            self.password = Some(v.clone());
            self.has_password = !v.is_empty();
        }
        if let Some(v) = &patch.join_user_ids {
            self.join_user_ids = v.clone();
            self.join_num = v.len() as u32;
        }
    }
}

impl From<&TeamVo> for TeamInfo {
    fn from(t: &TeamVo) -> Self {
        let join_user_ids: Vec<UserId> = t.user_set.iter().map(|m| m.id).collect();
        TeamInfo {
            id: t.id,
            name: t.team_name.clone(),
            description: t.team_desc.clone(),
            avatar_url: t.team_avatar_url.clone(),
            max_num: t.max_num,
            expire_time: t.expire_time.clone(),
            user_id: t.user.as_ref().map(|u| u.id).unwrap_or_default(),
            status: t.team_status,
            password: t.team_password.clone(),
            create_time: t.create_time.clone(),
            has_password: t.team_password.as_deref().is_some_and(|p| !p.is_empty()),
            join_num: join_user_ids.len() as u32,
            join_user_ids,
        }
    }
}

/// Shallow patch over [`TeamInfo`]; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    pub max_num: Option<u32>,
    pub expire_time: Option<String>,
    pub user_id: Option<UserId>,
    pub status: Option<i32>,
    pub password: Option<String>,
    pub join_user_ids: Option<Vec<UserId>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_lists_parse_from_serialized_strings() {
        let user: User = serde_json::from_value(json!({
            "id": 7,
            "username": "amy",
            "userAccount": "amy01",
            "userAvatarUrl": "https://img/a.png",
            "tags": "[\"rust\",\"go\"]",
            "teamIds": "[100004,100005]",
            "userIds": " "
        }))
        .unwrap();
        let user = user.normalized();
        assert_eq!(user.avatar_url.as_deref(), Some("https://img/a.png"));
        assert_eq!(user.tag_list(), vec!["rust".to_string(), "go".to_string()]);
        assert_eq!(user.team_id_list().unwrap(), vec![100004, 100005]);
        assert!(user.friend_id_list().unwrap().is_empty());
    }

    #[test]
    fn malformed_lists_do_not_panic() {
        let user = User { id: 1, tags: Some("rust, go".into()), user_ids: Some("[1,".into()), ..User::default() };
        assert!(user.tag_list().is_empty());
        assert!(user.friend_id_list().is_err());
    }

    #[test]
    fn null_id_list_is_empty() {
        let user = User { id: 1, user_ids: Some("null".into()), team_ids: Some(" null ".into()), ..User::default() };
        assert!(user.friend_id_list().unwrap().is_empty());
        assert!(user.team_id_list().unwrap().is_empty());
    }

    #[test]
    fn team_info_from_vo_counts_members() {
        let vo: TeamVo = serde_json::from_value(json!({
            "id": 42,
            "teamName": "night owls",
            "teamPassword": "",
            "maxNum": 5,
            "teamStatus": 0,
            "user": {"id": 1, "username": "cap"},
            "userSet": [{"id": 1}, {"id": 2}]
        }))
        .unwrap();
        let info = TeamInfo::from(&vo);
        assert_eq!(info.user_id, 1);
        assert_eq!(info.join_user_ids, vec![1, 2]);
        assert_eq!(info.join_num, 2);
        assert!(!info.has_password);
    }

    #[test]
    fn team_patch_is_shallow() {
        let mut team = TeamInfo { id: 1, name: "a".into(), max_num: 3, status: 0, ..TeamInfo::default() };
        team.apply(&TeamPatch { status: Some(2), ..TeamPatch::default() });
        assert_eq!(team.status, 2);
        assert_eq!(team.name, "a");
        assert_eq!(team.max_num, 3);
    }

    #[test]
    fn status_codes_round_trip() {
        assert_eq!(FriendApplyStatus::from_code(3), Some(FriendApplyStatus::Revoked));
        assert_eq!(FriendApplyStatus::Pending.code(), 0);
        assert_eq!(TeamApplyStatus::from_code(9), None);
    }
}
