use std::collections::HashSet;

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};

use crate::client::services::friends_service::FriendDirectory;
use crate::common::models::{FriendList, User, UserId, UserPatch};

/// The only part of the session written to disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    #[serde(default)]
    pub user_info: Option<User>,
    #[serde(default)]
    pub is_logged_in: bool,
}

/// Logged-in profile plus a lazily built set of friend ids.
#[derive(Debug, Clone, Default)]
pub struct UserStore {
    user_info: Option<User>,
    is_logged_in: bool,
    friend_ids: HashSet<UserId>,
    friend_ids_loaded: bool,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_info(&self) -> Option<&User> {
        self.user_info.as_ref()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_info.as_ref().filter(|_| self.is_logged_in).map(|u| u.id)
    }

    pub fn is_logged_in(&self) -> bool {
        self.is_logged_in
    }

    pub fn friend_ids(&self) -> &HashSet<UserId> {
        &self.friend_ids
    }

    pub fn friend_ids_loaded(&self) -> bool {
        self.friend_ids_loaded
    }

    /// Stores the profile and rebuilds the friend-id cache from its `userIds`.
    ///
    /// A blank list means "no friends" and counts as loaded. A list that does
    /// not parse leaves the cache empty and unloaded so the next
    /// [`load_friend_ids`](Self::load_friend_ids) asks the server.
    pub fn set_user_info(&mut self, user: User) {
        let user = user.normalized();
        self.friend_ids.clear();
        match user.friend_id_list() {
            Ok(ids) => {
                self.friend_ids.extend(ids);
                self.friend_ids_loaded = true;
            }
            Err(e) => {
                error!("[USER] Failed to parse friend ids for user {}: {}", user.id, e);
                self.friend_ids_loaded = false;
            }
        }
        self.user_info = Some(user);
        self.is_logged_in = true;
    }

    pub fn clear_user_info(&mut self) {
        self.user_info = None;
        self.is_logged_in = false;
        self.clear_friend_ids();
    }

    /// Shallow merge into the current profile; ignored when logged out.
    pub fn update_user_info(&mut self, patch: &UserPatch) {
        if let Some(user) = self.user_info.as_mut() {
            user.apply(patch);
        }
    }

    /// Fills the friend-id cache once: from the profile if it carries the
    /// list, otherwise from the friend list endpoint. Failures are logged
    /// and leave the cache unloaded.
    pub async fn load_friend_ids(&mut self, directory: &dyn FriendDirectory) {
        if self.friend_ids_loaded {
            return;
        }

        if self.is_logged_in {
            if let Some(user) = self.user_info.as_ref().filter(|u| u.user_ids.as_deref().is_some_and(|s| !s.trim().is_empty())) {
                match user.friend_id_list() {
                    Ok(ids) => {
                        self.friend_ids = ids.into_iter().collect();
                        self.friend_ids_loaded = true;
                        return;
                    }
                    Err(e) => warn!("[USER] Profile friend ids unreadable, asking server: {}", e),
                }
            }
        }

        match directory.friend_list().await {
            Ok(list) => self.set_friend_list(&list),
            Err(e) => error!("[USER] Failed to load friend ids: {}", e),
        }
    }

    /// Replaces the friend-id cache with the ids of a fetched friend list.
    pub fn set_friend_list(&mut self, list: &FriendList) {
        self.friend_ids = list.friends.iter().map(|f| f.id).collect();
        self.friend_ids_loaded = true;
        debug!("[USER] Loaded {} friend ids", self.friend_ids.len());
    }

    pub fn is_friend(&self, user_id: UserId) -> bool {
        self.friend_ids.contains(&user_id)
    }

    /// Drops the cache after a friend is added or removed.
    pub fn clear_friend_ids(&mut self) {
        self.friend_ids.clear();
        self.friend_ids_loaded = false;
    }

    pub fn persisted(&self) -> PersistedSession {
        PersistedSession { user_info: self.user_info.clone(), is_logged_in: self.is_logged_in }
    }

    /// Restores a saved session. The friend-id cache is rebuilt from the
    /// profile the same way a fresh login does.
    pub fn restore(&mut self, saved: PersistedSession) {
        match saved.user_info {
            Some(user) if saved.is_logged_in => self.set_user_info(user),
            Some(user) => {
                self.clear_user_info();
                self.user_info = Some(user.normalized());
            }
            None => self.clear_user_info(),
        }
    }
}
