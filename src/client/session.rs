//! Session context: the API services and every session-scoped store.
//!
//! Stores live here instead of in globals. [`Session::login`] and
//! [`Session::restore`] fill them; [`Session::logout`] tears all of them
//! down and removes the persisted profile.

use std::sync::Arc;

use log::{error, info, warn};
use tokio::sync::Mutex;

use crate::client::config::ClientConfig;
use crate::client::models::conversation::Conversation;
use crate::client::models::friend_store::FriendStore;
use crate::client::models::message_store::{CategoryId, MessageStore};
use crate::client::models::team_store::TeamStore;
use crate::client::models::user_store::UserStore;
use crate::client::services::chat_service::ChatService;
use crate::client::services::friends_service::FriendsService;
use crate::client::services::http_client::ApiClient;
use crate::client::services::notifier::Notifier;
use crate::client::services::teams_service::TeamsService;
use crate::client::services::users_service::{LoginRequest, UserUpdate, UsersService};
use crate::client::services::websocket_client::{ChannelError, ChatChannel};
use crate::client::utils::session_store;
use crate::common::chat::ChatId;
use crate::common::envelope::{ApiError, ApiErrorKind, ApiResult};
use crate::common::models::{FriendApplyStatus, FriendRequest, TeamInfo, User, UserPatch};

pub struct Session {
    config: ClientConfig,
    users: UsersService,
    friends: FriendsService,
    teams: TeamsService,
    chat: ChatService,
    user_store: Arc<Mutex<UserStore>>,
    friend_store: Arc<Mutex<FriendStore>>,
    team_store: Arc<Mutex<TeamStore>>,
    messages: MessageStore,
}

impl Session {
    pub fn new(config: ClientConfig, notifier: Arc<dyn Notifier>) -> ApiResult<Self> {
        let api = ApiClient::new(&config, notifier)?;
        Ok(Self::with_api(config, api))
    }

    pub fn with_api(config: ClientConfig, api: ApiClient) -> Self {
        let friends = FriendsService::new(api.clone());
        Self {
            users: UsersService::new(api.clone()),
            teams: TeamsService::new(api.clone()),
            chat: ChatService::new(api.clone(), config.ws_base_url.clone()),
            messages: MessageStore::new(Arc::new(friends.clone())),
            friends,
            user_store: Arc::new(Mutex::new(UserStore::new())),
            friend_store: Arc::new(Mutex::new(FriendStore::new())),
            team_store: Arc::new(Mutex::new(TeamStore::new())),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn users(&self) -> &UsersService {
        &self.users
    }

    pub fn friends(&self) -> &FriendsService {
        &self.friends
    }

    pub fn teams(&self) -> &TeamsService {
        &self.teams
    }

    pub fn chat(&self) -> &ChatService {
        &self.chat
    }

    pub fn user_store(&self) -> Arc<Mutex<UserStore>> {
        self.user_store.clone()
    }

    pub fn friend_store(&self) -> Arc<Mutex<FriendStore>> {
        self.friend_store.clone()
    }

    pub fn team_store(&self) -> Arc<Mutex<TeamStore>> {
        self.team_store.clone()
    }

    pub fn messages(&self) -> &MessageStore {
        &self.messages
    }

    pub async fn current_user(&self) -> Option<User> {
        let store = self.user_store.lock().await;
        store.user_info().filter(|_| store.is_logged_in()).cloned()
    }

    /// Reloads the persisted profile. Returns whether it was a logged-in one.
    pub async fn restore(&self) -> bool {
        let Some(saved) = session_store::load_session(&self.config.session_file) else {
            return false;
        };
        let mut store = self.user_store.lock().await;
        store.restore(saved);
        if store.is_logged_in() {
            info!("[SESSION] Restored session for user {}", store.user_id().unwrap_or_default());
        }
        store.is_logged_in()
    }

    pub async fn login(&self, account: &str, password: &str) -> ApiResult<User> {
        let request = LoginRequest { user_account: account.to_string(), user_password: password.to_string() };
        let user = self.users.login(&request).await?;
        info!("[SESSION] Logged in as {} ({})", user.user_account, user.id);

        let (user, ids_loaded) = {
            let mut store = self.user_store.lock().await;
            store.set_user_info(user);
            self.persist(&store);
            (store.user_info().cloned().unwrap_or_default(), store.friend_ids_loaded())
        };
        if !ids_loaded {
            self.fetch_friend_ids(user.id).await;
        }
        Ok(user)
    }

    /// Fallback when the profile's friend ids were unreadable. The store
    /// stays unlocked during the request; the result is dropped if another
    /// user logged in meanwhile.
    async fn fetch_friend_ids(&self, user_id: u64) {
        match self.friends.list().await {
            Ok(list) => {
                let mut store = self.user_store.lock().await;
                if store.user_id() == Some(user_id) {
                    store.set_friend_list(&list);
                }
            }
            Err(e) => error!("[SESSION] Failed to load friend ids: {}", e),
        }
    }

    /// Re-reads the profile from the server. An expired server session
    /// logs the client out locally.
    pub async fn refresh_profile(&self) -> ApiResult<User> {
        match self.users.current().await {
            Ok(user) => {
                let mut store = self.user_store.lock().await;
                store.set_user_info(user);
                self.persist(&store);
                Ok(store.user_info().cloned().unwrap_or_default())
            }
            Err(e) if e.is_unauthorized() => {
                warn!("[SESSION] Server session expired, clearing local state");
                self.teardown().await;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn update_profile(&self, update: &UserUpdate) -> ApiResult<bool> {
        let ok = self.users.update(update).await?;
        if ok {
            let patch = UserPatch {
                username: update.username.clone(),
                user_avatar_url: update.user_avatar_url.clone(),
                user_desc: update.user_desc.clone(),
                gender: update.gender,
                email: update.email.clone(),
                contact_info: update.contact_info.clone(),
                ..UserPatch::default()
            };
            let mut store = self.user_store.lock().await;
            store.update_user_info(&patch);
            self.persist(&store);
        }
        Ok(ok)
    }

    /// Ends the server session (best effort) and drops all local state.
    pub async fn logout(&self) {
        if let Err(e) = self.users.logout().await {
            warn!("[SESSION] Server logout failed, clearing locally anyway: {}", e);
        }
        self.teardown().await;
        info!("[SESSION] Logged out");
    }

    async fn teardown(&self) {
        self.user_store.lock().await.clear_user_info();
        *self.friend_store.lock().await = FriendStore::new();
        *self.team_store.lock().await = TeamStore::new();
        self.messages.invalidate_all().await;
        if let Err(e) = session_store::clear_session(&self.config.session_file) {
            error!("[SESSION] Failed to remove persisted session: {:#}", e);
        }
    }

    fn persist(&self, store: &UserStore) {
        if let Err(e) = session_store::save_session(&self.config.session_file, &store.persisted()) {
            error!("[SESSION] Failed to persist session: {:#}", e);
        }
    }

    pub async fn refresh_friends(&self) -> ApiResult<()> {
        let list = self.friends.list().await?;
        let received = self.friends.received().await?;
        let sent = self.friends.sent().await?;

        let mut store = self.friend_store.lock().await;
        store.set_friend_list(list.friends.iter().map(User::from).collect());
        store.set_received_requests(received.iter().map(FriendRequest::from).collect());
        store.set_sent_requests(sent.iter().map(FriendRequest::from).collect());
        Ok(())
    }

    /// Accepts or rejects a received friend request and updates the stores
    /// in place.
    pub async fn respond_to_request(&self, request_id: u64, accept: bool) -> ApiResult<()> {
        let status = (if accept { FriendApplyStatus::Accepted } else { FriendApplyStatus::Rejected }).code();
        self.friends.handle(request_id, status).await?;
        self.friend_store.lock().await.update_request_status(request_id, status);
        self.messages.handle_item_action(CategoryId::FriendReceived, request_id, status).await;
        if accept {
            self.user_store.lock().await.clear_friend_ids();
        }
        Ok(())
    }

    pub async fn revoke_request(&self, request_id: u64) -> ApiResult<()> {
        self.friends.revoke(request_id).await?;
        self.friend_store.lock().await.remove_request(request_id);
        self.messages.remove_item(CategoryId::FriendSent, request_id).await;
        Ok(())
    }

    pub async fn refresh_my_teams(&self) -> ApiResult<Vec<TeamInfo>> {
        let user_id = self.require_user_id().await?;
        let list = self.teams.by_user(user_id).await?;
        let teams: Vec<TeamInfo> = list.team_set.iter().map(TeamInfo::from).collect();
        self.team_store.lock().await.set_my_teams(teams.clone());
        Ok(teams)
    }

    /// Opens the realtime channel of a chat for the logged-in user.
    pub async fn open_chat(&self, chat_id: ChatId) -> Result<ChatChannel, ChannelError> {
        let url = self.chat.websocket_url(chat_id)?;
        let self_id = self.user_store.lock().await.user_id();
        Ok(ChatChannel::connect(url, self_id))
    }

    /// Empty message buffer for `chat_id` owned by the logged-in user.
    pub async fn conversation(&self, chat_id: ChatId) -> ApiResult<Conversation> {
        let user = self
            .current_user()
            .await
            .ok_or_else(|| ApiError::new(ApiErrorKind::Unauthorized, ApiErrorKind::Unauthorized.default_message()))?;
        Ok(Conversation::new(chat_id, user.id, user.username))
    }

    async fn require_user_id(&self) -> ApiResult<u64> {
        self.user_store
            .lock()
            .await
            .user_id()
            .ok_or_else(|| ApiError::new(ApiErrorKind::Unauthorized, ApiErrorKind::Unauthorized.default_message()))
    }
}
