//! Notification center: four categories of pending applications.
//!
//! Each category is loaded lazily and at most once until it is refreshed
//! or the store is invalidated. Loads do not hold the lock across the
//! network call; every load takes an epoch and a response whose epoch was
//! superseded (by [`MessageStore::invalidate_all`]) is discarded, so the
//! latest request wins.
//!
//! The two team categories have no endpoint behind them yet and always
//! load as empty.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use log::{debug, error, info};
use tokio::sync::Mutex;

use crate::client::services::friends_service::FriendsService;
use crate::common::envelope::ApiResult;
use crate::common::models::{FriendApplication, TeamApplication};

const LOAD_FAILED: &str = "Failed to load, please retry";
const PENDING: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryId {
    FriendReceived,
    FriendSent,
    TeamSent,
    TeamReceived,
}

impl CategoryId {
    pub const ALL: [CategoryId; 4] =
        [CategoryId::FriendReceived, CategoryId::FriendSent, CategoryId::TeamSent, CategoryId::TeamReceived];

    pub fn as_str(self) -> &'static str {
        match self {
            CategoryId::FriendReceived => "friend-received",
            CategoryId::FriendSent => "friend-sent",
            CategoryId::TeamSent => "team-sent",
            CategoryId::TeamReceived => "team-received",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CategoryId::FriendReceived => "Friend requests",
            CategoryId::FriendSent => "My requests",
            CategoryId::TeamSent => "Team applications",
            CategoryId::TeamReceived => "Team approvals",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            CategoryId::FriendReceived => "friends-o",
            CategoryId::FriendSent => "send-gift-o",
            CategoryId::TeamSent => "cluster-o",
            CategoryId::TeamReceived => "manager-o",
        }
    }

    /// Received categories count pending items; sent ones never show a badge.
    pub fn is_received(self) -> bool {
        matches!(self, CategoryId::FriendReceived | CategoryId::TeamReceived)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryId::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown message category '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessageItem {
    Friend(FriendApplication),
    Team(TeamApplication),
}

impl MessageItem {
    pub fn id(&self) -> u64 {
        match self {
            MessageItem::Friend(a) => a.id,
            MessageItem::Team(a) => a.id,
        }
    }

    pub fn status(&self) -> i32 {
        match self {
            MessageItem::Friend(a) => a.status,
            MessageItem::Team(a) => a.apply_status,
        }
    }

    fn set_status(&mut self, status: i32) {
        match self {
            MessageItem::Friend(a) => a.status = status,
            MessageItem::Team(a) => a.apply_status = status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryPhase {
    Idle,
    Loading,
    Loaded,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageCategory {
    pub id: CategoryId,
    pub name: &'static str,
    pub icon: &'static str,
    /// Unread badge.
    pub count: usize,
    pub items: Vec<MessageItem>,
    pub loading: bool,
    pub error: Option<String>,
    pub loaded: bool,
}

impl MessageCategory {
    fn new(id: CategoryId) -> Self {
        Self {
            id,
            name: id.name(),
            icon: id.icon(),
            count: 0,
            items: Vec::new(),
            loading: false,
            error: None,
            loaded: false,
        }
    }

    pub fn phase(&self) -> CategoryPhase {
        if self.loading {
            CategoryPhase::Loading
        } else if self.error.is_some() {
            CategoryPhase::Error
        } else if self.loaded {
            CategoryPhase::Loaded
        } else {
            CategoryPhase::Idle
        }
    }

    fn recount(&mut self) {
        self.count = if self.id.is_received() {
            self.items.iter().filter(|i| i.status() == PENDING).count()
        } else {
            0
        };
    }
}

/// Where the friend categories come from.
#[async_trait]
pub trait ApplicationSource: Send + Sync {
    async fn received_friend_applications(&self) -> ApiResult<Vec<FriendApplication>>;
    async fn sent_friend_applications(&self) -> ApiResult<Vec<FriendApplication>>;
}

#[async_trait]
impl ApplicationSource for FriendsService {
    async fn received_friend_applications(&self) -> ApiResult<Vec<FriendApplication>> {
        self.received().await
    }

    async fn sent_friend_applications(&self) -> ApiResult<Vec<FriendApplication>> {
        self.sent().await
    }
}

#[derive(Debug)]
struct Inner {
    categories: Vec<MessageCategory>,
    epochs: [u64; 4],
}

impl Inner {
    fn new() -> Self {
        Self { categories: CategoryId::ALL.into_iter().map(MessageCategory::new).collect(), epochs: [0; 4] }
    }

    fn category_mut(&mut self, id: CategoryId) -> &mut MessageCategory {
        &mut self.categories[id.index()]
    }
}

/// Clonable handle; clones share the same categories.
#[derive(Clone)]
pub struct MessageStore {
    inner: Arc<Mutex<Inner>>,
    source: Arc<dyn ApplicationSource>,
}

impl fmt::Debug for MessageStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageStore").finish_non_exhaustive()
    }
}

impl MessageStore {
    pub fn new(source: Arc<dyn ApplicationSource>) -> Self {
        Self { inner: Arc::new(Mutex::new(Inner::new())), source }
    }

    pub async fn categories(&self) -> Vec<MessageCategory> {
        self.inner.lock().await.categories.clone()
    }

    pub async fn category(&self, id: CategoryId) -> MessageCategory {
        self.inner.lock().await.categories[id.index()].clone()
    }

    pub async fn total_unread_count(&self) -> usize {
        self.inner.lock().await.categories.iter().map(|c| c.count).sum()
    }

    /// Fetches a category unless it is already loading or loaded.
    pub async fn load_category(&self, id: CategoryId) {
        let epoch = {
            let mut inner = self.inner.lock().await;
            let category = inner.category_mut(id);
            if category.loading || category.loaded {
                return;
            }
            category.loading = true;
            category.error = None;
            inner.epochs[id.index()] += 1;
            inner.epochs[id.index()]
        };

        let result = self.fetch(id).await;

        let mut inner = self.inner.lock().await;
        if inner.epochs[id.index()] != epoch {
            debug!("[MESSAGES] Discarding stale response for {}", id);
            return;
        }
        let category = inner.category_mut(id);
        match result {
            Ok(items) => {
                category.items = items;
                category.recount();
                category.loaded = true;
            }
            Err(e) => {
                error!("[MESSAGES] Failed to load {}: {}", category.name, e);
                let message = e.message.trim();
                category.error = Some(if message.is_empty() { LOAD_FAILED.to_string() } else { message.to_string() });
            }
        }
        category.loading = false;
    }

    async fn fetch(&self, id: CategoryId) -> ApiResult<Vec<MessageItem>> {
        match id {
            CategoryId::FriendReceived => self.source.received_friend_applications().await.map(friend_items),
            CategoryId::FriendSent => self.source.sent_friend_applications().await.map(friend_items),
            CategoryId::TeamSent | CategoryId::TeamReceived => Ok(Vec::new()),
        }
    }

    /// Marks the category stale and loads it again.
    pub async fn refresh_category(&self, id: CategoryId) {
        self.inner.lock().await.category_mut(id).loaded = false;
        self.load_category(id).await;
    }

    /// Refreshes every category concurrently; failures stay per category.
    pub async fn refresh_all(&self) {
        join_all(CategoryId::ALL.into_iter().map(|id| self.refresh_category(id))).await;
    }

    pub async fn update_category_count(&self, id: CategoryId) {
        self.inner.lock().await.category_mut(id).recount();
    }

    /// Applies an accept/reject/revoke locally instead of reloading.
    pub async fn handle_item_action(&self, id: CategoryId, item_id: u64, status: i32) {
        let mut inner = self.inner.lock().await;
        let category = inner.category_mut(id);
        if let Some(item) = category.items.iter_mut().find(|i| i.id() == item_id) {
            item.set_status(status);
            category.recount();
        }
    }

    pub async fn remove_item(&self, id: CategoryId, item_id: u64) {
        let mut inner = self.inner.lock().await;
        let category = inner.category_mut(id);
        if let Some(pos) = category.items.iter().position(|i| i.id() == item_id) {
            category.items.remove(pos);
            category.recount();
        }
    }

    /// Resets every category and orphans in-flight loads. Called on logout.
    pub async fn invalidate_all(&self) {
        let mut inner = self.inner.lock().await;
        for id in CategoryId::ALL {
            inner.epochs[id.index()] += 1;
            *inner.category_mut(id) = MessageCategory::new(id);
        }
        info!("[MESSAGES] Cleared all categories");
    }
}

fn friend_items(list: Vec<FriendApplication>) -> Vec<MessageItem> {
    list.into_iter().map(MessageItem::Friend).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::envelope::{ApiError, ApiErrorKind};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;

    fn application(id: u64, status: i32) -> FriendApplication {
        FriendApplication { id, from_user_id: 100 + id, to_user_id: 1, status, ..FriendApplication::default() }
    }

    #[derive(Default)]
    struct FakeSource {
        received: StdMutex<Vec<ApiResult<Vec<FriendApplication>>>>,
        sent: StdMutex<Vec<ApiResult<Vec<FriendApplication>>>>,
        received_calls: AtomicUsize,
        gate: Option<Arc<Notify>>,
    }

    impl FakeSource {
        fn push_received(&self, r: ApiResult<Vec<FriendApplication>>) {
            self.received.lock().unwrap().push(r);
        }

        fn push_sent(&self, r: ApiResult<Vec<FriendApplication>>) {
            self.sent.lock().unwrap().push(r);
        }
    }

    #[async_trait]
    impl ApplicationSource for FakeSource {
        async fn received_friend_applications(&self) -> ApiResult<Vec<FriendApplication>> {
            self.received_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.received.lock().unwrap().remove(0)
        }

        async fn sent_friend_applications(&self) -> ApiResult<Vec<FriendApplication>> {
            self.sent.lock().unwrap().remove(0)
        }
    }

    fn server_error() -> ApiError {
        ApiError::new(ApiErrorKind::Server, "Server error")
    }

    #[tokio::test]
    async fn counts_follow_category_kind() {
        let source = Arc::new(FakeSource::default());
        source.push_received(Ok(vec![application(1, 0), application(2, 1), application(3, 0)]));
        source.push_sent(Ok(vec![application(4, 0), application(5, 0)]));
        let store = MessageStore::new(source.clone());

        store.load_category(CategoryId::FriendReceived).await;
        store.load_category(CategoryId::FriendSent).await;
        store.load_category(CategoryId::TeamSent).await;
        store.load_category(CategoryId::TeamReceived).await;

        let categories = store.categories().await;
        assert_eq!(categories[0].count, 2);
        assert_eq!(categories[1].items.len(), 2);
        assert_eq!(categories[1].count, 0);
        assert!(categories[2].items.is_empty() && categories[2].loaded);
        assert!(categories[3].items.is_empty() && categories[3].count == 0);
        assert_eq!(store.total_unread_count().await, 2);
        assert!(categories.iter().all(|c| c.phase() == CategoryPhase::Loaded));
    }

    #[tokio::test]
    async fn loaded_category_is_not_fetched_again() {
        let source = Arc::new(FakeSource::default());
        source.push_received(Ok(vec![application(1, 0)]));
        let store = MessageStore::new(source.clone());

        store.load_category(CategoryId::FriendReceived).await;
        store.load_category(CategoryId::FriendReceived).await;
        assert_eq!(source.received_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_loads_issue_one_call() {
        let gate = Arc::new(Notify::new());
        let source = Arc::new(FakeSource { gate: Some(gate.clone()), ..FakeSource::default() });
        source.push_received(Ok(vec![application(1, 0)]));
        let store = MessageStore::new(source.clone());

        let first = tokio::spawn({
            let store = store.clone();
            async move { store.load_category(CategoryId::FriendReceived).await }
        });
        while store.category(CategoryId::FriendReceived).await.phase() != CategoryPhase::Loading {
            tokio::task::yield_now().await;
        }

        // Second call returns immediately while the first is in flight.
        store.load_category(CategoryId::FriendReceived).await;
        gate.notify_one();
        first.await.unwrap();

        assert_eq!(source.received_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.category(CategoryId::FriendReceived).await.count, 1);
    }

    #[tokio::test]
    async fn failure_keeps_items_and_records_error() {
        let source = Arc::new(FakeSource::default());
        source.push_received(Ok(vec![application(1, 0)]));
        source.push_received(Err(server_error()));
        source.push_received(Ok(vec![]));
        let store = MessageStore::new(source.clone());

        store.load_category(CategoryId::FriendReceived).await;
        store.refresh_category(CategoryId::FriendReceived).await;
        let category = store.category(CategoryId::FriendReceived).await;
        assert_eq!(category.phase(), CategoryPhase::Error);
        assert_eq!(category.error.as_deref(), Some("Server error"));
        assert_eq!(category.items.len(), 1);
        assert!(!category.loading);
        assert!(!category.loaded);

        store.refresh_category(CategoryId::FriendReceived).await;
        let category = store.category(CategoryId::FriendReceived).await;
        assert!(category.loaded);
        assert!(category.error.is_none());
        assert!(category.items.is_empty());
        assert_eq!(source.received_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn refresh_all_isolates_failures() {
        let source = Arc::new(FakeSource::default());
        source.push_received(Err(server_error()));
        source.push_sent(Ok(vec![application(9, 3)]));
        let store = MessageStore::new(source.clone());

        store.refresh_all().await;
        let categories = store.categories().await;
        assert_eq!(categories[0].phase(), CategoryPhase::Error);
        assert_eq!(categories[1].phase(), CategoryPhase::Loaded);
        assert_eq!(categories[1].items[0].id(), 9);
    }

    #[tokio::test]
    async fn item_actions_update_counts() {
        let source = Arc::new(FakeSource::default());
        source.push_received(Ok(vec![application(1, 0), application(2, 0)]));
        let store = MessageStore::new(source.clone());
        store.load_category(CategoryId::FriendReceived).await;

        store.handle_item_action(CategoryId::FriendReceived, 1, 1).await;
        assert_eq!(store.category(CategoryId::FriendReceived).await.count, 1);

        store.remove_item(CategoryId::FriendReceived, 2).await;
        store.remove_item(CategoryId::FriendReceived, 77).await;
        let category = store.category(CategoryId::FriendReceived).await;
        assert_eq!(category.count, 0);
        assert_eq!(category.items.len(), 1);
    }

    #[tokio::test]
    async fn invalidate_discards_in_flight_response() {
        let gate = Arc::new(Notify::new());
        let source = Arc::new(FakeSource { gate: Some(gate.clone()), ..FakeSource::default() });
        source.push_received(Ok(vec![application(1, 0)]));
        let store = MessageStore::new(source.clone());

        let load = tokio::spawn({
            let store = store.clone();
            async move { store.load_category(CategoryId::FriendReceived).await }
        });
        while store.category(CategoryId::FriendReceived).await.phase() != CategoryPhase::Loading {
            tokio::task::yield_now().await;
        }

        store.invalidate_all().await;
        gate.notify_one();
        load.await.unwrap();

        let category = store.category(CategoryId::FriendReceived).await;
        assert_eq!(category.phase(), CategoryPhase::Idle);
        assert!(category.items.is_empty());
    }

    #[test]
    fn category_ids_parse() {
        assert_eq!("team-sent".parse::<CategoryId>().unwrap(), CategoryId::TeamSent);
        assert!("inbox".parse::<CategoryId>().is_err());
        assert_eq!(CategoryId::FriendReceived.icon(), "friends-o");
    }
}
