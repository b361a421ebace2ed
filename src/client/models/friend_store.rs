use crate::common::models::{FriendApplyStatus, FriendRequest, User, UserId};

/// Friends and friend requests of the logged-in user.
#[derive(Debug, Clone, Default)]
pub struct FriendStore {
    friend_list: Vec<User>,
    received_requests: Vec<FriendRequest>,
    sent_requests: Vec<FriendRequest>,
    unread_request_count: usize,
}

impl FriendStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn friend_list(&self) -> &[User] {
        &self.friend_list
    }

    pub fn received_requests(&self) -> &[FriendRequest] {
        &self.received_requests
    }

    pub fn sent_requests(&self) -> &[FriendRequest] {
        &self.sent_requests
    }

    /// Received requests still pending.
    pub fn unread_request_count(&self) -> usize {
        self.unread_request_count
    }

    pub fn set_friend_list(&mut self, list: Vec<User>) {
        self.friend_list = list;
    }

    pub fn set_received_requests(&mut self, requests: Vec<FriendRequest>) {
        self.received_requests = requests;
        self.update_unread_count();
    }

    pub fn set_sent_requests(&mut self, requests: Vec<FriendRequest>) {
        self.sent_requests = requests;
    }

    pub fn add_friend(&mut self, friend: User) {
        self.friend_list.push(friend);
    }

    pub fn remove_friend(&mut self, user_id: UserId) {
        if let Some(pos) = self.friend_list.iter().position(|f| f.id == user_id) {
            self.friend_list.remove(pos);
        }
    }

    /// Newest first.
    pub fn add_received_request(&mut self, request: FriendRequest) {
        self.received_requests.insert(0, request);
        self.update_unread_count();
    }

    pub fn add_sent_request(&mut self, request: FriendRequest) {
        self.sent_requests.insert(0, request);
    }

    /// Only received requests change status locally.
    pub fn update_request_status(&mut self, request_id: u64, status: i32) {
        if let Some(request) = self.received_requests.iter_mut().find(|r| r.id == request_id) {
            request.status = status;
            self.update_unread_count();
        }
    }

    /// Removes the request from whichever list holds it.
    pub fn remove_request(&mut self, request_id: u64) {
        if let Some(pos) = self.received_requests.iter().position(|r| r.id == request_id) {
            self.received_requests.remove(pos);
            self.update_unread_count();
        }
        if let Some(pos) = self.sent_requests.iter().position(|r| r.id == request_id) {
            self.sent_requests.remove(pos);
        }
    }

    fn update_unread_count(&mut self) {
        self.unread_request_count = self
            .received_requests
            .iter()
            .filter(|r| r.status == FriendApplyStatus::Pending.code())
            .count();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: u64, status: i32) -> FriendRequest {
        FriendRequest { id, from_id: 10 + id, to_id: 1, status, ..FriendRequest::default() }
    }

    #[test]
    fn remove_request_hits_both_lists() {
        let mut store = FriendStore::new();
        store.set_received_requests(vec![request(7, 0), request(8, 0), request(9, 1)]);
        store.set_sent_requests(vec![request(7, 0), request(11, 0)]);
        assert_eq!(store.unread_request_count(), 2);

        store.remove_request(7);
        let received: Vec<_> = store.received_requests().iter().map(|r| r.id).collect();
        let sent: Vec<_> = store.sent_requests().iter().map(|r| r.id).collect();
        assert_eq!(received, vec![8, 9]);
        assert_eq!(sent, vec![11]);
        assert_eq!(store.unread_request_count(), 1);

        store.remove_request(404);
        assert_eq!(store.received_requests().len(), 2);
    }

    #[test]
    fn status_update_recounts_unread() {
        let mut store = FriendStore::new();
        store.add_received_request(request(1, 0));
        store.add_received_request(request(2, 0));
        assert_eq!(store.received_requests()[0].id, 2);
        assert_eq!(store.unread_request_count(), 2);

        store.update_request_status(1, FriendApplyStatus::Accepted.code());
        assert_eq!(store.unread_request_count(), 1);

        store.add_sent_request(request(3, 0));
        store.update_request_status(3, 2);
        assert_eq!(store.sent_requests()[0].status, 0);
    }

    #[test]
    fn friend_list_mutations() {
        let mut store = FriendStore::new();
        store.set_friend_list(vec![User { id: 1, ..User::default() }]);
        store.add_friend(User { id: 2, ..User::default() });
        store.remove_friend(1);
        store.remove_friend(99);
        let ids: Vec<_> = store.friend_list().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![2]);
    }
}
