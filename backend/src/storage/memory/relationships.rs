use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::storage::traits::RelationshipStore;

/// In-memory social graph: symmetric friendships and directed follows.
#[derive(Default)]
pub struct InMemoryRelationshipStore {
    inner: Mutex<GraphData>,
}

#[derive(Default)]
struct GraphData {
    friends: HashMap<String, HashSet<String>>,
    following: HashMap<String, Vec<String>>,
}

impl InMemoryRelationshipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted friendship (symmetric).
    pub fn add_friendship(&self, a: &str, b: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .friends
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string());
        inner
            .friends
            .entry(b.to_string())
            .or_default()
            .insert(a.to_string());
    }

    /// Record that `follower` follows `followed` (directed).
    pub fn add_following(&self, follower: &str, followed: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .following
            .entry(follower.to_string())
            .or_default()
            .push(followed.to_string());
    }
}

#[async_trait]
impl RelationshipStore for InMemoryRelationshipStore {
    async fn friends_of(&self, user_id: &str) -> Result<Vec<String>> {
        let inner = self.inner.lock().unwrap();
        let mut friends: Vec<String> = inner
            .friends
            .get(user_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        friends.sort();
        Ok(friends)
    }

    async fn following_of(&self, user_id: &str) -> Result<Vec<String>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.following.get(user_id).cloned().unwrap_or_default())
    }

    async fn are_friends(&self, a: &str, b: &str) -> Result<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .friends
            .get(a)
            .map(|set| set.contains(b))
            .unwrap_or(false))
    }
}
