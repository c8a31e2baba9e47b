use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;

use crate::storage::traits::MemberDirectory;
use shared::MemberProfile;

/// In-memory member directory, listing members in registration order.
#[derive(Default)]
pub struct InMemoryMemberDirectory {
    members: Mutex<Vec<MemberProfile>>,
}

impl InMemoryMemberDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_member(&self, member: MemberProfile) {
        self.members.lock().unwrap().push(member);
    }

    /// Convenience for tests: register a member with just an id and name.
    pub fn add_simple_member(&self, user_id: &str, display_name: &str) {
        self.add_member(MemberProfile {
            user_id: user_id.to_string(),
            display_name: display_name.to_string(),
            first_name: None,
            email: None,
        });
    }
}

#[async_trait]
impl MemberDirectory for InMemoryMemberDirectory {
    async fn list_member_ids(&self, limit: Option<usize>) -> Result<Vec<String>> {
        let members = self.members.lock().unwrap();
        let ids = members.iter().map(|m| m.user_id.clone());
        Ok(match limit {
            Some(n) => ids.take(n).collect(),
            None => ids.collect(),
        })
    }

    async fn get_member(&self, user_id: &str) -> Result<Option<MemberProfile>> {
        let members = self.members.lock().unwrap();
        Ok(members.iter().find(|m| m.user_id == user_id).cloned())
    }
}
