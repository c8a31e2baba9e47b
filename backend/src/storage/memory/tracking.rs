use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::storage::traits::SentTrackingStore;

/// In-memory sent-tracking store for a single process lifetime.
#[derive(Default)]
pub struct InMemoryTrackingStore {
    inner: Mutex<TrackingData>,
}

#[derive(Default)]
struct TrackingData {
    last_processed: Option<NaiveDate>,
    sent: HashMap<String, i64>,
}

impl InMemoryTrackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users marked today, for tests.
    pub fn marked_count(&self) -> usize {
        self.inner.lock().unwrap().sent.len()
    }
}

#[async_trait]
impl SentTrackingStore for InMemoryTrackingStore {
    async fn last_processed_date(&self) -> Result<Option<NaiveDate>> {
        Ok(self.inner.lock().unwrap().last_processed)
    }

    async fn set_last_processed_date(&self, date: NaiveDate) -> Result<()> {
        self.inner.lock().unwrap().last_processed = Some(date);
        Ok(())
    }

    async fn is_marked(&self, user_id: &str) -> Result<bool> {
        Ok(self.inner.lock().unwrap().sent.contains_key(user_id))
    }

    async fn mark_sent(&self, user_id: &str, timestamp: i64) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .sent
            .insert(user_id.to_string(), timestamp);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.inner.lock().unwrap().sent.clear();
        Ok(())
    }
}
