use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::storage::traits::ProfileStore;
use shared::{RawBirthdayValue, VisibilityLevel};

/// In-memory profile field store.
///
/// Primary values and direct rows are kept separately so tests can exercise
/// the engine's two-step lookup fallback. Visibility defaults to public when
/// a member never configured the field.
#[derive(Default)]
pub struct InMemoryProfileStore {
    inner: Mutex<ProfileData>,
}

#[derive(Default)]
struct ProfileData {
    values: HashMap<(String, String), RawBirthdayValue>,
    raw_values: HashMap<(String, String), RawBirthdayValue>,
    visibility: HashMap<(String, String), VisibilityLevel>,
    date_formats: HashMap<String, String>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a field value reachable through the primary accessor.
    pub fn set_field_value(&self, field_id: &str, user_id: &str, value: RawBirthdayValue) {
        self.inner
            .lock()
            .unwrap()
            .values
            .insert((field_id.to_string(), user_id.to_string()), value);
    }

    /// Seed a field value reachable only through the direct secondary lookup.
    pub fn set_field_value_raw(&self, field_id: &str, user_id: &str, value: RawBirthdayValue) {
        self.inner
            .lock()
            .unwrap()
            .raw_values
            .insert((field_id.to_string(), user_id.to_string()), value);
    }

    pub fn set_visibility(&self, field_id: &str, user_id: &str, level: VisibilityLevel) {
        self.inner
            .lock()
            .unwrap()
            .visibility
            .insert((field_id.to_string(), user_id.to_string()), level);
    }

    pub fn set_date_format(&self, field_id: &str, format: &str) {
        self.inner
            .lock()
            .unwrap()
            .date_formats
            .insert(field_id.to_string(), format.to_string());
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn field_value(
        &self,
        field_id: &str,
        user_id: &str,
    ) -> Result<Option<RawBirthdayValue>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .values
            .get(&(field_id.to_string(), user_id.to_string()))
            .cloned())
    }

    async fn field_value_raw(
        &self,
        field_id: &str,
        user_id: &str,
    ) -> Result<Option<RawBirthdayValue>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .raw_values
            .get(&(field_id.to_string(), user_id.to_string()))
            .cloned())
    }

    async fn field_visibility(&self, field_id: &str, user_id: &str) -> Result<VisibilityLevel> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .visibility
            .get(&(field_id.to_string(), user_id.to_string()))
            .cloned()
            .unwrap_or(VisibilityLevel::Public))
    }

    async fn field_date_format(&self, field_id: &str) -> Result<Option<String>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.date_formats.get(field_id).cloned())
    }
}
