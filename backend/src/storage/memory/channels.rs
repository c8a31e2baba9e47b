use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::storage::traits::{ActivityBroadcaster, Mailer};

/// One message captured by the recording mailer.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMail {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Mailer that records every send instead of delivering anything.
///
/// Flip `set_failing(true)` to make every send fail, for exercising the
/// scheduler's best-effort dispatch path.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("mail transport unavailable"));
        }
        self.sent.lock().unwrap().push(SentMail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Broadcaster that records activity posts and in-app notifications.
#[derive(Default)]
pub struct RecordingBroadcaster {
    activities: Mutex<Vec<(String, String)>>,
    notifications: Mutex<Vec<(String, String, String)>>,
}

impl RecordingBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded `(user_id, message)` activity posts.
    pub fn activities(&self) -> Vec<(String, String)> {
        self.activities.lock().unwrap().clone()
    }

    /// Recorded `(recipient_id, item_id, action)` notifications.
    pub fn notifications(&self) -> Vec<(String, String, String)> {
        self.notifications.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActivityBroadcaster for RecordingBroadcaster {
    async fn post_activity(&self, user_id: &str, message: &str) -> Result<()> {
        self.activities
            .lock()
            .unwrap()
            .push((user_id.to_string(), message.to_string()));
        Ok(())
    }

    async fn notify(&self, recipient_id: &str, item_id: &str, action: &str) -> Result<()> {
        self.notifications.lock().unwrap().push((
            recipient_id.to_string(),
            item_id.to_string(),
            action.to_string(),
        ));
        Ok(())
    }
}
