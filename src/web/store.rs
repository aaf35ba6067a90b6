//! In-memory session storage that actually forgets expired sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, ExpiredDeletion, SessionStore};
use tracing::{debug, error};

fn is_active(record: &Record) -> bool {
    record.expiry_date > OffsetDateTime::now_utc()
}

/// Session records keyed by id. Expired records are invisible to `load` and
/// removed by [`SessionMemory::spawn_sweeper`].
#[derive(Clone, Debug, Default)]
pub(crate) struct SessionMemory {
    records: Arc<Mutex<HashMap<Id, Record>>>,
}

impl SessionMemory {
    /// Purges expired records every `every` until the runtime shuts down.
    pub(crate) fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut timer = interval(every);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                timer.tick().await;
                if let Err(err) = store.delete_expired().await {
                    error!("Session sweep failed: {}", err);
                }
            }
        })
    }
}

#[async_trait]
impl SessionStore for SessionMemory {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let mut records = self.records.lock().await;
        while records.contains_key(&record.id) {
            record.id = Id::default();
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.records.lock().await.insert(record.id, record.clone());
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        Ok(self
            .records
            .lock()
            .await
            .get(session_id)
            .filter(|record| is_active(record))
            .cloned())
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.records.lock().await.remove(session_id);
        Ok(())
    }
}

#[async_trait]
impl ExpiredDeletion for SessionMemory {
    async fn delete_expired(&self) -> session_store::Result<()> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|_, record| is_active(record));
        let purged = before - records.len();
        if purged > 0 {
            debug!("Purged {} expired sessions", purged);
        }
        Ok(())
    }
}
