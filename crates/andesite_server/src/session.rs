//! Shared session registry and the keep-alive ticker.
//!
//! The registry lock is only ever held to copy handles out or mutate the
//! map; nothing awaits while holding it. The ticker copies the target list
//! under the lock, releases it, then pushes through each session's channel.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// Commands pushed to a connection task from outside.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    KeepAlive(i64),
    Disconnect(String),
    /// Ask the client to leave Play and renegotiate configuration.
    Reconfigure,
}

#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub uuid: Uuid,
    pub username: String,
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub fn send(&self, command: SessionCommand) -> bool {
        self.sender.try_send(command).is_ok()
    }
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session, returning its command receiver. A second login
    /// with the same uuid replaces the old handle.
    pub fn register(&self, uuid: Uuid, username: String) -> mpsc::Receiver<SessionCommand> {
        let (sender, receiver) = mpsc::channel(16);
        let handle = SessionHandle {
            uuid,
            username,
            sender,
        };
        let previous = self
            .sessions
            .lock()
            .expect("session registry lock poisoned")
            .insert(uuid, handle);
        if let Some(previous) = previous {
            warn!(username = %previous.username, "replacing stale session");
        }
        receiver
    }

    pub fn unregister(&self, uuid: &Uuid) {
        self.sessions
            .lock()
            .expect("session registry lock poisoned")
            .remove(uuid);
    }

    pub fn count(&self) -> usize {
        self.sessions
            .lock()
            .expect("session registry lock poisoned")
            .len()
    }

    /// Snapshot of all live handles. Senders are cheap clones, so callers
    /// can deliver without touching the lock again.
    pub fn handles(&self) -> Vec<SessionHandle> {
        self.sessions
            .lock()
            .expect("session registry lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    pub fn disconnect_all(&self, reason: &str) {
        for handle in self.handles() {
            handle.send(SessionCommand::Disconnect(reason.to_string()));
        }
    }
}

pub fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Offline-mode identity, stable per name.
pub fn offline_uuid(name: &str) -> Uuid {
    Uuid::new_v3(&Uuid::NAMESPACE_URL, format!("OfflinePlayer:{name}").as_bytes())
}

/// Emits a keep-alive to every session at a fixed cadence. Each connection
/// task tracks its own echo deadline.
pub fn spawn_keepalive_ticker(
    registry: std::sync::Arc<SessionRegistry>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let id = unix_millis();
            for handle in registry.handles() {
                if !handle.send(SessionCommand::KeepAlive(id)) {
                    debug!(username = %handle.username, "keep-alive channel full or closed");
                }
            }
        }
    })
}
