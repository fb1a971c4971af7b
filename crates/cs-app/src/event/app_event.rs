use tokio::sync::broadcast;

use cs_core::clipboard::ClipboardRecord;
use cs_core::ids::RecordId;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Notifications emitted by the services after state changes. Consumers
/// (UI layers, integrations) subscribe through [`EventBus`].
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A snapshot was captured. `duplicate` marks re-captures that were
    /// folded into an existing record.
    Captured {
        record: ClipboardRecord,
        duplicate: bool,
    },

    /// A record changed (content edit, tags, note, usage signal).
    Updated { id: RecordId },

    Deleted { id: RecordId },

    /// History was cleared wholesale.
    Cleared,

    /// A reconciliation pass finished; the recommended set may have changed.
    RecommendationsRefreshed,
}

/// Broadcast fan-out for [`AppEvent`]. Publishing never fails: with no
/// subscribers the event is simply dropped.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: AppEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
