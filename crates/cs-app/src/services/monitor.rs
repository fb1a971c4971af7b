use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::{debug, warn};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::interval;

use cs_core::ports::SystemClipboardPort;
use cs_core::settings::MonitorSettings;

use crate::services::capture::CaptureService;

struct MonitorShared {
    clipboard: Arc<dyn SystemClipboardPort>,
    capture: Arc<CaptureService>,
    /// Last observed change-counter value. The lock is held across the
    /// whole observe-read-capture sequence, so the poll task and a change
    /// hint arriving at the same instant cannot capture the same version
    /// twice.
    last_version: Mutex<Option<u64>>,
    hint: Notify,
}

impl MonitorShared {
    async fn poll_once(&self) -> Result<()> {
        let mut guard = self.last_version.lock().await;

        let version = self.clipboard.change_count()?;
        if *guard == Some(version) {
            return Ok(());
        }

        let snapshot = self.clipboard.read()?;
        *guard = Some(snapshot.version);
        if snapshot.is_empty() {
            debug!("clipboard changed to empty/unreadable content, skipped");
            return Ok(());
        }

        self.capture.capture(snapshot).await?;
        Ok(())
    }
}

/// Watches the system clipboard for changes and drives capture.
///
/// Two wake sources converge on one guarded sequence: a fallback polling
/// tick, and [`ChangeMonitor::hint`] for platforms that deliver change
/// notifications. Both paths compare the change counter first, so a hint
/// racing a poll tick costs one extra comparison, never a double capture.
pub struct ChangeMonitor {
    shared: Arc<MonitorShared>,
    poll_interval: Duration,
    running: AtomicBool,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl ChangeMonitor {
    pub fn new(
        clipboard: Arc<dyn SystemClipboardPort>,
        capture: Arc<CaptureService>,
        settings: &MonitorSettings,
    ) -> Self {
        Self {
            shared: Arc::new(MonitorShared {
                clipboard,
                capture,
                last_version: Mutex::new(None),
                hint: Notify::new(),
            }),
            poll_interval: Duration::from_secs(settings.polling_interval_secs.max(1)),
            running: AtomicBool::new(false),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Wake the monitor ahead of the next poll tick. Safe to call from any
    /// task, also while the monitor is stopped.
    pub fn hint(&self) {
        self.shared.hint.notify_one();
    }

    /// Idempotent start.
    pub async fn start(&self) -> Result<()> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        let poll_shared = self.shared.clone();
        let poll_interval = self.poll_interval;
        let poll_handle = tokio::spawn(async move {
            let mut ticker = interval(poll_interval);
            loop {
                ticker.tick().await;
                if let Err(err) = poll_shared.poll_once().await {
                    warn!("clipboard poll failed: {:?}", err);
                }
            }
        });

        let hint_shared = self.shared.clone();
        let hint_handle = tokio::spawn(async move {
            loop {
                hint_shared.hint.notified().await;
                if let Err(err) = hint_shared.poll_once().await {
                    warn!("clipboard hint check failed: {:?}", err);
                }
            }
        });

        *self.handles.lock().await = vec![poll_handle, hint_handle];
        Ok(())
    }

    /// Idempotent stop. After return, no capture is in flight.
    pub async fn stop(&self) -> Result<()> {
        if !self.running.swap(false, Ordering::AcqRel) {
            return Ok(());
        }

        for handle in self.handles.lock().await.drain(..) {
            handle.abort();
        }
        // An aborted task releases the version guard at its next await
        // point; taking it here waits out any in-flight capture.
        let _ = self.shared.last_version.lock().await;
        Ok(())
    }

    /// One synchronous check, outside the background loops. Used at
    /// startup to pick up whatever is already on the clipboard.
    pub async fn check_now(&self) -> Result<()> {
        self.shared.poll_once().await
    }
}
