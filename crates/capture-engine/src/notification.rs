//! Two-stage notification icon updates.
//!
//! A streaming transition first shows the animated icon, then after a
//! fixed delay swaps in the animation's last frame. Without the second
//! stage, any unrelated redraw of the notification replays the animation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::host::{NotificationIcon, ServiceHost};

pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

pub struct NotificationAnimator {
    host: Arc<dyn ServiceHost>,
    settle_delay: Duration,
    generation: Arc<AtomicU64>,
}

impl NotificationAnimator {
    pub fn new(host: Arc<dyn ServiceHost>, settle_delay: Duration) -> Self {
        Self {
            host,
            settle_delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Enter the foreground showing the idle icon.
    pub fn show_foreground(&self) {
        self.host.start_foreground(NotificationIcon::Idle);
    }

    /// Drop any pending settle so nothing reaches the host afterwards.
    pub fn cancel_pending(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Show the transition icon now and the steady icon after the settle delay.
    ///
    /// A newer transition supersedes a pending settle from an older one.
    pub fn streaming_changed(&self, streaming: bool) {
        let (transition, settled) = NotificationIcon::for_streaming(streaming);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.host.update_notification(transition);

        let host = self.host.clone();
        let current = self.generation.clone();
        let delay = self.settle_delay;
        let spawned = std::thread::Builder::new()
            .name("devcam-notif-settle".to_string())
            .spawn(move || {
                std::thread::sleep(delay);
                if current.load(Ordering::SeqCst) == generation {
                    host.update_notification(settled);
                }
            });
        if let Err(e) = spawned {
            tracing::warn!(error = %e, "Could not schedule notification settle; settling now");
            self.host.update_notification(settled);
        }
    }
}
