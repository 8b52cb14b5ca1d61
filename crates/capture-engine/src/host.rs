//! Platform host the streaming service runs inside.

/// Small icon shown in the service's ongoing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum NotificationIcon {
    /// Steady-state icon while no host is streaming.
    Idle,
    /// Steady-state icon while a host is streaming.
    Streaming,
    /// Animated transition into streaming.
    StreamingTransition,
    /// Animated transition back to idle.
    IdleTransition,
}

impl NotificationIcon {
    /// The transition icon and the steady icon it settles on.
    pub fn for_streaming(streaming: bool) -> (NotificationIcon, NotificationIcon) {
        if streaming {
            (NotificationIcon::StreamingTransition, NotificationIcon::Streaming)
        } else {
            (NotificationIcon::IdleTransition, NotificationIcon::Idle)
        }
    }
}

/// Services the hosting platform provides to the streaming service.
///
/// Methods are called while the service holds its session guard, so they
/// must not call back into the service. `stop_self` only schedules the
/// teardown; the platform later calls `StreamingService::on_destroy`.
pub trait ServiceHost: Send + Sync {
    /// Enter the foreground with a user-visible notification.
    fn start_foreground(&self, icon: NotificationIcon);

    /// Redraw the ongoing notification with a new icon.
    fn update_notification(&self, icon: NotificationIcon);

    /// Ask the platform to stop this service.
    fn stop_self(&self);
}
