//! Preview client: the UI-side consumer of a streaming service.
//!
//! Mirrors the lifecycle of a bound preview screen. The service connection
//! arrives on one thread, the render surface on another; the surface path
//! blocks on a [`ReadinessGate`] until the connection is in place. The
//! client's own lock is never held while calling into the service, since
//! service callbacks lock it from other threads.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use devcam_platform_core::{Size, SurfaceHandle};

use crate::gate::ReadinessGate;
use crate::service::StreamingService;

#[derive(Default)]
struct ClientState {
    service: Option<StreamingService>,
    surface: Option<SurfaceHandle>,
    preview_size: Option<Size>,
    ui_rotation: i32,
    size_changes: u32,
    finished: bool,
}

struct ClientShared {
    gate: ReadinessGate,
    state: Mutex<ClientState>,
}

impl ClientShared {
    fn lock(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[derive(Clone)]
pub struct PreviewClient {
    shared: Arc<ClientShared>,
}

impl Default for PreviewClient {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewClient {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(ClientShared {
                gate: ReadinessGate::new(),
                state: Mutex::new(ClientState::default()),
            }),
        }
    }

    /// The service connection is established.
    pub fn on_service_connected(&self, service: StreamingService) {
        self.shared.lock().service = Some(service);
        if !self.shared.gate.open() {
            tracing::debug!("Service reconnected after gate already open");
        }
    }

    /// The service went away without a teardown notification.
    pub fn on_service_disconnected(&self) {
        let mut state = self.shared.lock();
        state.service = None;
        state.finished = true;
    }

    fn service(&self) -> Option<StreamingService> {
        self.shared.lock().service.clone()
    }

    /// A render surface is ready. Blocks until the service is connected.
    ///
    /// Returns the preview size the surface should render at, or `None`
    /// when the service is gone or has no camera.
    pub fn on_surface_available(&self, surface: SurfaceHandle) -> Option<Size> {
        self.shared.gate.wait();
        self.attach(surface)
    }

    /// Like [`on_surface_available`](Self::on_surface_available) but gives
    /// up after `timeout` if the service never connects.
    pub fn on_surface_available_timeout(
        &self,
        surface: SurfaceHandle,
        timeout: Duration,
    ) -> Option<Size> {
        if !self.shared.gate.wait_timeout(timeout) {
            tracing::warn!(%surface, "Service did not connect in time");
            return None;
        }
        self.attach(surface)
    }

    fn attach(&self, surface: SurfaceHandle) -> Option<Size> {
        let service = self.service()?;

        let weak = Arc::downgrade(&self.shared);
        service.set_destroyed_callback(Some(Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                let mut state = shared.lock();
                state.service = None;
                state.finished = true;
                tracing::info!("Streaming service destroyed; preview client finished");
            }
        })));

        let Some(size) = service.suitable_preview_size() else {
            tracing::warn!("No preview size available");
            return None;
        };
        {
            let mut state = self.shared.lock();
            state.surface = Some(surface);
            state.preview_size = Some(size);
        }

        let weak = Arc::downgrade(&self.shared);
        service.attach_preview(surface, size, move |new_size| {
            with_state(&weak, |state| {
                state.preview_size = Some(new_size);
                state.size_changes += 1;
            });
        });

        // Listener first: a rotation landing before the read is still seen.
        let weak = Arc::downgrade(&self.shared);
        service.set_rotation_listener(Some(Arc::new(move |rotation| {
            with_state(&weak, |state| state.ui_rotation = rotation);
        })));
        self.shared.lock().ui_rotation = service.current_rotation();

        tracing::info!(%surface, %size, "Preview client attached");
        Some(size)
    }

    /// The screen left the foreground.
    pub fn on_pause(&self) {
        self.shared.lock().surface = None;
        if let Some(service) = self.service() {
            service.detach_preview();
            service.set_rotation_listener(None);
        }
    }

    /// The screen is going away for good.
    pub fn on_destroy(&self) {
        let service = self.shared.lock().service.take();
        if let Some(service) = service {
            service.set_destroyed_callback(None);
        }
    }

    pub fn toggle_camera(&self) -> bool {
        match self.service() {
            Some(service) if service.can_toggle_camera() => service.toggle_camera(),
            _ => false,
        }
    }

    pub fn set_zoom(&self, ratio: f32) {
        if let Some(service) = self.service() {
            service.set_zoom(ratio);
        }
    }

    /// Current zoom ratio, 1.0 without a service.
    pub fn zoom(&self) -> f32 {
        self.service().map(|s| s.zoom()).unwrap_or(1.0)
    }

    pub fn is_ready(&self) -> bool {
        self.shared.gate.is_open()
    }

    pub fn is_finished(&self) -> bool {
        self.shared.lock().finished
    }

    pub fn preview_size(&self) -> Option<Size> {
        self.shared.lock().preview_size
    }

    /// Number of size changes pushed by the service since creation.
    pub fn size_changes(&self) -> u32 {
        self.shared.lock().size_changes
    }

    pub fn ui_rotation(&self) -> i32 {
        self.shared.lock().ui_rotation
    }

    pub fn surface(&self) -> Option<SurfaceHandle> {
        self.shared.lock().surface
    }
}

fn with_state(weak: &Weak<ClientShared>, f: impl FnOnce(&mut ClientState)) {
    if let Some(shared) = weak.upgrade() {
        f(&mut shared.lock());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_before_connection_times_out() {
        let client = PreviewClient::new();
        assert!(!client.is_ready());
        assert_eq!(
            client.on_surface_available_timeout(SurfaceHandle(1), Duration::from_millis(20)),
            None
        );
        assert!(client.surface().is_none());
    }

    #[test]
    fn disconnected_client_degrades_to_defaults() {
        let client = PreviewClient::new();
        client.on_service_disconnected();
        assert!(client.is_finished());
        assert_eq!(client.zoom(), 1.0);
        assert!(!client.toggle_camera());
        client.set_zoom(3.0);
        client.on_pause();
        client.on_destroy();
    }
}
