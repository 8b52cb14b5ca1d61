//! Streaming service: the process-wide owner of the camera session.
//!
//! Three independent sources call in concurrently: the bound preview
//! client, platform lifecycle callbacks, and native encoder threads. All of
//! them funnel through one [`SessionGuard`], so each observes the same
//! answer to "is the session alive".
//!
//! Native code never holds the service. It gets a [`NativeCallbacks`]
//! carrying a registry handle, and every callback resolves that handle
//! first. After teardown the handle no longer resolves and the callback
//! degrades to a logged no-op.

use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use devcam_common::config::ServiceDefaults;
use devcam_common::error::DevcamError;
use devcam_platform_core::{CameraInfo, CapturedFrame, MeteringRegion, Size, SurfaceHandle};

use crate::backend::{CameraBackend, FrameSink};
use crate::guard::{SessionGuard, SessionState};
use crate::host::ServiceHost;
use crate::listener::{DestroyedCallback, RotationListener};
use crate::notification::{NotificationAnimator, DEFAULT_SETTLE_DELAY};
use crate::pipeline::{NativePipeline, PipelineStats};
use crate::registry::{HandleRegistry, RegistryHandle};
use crate::session::{CameraSession, SessionStats};

static SERVICES: OnceLock<HandleRegistry<ServiceShared>> = OnceLock::new();

fn services() -> &'static HandleRegistry<ServiceShared> {
    SERVICES.get_or_init(HandleRegistry::new)
}

/// Service parameters.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// Preview bound while no webcam stream constrains geometry.
    pub display_bound: Size,
    /// Gadget nodes the pipeline must not claim.
    pub ignored_nodes: Vec<String>,
    pub notification_settle: Duration,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            display_bound: Size::FULL_HD,
            ignored_nodes: Vec::new(),
            notification_settle: DEFAULT_SETTLE_DELAY,
        }
    }
}

impl ServiceOptions {
    pub fn from_defaults(defaults: &ServiceDefaults) -> Self {
        Self {
            display_bound: Size::new(defaults.max_preview_width, defaults.max_preview_height),
            ignored_nodes: defaults.ignored_nodes.clone(),
            notification_settle: Duration::from_millis(defaults.notification_settle_ms),
        }
    }
}

/// Result of [`StreamingService::on_start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum StartOutcome {
    Started,
    /// The native handshake failed; the service has asked to be stopped.
    SetupFailed,
    /// `on_start` already ran for this instance.
    AlreadyStarted,
}

/// Point-in-time view of the service.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ServiceStats {
    pub state: SessionState,
    pub session: Option<SessionStats>,
    pub pipeline: PipelineStats,
}

struct ServiceState {
    session: CameraSession,
    destroyed_callback: Option<DestroyedCallback>,
    handle: RegistryHandle,
}

struct ServiceShared {
    guard: SessionGuard<ServiceState>,
    pending_backend: Mutex<Option<Box<dyn CameraBackend>>>,
    pipeline: Arc<dyn NativePipeline>,
    host: Arc<dyn ServiceHost>,
    notifications: NotificationAnimator,
    options: ServiceOptions,
}

/// Cloneable handle to a streaming service instance.
#[derive(Clone)]
pub struct StreamingService {
    shared: Arc<ServiceShared>,
}

impl StreamingService {
    pub fn new(
        backend: Box<dyn CameraBackend>,
        pipeline: Arc<dyn NativePipeline>,
        host: Arc<dyn ServiceHost>,
        options: ServiceOptions,
    ) -> Self {
        let notifications = NotificationAnimator::new(host.clone(), options.notification_settle);
        Self {
            shared: Arc::new(ServiceShared {
                guard: SessionGuard::new(),
                pending_backend: Mutex::new(Some(backend)),
                pipeline,
                host,
                notifications,
                options,
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        self.shared.guard.state()
    }

    /// Build the camera session and perform the native handshake.
    ///
    /// The foreground notification is shown whether or not the handshake
    /// succeeds. On failure the pipeline is torn down, the service becomes
    /// `Destroyed`, and only then asks the host to stop it.
    pub fn on_start(&self) -> StartOutcome {
        let shared = &self.shared;
        let outcome = shared.guard.initialize(StartOutcome::AlreadyStarted, || {
            let backend = shared
                .pending_backend
                .lock()
                .unwrap_or_else(|p| p.into_inner())
                .take();
            let Some(backend) = backend else {
                tracing::error!("Camera backend already consumed");
                shared.notifications.show_foreground();
                return (None, StartOutcome::SetupFailed);
            };

            let handle = services().register(shared);
            let session = match CameraSession::new(
                backend,
                shared.pipeline.clone(),
                frame_sink(handle),
                shared.options.display_bound,
            ) {
                Ok(session) => session,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create camera session");
                    services().unregister(handle);
                    shared.notifications.show_foreground();
                    return (None, StartOutcome::SetupFailed);
                }
            };

            let setup = shared
                .pipeline
                .setup(&shared.options.ignored_nodes, NativeCallbacks { handle });
            shared.notifications.show_foreground();

            match setup {
                Ok(()) => {
                    tracing::info!(%handle, pipeline = shared.pipeline.name(), "Streaming service started");
                    let state = ServiceState {
                        session,
                        destroyed_callback: None,
                        handle,
                    };
                    (Some(state), StartOutcome::Started)
                }
                Err(e) => {
                    tracing::error!(error = %e, "Native pipeline setup failed; stopping service");
                    shared.pipeline.teardown();
                    session.destroy();
                    services().unregister(handle);
                    (None, StartOutcome::SetupFailed)
                }
            }
        });

        if outcome == StartOutcome::SetupFailed {
            shared.host.stop_self();
        }
        outcome
    }

    /// Tear the service down. Only the first call does any work.
    ///
    /// The destroyed callback runs after the state is already `Destroyed`
    /// and outside the guard; anything it calls on the service is a logged
    /// no-op.
    pub fn on_destroy(&self) -> bool {
        let Some(state) = self.shared.guard.tear_down() else {
            tracing::debug!("Streaming service already destroyed");
            return false;
        };
        let ServiceState {
            session,
            destroyed_callback,
            handle,
        } = state;

        services().unregister(handle);
        self.shared.notifications.cancel_pending();
        if let Some(callback) = destroyed_callback {
            callback();
        }
        self.shared.pipeline.teardown();
        let drained = session.destroy();
        tracing::info!(%handle, drained, "Streaming service destroyed");
        true
    }

    /// Ask the host to stop this service.
    pub fn request_stop(&self) {
        let host = &self.shared.host;
        self.shared.guard.run("stop_service", (), |_| host.stop_self());
    }

    pub fn suitable_preview_size(&self) -> Option<Size> {
        self.shared
            .guard
            .run("get_suitable_preview_size", None, |s| s.session.suitable_preview_size())
    }

    /// Attach a preview surface, replacing any previous one.
    ///
    /// `on_size_changed` is called from the listener thread whenever a
    /// camera toggle or stream change alters the preview geometry.
    pub fn attach_preview(
        &self,
        surface: SurfaceHandle,
        size: Size,
        on_size_changed: impl Fn(Size) + Send + Sync + 'static,
    ) {
        self.shared.guard.run("attach_preview", (), |s| {
            s.session
                .start_preview_streaming(surface, size, Arc::new(on_size_changed))
        })
    }

    pub fn detach_preview(&self) {
        self.shared
            .guard
            .run("detach_preview", (), |s| s.session.stop_preview_streaming())
    }

    pub fn set_zoom(&self, ratio: f32) {
        self.shared
            .guard
            .run("set_zoom", (), |s| s.session.set_zoom_ratio(ratio))
    }

    pub fn zoom(&self) -> f32 {
        self.shared
            .guard
            .run("get_zoom", 1.0, |s| s.session.zoom_ratio())
    }

    pub fn can_toggle_camera(&self) -> bool {
        self.shared
            .guard
            .run("can_toggle_camera", false, |s| s.session.can_toggle_camera())
    }

    /// Returns false when no switch happened.
    pub fn toggle_camera(&self) -> bool {
        self.shared
            .guard
            .run("toggle_camera", false, |s| s.session.toggle_camera())
    }

    pub fn tap_to_focus(&self, regions: &[MeteringRegion]) -> bool {
        self.shared
            .guard
            .run("tap_to_focus", false, |s| s.session.tap_to_focus(regions))
    }

    pub fn camera_info(&self) -> Option<CameraInfo> {
        self.shared
            .guard
            .run("get_camera_info", None, |s| s.session.camera_info().cloned())
    }

    pub fn set_rotation_listener(&self, listener: Option<RotationListener>) {
        self.shared
            .guard
            .run("set_rotation_listener", (), |s| s.session.set_rotation_listener(listener))
    }

    /// Normalized rotation in `[-179, 180]`.
    pub fn current_rotation(&self) -> i32 {
        self.shared
            .guard
            .run("get_current_rotation", 0, |s| s.session.current_rotation())
    }

    pub fn on_device_rotation_changed(&self, degrees: i32) {
        self.shared.guard.run("on_device_rotation_changed", (), |s| {
            s.session.on_device_rotation_changed(degrees)
        })
    }

    /// Register the single callback run right before teardown, or clear it.
    ///
    /// The callback must not call back into service teardown.
    pub fn set_destroyed_callback(&self, callback: Option<DestroyedCallback>) {
        self.shared.guard.run("set_destroyed_callback", (), |s| {
            s.destroyed_callback = callback;
        })
    }

    pub fn set_webcam_stream_config(&self, use_mjpeg: bool, width: u32, height: u32, fps: u32) {
        self.shared.guard.run("set_webcam_stream_config", (), |s| {
            s.session
                .set_webcam_stream_config(use_mjpeg, width, height, fps)
        })
    }

    pub fn start_webcam_streaming(&self) {
        let notifications = &self.shared.notifications;
        self.shared.guard.run("start_webcam_streaming", (), |s| {
            if s.session.start_webcam_streaming() {
                notifications.streaming_changed(true);
            }
        })
    }

    pub fn stop_webcam_streaming(&self) {
        let notifications = &self.shared.notifications;
        self.shared.guard.run("stop_webcam_streaming", (), |s| {
            if s.session.stop_webcam_streaming() {
                notifications.streaming_changed(false);
            }
        })
    }

    /// The encoder finished with the frame captured at `timestamp_ns`.
    pub fn return_image(&self, timestamp_ns: i64) {
        self.shared
            .guard
            .run("return_image", (), |s| {
                s.session.return_image(timestamp_ns);
            })
    }

    /// Accept a frame from the camera.
    pub fn deliver_frame(&self, frame: CapturedFrame) {
        self.shared
            .guard
            .run("deliver_frame", (), |s| s.session.deliver_frame(frame))
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            state: self.shared.guard.state(),
            session: self
                .shared
                .guard
                .try_run("stats", |s| s.session.stats())
                .ok(),
            pipeline: self.shared.pipeline.stats(),
        }
    }
}

fn frame_sink(handle: RegistryHandle) -> FrameSink {
    Arc::new(move |frame: CapturedFrame| match services().resolve(handle) {
        Some(shared) => StreamingService { shared }.deliver_frame(frame),
        None => tracing::debug!(
            %handle,
            timestamp_ns = frame.timestamp_ns,
            "Frame arrived after teardown; dropped"
        ),
    })
}

/// Callbacks the native pipeline uses to reach the service.
///
/// Holds only a registry handle. Each call resolves it and treats a stale
/// handle the same as a call after teardown.
#[derive(Debug, Clone, Copy)]
pub struct NativeCallbacks {
    handle: RegistryHandle,
}

impl NativeCallbacks {
    #[cfg(test)]
    pub(crate) fn dangling() -> Self {
        Self {
            handle: RegistryHandle::dangling(),
        }
    }

    pub fn handle(&self) -> RegistryHandle {
        self.handle
    }

    /// Whether the service behind the handle is still registered.
    pub fn is_valid(&self) -> bool {
        services().resolve(self.handle).is_some()
    }

    fn service(&self, operation: &'static str) -> Option<StreamingService> {
        match services().resolve(self.handle) {
            Some(shared) => Some(StreamingService { shared }),
            None => {
                tracing::error!(
                    operation,
                    handle = %self.handle,
                    "{}",
                    DevcamError::precondition(operation)
                );
                None
            }
        }
    }

    pub fn set_stream_config(&self, use_mjpeg: bool, width: u32, height: u32, fps: u32) {
        if let Some(service) = self.service("set_stream_config") {
            service.set_webcam_stream_config(use_mjpeg, width, height, fps);
        }
    }

    pub fn start_streaming(&self) {
        if let Some(service) = self.service("start_streaming") {
            service.start_webcam_streaming();
        }
    }

    pub fn stop_streaming(&self) {
        if let Some(service) = self.service("stop_streaming") {
            service.stop_webcam_streaming();
        }
    }

    pub fn return_image(&self, timestamp_ns: i64) {
        if let Some(service) = self.service("return_image") {
            service.return_image(timestamp_ns);
        }
    }

    pub fn stop_service(&self) {
        if let Some(service) = self.service("stop_service") {
            service.request_stop();
        }
    }
}
