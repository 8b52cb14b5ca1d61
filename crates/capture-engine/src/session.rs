//! Camera session.
//!
//! Owns the camera backend, the preview attachment, zoom and rotation
//! state, and the hand-off of captured frames to the webcam pipeline. A
//! session is not synchronized itself: it lives inside the service's
//! [`SessionGuard`](crate::guard::SessionGuard) and every method runs with
//! the guard held.
//!
//! The camera is open exactly while something consumes frames: an attached
//! preview, an active webcam stream, or both.

use std::sync::Arc;

use devcam_common::error::DevcamResult;
use devcam_platform_core::{
    CameraInfo, CapturedFrame, LensFacing, MeteringRegion, Size, SurfaceHandle, WebcamStreamConfig,
};

use crate::backend::{CameraBackend, CaptureTargets, FrameSink};
use crate::ledger::{FrameBufferLedger, InFlightFrame, LedgerStats};
use crate::listener::{ListenerExecutor, PreviewSizeListener, RotationListener};
use crate::pipeline::NativePipeline;
use crate::preview_size::suitable_preview_size;
use crate::rotation::{effective_rotation, ui_rotation};

/// A render surface currently receiving preview frames.
pub struct PreviewAttachment {
    pub surface: SurfaceHandle,
    pub size: Size,
    listener: PreviewSizeListener,
}

/// Snapshot of session activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct SessionStats {
    pub ledger: LedgerStats,
    /// Frames the pipeline refused; their buffers went straight back.
    pub frames_rejected: u64,
    /// Frames released without submission because no stream was active.
    pub frames_released_idle: u64,
    pub webcam_streaming: bool,
    pub preview_attached: bool,
    pub camera_open: bool,
    pub zoom_ratio: f32,
}

pub struct CameraSession {
    backend: Box<dyn CameraBackend>,
    pipeline: Arc<dyn NativePipeline>,
    sink: FrameSink,
    cameras: Vec<CameraInfo>,
    active: Option<usize>,
    display_bound: Size,

    preview: Option<PreviewAttachment>,
    stream_config: Option<WebcamStreamConfig>,
    webcam_streaming: bool,

    /// Last ratio the user asked for, before clamping to the active lens.
    zoom_intent: f32,
    zoom_ratio: f32,
    device_rotation: i32,
    rotation_listener: Option<RotationListener>,

    ledger: FrameBufferLedger,
    listeners: ListenerExecutor,
    frames_rejected: u64,
    frames_released_idle: u64,
}

impl CameraSession {
    /// Create a session over `backend`, preferring the back lens.
    pub fn new(
        backend: Box<dyn CameraBackend>,
        pipeline: Arc<dyn NativePipeline>,
        sink: FrameSink,
        display_bound: Size,
    ) -> DevcamResult<Self> {
        let cameras = backend.cameras();
        let active = cameras
            .iter()
            .position(|c| c.lens_facing == LensFacing::Back)
            .or(if cameras.is_empty() { None } else { Some(0) });
        let zoom_ratio = active
            .map(|i| cameras[i].zoom_range.clamp(1.0))
            .unwrap_or(1.0);
        let listeners = ListenerExecutor::spawn("devcam-listeners")?;

        tracing::info!(
            backend = backend.name(),
            cameras = cameras.len(),
            active = ?active.map(|i| cameras[i].lens_facing),
            "Camera session created"
        );

        Ok(Self {
            backend,
            pipeline,
            sink,
            cameras,
            active,
            display_bound,
            preview: None,
            stream_config: None,
            webcam_streaming: false,
            zoom_intent: 1.0,
            zoom_ratio,
            device_rotation: 0,
            rotation_listener: None,
            ledger: FrameBufferLedger::new(),
            listeners,
            frames_rejected: 0,
            frames_released_idle: 0,
        })
    }

    pub fn camera_info(&self) -> Option<&CameraInfo> {
        self.active.and_then(|i| self.cameras.get(i))
    }

    pub fn lens_facing(&self) -> Option<LensFacing> {
        self.camera_info().map(|c| c.lens_facing)
    }

    pub fn is_webcam_streaming(&self) -> bool {
        self.webcam_streaming
    }

    /// Size of the current preview attachment.
    pub fn preview_size(&self) -> Option<Size> {
        self.preview.as_ref().map(|p| p.size)
    }

    pub fn in_flight(&self) -> usize {
        self.ledger.len()
    }

    /// Stream geometry that constrains the preview, if a stream is running.
    fn stream_size(&self) -> Option<Size> {
        if self.webcam_streaming {
            self.stream_config.map(|c| c.size())
        } else {
            None
        }
    }

    pub fn suitable_preview_size(&self) -> Option<Size> {
        let info = self.camera_info()?;
        suitable_preview_size(&info.output_sizes, self.stream_size(), self.display_bound)
    }

    pub fn start_preview_streaming(
        &mut self,
        surface: SurfaceHandle,
        size: Size,
        listener: PreviewSizeListener,
    ) {
        let attachment = PreviewAttachment {
            surface,
            size,
            listener,
        };
        if let Some(previous) = self.preview.replace(attachment) {
            tracing::debug!(previous = %previous.surface, "Replacing preview attachment");
        }
        tracing::info!(%surface, %size, "Preview attached");
        self.apply_capture();
    }

    pub fn stop_preview_streaming(&mut self) {
        if let Some(previous) = self.preview.take() {
            tracing::info!(surface = %previous.surface, "Preview detached");
        }
        self.apply_capture();
    }

    /// Returns false if the stream was already running.
    pub fn start_webcam_streaming(&mut self) -> bool {
        if self.webcam_streaming {
            tracing::debug!("Webcam streaming already active");
            return false;
        }
        self.webcam_streaming = true;
        tracing::info!(config = ?self.stream_config, "Webcam streaming started");
        self.renegotiate_preview();
        self.apply_capture();
        true
    }

    /// Returns false if no stream was running. Frames still in flight are
    /// released as the encoder returns them.
    pub fn stop_webcam_streaming(&mut self) -> bool {
        if !self.webcam_streaming {
            tracing::debug!("Webcam streaming already stopped");
            return false;
        }
        self.webcam_streaming = false;
        tracing::info!(in_flight = self.ledger.len(), "Webcam streaming stopped");
        self.renegotiate_preview();
        self.apply_capture();
        true
    }

    pub fn set_webcam_stream_config(&mut self, use_mjpeg: bool, width: u32, height: u32, fps: u32) {
        if width == 0 || height == 0 {
            tracing::warn!(width, height, "Ignoring stream config with empty geometry");
            return;
        }
        let config = WebcamStreamConfig::new(use_mjpeg, width, height, fps);
        tracing::info!(format = ?config.format, width, height, fps, "Webcam stream configured");
        self.stream_config = Some(config);
        if self.webcam_streaming {
            self.renegotiate_preview();
            self.apply_capture();
        }
    }

    pub fn zoom_ratio(&self) -> f32 {
        self.zoom_ratio
    }

    pub fn set_zoom_ratio(&mut self, ratio: f32) {
        if !ratio.is_finite() {
            tracing::warn!(ratio, "Ignoring non-finite zoom ratio");
            return;
        }
        self.zoom_intent = ratio;
        let range = self.camera_info().map(|c| c.zoom_range).unwrap_or_default();
        self.zoom_ratio = range.clamp(ratio);
        if self.backend.is_open() {
            if let Err(e) = self.backend.set_zoom_ratio(self.zoom_ratio) {
                tracing::warn!(error = %e, "Failed to apply zoom ratio");
            }
        }
    }

    pub fn can_toggle_camera(&self) -> bool {
        let has = |facing: LensFacing| self.cameras.iter().any(|c| c.lens_facing == facing);
        has(LensFacing::Back) && has(LensFacing::Front)
    }

    /// Switch between front and back lenses. Returns false when nothing changed.
    pub fn toggle_camera(&mut self) -> bool {
        if !self.can_toggle_camera() {
            tracing::debug!("Camera toggle ignored; device lacks a front/back pair");
            return false;
        }
        let Some(target) = self.lens_facing().and_then(|f| f.opposite()) else {
            return false;
        };
        let Some(index) = self.cameras.iter().position(|c| c.lens_facing == target) else {
            return false;
        };

        let previous_rotation = self.current_rotation();
        if self.backend.is_open() {
            self.backend.close();
        }
        self.active = Some(index);
        self.zoom_ratio = self.cameras[index].zoom_range.clamp(self.zoom_intent);
        tracing::info!(facing = ?target, zoom = self.zoom_ratio, "Switched camera");

        self.renegotiate_preview();
        self.apply_capture();
        // Lens facing is part of the effective rotation.
        self.notify_rotation_if_changed(previous_rotation);
        true
    }

    /// Forward metering regions. Returns false when the lens cannot focus on a region.
    pub fn tap_to_focus(&mut self, regions: &[MeteringRegion]) -> bool {
        let max_regions = match self.camera_info() {
            Some(info) if info.supports_tap_to_focus() => info.max_af_regions as usize,
            Some(info) => {
                tracing::debug!(camera_id = %info.id, "Tap to focus unsupported");
                return false;
            }
            None => return false,
        };
        if !self.backend.is_open() {
            return false;
        }
        let limit = max_regions.min(regions.len());
        match self.backend.set_metering_regions(&regions[..limit]) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to apply metering regions");
                false
            }
        }
    }

    /// Effective rotation normalized to `[-179, 180]`.
    pub fn current_rotation(&self) -> i32 {
        match self.camera_info() {
            Some(info) => ui_rotation(self.device_rotation, info.sensor_orientation, info.lens_facing),
            None => 0,
        }
    }

    pub fn set_rotation_listener(&mut self, listener: Option<RotationListener>) {
        self.rotation_listener = listener;
    }

    pub fn on_device_rotation_changed(&mut self, degrees: i32) {
        let previous = self.current_rotation();
        self.device_rotation = degrees.rem_euclid(360);
        self.notify_rotation_if_changed(previous);
    }

    fn notify_rotation_if_changed(&self, previous: i32) {
        let current = self.current_rotation();
        if current == previous {
            return;
        }
        tracing::debug!(previous, current, "Rotation changed");
        if let Some(listener) = self.rotation_listener.clone() {
            self.listeners.post(move || listener(current));
        }
    }

    /// Take ownership of a captured frame from the camera.
    pub fn deliver_frame(&mut self, frame: CapturedFrame) {
        if !self.webcam_streaming {
            self.frames_released_idle += 1;
            self.backend.release_buffer(frame.buffer);
            return;
        }

        let rotation = self
            .camera_info()
            .map(|c| effective_rotation(self.device_rotation, c.sensor_orientation, c.lens_facing))
            .unwrap_or(0);
        let entry = InFlightFrame {
            buffer: frame.buffer,
            timestamp_ns: frame.timestamp_ns,
            rotation,
        };
        if let Err(e) = self.ledger.register(entry) {
            tracing::warn!(error = %e, buffer = %frame.buffer, "Dropping frame with duplicate timestamp");
            self.backend.release_buffer(frame.buffer);
            return;
        }

        if let Err(e) = self
            .pipeline
            .submit_frame(frame.buffer, frame.timestamp_ns, rotation)
        {
            self.ledger.reclaim(frame.timestamp_ns);
            self.frames_rejected += 1;
            tracing::debug!(error = %e, timestamp_ns = frame.timestamp_ns, "Frame rejected by pipeline");
            self.backend.release_buffer(frame.buffer);
        }
    }

    /// The encoder is done with the frame captured at `timestamp_ns`.
    pub fn return_image(&mut self, timestamp_ns: i64) -> bool {
        match self.ledger.release(timestamp_ns) {
            Some(frame) => {
                self.backend.release_buffer(frame.buffer);
                true
            }
            None => {
                tracing::warn!(timestamp_ns, "Returned image matches no in-flight frame; ignoring");
                false
            }
        }
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            ledger: self.ledger.stats(),
            frames_rejected: self.frames_rejected,
            frames_released_idle: self.frames_released_idle,
            webcam_streaming: self.webcam_streaming,
            preview_attached: self.preview.is_some(),
            camera_open: self.backend.is_open(),
            zoom_ratio: self.zoom_ratio,
        }
    }

    /// Release everything the session owns. Returns the number of
    /// in-flight frames that were force-released.
    pub fn destroy(mut self) -> usize {
        let drained = self.ledger.drain();
        for frame in &drained {
            self.backend.release_buffer(frame.buffer);
        }
        self.backend.close();
        self.preview = None;
        self.rotation_listener = None;
        self.listeners.shutdown();
        tracing::info!(drained = drained.len(), "Camera session destroyed");
        drained.len()
    }

    /// Notify the preview listener if the achievable geometry changed.
    fn renegotiate_preview(&mut self) {
        let Some(size) = self.suitable_preview_size() else {
            return;
        };
        let Some(attachment) = self.preview.as_mut() else {
            return;
        };
        if attachment.size == size {
            return;
        }
        tracing::info!(from = %attachment.size, to = %size, "Preview size renegotiated");
        attachment.size = size;
        let listener = attachment.listener.clone();
        self.listeners.post(move || listener(size));
    }

    fn capture_targets(&self) -> CaptureTargets {
        CaptureTargets {
            preview: self.preview.as_ref().map(|p| (p.surface, p.size)),
            encoder: if self.webcam_streaming {
                self.stream_config.map(|c| (c.size(), c.fps))
            } else {
                None
            },
        }
    }

    /// Open, reconfigure, or close the camera to match current consumers.
    fn apply_capture(&mut self) {
        if self.preview.is_none() && !self.webcam_streaming {
            if self.backend.is_open() {
                self.backend.close();
                tracing::info!("Capture stopped; no consumers left");
            }
            return;
        }

        let Some(camera_id) = self.camera_info().map(|c| c.id.clone()) else {
            tracing::warn!("No camera available for capture");
            return;
        };
        if !self.backend.is_open() {
            if let Err(e) = self.backend.open(&camera_id, self.sink.clone()) {
                tracing::error!(error = %e, camera_id, "Failed to open camera");
                return;
            }
            if let Err(e) = self.backend.set_zoom_ratio(self.zoom_ratio) {
                tracing::warn!(error = %e, "Failed to apply zoom ratio");
            }
        }

        let targets = self.capture_targets();
        if let Err(e) = self.backend.configure(&targets) {
            tracing::error!(error = %e, camera_id, "Failed to configure capture");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::synthetic::synthetic_camera_info;
    use crate::pipeline::{PipelineStats, SubmitError};
    use crate::service::NativeCallbacks;
    use devcam_platform_core::{BufferHandle, ZoomRange};
    use std::sync::mpsc::{channel, Receiver};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Camera that records calls instead of producing frames.
    #[derive(Default)]
    struct Recorder {
        released: Vec<BufferHandle>,
        open: Option<String>,
        opens: usize,
        last_targets: Option<CaptureTargets>,
        zoom: Option<f32>,
        metering: usize,
    }

    struct FakeCamera {
        cameras: Vec<CameraInfo>,
        log: Arc<Mutex<Recorder>>,
    }

    impl CameraBackend for FakeCamera {
        fn name(&self) -> &str {
            "fake"
        }
        fn cameras(&self) -> Vec<CameraInfo> {
            self.cameras.clone()
        }
        fn open(&mut self, camera_id: &str, _sink: FrameSink) -> DevcamResult<()> {
            let mut log = self.log.lock().unwrap();
            log.open = Some(camera_id.to_string());
            log.opens += 1;
            Ok(())
        }
        fn configure(&mut self, targets: &CaptureTargets) -> DevcamResult<()> {
            self.log.lock().unwrap().last_targets = Some(*targets);
            Ok(())
        }
        fn set_zoom_ratio(&mut self, ratio: f32) -> DevcamResult<()> {
            self.log.lock().unwrap().zoom = Some(ratio);
            Ok(())
        }
        fn set_metering_regions(&mut self, regions: &[MeteringRegion]) -> DevcamResult<()> {
            self.log.lock().unwrap().metering = regions.len();
            Ok(())
        }
        fn release_buffer(&mut self, buffer: BufferHandle) {
            self.log.lock().unwrap().released.push(buffer);
        }
        fn close(&mut self) {
            self.log.lock().unwrap().open = None;
        }
        fn is_open(&self) -> bool {
            self.log.lock().unwrap().open.is_some()
        }
    }

    /// Pipeline that accepts frames until told otherwise.
    #[derive(Default)]
    struct ScriptedPipeline {
        reject: std::sync::atomic::AtomicBool,
        submitted: Mutex<Vec<(i64, i32)>>,
    }

    impl NativePipeline for ScriptedPipeline {
        fn name(&self) -> &str {
            "scripted"
        }
        fn gadget_node_available(&self, _: &[String]) -> bool {
            true
        }
        fn is_active(&self) -> bool {
            true
        }
        fn setup(&self, _: &[String], _: NativeCallbacks) -> DevcamResult<()> {
            Ok(())
        }
        fn submit_frame(&self, _: BufferHandle, ts: i64, rotation: i32) -> Result<(), SubmitError> {
            if self.reject.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(SubmitError::Rejected { status: 1 });
            }
            self.submitted.lock().unwrap().push((ts, rotation));
            Ok(())
        }
        fn teardown(&self) {}
        fn stats(&self) -> PipelineStats {
            PipelineStats::default()
        }
    }

    struct Fixture {
        session: CameraSession,
        log: Arc<Mutex<Recorder>>,
        pipeline: Arc<ScriptedPipeline>,
    }

    fn fixture(cameras: Vec<CameraInfo>) -> Fixture {
        let log = Arc::new(Mutex::new(Recorder::default()));
        let pipeline = Arc::new(ScriptedPipeline::default());
        let backend = FakeCamera {
            cameras,
            log: log.clone(),
        };
        let sink: FrameSink = Arc::new(|_| {});
        let session =
            CameraSession::new(Box::new(backend), pipeline.clone(), sink, Size::FULL_HD).unwrap();
        Fixture {
            session,
            log,
            pipeline,
        }
    }

    fn both_lenses() -> Vec<CameraInfo> {
        vec![
            synthetic_camera_info(LensFacing::Back),
            synthetic_camera_info(LensFacing::Front),
        ]
    }

    fn frame(buffer: u64, ts: i64) -> CapturedFrame {
        CapturedFrame {
            buffer: BufferHandle(buffer),
            timestamp_ns: ts,
            size: Size::new(1280, 720),
        }
    }

    fn size_channel() -> (PreviewSizeListener, Receiver<Size>) {
        let (tx, rx) = channel();
        let tx = Mutex::new(tx);
        let listener: PreviewSizeListener = Arc::new(move |size| {
            let _ = tx.lock().unwrap().send(size);
        });
        (listener, rx)
    }

    #[test]
    fn camera_opens_only_while_consumed() {
        let mut f = fixture(both_lenses());
        let (listener, _rx) = size_channel();
        assert!(!f.session.stats().camera_open);

        f.session
            .start_preview_streaming(SurfaceHandle(1), Size::FULL_HD, listener);
        assert_eq!(f.log.lock().unwrap().open.as_deref(), Some("0"));

        f.session.start_webcam_streaming();
        f.session.stop_preview_streaming();
        assert!(f.session.stats().camera_open);

        f.session.stop_webcam_streaming();
        assert!(!f.session.stats().camera_open);
    }

    #[test]
    fn frames_released_immediately_without_stream() {
        let mut f = fixture(both_lenses());
        f.session.deliver_frame(frame(3, 100));
        assert_eq!(f.log.lock().unwrap().released, vec![BufferHandle(3)]);
        assert_eq!(f.session.in_flight(), 0);
        assert_eq!(f.session.stats().frames_released_idle, 1);
    }

    #[test]
    fn submitted_frames_wait_for_return() {
        let mut f = fixture(both_lenses());
        f.session.start_webcam_streaming();
        f.session.on_device_rotation_changed(90);
        f.session.deliver_frame(frame(1, 10));
        f.session.deliver_frame(frame(2, 20));
        assert_eq!(f.session.in_flight(), 2);
        assert!(f.log.lock().unwrap().released.is_empty());
        assert_eq!(*f.pipeline.submitted.lock().unwrap(), vec![(10, 180), (20, 180)]);

        assert!(f.session.return_image(20));
        assert_eq!(f.log.lock().unwrap().released, vec![BufferHandle(2)]);
        assert!(!f.session.return_image(20));
        assert!(!f.session.return_image(999));
        assert_eq!(f.session.in_flight(), 1);
    }

    #[test]
    fn rejected_frame_is_reclaimed() {
        let mut f = fixture(both_lenses());
        f.session.start_webcam_streaming();
        f.pipeline
            .reject
            .store(true, std::sync::atomic::Ordering::SeqCst);
        f.session.deliver_frame(frame(4, 40));
        assert_eq!(f.session.in_flight(), 0);
        assert_eq!(f.log.lock().unwrap().released, vec![BufferHandle(4)]);
        let stats = f.session.stats();
        assert_eq!(stats.frames_rejected, 1);
        assert_eq!(stats.ledger.registered, 0);
    }

    #[test]
    fn duplicate_timestamp_releases_new_buffer() {
        let mut f = fixture(both_lenses());
        f.session.start_webcam_streaming();
        f.session.deliver_frame(frame(1, 50));
        f.session.deliver_frame(frame(2, 50));
        assert_eq!(f.session.in_flight(), 1);
        assert_eq!(f.log.lock().unwrap().released, vec![BufferHandle(2)]);
    }

    #[test]
    fn destroy_drains_ledger_into_backend() {
        let mut f = fixture(both_lenses());
        f.session.start_webcam_streaming();
        for i in 0..3 {
            f.session.deliver_frame(frame(i, i as i64 + 1));
        }
        let log = f.log.clone();
        assert_eq!(f.session.destroy(), 3);
        let log = log.lock().unwrap();
        assert_eq!(log.released.len(), 3);
        assert!(log.open.is_none());
    }

    #[test]
    fn zoom_intent_carries_across_toggle() {
        let mut f = fixture(both_lenses());
        f.session.set_zoom_ratio(4.0);
        assert_eq!(f.session.zoom_ratio(), 4.0);

        assert!(f.session.toggle_camera());
        assert_eq!(f.session.lens_facing(), Some(LensFacing::Front));
        assert_eq!(f.session.zoom_ratio(), 2.0);

        assert!(f.session.toggle_camera());
        assert_eq!(f.session.zoom_ratio(), 4.0);
    }

    #[test]
    fn toggle_on_single_lens_changes_nothing() {
        let mut back = synthetic_camera_info(LensFacing::Back);
        back.zoom_range = ZoomRange::new(1.0, 3.0);
        let mut f = fixture(vec![back]);
        f.session.set_zoom_ratio(2.5);
        assert!(!f.session.can_toggle_camera());
        assert!(!f.session.toggle_camera());
        assert_eq!(f.session.zoom_ratio(), 2.5);
        assert_eq!(f.session.lens_facing(), Some(LensFacing::Back));
    }

    #[test]
    fn stream_start_renegotiates_preview() {
        let mut f = fixture(both_lenses());
        let (listener, rx) = size_channel();
        let initial = f.session.suitable_preview_size().unwrap();
        assert_eq!(initial, Size::FULL_HD);
        f.session
            .start_preview_streaming(SurfaceHandle(7), initial, listener);

        f.session.set_webcam_stream_config(true, 640, 480, 30);
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        f.session.start_webcam_streaming();
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(1)).unwrap(),
            Size::new(640, 480)
        );
        assert_eq!(f.session.preview_size(), Some(Size::new(640, 480)));
        let targets = f.log.lock().unwrap().last_targets.unwrap();
        assert_eq!(targets.encoder, Some((Size::new(640, 480), 30)));

        f.session.stop_webcam_streaming();
        assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), Size::FULL_HD);
    }

    #[test]
    fn rotation_listener_fires_on_change_only() {
        let mut f = fixture(both_lenses());
        let (tx, rx) = channel();
        let tx = Mutex::new(tx);
        f.session.set_rotation_listener(Some(Arc::new(move |r| {
            let _ = tx.lock().unwrap().send(r);
        })));
        assert_eq!(f.session.current_rotation(), 90);

        f.session.on_device_rotation_changed(0);
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        f.session.on_device_rotation_changed(270);
        assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), 0);
        assert_eq!(f.session.current_rotation(), 0);
    }

    #[test]
    fn tap_to_focus_requires_af_regions_and_open_camera() {
        let mut f = fixture(both_lenses());
        let region = MeteringRegion {
            x: 10,
            y: 10,
            width: 100,
            height: 100,
            weight: 1000,
        };
        assert!(!f.session.tap_to_focus(&[region]));

        let (listener, _rx) = size_channel();
        f.session
            .start_preview_streaming(SurfaceHandle(1), Size::FULL_HD, listener);
        assert!(f.session.tap_to_focus(&[region, region]));
        assert_eq!(f.log.lock().unwrap().metering, 1);

        f.session.toggle_camera();
        assert!(!f.session.tap_to_focus(&[region]));
    }

    #[test]
    fn no_camera_means_no_preview() {
        let f = fixture(Vec::new());
        assert_eq!(f.session.suitable_preview_size(), None);
        assert_eq!(f.session.current_rotation(), 0);
        assert!(f.session.camera_info().is_none());
    }
}
