#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use devcam_capture_engine::backend::{CameraBackend, CaptureTargets, FrameSink};
use devcam_capture_engine::pipeline::{NativePipeline, PipelineStats, SubmitError};
use devcam_capture_engine::{
    NativeCallbacks, NotificationIcon, ServiceHost, ServiceOptions, StreamingService,
};
use devcam_common::error::{DevcamError, DevcamResult};
use devcam_platform_core::{
    BufferHandle, CameraInfo, CapturedFrame, LensFacing, MeteringRegion, Size, ZoomRange,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    Foreground(NotificationIcon),
    Notification(NotificationIcon),
    StopSelf,
}

#[derive(Default)]
pub struct RecordingHost {
    events: Mutex<Vec<HostEvent>>,
}

impl RecordingHost {
    pub fn events(&self) -> Vec<HostEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ServiceHost for RecordingHost {
    fn start_foreground(&self, icon: NotificationIcon) {
        self.events.lock().unwrap().push(HostEvent::Foreground(icon));
    }

    fn update_notification(&self, icon: NotificationIcon) {
        self.events.lock().unwrap().push(HostEvent::Notification(icon));
    }

    fn stop_self(&self) {
        self.events.lock().unwrap().push(HostEvent::StopSelf);
    }
}

/// Pipeline the test drives by hand: it records submissions and exposes
/// the callbacks it was set up with.
#[derive(Default)]
pub struct ManualPipeline {
    pub fail_setup: AtomicBool,
    pub reject: AtomicBool,
    pub no_gadget: AtomicBool,
    active: AtomicBool,
    teardowns: AtomicUsize,
    callbacks: Mutex<Option<NativeCallbacks>>,
    submitted: Mutex<Vec<(BufferHandle, i64, i32)>>,
}

impl ManualPipeline {
    pub fn callbacks(&self) -> NativeCallbacks {
        self.callbacks.lock().unwrap().expect("pipeline was set up")
    }

    pub fn submitted(&self) -> Vec<(BufferHandle, i64, i32)> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn teardowns(&self) -> usize {
        self.teardowns.load(Ordering::SeqCst)
    }

    /// Report every submitted frame as encoded.
    pub fn return_all(&self) {
        let callbacks = self.callbacks();
        let pending: Vec<_> = self.submitted.lock().unwrap().drain(..).collect();
        for (_, ts, _) in pending {
            callbacks.return_image(ts);
        }
    }
}

impl NativePipeline for ManualPipeline {
    fn name(&self) -> &str {
        "manual"
    }

    fn gadget_node_available(&self, _ignored: &[String]) -> bool {
        !self.no_gadget.load(Ordering::SeqCst)
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn setup(&self, _ignored: &[String], callbacks: NativeCallbacks) -> DevcamResult<()> {
        *self.callbacks.lock().unwrap() = Some(callbacks);
        if self.fail_setup.load(Ordering::SeqCst) {
            return Err(DevcamError::pipeline_setup("scripted failure"));
        }
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn submit_frame(
        &self,
        buffer: BufferHandle,
        timestamp_ns: i64,
        rotation: i32,
    ) -> Result<(), SubmitError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(SubmitError::Rejected { status: -1 });
        }
        self.submitted
            .lock()
            .unwrap()
            .push((buffer, timestamp_ns, rotation));
        Ok(())
    }

    fn teardown(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.teardowns.fetch_add(1, Ordering::SeqCst);
    }

    fn stats(&self) -> PipelineStats {
        PipelineStats {
            frames_submitted: self.submitted.lock().unwrap().len() as u64,
            ..Default::default()
        }
    }
}

#[derive(Default)]
struct ProbeState {
    open: Option<String>,
    sink: Option<FrameSink>,
    released: Vec<BufferHandle>,
    targets: Option<CaptureTargets>,
    zoom: Option<f32>,
}

/// Test-side view of a [`ManualCamera`].
#[derive(Clone, Default)]
pub struct CameraProbe {
    state: Arc<Mutex<ProbeState>>,
}

impl CameraProbe {
    /// Push a frame through the sink as the camera thread would.
    pub fn capture(&self, buffer: u64, timestamp_ns: i64) -> bool {
        let sink = self.state.lock().unwrap().sink.clone();
        match sink {
            Some(sink) => {
                sink(CapturedFrame {
                    buffer: BufferHandle(buffer),
                    timestamp_ns,
                    size: Size::new(1280, 720),
                });
                true
            }
            None => false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().unwrap().open.is_some()
    }

    pub fn open_camera(&self) -> Option<String> {
        self.state.lock().unwrap().open.clone()
    }

    pub fn released(&self) -> Vec<BufferHandle> {
        self.state.lock().unwrap().released.clone()
    }

    pub fn targets(&self) -> Option<CaptureTargets> {
        self.state.lock().unwrap().targets
    }
}

/// Camera without a capture thread; frames come from [`CameraProbe::capture`].
pub struct ManualCamera {
    cameras: Vec<CameraInfo>,
    probe: CameraProbe,
}

impl ManualCamera {
    pub fn new(cameras: Vec<CameraInfo>) -> (Self, CameraProbe) {
        let probe = CameraProbe::default();
        (
            Self {
                cameras,
                probe: probe.clone(),
            },
            probe,
        )
    }
}

impl CameraBackend for ManualCamera {
    fn name(&self) -> &str {
        "manual"
    }

    fn cameras(&self) -> Vec<CameraInfo> {
        self.cameras.clone()
    }

    fn open(&mut self, camera_id: &str, sink: FrameSink) -> DevcamResult<()> {
        let mut state = self.probe.state.lock().unwrap();
        state.open = Some(camera_id.to_string());
        state.sink = Some(sink);
        Ok(())
    }

    fn configure(&mut self, targets: &CaptureTargets) -> DevcamResult<()> {
        self.probe.state.lock().unwrap().targets = Some(*targets);
        Ok(())
    }

    fn set_zoom_ratio(&mut self, ratio: f32) -> DevcamResult<()> {
        self.probe.state.lock().unwrap().zoom = Some(ratio);
        Ok(())
    }

    fn set_metering_regions(&mut self, _regions: &[MeteringRegion]) -> DevcamResult<()> {
        Ok(())
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        self.probe.state.lock().unwrap().released.push(buffer);
    }

    fn close(&mut self) {
        let mut state = self.probe.state.lock().unwrap();
        state.open = None;
        state.sink = None;
    }

    fn is_open(&self) -> bool {
        self.probe.state.lock().unwrap().open.is_some()
    }
}

pub fn lens(facing: LensFacing, id: &str, sizes: &[(u32, u32)], zoom: (f32, f32)) -> CameraInfo {
    CameraInfo {
        id: id.to_string(),
        lens_facing: facing,
        sensor_orientation: if facing == LensFacing::Front { 270 } else { 90 },
        zoom_range: ZoomRange::new(zoom.0, zoom.1),
        output_sizes: sizes.iter().map(|(w, h)| Size::new(*w, *h)).collect(),
        max_af_regions: if facing == LensFacing::Back { 1 } else { 0 },
    }
}

pub fn phone_lenses() -> Vec<CameraInfo> {
    let sizes = [(1920, 1080), (1280, 960), (1280, 720), (640, 480), (320, 240)];
    vec![
        lens(LensFacing::Back, "0", &sizes, (1.0, 8.0)),
        lens(LensFacing::Front, "1", &sizes, (1.0, 2.0)),
    ]
}

pub struct Harness {
    pub service: StreamingService,
    pub host: Arc<RecordingHost>,
    pub pipeline: Arc<ManualPipeline>,
    pub camera: CameraProbe,
}

impl Harness {
    pub fn new(cameras: Vec<CameraInfo>) -> Self {
        Self::with_pipeline(cameras, ManualPipeline::default())
    }

    pub fn with_pipeline(cameras: Vec<CameraInfo>, pipeline: ManualPipeline) -> Self {
        let (backend, camera) = ManualCamera::new(cameras);
        let host = Arc::new(RecordingHost::default());
        let pipeline = Arc::new(pipeline);
        let options = ServiceOptions {
            notification_settle: Duration::from_millis(100),
            ..ServiceOptions::default()
        };
        let service =
            StreamingService::new(Box::new(backend), pipeline.clone(), host.clone(), options);
        Self {
            service,
            host,
            pipeline,
            camera,
        }
    }

    pub fn started(cameras: Vec<CameraInfo>) -> Self {
        let harness = Self::new(cameras);
        assert_eq!(
            harness.service.on_start(),
            devcam_capture_engine::StartOutcome::Started
        );
        harness
    }

    /// Simulate a host opening the stream at the given geometry.
    pub fn stream_on(&self, width: u32, height: u32) {
        let callbacks = self.pipeline.callbacks();
        callbacks.set_stream_config(true, width, height, 30);
        callbacks.start_streaming();
    }
}

/// Poll `cond` until it holds or two seconds pass.
pub fn eventually(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}
