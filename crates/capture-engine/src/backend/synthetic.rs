//! Synthetic camera backend.
//!
//! Produces frames from a fixed pool of buffer handles on a paced producer
//! thread. When every buffer is held downstream the producer skips the
//! frame, the same way a real image reader stalls when the consumer does
//! not return images.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use devcam_common::clock::{FrameClock, RateController};
use devcam_common::config::SyntheticDefaults;
use devcam_common::error::{DevcamError, DevcamResult};
use devcam_platform_core::{
    BufferHandle, CameraInfo, CapturedFrame, LensFacing, MeteringRegion, Size, ZoomRange,
};

use super::{CameraBackend, CaptureTargets, FrameSink};

const DEFAULT_FPS: u32 = 30;
const MIN_PRODUCER_SLEEP: Duration = Duration::from_millis(1);

/// Counters for the synthetic producer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct SyntheticCameraStats {
    pub frames_delivered: u64,
    /// Frames skipped because no buffer was free.
    pub frames_starved: u64,
    pub buffers_released: u64,
    pub buffers_free: usize,
}

#[derive(Debug, Clone, Copy)]
struct ProducerSettings {
    size: Size,
    fps: u32,
}

struct Shared {
    free: Mutex<Vec<BufferHandle>>,
    settings: Mutex<ProducerSettings>,
    /// Bumped whenever the running producer must exit.
    generation: AtomicU64,
    clock: FrameClock,
    delivered: AtomicU64,
    starved: AtomicU64,
    released: AtomicU64,
}

pub struct SyntheticCamera {
    cameras: Vec<CameraInfo>,
    shared: Arc<Shared>,
    open_camera: Option<String>,
    sink: Option<FrameSink>,
    producing: bool,
    zoom_ratio: f32,
    metering: Vec<MeteringRegion>,
}

impl SyntheticCamera {
    pub fn new(cameras: Vec<CameraInfo>, buffer_count: usize) -> Self {
        let free = (0..buffer_count.max(1) as u64).rev().map(BufferHandle).collect();
        Self {
            cameras,
            shared: Arc::new(Shared {
                free: Mutex::new(free),
                settings: Mutex::new(ProducerSettings {
                    size: Size::FULL_HD,
                    fps: DEFAULT_FPS,
                }),
                generation: AtomicU64::new(0),
                clock: FrameClock::start(),
                delivered: AtomicU64::new(0),
                starved: AtomicU64::new(0),
                released: AtomicU64::new(0),
            }),
            open_camera: None,
            sink: None,
            producing: false,
            zoom_ratio: 1.0,
            metering: Vec::new(),
        }
    }

    /// Build a synthetic device exposing the configured lenses.
    pub fn from_defaults(defaults: &SyntheticDefaults) -> DevcamResult<Self> {
        let mut cameras = Vec::new();
        for lens in &defaults.lenses {
            let facing: LensFacing = lens.parse().map_err(DevcamError::config)?;
            if cameras.iter().any(|c: &CameraInfo| c.lens_facing == facing) {
                return Err(DevcamError::config(format!("lens {lens:?} listed twice")));
            }
            cameras.push(synthetic_camera_info(facing));
        }
        if cameras.is_empty() {
            return Err(DevcamError::config("synthetic device needs at least one lens"));
        }
        Ok(Self::new(cameras, defaults.buffer_count))
    }

    pub fn stats(&self) -> SyntheticCameraStats {
        SyntheticCameraStats {
            frames_delivered: self.shared.delivered.load(Ordering::Relaxed),
            frames_starved: self.shared.starved.load(Ordering::Relaxed),
            buffers_released: self.shared.released.load(Ordering::Relaxed),
            buffers_free: self.shared.free.lock().unwrap_or_else(|p| p.into_inner()).len(),
        }
    }

    pub fn zoom_ratio(&self) -> f32 {
        self.zoom_ratio
    }

    fn stop_producer(&mut self) {
        if self.producing {
            self.shared.generation.fetch_add(1, Ordering::SeqCst);
            self.producing = false;
            tracing::debug!("Synthetic producer stopped");
        }
    }

    fn start_producer(&mut self) -> DevcamResult<()> {
        let Some(sink) = self.sink.clone() else {
            return Err(DevcamError::camera("camera is not open"));
        };
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let shared = self.shared.clone();
        std::thread::Builder::new()
            .name("devcam-synthetic-camera".to_string())
            .spawn(move || produce(shared, sink, generation))?;
        self.producing = true;
        Ok(())
    }
}

/// The producer never joins: the session may hold its guard while closing,
/// and the producer may be blocked delivering into that same guard.
fn produce(shared: Arc<Shared>, sink: FrameSink, generation: u64) {
    let mut fps = shared.settings.lock().unwrap_or_else(|p| p.into_inner()).fps;
    let mut rate = RateController::new(fps);

    while shared.generation.load(Ordering::SeqCst) == generation {
        let settings = *shared.settings.lock().unwrap_or_else(|p| p.into_inner());
        if settings.fps != fps {
            fps = settings.fps;
            rate = RateController::new(fps);
        }

        let now = shared.clock.elapsed_ns();
        if !rate.should_tick(now) {
            let wait = Duration::from_nanos(rate.remaining_ns(now)).max(MIN_PRODUCER_SLEEP);
            std::thread::sleep(wait);
            continue;
        }

        let buffer = shared.free.lock().unwrap_or_else(|p| p.into_inner()).pop();
        match buffer {
            Some(buffer) => {
                shared.delivered.fetch_add(1, Ordering::Relaxed);
                sink(CapturedFrame {
                    buffer,
                    timestamp_ns: shared.clock.next_timestamp_ns(),
                    size: settings.size,
                });
            }
            None => {
                shared.starved.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("No free buffer; frame skipped");
            }
        }
    }
}

impl CameraBackend for SyntheticCamera {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn cameras(&self) -> Vec<CameraInfo> {
        self.cameras.clone()
    }

    fn open(&mut self, camera_id: &str, sink: FrameSink) -> DevcamResult<()> {
        if !self.cameras.iter().any(|c| c.id == camera_id) {
            return Err(DevcamError::camera(format!("unknown camera {camera_id:?}")));
        }
        self.close();
        self.open_camera = Some(camera_id.to_string());
        self.sink = Some(sink);
        tracing::info!(camera_id, "Synthetic camera opened");
        Ok(())
    }

    fn configure(&mut self, targets: &CaptureTargets) -> DevcamResult<()> {
        if self.open_camera.is_none() {
            return Err(DevcamError::camera("configure called on a closed camera"));
        }
        let settings = match (targets.encoder, targets.preview) {
            (Some((size, fps)), _) => ProducerSettings { size, fps },
            (None, Some((_, size))) => ProducerSettings {
                size,
                fps: DEFAULT_FPS,
            },
            (None, None) => {
                self.stop_producer();
                return Ok(());
            }
        };
        *self.shared.settings.lock().unwrap_or_else(|p| p.into_inner()) = settings;
        tracing::debug!(size = %settings.size, fps = settings.fps, "Synthetic capture configured");
        if !self.producing {
            self.start_producer()?;
        }
        Ok(())
    }

    fn set_zoom_ratio(&mut self, ratio: f32) -> DevcamResult<()> {
        self.zoom_ratio = ratio;
        Ok(())
    }

    fn set_metering_regions(&mut self, regions: &[MeteringRegion]) -> DevcamResult<()> {
        self.metering = regions.to_vec();
        tracing::debug!(regions = regions.len(), "Metering regions applied");
        Ok(())
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        let mut free = self.shared.free.lock().unwrap_or_else(|p| p.into_inner());
        if free.contains(&buffer) {
            tracing::warn!(%buffer, "Buffer released twice");
            return;
        }
        free.push(buffer);
        self.shared.released.fetch_add(1, Ordering::Relaxed);
    }

    fn close(&mut self) {
        self.stop_producer();
        self.sink = None;
        if let Some(id) = self.open_camera.take() {
            tracing::info!(camera_id = %id, "Synthetic camera closed");
        }
    }

    fn is_open(&self) -> bool {
        self.open_camera.is_some()
    }
}

impl Drop for SyntheticCamera {
    fn drop(&mut self) {
        self.close();
    }
}

/// Static description of a synthetic lens.
pub fn synthetic_camera_info(facing: LensFacing) -> CameraInfo {
    let common = [
        (1920, 1080),
        (1280, 960),
        (1280, 720),
        (640, 480),
        (640, 360),
        (320, 240),
    ];
    let sizes = |extra: &[(u32, u32)]| {
        extra
            .iter()
            .chain(common.iter())
            .map(|(w, h)| Size::new(*w, *h))
            .collect::<Vec<_>>()
    };
    match facing {
        LensFacing::Back => CameraInfo {
            id: "0".to_string(),
            lens_facing: facing,
            sensor_orientation: 90,
            zoom_range: ZoomRange::new(1.0, 8.0),
            output_sizes: sizes(&[(4032, 3024), (3840, 2160)]),
            max_af_regions: 1,
        },
        LensFacing::Front => CameraInfo {
            id: "1".to_string(),
            lens_facing: facing,
            sensor_orientation: 270,
            zoom_range: ZoomRange::new(1.0, 2.0),
            output_sizes: sizes(&[]),
            max_af_regions: 0,
        },
        LensFacing::External => CameraInfo {
            id: "ext0".to_string(),
            lens_facing: facing,
            sensor_orientation: 0,
            zoom_range: ZoomRange::FIXED,
            output_sizes: vec![Size::new(1280, 720), Size::new(640, 480)],
            max_af_regions: 0,
        },
    }
}
