//! Synthetic encoder pipeline.
//!
//! Stands in for the native UVC gadget encoder. Accepted frames wait in a
//! bounded queue, a worker thread "encodes" each one for a fixed latency,
//! then reports the timestamp back. The USB host side is driven manually
//! through [`SyntheticEncoder::host_stream_on`] and friends.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use devcam_common::config::SyntheticDefaults;
use devcam_common::error::{DevcamError, DevcamResult};
use devcam_platform_core::{BufferHandle, WebcamStreamConfig};

use super::{NativePipeline, PipelineStats, SubmitError};
use crate::service::NativeCallbacks;

pub const SYNTHETIC_GADGET_NODE: &str = "/dev/video-devcam";

#[derive(Debug, Clone)]
pub struct SyntheticEncoderConfig {
    /// Frames that may wait for the worker before submissions are rejected.
    pub queue_depth: usize,
    pub encode_latency: Duration,
    /// Gadget node the encoder claims; `None` simulates a device without one.
    pub gadget_node: Option<String>,
    /// Make `setup` fail, as a broken native handshake would.
    pub fail_setup: bool,
}

impl Default for SyntheticEncoderConfig {
    fn default() -> Self {
        Self::from_defaults(&SyntheticDefaults::default())
    }
}

impl SyntheticEncoderConfig {
    pub fn from_defaults(defaults: &SyntheticDefaults) -> Self {
        Self {
            queue_depth: defaults.encoder_queue_depth.max(1),
            encode_latency: Duration::from_millis(defaults.encode_latency_ms),
            gadget_node: Some(SYNTHETIC_GADGET_NODE.to_string()),
            fail_setup: false,
        }
    }
}

struct Job {
    timestamp_ns: i64,
    submitted_at: Instant,
}

struct EncoderShared {
    queue: Mutex<VecDeque<Job>>,
    ready: Condvar,
    callbacks: Mutex<Option<NativeCallbacks>>,
    stream: Mutex<Option<WebcamStreamConfig>>,
    active: AtomicBool,
    /// Bumped under the queue lock on setup and teardown; workers exit on change.
    generation: AtomicU64,
    submitted: AtomicU64,
    encoded: AtomicU64,
    rejected: AtomicU64,
    latency_total_ns: AtomicU64,
}

pub struct SyntheticEncoder {
    config: SyntheticEncoderConfig,
    shared: Arc<EncoderShared>,
}

impl SyntheticEncoder {
    pub fn new(config: SyntheticEncoderConfig) -> Self {
        Self {
            config,
            shared: Arc::new(EncoderShared {
                queue: Mutex::new(VecDeque::new()),
                ready: Condvar::new(),
                callbacks: Mutex::new(None),
                stream: Mutex::new(None),
                active: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                submitted: AtomicU64::new(0),
                encoded: AtomicU64::new(0),
                rejected: AtomicU64::new(0),
                latency_total_ns: AtomicU64::new(0),
            }),
        }
    }

    fn callbacks(&self) -> DevcamResult<NativeCallbacks> {
        self.shared
            .callbacks
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
            .ok_or_else(|| DevcamError::pipeline("encoder is not set up"))
    }

    /// Simulate the USB host opening the stream with the given geometry.
    pub fn host_stream_on(&self, config: WebcamStreamConfig) -> DevcamResult<()> {
        let callbacks = self.callbacks()?;
        *self.shared.stream.lock().unwrap_or_else(|p| p.into_inner()) = Some(config);
        tracing::info!(
            format = ?config.format,
            width = config.width,
            height = config.height,
            fps = config.fps,
            "Host stream on"
        );
        callbacks.set_stream_config(
            config.format == devcam_platform_core::StreamFormat::Mjpeg,
            config.width,
            config.height,
            config.fps,
        );
        callbacks.start_streaming();
        Ok(())
    }

    /// Simulate the USB host closing the stream.
    pub fn host_stream_off(&self) -> DevcamResult<()> {
        let callbacks = self.callbacks()?;
        self.shared.stream.lock().unwrap_or_else(|p| p.into_inner()).take();
        tracing::info!("Host stream off");
        callbacks.stop_streaming();
        Ok(())
    }

    /// Simulate the gadget disappearing, which asks the service to stop.
    pub fn host_disconnect(&self) -> DevcamResult<()> {
        let callbacks = self.callbacks()?;
        tracing::info!("Host disconnected");
        callbacks.stop_service();
        Ok(())
    }

    /// Stream geometry most recently requested by the host.
    pub fn stream_config(&self) -> Option<WebcamStreamConfig> {
        *self.shared.stream.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn pending(&self) -> usize {
        self.shared.queue.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

fn encode_loop(shared: Arc<EncoderShared>, latency: Duration, generation: u64) {
    loop {
        let job = {
            let mut queue = shared.queue.lock().unwrap_or_else(|p| p.into_inner());
            loop {
                if shared.generation.load(Ordering::SeqCst) != generation {
                    tracing::debug!("Encoder worker exiting");
                    return;
                }
                if let Some(job) = queue.pop_front() {
                    break job;
                }
                queue = shared.ready.wait(queue).unwrap_or_else(|p| p.into_inner());
            }
        };

        std::thread::sleep(latency);
        if shared.generation.load(Ordering::SeqCst) != generation {
            return;
        }

        shared.encoded.fetch_add(1, Ordering::Relaxed);
        shared
            .latency_total_ns
            .fetch_add(job.submitted_at.elapsed().as_nanos() as u64, Ordering::Relaxed);

        let callbacks = shared
            .callbacks
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone();
        if let Some(callbacks) = callbacks {
            callbacks.return_image(job.timestamp_ns);
        }
    }
}

impl NativePipeline for SyntheticEncoder {
    fn name(&self) -> &str {
        "synthetic-encoder"
    }

    fn gadget_node_available(&self, ignored_nodes: &[String]) -> bool {
        match &self.config.gadget_node {
            Some(node) => !ignored_nodes.iter().any(|n| n == node),
            None => false,
        }
    }

    fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::SeqCst)
    }

    fn setup(&self, ignored_nodes: &[String], callbacks: NativeCallbacks) -> DevcamResult<()> {
        if self.config.fail_setup {
            return Err(DevcamError::pipeline_setup("native handshake failed"));
        }
        if !self.gadget_node_available(ignored_nodes) {
            return Err(DevcamError::pipeline_setup("no usable UVC gadget node"));
        }
        if self.shared.active.swap(true, Ordering::SeqCst) {
            return Err(DevcamError::pipeline_setup("pipeline already active"));
        }

        *self.shared.callbacks.lock().unwrap_or_else(|p| p.into_inner()) = Some(callbacks);
        let generation = {
            let _queue = self.shared.queue.lock().unwrap_or_else(|p| p.into_inner());
            self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        let shared = self.shared.clone();
        let latency = self.config.encode_latency;
        let spawned = std::thread::Builder::new()
            .name("devcam-synthetic-encoder".to_string())
            .spawn(move || encode_loop(shared, latency, generation));
        if let Err(e) = spawned {
            self.shared.active.store(false, Ordering::SeqCst);
            self.shared.callbacks.lock().unwrap_or_else(|p| p.into_inner()).take();
            return Err(DevcamError::pipeline_setup(format!(
                "failed to spawn encoder worker: {e}"
            )));
        }

        tracing::info!(
            node = self.config.gadget_node.as_deref().unwrap_or("-"),
            queue_depth = self.config.queue_depth,
            "Synthetic encoder ready"
        );
        Ok(())
    }

    fn submit_frame(
        &self,
        buffer: BufferHandle,
        timestamp_ns: i64,
        rotation: i32,
    ) -> Result<(), SubmitError> {
        if !self.is_active() {
            self.shared.rejected.fetch_add(1, Ordering::Relaxed);
            return Err(SubmitError::NotRunning);
        }
        let mut queue = self.shared.queue.lock().unwrap_or_else(|p| p.into_inner());
        if queue.len() >= self.config.queue_depth {
            self.shared.rejected.fetch_add(1, Ordering::Relaxed);
            return Err(SubmitError::QueueFull { depth: queue.len() });
        }
        queue.push_back(Job {
            timestamp_ns,
            submitted_at: Instant::now(),
        });
        self.shared.submitted.fetch_add(1, Ordering::Relaxed);
        self.shared.ready.notify_one();
        tracing::trace!(%buffer, timestamp_ns, rotation, "Frame queued for encode");
        Ok(())
    }

    fn teardown(&self) {
        if !self.shared.active.swap(false, Ordering::SeqCst) {
            return;
        }
        let dropped = {
            let mut queue = self.shared.queue.lock().unwrap_or_else(|p| p.into_inner());
            self.shared.generation.fetch_add(1, Ordering::SeqCst);
            let dropped = queue.len();
            queue.clear();
            self.shared.ready.notify_all();
            dropped
        };
        self.shared.callbacks.lock().unwrap_or_else(|p| p.into_inner()).take();
        self.shared.stream.lock().unwrap_or_else(|p| p.into_inner()).take();
        tracing::info!(dropped, "Synthetic encoder torn down");
    }

    fn stats(&self) -> PipelineStats {
        let encoded = self.shared.encoded.load(Ordering::Relaxed);
        let latency_ns = self.shared.latency_total_ns.load(Ordering::Relaxed);
        PipelineStats {
            frames_submitted: self.shared.submitted.load(Ordering::Relaxed),
            frames_encoded: encoded,
            frames_rejected: self.shared.rejected.load(Ordering::Relaxed),
            encoding_latency_ms: if encoded == 0 {
                0.0
            } else {
                latency_ns as f64 / encoded as f64 / 1_000_000.0
            },
        }
    }
}

impl Drop for SyntheticEncoder {
    fn drop(&mut self) {
        self.teardown();
    }
}
