//! Native UVC gadget pipeline interface.
//!
//! The pipeline owns the USB gadget node, negotiates stream geometry with
//! the host, and encodes frames the service submits. It reports back
//! through [`NativeCallbacks`], always from its own threads.

use devcam_common::error::DevcamResult;
use devcam_platform_core::BufferHandle;

use crate::service::NativeCallbacks;

pub mod synthetic;

pub use synthetic::{SyntheticEncoder, SyntheticEncoderConfig};

/// Why a frame submission was refused. The buffer stays with the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("pipeline is not running")]
    NotRunning,

    #[error("encoder queue full ({depth} frames pending)")]
    QueueFull { depth: usize },

    #[error("pipeline rejected frame with status {status}")]
    Rejected { status: i32 },
}

/// Trait for the native webcam pipeline.
///
/// `submit_frame` is called under the session guard and must not invoke
/// any callback synchronously. `teardown` may also run under the guard on
/// a failed start, so it must not wait for callbacks to complete.
pub trait NativePipeline: Send + Sync {
    fn name(&self) -> &str;

    /// Whether an unclaimed UVC gadget node exists, skipping `ignored_nodes`.
    fn gadget_node_available(&self, ignored_nodes: &[String]) -> bool;

    /// Whether a previous setup is still live.
    fn is_active(&self) -> bool;

    /// Claim the gadget node and start listening for host events.
    fn setup(&self, ignored_nodes: &[String], callbacks: NativeCallbacks) -> DevcamResult<()>;

    /// Hand a captured buffer to the encoder.
    ///
    /// On success the encoder owns the buffer until it calls
    /// [`NativeCallbacks::return_image`] with the same timestamp.
    fn submit_frame(
        &self,
        buffer: BufferHandle,
        timestamp_ns: i64,
        rotation: i32,
    ) -> Result<(), SubmitError>;

    /// Release the gadget node. Idempotent.
    fn teardown(&self);

    fn stats(&self) -> PipelineStats;
}

/// Runtime statistics from the encoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct PipelineStats {
    /// Frames accepted for encoding.
    pub frames_submitted: u64,

    /// Frames finished and returned.
    pub frames_encoded: u64,

    /// Submissions refused.
    pub frames_rejected: u64,

    /// Mean time from submission to return, in milliseconds.
    pub encoding_latency_ms: f64,
}

impl PipelineStats {
    /// Rejection rate as a percentage.
    pub fn drop_rate(&self) -> f64 {
        let total = self.frames_submitted + self.frames_rejected;
        if total == 0 {
            return 0.0;
        }
        self.frames_rejected as f64 / total as f64 * 100.0
    }
}

/// Decide whether the service should be started at all.
///
/// A live pipeline means a previous instance still holds the gadget node.
pub fn should_start_service(pipeline: &dyn NativePipeline, ignored_nodes: &[String]) -> bool {
    if pipeline.is_active() {
        tracing::info!(pipeline = pipeline.name(), "Pipeline already active; not starting");
        return false;
    }
    let available = pipeline.gadget_node_available(ignored_nodes);
    if !available {
        tracing::info!(pipeline = pipeline.name(), "No UVC gadget node available");
    }
    available
}
