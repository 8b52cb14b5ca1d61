use std::sync::Arc;

use devcam_common::error::DevcamResult;
use devcam_platform_core::{
    BufferHandle, CameraInfo, CapturedFrame, MeteringRegion, Size, SurfaceHandle,
};

/// Receives frames from the camera's capture thread.
///
/// Ownership of the frame's buffer passes to the sink. It must eventually be
/// handed back through [`CameraBackend::release_buffer`].
pub type FrameSink = Arc<dyn Fn(CapturedFrame) + Send + Sync>;

/// Where a configured capture session sends its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureTargets {
    /// On-screen preview surface and the size it renders at.
    pub preview: Option<(SurfaceHandle, Size)>,
    /// Encoder-facing stream geometry and frame rate.
    pub encoder: Option<(Size, u32)>,
}

impl CaptureTargets {
    pub fn is_empty(&self) -> bool {
        self.preview.is_none() && self.encoder.is_none()
    }
}

/// Abstract interface over a platform camera stack.
///
/// The session calls every method while holding its guard, so
/// implementations must never invoke the [`FrameSink`] synchronously from
/// inside one of these methods.
pub trait CameraBackend: Send {
    /// Human-readable backend name for logs.
    fn name(&self) -> &str;

    /// Cameras the device exposes.
    fn cameras(&self) -> Vec<CameraInfo>;

    /// Open a camera and start delivering frames to `sink` once configured.
    fn open(&mut self, camera_id: &str, sink: FrameSink) -> DevcamResult<()>;

    /// Create or replace the capture session for the given outputs.
    fn configure(&mut self, targets: &CaptureTargets) -> DevcamResult<()>;

    fn set_zoom_ratio(&mut self, ratio: f32) -> DevcamResult<()>;

    /// Apply auto-focus and auto-exposure metering regions.
    fn set_metering_regions(&mut self, regions: &[MeteringRegion]) -> DevcamResult<()>;

    /// Return a buffer previously delivered through the sink.
    fn release_buffer(&mut self, buffer: BufferHandle);

    /// Stop capture and close the camera. Idempotent.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}

pub mod synthetic;

pub use synthetic::{SyntheticCamera, SyntheticCameraStats};
