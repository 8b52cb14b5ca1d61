//! Devcam platform core contracts.
//!
//! This crate contains the camera, surface, and stream data structures used
//! by the capture engine and its backends without coupling to a concrete
//! camera stack or USB gadget driver.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A frame or surface resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const FULL_HD: Size = Size::new(1920, 1080);

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Exact aspect-ratio comparison by cross-multiplication.
    pub fn same_aspect_as(&self, other: &Size) -> bool {
        self.width as u64 * other.height as u64 == other.width as u64 * self.height as u64
    }

    /// True if neither dimension exceeds the bound.
    pub fn fits_within(&self, bound: &Size) -> bool {
        self.width <= bound.width && self.height <= bound.height
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Size {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
        let width = w
            .parse::<u32>()
            .map_err(|e| format!("invalid width {w:?}: {e}"))?;
        let height = h
            .parse::<u32>()
            .map_err(|e| format!("invalid height {h:?}: {e}"))?;
        if width == 0 || height == 0 {
            return Err(format!("size must be non-zero, got {s:?}"));
        }
        Ok(Size::new(width, height))
    }
}

/// Which physical camera a session is using.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LensFacing {
    #[default]
    Back,
    Front,
    External,
}

impl LensFacing {
    /// The lens a toggle switches to. External cameras have no counterpart.
    pub fn opposite(&self) -> Option<LensFacing> {
        match self {
            LensFacing::Back => Some(LensFacing::Front),
            LensFacing::Front => Some(LensFacing::Back),
            LensFacing::External => None,
        }
    }
}

impl FromStr for LensFacing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "back" => Ok(LensFacing::Back),
            "front" => Ok(LensFacing::Front),
            "external" => Ok(LensFacing::External),
            other => Err(format!("unknown lens facing {other:?}")),
        }
    }
}

/// Supported zoom ratio interval of a camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomRange {
    pub min: f32,
    pub max: f32,
}

impl ZoomRange {
    /// A camera without optical or digital zoom.
    pub const FIXED: ZoomRange = ZoomRange { min: 1.0, max: 1.0 };

    pub fn new(min: f32, max: f32) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Clamp a requested ratio into the range. NaN maps to the lower bound.
    pub fn clamp(&self, ratio: f32) -> f32 {
        if ratio.is_nan() {
            return self.min;
        }
        ratio.clamp(self.min, self.max)
    }
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self::FIXED
    }
}

/// Static description of a camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraInfo {
    /// Backend-specific camera identifier.
    pub id: String,
    pub lens_facing: LensFacing,
    /// Clockwise rotation of the sensor relative to the device's natural orientation.
    pub sensor_orientation: u32,
    pub zoom_range: ZoomRange,
    /// Output sizes the camera can produce.
    pub output_sizes: Vec<Size>,
    /// Maximum number of auto-focus metering regions; zero if unsupported.
    pub max_af_regions: u32,
}

impl CameraInfo {
    pub fn supports_tap_to_focus(&self) -> bool {
        self.max_af_regions > 0
    }
}

/// A metering rectangle in sensor pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeteringRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Weight in `[0, 1000]`.
    pub weight: u32,
}

/// Opaque handle to a render surface supplied by a preview client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceHandle(pub u64);

impl fmt::Display for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// Opaque handle to a camera-owned image buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BufferHandle(pub u64);

impl fmt::Display for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buffer#{}", self.0)
    }
}

/// Encoded format requested by the USB host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamFormat {
    Mjpeg,
    Yuyv,
}

/// Geometry, format, and frame rate of the webcam stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebcamStreamConfig {
    pub format: StreamFormat,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl WebcamStreamConfig {
    pub fn new(use_mjpeg: bool, width: u32, height: u32, fps: u32) -> Self {
        Self {
            format: if use_mjpeg {
                StreamFormat::Mjpeg
            } else {
                StreamFormat::Yuyv
            },
            width,
            height,
            fps,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// A frame produced by the camera, still owned by the camera until handed off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapturedFrame {
    pub buffer: BufferHandle,
    /// Capture timestamp in nanoseconds; unique among frames in flight.
    pub timestamp_ns: i64,
    pub size: Size,
}
