//! Devcam Capture Engine
//!
//! Runs the camera session behind a device-as-webcam service. A bound
//! preview client, platform lifecycle callbacks, and native encoder threads
//! all call into one [`StreamingService`], which serializes them through a
//! single session guard and hands captured buffers to the encoder without
//! ever letting the camera reuse a buffer the encoder still reads.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   attach/zoom/toggle   ┌───────────────────────────────┐
//! │ PreviewClient│ ─────────────────────▶ │       StreamingService        │
//! └──────────────┘ ◀── size / rotation ── │  ┌─────────────────────────┐  │
//!                      (listener thread)  │  │ SessionGuard            │  │
//! ┌──────────────┐                        │  │  ┌───────────────────┐  │  │
//! │ CameraBackend│ ── frame sink ───────▶ │  │  │ CameraSession     │  │  │
//! │  (capture)   │ ◀── release_buffer ─── │  │  │  FrameBufferLedger│  │  │
//! └──────────────┘                        │  │  └───────────────────┘  │  │
//!                                         │  └─────────────────────────┘  │
//! ┌──────────────┐ ◀── submit_frame ───── │                               │
//! │NativePipeline│ ── NativeCallbacks ──▶ │  (resolved via HandleRegistry)│
//! │  (encoder)   │                        └───────────────────────────────┘
//! └──────────────┘
//! ```

pub mod backend;
pub mod client;
pub mod gate;
pub mod guard;
pub mod host;
pub mod ledger;
pub mod listener;
pub mod notification;
pub mod pipeline;
pub mod preview_size;
pub mod registry;
pub mod rotation;
pub mod service;
pub mod session;

pub use client::PreviewClient;
pub use guard::SessionState;
pub use host::{NotificationIcon, ServiceHost};
pub use pipeline::{should_start_service, NativePipeline};
pub use service::*;
pub use session::*;
