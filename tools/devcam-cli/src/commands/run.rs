//! Run the webcam service against a synthetic camera and a simulated USB host.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Notify;

use devcam_capture_engine::backend::SyntheticCamera;
use devcam_capture_engine::pipeline::{
    NativePipeline, PipelineStats, SyntheticEncoder, SyntheticEncoderConfig,
};
use devcam_capture_engine::{
    should_start_service, NotificationIcon, PreviewClient, ServiceHost, ServiceOptions,
    ServiceStats, StartOutcome, StreamingService,
};
use devcam_common::config::AppConfig;
use devcam_platform_core::{Size, SurfaceHandle, WebcamStreamConfig};

const PREVIEW_SURFACE: SurfaceHandle = SurfaceHandle(1);
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

pub struct RunRequest {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub mjpeg: bool,
    pub duration: Option<Duration>,
    pub front: bool,
    pub json: bool,
}

/// Host that prints notification changes and wakes the CLI on `stop_self`.
struct ConsoleHost {
    stop: Arc<Notify>,
}

impl ServiceHost for ConsoleHost {
    fn start_foreground(&self, icon: NotificationIcon) {
        println!("[service] foreground ({icon:?})");
    }

    fn update_notification(&self, icon: NotificationIcon) {
        println!("[service] notification -> {icon:?}");
    }

    fn stop_self(&self) {
        tracing::info!("Service asked to stop");
        self.stop.notify_one();
    }
}

#[derive(Debug, Serialize)]
struct RunReport {
    stream: WebcamStreamConfig,
    preview_size: Option<Size>,
    preview_size_changes: u32,
    elapsed_secs: f64,
    service: ServiceStats,
    encoder: PipelineStats,
}

pub async fn run(config: &AppConfig, request: RunRequest) -> anyhow::Result<()> {
    let camera = SyntheticCamera::from_defaults(&config.synthetic)?;
    let encoder = Arc::new(SyntheticEncoder::new(SyntheticEncoderConfig::from_defaults(
        &config.synthetic,
    )));
    let stop = Arc::new(Notify::new());
    let host = Arc::new(ConsoleHost { stop: stop.clone() });

    let ignored = &config.service.ignored_nodes;
    if !should_start_service(encoder.as_ref(), ignored) {
        anyhow::bail!("No usable webcam gadget node; service not started");
    }

    let service = StreamingService::new(
        Box::new(camera),
        encoder.clone(),
        host,
        ServiceOptions::from_defaults(&config.service),
    );
    match service.on_start() {
        StartOutcome::Started => {}
        outcome => anyhow::bail!("Service failed to start: {outcome:?}"),
    }

    let client = PreviewClient::new();
    client.on_service_connected(service.clone());
    let Some(size) = client.on_surface_available(PREVIEW_SURFACE) else {
        service.on_destroy();
        anyhow::bail!("Camera reported no usable preview size");
    };
    println!("Preview attached at {size}");

    if request.front && !client.toggle_camera() {
        println!("[WARN] No front lens available; staying on the back camera");
    }
    if let Some(info) = service.camera_info() {
        println!(
            "Camera {} ({:?}), zoom {}..{}",
            info.id, info.lens_facing, info.zoom_range.min, info.zoom_range.max
        );
    }

    let stream = WebcamStreamConfig::new(request.mjpeg, request.width, request.height, request.fps);
    encoder.host_stream_on(stream)?;
    println!(
        "Host streaming {:?} {}x{} @ {} fps",
        stream.format, stream.width, stream.height, stream.fps
    );
    match request.duration {
        Some(d) => println!("Streaming for {}s...", d.as_secs()),
        None => println!("Press Ctrl+C to stop streaming..."),
    }
    println!();

    let started = Instant::now();
    let duration = request.duration;
    tokio::select! {
        _ = async {
            match duration {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending::<()>().await,
            }
        } => {}
        result = tokio::signal::ctrl_c() => result?,
        _ = stop.notified() => println!("Service requested stop"),
    }
    let elapsed = started.elapsed();

    if encoder.is_active() {
        encoder.host_stream_off()?;
    }
    let deadline = Instant::now() + DRAIN_TIMEOUT;
    while Instant::now() < deadline {
        let in_flight = service.stats().session.map(|s| s.ledger.in_flight).unwrap_or(0);
        if in_flight == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let report = RunReport {
        stream,
        preview_size: client.preview_size(),
        preview_size_changes: client.size_changes(),
        elapsed_secs: elapsed.as_secs_f64(),
        service: service.stats(),
        encoder: encoder.stats(),
    };

    client.on_pause();
    client.on_destroy();
    service.on_destroy();

    println!();
    if request.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &RunReport) {
    println!("Streamed for {:.1}s", report.elapsed_secs);
    if let Some(size) = report.preview_size {
        println!(
            "  Preview: {size} ({} renegotiations)",
            report.preview_size_changes
        );
    }
    println!(
        "  Encoder: {} submitted, {} encoded, {} rejected ({:.1}% dropped), {:.2} ms avg",
        report.encoder.frames_submitted,
        report.encoder.frames_encoded,
        report.encoder.frames_rejected,
        report.encoder.drop_rate(),
        report.encoder.encoding_latency_ms
    );
    if let Some(session) = &report.service.session {
        println!(
            "  Buffers: {} registered, {} released, {} still in flight",
            session.ledger.registered, session.ledger.released, session.ledger.in_flight
        );
        println!(
            "  Frames released without stream: {}",
            session.frames_released_idle
        );
    }
}
