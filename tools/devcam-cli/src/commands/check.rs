//! Check configuration and synthetic device readiness.

use devcam_capture_engine::backend::{CameraBackend, SyntheticCamera};
use devcam_capture_engine::pipeline::{SyntheticEncoder, SyntheticEncoderConfig};
use devcam_capture_engine::should_start_service;
use devcam_common::config::{config_file_path, AppConfig};

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Devcam System Check");
    println!("{}", "=".repeat(50));

    let path = config_file_path();
    if path.exists() {
        println!("[OK] Config file: {}", path.display());
    } else {
        println!("[OK] Config file: {} (not present, using defaults)", path.display());
    }
    match config.validate() {
        Ok(()) => println!("[OK] Configuration valid"),
        Err(e) => println!("[WARN] Configuration invalid: {e}"),
    }
    println!("{}", serde_json::to_string_pretty(config)?);
    println!();

    let mut ready = true;
    match SyntheticCamera::from_defaults(&config.synthetic) {
        Ok(camera) => {
            let cameras = camera.cameras();
            println!("[OK] Cameras detected: {}", cameras.len());
            for c in &cameras {
                let largest = c.output_sizes.iter().max_by_key(|s| s.area());
                println!(
                    "     {} {:?} sensor {}° zoom {}..{} max {} {}",
                    c.id,
                    c.lens_facing,
                    c.sensor_orientation,
                    c.zoom_range.min,
                    c.zoom_range.max,
                    largest.map(ToString::to_string).unwrap_or_else(|| "-".into()),
                    if c.supports_tap_to_focus() { "(tap-to-focus)" } else { "" }
                );
            }
        }
        Err(e) => {
            ready = false;
            println!("[WARN] Synthetic camera: {e}");
        }
    }

    let encoder = SyntheticEncoder::new(SyntheticEncoderConfig::from_defaults(&config.synthetic));
    if should_start_service(&encoder, &config.service.ignored_nodes) {
        println!("[OK] Webcam gadget node available");
    } else {
        ready = false;
        println!("[WARN] No usable webcam gadget node");
    }

    println!();
    if ready {
        println!("Devcam is ready. Try `devcam run --secs 5`.");
    } else {
        println!("Devcam cannot start the webcam service. See above.");
    }
    Ok(())
}
