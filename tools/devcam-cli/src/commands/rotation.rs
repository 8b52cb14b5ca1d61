//! Show frame rotation for a device pose.

use devcam_capture_engine::rotation::{effective_rotation, ui_rotation};
use devcam_platform_core::LensFacing;

pub fn run(device: i32, sensor: u32, front: bool) -> anyhow::Result<()> {
    let facing = if front {
        LensFacing::Front
    } else {
        LensFacing::Back
    };
    println!("Device {device}°, sensor {sensor}°, {facing:?} lens");
    println!(
        "  Encoder rotation: {}°",
        effective_rotation(device, sensor, facing)
    );
    println!("  UI rotation:      {}°", ui_rotation(device, sensor, facing));
    Ok(())
}
