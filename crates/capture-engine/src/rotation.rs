//! Device and sensor rotation math.

use devcam_platform_core::LensFacing;

/// Rotation of the camera image relative to the device, in `[0, 360)`.
///
/// Back-facing sensors add their orientation to the device rotation;
/// front-facing sensors are mirrored, so the orientation is subtracted.
pub fn effective_rotation(device_rotation: i32, sensor_orientation: u32, facing: LensFacing) -> i32 {
    let device = device_rotation.rem_euclid(360);
    let sensor = (sensor_orientation % 360) as i32;
    match facing {
        LensFacing::Front => (360 + device - sensor) % 360,
        LensFacing::Back | LensFacing::External => (device + sensor) % 360,
    }
}

/// Map a rotation to `[-179, 180]` so UI never turns more than half a turn.
pub fn normalize_ui_rotation(rotation: i32) -> i32 {
    let rotation = rotation.rem_euclid(360);
    if rotation <= 180 {
        rotation
    } else {
        rotation - 360
    }
}

/// Effective rotation normalized for UI use.
pub fn ui_rotation(device_rotation: i32, sensor_orientation: u32, facing: LensFacing) -> i32 {
    normalize_ui_rotation(effective_rotation(device_rotation, sensor_orientation, facing))
}
