mod common;

use std::time::Duration;

use common::{eventually, lens, phone_lenses, Harness};
use devcam_capture_engine::PreviewClient;
use devcam_platform_core::{LensFacing, Size, SurfaceHandle};

#[test]
fn surface_waits_for_service_connection() {
    let h = Harness::started(phone_lenses());
    let client = PreviewClient::new();

    let waiting = {
        let client = client.clone();
        std::thread::spawn(move || client.on_surface_available(SurfaceHandle(1)))
    };
    std::thread::sleep(Duration::from_millis(30));
    assert!(!waiting.is_finished());

    client.on_service_connected(h.service.clone());
    assert_eq!(waiting.join().unwrap(), Some(Size::FULL_HD));
    assert!(h.camera.is_open());
    assert_eq!(client.ui_rotation(), 90);
}

#[test]
fn stream_geometry_reaches_client_listener() {
    let h = Harness::started(phone_lenses());
    let client = PreviewClient::new();
    client.on_service_connected(h.service.clone());
    client.on_surface_available(SurfaceHandle(1));
    assert_eq!(client.preview_size(), Some(Size::FULL_HD));

    h.stream_on(1280, 720);
    // Same aspect, smaller bound: the preview shrinks to the stream size.
    assert!(eventually(|| client.preview_size() == Some(Size::new(1280, 720))));

    h.pipeline.callbacks().set_stream_config(false, 640, 480, 15);
    assert!(eventually(|| client.preview_size() == Some(Size::new(640, 480))));

    h.pipeline.callbacks().stop_streaming();
    assert!(eventually(|| client.preview_size() == Some(Size::FULL_HD)));
    assert_eq!(client.size_changes(), 3);
}

#[test]
fn device_rotation_reaches_client() {
    let h = Harness::started(phone_lenses());
    let client = PreviewClient::new();
    client.on_service_connected(h.service.clone());
    client.on_surface_available(SurfaceHandle(1));

    h.service.on_device_rotation_changed(270);
    assert!(eventually(|| client.ui_rotation() == 0));
    h.service.on_device_rotation_changed(180);
    assert!(eventually(|| client.ui_rotation() == -90));
}

#[test]
fn pause_detaches_preview_and_stops_capture() {
    let h = Harness::started(phone_lenses());
    let client = PreviewClient::new();
    client.on_service_connected(h.service.clone());
    client.on_surface_available(SurfaceHandle(1));
    assert!(h.camera.is_open());

    client.on_pause();
    assert!(!h.camera.is_open());
    assert!(client.surface().is_none());

    // Rotation listener is gone: the client keeps its last value.
    h.service.on_device_rotation_changed(270);
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(client.ui_rotation(), 90);
}

#[test]
fn service_teardown_finishes_client() {
    let h = Harness::started(phone_lenses());
    let client = PreviewClient::new();
    client.on_service_connected(h.service.clone());
    client.on_surface_available(SurfaceHandle(1));
    assert!(!client.is_finished());

    assert!(h.service.on_destroy());
    assert!(client.is_finished());
    assert_eq!(client.zoom(), 1.0);
    assert!(!client.toggle_camera());
}

#[test]
fn destroyed_client_is_not_notified() {
    let h = Harness::started(phone_lenses());
    let client = PreviewClient::new();
    client.on_service_connected(h.service.clone());
    client.on_surface_available(SurfaceHandle(1));
    client.on_pause();
    client.on_destroy();

    assert!(h.service.on_destroy());
    assert!(!client.is_finished());
}

#[test]
fn client_controls_zoom_and_lens() {
    let h = Harness::started(phone_lenses());
    let client = PreviewClient::new();
    client.on_service_connected(h.service.clone());
    client.on_surface_available(SurfaceHandle(1));

    client.set_zoom(6.0);
    assert_eq!(client.zoom(), 6.0);
    assert!(client.toggle_camera());
    assert_eq!(client.zoom(), 2.0);
    assert_eq!(h.camera.open_camera().as_deref(), Some("1"));
}

#[test]
fn single_lens_client_cannot_toggle() {
    let h = Harness::started(vec![lens(
        LensFacing::Back,
        "0",
        &[(1920, 1080), (1280, 960)],
        (1.0, 4.0),
    )]);
    let client = PreviewClient::new();
    client.on_service_connected(h.service.clone());
    assert_eq!(client.on_surface_available(SurfaceHandle(1)), Some(Size::FULL_HD));
    client.set_zoom(3.0);
    assert!(!client.toggle_camera());
    assert_eq!(client.zoom(), 3.0);
    assert_eq!(h.camera.open_camera().as_deref(), Some("0"));
}

#[test]
fn stream_negotiation_picks_exact_match() {
    let h = Harness::started(vec![lens(
        LensFacing::Back,
        "0",
        &[(1280, 720), (640, 480), (320, 240)],
        (1.0, 1.0),
    )]);
    h.stream_on(1280, 720);
    assert_eq!(h.service.suitable_preview_size(), Some(Size::new(1280, 720)));
}

#[test]
fn lens_switch_renegotiates_preview_size() {
    let h = Harness::started(vec![
        lens(LensFacing::Back, "0", &[(1920, 1080), (1280, 720)], (1.0, 4.0)),
        lens(LensFacing::Front, "1", &[(1280, 720), (640, 480)], (1.0, 2.0)),
    ]);
    let client = PreviewClient::new();
    client.on_service_connected(h.service.clone());
    assert_eq!(client.on_surface_available(SurfaceHandle(1)), Some(Size::FULL_HD));

    assert!(client.toggle_camera());
    assert!(eventually(|| client.preview_size() == Some(Size::new(1280, 720))));
    assert_eq!(client.size_changes(), 1);

    assert!(client.toggle_camera());
    assert!(eventually(|| client.preview_size() == Some(Size::FULL_HD)));
    assert_eq!(client.size_changes(), 2);
}

#[test]
fn lens_switch_notifies_rotation_when_sensors_differ() {
    let sizes = [(1920, 1080), (1280, 720)];
    let mut front = lens(LensFacing::Front, "1", &sizes, (1.0, 2.0));
    // Front sensor mounted like the back one: effective rotations diverge.
    front.sensor_orientation = 90;
    let h = Harness::started(vec![
        lens(LensFacing::Back, "0", &sizes, (1.0, 4.0)),
        front,
    ]);
    let client = PreviewClient::new();
    client.on_service_connected(h.service.clone());
    client.on_surface_available(SurfaceHandle(1));
    assert_eq!(client.ui_rotation(), 90);

    assert!(client.toggle_camera());
    assert!(eventually(|| client.ui_rotation() == -90));
    assert_eq!(h.service.current_rotation(), -90);

    assert!(client.toggle_camera());
    assert!(eventually(|| client.ui_rotation() == 90));
}

#[test]
fn rotation_during_attach_is_not_lost() {
    let h = Harness::started(phone_lenses());
    let client = PreviewClient::new();
    client.on_service_connected(h.service.clone());

    for round in 0..20 {
        client.on_pause();
        let rotating = {
            let service = h.service.clone();
            std::thread::spawn(move || service.on_device_rotation_changed(round * 90))
        };
        client.on_surface_available(SurfaceHandle(1));
        rotating.join().unwrap();

        let expected = h.service.current_rotation();
        assert!(
            eventually(|| client.ui_rotation() == expected),
            "round {round}: client at {} but service at {expected}",
            client.ui_rotation()
        );
    }
}
