//! Preview size negotiation.
//!
//! Without a webcam stream the preview takes the largest 16:9 output not
//! larger than the display bound (1080p by default). Once a stream is
//! running, the USB host constrains geometry instead: the preview takes
//! the largest output with the stream's aspect ratio that does not
//! exceed the stream size.

use devcam_platform_core::Size;

const DISPLAY_ASPECT: Size = Size::new(16, 9);

/// Pick the preview size for the given supported outputs.
///
/// Returns `None` only when the camera reports no outputs. If nothing
/// matches the target aspect ratio, the largest output within the bound is
/// used, and failing that the smallest output overall.
pub fn suitable_preview_size(
    supported: &[Size],
    stream: Option<Size>,
    display_bound: Size,
) -> Option<Size> {
    let (aspect, bound) = match stream {
        Some(stream) => (stream, stream),
        None => (DISPLAY_ASPECT, display_bound),
    };

    let largest_matching = supported
        .iter()
        .filter(|s| s.same_aspect_as(&aspect) && s.fits_within(&bound))
        .max_by_key(|s| s.area());
    if let Some(size) = largest_matching {
        return Some(*size);
    }

    tracing::debug!(%aspect, %bound, "No output matches target aspect ratio; falling back");
    supported
        .iter()
        .filter(|s| s.fits_within(&bound))
        .max_by_key(|s| s.area())
        .or_else(|| supported.iter().min_by_key(|s| s.area()))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(list: &[(u32, u32)]) -> Vec<Size> {
        list.iter().map(|(w, h)| Size::new(*w, *h)).collect()
    }

    #[test]
    fn no_stream_prefers_largest_16_9_up_to_1080p() {
        let supported = sizes(&[(4032, 3024), (3840, 2160), (1920, 1080), (1280, 960), (1280, 720)]);
        assert_eq!(
            suitable_preview_size(&supported, None, Size::FULL_HD),
            Some(Size::new(1920, 1080))
        );
    }

    #[test]
    fn no_stream_ignores_4_3_even_when_larger() {
        let supported = sizes(&[(1920, 1080), (1280, 960)]);
        assert_eq!(
            suitable_preview_size(&supported, None, Size::FULL_HD),
            Some(Size::new(1920, 1080))
        );
    }

    #[test]
    fn stream_geometry_caps_and_shapes_preview() {
        let supported = sizes(&[(1280, 720), (640, 480), (320, 240)]);
        assert_eq!(
            suitable_preview_size(&supported, Some(Size::new(1280, 720)), Size::FULL_HD),
            Some(Size::new(1280, 720))
        );
        assert_eq!(
            suitable_preview_size(&supported, Some(Size::new(640, 480)), Size::FULL_HD),
            Some(Size::new(640, 480))
        );
    }

    #[test]
    fn stream_smaller_than_matching_outputs_picks_one_that_fits() {
        let supported = sizes(&[(1920, 1080), (1280, 720), (640, 360)]);
        assert_eq!(
            suitable_preview_size(&supported, Some(Size::new(1024, 576)), Size::FULL_HD),
            Some(Size::new(640, 360))
        );
    }

    #[test]
    fn falls_back_when_no_aspect_matches() {
        let supported = sizes(&[(1280, 960), (640, 480)]);
        assert_eq!(
            suitable_preview_size(&supported, None, Size::FULL_HD),
            Some(Size::new(1280, 960))
        );
        let huge_only = sizes(&[(4000, 3000)]);
        assert_eq!(
            suitable_preview_size(&huge_only, None, Size::FULL_HD),
            Some(Size::new(4000, 3000))
        );
    }

    #[test]
    fn no_outputs_means_no_preview() {
        assert_eq!(suitable_preview_size(&[], None, Size::FULL_HD), None);
    }
}
