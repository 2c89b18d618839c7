//! Coordinate mapping from input-device space to image space.
//!
//! Everything here is pure: the caller passes in the on-screen rectangle,
//! the surface size and the presentation mode, nothing is read from the
//! environment.

use crate::model::ImagePoint;

/// Logical pixel size of the drawing surface (and of the canvas markers
/// are recorded against).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Where the surface currently sits on screen, in device units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ScreenRect {
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x <= self.left + self.width && y >= self.top && y <= self.top + self.height
    }
}

/// Whether the host is showing the surface rotated by 90 degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Presentation {
    #[default]
    Upright,
    Rotated,
}

/// Map a device position onto the surface's logical pixel grid.
///
/// In rotated presentation `buffer` is the size of the surface as it is
/// presented (portrait), so its width is the image height. The rotated
/// result is clamped to the image extent.
pub fn map_pointer(
    rect: ScreenRect,
    buffer: SurfaceSize,
    client_x: f32,
    client_y: f32,
    presentation: Presentation,
) -> ImagePoint {
    let buffer_w = buffer.width as f32;
    let buffer_h = buffer.height as f32;

    match presentation {
        Presentation::Upright => {
            let scale_x = axis_scale(buffer_w, rect.width);
            let scale_y = axis_scale(buffer_h, rect.height);
            let x = (client_x - rect.left) * scale_x;
            let y = (client_y - rect.top) * scale_y;
            ImagePoint::new(x.clamp(0.0, buffer_w), y.clamp(0.0, buffer_h))
        }
        Presentation::Rotated => {
            let x = client_y - rect.top;
            let y = buffer_w - (client_x - rect.left);
            ImagePoint::new(x.clamp(0.0, buffer_h), y.clamp(0.0, buffer_w))
        }
    }
}

fn axis_scale(buffer: f32, display: f32) -> f32 {
    if display > 0.0 {
        buffer / display
    } else {
        1.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchPoint {
    pub id: u64,
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchPhase {
    Start,
    Move,
    End,
    Cancel,
}

/// Pick the device position a touch event stands for.
///
/// Start and move use the first active touch; end and cancel use the first
/// changed touch, since the lifted finger is no longer active.
///
/// For hosts that deliver raw touch lists. egui already folds the primary
/// touch into pointer events, so the desktop app only maps touch cancel.
pub fn touch_position(
    phase: TouchPhase,
    active: &[TouchPoint],
    changed: &[TouchPoint],
) -> Option<(f32, f32)> {
    let touch = match phase {
        TouchPhase::Start | TouchPhase::Move => active.first(),
        TouchPhase::End | TouchPhase::Cancel => changed.first(),
    }?;
    Some((touch.x, touch.y))
}

/// On-screen size for an image inside the available viewport, keeping the
/// aspect ratio and never scaling above native size.
pub fn fit_to_viewport(available: (f32, f32), image: SurfaceSize) -> (f32, f32) {
    if image.is_empty() || available.0 <= 0.0 || available.1 <= 0.0 {
        return (0.0, 0.0);
    }
    let (w, h) = (image.width as f32, image.height as f32);
    let scale = (available.0 / w).min(available.1 / h).min(1.0);
    (w * scale, h * scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_scale_mapping() {
        let rect = ScreenRect::new(0.0, 0.0, 800.0, 600.0);
        let buffer = SurfaceSize::new(1600, 1200);
        let p = map_pointer(rect, buffer, 100.0, 50.0, Presentation::Upright);
        assert_eq!(p, ImagePoint::new(200.0, 100.0));
    }

    #[test]
    fn test_mapping_subtracts_offset() {
        let rect = ScreenRect::new(40.0, 30.0, 800.0, 600.0);
        let buffer = SurfaceSize::new(1600, 1200);
        let p = map_pointer(rect, buffer, 140.0, 80.0, Presentation::Upright);
        assert_eq!(p, ImagePoint::new(200.0, 100.0));
    }

    #[test]
    fn test_mapping_clamps_to_buffer() {
        let rect = ScreenRect::new(10.0, 10.0, 100.0, 100.0);
        let buffer = SurfaceSize::new(200, 100);
        let p = map_pointer(rect, buffer, 0.0, 500.0, Presentation::Upright);
        assert_eq!(p, ImagePoint::new(0.0, 100.0));
    }

    #[test]
    fn test_zero_display_size_does_not_blow_up() {
        let rect = ScreenRect::new(0.0, 0.0, 0.0, 0.0);
        let buffer = SurfaceSize::new(100, 100);
        let p = map_pointer(rect, buffer, 20.0, 30.0, Presentation::Upright);
        assert_eq!(p, ImagePoint::new(20.0, 30.0));
    }

    #[test]
    fn test_rotated_mapping() {
        // Portrait presentation of a 300x200 image: presented width is 200.
        let rect = ScreenRect::new(10.0, 20.0, 200.0, 300.0);
        let buffer = SurfaceSize::new(200, 300);
        let p = map_pointer(rect, buffer, 60.0, 120.0, Presentation::Rotated);
        assert_eq!(p, ImagePoint::new(100.0, 150.0));

        let clamped = map_pointer(rect, buffer, 0.0, 1000.0, Presentation::Rotated);
        assert_eq!(clamped, ImagePoint::new(300.0, 200.0));
    }

    #[test]
    fn test_touch_start_uses_first_active() {
        let active = [
            TouchPoint { id: 1, x: 5.0, y: 6.0 },
            TouchPoint { id: 2, x: 7.0, y: 8.0 },
        ];
        let changed = [TouchPoint { id: 2, x: 7.0, y: 8.0 }];
        assert_eq!(
            touch_position(TouchPhase::Start, &active, &changed),
            Some((5.0, 6.0))
        );
    }

    #[test]
    fn test_touch_end_uses_first_changed() {
        let changed = [TouchPoint { id: 3, x: 1.0, y: 2.0 }];
        assert_eq!(
            touch_position(TouchPhase::End, &[], &changed),
            Some((1.0, 2.0))
        );
        assert_eq!(touch_position(TouchPhase::Cancel, &[], &[]), None);
    }

    #[test]
    fn test_fit_to_viewport_keeps_aspect() {
        let size = fit_to_viewport((400.0, 400.0), SurfaceSize::new(1600, 800));
        assert_eq!(size, (400.0, 200.0));
    }

    #[test]
    fn test_fit_to_viewport_never_upscales() {
        let size = fit_to_viewport((4000.0, 4000.0), SurfaceSize::new(640, 480));
        assert_eq!(size, (640.0, 480.0));
        assert_eq!(fit_to_viewport((100.0, 100.0), SurfaceSize::new(0, 10)), (0.0, 0.0));
    }
}
