// ============================================================================
// FREEHAND STROKES - pencil / brush / eraser
// ============================================================================
//
// Every stroke is a chain of round-capped segments. Consecutive capsules
// overlap on a full disc at each sample, which gives round joins for free.
// Rasterization is hard-edged (no coverage blending), matching the pixel look
// of a classic paint program.

use image::Rgba;

use crate::canvas::RasterSurface;

/// Continuity of one freehand stroke.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StrokeState {
    pub last: Option<(f32, f32)>,
    pub active: bool,
}

impl StrokeState {
    /// Pointer went down with a drawing tool.
    pub fn begin(&mut self) {
        self.active = true;
        self.last = None;
    }

    /// Pointer up, pointer left the canvas, or tool switched.
    pub fn end(&mut self) {
        self.active = false;
        self.last = None;
    }
}

/// Extend the current stroke to `(x, y)`.
///
/// With no previous sample a filled disc of diameter `width` is drawn, so a
/// click without drag still leaves a dot.
pub fn stroke_to(
    surface: &mut RasterSurface,
    state: &mut StrokeState,
    x: f32,
    y: f32,
    color: Rgba<u8>,
    width: f32,
) {
    let radius = width.max(1.0) * 0.5;
    match state.last {
        None => fill_disc(surface, (x, y), radius, color),
        Some(prev) => fill_capsule(surface, prev, (x, y), radius, color),
    }
    state.last = Some((x, y));
}

/// Distance from `p` to the segment `a`–`b`.
#[inline]
pub(crate) fn dist_to_segment(p: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    let len2 = dx * dx + dy * dy;
    let t = if len2 > f32::EPSILON {
        (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let cx = a.0 + t * dx;
    let cy = a.1 + t * dy;
    ((p.0 - cx) * (p.0 - cx) + (p.1 - cy) * (p.1 - cy)).sqrt()
}

/// Integer pixel range covering `[min, max]`, clipped to `[0, limit)`.
/// Clipping happens in float space so coordinates far off the canvas never
/// overflow the integer conversion.
#[inline]
pub(crate) fn pixel_span(min: f32, max: f32, limit: u32) -> std::ops::Range<i32> {
    let limit = limit as f32;
    let lo = min.floor().max(0.0).min(limit) as i32;
    let hi = (max.ceil() + 1.0).max(0.0).min(limit) as i32;
    lo..hi.max(lo)
}

/// Paint every pixel whose center lies within `radius` of `center`.
pub(crate) fn fill_disc(surface: &mut RasterSurface, center: (f32, f32), radius: f32, color: Rgba<u8>) {
    fill_capsule(surface, center, center, radius, color);
}

/// Paint every pixel whose center lies within `radius` of the segment `a`–`b`
/// (a line with round caps). The pixels containing the end points are always
/// painted so hairline strokes never vanish.
pub(crate) fn fill_capsule(
    surface: &mut RasterSurface,
    a: (f32, f32),
    b: (f32, f32),
    radius: f32,
    color: Rgba<u8>,
) {
    if !surface.is_available() {
        return;
    }
    let ys = pixel_span(a.1.min(b.1) - radius, a.1.max(b.1) + radius, surface.height());
    let xs = pixel_span(a.0.min(b.0) - radius, a.0.max(b.0) + radius, surface.width());
    for py in ys {
        for px in xs.clone() {
            let d = dist_to_segment((px as f32 + 0.5, py as f32 + 0.5), a, b);
            if d <= radius {
                surface.set_pixel(px, py, color);
            }
        }
    }
    surface.set_pixel(a.0.floor() as i32, a.1.floor() as i32, color);
    surface.set_pixel(b.0.floor() as i32, b.1.floor() as i32, color);
}
