use image::Rgba;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::canvas::{RasterSnapshot, RasterSurface};
use crate::ops::stroke::{fill_capsule, pixel_span};

/// Available shape primitives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Line,
    Rectangle,
    /// Always a true circle centred on the drag start.
    Circle,
    Triangle,
    Diamond,
    Arc,
}

impl ShapeKind {
    pub fn label(&self) -> &'static str {
        match self {
            ShapeKind::Line => "Line",
            ShapeKind::Rectangle => "Rectangle",
            ShapeKind::Circle => "Circle",
            ShapeKind::Triangle => "Triangle",
            ShapeKind::Diamond => "Diamond",
            ShapeKind::Arc => "Arc",
        }
    }

    /// Whether the shape encloses an area that can be filled.
    pub fn is_closed(&self) -> bool {
        !matches!(self, ShapeKind::Line | ShapeKind::Arc)
    }

    pub fn all() -> &'static [ShapeKind] {
        &[
            ShapeKind::Line,
            ShapeKind::Rectangle,
            ShapeKind::Circle,
            ShapeKind::Triangle,
            ShapeKind::Diamond,
            ShapeKind::Arc,
        ]
    }
}

/// How a shape's outline is stroked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlineStyle {
    None,
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl OutlineStyle {
    pub fn label(&self) -> &'static str {
        match self {
            OutlineStyle::None => "No outline",
            OutlineStyle::Solid => "Solid",
            OutlineStyle::Dashed => "Dashed",
            OutlineStyle::Dotted => "Dotted",
        }
    }

    pub fn all() -> &'static [OutlineStyle] {
        &[
            OutlineStyle::None,
            OutlineStyle::Solid,
            OutlineStyle::Dashed,
            OutlineStyle::Dotted,
        ]
    }

    pub fn as_key(&self) -> &'static str {
        match self {
            OutlineStyle::None => "none",
            OutlineStyle::Solid => "solid",
            OutlineStyle::Dashed => "dashed",
            OutlineStyle::Dotted => "dotted",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::all().iter().copied().find(|s| s.as_key() == key)
    }

    /// `(on, off)` lengths along the path, scaled by brush size.
    /// `None` means a continuous stroke.
    pub fn dash_pattern(&self, brush_size: f32) -> Option<(f32, f32)> {
        let b = brush_size.max(1.0);
        match self {
            OutlineStyle::None | OutlineStyle::Solid => None,
            OutlineStyle::Dashed => Some((2.0 * b, 2.0 * b)),
            // Zero-length dashes with round caps are dots of diameter b
            OutlineStyle::Dotted => Some((0.0, 2.0 * b)),
        }
    }
}

/// How a closed shape's interior is painted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillStyle {
    #[default]
    None,
    Solid,
}

impl FillStyle {
    pub fn label(&self) -> &'static str {
        match self {
            FillStyle::None => "No fill",
            FillStyle::Solid => "Solid fill",
        }
    }

    pub fn all() -> &'static [FillStyle] {
        &[FillStyle::None, FillStyle::Solid]
    }

    pub fn as_key(&self) -> &'static str {
        match self {
            FillStyle::None => "none",
            FillStyle::Solid => "solid",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::all().iter().copied().find(|s| s.as_key() == key)
    }
}

/// Paint parameters for one shape. The fill uses the same color as the outline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeStyle {
    pub color: Rgba<u8>,
    pub brush_size: f32,
    pub outline: OutlineStyle,
    pub fill: FillStyle,
}

// ============================================================================
// Geometry
// ============================================================================

type Pt = (f32, f32);

/// Control point of the arc: chord midpoint pushed perpendicular to the chord
/// by 0.3 of its components, so the bow always sits to the left of the drag
/// direction.
fn arc_control(start: Pt, end: Pt) -> Pt {
    let mx = (start.0 + end.0) * 0.5;
    let my = (start.1 + end.1) * 0.5;
    let dx = end.0 - start.0;
    let dy = end.1 - start.1;
    (mx + dy * 0.3, my - dx * 0.3)
}

fn curve_segments(length: f32) -> usize {
    ((length / 2.0).ceil() as usize).clamp(24, 720)
}

/// The shape as a polyline. Closed shapes repeat their first vertex at the end.
pub fn shape_outline(kind: ShapeKind, start: Pt, end: Pt) -> Vec<Pt> {
    let (sx, sy) = start;
    let (ex, ey) = end;
    match kind {
        ShapeKind::Line => vec![start, end],
        ShapeKind::Rectangle => vec![(sx, sy), (ex, sy), (ex, ey), (sx, ey), (sx, sy)],
        ShapeKind::Triangle => {
            let apex = ((sx + ex) * 0.5, sy);
            vec![apex, (ex, ey), (sx, ey), apex]
        }
        ShapeKind::Diamond => {
            let mx = (sx + ex) * 0.5;
            let my = (sy + ey) * 0.5;
            vec![(mx, sy), (ex, my), (mx, ey), (sx, my), (mx, sy)]
        }
        ShapeKind::Circle => {
            let r = ((ex - sx).powi(2) + (ey - sy).powi(2)).sqrt();
            let n = curve_segments(std::f32::consts::TAU * r);
            (0..=n)
                .map(|i| {
                    let a = std::f32::consts::TAU * (i % n) as f32 / n as f32;
                    (sx + r * a.cos(), sy + r * a.sin())
                })
                .collect()
        }
        ShapeKind::Arc => {
            let c = arc_control(start, end);
            let chord = ((ex - sx).powi(2) + (ey - sy).powi(2)).sqrt();
            let n = curve_segments(chord * 1.5);
            (0..=n)
                .map(|i| {
                    let t = i as f32 / n as f32;
                    let u = 1.0 - t;
                    (
                        u * u * sx + 2.0 * u * t * c.0 + t * t * ex,
                        u * u * sy + 2.0 * u * t * c.1 + t * t * ey,
                    )
                })
                .collect()
        }
    }
}

/// Axis-aligned clip box for dashing, as `(min, max)` corners.
pub type ClipBox = (Pt, Pt);

/// Parameter range `[t0, t1]` of the segment `a`-`b` inside `clip`
/// (Liang-Barsky), or `None` when it misses the box.
fn clip_segment(a: (f64, f64), b: (f64, f64), clip: ClipBox) -> Option<(f64, f64)> {
    let (min, max) = clip;
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [
        (-dx, a.0 - min.0 as f64),
        (dx, max.0 as f64 - a.0),
        (-dy, a.1 - min.1 as f64),
        (dy, max.1 as f64 - a.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
        }
    }
    (t0 <= t1).then_some((t0, t1))
}

/// Visit the "on" pieces of a dash pattern along a polyline, measured by arc
/// length from the first point. The pattern phase carries across vertices.
/// Only pieces inside `clip` are produced; the first visible dash index is
/// computed directly, so off-canvas length costs nothing.
pub fn for_each_dash(points: &[Pt], on: f32, off: f32, clip: ClipBox, mut emit: impl FnMut(Pt, Pt)) {
    let (on, period) = (on as f64, (on + off) as f64);
    if points.is_empty() || period.is_nan() || period <= 0.0 {
        return;
    }

    let mut walked = 0.0f64;
    for w in points.windows(2) {
        let a = (w[0].0 as f64, w[0].1 as f64);
        let b = (w[1].0 as f64, w[1].1 as f64);
        let len = ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt();
        if len.is_nan() || len <= f64::EPSILON {
            continue;
        }
        if let Some((t0, t1)) = clip_segment(a, b, clip) {
            let at = |s: f64| {
                let t = (s - walked) / len;
                ((a.0 + (b.0 - a.0) * t) as f32, (a.1 + (b.1 - a.1) * t) as f32)
            };
            let (lo, hi) = (walked + t0 * len, walked + t1 * len);
            let mut k = (lo / period).floor() as i64;
            loop {
                let on_start = k as f64 * period;
                if on_start > hi {
                    break;
                }
                let s0 = on_start.max(lo);
                let s1 = (on_start + on).min(hi);
                if s1 >= s0 {
                    emit(at(s0), at(s1));
                }
                k += 1;
            }
        }
        walked += len;
    }

    // A degenerate path still starts with an "on" dash
    if walked <= f64::EPSILON {
        emit(points[0], points[0]);
    }
}

/// Collected form of [`for_each_dash`].
pub fn dash_segments(points: &[Pt], on: f32, off: f32, clip: ClipBox) -> Vec<(Pt, Pt)> {
    let mut out = Vec::new();
    for_each_dash(points, on, off, clip, |a, b| out.push((a, b)));
    out
}

/// Horizontal pixel spans whose centers fall inside the polygon (even-odd).
fn polygon_spans(poly: &[Pt], width: u32, height: u32) -> Vec<(i32, i32, i32)> {
    if poly.len() < 3 || width == 0 || height == 0 {
        return Vec::new();
    }
    let min_y = poly.iter().map(|p| p.1).fold(f32::MAX, f32::min);
    let max_y = poly.iter().map(|p| p.1).fold(f32::MIN, f32::max);
    let rows = pixel_span(min_y, max_y, height);
    if rows.is_empty() {
        return Vec::new();
    }

    rows.into_par_iter()
        .flat_map_iter(|py| {
            let yc = py as f32 + 0.5;
            let mut xs: Vec<f32> = Vec::new();
            let n = poly.len();
            let mut j = n - 1;
            for i in 0..n {
                let (a, b) = (poly[i], poly[j]);
                if (a.1 <= yc) != (b.1 <= yc) {
                    xs.push(a.0 + (yc - a.1) * (b.0 - a.0) / (b.1 - a.1));
                }
                j = i;
            }
            xs.sort_by(|l, r| l.total_cmp(r));
            xs.chunks_exact(2)
                .filter_map(|pair| {
                    let lo = (pair[0] - 0.5).ceil().max(0.0).min(width as f32) as i32;
                    let hi = (pair[1] - 0.5).ceil().max(0.0).min(width as f32) as i32;
                    (hi > lo).then_some((py, lo, hi))
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

fn fill_polygon(surface: &mut RasterSurface, poly: &[Pt], color: Rgba<u8>) {
    let color = Rgba([color[0], color[1], color[2], 255]);
    for (py, lo, hi) in polygon_spans(poly, surface.width(), surface.height()) {
        for px in lo..hi {
            surface.set_pixel(px, py, color);
        }
    }
}

fn stroke_polyline(surface: &mut RasterSurface, points: &[Pt], style: &ShapeStyle) {
    let radius = style.brush_size.max(1.0) * 0.5;
    match style.outline.dash_pattern(style.brush_size) {
        None => {
            for w in points.windows(2) {
                fill_capsule(surface, w[0], w[1], radius, style.color);
            }
        }
        Some((on, off)) => {
            // Canvas grown by the brush reach; dashes beyond it leave no pixels
            let reach = radius + 1.0;
            let clip = (
                (-reach, -reach),
                (surface.width() as f32 + reach, surface.height() as f32 + reach),
            );
            for_each_dash(points, on, off, clip, |a, b| {
                fill_capsule(surface, a, b, radius, style.color);
            });
        }
    }
}

/// Draw the final shape for a drag from `start` to `end`.
///
/// The fill (closed shapes only) goes down before the outline.
pub fn draw_shape(surface: &mut RasterSurface, kind: ShapeKind, start: Pt, end: Pt, style: &ShapeStyle) {
    if !surface.is_available() {
        return;
    }
    let points = shape_outline(kind, start, end);
    if kind.is_closed() && style.fill == FillStyle::Solid {
        fill_polygon(surface, &points, style.color);
    }
    if style.outline != OutlineStyle::None {
        stroke_polyline(surface, &points, style);
    }
}

/// Restore the pre-drag raster, then draw the shape on top of it.
pub fn preview_shape(
    surface: &mut RasterSurface,
    snapshot: &RasterSnapshot,
    kind: ShapeKind,
    start: Pt,
    end: Pt,
    style: &ShapeStyle,
) {
    surface.restore(snapshot);
    draw_shape(surface, kind, start, end, style);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::BACKGROUND;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    fn style(brush: f32, outline: OutlineStyle, fill: FillStyle) -> ShapeStyle {
        ShapeStyle { color: BLACK, brush_size: brush, outline, fill }
    }

    #[test]
    fn rectangle_commit_draws_border_only() {
        let mut s = RasterSurface::new(80, 60);
        let st = style(5.0, OutlineStyle::Solid, FillStyle::None);
        draw_shape(&mut s, ShapeKind::Rectangle, (10.0, 10.0), (50.0, 40.0), &st);
        for (x, y) in [(10, 10), (50, 10), (10, 40), (50, 40), (30, 10), (30, 40), (10, 25), (50, 25)] {
            assert_eq!(s.get_pixel(x, y), Some(BLACK), "border at ({x}, {y})");
        }
        for y in 14..37 {
            for x in 14..47 {
                assert_eq!(s.get_pixel(x, y), Some(BACKGROUND), "interior at ({x}, {y})");
            }
        }
        assert_eq!(s.get_pixel(5, 5), Some(BACKGROUND));
        assert_eq!(s.get_pixel(55, 45), Some(BACKGROUND));
    }

    #[test]
    fn dragging_backwards_gives_the_same_rectangle() {
        let st = style(4.0, OutlineStyle::Solid, FillStyle::Solid);
        let mut a = RasterSurface::new(64, 64);
        let mut b = RasterSurface::new(64, 64);
        draw_shape(&mut a, ShapeKind::Rectangle, (10.0, 12.0), (40.0, 50.0), &st);
        draw_shape(&mut b, ShapeKind::Rectangle, (40.0, 50.0), (10.0, 12.0), &st);
        assert_eq!(a.to_raw_rgba(), b.to_raw_rgba());
        let mut c = RasterSurface::new(64, 64);
        draw_shape(&mut c, ShapeKind::Rectangle, (40.0, 12.0), (10.0, 50.0), &st);
        assert_eq!(a.to_raw_rgba(), c.to_raw_rgba());
    }

    #[test]
    fn previews_do_not_accumulate() {
        let st = style(2.0, OutlineStyle::Solid, FillStyle::None);
        let mut s = RasterSurface::new(100, 100);
        s.set_pixel(90, 90, Rgba([1, 2, 3, 255]));
        let snap = s.snapshot();

        preview_shape(&mut s, &snap, ShapeKind::Rectangle, (10.0, 10.0), (30.0, 30.0), &st);
        assert_eq!(s.get_pixel(30, 20), Some(BLACK));
        preview_shape(&mut s, &snap, ShapeKind::Rectangle, (10.0, 10.0), (60.0, 60.0), &st);
        assert_eq!(s.get_pixel(30, 20), Some(BACKGROUND));
        assert_eq!(s.get_pixel(60, 20), Some(BLACK));

        let mut expected = RasterSurface::new(100, 100);
        expected.set_pixel(90, 90, Rgba([1, 2, 3, 255]));
        draw_shape(&mut expected, ShapeKind::Rectangle, (10.0, 10.0), (60.0, 60.0), &st);
        assert_eq!(s.to_raw_rgba(), expected.to_raw_rgba());
    }

    #[test]
    fn line_ignores_fill() {
        let mut s = RasterSurface::new(60, 60);
        let st = style(3.0, OutlineStyle::Solid, FillStyle::Solid);
        draw_shape(&mut s, ShapeKind::Line, (5.0, 5.0), (55.0, 55.0), &st);
        assert_eq!(s.get_pixel(30, 30), Some(BLACK));
        assert_eq!(s.get_pixel(40, 10), Some(BACKGROUND));
        assert_eq!(s.get_pixel(10, 40), Some(BACKGROUND));
    }

    #[test]
    fn circle_is_centred_on_start() {
        let mut s = RasterSurface::new(100, 100);
        let st = style(2.0, OutlineStyle::Solid, FillStyle::None);
        draw_shape(&mut s, ShapeKind::Circle, (50.0, 50.0), (70.0, 50.0), &st);
        for (x, y) in [(70, 50), (50, 30), (29, 50), (50, 69)] {
            assert_eq!(s.get_pixel(x, y), Some(BLACK), "ring at ({x}, {y})");
        }
        assert_eq!(s.get_pixel(50, 50), Some(BACKGROUND));
        assert_eq!(s.get_pixel(50, 26), Some(BACKGROUND));
        // Not the bounding-box ellipse of the drag
        assert_eq!(s.get_pixel(60, 45), Some(BACKGROUND));
    }

    #[test]
    fn filled_circle_covers_the_centre() {
        let mut s = RasterSurface::new(100, 100);
        let st = style(2.0, OutlineStyle::None, FillStyle::Solid);
        draw_shape(&mut s, ShapeKind::Circle, (50.0, 50.0), (50.0, 80.0), &st);
        assert_eq!(s.get_pixel(50, 50), Some(BLACK));
        assert_eq!(s.get_pixel(70, 60), Some(BLACK));
        assert_eq!(s.get_pixel(75, 75), Some(BACKGROUND));
    }

    #[test]
    fn triangle_apex_is_above_the_base_midpoint() {
        let mut s = RasterSurface::new(64, 64);
        let st = style(2.0, OutlineStyle::None, FillStyle::Solid);
        draw_shape(&mut s, ShapeKind::Triangle, (10.0, 10.0), (50.0, 50.0), &st);
        assert_eq!(s.get_pixel(30, 11), Some(BLACK));
        assert_eq!(s.get_pixel(30, 40), Some(BLACK));
        assert_eq!(s.get_pixel(11, 49), Some(BLACK));
        assert_eq!(s.get_pixel(12, 12), Some(BACKGROUND));
        assert_eq!(s.get_pixel(48, 12), Some(BACKGROUND));
    }

    #[test]
    fn diamond_touches_edge_midpoints() {
        let mut s = RasterSurface::new(64, 64);
        let st = style(2.0, OutlineStyle::Solid, FillStyle::None);
        draw_shape(&mut s, ShapeKind::Diamond, (10.0, 10.0), (50.0, 50.0), &st);
        for (x, y) in [(30, 10), (50, 30), (30, 50), (10, 30), (20, 20)] {
            assert_eq!(s.get_pixel(x, y), Some(BLACK), "edge at ({x}, {y})");
        }
        assert_eq!(s.get_pixel(11, 11), Some(BACKGROUND));
        assert_eq!(s.get_pixel(30, 30), Some(BACKGROUND));
    }

    #[test]
    fn arc_bows_away_from_the_chord() {
        let mut s = RasterSurface::new(100, 80);
        let st = style(2.0, OutlineStyle::Solid, FillStyle::Solid);
        draw_shape(&mut s, ShapeKind::Arc, (10.0, 50.0), (90.0, 50.0), &st);
        assert_eq!(s.get_pixel(10, 50), Some(BLACK));
        assert_eq!(s.get_pixel(90, 50), Some(BLACK));
        // Curve midpoint: halfway between chord (y=50) and control (y=26)
        assert_eq!(s.get_pixel(50, 38), Some(BLACK));
        assert_eq!(s.get_pixel(50, 50), Some(BACKGROUND));
        assert_eq!(s.get_pixel(50, 26), Some(BACKGROUND));
        assert_eq!(s.get_pixel(50, 45), Some(BACKGROUND));
    }

    #[test]
    fn dashed_outline_leaves_gaps() {
        let mut s = RasterSurface::new(120, 20);
        let st = style(4.0, OutlineStyle::Dashed, FillStyle::None);
        draw_shape(&mut s, ShapeKind::Line, (0.0, 10.0), (100.0, 10.0), &st);
        assert_eq!(s.get_pixel(4, 10), Some(BLACK));
        assert_eq!(s.get_pixel(12, 10), Some(BACKGROUND));
        assert_eq!(s.get_pixel(20, 10), Some(BLACK));
        assert_eq!(s.get_pixel(28, 10), Some(BACKGROUND));
    }

    #[test]
    fn dotted_outline_is_a_row_of_dots() {
        let mut s = RasterSurface::new(120, 20);
        let st = style(4.0, OutlineStyle::Dotted, FillStyle::None);
        draw_shape(&mut s, ShapeKind::Line, (0.0, 10.0), (100.0, 10.0), &st);
        assert_eq!(s.get_pixel(8, 10), Some(BLACK));
        assert_eq!(s.get_pixel(16, 10), Some(BLACK));
        assert_eq!(s.get_pixel(4, 10), Some(BACKGROUND));
        assert_eq!(s.get_pixel(12, 10), Some(BACKGROUND));
    }

    #[test]
    fn dash_phase_carries_across_corners() {
        let pts = [(0.0, 0.0), (5.0, 0.0), (5.0, 8.0)];
        let pieces = dash_segments(&pts, 4.0, 4.0, ((-10.0, -10.0), (100.0, 100.0)));
        assert_eq!(pieces[0], ((0.0, 0.0), (4.0, 0.0)));
        // Second dash starts at arc length 8: 3 units down the vertical edge
        assert_eq!(pieces[1], ((5.0, 3.0), (5.0, 7.0)));
        assert_eq!(pieces.len(), 2);
    }

    #[test]
    fn dashes_are_clipped_to_the_box() {
        let pts = [(0.0, 0.0), (1.0e8, 0.0)];
        let pieces = dash_segments(&pts, 4.0, 4.0, ((-1.0, -1.0), (20.0, 1.0)));
        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[0], ((0.0, 0.0), (4.0, 0.0)));
        let (start, end) = pieces[2];
        assert!((start.0 - 16.0).abs() < 1e-3 && (end.0 - 20.0).abs() < 1e-3, "{:?}", pieces[2]);
        assert!(dash_segments(&pts, 4.0, 4.0, ((-1.0, 5.0), (20.0, 9.0))).is_empty());
    }

    #[test]
    fn dashed_line_running_far_off_canvas_finishes() {
        let mut s = RasterSurface::new(50, 50);
        let st = style(1.0, OutlineStyle::Dashed, FillStyle::None);
        draw_shape(&mut s, ShapeKind::Line, (0.0, 10.0), (1.0e8, 10.0), &st);
        assert_eq!(s.get_pixel(1, 10), Some(BLACK));
        assert_eq!(s.get_pixel(3, 10), Some(BACKGROUND));
        assert_eq!(s.get_pixel(49, 10), Some(BLACK));

        let dotted = style(4.0, OutlineStyle::Dotted, FillStyle::None);
        let mut blank = RasterSurface::new(50, 50);
        draw_shape(&mut blank, ShapeKind::Circle, (25.0, 25.0), (1.0e8, 25.0), &dotted);
        assert!(blank.to_raw_rgba().chunks_exact(4).all(|p| p == [255, 255, 255, 255]));
    }

    #[test]
    fn rectangles_with_far_off_corners_fill_the_visible_part() {
        let mut s = RasterSurface::new(50, 50);
        let st = style(3.0, OutlineStyle::Solid, FillStyle::Solid);
        draw_shape(&mut s, ShapeKind::Rectangle, (10.0, 10.0), (3.0e9, 3.0e9), &st);
        assert_eq!(s.get_pixel(30, 30), Some(BLACK));
        assert_eq!(s.get_pixel(49, 49), Some(BLACK));
        assert_eq!(s.get_pixel(5, 5), Some(BACKGROUND));

        let mut s = RasterSurface::new(50, 50);
        draw_shape(&mut s, ShapeKind::Rectangle, (-3.0e9, -3.0e9), (20.0, 20.0), &st);
        assert_eq!(s.get_pixel(0, 0), Some(BLACK));
        assert_eq!(s.get_pixel(5, 5), Some(BLACK));
        assert_eq!(s.get_pixel(30, 30), Some(BACKGROUND));
    }

    #[test]
    fn no_outline_and_no_fill_draws_nothing() {
        let mut s = RasterSurface::new(40, 40);
        let st = style(5.0, OutlineStyle::None, FillStyle::None);
        for &kind in ShapeKind::all() {
            draw_shape(&mut s, kind, (5.0, 5.0), (35.0, 30.0), &st);
        }
        assert!(s.to_raw_rgba().chunks_exact(4).all(|p| p == [255, 255, 255, 255]));
    }

    #[test]
    fn zero_size_drag_leaves_a_dot() {
        let mut s = RasterSurface::new(20, 20);
        let st = style(3.0, OutlineStyle::Dashed, FillStyle::Solid);
        draw_shape(&mut s, ShapeKind::Rectangle, (10.0, 10.0), (10.0, 10.0), &st);
        assert_eq!(s.get_pixel(10, 10), Some(BLACK));
        assert_eq!(s.get_pixel(14, 10), Some(BACKGROUND));
    }

    #[test]
    fn style_keys_round_trip() {
        for &o in OutlineStyle::all() {
            assert_eq!(OutlineStyle::from_key(o.as_key()), Some(o));
        }
        assert_eq!(FillStyle::from_key("solid"), Some(FillStyle::Solid));
        assert_eq!(FillStyle::from_key("hatched"), None);
    }
}
