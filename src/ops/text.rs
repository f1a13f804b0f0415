use ab_glyph::{point, Font, FontArc, GlyphId, ScaleFont};
use image::Rgba;
use std::collections::HashMap;

use crate::canvas::RasterSurface;
use crate::{log_info, log_warn};

/// Pixel size of placed text.
pub const TEXT_FONT_SIZE: f32 = 16.0;
/// Distance from the click point down to the glyph baseline.
pub const TEXT_BASELINE_OFFSET: f32 = 12.0;

/// Font used when no system family is configured (ships inside egui).
const BUNDLED_FONT_KEY: &str = "Ubuntu-Light";

/// Cache for rasterized glyph coverage. Key: (GlyphId, font_size_bits).
/// Value: (pixels as (x, y, coverage), bounds_min_x, bounds_min_y) for the
/// glyph placed at the origin.
pub type GlyphPixelCache = HashMap<(GlyphId, u32), (Vec<(u32, u32, f32)>, f32, f32)>;

/// Text being typed at a click point. Destroyed on commit or discard.
#[derive(Clone, Debug, PartialEq)]
pub struct TextEntry {
    pub x: f32,
    pub y: f32,
    pub text: String,
    /// Resolved when the entry is opened, not when it is committed.
    pub color: Rgba<u8>,
}

impl TextEntry {
    pub fn new(x: f32, y: f32, color: Rgba<u8>) -> Self {
        Self { x, y, text: String::new(), color }
    }

    pub fn push_str(&mut self, s: &str) {
        self.text.extend(s.chars().filter(|c| !c.is_control()));
    }

    pub fn backspace(&mut self) {
        self.text.pop();
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Lay out a single line of text starting at x = 0.
/// Returns `(glyphs as (id, x), total_width)`.
pub fn layout_text(font: &FontArc, text: &str, font_size: f32) -> (Vec<(GlyphId, f32)>, f32) {
    let scaled = font.as_scaled(font_size);
    let mut glyphs = Vec::with_capacity(text.len());
    let mut cursor_x = 0.0f32;
    let mut last_glyph: Option<GlyphId> = None;

    for ch in text.chars() {
        let glyph_id = font.glyph_id(ch);
        if let Some(prev) = last_glyph {
            cursor_x += scaled.kern(prev, glyph_id);
        }
        glyphs.push((glyph_id, cursor_x));
        cursor_x += scaled.h_advance(glyph_id);
        last_glyph = Some(glyph_id);
    }

    (glyphs, cursor_x)
}

/// Single-channel coverage of a rasterized line of text, clipped to the canvas.
pub struct RasterizedText {
    pub coverage: Vec<f32>,
    pub buf_w: u32,
    pub buf_h: u32,
    pub off_x: i32,
    pub off_y: i32,
}

impl RasterizedText {
    fn empty() -> Self {
        Self { coverage: Vec::new(), buf_w: 0, buf_h: 0, off_x: 0, off_y: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.buf_w == 0 || self.buf_h == 0
    }
}

/// Rasterize one line of text whose baseline starts at `(origin_x, baseline_y)`.
pub fn rasterize_text(
    font: &FontArc,
    text: &str,
    font_size: f32,
    origin_x: f32,
    baseline_y: f32,
    canvas_w: u32,
    canvas_h: u32,
    glyph_cache: &mut GlyphPixelCache,
) -> RasterizedText {
    let (glyphs, _) = layout_text(font, text, font_size);
    if glyphs.is_empty() {
        return RasterizedText::empty();
    }

    // Bounding box from glyph_bounds (no outlining needed)
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;
    for &(glyph_id, gx) in &glyphs {
        let glyph = glyph_id.with_scale_and_position(font_size, point(gx, 0.0));
        let bounds = font.glyph_bounds(&glyph);
        min_x = min_x.min(bounds.min.x);
        min_y = min_y.min(bounds.min.y);
        max_x = max_x.max(bounds.max.x);
        max_y = max_y.max(bounds.max.y);
    }
    if min_x >= max_x || min_y >= max_y {
        return RasterizedText::empty();
    }

    let pad = 2.0;
    let x0 = ((origin_x + min_x - pad).floor() as i32).max(0);
    let y0 = ((baseline_y + min_y - pad).floor() as i32).max(0);
    let x1 = ((origin_x + max_x + pad).ceil() as i32).min(canvas_w as i32);
    let y1 = ((baseline_y + max_y + pad).ceil() as i32).min(canvas_h as i32);
    let buf_w = (x1 - x0).max(0) as u32;
    let buf_h = (y1 - y0).max(0) as u32;
    if buf_w == 0 || buf_h == 0 {
        return RasterizedText::empty();
    }

    let mut coverage = vec![0.0f32; buf_w as usize * buf_h as usize];
    let font_size_key = font_size.to_bits();

    for &(glyph_id, gx) in &glyphs {
        let cache_key = (glyph_id, font_size_key);
        let (pixels, bx, by) = glyph_cache.entry(cache_key).or_insert_with(|| {
            let base_glyph = glyph_id.with_scale_and_position(font_size, point(0.0, 0.0));
            let mut px_list = Vec::new();
            match font.outline_glyph(base_glyph) {
                Some(outlined) => {
                    let b = outlined.px_bounds();
                    outlined.draw(|px, py, cov| px_list.push((px, py, cov)));
                    (px_list, b.min.x, b.min.y)
                }
                // Whitespace has no outline
                None => (px_list, 0.0, 0.0),
            }
        });

        let draw_x = origin_x + gx.round() + *bx;
        let draw_y = baseline_y + *by;
        for &(px, py, cov) in pixels.iter() {
            let ix = (px as f32 + draw_x).round() as i32 - x0;
            let iy = (py as f32 + draw_y).round() as i32 - y0;
            if ix >= 0 && iy >= 0 && (ix as u32) < buf_w && (iy as u32) < buf_h {
                let idx = iy as usize * buf_w as usize + ix as usize;
                coverage[idx] = coverage[idx].max(cov);
            }
        }
    }

    RasterizedText { coverage, buf_w, buf_h, off_x: x0, off_y: y0 }
}

/// Load a font by family name from the system. Returns None if the family
/// cannot be found or parsed.
pub fn load_system_font(family: &str) -> Option<FontArc> {
    use font_kit::family_name::FamilyName;
    use font_kit::properties::Properties;
    use font_kit::source::SystemSource;

    let source = SystemSource::new();
    let handle = source
        .select_best_match(&[FamilyName::Title(family.to_string())], &Properties::new())
        .ok()?;

    let font_data = handle.load().ok()?;
    let bytes: Vec<u8> = (*font_data.copy_font_data()?).clone();
    FontArc::try_from_vec(bytes).ok()
}

/// The sans-serif face bundled with egui's default font set.
pub fn bundled_font() -> Option<FontArc> {
    let defs = egui::FontDefinitions::default();
    let data = defs.font_data.get(BUNDLED_FONT_KEY)?;
    FontArc::try_from_vec(data.font.to_vec()).ok()
}

/// Resolve the text font once per session: the configured system family if
/// it loads, otherwise the bundled face.
pub fn resolve_font(family: Option<&str>) -> Option<FontArc> {
    if let Some(name) = family.map(str::trim).filter(|n| !n.is_empty()) {
        match load_system_font(name) {
            Some(font) => {
                log_info!("Text font: system family {:?}", name);
                return Some(font);
            }
            None => {
                log_warn!("Font family {:?} not found, using bundled font", name);
            }
        }
    }
    let font = bundled_font();
    if font.is_none() {
        log_warn!("No font available; text placement is disabled");
    }
    font
}

/// Owns the session font and glyph cache, and commits text entries into the
/// raster.
pub struct TextRenderer {
    font: Option<FontArc>,
    glyph_cache: GlyphPixelCache,
}

impl TextRenderer {
    pub fn new(family: Option<&str>) -> Self {
        Self { font: resolve_font(family), glyph_cache: GlyphPixelCache::new() }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Width of `text` at the placement size, for caret positioning in hosts.
    pub fn measure(&self, text: &str) -> f32 {
        self.font
            .as_ref()
            .map(|f| layout_text(f, text, TEXT_FONT_SIZE).1)
            .unwrap_or(0.0)
    }

    /// Rasterize the entry into the surface. Returns false when nothing was
    /// drawn (blank text, no font, or no drawing context).
    pub fn commit(&mut self, surface: &mut RasterSurface, entry: &TextEntry) -> bool {
        if entry.is_blank() || !surface.is_available() {
            return false;
        }
        let Some(font) = self.font.as_ref() else {
            return false;
        };
        let raster = rasterize_text(
            font,
            &entry.text,
            TEXT_FONT_SIZE,
            entry.x,
            entry.y + TEXT_BASELINE_OFFSET,
            surface.width(),
            surface.height(),
            &mut self.glyph_cache,
        );
        if raster.is_empty() {
            return false;
        }
        for row in 0..raster.buf_h {
            for col in 0..raster.buf_w {
                let cov = raster.coverage[(row * raster.buf_w + col) as usize];
                if cov > 0.001 {
                    surface.blend_pixel(
                        raster.off_x + col as i32,
                        raster.off_y + row as i32,
                        entry.color,
                        cov,
                    );
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::BACKGROUND;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    fn ink_in(s: &RasterSurface, xs: std::ops::Range<i32>, ys: std::ops::Range<i32>) -> usize {
        ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
            .filter(|&(x, y)| s.get_pixel(x, y) != Some(BACKGROUND))
            .count()
    }

    #[test]
    fn bundled_font_is_available() {
        assert!(bundled_font().is_some());
    }

    #[test]
    fn unknown_family_falls_back_to_bundled() {
        let r = TextRenderer::new(Some("No Such Family 12345"));
        assert!(r.has_font());
    }

    #[test]
    fn committed_text_lands_below_the_click_point() {
        let mut s = RasterSurface::new(100, 60);
        let mut r = TextRenderer::new(None);
        let mut entry = TextEntry::new(20.0, 20.0, BLACK);
        entry.push_str("Hi");
        assert!(r.commit(&mut s, &entry));
        // Glyphs sit between the click point and the baseline at y = 32
        assert!(ink_in(&s, 18..40, 18..34) > 10);
        assert!(ink_in(&s, 18..40, 24..29) > 0);
        // Nothing above the click point or left of it
        assert_eq!(ink_in(&s, 0..100, 0..17), 0);
        assert_eq!(ink_in(&s, 0..18, 0..60), 0);
    }

    #[test]
    fn blank_entries_draw_nothing() {
        let mut s = RasterSurface::new(50, 50);
        let before = s.to_raw_rgba();
        let mut r = TextRenderer::new(None);
        let mut entry = TextEntry::new(5.0, 5.0, BLACK);
        entry.push_str("   ");
        assert!(!r.commit(&mut s, &entry));
        assert_eq!(s.to_raw_rgba(), before);
    }

    #[test]
    fn entry_editing() {
        let mut entry = TextEntry::new(0.0, 0.0, BLACK);
        entry.push_str("ab\u{8}c");
        assert_eq!(entry.text, "abc");
        entry.backspace();
        assert_eq!(entry.text, "ab");
        entry.backspace();
        entry.backspace();
        entry.backspace();
        assert!(entry.is_blank());
    }

    #[test]
    fn layout_advances_left_to_right() {
        let Some(font) = bundled_font() else { panic!("bundled font missing") };
        let (glyphs, width) = layout_text(&font, "abc", TEXT_FONT_SIZE);
        assert_eq!(glyphs.len(), 3);
        assert!(glyphs[0].1 < glyphs[1].1 && glyphs[1].1 < glyphs[2].1);
        assert!(width > glyphs[2].1);
        let r = TextRenderer::new(None);
        assert_eq!(r.measure("abc"), width);
    }

    #[test]
    fn text_near_the_edge_is_clipped() {
        let mut s = RasterSurface::new(30, 30);
        let mut r = TextRenderer::new(None);
        let mut entry = TextEntry::new(20.0, 20.0, BLACK);
        entry.push_str("Wide text");
        assert!(r.commit(&mut s, &entry));
        assert!(ink_in(&s, 20..30, 20..30) > 0);
    }
}
