use std::sync::Arc;

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

// ============================================================================
// COORDINATE MAPPER
// ============================================================================

pub const MIN_ZOOM: u32 = 10;
pub const MAX_ZOOM: u32 = 500;
pub const DEFAULT_ZOOM: u32 = 100;
/// Zoom increment used by the magnifier tool and the status bar buttons.
pub const ZOOM_STEP: u32 = 10;

/// Clamp any requested zoom (possibly negative) into `[MIN_ZOOM, MAX_ZOOM]`.
pub fn clamp_zoom(zoom: i64) -> u32 {
    zoom.clamp(MIN_ZOOM as i64, MAX_ZOOM as i64) as u32
}

/// Convert a viewport position into canvas pixel space.
///
/// `origin` is the viewport position of the canvas' top-left corner. Zoom is
/// expected to be clamped already; anything below `MIN_ZOOM` is treated as
/// `MIN_ZOOM` so the division is always defined.
pub fn map_to_canvas(viewport: (f32, f32), origin: (f32, f32), zoom_percent: u32) -> (f32, f32) {
    let scale = zoom_percent.max(MIN_ZOOM) as f32 / 100.0;
    (
        (viewport.0 - origin.0) / scale,
        (viewport.1 - origin.1) / scale,
    )
}

/// Inverse of [`map_to_canvas`], used by hosts to place overlays.
pub fn canvas_to_viewport(canvas: (f32, f32), origin: (f32, f32), zoom_percent: u32) -> (f32, f32) {
    let scale = zoom_percent.max(MIN_ZOOM) as f32 / 100.0;
    (canvas.0 * scale + origin.0, canvas.1 * scale + origin.1)
}

// ============================================================================
// TILED IMAGE – 64×64 chunk storage with copy-on-write chunks
// ============================================================================

pub const CHUNK_SIZE: u32 = 64;

/// A pixel with zero alpha, returned by reference for missing chunks.
static TRANSPARENT_PIXEL: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Tiled image backed by a flat `Vec<Option<Arc<RgbaImage>>>`.
/// Chunk coordinates are mapped to a flat index via `cy * chunks_per_row + cx`.
///
/// Chunks are wrapped in `Arc`: `clone()` only bumps reference counts, and
/// `put_pixel` uses `Arc::make_mut` to COW-clone only the touched chunk. This
/// is what makes raster snapshots cheap enough to take on every drag-start.
#[derive(Clone)]
pub struct TiledImage {
    width: u32,
    height: u32,
    chunks_per_row: u32,
    chunks: Vec<Option<Arc<RgbaImage>>>,
}

impl TiledImage {
    // ---- construction -------------------------------------------------------

    /// Create an empty (fully transparent) tiled image.
    pub fn new(width: u32, height: u32) -> Self {
        let chunks_per_row = width.div_ceil(CHUNK_SIZE);
        let chunks_per_col = height.div_ceil(CHUNK_SIZE);
        let total = (chunks_per_row * chunks_per_col) as usize;
        Self {
            width,
            height,
            chunks_per_row,
            chunks: vec![None; total],
        }
    }

    /// Create an image where every pixel is `color`.
    pub fn new_filled(width: u32, height: u32, color: Rgba<u8>) -> Self {
        let mut img = Self::new(width, height);
        img.fill(color);
        img
    }

    /// Import from a flat RGBA byte slice (`width * height * 4` bytes, row-major).
    /// Chunk conversion is parallelised with rayon; fully transparent chunks are
    /// left unallocated.
    pub fn from_raw_rgba(width: u32, height: u32, data: &[u8]) -> Self {
        let mut img = Self::new(width, height);
        if data.len() != (width as usize) * (height as usize) * 4 {
            return img;
        }

        let chunks_x = img.chunks_per_row as usize;
        let total_chunks = img.chunks.len();

        let chunk_results: Vec<(usize, Option<Arc<RgbaImage>>)> = (0..total_chunks)
            .into_par_iter()
            .map(|flat| {
                let cx = (flat % chunks_x) as u32;
                let cy = (flat / chunks_x) as u32;
                let base_x = cx * CHUNK_SIZE;
                let base_y = cy * CHUNK_SIZE;

                let cw = CHUNK_SIZE.min(width - base_x);
                let ch = CHUNK_SIZE.min(height - base_y);
                let chunk_stride = CHUNK_SIZE as usize * 4;
                let mut chunk_data = vec![0u8; chunk_stride * CHUNK_SIZE as usize];
                let mut has_content = false;

                for ly in 0..ch {
                    let src_start = ((base_y + ly) * width + base_x) as usize * 4;
                    let dst_start = ly as usize * chunk_stride;
                    let byte_len = cw as usize * 4;
                    chunk_data[dst_start..dst_start + byte_len]
                        .copy_from_slice(&data[src_start..src_start + byte_len]);

                    if !has_content {
                        has_content = chunk_data[dst_start..dst_start + byte_len]
                            .chunks_exact(4)
                            .any(|px| px[3] != 0);
                    }
                }

                if has_content {
                    let chunk = RgbaImage::from_raw(CHUNK_SIZE, CHUNK_SIZE, chunk_data).map(Arc::new);
                    (flat, chunk)
                } else {
                    (flat, None)
                }
            })
            .collect();

        for (idx, chunk) in chunk_results {
            img.chunks[idx] = chunk;
        }
        img
    }

    /// Flatten to a contiguous row-major RGBA buffer.
    pub fn to_raw_rgba(&self) -> Vec<u8> {
        let out_stride = self.width as usize * 4;
        let mut out = vec![0u8; out_stride * self.height as usize];
        let chunk_stride = CHUNK_SIZE as usize * 4;
        for (idx, slot) in self.chunks.iter().enumerate() {
            let Some(chunk) = slot else { continue };
            let cx = idx as u32 % self.chunks_per_row;
            let cy = idx as u32 / self.chunks_per_row;
            let base_x = cx * CHUNK_SIZE;
            let base_y = cy * CHUNK_SIZE;
            let cw = CHUNK_SIZE.min(self.width - base_x) as usize;
            let ch = CHUNK_SIZE.min(self.height - base_y) as usize;
            let chunk_raw = chunk.as_raw();
            for ly in 0..ch {
                let src_start = ly * chunk_stride;
                let dst_start = (base_y as usize + ly) * out_stride + base_x as usize * 4;
                out[dst_start..dst_start + cw * 4]
                    .copy_from_slice(&chunk_raw[src_start..src_start + cw * 4]);
            }
        }
        out
    }

    /// Flatten back to a contiguous `RgbaImage`.
    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_raw(self.width, self.height, self.to_raw_rgba())
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }

    /// Copy into a buffer of different dimensions anchored at the origin.
    /// Content outside the new bounds is dropped; new area is `background`.
    /// Chunks that lie entirely inside the overlap are shared, not copied.
    pub fn resized(&self, new_width: u32, new_height: u32, background: Rgba<u8>) -> TiledImage {
        let mut out = TiledImage::new_filled(new_width, new_height, background);
        let copy_w = self.width.min(new_width);
        let copy_h = self.height.min(new_height);

        let shared_cols = copy_w / CHUNK_SIZE;
        let shared_rows = copy_h / CHUNK_SIZE;
        for cy in 0..shared_rows {
            for cx in 0..shared_cols {
                let src = self.chunks[self.flat_index(cx, cy)].clone();
                let dst = out.flat_index(cx, cy);
                out.chunks[dst] = src;
            }
        }

        // Partial chunks along the right and bottom edges of the overlap
        for y in 0..copy_h {
            let x_start = if y < shared_rows * CHUNK_SIZE {
                shared_cols * CHUNK_SIZE
            } else {
                0
            };
            for x in x_start..copy_w {
                out.put_pixel(x, y, *self.get_pixel(x, y));
            }
        }
        out
    }

    // ---- indexing helpers ----------------------------------------------------

    #[inline(always)]
    fn flat_index(&self, cx: u32, cy: u32) -> usize {
        (cy * self.chunks_per_row + cx) as usize
    }

    #[inline(always)]
    fn chunk_coord(x: u32, y: u32) -> (u32, u32) {
        (x / CHUNK_SIZE, y / CHUNK_SIZE)
    }

    #[inline(always)]
    fn local(x: u32, y: u32) -> (u32, u32) {
        (x % CHUNK_SIZE, y % CHUNK_SIZE)
    }

    // ---- pixel access -------------------------------------------------------

    /// Read a pixel (returns `&TRANSPARENT_PIXEL` for missing chunks or out-of-range reads).
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> &Rgba<u8> {
        if x >= self.width || y >= self.height {
            return &TRANSPARENT_PIXEL;
        }
        let (cx, cy) = Self::chunk_coord(x, y);
        let (lx, ly) = Self::local(x, y);
        let idx = self.flat_index(cx, cy);
        self.chunks[idx]
            .as_ref()
            .map(|c| c.get_pixel(lx, ly))
            .unwrap_or(&TRANSPARENT_PIXEL)
    }

    /// Write a pixel (creates the chunk on demand, COW-clones if shared).
    #[inline]
    pub fn put_pixel(&mut self, x: u32, y: u32, pixel: Rgba<u8>) {
        if x >= self.width || y >= self.height {
            return;
        }
        let (cx, cy) = Self::chunk_coord(x, y);
        let (lx, ly) = Self::local(x, y);
        let idx = self.flat_index(cx, cy);
        let arc = self.chunks[idx]
            .get_or_insert_with(|| Arc::new(RgbaImage::new(CHUNK_SIZE, CHUNK_SIZE)));
        Arc::make_mut(arc).put_pixel(lx, ly, pixel);
    }

    // ---- bulk operations ----------------------------------------------------

    /// Fill every pixel with `color`. All chunks end up sharing one allocation.
    pub fn fill(&mut self, color: Rgba<u8>) {
        let chunk = Arc::new(RgbaImage::from_pixel(CHUNK_SIZE, CHUNK_SIZE, color));
        for slot in &mut self.chunks {
            *slot = Some(Arc::clone(&chunk));
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

// ============================================================================
// RASTER SURFACE
// ============================================================================

/// Canvas background; also the eraser's ink.
pub const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Opaque full copy of a surface taken with [`RasterSurface::snapshot`].
#[derive(Clone)]
pub struct RasterSnapshot {
    pixels: TiledImage,
}

impl RasterSnapshot {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// The persistent drawing. Every tool mutates it through these operations;
/// hosts only ever read it (display, export).
///
/// A surface without a size is "unavailable": reads return `None` and writes
/// are dropped, so drawing degrades to doing nothing.
#[derive(Clone)]
pub struct RasterSurface {
    pixels: TiledImage,
    available: bool,
    generation: u64,
}

impl Default for RasterSurface {
    fn default() -> Self {
        Self::unmounted()
    }
}

impl RasterSurface {
    /// A surface of the given size filled with the background color.
    pub fn new(width: u32, height: u32) -> Self {
        let mut surface = Self::unmounted();
        surface.initialize(width, height);
        surface
    }

    /// A surface that has not been given a size yet.
    pub fn unmounted() -> Self {
        Self {
            pixels: TiledImage::new(0, 0),
            available: false,
            generation: 0,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Incremented on every mutation; hosts compare it to decide when to re-upload.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Allocate `width × height` opaque white pixels, discarding any content.
    pub fn initialize(&mut self, width: u32, height: u32) {
        self.available = width > 0 && height > 0;
        self.pixels = if self.available {
            TiledImage::new_filled(width, height, BACKGROUND)
        } else {
            TiledImage::new(0, 0)
        };
        self.touch();
    }

    /// Reallocate at a new size keeping existing content anchored at the origin.
    /// Returns `false` when nothing changed.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if !self.available {
            self.initialize(width, height);
            return self.available;
        }
        if width == 0 || height == 0 {
            return false;
        }
        if width == self.width() && height == self.height() {
            return false;
        }
        self.pixels = self.pixels.resized(width, height, BACKGROUND);
        self.touch();
        true
    }

    /// Re-initialize with the current dimensions.
    pub fn clear(&mut self) {
        if !self.available {
            return;
        }
        let (w, h) = (self.width(), self.height());
        self.initialize(w, h);
    }

    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.available && x >= 0 && y >= 0 && (x as u32) < self.width() && (y as u32) < self.height()
    }

    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Rgba<u8>> {
        if !self.in_bounds(x, y) {
            return None;
        }
        Some(*self.pixels.get_pixel(x as u32, y as u32))
    }

    /// Out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgba<u8>) {
        if !self.in_bounds(x, y) {
            return;
        }
        self.pixels.put_pixel(x as u32, y as u32, color);
        self.touch();
    }

    /// Source-over blend of `color` at `coverage` (0..=1) onto an opaque pixel.
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Rgba<u8>, coverage: f32) {
        let Some(dst) = self.get_pixel(x, y) else { return };
        let a = (color[3] as f32 / 255.0) * coverage.clamp(0.0, 1.0);
        if a <= 0.0 {
            return;
        }
        let mix = |s: u8, d: u8| (s as f32 * a + d as f32 * (1.0 - a)).round() as u8;
        let out = Rgba([
            mix(color[0], dst[0]),
            mix(color[1], dst[1]),
            mix(color[2], dst[2]),
            255,
        ]);
        self.set_pixel(x, y, out);
    }

    pub fn snapshot(&self) -> RasterSnapshot {
        RasterSnapshot {
            pixels: self.pixels.clone(),
        }
    }

    /// Put back a snapshot. Snapshots taken at another size are ignored.
    pub fn restore(&mut self, snapshot: &RasterSnapshot) {
        if !self.available
            || snapshot.width() != self.width()
            || snapshot.height() != self.height()
        {
            return;
        }
        self.pixels = snapshot.pixels.clone();
        self.touch();
    }

    /// Whole surface as row-major RGBA bytes.
    pub fn to_raw_rgba(&self) -> Vec<u8> {
        self.pixels.to_raw_rgba()
    }

    /// Replace every pixel at once. Buffers of the wrong length are ignored.
    pub fn write_raw_rgba(&mut self, data: &[u8]) {
        if !self.available || data.len() != (self.width() as usize) * (self.height() as usize) * 4 {
            return;
        }
        self.pixels = TiledImage::from_raw_rgba(self.width(), self.height(), data);
        self.touch();
    }

    /// Flattened copy for export.
    pub fn to_rgba_image(&self) -> RgbaImage {
        self.pixels.to_rgba_image()
    }

    fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

// ============================================================================
// RESIZE DEBOUNCE
// ============================================================================

/// Coalesces bursts of size notifications into one applied resize.
/// Times are seconds on any monotonic clock (the host's frame time).
#[derive(Clone, Debug)]
pub struct ResizeDebouncer {
    delay: f64,
    pending: Option<((u32, u32), f64)>,
}

impl ResizeDebouncer {
    pub fn new(delay_secs: f64) -> Self {
        Self {
            delay: delay_secs.max(0.0),
            pending: None,
        }
    }

    /// Record a new size; restarts the quiet period.
    pub fn notify(&mut self, size: (u32, u32), now: f64) {
        self.pending = Some((size, now));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns the latest size once no notification arrived for `delay` seconds.
    pub fn poll(&mut self, now: f64) -> Option<(u32, u32)> {
        let (size, at) = self.pending?;
        if now - at >= self.delay {
            self.pending = None;
            Some(size)
        } else {
            None
        }
    }
}
