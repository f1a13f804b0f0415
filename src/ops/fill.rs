// ============================================================================
// FLOOD FILL - 4-connected, exact RGB match
// ============================================================================

use std::collections::VecDeque;

use image::Rgba;

use crate::canvas::RasterSurface;

#[inline(always)]
fn rgb_at(flat: &[u8], idx: usize) -> [u8; 3] {
    let o = idx * 4;
    [flat[o], flat[o + 1], flat[o + 2]]
}

/// Recolor the 4-connected region of the seed's color with `fill_color`.
///
/// Colors are compared on RGB only; written pixels are always fully opaque.
/// Neighbors are tested against the pre-fill buffer, and the result is
/// written back to the surface in a single replace. Returns the number of
/// pixels written (0 when the seed is off-canvas or already the fill color).
pub fn flood_fill(surface: &mut RasterSurface, seed_x: i32, seed_y: i32, fill_color: Rgba<u8>) -> usize {
    let Some(target) = surface.get_pixel(seed_x, seed_y) else {
        return 0;
    };
    let target = [target[0], target[1], target[2]];
    let fill = [fill_color[0], fill_color[1], fill_color[2], 255];
    if target == [fill[0], fill[1], fill[2]] {
        return 0;
    }

    let w = surface.width() as usize;
    let h = surface.height() as usize;
    let original = surface.to_raw_rgba();
    let mut output = original.clone();
    let mut visited = vec![false; w * h];
    let mut queue: VecDeque<usize> = VecDeque::with_capacity(4096);

    let seed = seed_y as usize * w + seed_x as usize;
    visited[seed] = true;
    queue.push_back(seed);
    let mut filled = 0usize;

    while let Some(idx) = queue.pop_front() {
        let o = idx * 4;
        output[o..o + 4].copy_from_slice(&fill);
        filled += 1;

        let x = idx % w;
        let y = idx / w;
        let neighbors = [
            (y + 1 < h).then(|| idx + w),
            (y > 0).then(|| idx - w),
            (x + 1 < w).then(|| idx + 1),
            (x > 0).then(|| idx - 1),
        ];
        for ni in neighbors.into_iter().flatten() {
            if !visited[ni] && rgb_at(&original, ni) == target {
                visited[ni] = true;
                queue.push_back(ni);
            }
        }
    }

    surface.write_raw_rgba(&output);
    filled
}
