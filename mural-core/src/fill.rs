//! Scanline flood fill.
//!
//! Fills the maximal 4-connected region of color-similar pixels around an
//! origin point. Work proceeds span by span: each popped seed expands into a
//! full horizontal run, and the rows above and below contribute at most one
//! new seed per contiguous qualifying run — O(filled pixels) with a stack
//! bounded by the region's span count, instead of the per-pixel stack of a
//! naive recursive fill.
//!
//! A wall-clock budget bounds total fill time. On expiry the partial fill is
//! committed and reported; bounded latency is deliberately favored over
//! completing a pathological region.
//!
//! Reference: Foley & van Dam, Computer Graphics, §19.5 — Scan-Line Fill

use std::time::{Duration, Instant};

use crate::buffer::PixelBuffer;
use crate::color::Rgba;

/// Default wall-clock budget for one fill invocation.
pub const DEFAULT_FILL_BUDGET: Duration = Duration::from_millis(250);

/// How often the budget deadline is polled, in popped spans.
const DEADLINE_POLL_MASK: u32 = 63;

/// Outcome of one fill invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillReport {
    /// Pixels repainted to the fill color.
    pub pixels_filled: usize,
    /// False when the wall-clock budget expired before the region was done.
    pub completed: bool,
}

impl FillReport {
    fn noop() -> Self {
        Self { pixels_filled: 0, completed: true }
    }
}

/// Fill the 4-connected region around `(x, y)` whose pixels match the
/// origin's color within `tolerance` (symmetric, per RGBA channel).
///
/// Out-of-bounds origins and origins already matching `fill_color` are
/// no-ops, not errors.
pub fn flood_fill(
    buffer: &mut PixelBuffer,
    x: i32,
    y: i32,
    fill_color: Rgba,
    tolerance: u8,
    budget: Duration,
) -> FillReport {
    let Some(target) = buffer.pixel(x, y) else {
        return FillReport::noop();
    };
    if target.matches_within(fill_color, tolerance) {
        // Repainting would be invisible, and scanning would never terminate
        // against a target the fill color itself matches.
        return FillReport::noop();
    }

    let width = buffer.width() as usize;
    let height = buffer.height() as usize;
    let deadline = Instant::now() + budget;

    // Doubles as the visited set: a marked pixel is already repainted.
    let mut processed = vec![false; width * height];
    let mut seeds: Vec<(usize, usize)> = Vec::with_capacity(64);
    seeds.push((x as usize, y as usize));

    let mut filled = 0usize;
    let mut pops = 0u32;

    while let Some((sx, sy)) = seeds.pop() {
        pops += 1;
        if pops & DEADLINE_POLL_MASK == 0 && Instant::now() >= deadline {
            log::warn!(
                "flood fill budget expired after {filled} pixels; committing partial region"
            );
            return FillReport { pixels_filled: filled, completed: false };
        }

        let row = sy * width;
        if processed[row + sx] || !buffer.pixel_at(row + sx).matches_within(target, tolerance) {
            continue;
        }

        // Expand the seed into a full horizontal span.
        let mut x0 = sx;
        while x0 > 0
            && !processed[row + x0 - 1]
            && buffer.pixel_at(row + x0 - 1).matches_within(target, tolerance)
        {
            x0 -= 1;
        }
        let mut x1 = sx;
        while x1 + 1 < width
            && !processed[row + x1 + 1]
            && buffer.pixel_at(row + x1 + 1).matches_within(target, tolerance)
        {
            x1 += 1;
        }

        for xi in x0..=x1 {
            processed[row + xi] = true;
            buffer.paint_at(row + xi, fill_color);
        }
        filled += x1 - x0 + 1;

        // One seed per contiguous qualifying run on the rows above and below.
        for ny in [sy.wrapping_sub(1), sy + 1] {
            if ny >= height {
                continue;
            }
            let nrow = ny * width;
            let mut in_run = false;
            for xi in x0..=x1 {
                let qualifies = !processed[nrow + xi]
                    && buffer.pixel_at(nrow + xi).matches_within(target, tolerance);
                if qualifies && !in_run {
                    seeds.push((xi, ny));
                }
                in_run = qualifies;
            }
        }
    }

    FillReport { pixels_filled: filled, completed: true }
}
