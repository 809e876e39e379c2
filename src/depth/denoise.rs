//! Heuristic denoising passes for depth buffers
//!
//! Point splats leave holes and single-pixel outliers (background points
//! seen between foreground splats). The passes here build the "expected"
//! depth that raw samples are compared against.

use rayon::prelude::*;

use crate::core::grid::Grid;
use crate::depth::quantize::{DepthBuffer, is_background};

/// Denoising configuration: hole fill, 3x3 median, Gaussian blur
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Denoise {
    /// Maximum hole-filling sweeps
    pub fill_iterations: usize,
    /// Gaussian sigma in pixels; 0 disables the blur
    pub blur_sigma: f32,
}

impl Default for Denoise {
    fn default() -> Self {
        Self {
            fill_iterations: 1,
            blur_sigma: 1.0,
        }
    }
}

impl Denoise {
    /// Run all passes in order
    pub fn apply(&self, buffer: &DepthBuffer) -> DepthBuffer {
        let filled = fill_background(buffer, self.fill_iterations);
        let median = median3x3(&filled);
        gaussian_blur(&median, self.blur_sigma)
    }
}

/// Mirror an out-of-range coordinate back into `0..n` (`d c b a | a b c d`)
#[inline]
fn reflect(i: i64, n: i64) -> usize {
    if n <= 1 {
        return 0;
    }
    let period = 2 * n;
    let mut i = i.rem_euclid(period);
    if i >= n {
        i = period - 1 - i;
    }
    i as usize
}

/// Fill background cells with the mean of the valid cells in their 3x3
/// neighborhood (clipped at the borders).
///
/// Each sweep scans in raster order and writes in place, so a cell filled
/// earlier in the sweep counts as valid for the cells after it. A single
/// sweep closes any hole reachable down or to the right of a valid sample.
/// Stops early once a sweep changes nothing.
pub fn fill_background(buffer: &DepthBuffer, iterations: usize) -> DepthBuffer {
    let mut current = buffer.clone();
    let (w, h) = (buffer.width() as usize, buffer.height() as usize);
    if w == 0 || h == 0 {
        return current;
    }

    let cells = current.as_mut_slice();
    for iteration in 0..iterations {
        let mut filled = 0usize;
        for y in 0..h {
            for x in 0..w {
                if !is_background(cells[y * w + x]) {
                    continue;
                }
                let mut sum = 0.0f32;
                let mut count = 0u32;
                for ny in y.saturating_sub(1)..(y + 2).min(h) {
                    for nx in x.saturating_sub(1)..(x + 2).min(w) {
                        let d = cells[ny * w + nx];
                        if !is_background(d) {
                            sum += d;
                            count += 1;
                        }
                    }
                }
                if count > 0 {
                    cells[y * w + x] = sum / count as f32;
                    filled += 1;
                }
            }
        }

        log::trace!("Fill sweep {}: {} cells", iteration, filled);
        if filled == 0 {
            break;
        }
    }
    current
}

/// 3x3 median filter with mirrored borders
pub fn median3x3(buffer: &DepthBuffer) -> DepthBuffer {
    let (w, h) = (buffer.width() as usize, buffer.height() as usize);
    let src = buffer.as_slice();
    let mut out = buffer.clone();
    if w == 0 || h == 0 {
        return out;
    }

    out.as_mut_slice()
        .par_chunks_mut(w)
        .enumerate()
        .for_each(|(y, row)| {
            let mut window = [0.0f32; 9];
            for (x, cell) in row.iter_mut().enumerate() {
                let mut k = 0;
                for dy in -1i64..=1 {
                    let sy = reflect(y as i64 + dy, h as i64);
                    for dx in -1i64..=1 {
                        let sx = reflect(x as i64 + dx, w as i64);
                        window[k] = src[sy * w + sx];
                        k += 1;
                    }
                }
                window.sort_unstable_by(f32::total_cmp);
                *cell = window[4];
            }
        });
    out
}

/// Normalized 1D Gaussian kernel truncated at 4 sigma
fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (4.0 * sigma + 0.5) as i64;
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / denom).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= sum;
    }
    kernel
}

/// Separable Gaussian blur with mirrored borders
pub fn gaussian_blur(buffer: &DepthBuffer, sigma: f32) -> DepthBuffer {
    let (w, h) = (buffer.width() as usize, buffer.height() as usize);
    if sigma <= 0.0 || w == 0 || h == 0 {
        return buffer.clone();
    }
    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as i64;

    // horizontal pass
    let src = buffer.as_slice();
    let mut horizontal = vec![0.0f32; w * h];
    horizontal
        .par_chunks_mut(w)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, cell) in row.iter_mut().enumerate() {
                *cell = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, weight)| {
                        let sx = reflect(x as i64 + k as i64 - radius, w as i64);
                        weight * src[y * w + sx]
                    })
                    .sum();
            }
        });

    // vertical pass
    let mut out = vec![0.0f32; w * h];
    out.par_chunks_mut(w)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, cell) in row.iter_mut().enumerate() {
                *cell = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, weight)| {
                        let sy = reflect(y as i64 + k as i64 - radius, h as i64);
                        weight * horizontal[sy * w + x]
                    })
                    .sum();
            }
        });

    Grid::from_vec(buffer.width(), buffer.height(), out).unwrap_or_else(|_| buffer.clone())
}
