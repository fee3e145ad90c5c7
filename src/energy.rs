//! Per-pixel energy estimation.
//!
//! Energy measures how visually busy a pixel's neighborhood is: the
//! magnitude of the local color gradient,
//! `sqrt(sum_c (left_c - right_c)^2 + sum_c (up_c - down_c)^2)`.
//!
//! Neighbor lookups wrap around the image edges (toroidal, not clamped):
//! the pixel left of column 0 is the last column, the pixel above row 0 is
//! the last row. Pixels marked by a protection mask short-circuit to a
//! large negative sentinel so the cheapest path is forced through them.

use image::{Rgb, RgbImage};

use crate::grid::Grid;

/// Energy assigned to pixels marked for forced removal.
///
/// Real gradient energy is always non-negative, so this sentinel wins every
/// minimum and drags the seam through the marked pixel.
pub const FORCED_REMOVAL_ENERGY: f32 = -10_000.0;

/// Mask threshold: a mask pixel whose brightest channel exceeds this marks
/// the corresponding image pixel for forced removal.
const MASK_THRESHOLD: u8 = 128;

// Sum over channels of the squared difference. Channels are widened to i32
// before subtracting so the difference cannot wrap.
fn channel_diff_sq(a: &Rgb<u8>, b: &Rgb<u8>) -> i32 {
    let mut sum = 0;
    for ch in 0..3 {
        let d = i32::from(a[ch]) - i32::from(b[ch]);
        sum += d * d;
    }
    sum
}

/// Gradient-magnitude energy of pixel `(x, y)`, with toroidal neighbors.
// Sums of squared u8 differences stay far below f32's exact-integer range.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn pixel_energy(image: &RgbImage, x: u32, y: u32) -> f32 {
    let (width, height) = image.dimensions();
    let left = if x == 0 { width - 1 } else { x - 1 };
    let right = if x + 1 == width { 0 } else { x + 1 };
    let up = if y == 0 { height - 1 } else { y - 1 };
    let down = if y + 1 == height { 0 } else { y + 1 };

    let horizontal = channel_diff_sq(image.get_pixel(left, y), image.get_pixel(right, y));
    let vertical = channel_diff_sq(image.get_pixel(x, up), image.get_pixel(x, down));

    ((horizontal + vertical) as f32).sqrt()
}

/// [`pixel_energy`], overridden to [`FORCED_REMOVAL_ENERGY`] for pixels the
/// mask marks.
#[must_use]
pub fn masked_pixel_energy(image: &RgbImage, mask: &Grid<bool>, x: u32, y: u32) -> f32 {
    if mask[(x, y)] {
        FORCED_REMOVAL_ENERGY
    } else {
        pixel_energy(image, x, y)
    }
}

/// Threshold a decoded mask image into a boolean protection mask.
///
/// A pixel is marked when its brightest channel exceeds 128.
#[must_use]
pub fn protection_mask(mask_image: &RgbImage) -> Grid<bool> {
    Grid::from_fn(mask_image.width(), mask_image.height(), |x, y| {
        let px = mask_image.get_pixel(x, y);
        px[0].max(px[1]).max(px[2]) > MASK_THRESHOLD
    })
}

/// Compute the energy of every pixel in the image.
///
/// Rows are independent, so the build is row-parallel when the `cli`
/// feature (and with it rayon) is enabled; results are identical either way.
#[must_use]
pub fn energy_map(image: &RgbImage) -> Grid<f32> {
    let (width, height) = image.dimensions();

    #[cfg(feature = "cli")]
    {
        use rayon::prelude::*;

        let mut cells = vec![0.0_f32; width as usize * height as usize];
        cells
            .par_chunks_mut(width as usize)
            .enumerate()
            .for_each(|(y, row)| {
                // Chunk index y and offset x both fit u32: they index an image.
                #[allow(clippy::cast_possible_truncation)]
                for (x, cell) in row.iter_mut().enumerate() {
                    *cell = pixel_energy(image, x as u32, y as u32);
                }
            });
        Grid::from_raw(width, height, cells)
    }

    #[cfg(not(feature = "cli"))]
    {
        Grid::from_fn(width, height, |x, y| pixel_energy(image, x, y))
    }
}

/// Compute the energy of every pixel, with mask overrides applied.
#[must_use]
pub fn masked_energy_map(image: &RgbImage, mask: &Grid<bool>) -> Grid<f32> {
    Grid::from_fn(image.width(), image.height(), |x, y| {
        masked_pixel_energy(image, mask, x, y)
    })
}
