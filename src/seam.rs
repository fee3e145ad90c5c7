//! Seam extraction, removal, and visualization.
//!
//! A seam is a top-to-bottom path through the image, one pixel per row,
//! where consecutive rows' columns differ by at most one. Extraction walks
//! a fully built cost/backtrace pair; removal compacts the raster by one
//! column per row.

use image::{Rgb, RgbImage};

use crate::grid::Grid;

/// Color removed seams are painted with in overlay images.
const SEAM_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// A vertical seam: one column index per row, top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seam {
    columns: Vec<u32>,
}

impl Seam {
    /// Wrap a per-row column list.
    #[must_use]
    pub fn from_columns(columns: Vec<u32>) -> Self {
        debug_assert!(
            columns.windows(2).all(|pair| pair[0].abs_diff(pair[1]) <= 1),
            "seam columns must be adjacent between consecutive rows"
        );
        Self { columns }
    }

    /// The seam's column for each row, top to bottom.
    #[must_use]
    pub fn columns(&self) -> &[u32] {
        &self.columns
    }

    /// Number of rows the seam spans.
    // A seam has one entry per image row, so the length fits u32.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.columns.len() as u32
    }
}

/// Extract the minimum-cost seam from a fully built cost/backtrace pair.
///
/// Starts at the leftmost minimum of the last cost row and follows the
/// backtrace upward. Row 0's backtrace entries are never consulted.
#[must_use]
pub fn extract_seam(cost: &Grid<f32>, parent: &Grid<u32>) -> Seam {
    let (width, height) = (cost.width(), cost.height());
    debug_assert!(width > 0 && height > 0);
    debug_assert_eq!((parent.width(), parent.height()), (width, height));

    let last = height - 1;
    let mut x = 0;
    for candidate in 1..width {
        if cost[(candidate, last)] < cost[(x, last)] {
            x = candidate;
        }
    }

    let mut columns = vec![0_u32; height as usize];
    for y in (0..height).rev() {
        columns[y as usize] = x;
        if y > 0 {
            x = parent[(x, y)];
        }
    }
    Seam::from_columns(columns)
}

/// Return a copy of `image` with the seam's pixel deleted from every row,
/// one column narrower.
///
/// # Panics
///
/// Panics if the seam's height differs from the image's, a seam column is
/// out of range, or the image is already a single column wide. A malformed
/// seam is a caller bug, not an input error.
// Row indices come from the seam, whose height matches the image.
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn remove_seam_from_image(image: &RgbImage, seam: &Seam) -> RgbImage {
    let (width, height) = image.dimensions();
    assert_eq!(
        seam.height(),
        height,
        "seam height {} does not match image height {height}",
        seam.height()
    );
    assert!(width > 1, "cannot remove a seam from a width-{width} image");

    let mut out = RgbImage::new(width - 1, height);
    for (y, &sx) in seam.columns().iter().enumerate() {
        assert!(
            sx < width,
            "seam column {sx} out of range for image width {width}"
        );
        let y = y as u32;
        for x in 0..width {
            if x < sx {
                out.put_pixel(x, y, *image.get_pixel(x, y));
            } else if x > sx {
                out.put_pixel(x - 1, y, *image.get_pixel(x, y));
            }
        }
    }
    out
}

/// Paint previously removed seams red onto a copy of the original image.
///
/// Seams are given in removal order, each in the coordinates of the image
/// it was removed from. Every column is mapped back to the original image
/// by shifting past the seams already drawn in its row, the way the pixels
/// shifted when those seams were removed.
///
/// # Panics
///
/// Panics if a seam's height differs from the image's.
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn draw_seams(image: &RgbImage, seams: &[Seam]) -> RgbImage {
    let height = image.height();
    let mut out = image.clone();
    // Original-image columns already painted, kept sorted per row.
    let mut drawn: Vec<Vec<u32>> = vec![Vec::new(); height as usize];

    for seam in seams {
        assert_eq!(
            seam.height(),
            height,
            "seam height {} does not match image height {height}",
            seam.height()
        );
        for (y, &x) in seam.columns().iter().enumerate() {
            let mut x_original = x;
            for &earlier in &drawn[y] {
                if earlier <= x_original {
                    x_original += 1;
                }
            }
            out.put_pixel(x_original, y as u32, SEAM_COLOR);

            let slot = drawn[y].partition_point(|&e| e < x_original);
            drawn[y].insert(slot, x_original);
        }
    }
    out
}
