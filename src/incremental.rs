//! The incremental carving engine.
//!
//! Rebuilding the energy and cumulative-cost fields after every removal
//! costs `O(height * width)` per seam. This engine keeps both fields (plus
//! the backtrace and the protection mask) alive across removals and
//! recomputes only what a removal actually invalidates: energy cells whose
//! toroidal neighborhood was touched, and cost cells reached by the change
//! propagation front. After every repair pass the fields are numerically
//! identical to a from-scratch rebuild on the shrunk raster, which is the
//! correctness contract the tests below pin down.

use image::RgbImage;

use crate::carver::validate_crop;
use crate::cost::{build_cost, min_parent};
use crate::energy::{masked_energy_map, masked_pixel_energy, protection_mask};
use crate::error::{Error, Result};
use crate::frontier::RowFrontier;
use crate::grid::Grid;
use crate::seam::{self, Seam};

/// Stateful carving session that patches its energy, cost, and backtrace
/// fields across removals instead of rebuilding them.
///
/// Optionally takes a protection mask whose bright pixels are forced out
/// first: their energy is pinned to
/// [`FORCED_REMOVAL_ENERGY`](crate::energy::FORCED_REMOVAL_ENERGY), which
/// undercuts any real gradient energy.
#[derive(Debug)]
pub struct IncrementalCarver {
    image: RgbImage,
    mask: Grid<bool>,
    energy: Grid<f32>,
    cost: Grid<f32>,
    parent: Grid<u32>,
    // Validity flags, true = must recompute. Kept as parallel grids rather
    // than a NaN sentinel so every stored value stays a legitimate f32.
    stale_energy: Grid<bool>,
    stale_cost: Grid<bool>,
}

impl IncrementalCarver {
    /// Build a session from an image and an optional protection mask.
    ///
    /// The mask image is thresholded per pixel (brightest channel > 128).
    /// The initial energy and cost fields are built eagerly; every removal
    /// afterwards only patches them.
    ///
    /// # Errors
    ///
    /// [`Error::MaskDimensionMismatch`] if the mask's dimensions differ
    /// from the image's.
    pub fn new(image: RgbImage, mask_image: Option<&RgbImage>) -> Result<Self> {
        let (width, height) = image.dimensions();
        let mask = match mask_image {
            Some(m) if m.dimensions() != (width, height) => {
                return Err(Error::MaskDimensionMismatch {
                    image_width: width,
                    image_height: height,
                    mask_width: m.width(),
                    mask_height: m.height(),
                });
            }
            Some(m) => protection_mask(m),
            None => Grid::new(width, height),
        };

        let energy = masked_energy_map(&image, &mask);
        let (cost, parent) = build_cost(&energy);

        Ok(Self {
            image,
            mask,
            energy,
            cost,
            parent,
            stale_energy: Grid::new(width, height),
            stale_cost: Grid::new(width, height),
        })
    }

    /// Current raster width.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current raster height.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the current raster.
    #[must_use]
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Consume the session, returning the carved raster.
    #[must_use]
    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Compute the next minimum-energy vertical seam.
    ///
    /// Repairs the cells left stale by the previous removal first; calling
    /// it twice without an intervening removal finds nothing to repair and
    /// returns the same seam.
    pub fn find_seam(&mut self) -> Seam {
        self.rebuild_energy();
        self.rebuild_cost();
        seam::extract_seam(&self.cost, &self.parent)
    }

    /// Remove `seam` from the raster and every auxiliary grid in lockstep,
    /// shrinking the width by one, then flag the cells whose inputs the
    /// removal touched.
    ///
    /// # Panics
    ///
    /// Panics if the seam does not match the current raster shape.
    pub fn remove_seam(&mut self, seam: &Seam) {
        self.image = seam::remove_seam_from_image(&self.image, seam);
        self.mask.remove_seam(seam);
        self.energy.remove_seam(seam);
        self.cost.remove_seam(seam);
        self.parent.remove_seam(seam);
        self.stale_energy.remove_seam(seam);
        self.stale_cost.remove_seam(seam);

        self.shift_backtrace(seam);
        self.mark_stale(seam);
    }

    /// Find and remove `seams` seams in sequence.
    ///
    /// # Errors
    ///
    /// [`Error::BadCropAmount`] or [`Error::CropExceedsWidth`] if the crop
    /// amount fails validation against the current width; nothing is
    /// removed in that case.
    pub fn carve_by(&mut self, seams: u32) -> Result<()> {
        validate_crop(seams, self.width())?;
        for _ in 0..seams {
            let seam = self.find_seam();
            self.remove_seam(&seam);
        }
        Ok(())
    }

    // Recompute every energy cell flagged stale from the already-shifted
    // raster and mask.
    fn rebuild_energy(&mut self) {
        for y in 0..self.height() {
            for x in 0..self.width() {
                if self.stale_energy[(x, y)] {
                    self.energy[(x, y)] = masked_pixel_energy(&self.image, &self.mask, x, y);
                    self.stale_energy[(x, y)] = false;
                }
            }
        }
    }

    // Frontier-driven repair of the cost and backtrace grids. A cell is
    // revisited when it is flagged stale or when a cell it depends on in
    // the row above changed; a recomputation that changes the stored value
    // flags the column and its neighbors for the next row. A row that
    // changes nothing contributes nothing further to propagation.
    //
    // Comparisons are exact on purpose: an untouched input chain reproduces
    // the stored value bit for bit, and that is what stops the front.
    #[allow(clippy::float_cmp)]
    fn rebuild_cost(&mut self) {
        let (width, height) = (self.width(), self.height());
        let mut changed = RowFrontier::new(width);
        let mut changed_next = RowFrontier::new(width);

        // Row 0 of the cost field is the energy row itself.
        for x in 0..width {
            if self.stale_cost[(x, 0)] {
                self.stale_cost[(x, 0)] = false;
                let value = self.energy[(x, 0)];
                if value != self.cost[(x, 0)] {
                    self.cost[(x, 0)] = value;
                    changed.mark_with_neighbors(x);
                }
            }
        }

        for y in 1..height {
            for x in 0..width {
                if !self.stale_cost[(x, y)] && !changed.contains(x) {
                    continue;
                }
                self.stale_cost[(x, y)] = false;

                let (parent_x, parent_cost) = min_parent(self.cost.row(y - 1), x);
                let value = self.energy[(x, y)] + parent_cost;
                self.parent[(x, y)] = parent_x;
                if value != self.cost[(x, y)] {
                    self.cost[(x, y)] = value;
                    changed_next.mark_with_neighbors(x);
                }
            }
            std::mem::swap(&mut changed, &mut changed_next);
            changed_next.clear();
        }
    }

    // Backtrace entries are absolute columns in the row above; after the
    // compaction, entries pointing right of the removed column are one too
    // far. Entries pointing AT the removed column all sit inside the stale
    // set and are recomputed before anything reads them.
    fn shift_backtrace(&mut self, seam: &Seam) {
        for y in 1..self.height() {
            let removed_above = seam.columns()[y as usize - 1];
            for x in 0..self.width() {
                if self.parent[(x, y)] > removed_above {
                    self.parent[(x, y)] -= 1;
                }
            }
        }
    }

    // Flag every cell a from-scratch rebuild could value differently.
    //
    // The energy neighborhood is toroidal, so the stale set wraps at every
    // edge: per row, the splice point where the removed pixel's former
    // neighbors now meet, its two flanking columns, and the splice column
    // (plus left flank) of the rows above and below. The seam is only
    // column-adjacent INSIDE the image, not across the vertical wrap, so
    // rows 0 and height-1 additionally flag the whole span between their
    // two splice columns: each is the other's wrapped vertical neighbor.
    fn mark_stale(&mut self, seam: &Seam) {
        let (width, height) = (self.width(), self.height());
        let last_x = width - 1;
        let last_y = height - 1;

        for y in 0..height {
            let splice = seam.columns()[y as usize].min(last_x);
            let left = if splice == 0 { last_x } else { splice - 1 };
            let right = if splice == last_x { 0 } else { splice + 1 };
            let above = if y == 0 { last_y } else { y - 1 };
            let below = if y == last_y { 0 } else { y + 1 };

            self.flag(splice, y);
            self.flag(left, y);
            self.flag(right, y);
            self.flag(splice, above);
            self.flag(left, above);
            self.flag(splice, below);
            self.flag(left, below);
        }

        let top = seam.columns()[0];
        let bottom = seam.columns()[last_y as usize];
        for x in top.min(bottom)..top.max(bottom) {
            if x < width {
                self.flag(x, 0);
                self.flag(x, last_y);
            }
        }
    }

    // Energy staleness always implies cost staleness: the cost cell sums
    // the energy cell, so the two flags travel together.
    fn flag(&mut self, x: u32, y: u32) {
        self.stale_energy[(x, y)] = true;
        self.stale_cost[(x, y)] = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carver::SeamCarver;
    use image::Rgb;

    fn gray(v: u8) -> Rgb<u8> {
        Rgb([v, v, v])
    }

    fn textured(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                ((x * 37 + y * 101) % 255) as u8,
                ((x * 71 + y * 13 + 40) % 255) as u8,
                ((x * 5 + y * 197 + 90) % 255) as u8,
            ])
        })
    }

    // A diagonal valley of zero-cost pixels running from (2, 0) down to
    // (9, height-1): the seam drifts one column per row, so its top and
    // bottom columns differ and the vertical-wrap marking is exercised.
    fn valley(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let distance = x.abs_diff(2 + y) * 60;
            gray(distance.min(255) as u8)
        })
    }

    // Flat column `flat_x` against rows of per-row tones: zero energy down
    // the flat column, strictly positive everywhere else.
    fn edge_stripe(width: u32, flat_x: u32) -> RgbImage {
        const TONES: [u8; 5] = [10, 60, 160, 240, 90];
        RgbImage::from_fn(width, 5, |x, y| {
            if x == flat_x {
                gray(128)
            } else {
                gray(TONES[y as usize])
            }
        })
    }

    // The contract of the whole module: after a repair pass, the fields are
    // numerically identical to a from-scratch rebuild on the current
    // raster and mask.
    fn assert_matches_full_rebuild(carver: &IncrementalCarver) {
        let reference_energy = masked_energy_map(&carver.image, &carver.mask);
        let (ref_cost, ref_parent) = build_cost(&reference_energy);

        for y in 0..carver.height() {
            for x in 0..carver.width() {
                let energy_diff = (carver.energy[(x, y)] - reference_energy[(x, y)]).abs();
                assert!(
                    energy_diff <= 1e-3,
                    "energy mismatch at ({x}, {y}): {} vs {}",
                    carver.energy[(x, y)],
                    reference_energy[(x, y)]
                );
                let cost_diff = (carver.cost[(x, y)] - ref_cost[(x, y)]).abs();
                assert!(
                    cost_diff <= 1e-3,
                    "cost mismatch at ({x}, {y}): {} vs {}",
                    carver.cost[(x, y)],
                    ref_cost[(x, y)]
                );
                if y > 0 {
                    assert_eq!(
                        carver.parent[(x, y)],
                        ref_parent[(x, y)],
                        "backtrace mismatch at ({x}, {y})"
                    );
                }
            }
        }
    }

    fn assert_equivalence_over_removals(image: RgbImage, mask: Option<&RgbImage>, removals: u32) {
        let mut carver = IncrementalCarver::new(image, mask).unwrap();
        for _ in 0..removals {
            let seam = carver.find_seam();
            // find_seam just repaired the fields; hold them against a
            // from-scratch rebuild before carrying on.
            assert_matches_full_rebuild(&carver);
            carver.remove_seam(&seam);
        }
        let _ = carver.find_seam();
        assert_matches_full_rebuild(&carver);
    }

    #[test]
    fn repaired_fields_match_full_rebuild_on_texture() {
        assert_equivalence_over_removals(textured(24, 16), None, 8);
    }

    #[test]
    fn repaired_fields_match_full_rebuild_with_mask() {
        let image = textured(20, 12);
        let mut mask_image = RgbImage::new(20, 12);
        for (x, y) in [(4, 3), (5, 3), (5, 4), (12, 9)] {
            mask_image.put_pixel(x, y, gray(255));
        }
        assert_equivalence_over_removals(image, Some(&mask_image), 7);
    }

    #[test]
    fn repaired_fields_match_full_rebuild_when_seam_slants() {
        let image = valley(16, 8);
        let mut carver = IncrementalCarver::new(image, None).unwrap();
        let seam = carver.find_seam();
        assert_ne!(
            seam.columns().first(),
            seam.columns().last(),
            "valley image should produce a slanted seam"
        );
        carver.remove_seam(&seam);
        let _ = carver.find_seam();
        assert_matches_full_rebuild(&carver);

        for _ in 0..3 {
            let seam = carver.find_seam();
            carver.remove_seam(&seam);
            let _ = carver.find_seam();
            assert_matches_full_rebuild(&carver);
        }
    }

    #[test]
    fn repaired_fields_match_full_rebuild_at_left_edge() {
        let image = edge_stripe(6, 0);
        let mut carver = IncrementalCarver::new(image, None).unwrap();
        let seam = carver.find_seam();
        assert_eq!(seam.columns(), &[0, 0, 0, 0, 0]);
        carver.remove_seam(&seam);
        let _ = carver.find_seam();
        assert_matches_full_rebuild(&carver);
    }

    #[test]
    fn repaired_fields_match_full_rebuild_at_right_edge() {
        let image = edge_stripe(6, 5);
        let mut carver = IncrementalCarver::new(image, None).unwrap();
        let seam = carver.find_seam();
        assert_eq!(seam.columns(), &[5, 5, 5, 5, 5]);
        carver.remove_seam(&seam);
        let _ = carver.find_seam();
        assert_matches_full_rebuild(&carver);
    }

    #[test]
    fn masked_pixel_is_carved_out_first() {
        let image = textured(10, 8);
        let mut mask_image = RgbImage::new(10, 8);
        mask_image.put_pixel(5, 3, gray(255));

        let mut carver = IncrementalCarver::new(image, Some(&mask_image)).unwrap();
        let seam = carver.find_seam();
        assert_eq!(seam.columns()[3], 5);
    }

    #[test]
    fn mask_dimension_mismatch_is_an_input_error() {
        let image = textured(10, 8);
        let mask_image = RgbImage::new(10, 9);
        let err = IncrementalCarver::new(image, Some(&mask_image)).unwrap_err();
        assert!(matches!(
            err,
            Error::MaskDimensionMismatch {
                image_width: 10,
                image_height: 8,
                mask_width: 10,
                mask_height: 9,
            }
        ));
    }

    #[test]
    fn all_grids_track_the_raster_shape() {
        let mut carver = IncrementalCarver::new(textured(9, 6), None).unwrap();
        for expected_width in (5..=8).rev() {
            let seam = carver.find_seam();
            carver.remove_seam(&seam);
            assert_eq!(carver.width(), expected_width);
            assert_eq!(carver.height(), 6);
            for grid_width in [
                carver.mask.width(),
                carver.energy.width(),
                carver.cost.width(),
                carver.parent.width(),
                carver.stale_energy.width(),
                carver.stale_cost.width(),
            ] {
                assert_eq!(grid_width, expected_width);
            }
        }
    }

    #[test]
    fn find_seam_is_idempotent() {
        let mut carver = IncrementalCarver::new(textured(14, 10), None).unwrap();
        let seam = carver.find_seam();
        carver.remove_seam(&seam);

        let first = carver.find_seam();
        let second = carver.find_seam();
        assert_eq!(first, second);
    }

    #[test]
    fn repair_clears_every_stale_flag() {
        let mut carver = IncrementalCarver::new(textured(12, 7), None).unwrap();
        let seam = carver.find_seam();
        carver.remove_seam(&seam);
        let _ = carver.find_seam();

        for y in 0..carver.height() {
            for x in 0..carver.width() {
                assert!(!carver.stale_energy[(x, y)]);
                assert!(!carver.stale_cost[(x, y)]);
            }
        }
    }

    #[test]
    fn agrees_with_the_full_rebuild_engine() {
        let image = textured(15, 11);
        let mut incremental = IncrementalCarver::new(image.clone(), None).unwrap();
        let mut rebuild = SeamCarver::new(image);

        for _ in 0..6 {
            let a = incremental.find_seam();
            let b = rebuild.find_seam();
            assert_eq!(a, b);
            incremental.remove_seam(&a);
            rebuild.remove_seam(&b);
        }
        assert_eq!(incremental.image().as_raw(), rebuild.image().as_raw());
    }

    #[test]
    fn carve_by_validates_before_removing() {
        let mut carver = IncrementalCarver::new(textured(5, 4), None).unwrap();
        assert!(matches!(
            carver.carve_by(5),
            Err(Error::CropExceedsWidth { crop: 5, width: 5 })
        ));
        assert_eq!(carver.width(), 5);

        carver.carve_by(4).unwrap();
        assert_eq!(carver.width(), 1);
    }
}
