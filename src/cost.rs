//! Cumulative-cost construction over an energy field.
//!
//! The cost of reaching pixel `(x, y)` from the top of the image is
//! `energy(x, y) + min(cost(x-1, y-1), cost(x, y-1), cost(x+1, y-1))`,
//! with candidates outside the row excluded and row 0 copied straight from
//! the energy field. A backtrace grid records which parent column won each
//! minimum so the seam can be reconstructed bottom-up.
//!
//! Ties break to the leftmost candidate, here and everywhere else a minimum
//! is taken, so repeated runs on identical input are reproducible.

use crate::grid::Grid;

/// Choose the minimum-cost parent for column `x` among the candidates
/// `{x-1, x, x+1}` clamped to the previous row.
///
/// Returns `(parent_column, parent_cost)`. The scan moves left to right and
/// only a strictly smaller cost displaces the current winner, so ties go to
/// the leftmost candidate.
///
/// Shared by the full rebuild and the incremental repair pass; the two must
/// never disagree on a tie.
#[must_use]
pub fn min_parent(prev_row: &[f32], x: u32) -> (u32, f32) {
    // Row widths originate from image dimensions, which fit u32.
    #[allow(clippy::cast_possible_truncation)]
    let last = (x + 1).min(prev_row.len() as u32 - 1);
    let first = x.saturating_sub(1);

    let mut best_x = first;
    let mut best = prev_row[first as usize];
    for candidate in (first + 1)..=last {
        let cost = prev_row[candidate as usize];
        if cost < best {
            best = cost;
            best_x = candidate;
        }
    }
    (best_x, best)
}

/// Build the full cumulative-cost and backtrace grids for an energy field.
///
/// Row 0 of the cost grid equals row 0 of the energy field exactly; row 0
/// of the backtrace is left at its default and never read.
#[must_use]
pub fn build_cost(energy: &Grid<f32>) -> (Grid<f32>, Grid<u32>) {
    let (width, height) = (energy.width(), energy.height());
    let mut cost = Grid::new(width, height);
    let mut parent = Grid::new(width, height);

    for x in 0..width {
        cost[(x, 0)] = energy[(x, 0)];
    }
    for y in 1..height {
        for x in 0..width {
            let (parent_x, parent_cost) = min_parent(cost.row(y - 1), x);
            parent[(x, y)] = parent_x;
            cost[(x, y)] = energy[(x, y)] + parent_cost;
        }
    }
    (cost, parent)
}
