//! Content-aware image resizing via seam carving.
//!
//! Seam carving shrinks an image's width by repeatedly deleting the
//! vertical path of pixels (a "seam") with the lowest accumulated gradient
//! energy, so visually busy content survives where uniform scaling or
//! cropping would mangle it.
//!
//! # Quick Start
//!
//! ```no_run
//! use seam_carving::IncrementalCarver;
//!
//! let img = image::open("photo.jpg").unwrap().to_rgb8();
//! let mut carver = IncrementalCarver::new(img, None).unwrap();
//! carver.carve_by(100).unwrap();
//! carver.image().save("photo_narrow.jpg").unwrap();
//! ```
//!
//! Two engines compute identical seams: [`SeamCarver`] rebuilds its energy
//! and cost fields from scratch for every seam, while [`IncrementalCarver`]
//! keeps them alive across removals and repairs only the cells each removal
//! invalidates — the better choice when carving many seams.
//!
//! # Protection masks
//!
//! A mask image of the same dimensions marks pixels for forced removal:
//! wherever the mask's brightest channel exceeds 128, the pixel's energy is
//! pinned to a large negative sentinel and seams route through it before
//! touching anything else.
//!
//! ```no_run
//! use seam_carving::IncrementalCarver;
//!
//! let img = image::open("photo.jpg").unwrap().to_rgb8();
//! let mask = image::open("unwanted.png").unwrap().to_rgb8();
//! let mut carver = IncrementalCarver::new(img, Some(&mask)).unwrap();
//! carver.carve_by(40).unwrap();
//! ```

#![deny(missing_docs)]

pub mod carver;
pub mod cost;
pub mod energy;
pub mod error;
pub mod frontier;
pub mod grid;
pub mod incremental;
pub mod seam;

pub use carver::{
    default_output_path, is_supported_image, process_file, save_image, validate_crop,
    CarveOptions, CarveSummary, CarveVariant, SeamCarver,
};
pub use error::{Error, Result};
pub use incremental::IncrementalCarver;
pub use seam::{draw_seams, Seam};
