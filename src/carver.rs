//! Carving sessions and the file-processing layer.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, RgbImage};

use crate::cost::build_cost;
use crate::energy::energy_map;
use crate::error::{Error, Result};
use crate::incremental::IncrementalCarver;
use crate::seam::{self, Seam};

/// Carving engine selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarveVariant {
    /// Keep the energy/cost fields alive across removals and recompute only
    /// the cells each removal invalidates.
    Incremental,
    /// Rebuild the energy and cost fields from scratch for every seam.
    FullRebuild,
}

/// Options controlling a carving run.
#[derive(Debug, Clone)]
pub struct CarveOptions {
    /// Number of seams to remove.
    pub crop: u32,
    /// Engine selection. A mask forces the incremental engine regardless.
    pub variant: CarveVariant,
    /// Optional protection mask image; its bright pixels are carved out
    /// before anything else.
    pub mask: Option<PathBuf>,
    /// Optional path for a copy of the input with the removed seams painted
    /// red.
    pub seam_overlay: Option<PathBuf>,
    /// Suppress progress output (consumed by the CLI; the library itself
    /// never prints).
    pub silent: bool,
}

impl Default for CarveOptions {
    fn default() -> Self {
        Self {
            crop: 100,
            variant: CarveVariant::Incremental,
            mask: None,
            seam_overlay: None,
            silent: false,
        }
    }
}

/// Result of carving a single image file.
#[derive(Debug)]
pub struct CarveSummary {
    /// Path of the input file.
    pub path: PathBuf,
    /// Width before carving.
    pub original_width: u32,
    /// Width after carving.
    pub final_width: u32,
    /// Image height, unchanged by carving.
    pub height: u32,
    /// Number of seams removed.
    pub seams_removed: u32,
}

/// Check a crop amount against the current raster width.
///
/// Carving `crop` seams from a `width`-column image must leave at least one
/// column, and the check runs before any seam is touched.
///
/// # Errors
///
/// [`Error::BadCropAmount`] if `crop` is zero, [`Error::CropExceedsWidth`]
/// if `crop >= width`.
pub fn validate_crop(crop: u32, width: u32) -> Result<()> {
    if crop < 1 {
        return Err(Error::BadCropAmount { crop });
    }
    if crop >= width {
        return Err(Error::CropExceedsWidth { crop, width });
    }
    Ok(())
}

/// The simple carving engine: rebuilds the energy and cumulative-cost
/// fields from scratch inside every [`find_seam`](SeamCarver::find_seam).
///
/// Stateless between steps and easy to reason about; prefer
/// [`IncrementalCarver`] when carving many seams from a large image.
pub struct SeamCarver {
    image: RgbImage,
}

impl SeamCarver {
    /// Wrap an image for carving.
    #[must_use]
    pub fn new(image: RgbImage) -> Self {
        Self { image }
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
    /// Pure: two calls without an intervening removal return the same seam.
    #[must_use]
    pub fn find_seam(&self) -> Seam {
        let (cost, parent) = build_cost(&energy_map(&self.image));
        seam::extract_seam(&cost, &parent)
    }

    /// Remove `seam` from the raster, shrinking the width by one.
    ///
    /// # Panics
    ///
    /// Panics if the seam does not match the raster's current shape.
    pub fn remove_seam(&mut self, seam: &Seam) {
        self.image = seam::remove_seam_from_image(&self.image, seam);
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
}

/// Carve a single image file: load, validate, carve, save.
///
/// An `output` of `None` derives `{stem}_carved.{ext}` next to the input.
/// When `options.mask` is set the incremental engine is used regardless of
/// `options.variant`.
///
/// # Errors
///
/// Configuration errors ([`Error::BadCropAmount`],
/// [`Error::CropExceedsWidth`]), input errors ([`Error::Image`],
/// [`Error::MaskDimensionMismatch`]), and save failures ([`Error::Io`],
/// [`Error::UnsupportedFormat`]).
pub fn process_file(
    input: &Path,
    output: Option<&Path>,
    options: &CarveOptions,
) -> Result<CarveSummary> {
    let image = image::open(input)?.to_rgb8();
    let original_width = image.width();
    let height = image.height();

    let mask = match &options.mask {
        Some(path) => Some(image::open(path)?.to_rgb8()),
        None => None,
    };

    validate_crop(options.crop, original_width)?;

    let collect_seams = options.seam_overlay.is_some();
    let original = collect_seams.then(|| image.clone());
    let mut seams: Vec<Seam> = Vec::new();

    let use_incremental =
        mask.is_some() || options.variant == CarveVariant::Incremental;

    let carved = if use_incremental {
        let mut carver = IncrementalCarver::new(image, mask.as_ref())?;
        for _ in 0..options.crop {
            let seam = carver.find_seam();
            carver.remove_seam(&seam);
            if collect_seams {
                seams.push(seam);
            }
        }
        carver.into_image()
    } else {
        let mut carver = SeamCarver::new(image);
        for _ in 0..options.crop {
            let seam = carver.find_seam();
            carver.remove_seam(&seam);
            if collect_seams {
                seams.push(seam);
            }
        }
        carver.into_image()
    };

    if let (Some(original), Some(overlay_path)) = (original, options.seam_overlay.as_deref()) {
        save_image(&seam::draw_seams(&original, &seams), overlay_path)?;
    }

    let output_path = output.map_or_else(|| default_output_path(input), Path::to_path_buf);
    save_image(&carved, &output_path)?;

    Ok(CarveSummary {
        path: input.to_path_buf(),
        original_width,
        final_width: carved.width(),
        height,
        seams_removed: options.crop,
    })
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Save an RGB image with format-specific quality settings.
///
/// # Errors
///
/// Returns an error if the format is unsupported or writing fails.
pub fn save_image(img: &RgbImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    let dyn_img = DynamicImage::ImageRgb8(img.clone());

    match format {
        ImageFormat::Jpeg => {
            let file = std::fs::File::create(path)?;
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, 100);
            encoder.encode_image(&dyn_img)?;
        }
        ImageFormat::Png | ImageFormat::WebP | ImageFormat::Bmp => {
            dyn_img.save(path)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }
    }

    Ok(())
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.jpg"` becomes `"photo_carved.jpg"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let ext = input.extension().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_carved.{ext}"))
}
