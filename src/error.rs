//! Error types for the seam-carving crate.

/// Errors that can occur while configuring or running a carving session.
///
/// Contract violations (a malformed seam, auxiliary arrays out of shape)
/// are deliberately NOT here: those are caller bugs and panic instead,
/// since carrying on would corrupt the session's shape invariants.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested crop amount is too small to do anything.
    #[error("crop amount must be at least 1, got {crop}")]
    BadCropAmount {
        /// Requested number of seams.
        crop: u32,
    },

    /// Carving this many seams would leave no image.
    #[error("cannot carve {crop} seams from an image only {width} columns wide")]
    CropExceedsWidth {
        /// Requested number of seams.
        crop: u32,
        /// Current raster width in pixels.
        width: u32,
    },

    /// The protection mask's dimensions differ from the image's.
    #[error("mask is {mask_width}x{mask_height} but image is {image_width}x{image_height}")]
    MaskDimensionMismatch {
        /// Image width in pixels.
        image_width: u32,
        /// Image height in pixels.
        image_height: u32,
        /// Mask width in pixels.
        mask_width: u32,
        /// Mask height in pixels.
        mask_height: u32,
    },

    /// The image format is not supported for saving.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error occurred during image processing (load, save, encode).
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
