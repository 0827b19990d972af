//! The still picture shown for the whole length of every video.

use std::path::Path;

use auricle_common::error::{AuricleError, AuricleResult};
use image::imageops::{self, FilterType};
use image::{RgbImage, RgbaImage};

/// Round each dimension up to the nearest even number.
///
/// H.264 encoders only accept even frame sizes.
pub fn even_dimensions(width: u32, height: u32) -> (u32, u32) {
    (width + width % 2, height + height % 2)
}

/// A decoded image held as tightly packed 8-bit RGB or RGBA rows.
#[derive(Clone, PartialEq, Eq)]
pub struct StillImage {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    has_alpha: bool,
}

impl std::fmt::Debug for StillImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StillImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("has_alpha", &self.has_alpha)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

impl StillImage {
    /// Wrap raw pixel memory. `pixels` must hold exactly
    /// `width * height * channels` bytes.
    pub fn from_raw(
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        has_alpha: bool,
    ) -> AuricleResult<Self> {
        if width == 0 || height == 0 {
            return Err(AuricleError::image(format!(
                "Image has an empty dimension: {width}x{height}"
            )));
        }
        let channels = if has_alpha { 4 } else { 3 };
        let expected = width as usize * height as usize * channels;
        if pixels.len() != expected {
            return Err(AuricleError::image(format!(
                "Pixel buffer holds {} bytes, expected {expected} for {width}x{height}",
                pixels.len()
            )));
        }
        Ok(Self {
            pixels,
            width,
            height,
            has_alpha,
        })
    }

    /// Decode an image file. Images with an alpha channel stay RGBA,
    /// everything else is converted to RGB.
    pub fn open(path: &Path) -> AuricleResult<Self> {
        if !path.is_file() {
            return Err(AuricleError::file_not_found(path));
        }
        let decoded = image::open(path).map_err(|e| {
            AuricleError::image(format!("Failed to load {}: {e}", path.display()))
        })?;

        let has_alpha = decoded.color().has_alpha();
        let (width, height) = (decoded.width(), decoded.height());
        let pixels = if has_alpha {
            decoded.into_rgba8().into_raw()
        } else {
            decoded.into_rgb8().into_raw()
        };
        tracing::debug!(path = %path.display(), width, height, has_alpha, "Loaded still image");
        Self::from_raw(pixels, width, height, has_alpha)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    pub fn channels(&self) -> usize {
        if self.has_alpha {
            4
        } else {
            3
        }
    }

    /// Bytes per tightly packed row.
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.channels()
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn has_even_dimensions(&self) -> bool {
        even_dimensions(self.width, self.height) == (self.width, self.height)
    }

    /// Scale up by at most one pixel per axis so both dimensions are even.
    pub fn into_even_dimensions(self) -> AuricleResult<Self> {
        let (width, height) = even_dimensions(self.width, self.height);
        if (width, height) == (self.width, self.height) {
            return Ok(self);
        }

        tracing::info!(
            from_width = self.width,
            from_height = self.height,
            width,
            height,
            "Rescaling still image to even dimensions"
        );

        let mismatch = || AuricleError::image("Pixel buffer does not match image dimensions");
        let pixels = if self.has_alpha {
            let buf = RgbaImage::from_raw(self.width, self.height, self.pixels)
                .ok_or_else(mismatch)?;
            imageops::resize(&buf, width, height, FilterType::Triangle).into_raw()
        } else {
            let buf = RgbImage::from_raw(self.width, self.height, self.pixels)
                .ok_or_else(mismatch)?;
            imageops::resize(&buf, width, height, FilterType::Triangle).into_raw()
        };

        Self::from_raw(pixels, width, height, self.has_alpha)
    }

    /// Copy the rows into a buffer whose rows are `stride` bytes apart.
    /// Padding bytes are zero. `stride` smaller than a packed row is
    /// treated as the packed row length.
    pub fn packed_to_stride(&self, stride: usize) -> Vec<u8> {
        let row = self.row_bytes();
        if stride <= row {
            return self.pixels.clone();
        }
        let mut out = vec![0u8; stride * self.height as usize];
        for (src, dst) in self.pixels.chunks_exact(row).zip(out.chunks_exact_mut(stride)) {
            dst[..row].copy_from_slice(src);
        }
        out
    }
}
