//! Texture decoding into CPU-side RGBA8 data ready for upload.

use std::path::Path;

use corelib::{CoreError, CoreResult};

/// Texture data in CPU-friendly format before GPU upload.
///
/// Rows are stored bottom-up: row 0 is the bottom of the image, so an OBJ
/// texcoord `v = 0` samples the bottom edge.
#[derive(Clone, Debug)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Supported texture formats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TextureFormat {
    Rgba8,
}

impl TextureData {
    /// Create a new texture with given dimensions and RGBA8 format.
    pub fn new_rgba8(width: u32, height: u32, data: Vec<u8>) -> Self {
        assert_eq!(
            data.len(),
            (width * height * 4) as usize,
            "Data size doesn't match RGBA8 format"
        );
        Self {
            data,
            width,
            height,
            format: TextureFormat::Rgba8,
        }
    }

    /// Decode an image file (with alpha) and flip it to bottom-up row order.
    pub fn load<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let path = path.as_ref();
        log::info!("Loading texture from {:?}", path);

        let img = image::open(path).map_err(|e| CoreError::TextureLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let tex = Self::from_image(img);
        log::info!(
            "Loaded texture {}x{} with {} bytes",
            tex.width,
            tex.height,
            tex.data.len()
        );
        Ok(tex)
    }

    /// Same as [`TextureData::load`] for an in-memory encoded image.
    pub fn from_encoded(bytes: &[u8], name: &Path) -> CoreResult<Self> {
        let img = image::load_from_memory(bytes).map_err(|e| CoreError::TextureLoad {
            path: name.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_image(img))
    }

    fn from_image(img: image::DynamicImage) -> Self {
        let rgba = img.flipv().to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::new_rgba8(width, height, rgba.into_raw())
    }

    /// 1x1 texture of a single color.
    pub fn solid_rgba8(rgba: [u8; 4]) -> Self {
        Self::new_rgba8(1, 1, rgba.to_vec())
    }

    /// Get the number of bytes per pixel for the format.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self.format {
            TextureFormat::Rgba8 => 4,
        }
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.width * self.bytes_per_pixel()
    }

    /// Check if the texture data is valid.
    pub fn is_valid(&self) -> bool {
        let expected_size = (self.width * self.height * self.bytes_per_pixel()) as usize;
        self.data.len() == expected_size && self.width > 0 && self.height > 0
    }

    /// RGBA of the pixel at `(x, row)` in stored (bottom-up) order.
    pub fn pixel(&self, x: u32, row: u32) -> Option<[u8; 4]> {
        if x >= self.width || row >= self.height {
            return None;
        }
        let i = ((row * self.width + x) * 4) as usize;
        self.data.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }
}
