//! Texture decoding and the per-model texture cache.

use std::{collections::HashMap, sync::Arc};

use anyhow::Context;

use crate::resource::ResourceLocator;

/// Texture data in CPU-friendly format before GPU upload.
#[derive(Clone, Debug, PartialEq)]
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
    pub fn new_rgba8(width: u32, height: u32, data: Vec<u8>) -> anyhow::Result<Self> {
        let expected = width as usize * height as usize * 4;
        anyhow::ensure!(
            data.len() == expected,
            "RGBA8 data is {} bytes, expected {} for {}x{}",
            data.len(),
            expected,
            width,
            height
        );
        Ok(Self {
            data,
            width,
            height,
            format: TextureFormat::Rgba8,
        })
    }

    /// Decode an encoded image (format sniffed from the bytes).
    pub fn decode(bytes: &[u8]) -> anyhow::Result<Self> {
        let img = image::load_from_memory(bytes).context("Failed to decode image")?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::new_rgba8(width, height, rgba.into_raw())
    }

    /// Resolve `reference` through the locator and decode it.
    pub fn load(locator: &ResourceLocator, base: &str, reference: &str) -> anyhow::Result<Self> {
        let bytes = locator
            .read(base, reference)
            .with_context(|| format!("Failed to read texture {}", reference))?;
        let texture =
            Self::decode(&bytes).with_context(|| format!("Failed to load texture {}", reference))?;
        log::info!(
            "Loaded texture {} {}x{} with {} bytes",
            reference,
            texture.width,
            texture.height,
            texture.data.len()
        );
        Ok(texture)
    }

    /// Get the number of bytes per pixel for the format.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self.format {
            TextureFormat::Rgba8 => 4,
        }
    }

    /// Check if the texture data is valid.
    pub fn is_valid(&self) -> bool {
        let expected_size = (self.width * self.height * self.bytes_per_pixel()) as usize;
        self.data.len() == expected_size && self.width > 0 && self.height > 0
    }
}

/// Textures of one model, keyed by the material's `map_Kd` reference.
///
/// Each reference is loaded at most once; failures are remembered as `None`
/// so a broken file is not retried for every face that uses it.
pub struct TextureCache<'a> {
    locator: &'a ResourceLocator,
    base: &'a str,
    entries: HashMap<String, Option<Arc<TextureData>>>,
}

impl<'a> TextureCache<'a> {
    pub fn new(locator: &'a ResourceLocator, base: &'a str) -> Self {
        Self {
            locator,
            base,
            entries: HashMap::new(),
        }
    }

    pub fn get_or_load(&mut self, reference: &str) -> Option<Arc<TextureData>> {
        if let Some(entry) = self.entries.get(reference) {
            return entry.clone();
        }

        let loaded = match TextureData::load(self.locator, self.base, reference) {
            Ok(texture) => Some(Arc::new(texture)),
            Err(e) => {
                log::warn!("Failed to load texture {}: {:#}; drawing untextured", reference, e);
                None
            }
        };
        self.entries.insert(reference.to_string(), loaded.clone());
        loaded
    }

    /// Number of distinct references looked up so far, including failures.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Successfully loaded textures.
    pub fn into_loaded(self) -> HashMap<String, Arc<TextureData>> {
        self.entries
            .into_iter()
            .filter_map(|(k, v)| v.map(|t| (k, t)))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Cursor;

    use super::*;

    /// PNG-encoded `size`x`size` checkerboard.
    pub(crate) fn png_bytes(size: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_fn(size, size, |x, y| {
            if ((x / 8) + (y / 8)) % 2 == 0 {
                image::Rgba([255, 255, 255, 255])
            } else {
                image::Rgba([128, 128, 128, 255])
            }
        });
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .expect("encode png");
        buf
    }

    #[test]
    fn decodes_png_to_rgba8() {
        let tex = TextureData::decode(&png_bytes(16)).expect("decode");
        assert_eq!((tex.width, tex.height), (16, 16));
        assert_eq!(tex.format, TextureFormat::Rgba8);
        assert!(tex.is_valid());
        assert_eq!(&tex.data[..4], &[255, 255, 255, 255]);
    }

    #[test]
    fn rejects_mismatched_buffer() {
        assert!(TextureData::new_rgba8(2, 2, vec![0; 15]).is_err());
    }

    #[test]
    fn loads_each_reference_once() {
        let locator = ResourceLocator::new()
            .with_bundled("m/a.png", png_bytes(8))
            .with_bundled("m/broken.png", b"not an image".to_vec());
        let mut cache = TextureCache::new(&locator, "m");

        let first = cache.get_or_load("a.png").expect("a.png loads");
        let second = cache.get_or_load("a.png").expect("cached");
        assert!(Arc::ptr_eq(&first, &second));

        assert!(cache.get_or_load("broken.png").is_none());
        assert!(cache.get_or_load("broken.png").is_none());
        assert!(cache.get_or_load("absent.png").is_none());
        assert_eq!(cache.len(), 3);

        let loaded = cache.into_loaded();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains_key("a.png"));
    }
}
