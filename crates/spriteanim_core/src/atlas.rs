// SPDX-License-Identifier: MIT OR Apache-2.0
//! Image atlases: a source image plus named sub-image rectangles.

use image::{ImageError, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// Edge length of the placeholder texture in pixels
pub const PLACEHOLDER_SIZE: u32 = 16;

/// Integer pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width
    pub width: i32,
    /// Height
    pub height: i32,
}

impl Rect {
    /// Create a rectangle
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// The same rectangle shifted by `(dx, dy)`
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }
}

/// A named sub-image of an atlas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageRegion {
    /// Region name, unique within its atlas
    pub name: String,
    /// Left edge in the atlas image
    pub x: i32,
    /// Top edge in the atlas image
    pub y: i32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
}

impl ImageRegion {
    /// Create a region
    pub fn new(name: impl Into<String>, x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            width,
            height,
        }
    }

    /// The region as a rectangle in atlas coordinates
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

impl Default for ImageRegion {
    fn default() -> Self {
        Self::new("", 0, 0, 100, 100)
    }
}

/// Errors that can occur while decoding an atlas image
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    /// The atlas has no source file
    #[error("Atlas '{0}' has no source file")]
    NoSource(String),
    /// Image decoding error
    #[error("Failed to load {path}: {source}")]
    Decode {
        /// File that failed to load
        path: PathBuf,
        /// Underlying decoder error
        #[source]
        source: ImageError,
    },
}

/// A named source image with its sub-image regions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Atlas {
    /// Atlas name, unique within a library
    pub name: String,
    /// Image file, relative to the content directory
    pub source_file: String,
    /// Nominal width
    pub width: f32,
    /// Nominal height
    pub height: f32,
    images: Vec<ImageRegion>,
    #[serde(skip)]
    texture: OnceLock<Arc<RgbaImage>>,
}

impl Atlas {
    /// Create an empty atlas
    pub fn new(name: impl Into<String>, source_file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_file: source_file.into(),
            width: 1.0,
            height: 1.0,
            images: Vec::new(),
            texture: OnceLock::new(),
        }
    }

    /// Add a region, replacing any region with the same name in place
    pub fn add(&mut self, region: ImageRegion) {
        match self.images.iter_mut().find(|r| r.name == region.name) {
            Some(existing) => *existing = region,
            None => self.images.push(region),
        }
    }

    /// Builder form of [`Atlas::add`]
    pub fn with_region(mut self, region: ImageRegion) -> Self {
        self.add(region);
        self
    }

    /// Get a region by name
    pub fn get(&self, name: &str) -> Option<&ImageRegion> {
        self.images.iter().find(|r| r.name == name)
    }

    /// Whether a region with `name` exists
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Remove a region by name
    pub fn delete(&mut self, name: &str) -> bool {
        let before = self.images.len();
        self.images.retain(|r| r.name != name);
        self.images.len() != before
    }

    /// All regions in insertion order
    pub fn images(&self) -> &[ImageRegion] {
        &self.images
    }

    /// Whether the decoded image has been loaded yet
    pub fn is_texture_loaded(&self) -> bool {
        self.texture.get().is_some()
    }

    /// Decoded atlas image, loaded on first use and kept for the life of
    /// the atlas. A file that fails to load is replaced by a placeholder.
    pub fn texture(&self, base_dir: &Path) -> Arc<RgbaImage> {
        self.texture
            .get_or_init(|| match self.load_texture(base_dir) {
                Ok(image) => {
                    tracing::debug!(
                        "Loaded atlas '{}' ({}x{})",
                        self.name,
                        image.width(),
                        image.height()
                    );
                    Arc::new(image)
                }
                Err(e) => {
                    tracing::warn!("{e}; using placeholder");
                    Arc::new(placeholder_texture())
                }
            })
            .clone()
    }

    /// Install an already decoded image, e.g. one generated in memory.
    ///
    /// Returns `false` if a texture was already loaded.
    pub fn set_texture(&self, image: RgbaImage) -> bool {
        self.texture.set(Arc::new(image)).is_ok()
    }

    fn load_texture(&self, base_dir: &Path) -> Result<RgbaImage, TextureError> {
        if self.source_file.is_empty() {
            return Err(TextureError::NoSource(self.name.clone()));
        }
        let path = base_dir.join(&self.source_file);
        image::open(&path)
            .map(|image| image.to_rgba8())
            .map_err(|source| TextureError::Decode { path, source })
    }
}

impl Default for Atlas {
    fn default() -> Self {
        Self::new("", "")
    }
}

/// Magenta/black checkerboard drawn in place of missing images
pub fn placeholder_texture() -> RgbaImage {
    let half = PLACEHOLDER_SIZE / 2;
    RgbaImage::from_fn(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, |x, y| {
        if (x < half) == (y < half) {
            Rgba([255, 0, 255, 255])
        } else {
            Rgba([0, 0, 0, 255])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regions_are_unique_by_name() {
        let mut atlas = Atlas::new("hero", "hero.png");
        atlas.add(ImageRegion::new("body", 0, 0, 64, 64));
        atlas.add(ImageRegion::new("head", 64, 0, 32, 32));
        atlas.add(ImageRegion::new("body", 0, 64, 128, 64));

        assert_eq!(atlas.images().len(), 2);
        assert_eq!(atlas.get("body").unwrap().rect(), Rect::new(0, 64, 128, 64));
        assert_eq!(atlas.images()[0].name, "body");

        assert!(atlas.delete("head"));
        assert!(!atlas.delete("head"));
        assert!(!atlas.contains("head"));
    }

    #[test]
    fn missing_file_yields_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let atlas = Atlas::new("ghost", "does-not-exist.png");
        let texture = atlas.texture(dir.path());
        assert_eq!(texture.dimensions(), (PLACEHOLDER_SIZE, PLACEHOLDER_SIZE));
        assert!(atlas.is_texture_loaded());
        // cached: same allocation on the second call
        assert!(Arc::ptr_eq(&texture, &atlas.texture(dir.path())));
    }

    #[test]
    fn loads_image_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.png");
        RgbaImage::from_pixel(8, 4, Rgba([1, 2, 3, 255])).save(&path).unwrap();

        let atlas = Atlas::new("sheet", "sheet.png");
        assert!(!atlas.is_texture_loaded());
        let texture = atlas.texture(dir.path());
        assert_eq!(texture.dimensions(), (8, 4));
        assert_eq!(texture.get_pixel(0, 0), &Rgba([1, 2, 3, 255]));

        std::fs::remove_file(&path).unwrap();
        assert_eq!(atlas.texture(dir.path()).dimensions(), (8, 4));
    }

    #[test]
    fn preset_texture_wins() {
        let atlas = Atlas::new("mem", "");
        assert!(atlas.set_texture(RgbaImage::new(3, 3)));
        assert!(!atlas.set_texture(RgbaImage::new(5, 5)));
        assert_eq!(atlas.texture(Path::new(".")).dimensions(), (3, 3));
    }

    #[test]
    fn rect_offset() {
        assert_eq!(Rect::new(1, 2, 3, 4).offset(10, 20), Rect::new(11, 22, 3, 4));
    }
}
