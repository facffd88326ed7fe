// SPDX-License-Identifier: MIT OR Apache-2.0
//! A content directory: settings plus the clip and atlas libraries.
//!
//! Everything a frame needs is reachable from one [`ContentRoot`] value that
//! the caller constructs and passes around.

use crate::document::{self, DocumentError};
use crate::keyframe::Millis;
use crate::library::{AtlasLibrary, ClipLibrary};
use crate::render::{draw_list, DrawItem};
use crate::settings::{Settings, SettingsError};
use image::RgbaImage;
use std::path::PathBuf;
use std::sync::Arc;

/// Errors that can occur while opening or saving a content directory
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Settings could not be read or written
    #[error("Settings: {0}")]
    Settings(#[from] SettingsError),
    /// A library document could not be read or written
    #[error("{path}: {source}")]
    Document {
        /// Library file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: DocumentError,
    },
}

/// Loaded content directory
#[derive(Debug, Clone)]
pub struct ContentRoot {
    /// Directory all relative paths resolve against
    pub base_dir: PathBuf,
    /// Directory settings
    pub settings: Settings,
    /// Clips
    pub clips: ClipLibrary,
    /// Atlases
    pub atlases: AtlasLibrary,
}

impl ContentRoot {
    /// An empty root for `base_dir` with default settings
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            settings: Settings::default(),
            clips: ClipLibrary::new(),
            atlases: AtlasLibrary::new(),
        }
    }

    /// Open a content directory.
    ///
    /// A missing settings file means default settings; a missing library
    /// file means an empty library.
    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self, ContentError> {
        let base_dir = base_dir.into();
        let settings = Settings::load_or_default(&base_dir)?;

        let clip_path = base_dir.join(&settings.clip_library_file);
        let clips = if clip_path.exists() {
            document::load_clip_library(&clip_path).map_err(|source| ContentError::Document {
                path: clip_path,
                source,
            })?
        } else {
            tracing::debug!("No clip library at {:?}", clip_path);
            ClipLibrary::new()
        };

        let atlas_path = base_dir.join(&settings.atlas_library_file);
        let atlases = if atlas_path.exists() {
            document::load_atlas_library(&atlas_path).map_err(|source| {
                ContentError::Document {
                    path: atlas_path,
                    source,
                }
            })?
        } else {
            tracing::debug!("No atlas library at {:?}", atlas_path);
            AtlasLibrary::new()
        };

        tracing::info!(
            "Opened content {:?}: {} clips, {} atlases",
            base_dir,
            clips.len(),
            atlases.len()
        );

        Ok(Self {
            base_dir,
            settings,
            clips,
            atlases,
        })
    }

    /// Write settings and both libraries back to the content directory
    pub fn save(&self) -> Result<(), ContentError> {
        std::fs::create_dir_all(&self.base_dir)?;
        self.settings.save(&Settings::file_path(&self.base_dir))?;

        let clip_path = self.clip_library_path();
        document::save_clip_library(&self.clips, &clip_path)
            .map_err(|source| ContentError::Document { path: clip_path, source })?;

        let atlas_path = self.atlas_library_path();
        document::save_atlas_library(&self.atlases, &atlas_path)
            .map_err(|source| ContentError::Document { path: atlas_path, source })?;
        Ok(())
    }

    /// Clip library file path
    pub fn clip_library_path(&self) -> PathBuf {
        self.base_dir.join(&self.settings.clip_library_file)
    }

    /// Atlas library file path
    pub fn atlas_library_path(&self) -> PathBuf {
        self.base_dir.join(&self.settings.atlas_library_file)
    }

    /// Evaluate a clip at `time` under the configured view and return its
    /// draw list; `clip` is a name or a `"set:clip"` key, `None` if neither
    /// resolves
    pub fn evaluate(&mut self, clip: &str, time: Millis) -> Option<Vec<DrawItem>> {
        let view = self.settings.view_transform();
        let clip = self.clips.find_mut(clip)?;
        clip.set_time_with_view(time, view);
        Some(draw_list(clip, &self.atlases))
    }

    /// Decoded image of an atlas, loading it on first use
    pub fn texture(&self, atlas: &str) -> Option<Arc<RgbaImage>> {
        self.atlases
            .get(atlas)
            .map(|atlas| atlas.texture(&self.base_dir))
    }
}
