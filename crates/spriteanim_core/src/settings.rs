// SPDX-License-Identifier: MIT OR Apache-2.0
//! Content directory settings.
//!
//! Stored as `spriteanim.ron` next to the libraries it points at. Every
//! field has a default, so an empty `()` file is valid.

use crate::keyframe::Millis;
use crate::playback::LoopMode;
use glam::{Affine2, Vec2};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Settings file name inside a content directory
pub const SETTINGS_FILE_NAME: &str = "spriteanim.ron";

/// Errors that can occur while loading or saving settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid RON
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),
    /// Written by a newer format
    #[error("Settings version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version found in the file
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },
}

/// Content directory settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Settings format version
    pub version: u32,
    /// Clip library file, relative to the content directory
    pub clip_library_file: String,
    /// Atlas library file, relative to the content directory
    pub atlas_library_file: String,
    /// Screen position of the clip origin
    pub view_origin: Vec2,
    /// Uniform zoom applied to every clip
    pub view_scale: f32,
    /// Loop mode for new playbacks
    pub loop_mode: LoopMode,
    /// Default time step for stepping playback
    pub frame_step_ms: Millis,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            clip_library_file: "clips.ron".to_string(),
            atlas_library_file: "atlases.ron".to_string(),
            view_origin: Vec2::ZERO,
            view_scale: 1.0,
            loop_mode: LoopMode::Repeat,
            frame_step_ms: 16,
        }
    }
}

impl Settings {
    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = ron::from_str(&content)?;

        // Version check
        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: settings.version,
                supported: SETTINGS_FORMAT_VERSION,
            });
        }

        Ok(settings)
    }

    /// Load settings from a content directory, falling back to defaults
    /// when the directory has no settings file
    pub fn load_or_default(content_dir: &Path) -> Result<Self, SettingsError> {
        let path = Self::file_path(content_dir);
        if !path.exists() {
            tracing::debug!("No settings at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        let content = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Settings file path for a content directory
    pub fn file_path(content_dir: &Path) -> PathBuf {
        content_dir.join(SETTINGS_FILE_NAME)
    }

    /// Transform applied above every root track
    pub fn view_transform(&self) -> Affine2 {
        Affine2::from_scale_angle_translation(Vec2::splat(self.view_scale), 0.0, self.view_origin)
    }
}
