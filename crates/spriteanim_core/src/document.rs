// SPDX-License-Identifier: MIT OR Apache-2.0
//! RON documents for clip and atlas libraries.
//!
//! Tracks are stored nested, the way they are authored. Loading rebuilds
//! the arena form, sorts every keyframe list and rejects values the
//! evaluator cannot use.

use crate::atlas::Atlas;
use crate::clip::{Clip, DEFAULT_DURATION_MS};
use crate::keyframe::{Keyframe, Millis};
use crate::library::{AtlasLibrary, ClipLibrary, ClipSet};
use crate::track::{Track, TrackId};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current document format version
pub const DOCUMENT_FORMAT_VERSION: u32 = 1;

/// Errors that can occur while reading or writing documents
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The text is not a valid document
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),
    /// Written by a newer format
    #[error("Document version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version found in the document
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },
    /// A keyframe carries NaN or infinity
    #[error("Clip '{clip}', track '{track}': keyframe at {time} ms has non-finite values")]
    NonFiniteKeyframe {
        /// Clip name
        clip: String,
        /// Track name
        track: String,
        /// Keyframe time
        time: Millis,
    },
    /// Sprite-sheet rows or columns of zero
    #[error("Clip '{clip}', track '{track}': sheet needs at least one row and column")]
    InvalidSheet {
        /// Clip name
        clip: String,
        /// Track name
        track: String,
    },
}

/// A track and its subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackDocument {
    /// Track name
    pub name: String,
    /// Whether the track is drawn
    pub enabled: bool,
    /// Composite image key
    pub image: String,
    /// Sprite-sheet columns
    pub sheet_columns: u32,
    /// Sprite-sheet rows
    pub sheet_rows: u32,
    /// Reserved sheet start index
    pub sheet_start_index: u32,
    /// Keyframes, in any order
    pub keys: Vec<Keyframe>,
    /// Child tracks in draw order
    pub tracks: Vec<TrackDocument>,
}

impl Default for TrackDocument {
    fn default() -> Self {
        Self {
            name: String::new(),
            enabled: true,
            image: String::new(),
            sheet_columns: 1,
            sheet_rows: 1,
            sheet_start_index: 0,
            keys: Vec::new(),
            tracks: Vec::new(),
        }
    }
}

/// One clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipDocument {
    /// Clip name
    pub name: String,
    /// Duration in milliseconds
    pub duration_ms: Millis,
    /// Whether the clip is enabled
    pub enabled: bool,
    /// Root tracks
    pub tracks: Vec<TrackDocument>,
}

impl Default for ClipDocument {
    fn default() -> Self {
        Self {
            name: String::new(),
            duration_ms: DEFAULT_DURATION_MS,
            enabled: true,
            tracks: Vec::new(),
        }
    }
}

impl ClipDocument {
    /// Snapshot a clip's authored data (cached evaluation state is dropped)
    pub fn from_clip(clip: &Clip) -> Self {
        Self {
            name: clip.name.clone(),
            duration_ms: clip.duration_ms,
            enabled: clip.enabled,
            tracks: clip
                .roots()
                .iter()
                .filter_map(|&id| track_document(clip, id))
                .collect(),
        }
    }

    /// Build a clip, validating every track
    pub fn into_clip(self) -> Result<Clip, DocumentError> {
        let mut clip = Clip::new(self.name).with_duration(self.duration_ms);
        clip.enabled = self.enabled;
        for doc in self.tracks {
            insert_subtree(&mut clip, None, doc)?;
        }
        Ok(clip)
    }
}

fn track_document(clip: &Clip, id: TrackId) -> Option<TrackDocument> {
    let track = clip.track(id)?;
    Some(TrackDocument {
        name: track.name.clone(),
        enabled: track.enabled,
        image: track.image.clone(),
        sheet_columns: track.sheet_columns,
        sheet_rows: track.sheet_rows,
        sheet_start_index: track.sheet_start_index,
        keys: track.keyframes().to_vec(),
        tracks: track
            .children()
            .iter()
            .filter_map(|&child| track_document(clip, child))
            .collect(),
    })
}

fn insert_subtree(
    clip: &mut Clip,
    parent: Option<TrackId>,
    doc: TrackDocument,
) -> Result<(), DocumentError> {
    if doc.sheet_columns == 0 || doc.sheet_rows == 0 {
        return Err(DocumentError::InvalidSheet {
            clip: clip.name.clone(),
            track: doc.name,
        });
    }
    if let Some(bad) = doc.keys.iter().find(|k| !k.is_finite()) {
        return Err(DocumentError::NonFiniteKeyframe {
            clip: clip.name.clone(),
            track: doc.name,
            time: bad.time,
        });
    }

    let mut track = Track::new(doc.name)
        .with_image(doc.image)
        .with_sheet(doc.sheet_columns, doc.sheet_rows)
        .with_keyframes(doc.keys);
    track.enabled = doc.enabled;
    track.sheet_start_index = doc.sheet_start_index;

    let id = match parent {
        None => clip.add_root(track),
        Some(parent) => match clip.add_child(parent, track) {
            Some(id) => id,
            None => return Ok(()),
        },
    };
    for child in doc.tracks {
        insert_subtree(clip, Some(id), child)?;
    }
    Ok(())
}

/// All clips of a library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipLibraryDocument {
    /// Format version
    pub version: u32,
    /// Clips in library order
    pub clips: Vec<ClipDocument>,
    /// Named groups of the clips above
    pub sets: Vec<ClipSet>,
}

impl Default for ClipLibraryDocument {
    fn default() -> Self {
        Self {
            version: DOCUMENT_FORMAT_VERSION,
            clips: Vec::new(),
            sets: Vec::new(),
        }
    }
}

impl ClipLibraryDocument {
    /// Snapshot a library
    pub fn from_library(library: &ClipLibrary) -> Self {
        Self {
            version: DOCUMENT_FORMAT_VERSION,
            clips: library.iter().map(ClipDocument::from_clip).collect(),
            sets: library.sets().cloned().collect(),
        }
    }

    /// Build a library; later clips and sets replace earlier ones with the
    /// same name, and set members naming no clip are dropped
    pub fn into_library(self) -> Result<ClipLibrary, DocumentError> {
        check_version(self.version)?;
        let mut library = ClipLibrary::new();
        for doc in self.clips {
            if library.add(doc.into_clip()?).is_some() {
                tracing::debug!("Duplicate clip name in document; last one wins");
            }
        }
        for set in self.sets {
            let mut kept = ClipSet::new(set.name.as_str());
            for clip in set.clips() {
                if library.contains(clip) {
                    kept.add(clip.as_str());
                } else {
                    tracing::warn!("Set '{}' names unknown clip '{}'; dropped", set.name, clip);
                }
            }
            if library.add_set(kept).is_some() {
                tracing::debug!("Duplicate set name in document; last one wins");
            }
        }
        Ok(library)
    }
}

/// All atlases of a library
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasLibraryDocument {
    /// Format version
    pub version: u32,
    /// Atlases in library order
    pub atlases: Vec<Atlas>,
}

impl Default for AtlasLibraryDocument {
    fn default() -> Self {
        Self {
            version: DOCUMENT_FORMAT_VERSION,
            atlases: Vec::new(),
        }
    }
}

impl AtlasLibraryDocument {
    /// Snapshot a library
    pub fn from_library(library: &AtlasLibrary) -> Self {
        Self {
            version: DOCUMENT_FORMAT_VERSION,
            atlases: library.iter().cloned().collect(),
        }
    }

    /// Build a library; later atlases replace earlier ones with the same name
    pub fn into_library(self) -> Result<AtlasLibrary, DocumentError> {
        check_version(self.version)?;
        let mut library = AtlasLibrary::new();
        for atlas in self.atlases {
            library.add(atlas);
        }
        Ok(library)
    }
}

fn check_version(found: u32) -> Result<(), DocumentError> {
    if found > DOCUMENT_FORMAT_VERSION {
        return Err(DocumentError::UnsupportedVersion {
            found,
            supported: DOCUMENT_FORMAT_VERSION,
        });
    }
    Ok(())
}

fn pretty() -> ron::ser::PrettyConfig {
    ron::ser::PrettyConfig::default()
        .struct_names(true)
        .enumerate_arrays(false)
}

/// Parse a clip library from RON text
pub fn parse_clip_library(text: &str) -> Result<ClipLibrary, DocumentError> {
    let doc: ClipLibraryDocument = ron::from_str(text)?;
    doc.into_library()
}

/// Render a clip library as RON text
pub fn clip_library_to_string(library: &ClipLibrary) -> Result<String, DocumentError> {
    Ok(ron::ser::to_string_pretty(
        &ClipLibraryDocument::from_library(library),
        pretty(),
    )?)
}

/// Load a clip library file
pub fn load_clip_library(path: &Path) -> Result<ClipLibrary, DocumentError> {
    let content = std::fs::read_to_string(path)?;
    let library = parse_clip_library(&content)?;
    tracing::info!("Loaded {} clips from {:?}", library.len(), path);
    Ok(library)
}

/// Save a clip library file
pub fn save_clip_library(library: &ClipLibrary, path: &Path) -> Result<(), DocumentError> {
    std::fs::write(path, clip_library_to_string(library)?)?;
    tracing::info!("Saved {} clips to {:?}", library.len(), path);
    Ok(())
}

/// Parse an atlas library from RON text
pub fn parse_atlas_library(text: &str) -> Result<AtlasLibrary, DocumentError> {
    let doc: AtlasLibraryDocument = ron::from_str(text)?;
    doc.into_library()
}

/// Render an atlas library as RON text
pub fn atlas_library_to_string(library: &AtlasLibrary) -> Result<String, DocumentError> {
    Ok(ron::ser::to_string_pretty(
        &AtlasLibraryDocument::from_library(library),
        pretty(),
    )?)
}

/// Load an atlas library file
pub fn load_atlas_library(path: &Path) -> Result<AtlasLibrary, DocumentError> {
    let content = std::fs::read_to_string(path)?;
    let library = parse_atlas_library(&content)?;
    tracing::info!("Loaded {} atlases from {:?}", library.len(), path);
    Ok(library)
}

/// Save an atlas library file
pub fn save_atlas_library(library: &AtlasLibrary, path: &Path) -> Result<(), DocumentError> {
    std::fs::write(path, atlas_library_to_string(library)?)?;
    tracing::info!("Saved {} atlases to {:?}", library.len(), path);
    Ok(())
}
