// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sprite animation evaluation core.
//!
//! This crate turns authored 2D sprite animations into per-frame draw data:
//! - Keyframes with affine arithmetic and interpolation
//! - Tracks that sample their keyframes and cascade transforms to children
//! - Clips that drive a whole track tree from one time cursor
//! - Clip and atlas libraries with `"atlas:image"` and `"set:clip"` lookup
//! - Sprite-sheet cell selection and draw ordering
//!
//! ## Architecture
//!
//! Evaluation is a two-pass walk over a clip's track tree:
//! - Local pass: every track samples its keyframes at the clip time
//! - Transform pass: each track composes its local transform onto its
//!   parent's and hands the result to its children
//!
//! Persistence (RON documents), settings and the [`ContentRoot`] sit on top
//! and are optional for embedders that build clips in code.

pub mod math;
pub mod keyframe;
pub mod track;
pub mod clip;
pub mod atlas;
pub mod library;
pub mod render;
pub mod playback;
pub mod document;
pub mod settings;
pub mod content;

pub use glam;

pub use math::{build_transform, compose, EulerAngles};
pub use keyframe::{Color, Keyframe, Millis};
pub use track::{Track, TrackId};
pub use clip::{Clip, ClipId, DEFAULT_DURATION_MS};
pub use atlas::{Atlas, ImageRegion, Rect, TextureError};
pub use library::{AtlasLibrary, ClipLibrary, ClipSet, image_key, split_image_key};
pub use render::{draw_list, sheet_cell, DrawItem, DrawSource};
pub use playback::{LoopMode, Playback, PlaybackSet, PlaybackState};
pub use document::{ClipLibraryDocument, AtlasLibraryDocument, DocumentError};
pub use settings::{Settings, SettingsError};
pub use content::{ContentError, ContentRoot};
