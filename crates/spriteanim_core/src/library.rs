// SPDX-License-Identifier: MIT OR Apache-2.0
//! Name-indexed libraries of clips and atlases.
//!
//! Both libraries keep insertion order and replace on add: adding an item
//! whose name is already present overwrites the old entry in its slot.
//!
//! Clips can additionally be grouped into named [`ClipSet`]s (all the
//! animations of one character, say) and looked up as `"set:clip"`.

use crate::atlas::{Atlas, ImageRegion};
use crate::clip::Clip;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Separator between the two parts of an `"atlas:image"` or `"set:clip"` key
pub const IMAGE_KEY_SEPARATOR: char = ':';

/// A named group of clips, referenced by clip name
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipSet {
    /// Set name, unique within a library
    pub name: String,
    clips: Vec<String>,
}

impl ClipSet {
    /// Create an empty set
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            clips: Vec::new(),
        }
    }

    /// Builder form of [`ClipSet::add`]
    pub fn with_clip(mut self, clip: impl Into<String>) -> Self {
        self.add(clip);
        self
    }

    /// Add a member; returns `false` if it was already a member
    pub fn add(&mut self, clip: impl Into<String>) -> bool {
        let clip = clip.into();
        if self.contains(&clip) {
            return false;
        }
        self.clips.push(clip);
        true
    }

    /// Remove a member
    pub fn remove(&mut self, clip: &str) -> bool {
        let before = self.clips.len();
        self.clips.retain(|c| c != clip);
        self.clips.len() != before
    }

    /// Whether `clip` is a member
    pub fn contains(&self, clip: &str) -> bool {
        self.clips.iter().any(|c| c == clip)
    }

    /// Member clip names in insertion order
    pub fn clips(&self) -> &[String] {
        &self.clips
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// Whether the set has no members
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

/// Library of clips keyed by name, plus named sets grouping them
#[derive(Debug, Clone, Default)]
pub struct ClipLibrary {
    clips: IndexMap<String, Clip>,
    sets: IndexMap<String, ClipSet>,
}

impl ClipLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by name; returns the replaced clip
    pub fn add(&mut self, clip: Clip) -> Option<Clip> {
        self.clips.insert(clip.name.clone(), clip)
    }

    /// Get a clip by name
    pub fn get(&self, name: &str) -> Option<&Clip> {
        self.clips.get(name)
    }

    /// Get a mutable clip by name
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Clip> {
        self.clips.get_mut(name)
    }

    /// Whether a clip named `name` exists
    pub fn contains(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }

    /// Remove a clip by name, dropping it from every set
    pub fn delete(&mut self, name: &str) -> bool {
        if self.clips.shift_remove(name).is_none() {
            return false;
        }
        for set in self.sets.values_mut() {
            set.remove(name);
        }
        true
    }

    /// Number of clips
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// Whether the library is empty
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Remove every clip and set
    pub fn clear(&mut self) {
        self.clips.clear();
        self.sets.clear();
    }

    /// Clips in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Clip> {
        self.clips.values()
    }

    /// Clip names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clips.keys().map(String::as_str)
    }

    /// Insert or replace a set by name; returns the replaced set
    pub fn add_set(&mut self, set: ClipSet) -> Option<ClipSet> {
        self.sets.insert(set.name.clone(), set)
    }

    /// Get a set by name
    pub fn set(&self, name: &str) -> Option<&ClipSet> {
        self.sets.get(name)
    }

    /// Get a mutable set by name
    pub fn set_mut(&mut self, name: &str) -> Option<&mut ClipSet> {
        self.sets.get_mut(name)
    }

    /// Remove a set; its clips stay in the library
    pub fn delete_set(&mut self, name: &str) -> bool {
        self.sets.shift_remove(name).is_some()
    }

    /// Sets in insertion order
    pub fn sets(&self) -> impl Iterator<Item = &ClipSet> {
        self.sets.values()
    }

    /// Clips of a set that are present in the library, in set order
    pub fn set_clips<'a>(&'a self, set: &str) -> impl Iterator<Item = &'a Clip> + 'a {
        self.sets
            .get(set)
            .into_iter()
            .flat_map(|set| set.clips.iter())
            .filter_map(move |name| self.clips.get(name))
    }

    /// Resolve a `"set:clip"` key; the clip must be a member of the set
    pub fn resolve(&self, key: &str) -> Option<&Clip> {
        let (set, clip) = split_image_key(key)?;
        if !self.sets.get(set)?.contains(clip) {
            return None;
        }
        self.clips.get(clip)
    }

    /// Mutable form of [`ClipLibrary::resolve`]
    pub fn resolve_mut(&mut self, key: &str) -> Option<&mut Clip> {
        let (set, clip) = split_image_key(key)?;
        if !self.sets.get(set)?.contains(clip) {
            return None;
        }
        self.clips.get_mut(clip)
    }

    /// Look up a clip by plain name, falling back to a `"set:clip"` key
    pub fn find(&self, key: &str) -> Option<&Clip> {
        self.get(key).or_else(|| self.resolve(key))
    }

    /// Mutable form of [`ClipLibrary::find`]
    pub fn find_mut(&mut self, key: &str) -> Option<&mut Clip> {
        if self.clips.contains_key(key) {
            return self.clips.get_mut(key);
        }
        self.resolve_mut(key)
    }
}

/// Library of atlases keyed by name
#[derive(Debug, Clone, Default)]
pub struct AtlasLibrary {
    atlases: IndexMap<String, Atlas>,
}

impl AtlasLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by name; returns the replaced atlas
    pub fn add(&mut self, atlas: Atlas) -> Option<Atlas> {
        self.atlases.insert(atlas.name.clone(), atlas)
    }

    /// Get an atlas by name
    pub fn get(&self, name: &str) -> Option<&Atlas> {
        self.atlases.get(name)
    }

    /// Get a mutable atlas by name
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Atlas> {
        self.atlases.get_mut(name)
    }

    /// Whether an atlas named `name` exists
    pub fn contains(&self, name: &str) -> bool {
        self.atlases.contains_key(name)
    }

    /// Remove an atlas by name
    pub fn delete(&mut self, name: &str) -> bool {
        self.atlases.shift_remove(name).is_some()
    }

    /// Number of atlases
    pub fn len(&self) -> usize {
        self.atlases.len()
    }

    /// Whether the library is empty
    pub fn is_empty(&self) -> bool {
        self.atlases.is_empty()
    }

    /// Remove every atlas
    pub fn clear(&mut self) {
        self.atlases.clear();
    }

    /// Atlases in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Atlas> {
        self.atlases.values()
    }

    /// Atlas names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.atlases.keys().map(String::as_str)
    }

    /// Resolve an `"atlas:image"` key to its atlas and region.
    ///
    /// Keys without exactly one separator, unknown atlases and unknown
    /// images all resolve to `None`.
    pub fn resolve(&self, key: &str) -> Option<(&Atlas, &ImageRegion)> {
        let (atlas_name, image_name) = split_image_key(key)?;
        let atlas = self.get(atlas_name)?;
        let region = atlas.get(image_name)?;
        Some((atlas, region))
    }

    /// Resolve an `"atlas:image"` key to its region
    pub fn image(&self, key: &str) -> Option<&ImageRegion> {
        self.resolve(key).map(|(_, region)| region)
    }
}

/// Split an image key into `(atlas, image)`; `None` unless there is exactly
/// one separator
pub fn split_image_key(key: &str) -> Option<(&str, &str)> {
    let (atlas, image) = key.split_once(IMAGE_KEY_SEPARATOR)?;
    if image.contains(IMAGE_KEY_SEPARATOR) {
        return None;
    }
    Some((atlas, image))
}

/// Join an atlas and image name into an image key
pub fn image_key(atlas: &str, image: &str) -> String {
    format!("{atlas}{IMAGE_KEY_SEPARATOR}{image}")
}
