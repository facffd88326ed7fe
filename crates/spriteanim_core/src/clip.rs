// SPDX-License-Identifier: MIT OR Apache-2.0
//! Clips: a named, timed tree of tracks.
//!
//! The clip owns every track of its hierarchy in an arena keyed by
//! [`TrackId`]. Roots and child lists hold IDs, so removing a track from
//! its parent list is the only way a track leaves the tree, and it takes
//! its subtree with it.

use crate::keyframe::Millis;
use crate::track::{Track, TrackId};
use glam::Affine2;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default clip duration in milliseconds
pub const DEFAULT_DURATION_MS: Millis = 5000;

/// Unique identifier for a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClipId(pub Uuid);

impl ClipId {
    /// Create a new random clip ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

/// One animation: a set of root tracks sharing a time cursor
#[derive(Debug, Clone)]
pub struct Clip {
    /// Unique clip ID
    pub id: ClipId,
    /// Clip name, unique within a library
    pub name: String,
    /// Nominal length, used by drivers for looping
    pub duration_ms: Millis,
    /// Whether the clip is enabled
    pub enabled: bool,
    tracks: IndexMap<TrackId, Track>,
    roots: Vec<TrackId>,
}

impl Clip {
    /// Create a new empty clip
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ClipId::new(),
            name: name.into(),
            duration_ms: DEFAULT_DURATION_MS,
            enabled: true,
            tracks: IndexMap::new(),
            roots: Vec::new(),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration_ms: Millis) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Append a root track. Any children listed on `track` are dropped.
    pub fn add_root(&mut self, mut track: Track) -> TrackId {
        track.children.clear();
        if self.tracks.contains_key(&track.id) {
            track.id = TrackId::new();
        }
        let id = track.id;
        self.tracks.insert(id, track);
        self.roots.push(id);
        id
    }

    /// Append a child track under `parent`.
    ///
    /// Returns `None` (and drops `track`) if `parent` is not in this clip.
    pub fn add_child(&mut self, parent: TrackId, mut track: Track) -> Option<TrackId> {
        if self.tracks.contains_key(&track.id) {
            track.id = TrackId::new();
        }
        let id = track.id;
        self.tracks.get_mut(&parent)?.children.push(id);
        track.children.clear();
        self.tracks.insert(id, track);
        Some(id)
    }

    /// Remove a track and its whole subtree; returns the removed track
    pub fn remove_track(&mut self, id: TrackId) -> Option<Track> {
        if !self.tracks.contains_key(&id) {
            return None;
        }

        self.roots.retain(|&r| r != id);
        for track in self.tracks.values_mut() {
            track.children.retain(|&c| c != id);
        }

        let mut pending = vec![id];
        let mut removed = None;
        while let Some(next) = pending.pop() {
            if let Some(track) = self.tracks.shift_remove(&next) {
                pending.extend(track.children.iter().copied());
                if next == id {
                    removed = Some(track);
                }
            }
        }
        removed
    }

    /// Get a track
    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    /// Get a mutable track
    pub fn track_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        self.tracks.get_mut(&id)
    }

    /// Find the first track with `name`, in depth-first order
    pub fn find_by_name(&self, name: &str) -> Option<TrackId> {
        self.walk().into_iter().find(|id| self.tracks[id].name == name)
    }

    /// Root track IDs in list order
    pub fn roots(&self) -> &[TrackId] {
        &self.roots
    }

    /// Child IDs of a track (empty for unknown IDs)
    pub fn children(&self, id: TrackId) -> &[TrackId] {
        self.tracks.get(&id).map(Track::children).unwrap_or(&[])
    }

    /// Parent of a track, `None` for roots and unknown IDs
    pub fn parent_of(&self, id: TrackId) -> Option<TrackId> {
        self.tracks
            .values()
            .find(|t| t.children.contains(&id))
            .map(|t| t.id)
    }

    /// Get track count, over the whole tree
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// All track IDs in depth-first pre-order (parent before children)
    pub fn walk(&self) -> Vec<TrackId> {
        let mut order = Vec::with_capacity(self.tracks.len());
        let mut stack: Vec<TrackId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        order
    }

    /// Latest keyframe time over all tracks
    pub fn content_duration(&self) -> Millis {
        self.tracks.values().map(Track::duration).max().unwrap_or(0)
    }

    /// Evaluate a track and its subtree at `time`.
    ///
    /// Every track in the subtree sees the same time.
    pub fn evaluate_track(&mut self, id: TrackId, time: Millis) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(track) = self.tracks.get_mut(&next) {
                track.evaluate_local(time);
                stack.extend(track.children.iter().copied());
            }
        }
    }

    /// Push `parent` into a track and cascade the composed transform to its
    /// subtree. Must run after [`Clip::evaluate_track`] for that subtree.
    pub fn propagate_transform(&mut self, id: TrackId, parent: Affine2) {
        let mut stack = vec![(id, parent)];
        while let Some((next, parent)) = stack.pop() {
            if let Some(track) = self.tracks.get_mut(&next) {
                let composed = track.propagate_local(parent);
                stack.extend(track.children.iter().map(|&c| (c, composed)));
            }
        }
    }

    /// Re-propagate a track using the parent transform it last received
    pub fn flush_transform(&mut self, id: TrackId) {
        if let Some(parent) = self.tracks.get(&id).map(Track::parent_transform) {
            self.propagate_transform(id, parent);
        }
    }

    /// Evaluate every root track at `time` and propagate from identity
    pub fn set_time(&mut self, time: Millis) {
        self.set_time_with_view(time, Affine2::IDENTITY);
    }

    /// Evaluate every root track at `time` and propagate from `view`
    pub fn set_time_with_view(&mut self, time: Millis, view: Affine2) {
        for index in 0..self.roots.len() {
            let root = self.roots[index];
            self.evaluate_track(root, time);
            self.propagate_transform(root, view);
        }
    }

    /// Iterate over all tracks in arena order
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }
}

impl Default for Clip {
    fn default() -> Self {
        Self::new("Untitled Clip")
    }
}
