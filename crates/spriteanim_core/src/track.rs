// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animation tracks: sorted keyframes, sprite-sheet parameters and the
//! cached result of the last evaluation pass.
//!
//! A track does not own its children directly. The owning [`Clip`] keeps
//! every track in an arena and each track lists its children by
//! [`TrackId`].
//!
//! [`Clip`]: crate::clip::Clip

use crate::keyframe::{Keyframe, Millis};
use glam::Affine2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackId(pub Uuid);

impl TrackId {
    /// Create a new random track ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

/// A node in a clip's animation hierarchy
#[derive(Debug, Clone)]
pub struct Track {
    /// Unique track ID
    pub id: TrackId,
    /// Track name
    pub name: String,
    /// Disabled tracks (and their subtrees) are not drawn
    pub enabled: bool,
    /// Composite image key, `"atlas:image"`
    pub image: String,
    /// Sprite-sheet columns
    pub sheet_columns: u32,
    /// Sprite-sheet rows
    pub sheet_rows: u32,
    /// Reserved; not consulted by cell selection
    pub sheet_start_index: u32,
    keyframes: Vec<Keyframe>,
    pub(crate) children: Vec<TrackId>,
    cached_key: Keyframe,
    parent_transform: Affine2,
    cached_transform: Affine2,
}

impl Track {
    /// Create a new empty track
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TrackId::new(),
            name: name.into(),
            enabled: true,
            image: String::new(),
            sheet_columns: 1,
            sheet_rows: 1,
            sheet_start_index: 0,
            keyframes: Vec::new(),
            children: Vec::new(),
            cached_key: Keyframe::default(),
            parent_transform: Affine2::IDENTITY,
            cached_transform: Affine2::IDENTITY,
        }
    }

    /// Set the image key
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Set the sprite-sheet layout
    pub fn with_sheet(mut self, columns: u32, rows: u32) -> Self {
        self.sheet_columns = columns;
        self.sheet_rows = rows;
        self
    }

    /// Add keyframes, keeping the list sorted
    pub fn with_keyframes(mut self, keyframes: impl IntoIterator<Item = Keyframe>) -> Self {
        self.keyframes.extend(keyframes);
        self.sort_keyframes();
        self
    }

    /// Add a keyframe
    pub fn add_keyframe(&mut self, keyframe: Keyframe) {
        // Insert after any key with the same time so insertion order is kept
        let index = self.keyframes.partition_point(|k| k.time <= keyframe.time);
        self.keyframes.insert(index, keyframe);
    }

    /// Insert or replace the keyframe at `keyframe.time`
    pub fn set_keyframe_at(&mut self, keyframe: Keyframe) {
        match self.keyframes.iter_mut().find(|k| k.time == keyframe.time) {
            Some(existing) => *existing = keyframe,
            None => self.add_keyframe(keyframe),
        }
    }

    /// Remove the first keyframe at `time`
    pub fn remove_keyframe_at(&mut self, time: Millis) -> Option<Keyframe> {
        let index = self.keyframes.iter().position(|k| k.time == time)?;
        Some(self.keyframes.remove(index))
    }

    /// Move the first keyframe at `from` to `to`
    pub fn move_keyframe(&mut self, from: Millis, to: Millis) -> bool {
        let Some(key) = self.keyframes.iter_mut().find(|k| k.time == from) else {
            return false;
        };
        key.time = to;
        self.sort_keyframes();
        true
    }

    /// Get keyframe at time (if exists)
    pub fn keyframe_at(&self, time: Millis) -> Option<&Keyframe> {
        self.keyframes.iter().find(|k| k.time == time)
    }

    /// Edit the first keyframe at `time` in place; the list is re-sorted
    /// afterwards, so `edit` may also retime the key
    pub fn update_keyframe_at(&mut self, time: Millis, edit: impl FnOnce(&mut Keyframe)) -> bool {
        let Some(key) = self.keyframes.iter_mut().find(|k| k.time == time) else {
            return false;
        };
        edit(key);
        self.sort_keyframes();
        true
    }

    /// Get all keyframes, sorted by time
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Get keyframe count
    pub fn keyframe_count(&self) -> usize {
        self.keyframes.len()
    }

    /// Remove every keyframe
    pub fn clear_keyframes(&mut self) {
        self.keyframes.clear();
    }

    /// Get the duration (time of last keyframe)
    pub fn duration(&self) -> Millis {
        self.keyframes.last().map_or(0, |k| k.time)
    }

    /// Offset all keyframes by a time delta, clamping at zero
    pub fn offset_time(&mut self, delta: Millis) {
        for key in &mut self.keyframes {
            key.time = key.time.saturating_add(delta).max(0);
        }
        self.sort_keyframes();
    }

    /// Scale all keyframe times by a factor
    pub fn scale_time(&mut self, factor: f32) {
        for key in &mut self.keyframes {
            key.time = (key.time as f32 * factor).round() as Millis;
        }
        self.sort_keyframes();
    }

    /// Reverse all keyframes in time
    pub fn reverse(&mut self) {
        if self.keyframes.len() < 2 {
            return;
        }
        let duration = self.duration();
        for key in &mut self.keyframes {
            key.time = duration - key.time;
        }
        self.sort_keyframes();
    }

    fn sort_keyframes(&mut self) {
        self.keyframes.sort_by(Keyframe::cmp_time);
    }

    /// Child track IDs in draw/traversal order
    pub fn children(&self) -> &[TrackId] {
        &self.children
    }

    /// The interpolated keyframe from the last evaluation
    pub fn cached_key(&self) -> &Keyframe {
        &self.cached_key
    }

    /// The transform received from the parent on the last propagation
    pub fn parent_transform(&self) -> Affine2 {
        self.parent_transform
    }

    /// `parent_transform * build_transform(cached_key)` from the last propagation
    pub fn cached_transform(&self) -> Affine2 {
        self.cached_transform
    }

    /// Sample the keyframes at `time` without touching the cache.
    ///
    /// Empty tracks yield the current cached key.
    pub fn sample(&self, time: Millis) -> Keyframe {
        let keys = &self.keyframes;
        let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
            return self.cached_key;
        };

        if keys.len() == 1 || time <= first.time {
            return *first;
        }
        if time >= last.time {
            return *last;
        }

        // keys[left].time < time < keys[right].time holds throughout
        let (mut left, mut right) = (0, keys.len() - 1);
        while left + 1 < right {
            let middle = (left + right) / 2;
            let key = &keys[middle];
            if key.time == time {
                return *key;
            }
            if key.time < time {
                left = middle;
            } else {
                right = middle;
            }
        }

        let (k0, k1) = (&keys[left], &keys[right]);
        if k0.time == k1.time {
            return *k0;
        }

        let alpha = ((i64::from(time) - i64::from(k0.time)) as f64
            / (i64::from(k1.time) - i64::from(k0.time)) as f64) as f32;
        Keyframe {
            time,
            ..Keyframe::lerp(k0, k1, alpha)
        }
    }

    /// Evaluate this track alone at `time` and cache the result
    pub fn evaluate_local(&mut self, time: Millis) -> &Keyframe {
        self.cached_key = self.sample(time);
        &self.cached_key
    }

    /// Store `parent` and recompute the cached transform from the cached key
    pub fn propagate_local(&mut self, parent: Affine2) -> Affine2 {
        self.parent_transform = parent;
        self.cached_transform =
            crate::math::compose(parent, crate::math::build_transform(&self.cached_key));
        self.cached_transform
    }

    /// Overwrite the cached key, e.g. for an editor scrubbing a single track
    pub fn set_cached_key(&mut self, key: Keyframe) {
        self.cached_key = key;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::Color;
    use glam::Vec2;

    fn track_with(times: &[Millis]) -> Track {
        Track::new("test").with_keyframes(
            times
                .iter()
                .map(|&t| Keyframe::new(t).with_position(t as f32, -(t as f32))),
        )
    }

    #[test]
    fn keyframes_stay_sorted() {
        let mut track = Track::new("t");
        track.add_keyframe(Keyframe::new(300));
        track.add_keyframe(Keyframe::new(100));
        track.add_keyframe(Keyframe::new(200));
        let times: Vec<_> = track.keyframes().iter().map(|k| k.time).collect();
        assert_eq!(times, [100, 200, 300]);

        track.move_keyframe(100, 400);
        let times: Vec<_> = track.keyframes().iter().map(|k| k.time).collect();
        assert_eq!(times, [200, 300, 400]);
    }

    #[test]
    fn empty_track_returns_cached_key() {
        let mut track = Track::new("empty");
        assert_eq!(track.sample(500), Keyframe::default());

        let stale = Keyframe::new(7).with_rotation(12.0);
        track.set_cached_key(stale);
        assert_eq!(*track.evaluate_local(1000), stale);
    }

    #[test]
    fn single_key_always_wins() {
        let track = track_with(&[100]);
        assert_eq!(track.sample(-50), track.keyframes()[0]);
        assert_eq!(track.sample(5000), track.keyframes()[0]);
    }

    #[test]
    fn clamps_outside_range() {
        let track = track_with(&[100, 200, 300]);
        assert_eq!(track.sample(0), track.keyframes()[0]);
        assert_eq!(track.sample(100), track.keyframes()[0]);
        assert_eq!(track.sample(300), track.keyframes()[2]);
        assert_eq!(track.sample(999), track.keyframes()[2]);
    }

    #[test]
    fn exact_hit_returns_key() {
        let track = track_with(&[0, 100, 200, 300, 400, 500]);
        for key in track.keyframes() {
            assert_eq!(track.sample(key.time), *key);
        }
    }

    #[test]
    fn interpolates_bracketing_pair() {
        let times = [0, 100, 250, 400, 1000];
        let track = track_with(&times);
        for time in [1, 50, 99, 101, 200, 333, 999] {
            let keys = track.keyframes();
            let right = keys.iter().position(|k| k.time > time).unwrap();
            let (k0, k1) = (&keys[right - 1], &keys[right]);
            let alpha = (time - k0.time) as f32 / (k1.time - k0.time) as f32;
            let expected = Keyframe::lerp(k0, k1, alpha);
            let got = track.sample(time);
            assert!(got.position.abs_diff_eq(expected.position, 1e-3), "time {time}");
            assert_eq!(got.time, time);
        }
    }

    #[test]
    fn duplicate_times_do_not_divide_by_zero() {
        let mut track = Track::new("dup");
        track.add_keyframe(Keyframe::new(100).with_rotation(10.0));
        track.add_keyframe(Keyframe::new(100).with_rotation(20.0));
        track.add_keyframe(Keyframe::new(200).with_rotation(30.0));

        let mid = track.sample(150);
        assert!(mid.rotation.is_finite());
        assert!((mid.rotation - 25.0).abs() < 1e-4);
        assert!(track.sample(100).rotation.is_finite());
    }

    #[test]
    fn color_interpolation_in_range() {
        let track = Track::new("c").with_keyframes([
            Keyframe::new(0).with_tint(Color::rgba(0, 255, 10, 255)),
            Keyframe::new(100).with_tint(Color::rgba(255, 0, 20, 0)),
        ]);
        let mid = track.sample(50);
        assert_eq!(mid.tint, Color::rgba(128, 128, 15, 128));
    }

    #[test]
    fn editing_operations() {
        let mut track = track_with(&[0, 100, 200]);
        track.set_keyframe_at(Keyframe::new(100).with_rotation(5.0));
        assert_eq!(track.keyframe_count(), 3);
        assert_eq!(track.keyframe_at(100).map(|k| k.rotation), Some(5.0));

        track.set_keyframe_at(Keyframe::new(150));
        assert_eq!(track.keyframe_count(), 4);

        assert!(track.remove_keyframe_at(150).is_some());
        assert!(track.remove_keyframe_at(150).is_none());
        assert!(!track.move_keyframe(999, 1));

        track.offset_time(-50);
        let times: Vec<_> = track.keyframes().iter().map(|k| k.time).collect();
        assert_eq!(times, [0, 50, 150]);

        track.reverse();
        let times: Vec<_> = track.keyframes().iter().map(|k| k.time).collect();
        assert_eq!(times, [0, 100, 150]);

        track.scale_time(2.0);
        assert_eq!(track.duration(), 300);
    }

    #[test]
    fn update_keeps_keys_sorted() {
        let mut track = Track::new("retime").with_keyframes([
            Keyframe::new(0).with_rotation(20.0),
            Keyframe::new(100).with_rotation(10.0),
            Keyframe::new(200),
        ]);
        assert!(track.update_keyframe_at(0, |key| key.time = 500));
        let times: Vec<_> = track.keyframes().iter().map(|k| k.time).collect();
        assert_eq!(times, [100, 200, 500]);
        assert_eq!(track.sample(600).rotation, 20.0);

        assert!(track.update_keyframe_at(200, |key| key.rotation = 5.0));
        assert_eq!(track.keyframe_at(200).map(|k| k.rotation), Some(5.0));
        assert!(!track.update_keyframe_at(999, |key| key.time = 0));
    }

    #[test]
    fn interpolated_time_is_query_time_at_large_stamps() {
        let track = Track::new("long").with_keyframes([
            Keyframe::new(0),
            Keyframe::new(2_000_000_000).with_rotation(90.0),
        ]);
        assert_eq!(track.sample(1_000_000_001).time, 1_000_000_001);
    }

    #[test]
    fn propagate_local_composes_parent() {
        let mut track = Track::new("p").with_keyframes([Keyframe::new(0).with_position(3.0, 4.0)]);
        track.evaluate_local(0);
        let parent = Affine2::from_translation(Vec2::new(1.0, 1.0));
        let result = track.propagate_local(parent);
        assert_eq!(track.parent_transform(), parent);
        assert!(result
            .transform_point2(Vec2::ZERO)
            .abs_diff_eq(Vec2::new(4.0, 5.0), 1e-5));
    }
}
