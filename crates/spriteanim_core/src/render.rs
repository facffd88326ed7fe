// SPDX-License-Identifier: MIT OR Apache-2.0
//! Renderer-facing output of an evaluated clip.
//!
//! Nothing here draws. [`draw_list`] flattens the clip's cached state into
//! an ordered list of sprites that a backend can blit as-is.

use crate::atlas::Rect;
use crate::clip::Clip;
use crate::keyframe::Color;
use crate::library::AtlasLibrary;
use crate::track::{Track, TrackId};
use glam::{Affine2, Vec2};
use serde::Serialize;

/// Pick the sprite-sheet cell for a frame offset.
///
/// `width`/`height` are the size of the whole sheet image. The frame is
/// rounded to the nearest index; rows past the last one clamp to the last
/// row. Column and row counts below one are treated as one.
pub fn sheet_cell(columns: u32, rows: u32, width: i32, height: i32, frame: f32) -> Rect {
    let columns = columns.max(1);
    let rows = rows.max(1);
    let index = if frame.is_finite() && frame > 0.0 {
        frame.round().min(u32::MAX as f32) as u32
    } else {
        0
    };

    let row = (index / columns).min(rows - 1);
    let col = index % columns;
    let cell_width = width / columns as i32;
    let cell_height = height / rows as i32;

    Rect::new(
        col as i32 * cell_width,
        row as i32 * cell_height,
        cell_width,
        cell_height,
    )
}

/// Cell of `track`'s sheet selected by its cached key, relative to an
/// image of the given size
pub fn track_cell(track: &Track, width: i32, height: i32) -> Rect {
    sheet_cell(
        track.sheet_columns,
        track.sheet_rows,
        width,
        height,
        track.cached_key().frame_index_offset,
    )
}

/// Where a sprite's pixels come from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DrawSource {
    /// A rectangle of an atlas image, in atlas pixel coordinates
    Region {
        /// Atlas name
        atlas: String,
        /// Source rectangle
        rect: Rect,
    },
    /// The image key did not resolve; draw a placeholder
    Missing,
}

/// One sprite to draw
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawItem {
    /// Track that produced this sprite
    pub track: TrackId,
    /// Track name
    pub name: String,
    /// Composed world transform
    pub transform: Affine2,
    /// Tint color
    pub tint: Color,
    /// Opacity multiplier
    pub opacity: f32,
    /// Pivot in local sprite space, divided by the key's scale
    pub pivot: Vec2,
    /// Pixel source
    pub source: DrawSource,
}

impl DrawItem {
    /// Pixel size of the source rectangle, `None` for missing images
    pub fn size(&self) -> Option<Vec2> {
        match &self.source {
            DrawSource::Region { rect, .. } => Some(Vec2::new(rect.width as f32, rect.height as f32)),
            DrawSource::Missing => None,
        }
    }

    /// World-space corners of a sprite of `size` centered on the local
    /// origin: top-left, top-right, bottom-right, bottom-left
    pub fn quad(&self, size: Vec2) -> [Vec2; 4] {
        let half = size * 0.5;
        [
            Vec2::new(-half.x, -half.y),
            Vec2::new(half.x, -half.y),
            Vec2::new(half.x, half.y),
            Vec2::new(-half.x, half.y),
        ]
        .map(|corner| self.transform.transform_point2(corner))
    }

    /// World-space position of the rotation pivot, for editor handles
    pub fn pivot_point(&self) -> Vec2 {
        self.transform.transform_point2(self.pivot)
    }
}

/// Flatten the last evaluation of `clip` into draw order.
///
/// Siblings are emitted last-to-first so that list index 0 ends up on top,
/// and each parent comes before its children. Disabled tracks are skipped
/// together with their subtrees.
pub fn draw_list(clip: &Clip, atlases: &AtlasLibrary) -> Vec<DrawItem> {
    let mut items = Vec::with_capacity(clip.track_count());
    let mut stack: Vec<TrackId> = clip.roots().to_vec();

    // Popping from the end of the stack visits siblings last-to-first
    while let Some(id) = stack.pop() {
        let Some(track) = clip.track(id) else {
            continue;
        };
        if !track.enabled {
            continue;
        }
        items.push(draw_item(track, atlases));
        stack.extend_from_slice(track.children());
    }
    items
}

fn draw_item(track: &Track, atlases: &AtlasLibrary) -> DrawItem {
    let source = match atlases.resolve(&track.image) {
        Some((atlas, region)) => {
            let cell = track_cell(track, region.width, region.height);
            DrawSource::Region {
                atlas: atlas.name.clone(),
                rect: cell.offset(region.x, region.y),
            }
        }
        None => DrawSource::Missing,
    };

    let key = track.cached_key();
    // Zero scale axes would divide by zero; leave the pivot unscaled there
    let scale = Vec2::select(key.scale.cmpeq(Vec2::ZERO), Vec2::ONE, key.scale);
    DrawItem {
        track: track.id,
        name: track.name.clone(),
        transform: track.cached_transform(),
        tint: key.tint,
        opacity: key.opacity,
        pivot: key.pivot / scale,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::{Atlas, ImageRegion};
    use crate::keyframe::Keyframe;

    #[test]
    fn four_by_two_sheet() {
        assert_eq!(sheet_cell(4, 2, 400, 200, 5.0), Rect::new(100, 100, 100, 100));
        assert_eq!(sheet_cell(4, 2, 400, 200, 0.0), Rect::new(0, 0, 100, 100));
        assert_eq!(sheet_cell(4, 2, 400, 200, 3.0), Rect::new(300, 0, 100, 100));
    }

    #[test]
    fn frame_rounds_to_nearest() {
        assert_eq!(sheet_cell(4, 2, 400, 200, 4.6), Rect::new(100, 100, 100, 100));
        assert_eq!(sheet_cell(4, 2, 400, 200, 4.4), Rect::new(0, 100, 100, 100));
    }

    #[test]
    fn overflowing_rows_clamp_to_last() {
        // index 13 -> row 3 clamped to 1, column 1
        assert_eq!(sheet_cell(4, 2, 400, 200, 13.0), Rect::new(100, 100, 100, 100));
    }

    #[test]
    fn degenerate_inputs() {
        assert_eq!(sheet_cell(0, 0, 64, 32, 3.0), Rect::new(0, 0, 64, 32));
        assert_eq!(sheet_cell(4, 2, 400, 200, -3.0), Rect::new(0, 0, 100, 100));
        assert_eq!(sheet_cell(4, 2, 400, 200, f32::NAN), Rect::new(0, 0, 100, 100));
    }

    #[test]
    fn start_index_is_not_consulted() {
        let mut track = Track::new("sheet")
            .with_sheet(4, 2)
            .with_keyframes([Keyframe::new(0).with_frame(5.0)]);
        track.evaluate_local(0);
        let before = track_cell(&track, 400, 200);
        track.sheet_start_index = 3;
        assert_eq!(track_cell(&track, 400, 200), before);
    }

    fn library() -> AtlasLibrary {
        let mut atlases = AtlasLibrary::new();
        atlases.add(
            Atlas::new("hero", "hero.png")
                .with_region(ImageRegion::new("run", 0, 200, 400, 200)),
        );
        atlases
    }

    #[test]
    fn draw_order_reverses_siblings_and_nests_children() {
        let mut clip = Clip::new("order");
        let a = clip.add_root(Track::new("a"));
        let a1 = clip.add_child(a, Track::new("a1")).unwrap();
        let a2 = clip.add_child(a, Track::new("a2")).unwrap();
        let b = clip.add_root(Track::new("b"));
        clip.set_time(0);

        let order: Vec<_> = draw_list(&clip, &library()).iter().map(|i| i.track).collect();
        assert_eq!(order, vec![b, a, a2, a1]);
    }

    #[test]
    fn disabled_tracks_hide_subtree() {
        let mut clip = Clip::new("hidden");
        let a = clip.add_root(Track::new("a"));
        clip.add_child(a, Track::new("a1")).unwrap();
        let b = clip.add_root(Track::new("b"));
        clip.track_mut(a).unwrap().enabled = false;
        clip.set_time(0);

        let order: Vec<_> = draw_list(&clip, &library()).iter().map(|i| i.track).collect();
        assert_eq!(order, vec![b]);
    }

    #[test]
    fn sources_resolve_through_atlas() {
        let mut clip = Clip::new("run");
        let runner = clip.add_root(
            Track::new("runner")
                .with_image("hero:run")
                .with_sheet(4, 2)
                .with_keyframes([
                    Keyframe::new(0).with_frame(0.0),
                    Keyframe::new(700).with_frame(7.0),
                ]),
        );
        let ghost = clip.add_root(Track::new("ghost").with_image("hero:missing"));
        clip.set_time(500);

        let items = draw_list(&clip, &library());
        let runner_item = items.iter().find(|i| i.track == runner).unwrap();
        assert_eq!(
            runner_item.source,
            DrawSource::Region {
                atlas: "hero".into(),
                rect: Rect::new(100, 300, 100, 100),
            }
        );
        assert_eq!(runner_item.size(), Some(Vec2::new(100.0, 100.0)));

        let ghost_item = items.iter().find(|i| i.track == ghost).unwrap();
        assert_eq!(ghost_item.source, DrawSource::Missing);
        assert_eq!(ghost_item.size(), None);
    }

    #[test]
    fn quad_follows_transform() {
        let item = DrawItem {
            track: TrackId::new(),
            name: "q".into(),
            transform: Affine2::from_translation(Vec2::new(10.0, 20.0)),
            tint: Color::WHITE,
            opacity: 1.0,
            pivot: Vec2::new(1.0, -1.0),
            source: DrawSource::Missing,
        };
        let quad = item.quad(Vec2::new(4.0, 2.0));
        assert_eq!(quad[0], Vec2::new(8.0, 19.0));
        assert_eq!(quad[2], Vec2::new(12.0, 21.0));
        assert_eq!(item.pivot_point(), Vec2::new(11.0, 19.0));
    }

    #[test]
    fn pivot_is_divided_by_scale() {
        let mut clip = Clip::new("pivot");
        let id = clip.add_root(Track::new("p").with_keyframes([Keyframe::new(0)
            .with_position(10.0, 20.0)
            .with_pivot(4.0, 2.0)
            .with_scale(2.0, 0.0)]));
        clip.set_time(0);

        let items = draw_list(&clip, &library());
        let item = items.iter().find(|i| i.track == id).unwrap();
        assert_eq!(item.pivot, Vec2::new(2.0, 2.0));
        assert!(item.pivot_point().abs_diff_eq(Vec2::new(14.0, 20.0), 1e-4));
    }
}
