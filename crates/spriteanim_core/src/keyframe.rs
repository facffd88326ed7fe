// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe definitions and interpolation arithmetic.

use crate::math::{clamp_channel, round_channel};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Time in milliseconds
pub type Millis = i32;

/// RGBA color with 8-bit channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha
    pub a: u8,
}

impl Color {
    /// Neutral tint
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    /// Fully transparent black
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    /// Create a color from channels
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Channels as an array, in `[r, g, b, a]` order
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    fn from_fn(mut f: impl FnMut(usize) -> u8) -> Self {
        Self::rgba(f(0), f(1), f(2), f(3))
    }

    /// Channel-wise sum, clamped
    pub fn saturating_add(self, other: Color) -> Color {
        let (a, b) = (self.to_array(), other.to_array());
        Self::from_fn(|i| clamp_channel(i32::from(a[i]) + i32::from(b[i])))
    }

    /// Channel-wise product with a factor, rounded and clamped
    pub fn scale(self, factor: f32) -> Color {
        let a = self.to_array();
        Self::from_fn(|i| round_channel(f32::from(a[i]) * factor))
    }

    /// Channel-wise linear interpolation with a single rounding step
    pub fn lerp(self, other: Color, alpha: f32) -> Color {
        let (a, b) = (self.to_array(), other.to_array());
        Self::from_fn(|i| {
            let from = f32::from(a[i]);
            round_channel(from + (f32::from(b[i]) - from) * alpha)
        })
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// A timestamped snapshot of a track's visual and transform state.
///
/// Keyframes are plain values. [`Keyframe::add`] and [`Keyframe::scale`]
/// form the arithmetic that [`Keyframe::lerp`] is built on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Keyframe {
    /// Time in milliseconds
    pub time: Millis,
    /// Tint color
    pub tint: Color,
    /// Opacity multiplier
    pub opacity: f32,
    /// Local rotation origin
    pub pivot: Vec2,
    /// Translation offset
    pub position: Vec2,
    /// Scale factors
    pub scale: Vec2,
    /// Rotation in degrees
    pub rotation: f32,
    /// Sub-image selector within a sprite sheet
    pub frame_index_offset: f32,
}

impl Default for Keyframe {
    fn default() -> Self {
        Self {
            time: 0,
            tint: Color::WHITE,
            opacity: 1.0,
            pivot: Vec2::ZERO,
            position: Vec2::ZERO,
            scale: Vec2::ONE,
            rotation: 0.0,
            frame_index_offset: 0.0,
        }
    }
}

impl Keyframe {
    /// Create a neutral keyframe at `time`
    pub fn new(time: Millis) -> Self {
        Self {
            time,
            ..Self::default()
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Vec2::new(x, y);
        self
    }

    /// Set the pivot
    pub fn with_pivot(mut self, x: f32, y: f32) -> Self {
        self.pivot = Vec2::new(x, y);
        self
    }

    /// Set the scale
    pub fn with_scale(mut self, x: f32, y: f32) -> Self {
        self.scale = Vec2::new(x, y);
        self
    }

    /// Set the rotation in degrees
    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    /// Set the tint
    pub fn with_tint(mut self, tint: Color) -> Self {
        self.tint = tint;
        self
    }

    /// Set the opacity
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// Set the sprite-sheet frame offset
    pub fn with_frame(mut self, frame_index_offset: f32) -> Self {
        self.frame_index_offset = frame_index_offset;
        self
    }

    /// Component-wise sum of two keyframes; color channels are clamped.
    pub fn add(a: &Keyframe, b: &Keyframe) -> Keyframe {
        Keyframe {
            time: a.time.saturating_add(b.time),
            tint: a.tint.saturating_add(b.tint),
            opacity: a.opacity + b.opacity,
            pivot: a.pivot + b.pivot,
            position: a.position + b.position,
            scale: a.scale + b.scale,
            rotation: a.rotation + b.rotation,
            frame_index_offset: a.frame_index_offset + b.frame_index_offset,
        }
    }

    /// Component-wise product with `factor`; color channels are rounded and clamped.
    pub fn scale(a: &Keyframe, factor: f32) -> Keyframe {
        Keyframe {
            time: scale_time(a.time, factor),
            tint: a.tint.scale(factor),
            opacity: a.opacity * factor,
            pivot: a.pivot * factor,
            position: a.position * factor,
            scale: a.scale * factor,
            rotation: a.rotation * factor,
            frame_index_offset: a.frame_index_offset * factor,
        }
    }

    /// Linear interpolation, equivalent to
    /// `add(scale(a, 1 - alpha), scale(b, alpha))`.
    ///
    /// Color channels are rounded once rather than per term, so
    /// `lerp(k, k, alpha) == k`. The result's time is the interpolated stamp.
    pub fn lerp(a: &Keyframe, b: &Keyframe, alpha: f32) -> Keyframe {
        let time_span = f64::from(b.time) - f64::from(a.time);
        let time = f64::from(a.time) + time_span * f64::from(alpha);

        Keyframe {
            time: round_millis(time),
            tint: a.tint.lerp(b.tint, alpha),
            opacity: lerp_f32(a.opacity, b.opacity, alpha),
            pivot: a.pivot + (b.pivot - a.pivot) * alpha,
            position: a.position + (b.position - a.position) * alpha,
            scale: a.scale + (b.scale - a.scale) * alpha,
            rotation: lerp_f32(a.rotation, b.rotation, alpha),
            frame_index_offset: lerp_f32(a.frame_index_offset, b.frame_index_offset, alpha),
        }
    }

    /// Ordering by time, ascending
    pub fn cmp_time(a: &Keyframe, b: &Keyframe) -> Ordering {
        a.time.cmp(&b.time)
    }

    /// Whether every float field is finite
    pub fn is_finite(&self) -> bool {
        self.opacity.is_finite()
            && self.pivot.is_finite()
            && self.position.is_finite()
            && self.scale.is_finite()
            && self.rotation.is_finite()
            && self.frame_index_offset.is_finite()
    }
}

#[inline]
fn lerp_f32(a: f32, b: f32, alpha: f32) -> f32 {
    a + (b - a) * alpha
}

fn scale_time(time: Millis, factor: f32) -> Millis {
    round_millis(f64::from(time) * f64::from(factor))
}

fn round_millis(value: f64) -> Millis {
    if value.is_nan() {
        return 0;
    }
    value
        .round()
        .clamp(f64::from(Millis::MIN), f64::from(Millis::MAX)) as Millis
}
