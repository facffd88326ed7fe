// SPDX-License-Identifier: MIT OR Apache-2.0
//! Math primitives for the transform hierarchy.
//!
//! The 2D path only needs [`build_transform`] and affine composition
//! (`parent * child`). The Euler/quaternion helpers exist for 3D-capable
//! consumers and are not used by track evaluation.

use crate::keyframe::Keyframe;
use glam::{Affine2, Quat, Vec2};
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Build the local transform of a keyframe.
///
/// Translate by `position`, then rotate by `rotation` degrees about `pivot`,
/// then scale. Points are scaled first and translated last.
pub fn build_transform(key: &Keyframe) -> Affine2 {
    Affine2::from_translation(key.position)
        * rotate_about(key.rotation.to_radians(), key.pivot)
        * Affine2::from_scale(key.scale)
}

/// Rotation by `angle` radians about `pivot`.
pub fn rotate_about(angle: f32, pivot: Vec2) -> Affine2 {
    Affine2::from_translation(pivot) * Affine2::from_angle(angle) * Affine2::from_translation(-pivot)
}

/// Compose a parent transform with a child's local transform.
///
/// The result applies `local` first, then `parent`.
#[inline]
pub fn compose(parent: Affine2, local: Affine2) -> Affine2 {
    parent * local
}

/// Clamp an integer channel value into `[0, 255]`.
#[inline]
pub fn clamp_channel(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

/// Round a float channel value (half up) and clamp it into `[0, 255]`.
#[inline]
pub fn round_channel(value: f32) -> u8 {
    if !value.is_finite() {
        return if value > 0.0 { 255 } else { 0 };
    }
    clamp_channel((value + 0.5).floor() as i32)
}

/// Degrees to radians.
#[inline]
pub fn deg_to_rad(deg: f32) -> f32 {
    deg.to_radians()
}

/// Radians to degrees.
#[inline]
pub fn rad_to_deg(rad: f32) -> f32 {
    rad.to_degrees()
}

/// Wrap an angle into `[-pi, pi)` by adding the right multiple of `2 pi`.
pub fn wrap_pi(theta: f32) -> f32 {
    let shifted = theta + PI;
    shifted - (shifted / TAU).floor() * TAU - PI
}

/// `acos` that clamps out-of-domain input instead of returning NaN.
pub fn safe_acos(x: f32) -> f32 {
    if x <= -1.0 {
        PI
    } else if x >= 1.0 {
        0.0
    } else {
        x.acos()
    }
}

/// Heading-pitch-bank Euler angle triple, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EulerAngles {
    /// Rotation about the vertical axis
    pub heading: f32,
    /// Rotation about the lateral axis
    pub pitch: f32,
    /// Rotation about the longitudinal axis
    pub bank: f32,
}

/// Slightly under `pi / 2`; pitch beyond this is treated as gimbal lock.
const GIMBAL_LOCK_PITCH: f32 = FRAC_PI_2 - 1e-4;

impl EulerAngles {
    /// Create an Euler triple
    pub fn new(heading: f32, pitch: f32, bank: f32) -> Self {
        Self { heading, pitch, bank }
    }

    /// The identity triple (all zeros)
    pub fn identity() -> Self {
        Self::default()
    }

    /// Bring the triple into canonical ranges.
    ///
    /// Heading and bank end up in `[-pi, pi)`, pitch in `[-pi/2, pi/2]`. In
    /// gimbal lock all vertical rotation is assigned to heading.
    pub fn canonize(&mut self) {
        self.pitch = wrap_pi(self.pitch);

        if self.pitch < -FRAC_PI_2 {
            self.pitch = -PI - self.pitch;
            self.heading += PI;
            self.bank += PI;
        } else if self.pitch > FRAC_PI_2 {
            self.pitch = PI - self.pitch;
            self.heading += PI;
            self.bank += PI;
        }

        if self.pitch.abs() > GIMBAL_LOCK_PITCH {
            self.heading += self.bank;
            self.bank = 0.0;
        } else {
            self.bank = wrap_pi(self.bank);
        }

        self.heading = wrap_pi(self.heading);
    }

    /// Extract angles from an object-to-inertial rotation quaternion
    pub fn from_object_to_inertial_quat(q: Quat) -> Self {
        let sp = -2.0 * (q.y * q.z - q.w * q.x);
        if sp.abs() > 0.9999 {
            Self {
                pitch: FRAC_PI_2 * sp,
                heading: (-q.x * q.z + q.w * q.y).atan2(0.5 - q.y * q.y - q.z * q.z),
                bank: 0.0,
            }
        } else {
            Self {
                pitch: sp.asin(),
                heading: (q.x * q.z + q.w * q.y).atan2(0.5 - q.x * q.x - q.y * q.y),
                bank: (q.x * q.y + q.w * q.z).atan2(0.5 - q.x * q.x - q.z * q.z),
            }
        }
    }

    /// Extract angles from an inertial-to-object rotation quaternion
    pub fn from_inertial_to_object_quat(q: Quat) -> Self {
        let sp = -2.0 * (q.y * q.z + q.w * q.x);
        if sp.abs() > 0.9999 {
            Self {
                pitch: FRAC_PI_2 * sp,
                heading: (-q.x * q.z - q.w * q.y).atan2(0.5 - q.y * q.y - q.z * q.z),
                bank: 0.0,
            }
        } else {
            Self {
                pitch: sp.asin(),
                heading: (q.x * q.z - q.w * q.y).atan2(0.5 - q.x * q.x - q.y * q.y),
                bank: (q.x * q.y - q.w * q.z).atan2(0.5 - q.x * q.x - q.z * q.z),
            }
        }
    }

    /// Object-to-inertial rotation quaternion for this orientation
    pub fn to_object_to_inertial_quat(&self) -> Quat {
        let (sp, cp) = (self.pitch * 0.5).sin_cos();
        let (sb, cb) = (self.bank * 0.5).sin_cos();
        let (sh, ch) = (self.heading * 0.5).sin_cos();

        Quat::from_xyzw(
            ch * sp * cb + sh * cp * sb,
            -ch * sp * sb + sh * cp * cb,
            -sh * sp * cb + ch * cp * sb,
            ch * cp * cb + sh * sp * sb,
        )
    }

    /// Inertial-to-object rotation quaternion for this orientation
    pub fn to_inertial_to_object_quat(&self) -> Quat {
        self.to_object_to_inertial_quat().conjugate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn transform_order_is_translate_rotate_scale() {
        let key = Keyframe {
            position: Vec2::new(10.0, 0.0),
            rotation: 90.0,
            scale: Vec2::new(2.0, 1.0),
            ..Keyframe::default()
        };
        let m = build_transform(&key);
        // (1, 0) -> scaled (2, 0) -> rotated (0, 2) -> translated (10, 2)
        let p = m.transform_point2(Vec2::new(1.0, 0.0));
        assert!(p.abs_diff_eq(Vec2::new(10.0, 2.0), EPS), "{p:?}");
    }

    #[test]
    fn rotation_uses_pivot() {
        let key = Keyframe {
            pivot: Vec2::new(5.0, 5.0),
            rotation: 180.0,
            ..Keyframe::default()
        };
        let m = build_transform(&key);
        assert!(m.transform_point2(Vec2::new(5.0, 5.0)).abs_diff_eq(Vec2::new(5.0, 5.0), EPS));
        assert!(m.transform_point2(Vec2::ZERO).abs_diff_eq(Vec2::new(10.0, 10.0), EPS));
    }

    #[test]
    fn neutral_key_is_identity() {
        assert!(build_transform(&Keyframe::default()).abs_diff_eq(Affine2::IDENTITY, EPS));
    }

    #[test]
    fn compose_applies_child_first() {
        let parent = Affine2::from_scale(Vec2::splat(2.0));
        let child = Affine2::from_translation(Vec2::new(1.0, 0.0));
        let p = compose(parent, child).transform_point2(Vec2::ZERO);
        assert!(p.abs_diff_eq(Vec2::new(2.0, 0.0), EPS));
    }

    #[test]
    fn channel_clamping() {
        assert_eq!(clamp_channel(-5), 0);
        assert_eq!(clamp_channel(300), 255);
        assert_eq!(clamp_channel(128), 128);
        assert_eq!(round_channel(127.5), 128);
        assert_eq!(round_channel(127.4), 127);
        assert_eq!(round_channel(-0.7), 0);
        assert_eq!(round_channel(f32::INFINITY), 255);
    }

    #[test]
    fn wrap_and_acos() {
        assert!((wrap_pi(3.0 * PI) - -PI).abs() < EPS || (wrap_pi(3.0 * PI) - PI).abs() < EPS);
        assert!((wrap_pi(0.5) - 0.5).abs() < EPS);
        assert_eq!(safe_acos(2.0), 0.0);
        assert_eq!(safe_acos(-2.0), PI);
    }

    #[test]
    fn euler_quat_round_trip() {
        let euler = EulerAngles::new(0.3, -0.4, 1.1);
        let back = EulerAngles::from_object_to_inertial_quat(euler.to_object_to_inertial_quat());
        assert!((back.heading - euler.heading).abs() < EPS);
        assert!((back.pitch - euler.pitch).abs() < EPS);
        assert!((back.bank - euler.bank).abs() < EPS);

        let back = EulerAngles::from_inertial_to_object_quat(euler.to_inertial_to_object_quat());
        assert!((back.heading - euler.heading).abs() < EPS);
        assert!((back.pitch - euler.pitch).abs() < EPS);
        assert!((back.bank - euler.bank).abs() < EPS);
    }

    #[test]
    fn canonize_folds_pitch() {
        let mut euler = EulerAngles::new(0.0, PI * 0.75, 0.0);
        euler.canonize();
        assert!((euler.pitch - PI * 0.25).abs() < EPS);
        assert!((euler.heading.abs() - PI).abs() < EPS);
    }
}
