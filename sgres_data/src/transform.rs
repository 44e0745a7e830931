//! Rigid transforms made of a translation and a rotation quaternion.
use std::fmt;
use std::ops::Mul;

use glam::{Mat3, Quat, Vec3};
use sgres_lib::nodes::TransformNode;
use sgres_lib::InverseTransform;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A rotation followed by a translation.
///
/// The rotation is not required to be normalized.
/// Stored quaternions are usually close to unit length but are never renormalized,
/// so [Transform::inverse] divides by the squared norm instead of using the conjugate.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// The local transform of a node relative to its parent.
    pub fn from_node(node: &TransformNode) -> Self {
        let t = &node.translation;
        let r = &node.rotation;
        Self::new(Vec3::new(t.x, t.y, t.z), Quat::from_xyzw(r.x, r.y, r.z, r.w))
    }

    pub fn from_inverse_transform(value: &InverseTransform) -> Self {
        let [x, y, z, w] = value.rotation;
        Self::new(Vec3::from(value.translation), Quat::from_xyzw(x, y, z, w))
    }

    pub fn to_inverse_transform(&self) -> InverseTransform {
        InverseTransform {
            rotation: self.rotation.to_array(),
            translation: self.translation.to_array(),
        }
    }

    /// The rotation matrix for [rotation](Transform::rotation).
    /// Non unit quaternions also scale points.
    pub fn rotation_matrix(&self) -> Mat3 {
        quat_matrix(self.rotation)
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation_matrix() * point + self.translation
    }

    /// The transform that undoes `self` so that `t.inverse() * t` is the identity.
    pub fn inverse(&self) -> Self {
        let rotation = quat_inverse(self.rotation);
        let translation = quat_matrix(rotation) * -self.translation;
        Self::new(translation, rotation)
    }

    /// Applies `self` after `child`.
    /// This is the absolute transform of a node with local transform `child` and parent transform `self`.
    pub fn compose(&self, child: &Transform) -> Self {
        Self::new(
            self.transform_point(child.translation),
            self.rotation * child.rotation,
        )
    }

    /// Checks if each component of `self` and `other` differs by at most `max_abs_diff`.
    pub fn abs_diff_eq(&self, other: &Transform, max_abs_diff: f32) -> bool {
        self.translation.abs_diff_eq(other.translation, max_abs_diff)
            && self.rotation.abs_diff_eq(other.rotation, max_abs_diff)
    }
}

impl Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Self::Output {
        self.compose(&rhs)
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.translation;
        let r = self.rotation;
        write!(
            f,
            "v({}, {}, {}) q({}, {}, {}, {})",
            Rounded(t.x),
            Rounded(t.y),
            Rounded(t.z),
            Rounded(r.x),
            Rounded(r.y),
            Rounded(r.z),
            Rounded(r.w)
        )
    }
}

/// Formats a float rounded to 6 decimal places without a negative zero.
struct Rounded(f32);

impl fmt::Display for Rounded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = (self.0 * 1e6).round() / 1e6 + 0.0;
        write!(f, "{value:?}")
    }
}

fn quat_inverse(q: Quat) -> Quat {
    let s = q.length_squared();
    Quat::from_xyzw(-q.x / s, -q.y / s, -q.z / s, q.w / s)
}

fn quat_matrix(q: Quat) -> Mat3 {
    let (x, y, z, w) = (q.x, q.y, q.z, q.w);
    Mat3::from_cols(
        Vec3::new(
            1.0 - 2.0 * (y * y + z * z),
            2.0 * (x * y + w * z),
            2.0 * (x * z - w * y),
        ),
        Vec3::new(
            2.0 * (x * y - w * z),
            1.0 - 2.0 * (x * x + z * z),
            2.0 * (y * z + w * x),
        ),
        Vec3::new(
            2.0 * (x * z + w * y),
            2.0 * (y * z - w * x),
            1.0 - 2.0 * (x * x + y * y),
        ),
    )
}
