//! View frustum for visibility determination

use cgmath::prelude::*;
use cgmath::{Matrix4, Point3, Vector4};

/// View frustum, described by six planes `(a, b, c, d)` in world space whose
/// normals point inwards.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Frustum {
    pub planes: [Vector4<f32>; 6],
}

impl Frustum {
    /// Extracts the planes from a combined `projection * view` matrix.
    pub fn from_matrix(mat: Matrix4<f32>) -> Self {
        let (r0, r1, r2, r3) = (mat.row(0), mat.row(1), mat.row(2), mat.row(3));

        Frustum {
            planes: [
                Self::normalize(r3 + r0),
                Self::normalize(r3 - r0),
                Self::normalize(r3 + r1),
                Self::normalize(r3 - r1),
                Self::normalize(r3 + r2),
                Self::normalize(r3 - r2),
            ],
        }
    }

    fn normalize(plane: Vector4<f32>) -> Vector4<f32> {
        let len = plane.truncate().magnitude();
        if len > ::std::f32::EPSILON {
            plane / len
        } else {
            plane
        }
    }

    /// Returns true if the sphere intersects or lies inside this frustum.
    pub fn contains_sphere(&self, center: Point3<f32>, radius: f32) -> bool {
        let p = center.to_homogeneous();
        self.planes.iter().all(|plane| plane.dot(p) >= -radius)
    }
}
