//! This module contains the math utils that mainly comes from `cgmath`.

pub mod color;
pub mod frustum;
pub mod rect;

pub use cgmath::*;

pub use self::color::Color;
pub use self::frustum::Frustum;
pub use self::rect::Rect;

pub mod prelude {
    pub use cgmath::prelude::*;
    pub use cgmath::{Deg, Matrix3, Matrix4, Point3, Rad, Vector2, Vector3, Vector4};

    pub use super::color::Color;
    pub use super::frustum::Frustum;
    pub use super::rect::Rect;
}
