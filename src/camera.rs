//! The point of view of a `Rendering`: a viewport, a projection and a view
//! matrix, optionally driven by a transform of the scene.

use crate::device::Device;
use crate::errors::*;
use crate::math::prelude::*;
use crate::math::{self, Frustum};
use crate::transform::{TransformHandle, TransformTree};

/// The rectangle of the render target a camera draws into, and how it is
/// cleared before drawing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub rect: Rect,
    pub clear_color: Option<Color>,
    pub clear_depth: Option<f32>,
    pub clear_stencil: Option<i32>,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            rect: Rect::with_size(640, 480),
            clear_color: Some(Color::black()),
            clear_depth: Some(1.0),
            clear_stencil: None,
        }
    }
}

impl Viewport {
    pub fn new(rect: Rect) -> Self {
        Viewport {
            rect,
            ..Default::default()
        }
    }

    /// Activates the viewport and clears it. Clearing is restricted to the
    /// viewport rectangle.
    pub fn apply(&self, device: &mut Device) -> Result<()> {
        device.set_viewport(self.rect)?;

        if self.clear_color.is_some() || self.clear_depth.is_some() || self.clear_stencil.is_some()
        {
            device.set_scissor(Some(self.rect))?;
            device.clear(self.clear_color, self.clear_depth, self.clear_stencil)?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Perspective projection with a vertical field of view, the aspect ratio
    /// follows the viewport.
    Perspective {
        fovy: Deg<f32>,
        near: f32,
        far: f32,
    },
    Ortho {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    },
    Custom(Matrix4<f32>),
}

impl Default for Projection {
    fn default() -> Self {
        Projection::Perspective {
            fovy: Deg(60.0),
            near: 0.05,
            far: 10000.0,
        }
    }
}

impl Projection {
    pub fn matrix(&self, aspect: f32) -> Matrix4<f32> {
        match *self {
            Projection::Perspective { fovy, near, far } => {
                math::perspective(fovy, aspect, near, far)
            }
            Projection::Ortho {
                left,
                right,
                bottom,
                top,
                near,
                far,
            } => math::ortho(left, right, bottom, top, near, far),
            Projection::Custom(m) => m,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Camera {
    viewport: Viewport,
    projection: Projection,
    view: Matrix4<f32>,
    transform: Option<TransformHandle>,
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            viewport: Viewport::default(),
            projection: Projection::default(),
            view: Matrix4::identity(),
            transform: None,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Camera::default()
    }

    #[inline]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[inline]
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    #[inline]
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    #[inline]
    pub fn projection(&self) -> Projection {
        self.projection
    }

    #[inline]
    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
    }

    #[inline]
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection.matrix(self.viewport.rect.aspect())
    }

    /// The matrix from world space to view space.
    #[inline]
    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.view
    }

    #[inline]
    pub fn set_view_matrix(&mut self, view: Matrix4<f32>) {
        self.view = view;
    }

    pub fn look_at(&mut self, eye: Point3<f32>, center: Point3<f32>, up: Vector3<f32>) {
        self.view = Matrix4::look_at(eye, center, up);
    }

    /// Makes the view follow a transform, the view matrix becomes the inverse
    /// of its world matrix on `update`.
    #[inline]
    pub fn bind_transform(&mut self, transform: Option<TransformHandle>) {
        self.transform = transform;
    }

    #[inline]
    pub fn bound_transform(&self) -> Option<TransformHandle> {
        self.transform
    }

    /// Synchronizes the view matrix with the bound transform.
    pub fn update(&mut self, transforms: &TransformTree) {
        if let Some(handle) = self.transform {
            match transforms.world_matrix(handle).and_then(|v| v.invert()) {
                Some(view) => self.view = view,
                None => warn!("Camera is bound to {} which could not be inverted.", handle),
            }
        }
    }

    /// The position of the eye in world space.
    pub fn eye_position(&self) -> Point3<f32> {
        let inverse = self.view.invert().unwrap_or_else(Matrix4::identity);
        Point3::new(inverse.w.x, inverse.w.y, inverse.w.z)
    }

    pub fn frustum(&self) -> Frustum {
        Frustum::from_matrix(self.projection_matrix() * self.view)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn eye() {
        let mut camera = Camera::new();
        camera.look_at(
            Point3::new(1.0, 2.0, 3.0),
            Point3::new(0.0, 0.0, 0.0),
            Vector3::unit_y(),
        );

        let eye = camera.eye_position();
        assert_relative_eq!(eye, Point3::new(1.0, 2.0, 3.0), epsilon = 1e-4);
    }

    #[test]
    fn transform() {
        let mut tree = TransformTree::new();
        let handle = tree.create(Matrix4::from_translation(Vector3::new(0.0, 0.0, 5.0)));
        tree.update_world_matrices();

        let mut camera = Camera::new();
        camera.bind_transform(Some(handle));
        camera.update(&tree);

        assert_relative_eq!(camera.eye_position(), Point3::new(0.0, 0.0, 5.0), epsilon = 1e-4);
        assert!(camera.frustum().contains_sphere(Point3::new(0.0, 0.0, 0.0), 1.0));
    }
}
