//! Render states addressed by an index: lights, clip planes and texture units.

use std::rc::Rc;

use cgmath::{Matrix4, SquareMatrix, Vector3, Vector4};

use crate::device::Device;
use crate::errors::*;
use crate::math::Color;
use crate::texture::Texture;

use super::types::*;

/// A fixed-function light source, enabled by its presence in a `Shader`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub ambient: Color,
    pub diffuse: Color,
    pub specular: Color,
    /// Homogeneous position, `w == 0` makes a directional light.
    pub position: Vector4<f32>,
    pub spot_direction: Vector3<f32>,
    pub spot_exponent: f32,
    /// Spot cutoff angle in degrees, 180 disables the spot cone.
    pub spot_cutoff: f32,
    pub constant_attenuation: f32,
    pub linear_attenuation: f32,
    pub quadratic_attenuation: f32,
}

impl Default for Light {
    fn default() -> Self {
        Light {
            ambient: Color::black(),
            diffuse: Color::white(),
            specular: Color::white(),
            position: Vector4::new(0.0, 0.0, 1.0, 0.0),
            spot_direction: Vector3::new(0.0, 0.0, -1.0),
            spot_exponent: 0.0,
            spot_cutoff: 180.0,
            constant_attenuation: 1.0,
            linear_attenuation: 0.0,
            quadratic_attenuation: 0.0,
        }
    }
}

impl Light {
    #[inline]
    pub fn is_directional(&self) -> bool {
        self.position.w == 0.0
    }

    pub fn apply(&self, index: usize, device: &mut Device) -> Result<()> {
        device.visitor_mut().light(index, Some(self))
    }
}

/// A user clip plane `(a, b, c, d)` in eye space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipPlane {
    pub plane: Vector4<f32>,
}

impl ClipPlane {
    pub fn new(normal: Vector3<f32>, distance: f32) -> Self {
        ClipPlane {
            plane: normal.extend(distance),
        }
    }

    pub fn apply(&self, index: usize, device: &mut Device) -> Result<()> {
        device.visitor_mut().clip_plane(index, Some(self))
    }
}

impl Default for ClipPlane {
    fn default() -> Self {
        ClipPlane {
            plane: Vector4::new(0.0, 0.0, 1.0, 0.0),
        }
    }
}

/// Binds a texture to a texture unit. A `Texture` rendered by an earlier
/// `Rendering` is handed over to later ones through this state.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TextureSampler {
    pub texture: Option<Rc<Texture>>,
}

impl TextureSampler {
    pub fn new(texture: Rc<Texture>) -> Self {
        TextureSampler {
            texture: Some(texture),
        }
    }

    pub fn apply(&self, index: usize, device: &mut Device) -> Result<()> {
        device.bind_texture(index, self.texture.as_ref().map(|v| &**v))
    }
}

impl PartialEq for TextureSampler {
    fn eq(&self, other: &Self) -> bool {
        match (&self.texture, &other.texture) {
            (Some(lhs), Some(rhs)) => Rc::ptr_eq(lhs, rhs),
            (None, None) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TexEnv {
    pub mode: TexEnvMode,
    pub color: Color,
    pub point_sprite_coord_replace: bool,
}

impl Default for TexEnv {
    fn default() -> Self {
        TexEnv {
            mode: TexEnvMode::Modulate,
            color: Color::transparent(),
            point_sprite_coord_replace: false,
        }
    }
}

impl TexEnv {
    pub fn apply(&self, index: usize, device: &mut Device) -> Result<()> {
        device.visitor_mut().tex_env(index, self)
    }
}

/// Texture coordinate generation of the `s`, `t`, `r` and `q` components.
/// `None` disables generation of that component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TexGen {
    pub modes: [Option<TexGenMode>; 4],
    pub object_planes: [[f32; 4]; 4],
    pub eye_planes: [[f32; 4]; 4],
}

impl Default for TexGen {
    fn default() -> Self {
        let planes = [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0],
        ];

        TexGen {
            modes: [None; 4],
            object_planes: planes,
            eye_planes: planes,
        }
    }
}

impl TexGen {
    pub fn apply(&self, index: usize, device: &mut Device) -> Result<()> {
        device.visitor_mut().tex_gen(index, self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextureMatrix {
    pub matrix: Matrix4<f32>,
}

impl Default for TextureMatrix {
    fn default() -> Self {
        TextureMatrix {
            matrix: Matrix4::identity(),
        }
    }
}

impl TextureMatrix {
    pub fn apply(&self, index: usize, device: &mut Device) -> Result<()> {
        device.visitor_mut().texture_matrix(index, self)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::texture::TextureParams;

    #[test]
    fn sampler_identity() {
        let t1 = Rc::new(Texture::new(TextureParams::default()));
        let t2 = Rc::new(Texture::new(TextureParams::default()));

        assert_eq!(TextureSampler::new(t1.clone()), TextureSampler::new(t1.clone()));
        assert_ne!(TextureSampler::new(t1), TextureSampler::new(t2));
        assert_eq!(TextureSampler::default(), TextureSampler::default());
    }

    #[test]
    fn light() {
        let mut light = Light::default();
        assert!(light.is_directional());
        light.position.w = 1.0;
        assert!(!light.is_directional());
    }
}
