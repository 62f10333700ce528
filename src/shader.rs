//! A `Shader` is one pass worth of GPU configuration: a set of render states,
//! the enabled capabilities, named uniforms and an optional scissor. It is not
//! a GLSL program, which is just one more render state here.
//!
//! Render states are accessed in two flavours. The read-only getters return
//! `None` if the state is unspecified, while the `goc_*` (get-or-create)
//! accessors insert a default state first, so call sites could write
//!
//! ```rust
//! # use pigment::prelude::*;
//! let mut shader = Shader::new();
//! shader.goc_material().borrow_mut().set_diffuse(Color::red());
//! ```

use std::fmt;

use crate::camera::Camera;
use crate::device::Device;
use crate::errors::*;
use crate::math::Rect;
use crate::states::*;
use crate::utils::{shared, Shared};

/// Restricts drawing to a rectangle of the render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scissor {
    pub rect: Rect,
}

impl Scissor {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Scissor {
            rect: Rect::new(x, y, width, height),
        }
    }

    pub fn apply(&self, device: &mut Device) -> Result<()> {
        device.set_scissor(Some(self.rect))
    }
}

/// Animates the states of a `Shader` over time. It runs at most once per
/// frame, before the shader is drawn for the first time in that frame.
pub trait ShaderAnimator {
    fn update_shader(&mut self, shader: &mut Shader, camera: &Camera, frame_clock: f64);
}

#[derive(Default)]
pub struct Shader {
    render_states: Option<RenderStateSet>,
    enables: Option<Shared<EnableSet>>,
    uniforms: Option<UniformSet>,
    scissor: Option<Scissor>,
    animator: Option<Box<dyn ShaderAnimator>>,
    last_update_time: Option<f64>,
}

impl fmt::Debug for Shader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Shader")
            .field("render_states", &self.render_states)
            .field("enables", &self.enables)
            .field("uniforms", &self.uniforms)
            .field("scissor", &self.scissor)
            .field("animated", &self.animator.is_some())
            .finish()
    }
}

impl Shader {
    pub fn new() -> Self {
        Shader::default()
    }

    /// Returns the render state of type `T` at `index`.
    pub fn render_state<T: StateType>(&self, index: usize) -> Option<Shared<T>> {
        let slot = RenderStateSlot::new(T::KIND, index).ok()?;
        self.render_states
            .as_ref()
            .and_then(|set| set.get(slot))
            .and_then(T::from_state)
    }

    /// Returns the render state of type `T` at `index`, inserting a default one
    /// if it is unspecified. Calling it again returns the same instance.
    pub fn goc_render_state<T: StateType>(&mut self, index: usize) -> Result<Shared<T>> {
        let slot = RenderStateSlot::new(T::KIND, index)?;
        Ok(self.goc_at(slot))
    }

    fn goc_at<T: StateType>(&mut self, slot: RenderStateSlot) -> Shared<T> {
        let set = self.render_states.get_or_insert_with(RenderStateSet::new);
        if let Some(v) = set.get(slot).and_then(T::from_state) {
            return v;
        }

        let v = shared(T::default());
        set.set(slot, T::into_state(v.clone()));
        v
    }

    /// Stores a (possibly shared) render state at the first slot of its kind,
    /// returns the state it replaced.
    pub fn set_render_state<S: Into<RenderState>>(&mut self, state: S) -> Option<RenderState> {
        let state = state.into();
        let slot = RenderStateSlot::first(state.kind());
        self.render_states
            .get_or_insert_with(RenderStateSet::new)
            .set(slot, state)
    }

    /// Stores a (possibly shared) render state at `index`, returns the state it
    /// replaced.
    pub fn set_render_state_indexed<S: Into<RenderState>>(
        &mut self,
        state: S,
        index: usize,
    ) -> Result<Option<RenderState>> {
        let state = state.into();
        let slot = RenderStateSlot::new(state.kind(), index)?;
        Ok(self
            .render_states
            .get_or_insert_with(RenderStateSet::new)
            .set(slot, state))
    }

    pub fn get_render_state(&self, kind: RenderStateKind, index: usize) -> Option<&RenderState> {
        let slot = RenderStateSlot::new(kind, index).ok()?;
        self.render_states.as_ref().and_then(|set| set.get(slot))
    }

    pub fn erase_render_state(&mut self, kind: RenderStateKind, index: usize) -> Option<RenderState> {
        let slot = RenderStateSlot::new(kind, index).ok()?;
        self.render_states.as_mut().and_then(|set| set.erase(slot))
    }

    pub fn erase_all_render_states(&mut self) {
        self.render_states = None;
    }

    #[inline]
    pub fn render_states(&self) -> Option<&RenderStateSet> {
        self.render_states.as_ref()
    }

    /// Clears render states, enables, uniforms and scissor, back to the
    /// defaults in one go.
    pub fn reset(&mut self) {
        self.render_states = None;
        self.enables = None;
        self.uniforms = None;
        self.scissor = None;
    }
}

macro_rules! impl_state_accessors {
    ($($ty:ident: $get:ident, $goc:ident;)*) => {
        impl Shader {
            $(
                #[inline]
                pub fn $get(&self) -> Option<Shared<$ty>> {
                    self.render_state::<$ty>(0)
                }

                #[inline]
                pub fn $goc(&mut self) -> Shared<$ty> {
                    self.goc_at(RenderStateSlot::first(<$ty as StateType>::KIND))
                }
            )*
        }
    };
}

macro_rules! impl_indexed_state_accessors {
    ($($ty:ident: $get:ident, $goc:ident;)*) => {
        impl Shader {
            $(
                #[inline]
                pub fn $get(&self, index: usize) -> Option<Shared<$ty>> {
                    self.render_state::<$ty>(index)
                }

                #[inline]
                pub fn $goc(&mut self, index: usize) -> Result<Shared<$ty>> {
                    self.goc_render_state::<$ty>(index)
                }
            )*
        }
    };
}

impl_state_accessors!(
    VertexColor: vertex_color, goc_vertex_color;
    CullFace: cull_face, goc_cull_face;
    FrontFace: front_face, goc_front_face;
    DepthFunc: depth_func, goc_depth_func;
    DepthMask: depth_mask, goc_depth_mask;
    DepthRange: depth_range, goc_depth_range;
    PolygonMode: polygon_mode, goc_polygon_mode;
    ShadeModel: shade_model, goc_shade_model;
    BlendFunc: blend_func, goc_blend_func;
    BlendEquation: blend_equation, goc_blend_equation;
    BlendColor: blend_color, goc_blend_color;
    AlphaFunc: alpha_func, goc_alpha_func;
    Material: material, goc_material;
    LightModel: light_model, goc_light_model;
    Fog: fog, goc_fog;
    PolygonOffset: polygon_offset, goc_polygon_offset;
    LogicOp: logic_op, goc_logic_op;
    LineWidth: line_width, goc_line_width;
    LineStipple: line_stipple, goc_line_stipple;
    PointSize: point_size, goc_point_size;
    StencilFunc: stencil_func, goc_stencil_func;
    StencilOp: stencil_op, goc_stencil_op;
    StencilMask: stencil_mask, goc_stencil_mask;
    SampleCoverage: sample_coverage, goc_sample_coverage;
    ColorMask: color_mask, goc_color_mask;
    GlslProgram: glsl_program, goc_glsl_program;
);

impl_indexed_state_accessors!(
    Light: light, goc_light;
    ClipPlane: clip_plane, goc_clip_plane;
    TextureSampler: texture_sampler, goc_texture_sampler;
    TexEnv: tex_env, goc_tex_env;
    TexGen: tex_gen, goc_tex_gen;
    TextureMatrix: texture_matrix, goc_texture_matrix;
);

impl Shader {
    #[inline]
    pub fn enable_set(&self) -> Option<&Shared<EnableSet>> {
        self.enables.as_ref()
    }

    pub fn goc_enable_set(&mut self) -> Shared<EnableSet> {
        self.enables
            .get_or_insert_with(|| shared(EnableSet::new()))
            .clone()
    }

    /// Replaces the enable set, passing a set owned by another shader makes
    /// both follow the same toggles.
    pub fn set_enable_set(&mut self, enables: Option<Shared<EnableSet>>) {
        self.enables = enables;
    }

    pub fn enable(&mut self, cap: Capability) {
        self.goc_enable_set().borrow_mut().enable(cap);
    }

    pub fn disable(&mut self, cap: Capability) {
        if let Some(ref v) = self.enables {
            v.borrow_mut().disable(cap);
        }
    }

    pub fn is_enabled(&self, cap: Capability) -> bool {
        self.enables
            .as_ref()
            .map(|v| v.borrow().is_enabled(cap))
            .unwrap_or(false)
    }

    /// Returns true if this shader blends with what has been drawn before.
    pub fn is_translucent(&self) -> bool {
        self.enables
            .as_ref()
            .map(|v| v.borrow().is_blending())
            .unwrap_or(false)
    }
}

impl Shader {
    #[inline]
    pub fn uniforms(&self) -> Option<&UniformSet> {
        self.uniforms.as_ref()
    }

    pub fn goc_uniform_set(&mut self) -> &mut UniformSet {
        self.uniforms.get_or_insert_with(UniformSet::new)
    }

    pub fn set_uniform_set(&mut self, uniforms: Option<UniformSet>) {
        self.uniforms = uniforms;
    }

    pub fn uniform<T: AsRef<str>>(&self, name: T) -> Option<&Uniform> {
        self.uniforms.as_ref().and_then(|v| v.get(name))
    }

    /// Returns the uniform `name`, inserting `default` if it does not exist.
    pub fn goc_uniform<T1, T2>(&mut self, name: T1, default: T2) -> &mut Uniform
    where
        T1: Into<String>,
        T2: Into<Uniform>,
    {
        self.goc_uniform_set().goc(name, default)
    }

    pub fn set_uniform<T1, T2>(&mut self, name: T1, value: T2) -> Option<Uniform>
    where
        T1: Into<String>,
        T2: Into<Uniform>,
    {
        self.goc_uniform_set().set(name, value)
    }

    pub fn erase_uniform<T: AsRef<str>>(&mut self, name: T) -> Option<Uniform> {
        self.uniforms.as_mut().and_then(|v| v.remove(name))
    }
}

impl Shader {
    #[inline]
    pub fn scissor(&self) -> Option<Scissor> {
        self.scissor
    }

    #[inline]
    pub fn set_scissor(&mut self, scissor: Option<Scissor>) {
        self.scissor = scissor;
    }

    pub fn set_animator(&mut self, animator: Option<Box<dyn ShaderAnimator>>) {
        self.animator = animator;
        self.last_update_time = None;
    }

    #[inline]
    pub fn is_animated(&self) -> bool {
        self.animator.is_some()
    }

    /// Runs the animator, unless it has already run for `frame_clock`.
    pub fn update(&mut self, camera: &Camera, frame_clock: f64) {
        if self.last_update_time == Some(frame_clock) {
            return;
        }

        if let Some(mut animator) = self.animator.take() {
            animator.update_shader(self, camera, frame_clock);
            if self.animator.is_none() {
                self.animator = Some(animator);
            }
        }

        self.last_update_time = Some(frame_clock);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::Color;
    use crate::settings::MAX_LIGHTS;
    use std::rc::Rc;

    #[test]
    fn goc() {
        let mut shader = Shader::new();
        assert!(shader.depth_func().is_none());

        let v1 = shader.goc_depth_func();
        let v2 = shader.goc_depth_func();
        assert!(Rc::ptr_eq(&v1, &v2));

        v1.borrow_mut().func = Comparison::Always;
        assert_eq!(shader.depth_func().unwrap().borrow().func, Comparison::Always);

        shader.erase_render_state(RenderStateKind::DepthFunc, 0);
        assert!(shader.depth_func().is_none());
        assert!(!Rc::ptr_eq(&shader.goc_depth_func(), &v1));
    }

    #[test]
    fn indexed() {
        let mut shader = Shader::new();
        let l0 = shader.goc_light(0).unwrap();
        let l3 = shader.goc_light(3).unwrap();
        assert!(!Rc::ptr_eq(&l0, &l3));
        assert!(shader.light(1).is_none());
        assert!(shader.goc_light(MAX_LIGHTS).is_err());
        assert!(shader.light(MAX_LIGHTS).is_none());
    }

    #[test]
    fn shared_state() {
        let light = shared(Light::default());

        let mut s1 = Shader::new();
        let mut s2 = Shader::new();
        s1.set_render_state_indexed(light.clone(), 2).unwrap();
        s2.set_render_state_indexed(light.clone(), 2).unwrap();

        light.borrow_mut().diffuse = Color::red();
        assert_eq!(s1.light(2).unwrap().borrow().diffuse, Color::red());
        assert!(Rc::ptr_eq(&s1.light(2).unwrap(), &s2.light(2).unwrap()));
    }

    #[test]
    fn enables() {
        let mut shader = Shader::new();
        shader.enable(Capability::Blend);
        shader.enable(Capability::Blend);
        assert!(shader.is_translucent());
        assert_eq!(shader.enable_set().unwrap().borrow().len(), 1);

        let mut other = Shader::new();
        other.set_enable_set(shader.enable_set().cloned());
        shader.disable(Capability::Blend);
        assert!(!other.is_enabled(Capability::Blend));
    }

    #[test]
    fn reset() {
        let mut shader = Shader::new();
        shader.goc_material();
        shader.enable(Capability::Lighting);
        shader.set_uniform("u_Time", 1.0f32);
        shader.set_scissor(Some(Scissor::new(0, 0, 8, 8)));

        shader.reset();
        assert!(shader.render_states().is_none());
        assert!(!shader.is_enabled(Capability::Lighting));
        assert!(shader.uniform("u_Time").is_none());
        assert!(shader.scissor().is_none());
    }

    struct Counter(u32);

    impl ShaderAnimator for Counter {
        fn update_shader(&mut self, shader: &mut Shader, _: &Camera, frame_clock: f64) {
            self.0 += 1;
            shader.set_uniform("u_Time", frame_clock as f32);
            shader.set_uniform("u_Count", self.0 as i32);
        }
    }

    #[test]
    fn animator() {
        let camera = Camera::new();
        let mut shader = Shader::new();
        shader.set_animator(Some(Box::new(Counter(0))));

        shader.update(&camera, 1.0);
        shader.update(&camera, 1.0);
        assert_eq!(shader.uniform("u_Count"), Some(&Uniform::I32(1)));

        shader.update(&camera, 2.0);
        assert_eq!(shader.uniform("u_Count"), Some(&Uniform::I32(2)));
        assert_eq!(shader.uniform("u_Time"), Some(&Uniform::F32(2.0)));
    }
}
