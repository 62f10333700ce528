//! The backend of the renderer, which should be responsible for only one thing:
//! turning render states and draw requests into low-level OpenGL calls.
//!
//! Every render state maps itself onto exactly one family of `Visitor` calls in
//! its `apply`, the `Device` decides when those calls are necessary.

pub mod headless;

use crate::errors::*;
use crate::framebuffer::{AttachmentPoint, AttachmentTarget, DrawBuffer};
use crate::math::{Color, Matrix4, Rect};
use crate::states::*;
use crate::texture::{RenderbufferParams, TextureFilter, TextureFormat, TextureParams};
use crate::utils::Handle;

/// Kinds of primitives a `Renderable` draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    Points,
    Lines,
    LineStrip,
    LineLoop,
    Triangles,
    TriangleStrip,
    TriangleFan,
    Quads,
}

/// The buffers copied by a framebuffer blit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlitMask {
    pub color: bool,
    pub depth: bool,
    pub stencil: bool,
}

impl BlitMask {
    pub fn color() -> Self {
        BlitMask {
            color: true,
            depth: false,
            stencil: false,
        }
    }

    pub fn all() -> Self {
        BlitMask {
            color: true,
            depth: true,
            stencil: true,
        }
    }
}

/// The boundary between `pigment` and a graphics API. A `None` framebuffer
/// always stands for the default framebuffer of the context.
pub trait Visitor {
    fn create_texture(&mut self, params: &TextureParams) -> Result<Handle>;
    fn delete_texture(&mut self, handle: Handle) -> Result<()>;

    fn create_renderbuffer(&mut self, params: &RenderbufferParams) -> Result<Handle>;
    fn delete_renderbuffer(&mut self, handle: Handle) -> Result<()>;

    fn create_framebuffer(&mut self) -> Result<Handle>;
    fn delete_framebuffer(&mut self, handle: Handle) -> Result<()>;

    /// Attaches `target` at `point` of `framebuffer`, or detaches whatever is
    /// attached there if `target` is `None`.
    fn framebuffer_attach(
        &mut self,
        framebuffer: Handle,
        point: AttachmentPoint,
        target: Option<AttachmentTarget>,
    ) -> Result<()>;

    fn framebuffer_draw_buffers(
        &mut self,
        framebuffer: Option<Handle>,
        buffers: &[DrawBuffer],
    ) -> Result<()>;

    /// Checks the completeness of `framebuffer`, fails with `FramebufferIncomplete`.
    fn framebuffer_status(&mut self, framebuffer: Handle) -> Result<()>;

    fn bind_framebuffer(&mut self, framebuffer: Option<Handle>) -> Result<()>;

    /// Compiles and links a program, fails with `ProgramLink` carrying the info log.
    fn create_program(&mut self, program: &GlslProgram) -> Result<Handle>;
    fn delete_program(&mut self, handle: Handle) -> Result<()>;
    fn use_program(&mut self, program: Option<Handle>) -> Result<()>;
    fn uniform(&mut self, program: Handle, name: &str, value: &Uniform) -> Result<()>;

    /// Loads the fixed-function projection and modelview matrices.
    fn load_matrices(&mut self, projection: &Matrix4<f32>, modelview: &Matrix4<f32>)
        -> Result<()>;

    fn viewport(&mut self, rect: Rect) -> Result<()>;
    fn scissor(&mut self, rect: Option<Rect>) -> Result<()>;
    fn clear(&mut self, color: Option<Color>, depth: Option<f32>, stencil: Option<i32>)
        -> Result<()>;

    fn blit_framebuffer(
        &mut self,
        src: Option<Handle>,
        src_rect: Rect,
        dst: Option<Handle>,
        dst_rect: Rect,
        mask: BlitMask,
        filter: TextureFilter,
    ) -> Result<()>;

    /// Reads back pixels of the bound framebuffer.
    fn read_pixels(&mut self, rect: Rect, format: TextureFormat) -> Result<Vec<u8>>;

    /// Copies a rectangle of the bound framebuffer into level `level` of a texture.
    fn copy_tex_sub_image(
        &mut self,
        texture: Handle,
        level: u32,
        src: Rect,
        offset: (i32, i32),
    ) -> Result<()>;

    fn enable(&mut self, capability: Capability, enabled: bool) -> Result<()>;

    fn vertex_color(&mut self, state: &VertexColor) -> Result<()>;
    fn cull_face(&mut self, state: &CullFace) -> Result<()>;
    fn front_face(&mut self, state: &FrontFace) -> Result<()>;
    fn depth_func(&mut self, state: &DepthFunc) -> Result<()>;
    fn depth_mask(&mut self, state: &DepthMask) -> Result<()>;
    fn depth_range(&mut self, state: &DepthRange) -> Result<()>;
    fn polygon_mode(&mut self, state: &PolygonMode) -> Result<()>;
    fn shade_model(&mut self, state: &ShadeModel) -> Result<()>;
    fn blend_func(&mut self, state: &BlendFunc) -> Result<()>;
    fn blend_equation(&mut self, state: &BlendEquation) -> Result<()>;
    fn blend_color(&mut self, state: &BlendColor) -> Result<()>;
    fn alpha_func(&mut self, state: &AlphaFunc) -> Result<()>;
    fn material(&mut self, state: &Material) -> Result<()>;
    fn light_model(&mut self, state: &LightModel) -> Result<()>;
    fn fog(&mut self, state: &Fog) -> Result<()>;
    fn polygon_offset(&mut self, state: &PolygonOffset) -> Result<()>;
    fn logic_op(&mut self, state: &LogicOp) -> Result<()>;
    fn line_width(&mut self, state: &LineWidth) -> Result<()>;
    fn line_stipple(&mut self, state: &LineStipple) -> Result<()>;
    fn point_size(&mut self, state: &PointSize) -> Result<()>;
    fn stencil_func(&mut self, state: &StencilFunc) -> Result<()>;
    fn stencil_op(&mut self, state: &StencilOp) -> Result<()>;
    fn stencil_mask(&mut self, state: &StencilMask) -> Result<()>;
    fn sample_coverage(&mut self, state: &SampleCoverage) -> Result<()>;
    fn color_mask(&mut self, state: &ColorMask) -> Result<()>;

    /// Sets up light `index`, or switches it off if `state` is `None`.
    fn light(&mut self, index: usize, state: Option<&Light>) -> Result<()>;
    /// Sets up clip plane `index`, or switches it off if `state` is `None`.
    fn clip_plane(&mut self, index: usize, state: Option<&ClipPlane>) -> Result<()>;
    fn tex_env(&mut self, unit: usize, state: &TexEnv) -> Result<()>;
    fn tex_gen(&mut self, unit: usize, state: &TexGen) -> Result<()>;
    fn texture_matrix(&mut self, unit: usize, state: &TextureMatrix) -> Result<()>;
    fn bind_texture(&mut self, unit: usize, texture: Option<Handle>) -> Result<()>;

    fn draw(&mut self, primitive: Primitive, first: u32, count: u32) -> Result<()>;

    /// Blocks until all execution is complete.
    fn flush(&mut self) -> Result<()>;
}
