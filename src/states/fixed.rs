//! Render states that exist once per `Shader`.

use crate::device::Device;
use crate::errors::*;
use crate::math::Color;

use super::types::*;

macro_rules! impl_apply {
    ($name:ident, $func:ident) => {
        impl $name {
            /// Maps this state onto the backend.
            #[inline]
            pub fn apply(&self, _: usize, device: &mut Device) -> Result<()> {
                device.visitor_mut().$func(self)
            }
        }
    };
}

/// The current vertex color, used when no color array is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VertexColor {
    pub color: Color,
}

impl Default for VertexColor {
    fn default() -> Self {
        VertexColor {
            color: Color::white(),
        }
    }
}

impl_apply!(VertexColor, vertex_color);

/// Specify whether front- or back-facing polygons can be culled. Culling itself
/// is switched with `Capability::CullFace`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CullFace {
    pub face: PolygonFace,
}

impl Default for CullFace {
    fn default() -> Self {
        CullFace {
            face: PolygonFace::Back,
        }
    }
}

impl_apply!(CullFace, cull_face);

/// Define front- and back-facing polygons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrontFace {
    pub order: FrontFaceOrder,
}

impl Default for FrontFace {
    fn default() -> Self {
        FrontFace {
            order: FrontFaceOrder::CounterClockwise,
        }
    }
}

impl_apply!(FrontFace, front_face);

/// The value used for depth buffer comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthFunc {
    pub func: Comparison,
}

impl DepthFunc {
    pub fn new(func: Comparison) -> Self {
        DepthFunc { func }
    }
}

impl Default for DepthFunc {
    fn default() -> Self {
        DepthFunc {
            func: Comparison::Less,
        }
    }
}

impl_apply!(DepthFunc, depth_func);

/// Enable or disable writing into the depth buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthMask {
    pub write: bool,
}

impl DepthMask {
    pub fn new(write: bool) -> Self {
        DepthMask { write }
    }
}

impl Default for DepthMask {
    fn default() -> Self {
        DepthMask { write: true }
    }
}

impl_apply!(DepthMask, depth_mask);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthRange {
    pub near: f32,
    pub far: f32,
}

impl Default for DepthRange {
    fn default() -> Self {
        DepthRange {
            near: 0.0,
            far: 1.0,
        }
    }
}

impl_apply!(DepthRange, depth_range);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolygonMode {
    pub front: FillMode,
    pub back: FillMode,
}

impl PolygonMode {
    pub fn new(mode: FillMode) -> Self {
        PolygonMode {
            front: mode,
            back: mode,
        }
    }
}

impl Default for PolygonMode {
    fn default() -> Self {
        PolygonMode::new(FillMode::Fill)
    }
}

impl_apply!(PolygonMode, polygon_mode);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadeModel {
    pub model: Shading,
}

impl Default for ShadeModel {
    fn default() -> Self {
        ShadeModel {
            model: Shading::Smooth,
        }
    }
}

impl_apply!(ShadeModel, shade_model);

/// Specifies how incoming RGBA values (source) and the RGBA in framebuffer
/// (destination) are combined. Blending is switched with `Capability::Blend`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendFunc {
    pub src_rgb: BlendFactor,
    pub dst_rgb: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
}

impl BlendFunc {
    pub fn new(src: BlendFactor, dst: BlendFactor) -> Self {
        BlendFunc {
            src_rgb: src,
            dst_rgb: dst,
            src_alpha: src,
            dst_alpha: dst,
        }
    }

    /// The usual `src_alpha, 1 - src_alpha` blending.
    pub fn alpha() -> Self {
        BlendFunc::new(
            BlendFactor::Value(BlendValue::SourceAlpha),
            BlendFactor::OneMinusValue(BlendValue::SourceAlpha),
        )
    }
}

impl Default for BlendFunc {
    fn default() -> Self {
        BlendFunc::new(BlendFactor::One, BlendFactor::Zero)
    }
}

impl_apply!(BlendFunc, blend_func);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendEquation {
    pub rgb: Equation,
    pub alpha: Equation,
}

impl BlendEquation {
    pub fn new(equation: Equation) -> Self {
        BlendEquation {
            rgb: equation,
            alpha: equation,
        }
    }
}

impl Default for BlendEquation {
    fn default() -> Self {
        BlendEquation::new(Equation::Add)
    }
}

impl_apply!(BlendEquation, blend_equation);

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendColor {
    pub color: Color,
}

impl_apply!(BlendColor, blend_color);

/// Alpha test, switched with `Capability::AlphaTest`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlphaFunc {
    pub func: Comparison,
    pub reference: f32,
}

impl Default for AlphaFunc {
    fn default() -> Self {
        AlphaFunc {
            func: Comparison::Always,
            reference: 0.0,
        }
    }
}

impl_apply!(AlphaFunc, alpha_func);

/// Lighting parameters of one polygon face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialFace {
    pub ambient: Color,
    pub diffuse: Color,
    pub specular: Color,
    pub emission: Color,
    pub shininess: f32,
}

impl Default for MaterialFace {
    fn default() -> Self {
        MaterialFace {
            ambient: Color::new(0.2, 0.2, 0.2, 1.0),
            diffuse: Color::new(0.8, 0.8, 0.8, 1.0),
            specular: Color::black(),
            emission: Color::black(),
            shininess: 0.0,
        }
    }
}

/// Front and back material parameters for the lighting equation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub front: MaterialFace,
    pub back: MaterialFace,
    /// Makes the material parameters track the current vertex color.
    pub color_material: Option<(PolygonFace, ColorMaterial)>,
}

impl Material {
    pub fn set_ambient(&mut self, color: Color) {
        self.front.ambient = color;
        self.back.ambient = color;
    }

    pub fn set_diffuse(&mut self, color: Color) {
        self.front.diffuse = color;
        self.back.diffuse = color;
    }

    pub fn set_specular(&mut self, color: Color) {
        self.front.specular = color;
        self.back.specular = color;
    }

    pub fn set_emission(&mut self, color: Color) {
        self.front.emission = color;
        self.back.emission = color;
    }

    pub fn set_shininess(&mut self, shininess: f32) {
        self.front.shininess = shininess;
        self.back.shininess = shininess;
    }

    /// Sets the alpha of the diffuse color, which is the one OpenGL uses as the
    /// fragment alpha under lighting.
    pub fn set_transparency(&mut self, alpha: f32) {
        self.front.diffuse.a = alpha;
        self.back.diffuse.a = alpha;
    }

    #[inline]
    pub fn front_diffuse(&self) -> Color {
        self.front.diffuse
    }

    #[inline]
    pub fn back_diffuse(&self) -> Color {
        self.back.diffuse
    }
}

impl_apply!(Material, material);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightModel {
    pub ambient: Color,
    pub local_viewer: bool,
    pub two_side: bool,
    pub separate_specular: bool,
}

impl Default for LightModel {
    fn default() -> Self {
        LightModel {
            ambient: Color::new(0.2, 0.2, 0.2, 1.0),
            local_viewer: false,
            two_side: false,
            separate_specular: false,
        }
    }
}

impl_apply!(LightModel, light_model);

/// Fog parameters, switched with `Capability::Fog`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fog {
    pub mode: FogMode,
    pub color: Color,
    pub density: f32,
    pub start: f32,
    pub end: f32,
}

impl Default for Fog {
    fn default() -> Self {
        Fog {
            mode: FogMode::Exp,
            color: Color::transparent(),
            density: 1.0,
            start: 0.0,
            end: 1.0,
        }
    }
}

impl_apply!(Fog, fog);

/// The scale and units used to calculate depth values, switched with the
/// `PolygonOffset*` capabilities.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolygonOffset {
    pub factor: f32,
    pub units: f32,
}

impl PolygonOffset {
    pub fn new(factor: f32, units: f32) -> Self {
        PolygonOffset { factor, units }
    }
}

impl_apply!(PolygonOffset, polygon_offset);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogicOp {
    pub op: LogicOperation,
}

impl Default for LogicOp {
    fn default() -> Self {
        LogicOp {
            op: LogicOperation::Copy,
        }
    }
}

impl_apply!(LogicOp, logic_op);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineWidth {
    pub width: f32,
}

impl LineWidth {
    pub fn new(width: f32) -> Self {
        LineWidth { width }
    }
}

impl Default for LineWidth {
    fn default() -> Self {
        LineWidth { width: 1.0 }
    }
}

impl_apply!(LineWidth, line_width);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineStipple {
    pub factor: i32,
    pub pattern: u16,
}

impl Default for LineStipple {
    fn default() -> Self {
        LineStipple {
            factor: 1,
            pattern: 0xFFFF,
        }
    }
}

impl_apply!(LineStipple, line_stipple);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointSize {
    pub size: f32,
}

impl Default for PointSize {
    fn default() -> Self {
        PointSize { size: 1.0 }
    }
}

impl_apply!(PointSize, point_size);

/// Stencil test function, switched with `Capability::StencilTest`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StencilFunc {
    pub face: PolygonFace,
    pub func: Comparison,
    pub reference: i32,
    pub mask: u32,
}

impl Default for StencilFunc {
    fn default() -> Self {
        StencilFunc {
            face: PolygonFace::FrontAndBack,
            func: Comparison::Always,
            reference: 0,
            mask: !0,
        }
    }
}

impl_apply!(StencilFunc, stencil_func);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StencilOp {
    pub face: PolygonFace,
    pub stencil_fail: StencilAction,
    pub depth_fail: StencilAction,
    pub depth_pass: StencilAction,
}

impl Default for StencilOp {
    fn default() -> Self {
        StencilOp {
            face: PolygonFace::FrontAndBack,
            stencil_fail: StencilAction::Keep,
            depth_fail: StencilAction::Keep,
            depth_pass: StencilAction::Keep,
        }
    }
}

impl_apply!(StencilOp, stencil_op);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StencilMask {
    pub face: PolygonFace,
    pub mask: u32,
}

impl Default for StencilMask {
    fn default() -> Self {
        StencilMask {
            face: PolygonFace::FrontAndBack,
            mask: !0,
        }
    }
}

impl_apply!(StencilMask, stencil_mask);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleCoverage {
    pub value: f32,
    pub invert: bool,
}

impl Default for SampleCoverage {
    fn default() -> Self {
        SampleCoverage {
            value: 1.0,
            invert: false,
        }
    }
}

impl_apply!(SampleCoverage, sample_coverage);

/// Enable or disable writing color elements into the color buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorMask {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
    pub alpha: bool,
}

impl ColorMask {
    pub fn new(red: bool, green: bool, blue: bool, alpha: bool) -> Self {
        ColorMask {
            red,
            green,
            blue,
            alpha,
        }
    }
}

impl Default for ColorMask {
    fn default() -> Self {
        ColorMask::new(true, true, true, true)
    }
}

impl_apply!(ColorMask, color_mask);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn material() {
        let mut m = Material::default();
        m.set_diffuse(Color::red());
        assert_eq!(m.front_diffuse(), Color::red());
        assert_eq!(m.back_diffuse(), Color::red());

        m.set_transparency(0.5);
        assert_eq!(m.front_diffuse(), Color::new(1.0, 0.0, 0.0, 0.5));
    }

    #[test]
    fn defaults() {
        assert_eq!(DepthFunc::default().func, Comparison::Less);
        assert!(DepthMask::default().write);
        assert_eq!(BlendFunc::default(), BlendFunc::new(BlendFactor::One, BlendFactor::Zero));
        assert_eq!(StencilMask::default().mask, 0xFFFF_FFFF);
    }
}
