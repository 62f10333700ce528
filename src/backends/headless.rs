//! A `Visitor` without GPU. It allocates handles, records every call it receives
//! and keeps just enough bookkeeping to tell which textures have been rendered
//! into before they are sampled.

use std::cell::RefCell;
use std::rc::Rc;

use super::{BlitMask, Primitive, Visitor};

use crate::errors::*;
use crate::framebuffer::{AttachmentPoint, AttachmentTarget, DrawBuffer};
use crate::math::{Color, Matrix4, Rect};
use crate::states::*;
use crate::texture::{RenderbufferParams, TextureFilter, TextureFormat, TextureParams};
use crate::utils::{FastHashMap, FastHashSet, Handle, HandlePool};

/// A recorded `Visitor` call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateTexture(Handle),
    DeleteTexture(Handle),
    CreateRenderbuffer(Handle),
    DeleteRenderbuffer(Handle),
    CreateFramebuffer(Handle),
    DeleteFramebuffer(Handle),
    Attach {
        framebuffer: Handle,
        point: AttachmentPoint,
        target: Option<AttachmentTarget>,
    },
    DrawBuffers {
        framebuffer: Option<Handle>,
        buffers: Vec<DrawBuffer>,
    },
    BindFramebuffer(Option<Handle>),
    CreateProgram(Handle),
    DeleteProgram(Handle),
    UseProgram(Option<Handle>),
    Uniform {
        program: Handle,
        name: String,
        value: Uniform,
    },
    LoadMatrices,
    Viewport(Rect),
    Scissor(Option<Rect>),
    Clear {
        framebuffer: Option<Handle>,
    },
    Blit {
        src: Option<Handle>,
        dst: Option<Handle>,
    },
    ReadPixels {
        framebuffer: Option<Handle>,
        rect: Rect,
    },
    CopyTexture {
        texture: Handle,
        src: Rect,
    },
    Enable(Capability, bool),
    /// A render state applied at `index`, `None` switches an indexed state off.
    State {
        kind: RenderStateKind,
        index: usize,
        value: Option<StateValue>,
    },
    BindTexture {
        unit: usize,
        texture: Option<Handle>,
    },
    Draw {
        primitive: Primitive,
        first: u32,
        count: u32,
        framebuffer: Option<Handle>,
    },
    Flush,
}

#[derive(Debug, Default)]
pub struct LogData {
    calls: Vec<Call>,
    written: FastHashSet<Handle>,
    unwritten_reads: Vec<Handle>,
}

/// The shared log of a `HeadlessVisitor`, which stays readable after the visitor
/// has been moved into a `Device`.
#[derive(Debug, Clone, Default)]
pub struct HeadlessLog(Rc<RefCell<LogData>>);

impl HeadlessLog {
    /// All the calls recorded since the last `clear`.
    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().calls.clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().calls.clear();
    }

    /// Number of draw calls recorded since the last `clear`.
    pub fn draws(&self) -> usize {
        self.0
            .borrow()
            .calls
            .iter()
            .filter(|v| match **v {
                Call::Draw { .. } => true,
                _ => false,
            })
            .count()
    }

    /// Textures that were bound for sampling before anything had been rendered
    /// into them.
    pub fn unwritten_reads(&self) -> Vec<Handle> {
        self.0.borrow().unwritten_reads.clone()
    }

    /// Returns true if the texture has been rendered into.
    pub fn is_written(&self, texture: Handle) -> bool {
        self.0.borrow().written.contains(&texture)
    }

    fn push(&self, call: Call) {
        self.0.borrow_mut().calls.push(call);
    }
}

#[derive(Debug, Default)]
struct FramebufferData {
    attachments: FastHashMap<AttachmentPoint, AttachmentTarget>,
    draw_buffers: Vec<DrawBuffer>,
}

pub struct HeadlessVisitor {
    log: HeadlessLog,
    textures: HandlePool<Handle>,
    renderbuffers: HandlePool<Handle>,
    framebuffers: HandlePool<Handle>,
    programs: HandlePool<Handle>,
    framebuffer_data: FastHashMap<Handle, FramebufferData>,
    framebuffer: Option<Handle>,
}

impl Default for HeadlessVisitor {
    fn default() -> Self {
        HeadlessVisitor::new()
    }
}

impl HeadlessVisitor {
    pub fn new() -> Self {
        HeadlessVisitor {
            log: HeadlessLog::default(),
            textures: HandlePool::new(),
            renderbuffers: HandlePool::new(),
            framebuffers: HandlePool::new(),
            programs: HandlePool::new(),
            framebuffer_data: FastHashMap::default(),
            framebuffer: None,
        }
    }

    /// Returns a handle to the call log.
    pub fn log(&self) -> HeadlessLog {
        self.log.clone()
    }

    fn state<T: StateType>(&mut self, index: usize, state: Option<&T>) -> Result<()> {
        self.log.push(Call::State {
            kind: T::KIND,
            index,
            value: state.map(|v| v.clone().into_value()),
        });

        Ok(())
    }

    fn mark_written(&mut self, framebuffer: Option<Handle>) {
        if let Some(fbo) = framebuffer {
            if let Some(data) = self.framebuffer_data.get(&fbo) {
                let mut log = self.log.0.borrow_mut();
                for v in data.attachments.values() {
                    if let AttachmentTarget::Texture { handle, .. } = *v {
                        log.written.insert(handle);
                    }
                }
            }
        }
    }

    fn check_framebuffer(&self, framebuffer: Option<Handle>) -> Result<()> {
        match framebuffer {
            Some(fbo) if !self.framebuffers.contains(fbo) => {
                Err(Error::HandleInvalid(format!("Framebuffer {}", fbo)))
            }
            _ => Ok(()),
        }
    }
}

macro_rules! impl_record_states {
    ($($func:ident: $ty:ident,)*) => {
        $(
            fn $func(&mut self, state: &$ty) -> Result<()> {
                self.state(0, Some(state))
            }
        )*
    };
}

impl Visitor for HeadlessVisitor {
    fn create_texture(&mut self, _: &TextureParams) -> Result<Handle> {
        let handle = self.textures.create();
        self.log.push(Call::CreateTexture(handle));
        Ok(handle)
    }

    fn delete_texture(&mut self, handle: Handle) -> Result<()> {
        if !self.textures.free(handle) {
            return Err(Error::HandleInvalid(format!("Texture {}", handle)));
        }

        self.log.0.borrow_mut().written.remove(&handle);
        self.log.push(Call::DeleteTexture(handle));
        Ok(())
    }

    fn create_renderbuffer(&mut self, _: &RenderbufferParams) -> Result<Handle> {
        let handle = self.renderbuffers.create();
        self.log.push(Call::CreateRenderbuffer(handle));
        Ok(handle)
    }

    fn delete_renderbuffer(&mut self, handle: Handle) -> Result<()> {
        if !self.renderbuffers.free(handle) {
            return Err(Error::HandleInvalid(format!("Renderbuffer {}", handle)));
        }

        self.log.push(Call::DeleteRenderbuffer(handle));
        Ok(())
    }

    fn create_framebuffer(&mut self) -> Result<Handle> {
        let handle = self.framebuffers.create();
        self.framebuffer_data.insert(handle, FramebufferData::default());
        self.log.push(Call::CreateFramebuffer(handle));
        Ok(handle)
    }

    fn delete_framebuffer(&mut self, handle: Handle) -> Result<()> {
        if !self.framebuffers.free(handle) {
            return Err(Error::HandleInvalid(format!("Framebuffer {}", handle)));
        }

        self.framebuffer_data.remove(&handle);
        if self.framebuffer == Some(handle) {
            self.framebuffer = None;
        }

        self.log.push(Call::DeleteFramebuffer(handle));
        Ok(())
    }

    fn framebuffer_attach(
        &mut self,
        framebuffer: Handle,
        point: AttachmentPoint,
        target: Option<AttachmentTarget>,
    ) -> Result<()> {
        let data = self
            .framebuffer_data
            .get_mut(&framebuffer)
            .ok_or_else(|| Error::HandleInvalid(format!("Framebuffer {}", framebuffer)))?;

        match target {
            Some(v) => data.attachments.insert(point, v),
            None => data.attachments.remove(&point),
        };

        self.log.push(Call::Attach {
            framebuffer,
            point,
            target,
        });

        Ok(())
    }

    fn framebuffer_draw_buffers(
        &mut self,
        framebuffer: Option<Handle>,
        buffers: &[DrawBuffer],
    ) -> Result<()> {
        if let Some(fbo) = framebuffer {
            let data = self
                .framebuffer_data
                .get_mut(&fbo)
                .ok_or_else(|| Error::HandleInvalid(format!("Framebuffer {}", fbo)))?;
            data.draw_buffers = buffers.to_vec();
        }

        self.log.push(Call::DrawBuffers {
            framebuffer,
            buffers: buffers.to_vec(),
        });

        Ok(())
    }

    fn framebuffer_status(&mut self, framebuffer: Handle) -> Result<()> {
        let data = self
            .framebuffer_data
            .get(&framebuffer)
            .ok_or_else(|| Error::HandleInvalid(format!("Framebuffer {}", framebuffer)))?;

        if data.attachments.is_empty() {
            return Err(Error::FramebufferIncomplete(
                "GL_FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT".into(),
            ));
        }

        for v in &data.draw_buffers {
            if let DrawBuffer::ColorAttachment(i) = *v {
                if !data.attachments.contains_key(&AttachmentPoint::Color(i)) {
                    return Err(Error::FramebufferIncomplete(
                        "GL_FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER".into(),
                    ));
                }
            }
        }

        Ok(())
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<Handle>) -> Result<()> {
        self.check_framebuffer(framebuffer)?;
        self.framebuffer = framebuffer;
        self.log.push(Call::BindFramebuffer(framebuffer));
        Ok(())
    }

    fn create_program(&mut self, program: &GlslProgram) -> Result<Handle> {
        if program.stages().is_empty() {
            return Err(Error::ProgramLink("No shader stage attached.".into()));
        }

        for v in program.stages() {
            if v.source.trim().is_empty() {
                return Err(Error::ProgramLink(format!(
                    "{:?} shader has an empty source.",
                    v.kind
                )));
            }
        }

        let handle = self.programs.create();
        self.log.push(Call::CreateProgram(handle));
        Ok(handle)
    }

    fn delete_program(&mut self, handle: Handle) -> Result<()> {
        if !self.programs.free(handle) {
            return Err(Error::HandleInvalid(format!("Program {}", handle)));
        }

        self.log.push(Call::DeleteProgram(handle));
        Ok(())
    }

    fn use_program(&mut self, program: Option<Handle>) -> Result<()> {
        self.log.push(Call::UseProgram(program));
        Ok(())
    }

    fn uniform(&mut self, program: Handle, name: &str, value: &Uniform) -> Result<()> {
        self.log.push(Call::Uniform {
            program,
            name: name.to_owned(),
            value: value.clone(),
        });

        Ok(())
    }

    fn load_matrices(&mut self, _: &Matrix4<f32>, _: &Matrix4<f32>) -> Result<()> {
        self.log.push(Call::LoadMatrices);
        Ok(())
    }

    fn viewport(&mut self, rect: Rect) -> Result<()> {
        self.log.push(Call::Viewport(rect));
        Ok(())
    }

    fn scissor(&mut self, rect: Option<Rect>) -> Result<()> {
        self.log.push(Call::Scissor(rect));
        Ok(())
    }

    fn clear(&mut self, _: Option<Color>, _: Option<f32>, _: Option<i32>) -> Result<()> {
        let framebuffer = self.framebuffer;
        self.mark_written(framebuffer);
        self.log.push(Call::Clear { framebuffer });
        Ok(())
    }

    fn blit_framebuffer(
        &mut self,
        src: Option<Handle>,
        _: Rect,
        dst: Option<Handle>,
        _: Rect,
        _: BlitMask,
        _: TextureFilter,
    ) -> Result<()> {
        self.check_framebuffer(src)?;
        self.check_framebuffer(dst)?;
        self.mark_written(dst);
        self.log.push(Call::Blit { src, dst });
        Ok(())
    }

    fn read_pixels(&mut self, rect: Rect, format: TextureFormat) -> Result<Vec<u8>> {
        self.log.push(Call::ReadPixels {
            framebuffer: self.framebuffer,
            rect,
        });

        let len = rect.width as usize * rect.height as usize * format.size() as usize;
        Ok(vec![0; len])
    }

    fn copy_tex_sub_image(
        &mut self,
        texture: Handle,
        _: u32,
        src: Rect,
        _: (i32, i32),
    ) -> Result<()> {
        if !self.textures.contains(texture) {
            return Err(Error::HandleInvalid(format!("Texture {}", texture)));
        }

        self.log.0.borrow_mut().written.insert(texture);
        self.log.push(Call::CopyTexture { texture, src });
        Ok(())
    }

    fn enable(&mut self, capability: Capability, enabled: bool) -> Result<()> {
        self.log.push(Call::Enable(capability, enabled));
        Ok(())
    }

    impl_record_states!(
        vertex_color: VertexColor,
        cull_face: CullFace,
        front_face: FrontFace,
        depth_func: DepthFunc,
        depth_mask: DepthMask,
        depth_range: DepthRange,
        polygon_mode: PolygonMode,
        shade_model: ShadeModel,
        blend_func: BlendFunc,
        blend_equation: BlendEquation,
        blend_color: BlendColor,
        alpha_func: AlphaFunc,
        material: Material,
        light_model: LightModel,
        fog: Fog,
        polygon_offset: PolygonOffset,
        logic_op: LogicOp,
        line_width: LineWidth,
        line_stipple: LineStipple,
        point_size: PointSize,
        stencil_func: StencilFunc,
        stencil_op: StencilOp,
        stencil_mask: StencilMask,
        sample_coverage: SampleCoverage,
        color_mask: ColorMask,
    );

    fn light(&mut self, index: usize, state: Option<&Light>) -> Result<()> {
        self.state(index, state)
    }

    fn clip_plane(&mut self, index: usize, state: Option<&ClipPlane>) -> Result<()> {
        self.state(index, state)
    }

    fn tex_env(&mut self, unit: usize, state: &TexEnv) -> Result<()> {
        self.state(unit, Some(state))
    }

    fn tex_gen(&mut self, unit: usize, state: &TexGen) -> Result<()> {
        self.state(unit, Some(state))
    }

    fn texture_matrix(&mut self, unit: usize, state: &TextureMatrix) -> Result<()> {
        self.state(unit, Some(state))
    }

    fn bind_texture(&mut self, unit: usize, texture: Option<Handle>) -> Result<()> {
        if let Some(handle) = texture {
            if !self.textures.contains(handle) {
                return Err(Error::HandleInvalid(format!("Texture {}", handle)));
            }

            if !self.log.is_written(handle) {
                warn!("Samples {} at unit {} before anything was rendered into it.", handle, unit);
                self.log.0.borrow_mut().unwritten_reads.push(handle);
            }
        }

        self.log.push(Call::BindTexture { unit, texture });
        Ok(())
    }

    fn draw(&mut self, primitive: Primitive, first: u32, count: u32) -> Result<()> {
        let framebuffer = self.framebuffer;
        self.mark_written(framebuffer);
        self.log.push(Call::Draw {
            primitive,
            first,
            count,
            framebuffer,
        });

        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.log.push(Call::Flush);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn link() {
        let mut visitor = HeadlessVisitor::new();
        assert!(visitor.create_program(&GlslProgram::new()).is_err());
        assert!(visitor
            .create_program(&GlslProgram::with_sources("void main() {}", " "))
            .is_err());

        let program = GlslProgram::with_sources("void main() {}", "void main() {}");
        let handle = visitor.create_program(&program).unwrap();
        assert_eq!(visitor.log().calls(), vec![Call::CreateProgram(handle)]);
    }

    #[test]
    fn writes() {
        let mut visitor = HeadlessVisitor::new();
        let log = visitor.log();

        let texture = visitor.create_texture(&TextureParams::default()).unwrap();
        let fbo = visitor.create_framebuffer().unwrap();
        assert!(visitor.framebuffer_status(fbo).is_err());

        let target = AttachmentTarget::Texture {
            handle: texture,
            level: 0,
            layer: None,
        };

        visitor
            .framebuffer_attach(fbo, AttachmentPoint::Color(0), Some(target))
            .unwrap();
        visitor
            .framebuffer_draw_buffers(Some(fbo), &[DrawBuffer::ColorAttachment(1)])
            .unwrap();
        assert!(visitor.framebuffer_status(fbo).is_err());

        visitor
            .framebuffer_draw_buffers(Some(fbo), &[DrawBuffer::ColorAttachment(0)])
            .unwrap();
        assert!(visitor.framebuffer_status(fbo).is_ok());

        visitor.bind_texture(0, Some(texture)).unwrap();
        assert_eq!(log.unwritten_reads(), vec![texture]);

        visitor.bind_framebuffer(Some(fbo)).unwrap();
        visitor.draw(Primitive::Triangles, 0, 3).unwrap();
        assert!(log.is_written(texture));
        assert_eq!(log.draws(), 1);
    }

    #[test]
    fn invalid_handles() {
        let mut visitor = HeadlessVisitor::new();
        let texture = visitor.create_texture(&TextureParams::default()).unwrap();
        visitor.delete_texture(texture).unwrap();

        assert!(visitor.delete_texture(texture).is_err());
        assert!(visitor.bind_texture(0, Some(texture)).is_err());
        assert!(visitor.bind_framebuffer(Some(Handle::new(3, 1))).is_err());
    }
}
