//! The explicit graphics context. A `Device` owns the backend `Visitor`, the
//! capabilities of the implementation behind it, and a cache of the states it
//! has applied, so that consecutive shaders only pay for what differs.
//!
//! GPU objects are created lazily the first time their CPU owners are used
//! through the device, and deleted on the next `begin_frame` after the owner
//! has been dropped.

pub mod capabilities;
pub mod gpu;

pub use self::capabilities::{Capabilities, Feature, Version};
pub use self::gpu::{GpuObject, GpuSlot, ReleaseQueue};

use std::cell::RefCell;
use std::rc::Rc;

use crate::backends::{BlitMask, Primitive, Visitor};
use crate::errors::*;
use crate::framebuffer::{Attachment, AttachmentTarget, DrawBuffer, FramebufferObject, RenderTarget};
use crate::math::prelude::*;
use crate::settings::{DeviceParams, MAX_TEXTURE_UNITS};
use crate::shader::Shader;
use crate::states::*;
use crate::texture::{Renderbuffer, Texture, TextureFilter, TextureFormat};
use crate::utils::{FastHashMap, Handle};

/// Statistics of one frame, reset by `begin_frame`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    pub draws: u32,
    pub state_changes: u32,
    pub enable_changes: u32,
    pub program_binds: u32,
    pub texture_binds: u32,
    pub uniforms: u32,
    pub framebuffer_binds: u32,
}

struct MutableState {
    values: FastHashMap<RenderStateSlot, StateValue>,
    enables: EnableSet,
    program: Option<Handle>,
    textures: [Option<Handle>; MAX_TEXTURE_UNITS],
    framebuffer: Option<Option<Handle>>,
    screen_draw_buffer: Option<DrawBuffer>,
    viewport: Option<Rect>,
    scissor: Option<Option<Rect>>,
}

impl MutableState {
    fn new() -> Self {
        MutableState {
            values: FastHashMap::default(),
            enables: EnableSet::gl_defaults(),
            program: None,
            textures: [None; MAX_TEXTURE_UNITS],
            framebuffer: None,
            screen_draw_buffer: None,
            viewport: None,
            scissor: None,
        }
    }
}

pub struct Device {
    visitor: Box<dyn Visitor>,
    capabilities: Capabilities,
    params: DeviceParams,
    releases: ReleaseQueue,
    frame: FrameInfo,
    state: MutableState,
}

impl Device {
    pub fn new(
        visitor: Box<dyn Visitor>,
        capabilities: Capabilities,
        params: DeviceParams,
    ) -> Result<Self> {
        info!(
            "Creates device with {:?} ({} {}), features {:?}.",
            capabilities.version,
            capabilities.vendor,
            capabilities.renderer,
            capabilities.features().collect::<Vec<_>>()
        );

        if !params.state_cache {
            info!("State cache is disabled, every state will be applied on every pass.");
        }

        Ok(Device {
            visitor,
            capabilities,
            params,
            releases: Rc::new(RefCell::new(Vec::new())),
            frame: FrameInfo::default(),
            state: MutableState::new(),
        })
    }

    #[inline]
    pub fn visitor_mut(&mut self) -> &mut dyn Visitor {
        self.visitor.as_mut()
    }

    #[inline]
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    #[inline]
    pub fn params(&self) -> &DeviceParams {
        &self.params
    }

    /// Checks that `feature` is supported by the implementation.
    #[inline]
    pub fn require(&self, feature: Feature) -> Result<()> {
        self.capabilities.require(feature)
    }

    /// Deletes the GPU objects whose owners have been dropped, and resets the
    /// statistics.
    pub fn begin_frame(&mut self) -> Result<()> {
        self.collect_garbage()?;
        self.frame = FrameInfo::default();
        Ok(())
    }

    /// Returns the statistics of the frame.
    pub fn end_frame(&mut self) -> Result<FrameInfo> {
        self.visitor.flush()?;
        trace!("{:?}", self.frame);
        Ok(self.frame)
    }

    #[inline]
    pub fn frame_info(&self) -> FrameInfo {
        self.frame
    }

    /// Forgets everything about the backend state, the next pass applies every
    /// state it carries.
    pub fn invalidate(&mut self) {
        self.state = MutableState::new();
    }

    fn collect_garbage(&mut self) -> Result<()> {
        let objects: Vec<_> = self.releases.borrow_mut().drain(..).collect();
        for v in objects {
            self.release(v)?;
        }

        Ok(())
    }

    fn release(&mut self, object: GpuObject) -> Result<()> {
        debug!("Releases {:?}.", object);

        match object {
            GpuObject::Texture(handle) => {
                for v in self.state.textures.iter_mut() {
                    if *v == Some(handle) {
                        *v = None;
                    }
                }

                self.visitor.delete_texture(handle)
            }
            GpuObject::Renderbuffer(handle) => self.visitor.delete_renderbuffer(handle),
            GpuObject::Framebuffer(handle) => {
                if self.state.framebuffer == Some(Some(handle)) {
                    self.state.framebuffer = None;
                }

                self.visitor.delete_framebuffer(handle)
            }
            GpuObject::Program(handle) => {
                if self.state.program == Some(handle) {
                    self.state.program = None;
                }

                self.visitor.delete_program(handle)
            }
        }
    }

    fn release_slot(&mut self, slot: &GpuSlot) -> Result<()> {
        if let Some(v) = slot.take() {
            self.release(v)?;
        }

        Ok(())
    }
}

impl Device {
    /// Applies the render states, capabilities and uniforms of `shader`.
    ///
    /// Slots `shader` leaves unspecified are restored to `overrides`, or to the
    /// OpenGL defaults if no override exists for them.
    pub fn apply_shader(
        &mut self,
        shader: &Shader,
        overrides: &FastHashMap<RenderStateSlot, StateValue>,
    ) -> Result<()> {
        let mut wanted: Vec<(RenderStateSlot, StateValue)> = shader
            .render_states()
            .map(|set| set.iter().map(|(k, v)| (k, v.snapshot())).collect())
            .unwrap_or_default();

        for (k, v) in overrides {
            if !wanted.iter().any(|(slot, _)| slot == k) {
                wanted.push((*k, v.clone()));
            }
        }

        let stale: Vec<_> = self
            .state
            .values
            .keys()
            .filter(|k| !wanted.iter().any(|(slot, _)| slot == *k))
            .cloned()
            .collect();

        for slot in stale {
            self.state.values.remove(&slot);
            StateValue::restore_default(slot, self)?;
            self.frame.state_changes += 1;
        }

        for (slot, value) in wanted {
            let max = self.capabilities.max_index(slot.kind());
            if slot.index() >= max {
                error!(
                    "{:?} {} exceeds the limit {} of this implementation.",
                    slot.kind(),
                    slot.index(),
                    max
                );

                return Err(Error::IndexOutOfRange {
                    kind: slot.kind(),
                    index: slot.index(),
                    max,
                });
            }

            match slot.kind() {
                // Bindings are deduplicated by handle, since the GPU object
                // could be recreated without the state changing.
                RenderStateKind::GlslProgram | RenderStateKind::TextureSampler => {
                    value.apply(slot.index(), self)?;
                }
                _ => {
                    let dirty =
                        !self.params.state_cache || self.state.values.get(&slot) != Some(&value);

                    if dirty {
                        value.apply(slot.index(), self)?;
                        self.frame.state_changes += 1;
                    }
                }
            }

            self.state.values.insert(slot, value);
        }

        let enables = shader
            .enable_set()
            .map(|v| *v.borrow())
            .unwrap_or_default();
        self.apply_enables(&enables)?;

        if let Some(uniforms) = shader.uniforms() {
            self.apply_uniforms(uniforms)?;
        }

        Ok(())
    }

    /// Switches capabilities so that exactly those in `enables` are on.
    pub fn apply_enables(&mut self, enables: &EnableSet) -> Result<()> {
        let changes: Vec<_> = if self.params.state_cache {
            self.state.enables.diff(enables).collect()
        } else {
            Capability::ALL.to_vec()
        };

        for cap in changes {
            self.visitor.enable(cap, enables.is_enabled(cap))?;
            self.frame.enable_changes += 1;
        }

        self.state.enables = *enables;
        Ok(())
    }

    /// Uploads `uniforms` into the bound program.
    pub fn apply_uniforms(&mut self, uniforms: &UniformSet) -> Result<()> {
        if uniforms.is_empty() {
            return Ok(());
        }

        match self.state.program {
            Some(program) => {
                for (name, v) in uniforms.iter() {
                    self.visitor.uniform(program, name, v)?;
                    self.frame.uniforms += 1;
                }
            }
            None => {
                warn!(
                    "Drops {} uniforms since there is no program bound.",
                    uniforms.len()
                );
            }
        }

        Ok(())
    }

    /// Loads the transformation of the actor being drawn, both into the
    /// fixed-function pipeline and the well-known uniforms of the bound program.
    pub fn set_matrices(
        &mut self,
        projection: Matrix4<f32>,
        view: Matrix4<f32>,
        model: Matrix4<f32>,
    ) -> Result<()> {
        let modelview = view * model;
        self.visitor.load_matrices(&projection, &modelview)?;

        if let Some(program) = self.state.program {
            let normal = modelview
                .invert()
                .map(|v| v.transpose())
                .unwrap_or_else(Matrix4::identity);

            let mvp = projection * modelview;
            for &(name, m) in &[
                ("u_ProjectionMatrix", projection),
                ("u_ModelViewMatrix", modelview),
                ("u_MVPMatrix", mvp),
                ("u_ViewNormalMatrix", normal),
            ] {
                self.visitor.uniform(program, name, &m.into())?;
                self.frame.uniforms += 1;
            }
        }

        Ok(())
    }

    pub fn set_viewport(&mut self, rect: Rect) -> Result<()> {
        if self.params.state_cache && self.state.viewport == Some(rect) {
            return Ok(());
        }

        self.visitor.viewport(rect)?;
        self.state.viewport = Some(rect);
        Ok(())
    }

    pub fn set_scissor(&mut self, rect: Option<Rect>) -> Result<()> {
        if self.params.state_cache && self.state.scissor == Some(rect) {
            return Ok(());
        }

        self.visitor.scissor(rect)?;
        self.state.scissor = Some(rect);
        Ok(())
    }

    pub fn clear(
        &mut self,
        color: Option<Color>,
        depth: Option<f32>,
        stencil: Option<i32>,
    ) -> Result<()> {
        self.visitor.clear(color, depth, stencil)
    }

    pub fn draw(&mut self, primitive: Primitive, first: u32, count: u32) -> Result<()> {
        self.visitor.draw(primitive, first, count)?;
        self.frame.draws += 1;
        Ok(())
    }

    /// Installs `program`, `None` falls back to the fixed-function pipeline.
    pub fn use_program(&mut self, program: Option<Handle>) -> Result<()> {
        if self.params.state_cache && self.state.program == program {
            return Ok(());
        }

        self.visitor.use_program(program)?;
        self.state.program = program;
        self.frame.program_binds += 1;
        Ok(())
    }

    /// The program installed by the last `use_program`.
    #[inline]
    pub fn bound_program(&self) -> Option<Handle> {
        self.state.program
    }

    /// Binds `texture` to texture unit `unit`, creating its storage if needed.
    pub fn bind_texture(&mut self, unit: usize, texture: Option<&Texture>) -> Result<()> {
        let max = self.capabilities.max_index(RenderStateKind::TextureSampler);
        if unit >= max {
            return Err(Error::IndexOutOfRange {
                kind: RenderStateKind::TextureSampler,
                index: unit,
                max,
            });
        }

        let handle = match texture {
            Some(v) => Some(self.texture_handle(v)?),
            None => None,
        };

        if self.params.state_cache && self.state.textures[unit] == handle {
            return Ok(());
        }

        self.visitor.bind_texture(unit, handle)?;
        self.state.textures[unit] = handle;
        self.frame.texture_binds += 1;
        Ok(())
    }
}

impl Device {
    /// Returns the GPU storage of `texture`, (re)creating it if it does not
    /// match the current parameters.
    pub fn texture_handle(&mut self, texture: &Texture) -> Result<Handle> {
        let slot = texture.slot();
        let revision = texture.revision();

        if let Some(handle) = slot.handle() {
            if slot.is_current(revision) {
                return Ok(handle);
            }
        }

        self.release_slot(slot)?;

        let params = texture.params();
        let handle = self.visitor.create_texture(&params)?;
        slot.set(GpuObject::Texture(handle), revision, &self.releases);

        info!(
            "Creates {:?} texture {}x{} with {}.",
            params.format, params.width, params.height, handle
        );

        Ok(handle)
    }

    /// Returns the GPU storage of `renderbuffer`, (re)creating it if it does not
    /// match the current parameters.
    pub fn renderbuffer_handle(&mut self, renderbuffer: &Renderbuffer) -> Result<Handle> {
        let slot = renderbuffer.slot();
        let revision = renderbuffer.revision();

        if let Some(handle) = slot.handle() {
            if slot.is_current(revision) {
                return Ok(handle);
            }
        }

        self.release_slot(slot)?;

        let params = renderbuffer.params();
        if params.samples > 0 {
            self.require(Feature::FramebufferMultisample)?;
        }

        let handle = self.visitor.create_renderbuffer(&params)?;
        slot.set(GpuObject::Renderbuffer(handle), revision, &self.releases);

        info!(
            "Creates {:?} renderbuffer {}x{} with {}.",
            params.format, params.width, params.height, handle
        );

        Ok(handle)
    }

    /// Returns the linked program object, linking it if needed. A program
    /// that fails to link is reported once and then skipped until modified.
    pub fn program_handle(&mut self, program: &GlslProgram) -> Result<Option<Handle>> {
        let slot = program.slot();
        let revision = program.revision();

        if slot.is_current(revision) {
            return Ok(slot.handle());
        }

        if slot.is_failed(revision) {
            return Ok(None);
        }

        self.release_slot(slot)?;

        match self.visitor.create_program(program) {
            Ok(handle) => {
                slot.set(GpuObject::Program(handle), revision, &self.releases);
                Ok(Some(handle))
            }
            Err(Error::ProgramLink(log)) => {
                error!("Failed to link program, errors: \n{}", log);
                slot.set_failed(revision);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Creates the framebuffer object if needed, and brings its attachments up
    /// to date with the storage of the textures and renderbuffers attached.
    pub fn framebuffer_handle(&mut self, fbo: &FramebufferObject) -> Result<Handle> {
        self.require(Feature::FramebufferObject)?;

        let handle = match fbo.slot().handle() {
            Some(handle) => handle,
            None => {
                let handle = self.visitor.create_framebuffer()?;
                fbo.slot()
                    .set(GpuObject::Framebuffer(handle), 0, &self.releases);
                fbo.bound_attachments().borrow_mut().clear();
                info!(
                    "Creates framebuffer {}x{} with {}.",
                    fbo.width(),
                    fbo.height(),
                    handle
                );
                handle
            }
        };

        let mut wanted = Vec::new();
        for (point, attachment) in fbo.attachments() {
            let target = match *attachment {
                Attachment::Renderbuffer(ref v) => {
                    AttachmentTarget::Renderbuffer(self.renderbuffer_handle(v)?)
                }
                Attachment::Texture {
                    ref texture,
                    level,
                    layer,
                } => {
                    if layer.is_some() {
                        self.require(Feature::TextureArray)?;
                    }

                    AttachmentTarget::Texture {
                        handle: self.texture_handle(texture)?,
                        level,
                        layer,
                    }
                }
            };

            wanted.push((point, target));
        }

        let mut changed = fbo.take_dirty();
        {
            let mut bound = fbo.bound_attachments().borrow_mut();

            let detached: Vec<_> = bound
                .keys()
                .filter(|k| !wanted.iter().any(|(point, _)| point == *k))
                .cloned()
                .collect();

            for point in detached {
                self.visitor.framebuffer_attach(handle, point, None)?;
                bound.remove(&point);
                changed = true;
            }

            for (point, target) in wanted {
                if bound.get(&point) != Some(&target) {
                    self.visitor.framebuffer_attach(handle, point, Some(target))?;
                    bound.insert(point, target);
                    changed = true;
                }
            }
        }

        if changed {
            let buffers = fbo.draw_buffers();
            if buffers.len() > 1 {
                self.require(Feature::DrawBuffers)?;
            }

            self.visitor.framebuffer_draw_buffers(Some(handle), buffers)?;

            if self.params.check_framebuffer_status {
                if let Err(err) = self.visitor.framebuffer_status(handle) {
                    error!("Framebuffer {} is incomplete: {}", handle, err);
                    // Retries on the next bind.
                    fbo.bound_attachments().borrow_mut().clear();
                    return Err(err);
                }
            }
        }

        Ok(handle)
    }

    /// Directs the following draws into `target`.
    pub fn bind_target(&mut self, target: &RenderTarget) -> Result<()> {
        let framebuffer = match *target {
            RenderTarget::Screen(buffer) => {
                if self.state.screen_draw_buffer != Some(buffer) {
                    self.visitor.framebuffer_draw_buffers(None, &[buffer])?;
                    self.state.screen_draw_buffer = Some(buffer);
                }

                None
            }
            RenderTarget::Framebuffer(ref fbo) => Some(self.framebuffer_handle(&fbo.borrow())?),
        };

        if self.params.state_cache && self.state.framebuffer == Some(framebuffer) {
            return Ok(());
        }

        self.visitor.bind_framebuffer(framebuffer)?;
        self.state.framebuffer = Some(framebuffer);
        self.frame.framebuffer_binds += 1;
        Ok(())
    }

    fn target_handle(&mut self, target: &RenderTarget) -> Result<Option<Handle>> {
        match *target {
            RenderTarget::Screen(_) => Ok(None),
            RenderTarget::Framebuffer(ref fbo) => Ok(Some(self.framebuffer_handle(&fbo.borrow())?)),
        }
    }

    /// Copies a rectangle of pixels between two render targets.
    pub fn blit(
        &mut self,
        src: &RenderTarget,
        src_rect: Rect,
        dst: &RenderTarget,
        dst_rect: Rect,
        mask: BlitMask,
        filter: TextureFilter,
    ) -> Result<()> {
        self.require(Feature::FramebufferBlit)?;

        let src = self.target_handle(src)?;
        let dst = self.target_handle(dst)?;
        self.visitor
            .blit_framebuffer(src, src_rect, dst, dst_rect, mask, filter)?;

        // Blitting binds both framebuffers behind the cache's back.
        self.state.framebuffer = None;
        Ok(())
    }

    /// Reads back a rectangle of pixels of `target`.
    pub fn read_pixels(
        &mut self,
        target: &RenderTarget,
        rect: Rect,
        format: TextureFormat,
    ) -> Result<Vec<u8>> {
        self.bind_target(target)?;
        self.visitor.read_pixels(rect, format)
    }

    /// Copies a rectangle of pixels of `target` into level `level` of `texture`.
    pub fn copy_to_texture(
        &mut self,
        target: &RenderTarget,
        src: Rect,
        texture: &Texture,
        level: u32,
        offset: (i32, i32),
    ) -> Result<()> {
        self.bind_target(target)?;
        let handle = self.texture_handle(texture)?;
        self.visitor.copy_tex_sub_image(handle, level, src, offset)
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        // Cached values may own the last reference to textures or programs.
        self.state.values.clear();

        if let Err(err) = self.collect_garbage() {
            warn!("Failed to release GPU objects: {}", err);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::backends::headless::{Call, HeadlessVisitor};
    use crate::texture::TextureParams;
    use crate::utils::shared;

    fn device() -> (Device, crate::backends::headless::HeadlessLog) {
        let visitor = HeadlessVisitor::new();
        let log = visitor.log();
        let device = Device::new(
            Box::new(visitor),
            Capabilities::all(),
            DeviceParams::default(),
        )
        .unwrap();

        (device, log)
    }

    #[test]
    fn cached_states() {
        let (mut device, log) = device();
        let overrides = FastHashMap::default();

        let mut shader = Shader::new();
        shader.goc_depth_func().borrow_mut().func = Comparison::Greater;
        shader.enable(Capability::DepthTest);

        device.apply_shader(&shader, &overrides).unwrap();
        let n = log.calls().len();
        assert!(n > 0);

        device.apply_shader(&shader, &overrides).unwrap();
        assert_eq!(log.calls().len(), n);

        log.clear();
        device.apply_shader(&Shader::new(), &overrides).unwrap();
        let calls = log.calls();
        assert!(calls.contains(&Call::State {
            kind: RenderStateKind::DepthFunc,
            index: 0,
            value: Some(StateValue::DepthFunc(DepthFunc::default())),
        }));
        assert!(calls.contains(&Call::Enable(Capability::DepthTest, false)));
    }

    #[test]
    fn overrides() {
        let (mut device, log) = device();

        let mut overrides = FastHashMap::default();
        let mask = ColorMask::new(true, false, false, true);
        overrides.insert(
            RenderStateSlot::first(RenderStateKind::ColorMask),
            StateValue::ColorMask(mask),
        );

        device.apply_shader(&Shader::new(), &overrides).unwrap();
        assert!(log.calls().contains(&Call::State {
            kind: RenderStateKind::ColorMask,
            index: 0,
            value: Some(StateValue::ColorMask(mask)),
        }));
    }

    #[test]
    fn release() {
        let (mut device, log) = device();

        let texture = Texture::new(TextureParams::default());
        let handle = device.texture_handle(&texture).unwrap();
        assert_eq!(device.texture_handle(&texture).unwrap(), handle);

        texture.resize(32, 32);
        let recreated = device.texture_handle(&texture).unwrap();
        assert!(log.calls().contains(&Call::DeleteTexture(handle)));

        drop(texture);
        log.clear();
        device.begin_frame().unwrap();
        assert_eq!(log.calls(), vec![Call::DeleteTexture(recreated)]);
    }

    #[test]
    fn link_failure() {
        let (mut device, log) = device();

        let program = GlslProgram::with_sources("void main() {}", "");
        assert_eq!(device.program_handle(&program).unwrap(), None);
        assert!(program.is_link_failed());
        assert_eq!(device.program_handle(&program).unwrap(), None);
        assert!(log.calls().is_empty());

        let mut shader = Shader::new();
        shader.set_render_state(shared(program));
        device
            .apply_shader(&shader, &FastHashMap::default())
            .unwrap();
        assert_eq!(device.bound_program(), None);
    }

    #[test]
    fn limits() {
        let visitor = HeadlessVisitor::new();
        let caps = Capabilities::new(Version::GL(2, 1));
        let mut device = Device::new(Box::new(visitor), caps, DeviceParams::default()).unwrap();

        assert!(device.bind_texture(8, None).is_err());

        let mut shader = Shader::new();
        shader.goc_clip_plane(7).unwrap();
        assert!(device
            .apply_shader(&shader, &FastHashMap::default())
            .is_err());

        let fbo = shared(FramebufferObject::new(4, 4));
        assert!(device.bind_target(&RenderTarget::Framebuffer(fbo)).is_err());
    }
}
