//! Render targets: the default framebuffer, or framebuffer objects with color,
//! depth and stencil attachments.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::device::GpuSlot;
use crate::errors::*;
use crate::math::Rect;
use crate::settings::MAX_COLOR_ATTACHMENTS;
use crate::texture::{Renderbuffer, Texture};
use crate::utils::{Handle, Shared};

/// The attachment points of a framebuffer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttachmentPoint {
    Color(u8),
    Depth,
    Stencil,
    DepthStencil,
}

impl AttachmentPoint {
    /// The color attachment point `index`.
    pub fn color(index: usize) -> Result<Self> {
        if index >= MAX_COLOR_ATTACHMENTS {
            return Err(Error::TooManyColorAttachments);
        }

        Ok(AttachmentPoint::Color(index as u8))
    }

    /// The OpenGL enumeration of this attachment point.
    pub fn gl_enum(self) -> u32 {
        match self {
            AttachmentPoint::Color(i) => 0x8CE0 + u32::from(i),
            AttachmentPoint::Depth => 0x8D00,
            AttachmentPoint::Stencil => 0x8D20,
            AttachmentPoint::DepthStencil => 0x821A,
        }
    }
}

/// The color buffers fragment outputs are written into, in output location order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrawBuffer {
    None,
    BackLeft,
    ColorAttachment(u8),
}

impl DrawBuffer {
    pub fn color(index: usize) -> Result<Self> {
        if index >= MAX_COLOR_ATTACHMENTS {
            return Err(Error::TooManyColorAttachments);
        }

        Ok(DrawBuffer::ColorAttachment(index as u8))
    }

    /// The OpenGL enumeration of this draw buffer.
    pub fn gl_enum(self) -> u32 {
        match self {
            DrawBuffer::None => 0,
            DrawBuffer::BackLeft => 0x0402,
            DrawBuffer::ColorAttachment(i) => 0x8CE0 + u32::from(i),
        }
    }
}

/// Something attached to a framebuffer object.
#[derive(Debug, Clone)]
pub enum Attachment {
    Renderbuffer(Rc<Renderbuffer>),
    Texture {
        texture: Rc<Texture>,
        level: u32,
        /// Layer of 3D, cube map or array textures.
        layer: Option<u32>,
    },
}

impl Attachment {
    pub fn texture(&self) -> Option<&Rc<Texture>> {
        match *self {
            Attachment::Texture { ref texture, .. } => Some(texture),
            _ => None,
        }
    }

    pub fn renderbuffer(&self) -> Option<&Rc<Renderbuffer>> {
        match *self {
            Attachment::Renderbuffer(ref v) => Some(v),
            _ => None,
        }
    }

    fn format(&self) -> crate::texture::TextureFormat {
        match *self {
            Attachment::Renderbuffer(ref v) => v.params().format,
            Attachment::Texture { ref texture, .. } => texture.params().format,
        }
    }

    fn resize(&self, width: u32, height: u32) {
        match *self {
            Attachment::Renderbuffer(ref v) => v.resize(width, height),
            Attachment::Texture { ref texture, .. } => texture.resize(width, height),
        }
    }
}

/// The GPU side of an `Attachment`, as handed to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentTarget {
    Renderbuffer(Handle),
    Texture {
        handle: Handle,
        level: u32,
        layer: Option<u32>,
    },
}

/// An off-screen render target. Every attachment point is occupied by at most
/// one attachment, adding an attachment at an occupied point replaces it.
#[derive(Debug)]
pub struct FramebufferObject {
    width: u32,
    height: u32,
    attachments: BTreeMap<AttachmentPoint, Attachment>,
    draw_buffers: SmallVec<[DrawBuffer; 4]>,
    dirty: Cell<bool>,
    bound: RefCell<BTreeMap<AttachmentPoint, AttachmentTarget>>,
    slot: GpuSlot,
}

impl FramebufferObject {
    /// Creates an empty framebuffer object, drawing into color attachment 0.
    pub fn new(width: u32, height: u32) -> Self {
        let mut draw_buffers = SmallVec::new();
        draw_buffers.push(DrawBuffer::ColorAttachment(0));

        FramebufferObject {
            width,
            height,
            attachments: BTreeMap::new(),
            draw_buffers,
            dirty: Cell::new(true),
            bound: RefCell::new(BTreeMap::new()),
            slot: GpuSlot::default(),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::with_size(self.width, self.height)
    }

    /// Changes the size of the framebuffer and all of its attachments. Storage
    /// is not resizable in place, the attachments are recreated and reattached
    /// the next time this framebuffer is bound.
    pub fn set_size(&mut self, width: u32, height: u32) {
        if self.width == width && self.height == height {
            return;
        }

        info!(
            "Resizes framebuffer from {}x{} to {}x{}.",
            self.width, self.height, width, height
        );

        self.width = width;
        self.height = height;
        for v in self.attachments.values() {
            v.resize(width, height);
        }

        self.dirty.set(true);
    }

    /// Attaches a renderbuffer at color attachment `index`, returns the attachment
    /// it replaced.
    pub fn add_color_attachment(
        &mut self,
        index: usize,
        renderbuffer: Rc<Renderbuffer>,
    ) -> Result<Option<Attachment>> {
        let point = AttachmentPoint::color(index)?;
        self.attach(point, Attachment::Renderbuffer(renderbuffer))
    }

    /// Attaches a depth renderbuffer. Formats with a stencil component are
    /// attached at the combined depth-stencil point.
    pub fn add_depth_attachment(
        &mut self,
        renderbuffer: Rc<Renderbuffer>,
    ) -> Result<Option<Attachment>> {
        let point = if renderbuffer.params().format.is_stencil() {
            AttachmentPoint::DepthStencil
        } else {
            AttachmentPoint::Depth
        };

        self.attach(point, Attachment::Renderbuffer(renderbuffer))
    }

    pub fn add_stencil_attachment(
        &mut self,
        renderbuffer: Rc<Renderbuffer>,
    ) -> Result<Option<Attachment>> {
        self.attach(
            AttachmentPoint::Stencil,
            Attachment::Renderbuffer(renderbuffer),
        )
    }

    /// Attaches level `level` of a texture at `point`, returns the attachment it
    /// replaced. The texture could then be sampled by later renderings.
    pub fn add_texture_attachment(
        &mut self,
        point: AttachmentPoint,
        texture: Rc<Texture>,
        level: u32,
        layer: Option<u32>,
    ) -> Result<Option<Attachment>> {
        self.attach(
            point,
            Attachment::Texture {
                texture,
                level,
                layer,
            },
        )
    }

    fn attach(
        &mut self,
        point: AttachmentPoint,
        attachment: Attachment,
    ) -> Result<Option<Attachment>> {
        let format = attachment.format();
        let valid = match point {
            AttachmentPoint::Color(i) => {
                if i as usize >= MAX_COLOR_ATTACHMENTS {
                    return Err(Error::TooManyColorAttachments);
                }
                format.is_color()
            }
            AttachmentPoint::Depth => format.is_depth(),
            AttachmentPoint::Stencil => format.is_stencil(),
            AttachmentPoint::DepthStencil => format.is_depth() && format.is_stencil(),
        };

        if !valid {
            return Err(Error::InvalidAttachment(
                point,
                format!("format {:?} could not be attached here", format),
            ));
        }

        self.dirty.set(true);
        Ok(self.attachments.insert(point, attachment))
    }

    pub fn remove_attachment(&mut self, point: AttachmentPoint) -> Option<Attachment> {
        let v = self.attachments.remove(&point);
        if v.is_some() {
            self.dirty.set(true);
        }
        v
    }

    pub fn remove_all_attachments(&mut self) {
        self.attachments.clear();
        self.dirty.set(true);
    }

    #[inline]
    pub fn attachment(&self, point: AttachmentPoint) -> Option<&Attachment> {
        self.attachments.get(&point)
    }

    pub fn attachments(&self) -> impl Iterator<Item = (AttachmentPoint, &Attachment)> {
        self.attachments.iter().map(|(k, v)| (*k, v))
    }

    /// The textures this framebuffer renders into.
    pub fn textures(&self) -> Vec<Rc<Texture>> {
        self.attachments
            .values()
            .filter_map(|v| v.texture().cloned())
            .collect()
    }

    pub fn set_draw_buffer(&mut self, buffer: DrawBuffer) {
        self.draw_buffers.clear();
        self.draw_buffers.push(buffer);
        self.dirty.set(true);
    }

    /// Selects the color attachments the fragment outputs are written into. The
    /// selection is independent of which attachments exist.
    pub fn set_draw_buffers(&mut self, buffers: &[DrawBuffer]) -> Result<()> {
        if buffers.len() > MAX_COLOR_ATTACHMENTS {
            return Err(Error::TooManyColorAttachments);
        }

        self.draw_buffers.clear();
        self.draw_buffers.extend_from_slice(buffers);
        self.dirty.set(true);
        Ok(())
    }

    #[inline]
    pub fn draw_buffers(&self) -> &[DrawBuffer] {
        &self.draw_buffers
    }

    /// The GPU handle, if this framebuffer has been created by a device.
    #[inline]
    pub fn handle(&self) -> Option<Handle> {
        self.slot.handle()
    }

    #[inline]
    pub(crate) fn slot(&self) -> &GpuSlot {
        &self.slot
    }

    #[inline]
    pub(crate) fn take_dirty(&self) -> bool {
        self.dirty.replace(false)
    }

    #[inline]
    pub(crate) fn bound_attachments(&self) -> &RefCell<BTreeMap<AttachmentPoint, AttachmentTarget>> {
        &self.bound
    }
}

/// Where a `Renderer` draws into.
#[derive(Debug, Clone)]
pub enum RenderTarget {
    /// The default framebuffer of the context.
    Screen(DrawBuffer),
    Framebuffer(Shared<FramebufferObject>),
}

impl Default for RenderTarget {
    fn default() -> Self {
        RenderTarget::Screen(DrawBuffer::BackLeft)
    }
}

impl RenderTarget {
    /// The textures written when drawing into this target.
    pub fn textures(&self) -> Vec<Rc<Texture>> {
        match *self {
            RenderTarget::Screen(_) => Vec::new(),
            RenderTarget::Framebuffer(ref fbo) => fbo.borrow().textures(),
        }
    }

    pub fn framebuffer(&self) -> Option<&Shared<FramebufferObject>> {
        match *self {
            RenderTarget::Framebuffer(ref fbo) => Some(fbo),
            _ => None,
        }
    }
}

impl From<Shared<FramebufferObject>> for RenderTarget {
    fn from(fbo: Shared<FramebufferObject>) -> Self {
        RenderTarget::Framebuffer(fbo)
    }
}
