//! Render event callbacks that move pixels around once a rendering is done:
//! resolving into another target, reading back into memory, or copying into a
//! texture.

use std::rc::Rc;

use super::{RenderEvent, RenderEventCallback};
use crate::backends::BlitMask;
use crate::device::Device;
use crate::errors::*;
use crate::framebuffer::RenderTarget;
use crate::math::Rect;
use crate::texture::{Texture, TextureFilter, TextureFormat};
use crate::utils::{shared, Shared};

/// Copies a rectangle of `src` into `dst`, typically to resolve a multisampled
/// framebuffer.
#[derive(Debug, Clone)]
pub struct BlitFramebuffer {
    pub src: RenderTarget,
    pub src_rect: Rect,
    pub dst: RenderTarget,
    pub dst_rect: Rect,
    pub mask: BlitMask,
    pub filter: TextureFilter,
    pub event: RenderEvent,
    pub one_shot: bool,
}

impl BlitFramebuffer {
    pub fn new(src: RenderTarget, dst: RenderTarget, rect: Rect) -> Self {
        BlitFramebuffer {
            src,
            src_rect: rect,
            dst,
            dst_rect: rect,
            mask: BlitMask::color(),
            filter: TextureFilter::Nearest,
            event: RenderEvent::Finished,
            one_shot: false,
        }
    }

    fn execute(&self, device: &mut Device) -> Result<()> {
        device.blit(
            &self.src,
            self.src_rect,
            &self.dst,
            self.dst_rect,
            self.mask,
            self.filter,
        )
    }
}

impl RenderEventCallback for BlitFramebuffer {
    fn on_rendering_started(&mut self, device: &mut Device) -> Result<()> {
        if self.event == RenderEvent::Started {
            self.execute(device)?;
        }

        Ok(())
    }

    fn on_rendering_finished(&mut self, device: &mut Device) -> Result<()> {
        if self.event == RenderEvent::Finished {
            self.execute(device)?;
        }

        Ok(())
    }

    fn is_one_shot(&self) -> bool {
        self.one_shot
    }
}

/// Reads back the pixels of a render target. The result is replaced on every
/// invocation and could be inspected through `pixels`.
#[derive(Debug, Clone)]
pub struct ReadPixels {
    pub target: RenderTarget,
    pub rect: Rect,
    pub format: TextureFormat,
    pub event: RenderEvent,
    pub one_shot: bool,
    pixels: Shared<Vec<u8>>,
}

impl ReadPixels {
    pub fn new(target: RenderTarget, rect: Rect, format: TextureFormat) -> Self {
        ReadPixels {
            target,
            rect,
            format,
            event: RenderEvent::Finished,
            one_shot: false,
            pixels: shared(Vec::new()),
        }
    }

    /// The pixels read by the last invocation, shared with clones of this
    /// callback.
    #[inline]
    pub fn pixels(&self) -> Shared<Vec<u8>> {
        self.pixels.clone()
    }

    fn execute(&self, device: &mut Device) -> Result<()> {
        let bytes = device.read_pixels(&self.target, self.rect, self.format)?;
        *self.pixels.borrow_mut() = bytes;
        Ok(())
    }
}

impl RenderEventCallback for ReadPixels {
    fn on_rendering_started(&mut self, device: &mut Device) -> Result<()> {
        if self.event == RenderEvent::Started {
            self.execute(device)?;
        }

        Ok(())
    }

    fn on_rendering_finished(&mut self, device: &mut Device) -> Result<()> {
        if self.event == RenderEvent::Finished {
            self.execute(device)?;
        }

        Ok(())
    }

    fn is_one_shot(&self) -> bool {
        self.one_shot
    }
}

/// Copies a rectangle of a render target into a texture.
#[derive(Debug, Clone)]
pub struct CopyTexture {
    pub target: RenderTarget,
    pub rect: Rect,
    pub texture: Rc<Texture>,
    pub level: u32,
    pub offset: (i32, i32),
    pub event: RenderEvent,
    pub one_shot: bool,
}

impl CopyTexture {
    pub fn new(target: RenderTarget, rect: Rect, texture: Rc<Texture>) -> Self {
        CopyTexture {
            target,
            rect,
            texture,
            level: 0,
            offset: (0, 0),
            event: RenderEvent::Finished,
            one_shot: false,
        }
    }

    fn execute(&self, device: &mut Device) -> Result<()> {
        device.copy_to_texture(&self.target, self.rect, &self.texture, self.level, self.offset)
    }
}

impl RenderEventCallback for CopyTexture {
    fn on_rendering_started(&mut self, device: &mut Device) -> Result<()> {
        if self.event == RenderEvent::Started {
            self.execute(device)?;
        }

        Ok(())
    }

    fn on_rendering_finished(&mut self, device: &mut Device) -> Result<()> {
        if self.event == RenderEvent::Finished {
            self.execute(device)?;
        }

        Ok(())
    }

    fn is_one_shot(&self) -> bool {
        self.one_shot
    }

    fn written_textures(&self) -> Vec<Rc<Texture>> {
        vec![self.texture.clone()]
    }
}
