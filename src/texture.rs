//! Textures and renderbuffers. Both are shared by reference (`Rc`) between the
//! framebuffers that render into them and the shaders that sample them.
//!
//! Neither could be resized in place: changing the size bumps a revision and
//! the `Device` deletes and recreates the GPU storage the next time it is used.

use std::cell::{Cell, RefCell};

use crate::device::GpuSlot;
use crate::utils::Handle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureTarget {
    Texture1D,
    Texture2D,
    Texture3D,
    TextureCubeMap,
    Texture2DArray,
    TextureRectangle,
    Texture2DMultisample,
}

/// Internal formats of textures and renderbuffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureFormat {
    R8,
    RG8,
    RGB8,
    RGBA8,
    R16F,
    RGBA16F,
    R32F,
    RG32F,
    RGBA32F,
    Depth16,
    Depth24,
    Depth32F,
    Depth24Stencil8,
    Stencil8,
}

impl TextureFormat {
    pub fn is_depth(self) -> bool {
        match self {
            TextureFormat::Depth16
            | TextureFormat::Depth24
            | TextureFormat::Depth32F
            | TextureFormat::Depth24Stencil8 => true,
            _ => false,
        }
    }

    pub fn is_stencil(self) -> bool {
        match self {
            TextureFormat::Depth24Stencil8 | TextureFormat::Stencil8 => true,
            _ => false,
        }
    }

    pub fn is_color(self) -> bool {
        !self.is_depth() && !self.is_stencil()
    }

    /// Size of one pixel in bytes.
    pub fn size(self) -> u32 {
        match self {
            TextureFormat::R8 | TextureFormat::Stencil8 => 1,
            TextureFormat::RG8 | TextureFormat::R16F | TextureFormat::Depth16 => 2,
            TextureFormat::RGB8 | TextureFormat::Depth24 => 3,
            TextureFormat::RGBA8
            | TextureFormat::R32F
            | TextureFormat::Depth32F
            | TextureFormat::Depth24Stencil8 => 4,
            TextureFormat::RGBA16F | TextureFormat::RG32F => 8,
            TextureFormat::RGBA32F => 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureWrap {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureParams {
    pub target: TextureTarget,
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    /// Depth of 3D textures, or the number of layers of texture arrays.
    pub depth: u32,
    pub samples: u32,
    pub mipmaps: bool,
    pub filter: TextureFilter,
    pub wrap: TextureWrap,
}

impl Default for TextureParams {
    fn default() -> Self {
        TextureParams {
            target: TextureTarget::Texture2D,
            format: TextureFormat::RGBA8,
            width: 1,
            height: 1,
            depth: 1,
            samples: 0,
            mipmaps: false,
            filter: TextureFilter::Linear,
            wrap: TextureWrap::ClampToEdge,
        }
    }
}

impl TextureParams {
    pub fn new(format: TextureFormat, width: u32, height: u32) -> Self {
        TextureParams {
            format,
            width,
            height,
            ..Default::default()
        }
    }
}

/// A texture object.
#[derive(Debug, Serialize, Deserialize)]
pub struct Texture {
    params: RefCell<TextureParams>,
    #[serde(skip)]
    revision: Cell<u32>,
    #[serde(skip)]
    slot: GpuSlot,
}

impl Texture {
    pub fn new(params: TextureParams) -> Self {
        Texture {
            params: RefCell::new(params),
            revision: Cell::new(0),
            slot: GpuSlot::default(),
        }
    }

    #[inline]
    pub fn params(&self) -> TextureParams {
        *self.params.borrow()
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        let params = self.params.borrow();
        (params.width, params.height)
    }

    /// Replaces the parameters, the GPU storage is recreated if they differ.
    pub fn set_params(&self, params: TextureParams) {
        if *self.params.borrow() != params {
            *self.params.borrow_mut() = params;
            self.revision.set(self.revision.get() + 1);
        }
    }

    /// Changes the size, the GPU storage is recreated if it differs.
    pub fn resize(&self, width: u32, height: u32) {
        let mut params = self.params();
        params.width = width;
        params.height = height;
        self.set_params(params);
    }

    #[inline]
    pub fn revision(&self) -> u32 {
        self.revision.get()
    }

    /// The GPU handle of this texture, if it has been created by a device.
    #[inline]
    pub fn handle(&self) -> Option<Handle> {
        self.slot.handle()
    }

    #[inline]
    pub(crate) fn slot(&self) -> &GpuSlot {
        &self.slot
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderbufferParams {
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    pub samples: u32,
}

impl RenderbufferParams {
    pub fn new(format: TextureFormat, width: u32, height: u32) -> Self {
        RenderbufferParams {
            format,
            width,
            height,
            samples: 0,
        }
    }
}

/// A renderbuffer object, a render target that could not be sampled.
#[derive(Debug)]
pub struct Renderbuffer {
    params: Cell<RenderbufferParams>,
    revision: Cell<u32>,
    slot: GpuSlot,
}

impl Renderbuffer {
    pub fn new(params: RenderbufferParams) -> Self {
        Renderbuffer {
            params: Cell::new(params),
            revision: Cell::new(0),
            slot: GpuSlot::default(),
        }
    }

    #[inline]
    pub fn params(&self) -> RenderbufferParams {
        self.params.get()
    }

    /// Changes the size, the GPU storage is recreated if it differs.
    pub fn resize(&self, width: u32, height: u32) {
        let mut params = self.params.get();
        if params.width != width || params.height != height {
            params.width = width;
            params.height = height;
            self.params.set(params);
            self.revision.set(self.revision.get() + 1);
        }
    }

    /// Changes the number of samples, the GPU storage is recreated if it differs.
    pub fn set_samples(&self, samples: u32) {
        let mut params = self.params.get();
        if params.samples != samples {
            params.samples = samples;
            self.params.set(params);
            self.revision.set(self.revision.get() + 1);
        }
    }

    #[inline]
    pub fn revision(&self) -> u32 {
        self.revision.get()
    }

    #[inline]
    pub fn handle(&self) -> Option<Handle> {
        self.slot.handle()
    }

    #[inline]
    pub(crate) fn slot(&self) -> &GpuSlot {
        &self.slot
    }
}
