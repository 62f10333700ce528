//! # What is This?
//!
//! `pigment` is a retained-mode rendering library built around an OpenGL-shaped
//! state model. Its core is the aggregation of render states into `Shader`s,
//! the sequencing of shaders into multi-pass, multi-LOD `Effect`s, and the
//! composition of `Rendering`s into ordered `RenderingTree`s that chain
//! render-to-texture passes.
//!
//! The library never talks to a GPU directly. Every state object maps itself
//! onto the calls of a `Visitor`, which is implemented by a backend. The
//! `HeadlessVisitor` shipped here records those calls and is what the tests
//! drive.
//!
//! ```rust
//! use pigment::prelude::*;
//!
//! let mut shader = Shader::new();
//! shader.enable(Capability::DepthTest);
//! shader.goc_depth_func().borrow_mut().func = Comparison::LessOrEqual;
//! shader.goc_material().borrow_mut().set_diffuse(Color::red());
//!
//! assert!(shader.is_enabled(Capability::DepthTest));
//! assert_eq!(shader.material().unwrap().borrow().front_diffuse(), Color::red());
//! ```

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;

#[macro_use]
pub mod utils;
pub mod errors;
pub mod math;
pub mod settings;

pub mod states;

pub mod actor;
pub mod camera;
pub mod effect;
pub mod scene;
pub mod shader;
pub mod transform;

pub mod framebuffer;
pub mod texture;

pub mod backends;
pub mod device;
pub mod rendering;

pub mod io;

pub mod prelude {
    pub use crate::errors::{Error, Result};
    pub use crate::math::prelude::*;
    pub use crate::settings::{DeviceParams, RenderingParams, Settings, SorterKind};
    pub use crate::utils::{shared, Shared};

    pub use crate::states::prelude::*;

    pub use crate::actor::{Actor, ActorEventCallback, DrawArrays, Renderable};
    pub use crate::camera::{Camera, Projection, Viewport};
    pub use crate::effect::{DistanceLodEvaluator, Effect, LodEvaluator, ShaderPasses};
    pub use crate::scene::{ActorCollection, SceneManager};
    pub use crate::shader::{Scissor, Shader, ShaderAnimator};
    pub use crate::transform::{TransformHandle, TransformTree};

    pub use crate::framebuffer::{
        Attachment, AttachmentPoint, DrawBuffer, FramebufferObject, RenderTarget,
    };
    pub use crate::texture::{
        Renderbuffer, RenderbufferParams, Texture, TextureFilter, TextureFormat, TextureParams,
        TextureTarget, TextureWrap,
    };

    pub use crate::backends::headless::{Call, HeadlessLog, HeadlessVisitor};
    pub use crate::backends::{BlitMask, Primitive, Visitor};
    pub use crate::device::{Capabilities, Device, Feature, FrameInfo, Version};

    pub use crate::rendering::callbacks::{BlitFramebuffer, CopyTexture, ReadPixels};
    pub use crate::rendering::sorter::{
        RenderQueueSorter, RenderQueueSorterBasic, RenderQueueSorterByShader,
        RenderQueueSorterOcclusion, RenderQueueSorterStandard,
    };
    pub use crate::rendering::{
        RenderEvent, RenderEventCallback, RenderToken, Renderer, Rendering, RenderingAbstract,
        RenderingTree,
    };

    pub use crate::io::{Archive, DataReader, DataWriter, Endianness};
}
