//! Render states are the atomic pieces of GPU configuration a `Shader` is made
//! of. Every kind of state is identified by a `RenderStateKind`, indexed kinds
//! (lights, clip planes and texture units) are further addressed by an index,
//! and the pair makes up a `RenderStateSlot`.
//!
//! States are shared by reference between shaders (`RenderState`), and copied
//! by value (`StateValue`) when the device caches what it has applied or an
//! archive serializes them.

pub mod enables;
pub mod types;
pub mod uniforms;

mod fixed;
mod indexed;
mod program;
mod set;

pub use self::enables::{Capability, EnableSet};
pub use self::fixed::*;
pub use self::indexed::{ClipPlane, Light, TexEnv, TexGen, TextureMatrix, TextureSampler};
pub use self::program::{GlslProgram, ShaderStage, StageKind};
pub use self::set::RenderStateSet;
pub use self::types::*;
pub use self::uniforms::{Uniform, UniformSet};

use crate::device::Device;
use crate::errors::*;
use crate::settings::{MAX_CLIP_PLANES, MAX_LIGHTS, MAX_TEXTURE_UNITS};
use crate::utils::{self, shared, Shared};

/// Types that could be stored in a `RenderStateSet`.
pub trait StateType: Default + Clone + Sized + 'static {
    /// The kind of slots this state occupies.
    const KIND: RenderStateKind;

    /// Wraps a shared state into `RenderState`.
    fn into_state(state: Shared<Self>) -> RenderState;

    /// Returns the shared state if `state` is of this type.
    fn from_state(state: &RenderState) -> Option<Shared<Self>>;

    /// Wraps a copy of this state into `StateValue`.
    fn into_value(self) -> StateValue;
}

macro_rules! impl_render_states {
    ($($kind:ident [$max:expr],)*) => {
        /// The closed set of render state kinds.
        #[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum RenderStateKind {
            $($kind,)*
        }

        impl RenderStateKind {
            pub const ALL: &'static [RenderStateKind] = &[$(RenderStateKind::$kind,)*];

            /// The number of slots of this kind. Kinds with a single slot are not
            /// indexed.
            pub fn max_index(self) -> usize {
                match self {
                    $(RenderStateKind::$kind => $max,)*
                }
            }
        }

        /// A shared, mutable render state.
        #[derive(Debug, Clone)]
        pub enum RenderState {
            $($kind(Shared<$kind>),)*
        }

        impl RenderState {
            pub fn kind(&self) -> RenderStateKind {
                match *self {
                    $(RenderState::$kind(_) => RenderStateKind::$kind,)*
                }
            }

            /// Copies the current value of this state.
            pub fn snapshot(&self) -> StateValue {
                match *self {
                    $(RenderState::$kind(ref v) => StateValue::$kind(v.borrow().clone()),)*
                }
            }

            /// Address of the shared state, which identifies the instance.
            pub fn address(&self) -> usize {
                match *self {
                    $(RenderState::$kind(ref v) => utils::address(v),)*
                }
            }
        }

        /// A render state by value.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub enum StateValue {
            $($kind($kind),)*
        }

        impl StateValue {
            pub fn kind(&self) -> RenderStateKind {
                match *self {
                    $(StateValue::$kind(_) => RenderStateKind::$kind,)*
                }
            }

            /// The OpenGL default of `kind`.
            pub fn default_of(kind: RenderStateKind) -> StateValue {
                match kind {
                    $(RenderStateKind::$kind => StateValue::$kind($kind::default()),)*
                }
            }

            /// Moves this value into a new shared `RenderState`.
            pub fn into_state(self) -> RenderState {
                match self {
                    $(StateValue::$kind(v) => RenderState::$kind(shared(v)),)*
                }
            }

            /// Maps this value onto the backend at `index`.
            pub fn apply(&self, index: usize, device: &mut Device) -> Result<()> {
                match *self {
                    $(StateValue::$kind(ref v) => v.apply(index, device),)*
                }
            }
        }

        $(
            impl StateType for $kind {
                const KIND: RenderStateKind = RenderStateKind::$kind;

                #[inline]
                fn into_state(state: Shared<Self>) -> RenderState {
                    RenderState::$kind(state)
                }

                #[inline]
                #[allow(unreachable_patterns)]
                fn from_state(state: &RenderState) -> Option<Shared<Self>> {
                    match *state {
                        RenderState::$kind(ref v) => Some(v.clone()),
                        _ => None,
                    }
                }

                #[inline]
                fn into_value(self) -> StateValue {
                    StateValue::$kind(self)
                }
            }
        )*
    };
}

impl_render_states!(
    VertexColor[1],
    CullFace[1],
    FrontFace[1],
    DepthFunc[1],
    DepthMask[1],
    DepthRange[1],
    PolygonMode[1],
    ShadeModel[1],
    BlendFunc[1],
    BlendEquation[1],
    BlendColor[1],
    AlphaFunc[1],
    Material[1],
    LightModel[1],
    Fog[1],
    PolygonOffset[1],
    LogicOp[1],
    LineWidth[1],
    LineStipple[1],
    PointSize[1],
    StencilFunc[1],
    StencilOp[1],
    StencilMask[1],
    SampleCoverage[1],
    ColorMask[1],
    GlslProgram[1],
    Light[MAX_LIGHTS],
    ClipPlane[MAX_CLIP_PLANES],
    TextureSampler[MAX_TEXTURE_UNITS],
    TexEnv[MAX_TEXTURE_UNITS],
    TexGen[MAX_TEXTURE_UNITS],
    TextureMatrix[MAX_TEXTURE_UNITS],
);

impl RenderStateKind {
    #[inline]
    pub fn is_indexed(self) -> bool {
        self.max_index() > 1
    }
}

impl<T: StateType> From<Shared<T>> for RenderState {
    fn from(state: Shared<T>) -> Self {
        T::into_state(state)
    }
}

impl RenderState {
    /// Returns true if both refer to the same shared instance.
    #[inline]
    pub fn ptr_eq(&self, other: &RenderState) -> bool {
        self.address() == other.address()
    }
}

impl StateValue {
    /// Restores the OpenGL default at `slot`. Lights and clip planes are
    /// switched off, texture units and the program are unbound.
    pub fn restore_default(slot: RenderStateSlot, device: &mut Device) -> Result<()> {
        match slot.kind() {
            RenderStateKind::Light => device.visitor_mut().light(slot.index(), None),
            RenderStateKind::ClipPlane => device.visitor_mut().clip_plane(slot.index(), None),
            RenderStateKind::TextureSampler => device.bind_texture(slot.index(), None),
            RenderStateKind::GlslProgram => device.use_program(None),
            kind => StateValue::default_of(kind).apply(slot.index(), device),
        }
    }
}

/// A `(kind, index)` pair addressing one entry of a `RenderStateSet`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RenderStateSlot {
    kind: RenderStateKind,
    index: u8,
}

impl RenderStateSlot {
    /// Creates a slot, fails with `IndexOutOfRange` if `index` exceeds the
    /// bound of `kind`.
    pub fn new(kind: RenderStateKind, index: usize) -> Result<Self> {
        let max = kind.max_index();
        if index >= max {
            return Err(Error::IndexOutOfRange { kind, index, max });
        }

        Ok(RenderStateSlot {
            kind,
            index: index as u8,
        })
    }

    /// The first slot of `kind`, which always exists.
    #[inline]
    pub fn first(kind: RenderStateKind) -> Self {
        RenderStateSlot { kind, index: 0 }
    }

    #[inline]
    pub fn kind(&self) -> RenderStateKind {
        self.kind
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

pub mod prelude {
    pub use super::enables::{Capability, EnableSet};
    pub use super::types::*;
    pub use super::uniforms::{Uniform, UniformSet};
    pub use super::{
        AlphaFunc, BlendColor, BlendEquation, BlendFunc, ClipPlane, ColorMask, CullFace,
        DepthFunc, DepthMask, DepthRange, Fog, FrontFace, GlslProgram, Light, LightModel,
        LineStipple, LineWidth, LogicOp, Material, MaterialFace, PointSize, PolygonMode,
        PolygonOffset, RenderState, RenderStateKind, RenderStateSet, RenderStateSlot,
        SampleCoverage, ShadeModel, ShaderStage, StageKind, StateType, StateValue, StencilFunc,
        StencilMask, StencilOp, TexEnv, TexGen, TextureMatrix, TextureSampler, VertexColor,
    };
}
