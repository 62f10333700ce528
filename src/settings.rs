//! Functions for loading rendering settings.

use std::path::Path;

use crate::errors::*;

/// Number of fixed-function lights a `Shader` could address.
pub const MAX_LIGHTS: usize = 8;
/// Number of user clip planes a `Shader` could address.
pub const MAX_CLIP_PLANES: usize = 8;
/// Number of texture units a `Shader` could address.
pub const MAX_TEXTURE_UNITS: usize = 16;
/// Number of color attachments of a `FramebufferObject`.
pub const MAX_COLOR_ATTACHMENTS: usize = 8;

/// A structure containing configuration data for the device and the renderings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub device: DeviceParams,
    pub rendering: RenderingParams,
}

impl Settings {
    /// Parses settings from JSON, missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(::serde_json::from_str(json)?)
    }

    /// Loads settings from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = ::std::fs::read_to_string(path.as_ref())?;
        info!("Loads settings from {:?}.", path.as_ref());
        Self::from_json(&json)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceParams {
    /// Skips render states whose value equals what was applied last.
    pub state_cache: bool,
    /// Queries the completeness of framebuffers after (re)attaching.
    pub check_framebuffer_status: bool,
}

impl Default for DeviceParams {
    fn default() -> Self {
        DeviceParams {
            state_cache: true,
            check_framebuffer_status: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SorterKind {
    Basic,
    Standard,
    ByShader,
    Occlusion,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderingParams {
    /// Actors and scene managers are drawn only if they share a bit with it.
    pub enable_mask: u32,
    pub sorter: SorterKind,
    /// Sorts translucent draws back to front.
    pub depth_sort: bool,
    /// Updates the world matrices of the transform tree before rendering.
    pub auto_update_transforms: bool,
    /// Runs the `ShaderAnimator`s before drawing.
    pub shader_animation: bool,
    /// Selects effect and renderable LODs with the LOD evaluators.
    pub evaluate_lod: bool,
}

impl Default for RenderingParams {
    fn default() -> Self {
        RenderingParams {
            enable_mask: 0xFFFF_FFFF,
            sorter: SorterKind::Standard,
            depth_sort: true,
            auto_update_transforms: true,
            shader_animation: true,
            evaluate_lod: true,
        }
    }
}
