use std::cmp;

use crate::errors::*;
use crate::settings::{MAX_CLIP_PLANES, MAX_COLOR_ATTACHMENTS, MAX_LIGHTS, MAX_TEXTURE_UNITS};
use crate::states::RenderStateKind;

/// Describes a version.
///
/// A version can only be compared to another version if they belong to the same API.
/// For example, both `Version::GL(3, 0) >= Version::ES(3, 0)` and `Version::ES(3, 0) >=
/// Version::GL(3, 0)` return `false`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Version {
    /// Regular OpenGL.
    GL(u8, u8),
    /// OpenGL embedded system.
    ES(u8, u8),
}

impl PartialOrd for Version {
    #[inline]
    fn partial_cmp(&self, other: &Version) -> Option<cmp::Ordering> {
        let (es1, major1, minor1) = match *self {
            Version::GL(major, minor) => (false, major, minor),
            Version::ES(major, minor) => (true, major, minor),
        };

        let (es2, major2, minor2) = match *other {
            Version::GL(major, minor) => (false, major, minor),
            Version::ES(major, minor) => (true, major, minor),
        };

        if es1 != es2 {
            None
        } else {
            match major1.cmp(&major2) {
                cmp::Ordering::Equal => Some(minor1.cmp(&minor2)),
                v => Some(v),
            }
        }
    }
}

/// Optional functionalities of an OpenGL implementation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    FramebufferObject,
    FramebufferBlit,
    FramebufferMultisample,
    GeometryShader,
    TessellationShader,
    TextureArray,
    DrawBuffers,
    OcclusionQuery,
    /// The compatibility profile, with lights, fog, material and the other
    /// fixed-function states.
    FixedFunction,
}

impl Feature {
    const ALL: &'static [Feature] = &[
        Feature::FramebufferObject,
        Feature::FramebufferBlit,
        Feature::FramebufferMultisample,
        Feature::GeometryShader,
        Feature::TessellationShader,
        Feature::TextureArray,
        Feature::DrawBuffers,
        Feature::OcclusionQuery,
        Feature::FixedFunction,
    ];

    #[inline]
    fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

/// Represents the capabilities of the context.
///
/// Contrary to the state, these values never change. They are handed to the
/// `Device` explicitly when it is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub version: Version,
    /// The company responsible for this GL implementation.
    pub vendor: String,
    /// The name of the renderer.
    pub renderer: String,
    features: u32,
    /// Maximum number of texture units that could be bound at once.
    pub max_texture_units: usize,
    /// Maximum number of color attachment bind points.
    pub max_color_attachments: usize,
    pub max_lights: usize,
    pub max_clip_planes: usize,
}

impl Capabilities {
    /// A bare OpenGL implementation of `version` without optional features.
    pub fn new(version: Version) -> Self {
        Capabilities {
            version,
            vendor: String::new(),
            renderer: String::new(),
            features: 0,
            max_texture_units: 8,
            max_color_attachments: 1,
            max_lights: MAX_LIGHTS,
            max_clip_planes: 6,
        }
    }

    /// An implementation supporting every feature up to the compile-time limits.
    pub fn all() -> Self {
        let mut caps = Capabilities::new(Version::GL(4, 5));
        caps.vendor = "pigment".into();
        caps.renderer = "headless".into();
        caps.max_texture_units = MAX_TEXTURE_UNITS;
        caps.max_color_attachments = MAX_COLOR_ATTACHMENTS;
        caps.max_clip_planes = MAX_CLIP_PLANES;

        for &v in Feature::ALL {
            caps.features |= v.bit();
        }

        caps
    }

    pub fn with(mut self, feature: Feature) -> Self {
        self.features |= feature.bit();
        self
    }

    pub fn without(mut self, feature: Feature) -> Self {
        self.features &= !feature.bit();
        self
    }

    #[inline]
    pub fn has(&self, feature: Feature) -> bool {
        (self.features & feature.bit()) != 0
    }

    pub fn features(&self) -> impl Iterator<Item = Feature> + '_ {
        Feature::ALL.iter().cloned().filter(move |&v| self.has(v))
    }

    /// Checks that `feature` is supported.
    pub fn require(&self, feature: Feature) -> Result<()> {
        if self.has(feature) {
            Ok(())
        } else {
            error!("{:?} is not supported by {:?}.", feature, self.version);
            Err(Error::Requirement(format!("{:?}", feature)))
        }
    }

    /// The number of slots of `kind` usable with this implementation.
    pub fn max_index(&self, kind: RenderStateKind) -> usize {
        let limit = match kind {
            RenderStateKind::Light => self.max_lights,
            RenderStateKind::ClipPlane => self.max_clip_planes,
            RenderStateKind::TextureSampler
            | RenderStateKind::TexEnv
            | RenderStateKind::TexGen
            | RenderStateKind::TextureMatrix => self.max_texture_units,
            _ => 1,
        };

        limit.min(kind.max_index())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn version() {
        assert!(Version::GL(3, 3) > Version::GL(3, 0));
        assert!(Version::GL(4, 0) > Version::GL(3, 3));
        assert!(!(Version::GL(3, 0) >= Version::ES(3, 0)));
        assert!(!(Version::ES(3, 0) >= Version::GL(3, 0)));
    }

    #[test]
    fn require() {
        let caps = Capabilities::all().without(Feature::FramebufferBlit);
        assert!(caps.require(Feature::FramebufferObject).is_ok());
        assert!(caps.require(Feature::FramebufferBlit).is_err());
        assert!(!caps.features().any(|v| v == Feature::FramebufferBlit));

        let caps = Capabilities::new(Version::ES(2, 0)).with(Feature::FramebufferObject);
        assert!(caps.has(Feature::FramebufferObject));
        assert!(!caps.has(Feature::DrawBuffers));
        assert_eq!(caps.max_index(RenderStateKind::ClipPlane), 6);
        assert_eq!(caps.max_index(RenderStateKind::DepthFunc), 1);
    }
}
