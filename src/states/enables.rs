//! Boolean GPU capabilities toggled with `glEnable`/`glDisable`.

use std::fmt;

macro_rules! impl_capabilities {
    ($($name:ident,)*) => {
        /// Capabilities that could be switched on or off in a `Shader`.
        #[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum Capability {
            $($name,)*
        }

        impl Capability {
            /// All the capabilities, in discriminant order.
            pub const ALL: &'static [Capability] = &[$(Capability::$name,)*];
        }
    };
}

impl_capabilities!(
    AlphaTest,
    Blend,
    ColorLogicOp,
    CullFace,
    DepthClamp,
    DepthTest,
    Dither,
    Fog,
    Lighting,
    LineSmooth,
    LineStipple,
    Multisample,
    Normalize,
    PointSmooth,
    PointSprite,
    PolygonOffsetFill,
    PolygonOffsetLine,
    PolygonOffsetPoint,
    PolygonSmooth,
    PolygonStipple,
    PrimitiveRestart,
    ProgramPointSize,
    RescaleNormal,
    SampleAlphaToCoverage,
    SampleAlphaToOne,
    SampleCoverage,
    StencilTest,
    TextureCubeMapSeamless,
    ClipDistance0,
    ClipDistance1,
    ClipDistance2,
    ClipDistance3,
    ClipDistance4,
    ClipDistance5,
    ClipDistance6,
    ClipDistance7,
);

impl Capability {
    #[inline]
    fn bit(self) -> u64 {
        1u64 << (self as u64)
    }

    /// The user clip distance capability of `index`.
    pub fn clip_distance(index: usize) -> Option<Capability> {
        match index {
            0 => Some(Capability::ClipDistance0),
            1 => Some(Capability::ClipDistance1),
            2 => Some(Capability::ClipDistance2),
            3 => Some(Capability::ClipDistance3),
            4 => Some(Capability::ClipDistance4),
            5 => Some(Capability::ClipDistance5),
            6 => Some(Capability::ClipDistance6),
            7 => Some(Capability::ClipDistance7),
            _ => None,
        }
    }
}

/// A set of enabled `Capability`s. Enabling twice is a no-op.
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnableSet {
    bits: u64,
}

impl EnableSet {
    pub fn new() -> Self {
        EnableSet::default()
    }

    /// The capabilities OpenGL enables when a context is created.
    pub fn gl_defaults() -> Self {
        let mut set = EnableSet::new();
        set.enable(Capability::Dither);
        set.enable(Capability::Multisample);
        set
    }

    #[inline]
    pub fn enable(&mut self, cap: Capability) {
        self.bits |= cap.bit();
    }

    #[inline]
    pub fn disable(&mut self, cap: Capability) {
        self.bits &= !cap.bit();
    }

    #[inline]
    pub fn set(&mut self, cap: Capability, enabled: bool) {
        if enabled {
            self.enable(cap)
        } else {
            self.disable(cap)
        }
    }

    #[inline]
    pub fn is_enabled(&self, cap: Capability) -> bool {
        (self.bits & cap.bit()) != 0
    }

    #[inline]
    pub fn clear(&mut self) {
        self.bits = 0;
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Returns true if blending is enabled, which makes draws translucent.
    #[inline]
    pub fn is_blending(&self) -> bool {
        self.is_enabled(Capability::Blend)
    }

    /// Iterates the enabled capabilities in discriminant order.
    pub fn iter<'a>(&'a self) -> impl Iterator<Item = Capability> + 'a {
        Capability::ALL
            .iter()
            .cloned()
            .filter(move |&v| self.is_enabled(v))
    }

    /// Returns the capabilities whose state differs between `self` and `other`.
    pub fn diff<'a>(&'a self, other: &'a EnableSet) -> impl Iterator<Item = Capability> + 'a {
        let bits = self.bits ^ other.bits;
        Capability::ALL
            .iter()
            .cloned()
            .filter(move |&v| (bits & v.bit()) != 0)
    }
}

impl fmt::Debug for EnableSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn basic() {
        let mut set = EnableSet::new();
        assert!(set.is_empty());

        set.enable(Capability::DepthTest);
        set.enable(Capability::DepthTest);
        assert_eq!(set.len(), 1);
        assert!(set.is_enabled(Capability::DepthTest));

        set.enable(Capability::ClipDistance7);
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![Capability::DepthTest, Capability::ClipDistance7]
        );

        set.disable(Capability::DepthTest);
        assert!(!set.is_enabled(Capability::DepthTest));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn diff() {
        let mut a = EnableSet::new();
        a.enable(Capability::Blend);
        a.enable(Capability::CullFace);

        let mut b = EnableSet::new();
        b.enable(Capability::CullFace);
        b.enable(Capability::Lighting);

        assert_eq!(
            a.diff(&b).collect::<Vec<_>>(),
            vec![Capability::Blend, Capability::Lighting]
        );
        assert!(a.is_blending());
        assert!(!b.is_blending());
    }

    #[test]
    fn clip_distance() {
        assert_eq!(Capability::clip_distance(3), Some(Capability::ClipDistance3));
        assert_eq!(Capability::clip_distance(8), None);
        assert!(Capability::ALL.len() <= 64);
    }
}
