use std::collections::BTreeMap;
use std::rc::Rc;

use crate::device::{Device, GpuSlot};
use crate::errors::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageKind {
    Vertex,
    TessControl,
    TessEvaluation,
    Geometry,
    Fragment,
}

/// The source of one programmable stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderStage {
    pub kind: StageKind,
    pub source: String,
    /// Where the source was loaded from, for diagnostics only.
    pub path: Option<String>,
}

/// A GLSL program object. It carries the stage sources plus the attribute and
/// fragment output bindings resolved at link time. Linking happens lazily the
/// first time a `Device` installs the program.
///
/// Clones share the linked program object with the original.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlslProgram {
    stages: Vec<ShaderStage>,
    attrib_locations: BTreeMap<String, u32>,
    frag_data_locations: BTreeMap<String, u32>,
    #[serde(skip)]
    revision: u32,
    #[serde(skip)]
    slot: Rc<GpuSlot>,
}

impl GlslProgram {
    pub fn new() -> Self {
        GlslProgram::default()
    }

    /// Creates a program made of a vertex and a fragment stage.
    pub fn with_sources<T1, T2>(vs: T1, fs: T2) -> Self
    where
        T1: Into<String>,
        T2: Into<String>,
    {
        let mut program = GlslProgram::new();
        program.attach(StageKind::Vertex, vs);
        program.attach(StageKind::Fragment, fs);
        program
    }

    /// Attaches a stage, replacing the stage of the same kind if any.
    pub fn attach<T: Into<String>>(&mut self, kind: StageKind, source: T) {
        let stage = ShaderStage {
            kind,
            source: source.into(),
            path: None,
        };

        if let Some(v) = self.stages.iter_mut().find(|v| v.kind == kind) {
            *v = stage;
        } else {
            self.stages.push(stage);
        }

        self.revision += 1;
    }

    pub fn detach(&mut self, kind: StageKind) -> Option<ShaderStage> {
        let index = self.stages.iter().position(|v| v.kind == kind)?;
        self.revision += 1;
        Some(self.stages.remove(index))
    }

    #[inline]
    pub fn stages(&self) -> &[ShaderStage] {
        &self.stages
    }

    pub fn stage(&self, kind: StageKind) -> Option<&ShaderStage> {
        self.stages.iter().find(|v| v.kind == kind)
    }

    pub fn bind_attrib_location<T: Into<String>>(&mut self, name: T, location: u32) {
        self.attrib_locations.insert(name.into(), location);
        self.revision += 1;
    }

    /// Binds the fragment output `name` to draw buffer `location`, used to route
    /// multiple outputs into several color attachments.
    pub fn bind_frag_data_location<T: Into<String>>(&mut self, name: T, location: u32) {
        self.frag_data_locations.insert(name.into(), location);
        self.revision += 1;
    }

    #[inline]
    pub fn attrib_locations(&self) -> &BTreeMap<String, u32> {
        &self.attrib_locations
    }

    #[inline]
    pub fn frag_data_locations(&self) -> &BTreeMap<String, u32> {
        &self.frag_data_locations
    }

    /// Bumped every time the program needs to be relinked.
    #[inline]
    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// Returns true if the current revision has been linked successfully.
    #[inline]
    pub fn is_linked(&self) -> bool {
        self.slot.is_current(self.revision)
    }

    /// Returns true if linking the current revision failed. The program will
    /// not be installed until it is modified.
    #[inline]
    pub fn is_link_failed(&self) -> bool {
        self.slot.is_failed(self.revision)
    }

    #[inline]
    pub(crate) fn slot(&self) -> &GpuSlot {
        &self.slot
    }

    pub fn apply(&self, _: usize, device: &mut Device) -> Result<()> {
        let handle = device.program_handle(self)?;
        device.use_program(handle)
    }
}

impl PartialEq for GlslProgram {
    fn eq(&self, other: &Self) -> bool {
        self.stages == other.stages
            && self.attrib_locations == other.attrib_locations
            && self.frag_data_locations == other.frag_data_locations
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn stages() {
        let mut program = GlslProgram::with_sources("void main() {}", "void main() {}");
        assert_eq!(program.stages().len(), 2);
        let rev = program.revision();

        program.attach(StageKind::Fragment, "out vec4 o_Color; void main() {}");
        assert_eq!(program.stages().len(), 2);
        assert!(program.revision() > rev);

        program.bind_frag_data_location("o_Color", 1);
        assert_eq!(program.frag_data_locations().get("o_Color"), Some(&1));

        assert!(program.detach(StageKind::Geometry).is_none());
        assert!(program.detach(StageKind::Vertex).is_some());
        assert!(program.stage(StageKind::Vertex).is_none());
        assert!(!program.is_linked());
    }
}
