//! Serialization of shaders and effects.
//!
//! Render states and enable sets are written once into shared tables, and
//! shaders refer to them by index. Importing an archive rebuilds one instance
//! per table entry, so states that were shared before exporting are still
//! shared after importing.
//!
//! Textures bound by `TextureSampler` states are stored by parameters, and
//! become new texture objects on import.

use crate::effect::Effect;
use crate::errors::*;
use crate::shader::{Scissor, Shader};
use crate::states::{EnableSet, RenderState, RenderStateSlot, StateValue, UniformSet};
use crate::utils::{self, shared, FastHashMap, Shared};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ShaderRecord {
    states: Vec<(RenderStateSlot, usize)>,
    enables: Option<usize>,
    uniforms: Option<UniformSet>,
    scissor: Option<Scissor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EffectRecord {
    lods: Vec<Vec<usize>>,
    render_rank: i32,
    enable_mask: u32,
}

/// Objects written into an archive. They are kept alive so that their
/// addresses are not reused by other allocations while the archive exists.
#[derive(Debug, Clone)]
enum Exported {
    State(RenderState),
    Enables(Shared<EnableSet>),
    Shader(Shared<Shader>),
    Effect(Shared<Effect>),
}

/// Shaders and effects imported from an `Archive`, in export order.
#[derive(Debug, Default)]
pub struct Imported {
    pub shaders: Vec<Shared<Shader>>,
    pub effects: Vec<Shared<Effect>>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Archive {
    states: Vec<StateValue>,
    enables: Vec<EnableSet>,
    shaders: Vec<ShaderRecord>,
    effects: Vec<EffectRecord>,

    #[serde(skip)]
    state_indices: FastHashMap<usize, usize>,
    #[serde(skip)]
    enable_indices: FastHashMap<usize, usize>,
    #[serde(skip)]
    shader_indices: FastHashMap<usize, usize>,
    #[serde(skip)]
    effect_indices: FastHashMap<usize, usize>,
    #[serde(skip)]
    exported: Vec<Exported>,
}

impl Archive {
    pub fn new() -> Self {
        Archive::default()
    }

    #[inline]
    pub fn shader_count(&self) -> usize {
        self.shaders.len()
    }

    #[inline]
    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    /// Number of distinct render states written.
    #[inline]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Writes `shader` into the archive and returns its index. Exporting the
    /// same shader twice writes it once.
    pub fn export_shader(&mut self, shared_shader: &Shared<Shader>) -> usize {
        let address = utils::address(shared_shader);
        if let Some(&index) = self.shader_indices.get(&address) {
            return index;
        }

        self.exported.push(Exported::Shader(shared_shader.clone()));
        let shader = shared_shader.borrow();

        let mut states = Vec::new();
        if let Some(set) = shader.render_states() {
            for (slot, state) in set.iter() {
                states.push((slot, self.export_state(state)));
            }
        }

        let enables = shader.enable_set().map(|v| {
            let address = utils::address(v);
            let len = self.enables.len();
            let index = *self.enable_indices.entry(address).or_insert(len);
            if index == len {
                self.enables.push(*v.borrow());
                self.exported.push(Exported::Enables(v.clone()));
            }

            index
        });

        self.shaders.push(ShaderRecord {
            states,
            enables,
            uniforms: shader.uniforms().cloned(),
            scissor: shader.scissor(),
        });

        let index = self.shaders.len() - 1;
        self.shader_indices.insert(address, index);
        index
    }

    /// Writes `effect` and all of its shaders into the archive and returns its
    /// index.
    pub fn export_effect(&mut self, shared_effect: &Shared<Effect>) -> usize {
        let address = utils::address(shared_effect);
        if let Some(&index) = self.effect_indices.get(&address) {
            return index;
        }

        self.exported.push(Exported::Effect(shared_effect.clone()));
        let effect = shared_effect.borrow();
        let mut lods: Vec<Vec<usize>> = Vec::with_capacity(effect.lod_count());
        for passes in effect.lods() {
            lods.push(passes.iter().map(|v| self.export_shader(v)).collect());
        }

        self.effects.push(EffectRecord {
            lods,
            render_rank: effect.render_rank(),
            enable_mask: effect.enable_mask(),
        });

        let index = self.effects.len() - 1;
        self.effect_indices.insert(address, index);
        index
    }

    fn export_state(&mut self, state: &RenderState) -> usize {
        let len = self.states.len();
        let index = *self.state_indices.entry(state.address()).or_insert(len);
        if index == len {
            self.states.push(state.snapshot());
            self.exported.push(Exported::State(state.clone()));
        }

        index
    }

    /// Rebuilds the shaders and effects of this archive.
    pub fn import(&self) -> Result<Imported> {
        let states: Vec<RenderState> = self.states.iter().map(|v| v.clone().into_state()).collect();
        let enables: Vec<_> = self.enables.iter().map(|v| shared(*v)).collect();

        let mut shaders = Vec::with_capacity(self.shaders.len());
        for record in &self.shaders {
            let mut shader = Shader::new();

            for &(slot, index) in &record.states {
                let state = lookup(&states, index, "render state")?;
                if state.kind() != slot.kind() {
                    return Err(Error::Serialization(format!(
                        "{:?} is stored at a slot of {:?}.",
                        state.kind(),
                        slot.kind()
                    )));
                }

                shader.set_render_state_indexed(state.clone(), slot.index())?;
            }

            if let Some(index) = record.enables {
                shader.set_enable_set(Some(lookup(&enables, index, "enable set")?.clone()));
            }

            shader.set_uniform_set(record.uniforms.clone());
            shader.set_scissor(record.scissor);
            shaders.push(shared(shader));
        }

        let mut effects = Vec::with_capacity(self.effects.len());
        for record in &self.effects {
            let mut lods = Vec::with_capacity(record.lods.len());
            for passes in &record.lods {
                let mut lod = Vec::with_capacity(passes.len());
                for &index in passes {
                    lod.push(lookup(&shaders, index, "shader")?.clone());
                }

                lods.push(lod);
            }

            let mut effect = Effect::with_lods(lods);
            effect.set_render_rank(record.render_rank);
            effect.set_enable_mask(record.enable_mask);
            effects.push(shared(effect));
        }

        debug!(
            "Imports {} shaders and {} effects sharing {} render states.",
            shaders.len(),
            effects.len(),
            states.len()
        );

        Ok(Imported { shaders, effects })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(::serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(::serde_json::from_str(json)?)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(::bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(::bincode::deserialize(bytes)?)
    }
}

fn lookup<'a, T>(table: &'a [T], index: usize, what: &str) -> Result<&'a T> {
    table.get(index).ok_or_else(|| {
        Error::Serialization(format!(
            "Refers to {} {} while there are only {}.",
            what,
            index,
            table.len()
        ))
    })
}

/// Serializes a single shader into JSON.
pub fn shader_to_json(shader: &Shared<Shader>) -> Result<String> {
    let mut archive = Archive::new();
    archive.export_shader(shader);
    archive.to_json()
}

/// Deserializes the first shader of a JSON archive.
pub fn shader_from_json(json: &str) -> Result<Shared<Shader>> {
    let imported = Archive::from_json(json)?.import()?;
    imported
        .shaders
        .into_iter()
        .next()
        .ok_or_else(|| Error::Serialization("The archive has no shader.".into()))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::states::{DepthFunc, Light};
    use std::rc::Rc;

    #[test]
    fn sharing() {
        let light = shared(Light::default());
        let mut lhs = Shader::new();
        lhs.set_render_state_indexed(light.clone(), 0).unwrap();
        lhs.goc_depth_func();
        let mut rhs = Shader::new();
        rhs.set_render_state_indexed(light, 1).unwrap();

        let (lhs, rhs) = (shared(lhs), shared(rhs));
        let mut archive = Archive::new();
        assert_eq!(archive.export_shader(&lhs), 0);
        assert_eq!(archive.export_shader(&rhs), 1);
        assert_eq!(archive.export_shader(&lhs), 0);
        assert_eq!(archive.state_count(), 2);

        let archive = Archive::from_bytes(&archive.to_bytes().unwrap()).unwrap();
        let imported = archive.import().unwrap();
        let a = imported.shaders[0].borrow().light(0).unwrap();
        let b = imported.shaders[1].borrow().light(1).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert!(imported.shaders[1].borrow().render_state::<DepthFunc>(0).is_none());
    }

    #[test]
    fn temporaries() {
        let mut archive = Archive::new();
        let indices: Vec<_> = (0..8)
            .map(|i| {
                let mut shader = Shader::new();
                shader.goc_line_width().borrow_mut().width = (i + 1) as f32;
                archive.export_shader(&shared(shader))
            })
            .collect();

        assert_eq!(indices, (0..8).collect::<Vec<_>>());
        assert_eq!(archive.shader_count(), 8);
        assert_eq!(archive.state_count(), 8);

        let imported = archive.import().unwrap();
        for (i, v) in imported.shaders.iter().enumerate() {
            let width = v.borrow().line_width().unwrap().borrow().width;
            assert_eq!(width, (i + 1) as f32);
        }
    }

    #[test]
    fn corrupted() {
        let mut archive = Archive::new();
        archive.shaders.push(ShaderRecord {
            states: vec![(RenderStateSlot::first(crate::states::RenderStateKind::DepthFunc), 3)],
            enables: None,
            uniforms: None,
            scissor: None,
        });

        assert!(archive.import().is_err());
    }
}
