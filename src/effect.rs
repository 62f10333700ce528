//! An `Effect` describes how an actor is drawn: a list of levels of detail,
//! each made of an ordered list of shaders, one per rendering pass.

use std::fmt;
use std::rc::Rc;

use crate::camera::Camera;
use crate::errors::*;
use crate::math::prelude::*;
use crate::shader::Shader;
use crate::utils::{shared, Shared};

/// The shaders of one level of detail, drawn in order.
pub type ShaderPasses = Vec<Shared<Shader>>;

/// Selects a level of detail for an object centered at `center`.
pub trait LodEvaluator {
    fn evaluate(&self, center: Point3<f32>, camera: &Camera) -> usize;
}

/// Picks the level of detail by the distance between the object and the eye.
/// LOD `i` is used up to `distances[i]`, the last LOD beyond.
#[derive(Debug, Clone, Default)]
pub struct DistanceLodEvaluator {
    distances: Vec<f32>,
}

impl DistanceLodEvaluator {
    pub fn new(mut distances: Vec<f32>) -> Self {
        distances.sort_by(|a, b| a.partial_cmp(b).unwrap_or(::std::cmp::Ordering::Equal));
        DistanceLodEvaluator { distances }
    }

    #[inline]
    pub fn distances(&self) -> &[f32] {
        &self.distances
    }
}

impl LodEvaluator for DistanceLodEvaluator {
    fn evaluate(&self, center: Point3<f32>, camera: &Camera) -> usize {
        let distance = camera.eye_position().distance(center);
        self.distances
            .iter()
            .position(|&v| distance < v)
            .unwrap_or_else(|| self.distances.len())
    }
}

pub struct Effect {
    lods: Vec<ShaderPasses>,
    render_rank: i32,
    enable_mask: u32,
    lod_evaluator: Option<Rc<dyn LodEvaluator>>,
}

impl Default for Effect {
    fn default() -> Self {
        Effect::new()
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Effect")
            .field("lods", &self.lods)
            .field("render_rank", &self.render_rank)
            .field("enable_mask", &self.enable_mask)
            .finish()
    }
}

impl Effect {
    /// Creates an effect with a single LOD made of a single default shader.
    pub fn new() -> Self {
        Effect::with_lods(vec![vec![shared(Shader::new())]])
    }

    pub fn with_lods(lods: Vec<ShaderPasses>) -> Self {
        Effect {
            lods,
            render_rank: 0,
            enable_mask: 0xFFFF_FFFF,
            lod_evaluator: None,
        }
    }

    /// The passes of LOD `lod`.
    ///
    /// # Panics
    ///
    /// Panics if `lod` has not been populated.
    #[inline]
    pub fn lod(&self, lod: usize) -> &ShaderPasses {
        &self.lods[lod]
    }

    #[inline]
    pub fn lod_mut(&mut self, lod: usize) -> &mut ShaderPasses {
        &mut self.lods[lod]
    }

    #[inline]
    pub fn get_lod(&self, lod: usize) -> Option<&ShaderPasses> {
        self.lods.get(lod)
    }

    /// Appends a LOD, returns its index.
    pub fn push_lod(&mut self, passes: ShaderPasses) -> usize {
        self.lods.push(passes);
        self.lods.len() - 1
    }

    /// Replaces the passes of an existing LOD.
    pub fn set_lod(&mut self, lod: usize, passes: ShaderPasses) -> Result<()> {
        match self.lods.get_mut(lod) {
            Some(v) => {
                *v = passes;
                Ok(())
            }
            None => Err(Error::PassOutOfRange { lod, pass: 0 }),
        }
    }

    #[inline]
    pub fn lod_count(&self) -> usize {
        self.lods.len()
    }

    #[inline]
    pub fn lods(&self) -> &[ShaderPasses] {
        &self.lods
    }

    /// The shader of `pass` at LOD `lod`.
    ///
    /// # Panics
    ///
    /// Panics if either index has not been populated.
    #[inline]
    pub fn shader(&self, lod: usize, pass: usize) -> &Shared<Shader> {
        &self.lods[lod][pass]
    }

    /// The first pass of the first LOD.
    ///
    /// # Panics
    ///
    /// Panics if the effect has no shader at all.
    #[inline]
    pub fn main_shader(&self) -> &Shared<Shader> {
        self.shader(0, 0)
    }

    #[inline]
    pub fn get_shader(&self, lod: usize, pass: usize) -> Option<&Shared<Shader>> {
        self.lods.get(lod).and_then(|v| v.get(pass))
    }

    pub fn shader_checked(&self, lod: usize, pass: usize) -> Result<&Shared<Shader>> {
        self.get_shader(lod, pass)
            .ok_or(Error::PassOutOfRange { lod, pass })
    }

    /// Draw order hint across effects, lower ranks are drawn first.
    #[inline]
    pub fn render_rank(&self) -> i32 {
        self.render_rank
    }

    #[inline]
    pub fn set_render_rank(&mut self, rank: i32) {
        self.render_rank = rank;
    }

    #[inline]
    pub fn enable_mask(&self) -> u32 {
        self.enable_mask
    }

    #[inline]
    pub fn set_enable_mask(&mut self, mask: u32) {
        self.enable_mask = mask;
    }

    #[inline]
    pub fn lod_evaluator(&self) -> Option<&Rc<dyn LodEvaluator>> {
        self.lod_evaluator.as_ref()
    }

    #[inline]
    pub fn set_lod_evaluator(&mut self, evaluator: Option<Rc<dyn LodEvaluator>>) {
        self.lod_evaluator = evaluator;
    }

    /// Selects the LOD to draw an object centered at `center` with, clamped
    /// to the populated LODs.
    pub fn evaluate_lod(&self, center: Point3<f32>, camera: &Camera) -> usize {
        let lod = self
            .lod_evaluator
            .as_ref()
            .map(|v| v.evaluate(center, camera))
            .unwrap_or(0);

        lod.min(self.lods.len().saturating_sub(1))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn passes() {
        let mut effect = Effect::new();
        assert_eq!(effect.lod_count(), 1);
        assert_eq!(effect.lod(0).len(), 1);

        let wireframe = shared(Shader::new());
        effect.lod_mut(0).push(wireframe.clone());
        assert!(Rc::ptr_eq(effect.shader(0, 1), &wireframe));
        assert!(effect.get_shader(0, 2).is_none());
        assert!(effect.get_shader(1, 0).is_none());

        match effect.shader_checked(1, 0) {
            Err(Error::PassOutOfRange { lod, pass }) => assert_eq!((lod, pass), (1, 0)),
            _ => unreachable!(),
        }
    }

    #[test]
    #[should_panic]
    fn unpopulated() {
        let effect = Effect::new();
        effect.shader(0, 1);
    }

    #[test]
    fn lods() {
        let mut camera = Camera::new();
        camera.look_at(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, -1.0),
            Vector3::unit_y(),
        );

        let mut effect = Effect::new();
        effect.push_lod(vec![shared(Shader::new())]);
        effect.set_lod_evaluator(Some(Rc::new(DistanceLodEvaluator::new(vec![50.0, 10.0]))));

        assert_eq!(effect.evaluate_lod(Point3::new(0.0, 0.0, -5.0), &camera), 0);
        assert_eq!(effect.evaluate_lod(Point3::new(0.0, 0.0, -20.0), &camera), 1);
        // LOD 2 of the evaluator is clamped to the last populated one.
        assert_eq!(effect.evaluate_lod(Point3::new(0.0, 0.0, -80.0), &camera), 1);
    }
}
