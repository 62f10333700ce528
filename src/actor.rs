//! An `Actor` binds what is drawn (a `Renderable`), how it is drawn (an
//! `Effect`) and where it is drawn (a transform). The three are shared by
//! reference, and could be rebound independently.

use std::fmt;
use std::rc::Rc;

use inlinable_string::InlinableString;
use smallvec::SmallVec;

use crate::backends::Primitive;
use crate::camera::Camera;
use crate::device::Device;
use crate::effect::{Effect, LodEvaluator};
use crate::errors::*;
use crate::math::prelude::*;
use crate::shader::{Scissor, Shader};
use crate::states::{Uniform, UniformSet};
use crate::transform::TransformHandle;
use crate::utils::{self, Shared};

/// Geometry that could be drawn. The device has the states of the current
/// pass applied when `render` is called.
pub trait Renderable {
    fn render(&self, actor: &Actor, camera: &Camera, device: &mut Device) -> Result<()>;

    /// Bounding sphere in object space, as `(center, radius)`. Objects without
    /// bounds are never culled.
    fn bounding_sphere(&self) -> Option<(Point3<f32>, f32)> {
        None
    }
}

/// Draws a range of vertices of the bound vertex arrays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawArrays {
    pub primitive: Primitive,
    pub first: u32,
    pub count: u32,
    pub bounds: Option<(Point3<f32>, f32)>,
}

impl DrawArrays {
    pub fn new(primitive: Primitive, first: u32, count: u32) -> Self {
        DrawArrays {
            primitive,
            first,
            count,
            bounds: None,
        }
    }

    pub fn with_bounds(mut self, center: Point3<f32>, radius: f32) -> Self {
        self.bounds = Some((center, radius));
        self
    }
}

impl Renderable for DrawArrays {
    fn render(&self, _: &Actor, _: &Camera, device: &mut Device) -> Result<()> {
        device.draw(self.primitive, self.first, self.count)
    }

    fn bounding_sphere(&self) -> Option<(Point3<f32>, f32)> {
        self.bounds
    }
}

/// Observes the rendering and the destruction of actors. Callbacks are
/// invoked in registration order.
pub trait ActorEventCallback {
    /// Called right before `renderable` is drawn with `shader` for `pass`. The
    /// actor uniforms could be updated here and are uploaded afterwards.
    fn on_actor_render_started(
        &mut self,
        actor: &mut Actor,
        frame_clock: f64,
        camera: &Camera,
        renderable: &Rc<dyn Renderable>,
        shader: &Shared<Shader>,
        pass: usize,
    );

    fn on_actor_delete(&mut self, _: &Actor) {}
}

pub struct Actor {
    name: InlinableString,
    lods: SmallVec<[Option<Rc<dyn Renderable>>; 4]>,
    effect: Option<Shared<Effect>>,
    transform: Option<TransformHandle>,
    uniforms: Option<UniformSet>,
    scissor: Option<Scissor>,
    lod_evaluator: Option<Rc<dyn LodEvaluator>>,
    callbacks: Vec<Shared<dyn ActorEventCallback>>,
    enable_mask: u32,
    render_rank: i32,
    render_block: i32,
}

impl fmt::Debug for Actor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Actor")
            .field("name", &self.name)
            .field("lods", &self.lods.len())
            .field("transform", &self.transform)
            .field("uniforms", &self.uniforms)
            .field("enable_mask", &self.enable_mask)
            .field("render_rank", &self.render_rank)
            .field("render_block", &self.render_block)
            .finish()
    }
}

impl Default for Actor {
    fn default() -> Self {
        Actor {
            name: InlinableString::default(),
            lods: SmallVec::new(),
            effect: None,
            transform: None,
            uniforms: None,
            scissor: None,
            lod_evaluator: None,
            callbacks: Vec::new(),
            enable_mask: 0xFFFF_FFFF,
            render_rank: 0,
            render_block: 0,
        }
    }
}

impl Actor {
    pub fn new(
        renderable: Option<Rc<dyn Renderable>>,
        effect: Option<Shared<Effect>>,
        transform: Option<TransformHandle>,
    ) -> Self {
        let mut actor = Actor::default();
        actor.set_lod(0, renderable);
        actor.effect = effect;
        actor.transform = transform;
        actor
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name<T: AsRef<str>>(&mut self, name: T) {
        self.name = name.as_ref().into();
    }

    /// The renderable of LOD `lod`.
    #[inline]
    pub fn lod(&self, lod: usize) -> Option<&Rc<dyn Renderable>> {
        self.lods.get(lod).and_then(|v| v.as_ref())
    }

    /// Binds the renderable of LOD `lod`, growing the LOD list if needed.
    pub fn set_lod(&mut self, lod: usize, renderable: Option<Rc<dyn Renderable>>) {
        while self.lods.len() <= lod {
            self.lods.push(None);
        }

        self.lods[lod] = renderable;
    }

    #[inline]
    pub fn lod_count(&self) -> usize {
        self.lods.len()
    }

    #[inline]
    pub fn renderable(&self) -> Option<&Rc<dyn Renderable>> {
        self.lod(0)
    }

    #[inline]
    pub fn set_renderable(&mut self, renderable: Option<Rc<dyn Renderable>>) {
        self.set_lod(0, renderable);
    }

    #[inline]
    pub fn effect(&self) -> Option<&Shared<Effect>> {
        self.effect.as_ref()
    }

    #[inline]
    pub fn set_effect(&mut self, effect: Option<Shared<Effect>>) {
        self.effect = effect;
    }

    #[inline]
    pub fn transform(&self) -> Option<TransformHandle> {
        self.transform
    }

    #[inline]
    pub fn set_transform(&mut self, transform: Option<TransformHandle>) {
        self.transform = transform;
    }

    /// Renderers draw this actor only if their masks share a bit with it.
    #[inline]
    pub fn enable_mask(&self) -> u32 {
        self.enable_mask
    }

    #[inline]
    pub fn set_enable_mask(&mut self, mask: u32) {
        self.enable_mask = mask;
    }

    #[inline]
    pub fn is_enabled(&self, mask: u32) -> bool {
        (self.enable_mask & mask) != 0
    }

    #[inline]
    pub fn render_rank(&self) -> i32 {
        self.render_rank
    }

    #[inline]
    pub fn set_render_rank(&mut self, rank: i32) {
        self.render_rank = rank;
    }

    /// Render blocks partition the queue before ranks do, lower blocks are
    /// drawn first.
    #[inline]
    pub fn render_block(&self) -> i32 {
        self.render_block
    }

    #[inline]
    pub fn set_render_block(&mut self, block: i32) {
        self.render_block = block;
    }

    #[inline]
    pub fn scissor(&self) -> Option<Scissor> {
        self.scissor
    }

    /// Overrides the scissor of the shaders this actor is drawn with.
    #[inline]
    pub fn set_scissor(&mut self, scissor: Option<Scissor>) {
        self.scissor = scissor;
    }

    #[inline]
    pub fn lod_evaluator(&self) -> Option<&Rc<dyn LodEvaluator>> {
        self.lod_evaluator.as_ref()
    }

    #[inline]
    pub fn set_lod_evaluator(&mut self, evaluator: Option<Rc<dyn LodEvaluator>>) {
        self.lod_evaluator = evaluator;
    }

    /// Selects the renderable LOD, falling back to the nearest populated LOD
    /// below the one evaluated.
    pub fn evaluate_lod(&self, center: Point3<f32>, camera: &Camera) -> usize {
        let lod = self
            .lod_evaluator
            .as_ref()
            .map(|v| v.evaluate(center, camera))
            .unwrap_or(0)
            .min(self.lods.len().saturating_sub(1));

        (0..=lod).rev().find(|&i| self.lod(i).is_some()).unwrap_or(0)
    }

    /// Bounding sphere of LOD 0 in world space.
    pub fn bounding_sphere(&self, world: &Matrix4<f32>) -> Option<(Point3<f32>, f32)> {
        let (center, radius) = self.renderable()?.bounding_sphere()?;
        let scale = world
            .x
            .truncate()
            .magnitude()
            .max(world.y.truncate().magnitude())
            .max(world.z.truncate().magnitude());

        Some((world.transform_point(center), radius * scale))
    }
}

impl Actor {
    #[inline]
    pub fn uniforms(&self) -> Option<&UniformSet> {
        self.uniforms.as_ref()
    }

    pub fn goc_uniform_set(&mut self) -> &mut UniformSet {
        self.uniforms.get_or_insert_with(UniformSet::new)
    }

    pub fn uniform<T: AsRef<str>>(&self, name: T) -> Option<&Uniform> {
        self.uniforms.as_ref().and_then(|v| v.get(name))
    }

    /// Returns the per-actor uniform `name`, inserting `default` if it does
    /// not exist. Names must not collide with the uniforms of the shaders.
    pub fn goc_uniform<T1, T2>(&mut self, name: T1, default: T2) -> &mut Uniform
    where
        T1: Into<String>,
        T2: Into<Uniform>,
    {
        self.goc_uniform_set().goc(name, default)
    }

    pub fn set_uniform<T1, T2>(&mut self, name: T1, value: T2) -> Option<Uniform>
    where
        T1: Into<String>,
        T2: Into<Uniform>,
    {
        self.goc_uniform_set().set(name, value)
    }

    pub fn erase_uniform<T: AsRef<str>>(&mut self, name: T) -> Option<Uniform> {
        self.uniforms.as_mut().and_then(|v| v.remove(name))
    }
}

impl Actor {
    pub fn add_callback(&mut self, callback: Shared<dyn ActorEventCallback>) {
        self.callbacks.push(callback);
    }

    /// Removes a callback by identity, returns true if it was registered.
    pub fn remove_callback(&mut self, callback: &Shared<dyn ActorEventCallback>) -> bool {
        let address = utils::address(callback);
        let len = self.callbacks.len();
        self.callbacks.retain(|v| utils::address(v) != address);
        self.callbacks.len() != len
    }

    #[inline]
    pub fn callbacks(&self) -> &[Shared<dyn ActorEventCallback>] {
        &self.callbacks
    }

    pub fn dispatch_render_started(
        &mut self,
        frame_clock: f64,
        camera: &Camera,
        renderable: &Rc<dyn Renderable>,
        shader: &Shared<Shader>,
        pass: usize,
    ) {
        let callbacks = self.callbacks.clone();
        for v in callbacks {
            v.borrow_mut()
                .on_actor_render_started(self, frame_clock, camera, renderable, shader, pass);
        }
    }
}

impl Drop for Actor {
    fn drop(&mut self) {
        let callbacks = ::std::mem::replace(&mut self.callbacks, Vec::new());
        for v in &callbacks {
            v.borrow_mut().on_actor_delete(self);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::shared;
    use std::cell::RefCell;

    struct Recorder(Rc<RefCell<Vec<String>>>, &'static str);

    impl ActorEventCallback for Recorder {
        fn on_actor_render_started(
            &mut self,
            actor: &mut Actor,
            _: f64,
            _: &Camera,
            _: &Rc<dyn Renderable>,
            _: &Shared<Shader>,
            pass: usize,
        ) {
            actor.set_uniform("u_Pass", pass as i32);
            self.0.borrow_mut().push(format!("{}:{}", self.1, pass));
        }

        fn on_actor_delete(&mut self, actor: &Actor) {
            self.0.borrow_mut().push(format!("{}:delete:{}", self.1, actor.name()));
        }
    }

    #[test]
    fn callbacks() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let renderable: Rc<dyn Renderable> = Rc::new(DrawArrays::new(Primitive::Points, 0, 1));
        let shader = shared(Shader::new());

        let mut actor = Actor::new(Some(renderable.clone()), None, None);
        actor.set_name("cube");

        let a: Shared<dyn ActorEventCallback> = shared(Recorder(events.clone(), "a"));
        let b: Shared<dyn ActorEventCallback> = shared(Recorder(events.clone(), "b"));
        actor.add_callback(a.clone());
        actor.add_callback(b.clone());

        actor.dispatch_render_started(0.0, &Camera::new(), &renderable, &shader, 1);
        assert_eq!(actor.uniform("u_Pass"), Some(&Uniform::I32(1)));

        assert!(actor.remove_callback(&a));
        assert!(!actor.remove_callback(&a));
        drop(actor);

        assert_eq!(*events.borrow(), vec!["a:1", "b:1", "b:delete:cube"]);
    }

    #[test]
    fn lods() {
        let renderable: Rc<dyn Renderable> = Rc::new(DrawArrays::new(Primitive::Points, 0, 1));
        let mut actor = Actor::new(Some(renderable.clone()), None, None);
        actor.set_lod(2, Some(renderable));
        assert_eq!(actor.lod_count(), 3);
        assert!(actor.lod(1).is_none());
        assert_eq!(actor.evaluate_lod(Point3::new(0.0, 0.0, 0.0), &Camera::new()), 0);
    }

    #[test]
    fn bounds() {
        let renderable = DrawArrays::new(Primitive::Triangles, 0, 3)
            .with_bounds(Point3::new(1.0, 0.0, 0.0), 1.0);
        let actor = Actor::new(Some(Rc::new(renderable)), None, None);

        let world = Matrix4::from_translation(Vector3::new(0.0, 2.0, 0.0)) * Matrix4::from_scale(2.0);
        let (center, radius) = actor.bounding_sphere(&world).unwrap();
        assert_eq!(center, Point3::new(2.0, 2.0, 0.0));
        assert_eq!(radius, 2.0);
    }
}
