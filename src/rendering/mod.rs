//! Turns scenes into draw calls.
//!
//! A `Rendering` collects the visible actors of its scene managers, expands
//! them into a queue of one token per shader pass, sorts the queue, and hands
//! it to each of its `Renderer`s, which draw it into their render target.
//!
//! A `RenderingTree` runs sub-renderings strictly in list order, so a later
//! rendering could sample the textures an earlier one rendered into. This is
//! the whole render-to-texture mechanism: nothing is reordered automatically,
//! but `RenderingTree::check_dependencies` reports orders that would sample a
//! texture before it is produced.

pub mod callbacks;
pub mod sorter;

use std::fmt;
use std::rc::Rc;

use crate::actor::{Actor, Renderable};
use crate::camera::Camera;
use crate::device::Device;
use crate::effect::Effect;
use crate::errors::*;
use crate::framebuffer::RenderTarget;
use crate::math::prelude::*;
use crate::scene::SceneManager;
use crate::settings::RenderingParams;
use crate::shader::Shader;
use crate::states::{RenderState, RenderStateKind, RenderStateSlot, StateValue};
use crate::texture::Texture;
use crate::transform::TransformTree;
use crate::utils::{self, shared, FastHashMap, Shared};

use self::sorter::RenderQueueSorter;

/// One pass of one actor, ready to be drawn.
#[derive(Clone)]
pub struct RenderToken {
    pub actor: Shared<Actor>,
    pub renderable: Rc<dyn Renderable>,
    pub effect: Shared<Effect>,
    pub shader: Shared<Shader>,
    pub lod: usize,
    pub pass: usize,
    pub block: i32,
    pub effect_rank: i32,
    pub actor_rank: i32,
    /// Distance from the eye along the view direction.
    pub depth: f32,
    /// Whether the first pass of the actor blends. Shared by all its passes.
    pub translucent: bool,
    pub world: Matrix4<f32>,
}

impl fmt::Debug for RenderToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RenderToken")
            .field("actor", &self.actor.borrow().name())
            .field("lod", &self.lod)
            .field("pass", &self.pass)
            .field("block", &self.block)
            .field("effect_rank", &self.effect_rank)
            .field("actor_rank", &self.actor_rank)
            .field("depth", &self.depth)
            .field("translucent", &self.translucent)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderEvent {
    Started,
    Finished,
}

/// Hooks around the execution of a `Renderer` or a `Rendering`.
pub trait RenderEventCallback {
    fn on_rendering_started(&mut self, _: &mut Device) -> Result<()> {
        Ok(())
    }

    fn on_rendering_finished(&mut self, _: &mut Device) -> Result<()> {
        Ok(())
    }

    /// One-shot callbacks are removed once the rendering they are attached to
    /// has finished.
    fn is_one_shot(&self) -> bool {
        false
    }

    /// Textures this callback renders or copies into.
    fn written_textures(&self) -> Vec<Rc<Texture>> {
        Vec::new()
    }
}

fn dispatch(
    callbacks: &mut Vec<Shared<dyn RenderEventCallback>>,
    device: &mut Device,
    event: RenderEvent,
) -> Result<()> {
    for v in callbacks.iter() {
        match event {
            RenderEvent::Started => v.borrow_mut().on_rendering_started(device)?,
            RenderEvent::Finished => v.borrow_mut().on_rendering_finished(device)?,
        }
    }

    if event == RenderEvent::Finished {
        callbacks.retain(|v| !v.borrow().is_one_shot());
    }

    Ok(())
}

fn remove_callback(
    callbacks: &mut Vec<Shared<dyn RenderEventCallback>>,
    callback: &Shared<dyn RenderEventCallback>,
) -> bool {
    let address = utils::address(callback);
    let len = callbacks.len();
    callbacks.retain(|v| utils::address(v) != address);
    callbacks.len() != len
}

/// Draws a sorted render queue into a render target.
pub struct Renderer {
    target: RenderTarget,
    enable_mask: u32,
    overrides: FastHashMap<RenderStateSlot, StateValue>,
    callbacks: Vec<Shared<dyn RenderEventCallback>>,
}

impl Default for Renderer {
    fn default() -> Self {
        Renderer::new(RenderTarget::default())
    }
}

impl Renderer {
    pub fn new(target: RenderTarget) -> Self {
        Renderer {
            target,
            enable_mask: 0xFFFF_FFFF,
            overrides: FastHashMap::default(),
            callbacks: Vec::new(),
        }
    }

    #[inline]
    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    #[inline]
    pub fn set_target(&mut self, target: RenderTarget) {
        self.target = target;
    }

    /// Tokens whose actor shares no bit with this mask are skipped.
    #[inline]
    pub fn enable_mask(&self) -> u32 {
        self.enable_mask
    }

    #[inline]
    pub fn set_enable_mask(&mut self, mask: u32) {
        self.enable_mask = mask;
    }

    /// Replaces the OpenGL default of the first slot of `value`'s kind for
    /// the draws of this renderer. Shaders that specify the state still win.
    pub fn set_default_override(&mut self, value: StateValue) -> Option<StateValue> {
        self.overrides
            .insert(RenderStateSlot::first(value.kind()), value)
    }

    pub fn set_default_override_indexed(
        &mut self,
        value: StateValue,
        index: usize,
    ) -> Result<Option<StateValue>> {
        let slot = RenderStateSlot::new(value.kind(), index)?;
        Ok(self.overrides.insert(slot, value))
    }

    pub fn erase_default_override(
        &mut self,
        kind: RenderStateKind,
        index: usize,
    ) -> Option<StateValue> {
        let slot = RenderStateSlot::new(kind, index).ok()?;
        self.overrides.remove(&slot)
    }

    #[inline]
    pub fn default_overrides(&self) -> &FastHashMap<RenderStateSlot, StateValue> {
        &self.overrides
    }

    pub fn add_callback(&mut self, callback: Shared<dyn RenderEventCallback>) {
        self.callbacks.push(callback);
    }

    pub fn remove_callback(&mut self, callback: &Shared<dyn RenderEventCallback>) -> bool {
        remove_callback(&mut self.callbacks, callback)
    }

    #[inline]
    pub fn callbacks(&self) -> &[Shared<dyn RenderEventCallback>] {
        &self.callbacks
    }

    /// Textures written by drawing with this renderer.
    pub fn written_textures(&self) -> Vec<Rc<Texture>> {
        let mut textures = self.target.textures();
        for v in &self.callbacks {
            textures.extend(v.borrow().written_textures());
        }

        textures
    }

    /// Draws `queue` in order.
    pub fn render(
        &mut self,
        queue: &[RenderToken],
        camera: &Camera,
        device: &mut Device,
        frame_clock: f64,
    ) -> Result<()> {
        dispatch(&mut self.callbacks, device, RenderEvent::Started)?;

        device.bind_target(&self.target)?;
        camera.viewport().apply(device)?;

        let projection = camera.projection_matrix();
        let view = camera.view_matrix();

        for token in queue {
            if !token.actor.borrow().is_enabled(self.enable_mask) {
                continue;
            }

            token.actor.borrow_mut().dispatch_render_started(
                frame_clock,
                camera,
                &token.renderable,
                &token.shader,
                token.pass,
            );

            let actor = token.actor.borrow();
            let shader = token.shader.borrow();

            device.apply_shader(&shader, &self.overrides)?;

            match actor.scissor().or_else(|| shader.scissor()) {
                Some(scissor) => scissor.apply(device)?,
                None => device.set_scissor(None)?,
            }

            if let Some(uniforms) = actor.uniforms() {
                for (name, _) in uniforms.iter() {
                    if shader.uniform(name).is_some() {
                        warn!(
                            "Uniform {} of actor {} shadows the one of its shader.",
                            name,
                            actor.name()
                        );
                    }
                }

                device.apply_uniforms(uniforms)?;
            }

            device.set_matrices(projection, view, token.world)?;
            token.renderable.render(&actor, camera, device)?;
        }

        dispatch(&mut self.callbacks, device, RenderEvent::Finished)
    }
}

/// A node of a rendering tree.
pub trait RenderingAbstract {
    fn render(&mut self, device: &mut Device, frame_clock: f64) -> Result<()>;

    fn enable_mask(&self) -> u32;

    fn set_enable_mask(&mut self, mask: u32);

    /// Textures this rendering draws or copies into.
    fn written_textures(&self) -> Vec<Rc<Texture>> {
        Vec::new()
    }

    /// Textures the shaders of this rendering sample.
    fn sampled_textures(&self) -> Vec<Rc<Texture>> {
        Vec::new()
    }
}

/// A camera looking at a set of scene managers through one or more renderers.
pub struct Rendering {
    camera: Camera,
    renderers: Vec<Renderer>,
    scene_managers: Vec<Shared<dyn SceneManager>>,
    transforms: Shared<TransformTree>,
    sorter: Box<dyn RenderQueueSorter>,
    params: RenderingParams,
    callbacks: Vec<Shared<dyn RenderEventCallback>>,
}

impl Default for Rendering {
    fn default() -> Self {
        Rendering::new(RenderingParams::default())
    }
}

impl Rendering {
    /// Creates a rendering with one renderer drawing into the screen.
    pub fn new(params: RenderingParams) -> Self {
        Rendering {
            camera: Camera::new(),
            renderers: vec![Renderer::default()],
            scene_managers: Vec::new(),
            transforms: shared(TransformTree::new()),
            sorter: sorter::from_kind(params.sorter, params.depth_sort),
            params,
            callbacks: Vec::new(),
        }
    }

    #[inline]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    #[inline]
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    #[inline]
    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    #[inline]
    pub fn renderers(&self) -> &[Renderer] {
        &self.renderers
    }

    #[inline]
    pub fn renderers_mut(&mut self) -> &mut Vec<Renderer> {
        &mut self.renderers
    }

    /// The first renderer.
    ///
    /// # Panics
    ///
    /// Panics if all the renderers have been removed.
    #[inline]
    pub fn renderer(&self) -> &Renderer {
        &self.renderers[0]
    }

    #[inline]
    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderers[0]
    }

    pub fn add_scene_manager(&mut self, scene: Shared<dyn SceneManager>) {
        self.scene_managers.push(scene);
    }

    pub fn remove_scene_manager(&mut self, scene: &Shared<dyn SceneManager>) -> bool {
        let address = utils::address(scene);
        let len = self.scene_managers.len();
        self.scene_managers
            .retain(|v| utils::address(v) != address);
        self.scene_managers.len() != len
    }

    #[inline]
    pub fn scene_managers(&self) -> &[Shared<dyn SceneManager>] {
        &self.scene_managers
    }

    #[inline]
    pub fn transforms(&self) -> &Shared<TransformTree> {
        &self.transforms
    }

    /// Shares a transform tree, usually with the other renderings of the same
    /// scene.
    #[inline]
    pub fn set_transforms(&mut self, transforms: Shared<TransformTree>) {
        self.transforms = transforms;
    }

    #[inline]
    pub fn set_sorter(&mut self, sorter: Box<dyn RenderQueueSorter>) {
        self.sorter = sorter;
    }

    #[inline]
    pub fn params(&self) -> &RenderingParams {
        &self.params
    }

    /// Updates the params. The sorter is recreated from them.
    pub fn set_params(&mut self, params: RenderingParams) {
        self.sorter = sorter::from_kind(params.sorter, params.depth_sort);
        self.params = params;
    }

    pub fn add_callback(&mut self, callback: Shared<dyn RenderEventCallback>) {
        self.callbacks.push(callback);
    }

    pub fn remove_callback(&mut self, callback: &Shared<dyn RenderEventCallback>) -> bool {
        remove_callback(&mut self.callbacks, callback)
    }

    /// Collects the visible and enabled actors into an unsorted queue.
    pub fn collect_queue(&self) -> Vec<RenderToken> {
        let transforms = self.transforms.borrow();

        let mut actors = Vec::new();
        for v in &self.scene_managers {
            let scene = v.borrow();
            if (scene.enable_mask() & self.params.enable_mask) != 0 {
                scene.extract_visible_actors(&mut actors, &self.camera, &transforms);
            }
        }

        let mut queue = Vec::with_capacity(actors.len());
        for actor in actors {
            self.enqueue(&mut queue, actor, &transforms);
        }

        queue
    }

    fn enqueue(
        &self,
        queue: &mut Vec<RenderToken>,
        shared_actor: Shared<Actor>,
        transforms: &TransformTree,
    ) {
        let mask = self.params.enable_mask;
        let actor = shared_actor.borrow();
        if !actor.is_enabled(mask) {
            return;
        }

        let effect = match actor.effect() {
            Some(v) => v.clone(),
            None => {
                debug!("Skips actor {:?} since it has no effect.", actor.name());
                return;
            }
        };

        let effect_ref = effect.borrow();
        if (effect_ref.enable_mask() & mask) == 0 {
            return;
        }

        let world = actor
            .transform()
            .and_then(|h| transforms.world_matrix(h))
            .unwrap_or_else(Matrix4::identity);

        let center = actor
            .bounding_sphere(&world)
            .map(|v| v.0)
            .unwrap_or_else(|| Point3::new(world.w.x, world.w.y, world.w.z));

        let (lod, actor_lod) = if self.params.evaluate_lod {
            (
                effect_ref.evaluate_lod(center, &self.camera),
                actor.evaluate_lod(center, &self.camera),
            )
        } else {
            (0, 0)
        };

        let renderable = match actor.lod(actor_lod) {
            Some(v) => v.clone(),
            None => return,
        };

        let passes = match effect_ref.get_lod(lod) {
            Some(v) => v,
            None => return,
        };

        // The first pass decides the blending group of all the passes, so a
        // sorter never separates the passes of one actor.
        let translucent = passes
            .first()
            .map(|v| v.borrow().is_translucent())
            .unwrap_or(false);

        let depth = -self.camera.view_matrix().transform_point(center).z;
        for (pass, shader) in passes.iter().enumerate() {
            queue.push(RenderToken {
                actor: shared_actor.clone(),
                renderable: renderable.clone(),
                effect: effect.clone(),
                shader: shader.clone(),
                lod,
                pass,
                block: actor.render_block(),
                effect_rank: effect_ref.render_rank(),
                actor_rank: actor.render_rank(),
                depth,
                translucent,
                world,
            });
        }
    }
}

impl RenderingAbstract for Rendering {
    fn render(&mut self, device: &mut Device, frame_clock: f64) -> Result<()> {
        dispatch(&mut self.callbacks, device, RenderEvent::Started)?;

        if self.params.auto_update_transforms {
            self.transforms.borrow_mut().update_world_matrices();
        }

        self.camera.update(&self.transforms.borrow());

        let mut queue = self.collect_queue();

        if self.params.shader_animation {
            for token in &queue {
                if token.shader.borrow().is_animated() {
                    token.shader.borrow_mut().update(&self.camera, frame_clock);
                }
            }
        }

        self.sorter.sort(&mut queue);
        trace!("Renders {} tokens.", queue.len());

        for renderer in &mut self.renderers {
            renderer.render(&queue, &self.camera, device, frame_clock)?;
        }

        dispatch(&mut self.callbacks, device, RenderEvent::Finished)
    }

    #[inline]
    fn enable_mask(&self) -> u32 {
        self.params.enable_mask
    }

    #[inline]
    fn set_enable_mask(&mut self, mask: u32) {
        self.params.enable_mask = mask;
    }

    fn written_textures(&self) -> Vec<Rc<Texture>> {
        let mut textures = Vec::new();
        for v in &self.renderers {
            textures.extend(v.written_textures());
        }

        for v in &self.callbacks {
            textures.extend(v.borrow().written_textures());
        }

        textures
    }

    fn sampled_textures(&self) -> Vec<Rc<Texture>> {
        let mut actors = Vec::new();
        for v in &self.scene_managers {
            v.borrow().extract_actors(&mut actors);
        }

        let mut textures: Vec<Rc<Texture>> = Vec::new();
        for actor in actors {
            let actor = actor.borrow();
            let effect = match actor.effect() {
                Some(v) => v.borrow(),
                None => continue,
            };

            for passes in effect.lods() {
                for shader in passes {
                    let shader = shader.borrow();
                    let states = match shader.render_states() {
                        Some(v) => v,
                        None => continue,
                    };

                    for (_, state) in states.iter() {
                        if let RenderState::TextureSampler(ref v) = *state {
                            if let Some(ref texture) = v.borrow().texture {
                                if !textures.iter().any(|t| Rc::ptr_eq(t, texture)) {
                                    textures.push(texture.clone());
                                }
                            }
                        }
                    }
                }
            }
        }

        textures
    }
}

/// Executes sub-renderings in strict list order.
pub struct RenderingTree {
    renderings: Vec<Shared<dyn RenderingAbstract>>,
    enable_mask: u32,
    callbacks: Vec<Shared<dyn RenderEventCallback>>,
}

impl Default for RenderingTree {
    fn default() -> Self {
        RenderingTree {
            renderings: Vec::new(),
            enable_mask: 0xFFFF_FFFF,
            callbacks: Vec::new(),
        }
    }
}

impl RenderingTree {
    pub fn new() -> Self {
        RenderingTree::default()
    }

    pub fn push(&mut self, rendering: Shared<dyn RenderingAbstract>) {
        self.renderings.push(rendering);
    }

    pub fn insert(&mut self, index: usize, rendering: Shared<dyn RenderingAbstract>) {
        self.renderings.insert(index, rendering);
    }

    pub fn remove(&mut self, rendering: &Shared<dyn RenderingAbstract>) -> bool {
        let address = utils::address(rendering);
        let len = self.renderings.len();
        self.renderings.retain(|v| utils::address(v) != address);
        self.renderings.len() != len
    }

    #[inline]
    pub fn renderings(&self) -> &[Shared<dyn RenderingAbstract>] {
        &self.renderings
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.renderings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.renderings.is_empty()
    }

    pub fn add_callback(&mut self, callback: Shared<dyn RenderEventCallback>) {
        self.callbacks.push(callback);
    }

    pub fn remove_callback(&mut self, callback: &Shared<dyn RenderEventCallback>) -> bool {
        remove_callback(&mut self.callbacks, callback)
    }

    /// Fails if a sub-rendering samples a texture that is only produced by a
    /// sub-rendering after it.
    pub fn check_dependencies(&self) -> Result<()> {
        let written: Vec<_> = self
            .renderings
            .iter()
            .map(|v| v.borrow().written_textures())
            .collect();

        for (i, v) in self.renderings.iter().enumerate() {
            for texture in v.borrow().sampled_textures() {
                for (j, textures) in written.iter().enumerate().skip(i + 1) {
                    if textures.iter().any(|t| Rc::ptr_eq(t, &texture)) {
                        warn!(
                            "Rendering {} samples texture {:?} before rendering {} produces it.",
                            i,
                            texture.handle(),
                            j
                        );

                        return Err(Error::RenderingOrder(i, j));
                    }
                }
            }
        }

        Ok(())
    }
}

impl RenderingAbstract for RenderingTree {
    fn render(&mut self, device: &mut Device, frame_clock: f64) -> Result<()> {
        dispatch(&mut self.callbacks, device, RenderEvent::Started)?;

        for v in &self.renderings {
            let mut rendering = v.borrow_mut();
            if (rendering.enable_mask() & self.enable_mask) != 0 {
                rendering.render(device, frame_clock)?;
            }
        }

        dispatch(&mut self.callbacks, device, RenderEvent::Finished)
    }

    #[inline]
    fn enable_mask(&self) -> u32 {
        self.enable_mask
    }

    #[inline]
    fn set_enable_mask(&mut self, mask: u32) {
        self.enable_mask = mask;
    }

    fn written_textures(&self) -> Vec<Rc<Texture>> {
        let mut textures = Vec::new();
        for v in &self.renderings {
            textures.extend(v.borrow().written_textures());
        }

        textures
    }

    fn sampled_textures(&self) -> Vec<Rc<Texture>> {
        let mut textures = Vec::new();
        for v in &self.renderings {
            textures.extend(v.borrow().sampled_textures());
        }

        textures
    }
}
