//! Scene managers own actors and hand the visible ones over to a `Rendering`.

use crate::actor::Actor;
use crate::camera::Camera;
use crate::math::prelude::*;
use crate::transform::TransformTree;
use crate::utils::{self, Shared};

pub trait SceneManager {
    /// Appends every actor of the scene to `out`.
    fn extract_actors(&self, out: &mut Vec<Shared<Actor>>);

    /// Appends the actors visible by `camera` to `out`. Actors without bounds
    /// are always considered visible.
    fn extract_visible_actors(
        &self,
        out: &mut Vec<Shared<Actor>>,
        camera: &Camera,
        transforms: &TransformTree,
    ) {
        if !self.culling_enabled() {
            self.extract_actors(out);
            return;
        }

        let frustum = camera.frustum();
        let mut actors = Vec::new();
        self.extract_actors(&mut actors);

        for actor in actors {
            let visible = {
                let v = actor.borrow();
                let world = v
                    .transform()
                    .and_then(|h| transforms.world_matrix(h))
                    .unwrap_or_else(Matrix4::identity);

                v.bounding_sphere(&world)
                    .map(|(center, radius)| frustum.contains_sphere(center, radius))
                    .unwrap_or(true)
            };

            if visible {
                out.push(actor);
            }
        }
    }

    /// Renderings skip scene managers that share no bit with their mask.
    fn enable_mask(&self) -> u32 {
        0xFFFF_FFFF
    }

    fn culling_enabled(&self) -> bool {
        true
    }
}

/// The simplest scene manager: a flat list of actors.
#[derive(Debug)]
pub struct ActorCollection {
    actors: Vec<Shared<Actor>>,
    enable_mask: u32,
    culling: bool,
}

impl Default for ActorCollection {
    fn default() -> Self {
        ActorCollection {
            actors: Vec::new(),
            enable_mask: 0xFFFF_FFFF,
            culling: true,
        }
    }
}

impl ActorCollection {
    pub fn new() -> Self {
        ActorCollection::default()
    }

    pub fn push(&mut self, actor: Shared<Actor>) {
        self.actors.push(actor);
    }

    /// Removes an actor by identity.
    pub fn remove(&mut self, actor: &Shared<Actor>) -> bool {
        let address = utils::address(actor);
        let len = self.actors.len();
        self.actors.retain(|v| utils::address(v) != address);
        self.actors.len() != len
    }

    pub fn clear(&mut self) {
        self.actors.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Shared<Actor>> {
        self.actors.iter()
    }

    #[inline]
    pub fn set_enable_mask(&mut self, mask: u32) {
        self.enable_mask = mask;
    }

    #[inline]
    pub fn set_culling_enabled(&mut self, culling: bool) {
        self.culling = culling;
    }
}

impl SceneManager for ActorCollection {
    fn extract_actors(&self, out: &mut Vec<Shared<Actor>>) {
        out.extend(self.actors.iter().cloned());
    }

    fn enable_mask(&self) -> u32 {
        self.enable_mask
    }

    fn culling_enabled(&self) -> bool {
        self.culling
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::actor::DrawArrays;
    use crate::backends::Primitive;
    use crate::utils::shared;
    use std::rc::Rc;

    fn sphere(x: f32) -> Shared<Actor> {
        let renderable =
            DrawArrays::new(Primitive::Points, 0, 1).with_bounds(Point3::new(x, 0.0, -10.0), 1.0);
        shared(Actor::new(Some(Rc::new(renderable)), None, None))
    }

    #[test]
    fn culling() {
        let mut scene = ActorCollection::new();
        let visible = sphere(0.0);
        scene.push(visible.clone());
        scene.push(sphere(1000.0));
        scene.push(shared(Actor::new(None, None, None)));

        let camera = Camera::new();
        let transforms = TransformTree::new();

        let mut out = Vec::new();
        scene.extract_visible_actors(&mut out, &camera, &transforms);
        assert_eq!(out.len(), 2);
        assert!(Rc::ptr_eq(&out[0], &visible));

        scene.set_culling_enabled(false);
        out.clear();
        scene.extract_visible_actors(&mut out, &camera, &transforms);
        assert_eq!(out.len(), 3);

        assert!(scene.remove(&visible));
        assert_eq!(scene.len(), 2);
    }
}
