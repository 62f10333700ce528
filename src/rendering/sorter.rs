//! Render queue sorters. All of them rely on `slice::sort_by` being stable, so
//! tokens with equal keys keep the order they were collected in. In particular
//! the passes of one actor are always visited in ascending order.

use std::cmp::Ordering;

use super::RenderToken;
use crate::settings::SorterKind;
use crate::utils;

pub trait RenderQueueSorter {
    fn sort(&self, queue: &mut [RenderToken]);
}

/// Creates the sorter selected by the rendering settings.
pub fn from_kind(kind: SorterKind, depth_sort: bool) -> Box<dyn RenderQueueSorter> {
    match kind {
        SorterKind::Basic => Box::new(RenderQueueSorterBasic),
        SorterKind::Standard => Box::new(RenderQueueSorterStandard { depth_sort }),
        SorterKind::ByShader => Box::new(RenderQueueSorterByShader),
        SorterKind::Occlusion => Box::new(RenderQueueSorterOcclusion),
    }
}

#[inline]
fn ranks(lhs: &RenderToken, rhs: &RenderToken) -> Ordering {
    lhs.block
        .cmp(&rhs.block)
        .then(lhs.effect_rank.cmp(&rhs.effect_rank))
        .then(lhs.actor_rank.cmp(&rhs.actor_rank))
}

#[inline]
fn depth(lhs: f32, rhs: f32) -> Ordering {
    lhs.partial_cmp(&rhs).unwrap_or(Ordering::Equal)
}

/// Sorts by render block and ranks only.
#[derive(Debug, Default, Clone, Copy)]
pub struct RenderQueueSorterBasic;

impl RenderQueueSorter for RenderQueueSorterBasic {
    fn sort(&self, queue: &mut [RenderToken]) {
        queue.sort_by(ranks);
    }
}

/// Sorts by ranks, then draws opaque tokens before translucent ones. Opaque
/// tokens are grouped by effect to save state changes, translucent ones are
/// optionally drawn back to front.
#[derive(Debug, Clone, Copy)]
pub struct RenderQueueSorterStandard {
    pub depth_sort: bool,
}

impl Default for RenderQueueSorterStandard {
    fn default() -> Self {
        RenderQueueSorterStandard { depth_sort: true }
    }
}

impl RenderQueueSorter for RenderQueueSorterStandard {
    fn sort(&self, queue: &mut [RenderToken]) {
        queue.sort_by(|lhs, rhs| {
            let ord = ranks(lhs, rhs).then(lhs.translucent.cmp(&rhs.translucent));
            if ord != Ordering::Equal {
                return ord;
            }

            if lhs.translucent {
                if self.depth_sort {
                    depth(rhs.depth, lhs.depth).then(lhs.pass.cmp(&rhs.pass))
                } else {
                    Ordering::Equal
                }
            } else {
                utils::address(&lhs.effect)
                    .cmp(&utils::address(&rhs.effect))
                    .then(lhs.pass.cmp(&rhs.pass))
            }
        });
    }
}

/// Sorts by ranks, then by pass and shader, which minimizes shader switches
/// regardless of translucency.
#[derive(Debug, Default, Clone, Copy)]
pub struct RenderQueueSorterByShader;

impl RenderQueueSorter for RenderQueueSorterByShader {
    fn sort(&self, queue: &mut [RenderToken]) {
        queue.sort_by(|lhs, rhs| {
            ranks(lhs, rhs)
                .then(lhs.pass.cmp(&rhs.pass))
                .then(utils::address(&lhs.shader).cmp(&utils::address(&rhs.shader)))
        });
    }
}

/// Draws opaque tokens front to back so that occluded fragments fail the
/// depth test early, then translucent tokens back to front.
#[derive(Debug, Default, Clone, Copy)]
pub struct RenderQueueSorterOcclusion;

impl RenderQueueSorter for RenderQueueSorterOcclusion {
    fn sort(&self, queue: &mut [RenderToken]) {
        queue.sort_by(|lhs, rhs| {
            let ord = ranks(lhs, rhs).then(lhs.translucent.cmp(&rhs.translucent));
            if ord != Ordering::Equal {
                return ord;
            }

            let ord = if lhs.translucent {
                depth(rhs.depth, lhs.depth)
            } else {
                depth(lhs.depth, rhs.depth)
            };

            ord.then(lhs.pass.cmp(&rhs.pass))
        });
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::actor::{Actor, DrawArrays};
    use crate::backends::Primitive;
    use crate::effect::Effect;
    use crate::math::prelude::*;
    use crate::shader::Shader;
    use crate::utils::shared;
    use std::rc::Rc;

    fn token(name: &str, pass: usize, depth: f32, translucent: bool) -> RenderToken {
        let mut actor = Actor::new(None, None, None);
        actor.set_name(name);

        RenderToken {
            actor: shared(actor),
            renderable: Rc::new(DrawArrays::new(Primitive::Triangles, 0, 3)),
            effect: shared(Effect::new()),
            shader: shared(Shader::new()),
            lod: 0,
            pass,
            block: 0,
            effect_rank: 0,
            actor_rank: 0,
            depth,
            translucent,
            world: Matrix4::identity(),
        }
    }

    fn names(queue: &[RenderToken]) -> Vec<String> {
        queue
            .iter()
            .map(|v| format!("{}{}", v.actor.borrow().name(), v.pass))
            .collect()
    }

    #[test]
    fn blocks() {
        let mut queue = vec![token("a", 0, 1.0, false), token("b", 0, 1.0, false)];
        queue[0].effect_rank = 1;
        queue[1].block = -1;
        queue[1].effect_rank = 2;

        RenderQueueSorterBasic.sort(&mut queue);
        assert_eq!(names(&queue), ["b0", "a0"]);
    }

    #[test]
    fn standard() {
        let mut queue = vec![
            token("near", 0, 1.0, true),
            token("far", 0, 10.0, true),
            token("solid", 0, 5.0, false),
        ];

        RenderQueueSorterStandard { depth_sort: true }.sort(&mut queue);
        assert_eq!(names(&queue), ["solid0", "far0", "near0"]);

        RenderQueueSorterOcclusion.sort(&mut queue);
        assert_eq!(names(&queue), ["solid0", "far0", "near0"]);
    }

    #[test]
    fn passes() {
        let first = token("a", 0, 3.0, false);
        let mut second = first.clone();
        second.pass = 1;
        second.shader = shared(Shader::new());
        let mut queue = vec![first, second];

        for sorter in &[
            from_kind(SorterKind::Basic, true),
            from_kind(SorterKind::Standard, true),
            from_kind(SorterKind::ByShader, true),
            from_kind(SorterKind::Occlusion, true),
        ] {
            sorter.sort(&mut queue);
            assert_eq!(names(&queue), ["a0", "a1"]);
        }
    }
}
