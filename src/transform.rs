//! A hierarchy of transformations stored in an arena. Children refer to their
//! parent by handle and never own it.
//!
//! World matrices are cached. Changing a local matrix or a parent only marks
//! the node dirty, the cache is refreshed by `update_world_matrices`.

use crate::errors::*;
use crate::math::prelude::*;
use crate::utils::ObjectPool;

impl_handle!(TransformHandle);

#[derive(Debug, Clone)]
struct Node {
    local: Matrix4<f32>,
    world: Matrix4<f32>,
    parent: Option<TransformHandle>,
    children: Vec<TransformHandle>,
    dirty: bool,
}

#[derive(Default)]
pub struct TransformTree {
    nodes: ObjectPool<TransformHandle, Node>,
}

impl TransformTree {
    pub fn new() -> Self {
        TransformTree::default()
    }

    /// Creates a root transform with `local` as its local matrix.
    pub fn create(&mut self, local: Matrix4<f32>) -> TransformHandle {
        self.nodes.create(Node {
            local,
            world: local,
            parent: None,
            children: Vec::new(),
            dirty: true,
        })
    }

    /// Creates a transform under `parent`.
    pub fn create_child(
        &mut self,
        parent: TransformHandle,
        local: Matrix4<f32>,
    ) -> Result<TransformHandle> {
        if !self.nodes.contains(parent) {
            return Err(Error::HandleInvalid(format!("{}", parent)));
        }

        let handle = self.create(local);
        self.set_parent(handle, Some(parent))?;
        Ok(handle)
    }

    #[inline]
    pub fn contains(&self, handle: TransformHandle) -> bool {
        self.nodes.contains(handle)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Removes a transform, its children become roots.
    pub fn remove(&mut self, handle: TransformHandle) -> Result<()> {
        let node = self.node(handle)?.clone();

        if let Some(parent) = node.parent {
            if let Some(v) = self.nodes.get_mut(parent) {
                v.children.retain(|&c| c != handle);
            }
        }

        for child in node.children {
            if let Some(v) = self.nodes.get_mut(child) {
                v.parent = None;
                v.dirty = true;
            }
        }

        self.nodes.free(handle);
        Ok(())
    }

    /// Moves `child` under `parent`, or makes it a root with `None`.
    pub fn set_parent(
        &mut self,
        child: TransformHandle,
        parent: Option<TransformHandle>,
    ) -> Result<()> {
        self.node(child)?;

        if let Some(parent) = parent {
            self.node(parent)?;

            let mut cursor = Some(parent);
            while let Some(v) = cursor {
                if v == child {
                    return Err(Error::TransformCycle(format!("{}", child)));
                }

                cursor = self.nodes.get(v).and_then(|n| n.parent);
            }
        }

        let old = self.node(child)?.parent;
        if let Some(old) = old {
            if let Some(v) = self.nodes.get_mut(old) {
                v.children.retain(|&c| c != child);
            }
        }

        if let Some(parent) = parent {
            if let Some(v) = self.nodes.get_mut(parent) {
                v.children.push(child);
            }
        }

        let node = self.node_mut(child)?;
        node.parent = parent;
        node.dirty = true;
        Ok(())
    }

    #[inline]
    pub fn parent(&self, handle: TransformHandle) -> Option<TransformHandle> {
        self.nodes.get(handle).and_then(|v| v.parent)
    }

    pub fn children(&self, handle: TransformHandle) -> &[TransformHandle] {
        self.nodes
            .get(handle)
            .map(|v| &v.children[..])
            .unwrap_or(&[])
    }

    #[inline]
    pub fn local(&self, handle: TransformHandle) -> Option<Matrix4<f32>> {
        self.nodes.get(handle).map(|v| v.local)
    }

    pub fn set_local(&mut self, handle: TransformHandle, local: Matrix4<f32>) -> Result<()> {
        let node = self.node_mut(handle)?;
        node.local = local;
        node.dirty = true;
        Ok(())
    }

    /// Post-multiplies the local matrix with a translation.
    pub fn translate(&mut self, handle: TransformHandle, disp: Vector3<f32>) -> Result<()> {
        let node = self.node_mut(handle)?;
        node.local = node.local * Matrix4::from_translation(disp);
        node.dirty = true;
        Ok(())
    }

    /// The cached world matrix, which is stale if the transform is dirty.
    #[inline]
    pub fn world_matrix(&self, handle: TransformHandle) -> Option<Matrix4<f32>> {
        self.nodes.get(handle).map(|v| v.world)
    }

    /// Composes the world matrix from the local matrices of all the ancestors,
    /// without touching the cache.
    pub fn compute_world_matrix(&self, handle: TransformHandle) -> Option<Matrix4<f32>> {
        let mut node = self.nodes.get(handle)?;
        let mut world = node.local;

        while let Some(parent) = node.parent {
            node = self.nodes.get(parent)?;
            world = node.local * world;
        }

        Some(world)
    }

    /// Returns true if the cached world matrix of `handle`, or of one of its
    /// ancestors, needs to be recomputed.
    pub fn is_dirty(&self, handle: TransformHandle) -> bool {
        let mut cursor = Some(handle);
        while let Some(v) = cursor {
            match self.nodes.get(v) {
                Some(node) if node.dirty => return true,
                Some(node) => cursor = node.parent,
                None => return false,
            }
        }

        false
    }

    /// Recomputes the cached world matrices of all the dirty transforms and
    /// their descendants.
    pub fn update_world_matrices(&mut self) {
        let roots: Vec<_> = self
            .nodes
            .iter()
            .filter(|&h| self.nodes.get(h).map(|v| v.parent.is_none()).unwrap_or(false))
            .collect();

        let mut stack: Vec<(TransformHandle, Matrix4<f32>, bool)> = roots
            .into_iter()
            .map(|h| (h, Matrix4::identity(), false))
            .collect();

        while let Some((handle, parent_world, parent_dirty)) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(handle) {
                let dirty = parent_dirty || node.dirty;
                if dirty {
                    node.world = parent_world * node.local;
                    node.dirty = false;
                }

                let world = node.world;
                for &child in &node.children {
                    stack.push((child, world, dirty));
                }
            }
        }
    }

    fn node(&self, handle: TransformHandle) -> Result<&Node> {
        self.nodes
            .get(handle)
            .ok_or_else(|| Error::HandleInvalid(format!("{}", handle)))
    }

    fn node_mut(&mut self, handle: TransformHandle) -> Result<&mut Node> {
        self.nodes
            .get_mut(handle)
            .ok_or_else(|| Error::HandleInvalid(format!("{}", handle)))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cycles() {
        let mut tree = TransformTree::new();
        let a = tree.create(Matrix4::identity());
        let b = tree.create_child(a, Matrix4::identity()).unwrap();
        let c = tree.create_child(b, Matrix4::identity()).unwrap();

        assert!(tree.set_parent(a, Some(c)).is_err());
        assert!(tree.set_parent(a, Some(a)).is_err());
        assert_eq!(tree.parent(c), Some(b));

        tree.set_parent(c, Some(a)).unwrap();
        assert_eq!(tree.children(a), &[b, c]);
        assert!(tree.children(b).is_empty());
    }

    #[test]
    fn remove() {
        let mut tree = TransformTree::new();
        let a = tree.create(Matrix4::identity());
        let b = tree.create_child(a, Matrix4::identity()).unwrap();

        tree.remove(a).unwrap();
        assert!(!tree.contains(a));
        assert_eq!(tree.parent(b), None);
        assert!(tree.remove(a).is_err());
    }
}
