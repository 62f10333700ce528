use super::handle::HandleLike;
use super::handle_pool::{HandlePool, Iter};

/// An arena of `T` addressed by versioned handles. Freed slots are reused,
/// and handles to them stop resolving.
pub struct ObjectPool<H: HandleLike, T: Sized> {
    handles: HandlePool<H>,
    entries: Vec<Option<T>>,
}

impl<H: HandleLike, T: Sized> Default for ObjectPool<H, T> {
    fn default() -> Self {
        ObjectPool::new()
    }
}

impl<H: HandleLike, T: Sized> ObjectPool<H, T> {
    pub fn new() -> Self {
        ObjectPool {
            handles: HandlePool::new(),
            entries: Vec::new(),
        }
    }

    /// Moves `value` into the arena.
    pub fn create(&mut self, value: T) -> H {
        let handle = self.handles.create();
        let index = handle.index() as usize;

        if index == self.entries.len() {
            self.entries.push(Some(value));
        } else {
            self.entries[index] = Some(value);
        }

        handle
    }

    #[inline]
    pub fn get(&self, handle: H) -> Option<&T> {
        if !self.handles.contains(handle) {
            return None;
        }

        self.entries.get(handle.index() as usize)?.as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        if !self.handles.contains(handle) {
            return None;
        }

        self.entries.get_mut(handle.index() as usize)?.as_mut()
    }

    #[inline]
    pub fn contains(&self, handle: H) -> bool {
        self.handles.contains(handle)
    }

    /// Removes the value and returns it, or `None` for a stale handle.
    pub fn free(&mut self, handle: H) -> Option<T> {
        if !self.handles.free(handle) {
            return None;
        }

        self.entries.get_mut(handle.index() as usize)?.take()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Iterates the live handles in index order.
    #[inline]
    pub fn iter(&self) -> Iter<H> {
        self.handles.iter()
    }
}

#[cfg(test)]
mod test {
    use super::super::Handle;
    use super::*;

    #[test]
    fn stale_handles() {
        let mut pool = ObjectPool::<Handle, String>::new();
        let a = pool.create("depth".to_owned());
        pool.get_mut(a).unwrap().push_str("_only");

        assert_eq!(pool.free(a).as_ref().map(|v| &v[..]), Some("depth_only"));
        assert!(pool.get(a).is_none());
        assert!(pool.free(a).is_none());

        let b = pool.create("color".to_owned());
        assert_eq!(b.index(), a.index());
        assert!(pool.get(a).is_none());
        assert_eq!(pool.get(b).map(|v| &v[..]), Some("color"));
    }

    #[test]
    fn iter() {
        let mut pool = ObjectPool::<Handle, u32>::new();
        let handles: Vec<_> = (0..3).map(|v| pool.create(v)).collect();
        pool.free(handles[0]);

        assert_eq!(pool.iter().collect::<Vec<_>>(), &handles[1..]);
        assert_eq!(pool.len(), 2);
    }
}
