use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::marker::PhantomData;

use super::handle::{HandleIndex, HandleLike};

/// Allocates versioned handles with dense indices.
///
/// A slot is alive while its version is odd. Freeing bumps the version to an
/// even number, so copies of the freed handle never match the slot again.
pub struct HandlePool<H: HandleLike> {
    versions: Vec<HandleIndex>,
    vacants: BinaryHeap<Reverse<HandleIndex>>,
    _marker: PhantomData<H>,
}

impl<H: HandleLike> Default for HandlePool<H> {
    fn default() -> Self {
        HandlePool::new()
    }
}

impl<H: HandleLike> HandlePool<H> {
    pub fn new() -> Self {
        HandlePool {
            versions: Vec::new(),
            vacants: BinaryHeap::new(),
            _marker: PhantomData,
        }
    }

    /// Hands out a live handle, reusing the lowest vacant index if there is one.
    pub fn create(&mut self) -> H {
        match self.vacants.pop() {
            Some(Reverse(index)) => {
                let slot = &mut self.versions[index as usize];
                *slot += 1;
                H::new(index, *slot)
            }
            None => {
                let index = self.versions.len() as HandleIndex;
                self.versions.push(1);
                H::new(index, 1)
            }
        }
    }

    #[inline]
    pub fn contains(&self, handle: H) -> bool {
        match self.versions.get(handle.index() as usize) {
            Some(&v) => is_alive(v) && v == handle.version(),
            None => false,
        }
    }

    /// Returns false if `handle` is stale.
    pub fn free(&mut self, handle: H) -> bool {
        if !self.contains(handle) {
            return false;
        }

        self.versions[handle.index() as usize] += 1;
        self.vacants.push(Reverse(handle.index()));
        true
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.versions.len() - self.vacants.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live handles in index order.
    #[inline]
    pub fn iter(&self) -> Iter<H> {
        Iter {
            slots: self.versions.iter().enumerate(),
            _marker: PhantomData,
        }
    }
}

#[inline]
fn is_alive(version: HandleIndex) -> bool {
    version & 1 == 1
}

pub struct Iter<'a, H> {
    slots: ::std::iter::Enumerate<::std::slice::Iter<'a, HandleIndex>>,
    _marker: PhantomData<H>,
}

impl<'a, H: HandleLike> Iterator for Iter<'a, H> {
    type Item = H;

    fn next(&mut self) -> Option<H> {
        while let Some((i, &v)) = self.slots.next() {
            if is_alive(v) {
                return Some(H::new(i as HandleIndex, v));
            }
        }

        None
    }
}

#[cfg(test)]
mod test {
    use super::super::Handle;
    use super::*;

    #[test]
    fn recycle() {
        let mut pool: HandlePool<Handle> = HandlePool::new();
        let a = pool.create();
        assert!(a.is_valid());
        assert!(pool.contains(a));

        assert!(pool.free(a));
        assert!(!pool.free(a));
        assert!(!pool.contains(a));
        assert!(pool.is_empty());

        let b = pool.create();
        assert_eq!(b.index(), a.index());
        assert_eq!(b.version(), a.version() + 2);
        assert!(!pool.contains(a));
    }

    #[test]
    fn lowest_index_first() {
        let mut pool: HandlePool<Handle> = HandlePool::new();
        let handles: Vec<Handle> = (0..4).map(|_| pool.create()).collect();
        pool.free(handles[3]);
        pool.free(handles[1]);

        assert_eq!(pool.iter().collect::<Vec<_>>(), vec![handles[0], handles[2]]);
        assert_eq!(pool.create().index(), 1);
        assert_eq!(pool.create().index(), 3);
        assert_eq!(pool.len(), 4);
    }
}
