//! Bookkeeping of GPU objects owned by CPU side objects.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::utils::Handle;

/// A GPU object created through the `Visitor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuObject {
    Texture(Handle),
    Renderbuffer(Handle),
    Framebuffer(Handle),
    Program(Handle),
}

impl GpuObject {
    #[inline]
    pub fn handle(self) -> Handle {
        match self {
            GpuObject::Texture(v)
            | GpuObject::Renderbuffer(v)
            | GpuObject::Framebuffer(v)
            | GpuObject::Program(v) => v,
        }
    }
}

/// Objects waiting to be deleted on the next `Device::begin_frame`.
pub type ReleaseQueue = Rc<RefCell<Vec<GpuObject>>>;

/// The GPU counterpart of a texture, renderbuffer, framebuffer or program.
/// It remembers the revision of its owner it was created for, so the device
/// could tell when the object must be recreated. Dropping the slot queues the
/// object for deletion on the device that created it.
#[derive(Debug, Default)]
pub struct GpuSlot {
    object: Cell<Option<GpuObject>>,
    revision: Cell<u32>,
    failed: Cell<bool>,
    queue: RefCell<Weak<RefCell<Vec<GpuObject>>>>,
}

impl GpuSlot {
    #[inline]
    pub fn object(&self) -> Option<GpuObject> {
        self.object.get()
    }

    #[inline]
    pub fn handle(&self) -> Option<Handle> {
        self.object.get().map(GpuObject::handle)
    }

    /// Returns true if the object exists and matches `revision`.
    #[inline]
    pub fn is_current(&self, revision: u32) -> bool {
        self.object.get().is_some() && self.revision.get() == revision
    }

    /// Returns true if creating the object failed for `revision`.
    #[inline]
    pub fn is_failed(&self, revision: u32) -> bool {
        self.failed.get() && self.revision.get() == revision
    }

    pub(crate) fn set(&self, object: GpuObject, revision: u32, queue: &ReleaseQueue) {
        self.object.set(Some(object));
        self.revision.set(revision);
        self.failed.set(false);
        *self.queue.borrow_mut() = Rc::downgrade(queue);
    }

    pub(crate) fn set_failed(&self, revision: u32) {
        self.object.set(None);
        self.revision.set(revision);
        self.failed.set(true);
    }

    /// Detaches the object from this slot without deleting it.
    pub(crate) fn take(&self) -> Option<GpuObject> {
        self.object.replace(None)
    }
}

impl Drop for GpuSlot {
    fn drop(&mut self) {
        if let Some(object) = self.object.get() {
            if let Some(queue) = self.queue.borrow().upgrade() {
                queue.borrow_mut().push(object);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn release_on_drop() {
        let queue: ReleaseQueue = Rc::new(RefCell::new(Vec::new()));

        let slot = GpuSlot::default();
        assert!(!slot.is_current(0));

        slot.set(GpuObject::Texture(Handle::new(1, 1)), 3, &queue);
        assert!(slot.is_current(3));
        assert!(!slot.is_current(4));

        drop(slot);
        assert_eq!(*queue.borrow(), vec![GpuObject::Texture(Handle::new(1, 1))]);
    }

    #[test]
    fn failed() {
        let slot = GpuSlot::default();
        slot.set_failed(2);
        assert!(slot.is_failed(2));
        assert!(!slot.is_failed(3));
        assert_eq!(slot.handle(), None);
    }
}
