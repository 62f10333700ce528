//! Commonly used utilities like handles, pools and hashes.

#[macro_use]
pub mod handle;
pub mod handle_pool;
pub mod hash;
pub mod hash_value;
pub mod object_pool;

pub use self::handle::{Handle, HandleIndex, HandleLike};
pub use self::handle_pool::HandlePool;
pub use self::hash::{hash64, FastHashMap, FastHashSet};
pub use self::hash_value::HashValue;
pub use self::object_pool::ObjectPool;

use std::cell::RefCell;
use std::rc::Rc;

/// Reference counted, interior mutable object. Render states, shaders, effects and
/// actors are shared between their owners with this.
pub type Shared<T> = Rc<RefCell<T>>;

/// Wraps `v` into a `Shared<T>`.
#[inline]
pub fn shared<T>(v: T) -> Shared<T> {
    Rc::new(RefCell::new(v))
}

/// Address of the shared object, used to identify instances without comparing
/// their content.
#[inline]
pub fn address<T: ?Sized>(v: &Rc<T>) -> usize {
    Rc::as_ptr(v) as *const () as usize
}

