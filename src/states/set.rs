use smallvec::SmallVec;

use super::{RenderState, RenderStateSlot};

/// An ordered collection of render states, at most one per `RenderStateSlot`.
/// Entries are kept sorted by slot so lookups are binary searches and
/// iteration visits slots in a stable order.
#[derive(Debug, Default, Clone)]
pub struct RenderStateSet {
    states: SmallVec<[(RenderStateSlot, RenderState); 8]>,
}

impl RenderStateSet {
    pub fn new() -> Self {
        RenderStateSet::default()
    }

    #[inline]
    fn position(&self, slot: RenderStateSlot) -> ::std::result::Result<usize, usize> {
        self.states.binary_search_by(|v| v.0.cmp(&slot))
    }

    pub fn get(&self, slot: RenderStateSlot) -> Option<&RenderState> {
        self.position(slot).ok().map(|i| &self.states[i].1)
    }

    /// Stores `state` at `slot`, returns the state it replaced.
    pub fn set(&mut self, slot: RenderStateSlot, state: RenderState) -> Option<RenderState> {
        debug_assert!(slot.kind() == state.kind());

        match self.position(slot) {
            Ok(i) => Some(::std::mem::replace(&mut self.states[i].1, state)),
            Err(i) => {
                self.states.insert(i, (slot, state));
                None
            }
        }
    }

    pub fn erase(&mut self, slot: RenderStateSlot) -> Option<RenderState> {
        match self.position(slot) {
            Ok(i) => Some(self.states.remove(i).1),
            Err(_) => None,
        }
    }

    #[inline]
    pub fn contains(&self, slot: RenderStateSlot) -> bool {
        self.position(slot).is_ok()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.states.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RenderStateSlot, &RenderState)> {
        self.states.iter().map(|(k, v)| (*k, v))
    }
}
