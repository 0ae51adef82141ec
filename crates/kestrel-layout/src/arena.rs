//! Generation-indexed slab storage for render objects and inline boxes.
//!
//! Every render object and every inline box lives in an [`Arena`] owned by the
//! render tree. Links between them are [`Handle`]s: an index plus the
//! generation the slot had when the value was allocated. Freeing a slot bumps
//! its generation, so a handle kept past the lifetime of its value resolves to
//! `None` instead of aliasing whatever was allocated in the slot afterwards.
//!
//! [`Arena::reset`] drops every value at once and invalidates all
//! outstanding handles, which is how a whole document's render tree is torn
//! down.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// A typed, generation-checked reference into an [`Arena`].
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    const fn new(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    /// Slot index of this handle.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// Generation the slot had when this handle was issued.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slab allocator addressed by [`Handle`].
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
    /// Generation given to slots created after the last reset.
    epoch: u32,
}

impl<T> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("len", &self.len)
            .field("capacity", &self.slots.len())
            .field("epoch", &self.epoch)
            .finish()
    }
}

impl<T> Arena<T> {
    /// Create an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
            epoch: 0,
        }
    }

    /// Store `value` and return its handle.
    pub fn alloc(&mut self, value: T) -> Handle<T> {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return Handle::new(index, slot.generation);
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: self.epoch,
            value: Some(value),
        });
        Handle::new(index, self.epoch)
    }

    /// Remove the value behind `handle`, returning it if the handle was live.
    pub fn free(&mut self, handle: Handle<T>) -> Option<T> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        Some(value)
    }

    /// Borrow the value behind `handle`, if it is still live.
    #[must_use]
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        let slot = self.slots.get(handle.index())?;
        if slot.generation == handle.generation {
            slot.value.as_ref()
        } else {
            None
        }
    }

    /// Mutably borrow the value behind `handle`, if it is still live.
    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation == handle.generation {
            slot.value.as_mut()
        } else {
            None
        }
    }

    /// Whether `handle` still refers to a live value.
    #[must_use]
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.get(handle).is_some()
    }

    /// Number of live values.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the arena holds no live values.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate over live values with their handles, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            let index = u32::try_from(i).ok()?;
            slot.value
                .as_ref()
                .map(|v| (Handle::new(index, slot.generation), v))
        })
    }

    /// Drop every value in O(1) amortized time and invalidate all handles.
    ///
    /// Handles issued before the reset never match a slot again, even once
    /// the slot is reused.
    pub fn reset(&mut self) {
        let highest = self
            .slots
            .iter()
            .map(|s| s.generation)
            .max()
            .unwrap_or(self.epoch);
        self.epoch = highest.max(self.epoch).wrapping_add(1);
        self.slots.clear();
        self.free.clear();
        self.len = 0;
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<Handle<T>> for Arena<T> {
    type Output = T;

    /// Panics on a stale handle, like out-of-bounds `Vec` indexing.
    fn index(&self, handle: Handle<T>) -> &T {
        match self.get(handle) {
            Some(value) => value,
            None => panic!("stale arena handle {handle:?}"),
        }
    }
}

impl<T> IndexMut<Handle<T>> for Arena<T> {
    fn index_mut(&mut self, handle: Handle<T>) -> &mut T {
        match self.get_mut(handle) {
            Some(value) => value,
            None => panic!("stale arena handle {handle:?}"),
        }
    }
}
