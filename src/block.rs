//raw pointer heavy, keep every unsafe step explicit

use crate::error::BlockFault;
use crate::heap::Heap;
use core::alloc::Layout;
use core::marker::PhantomData;
use core::mem;
use core::ptr;
use core::ptr::NonNull;
use core::slice;

/*──────────────────── block type ───────────────────────*/
/// One heap block sized for `capacity` values of `T`, of which the first `len` are live.
///
/// This is the only place in the crate that touches raw memory: acquiring a block,
/// writing values into the spare tail, running destructors and handing the block back.
/// [`GrowableBuffer`](crate::GrowableBuffer) expresses all of its growth logic in terms of these.
///
/// # Layout:
///
/// ```text
///   [ x x x x x ...uninit... ]
///     ▲         ▲            ▲
///     │         └─ len       └─ capacity
///     └──────── base
/// ```
///
/// When `capacity == 0` there is no block at all and `base` is `None`.
/// Zero sized `T` never reach the heap, the base is a dangling pointer instead.
pub struct OwnedBlock<T> {
    base: Option<NonNull<T>>,
    len: usize,
    capacity: usize,
    _ph: PhantomData<T>,
}

unsafe impl<T: Send> Send for OwnedBlock<T> {}
unsafe impl<T: Sync> Sync for OwnedBlock<T> {}

/*──────────────────── acquire / release ───────────────────────*/
impl<T> OwnedBlock<T> {
    /// A block that owns nothing.
    #[inline]
    pub const fn empty() -> Self {
        Self {
            base: None,
            len: 0,
            capacity: 0,
            _ph: PhantomData,
        }
    }

    #[inline]
    fn layout(capacity: usize) -> Result<Layout, BlockFault> {
        Layout::array::<T>(capacity).map_err(|_| BlockFault::Alloc {
            bytes: capacity.saturating_mul(size_of::<T>()),
        })
    }

    /// Gets a fresh block with room for `capacity` values and no live ones.
    ///
    /// A capacity of zero acquires nothing.
    pub fn acquire(capacity: usize) -> Result<Self, BlockFault> {
        if capacity == 0 {
            return Ok(Self::empty());
        }
        let layout = Self::layout(capacity)?;
        let base = if layout.size() == 0 {
            NonNull::dangling()
        } else {
            Heap.allocate(layout)
                .ok_or(BlockFault::Alloc {
                    bytes: layout.size(),
                })?
                .cast()
        };
        log::trace!("block: acquired {capacity} slots at {base:?}");
        Ok(Self {
            base: Some(base),
            len: 0,
            capacity,
            _ph: PhantomData,
        })
    }

    /// Destroys every live value (last constructed first) and returns the block to the heap.
    ///
    /// The block is left empty even when the heap rejects it, the memory is leaked then.
    pub fn release(&mut self) -> Result<(), BlockFault> {
        self.flush(self.len);
        let Some(base) = self.base.take() else {
            return Ok(());
        };
        let capacity = mem::replace(&mut self.capacity, 0);
        log::trace!("block: releasing {capacity} slots at {base:?}");

        let layout = Self::layout(capacity).map_err(|_| BlockFault::Dealloc)?;
        if layout.size() == 0 {
            return Ok(());
        }
        unsafe { Heap.free(base.cast(), layout) }.map_err(|_| BlockFault::Dealloc)
    }
}

/*──────────────────── invariants & meta ──────────────────────*/
impl<T> OwnedBlock<T> {
    /// Returns the number of live values.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no value is live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of slots past the insertion point.
    #[inline]
    pub fn room_left(&self) -> usize {
        self.capacity - self.len
    }

    /// Returns the block's base, null when nothing is owned.
    #[inline(always)]
    pub fn get_base(&self) -> *mut T {
        self.base.map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        let base = self.base.unwrap_or(NonNull::dangling());
        unsafe { slice::from_raw_parts(base.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        let base = self.base.unwrap_or(NonNull::dangling());
        unsafe { slice::from_raw_parts_mut(base.as_ptr(), self.len) }
    }

    #[inline]
    fn spare_slot(&self) -> Option<*mut T> {
        if self.len == self.capacity {
            return None;
        }
        self.base.map(|b| unsafe { b.as_ptr().add(self.len) })
    }
}

/*──────────────────── construct / destroy ───────────────────────*/
impl<T> OwnedBlock<T> {
    /// Moves `v` into the slot at the insertion point.
    ///
    /// Returns `Err(v)` if the block is full.
    #[inline]
    pub fn construct_back(&mut self, v: T) -> Result<&mut T, T> {
        let Some(slot) = self.spare_slot() else {
            return Err(v);
        };
        unsafe {
            slot.write(v);
            self.len += 1;
            Ok(&mut *slot)
        }
    }

    /// Builds a value straight into the slot at the insertion point.
    ///
    /// `make` is only called when there is room, otherwise it is handed back.
    #[inline]
    pub fn construct_with<F>(&mut self, make: F) -> Result<&mut T, F>
    where
        F: FnOnce() -> T,
    {
        let Some(slot) = self.spare_slot() else {
            return Err(make);
        };
        unsafe {
            slot.write(make());
            self.len += 1;
            Ok(&mut *slot)
        }
    }

    /// Runs the destructor of the last live value.
    ///
    /// Returns `None` if there was nothing to destroy.
    #[inline]
    pub fn destroy_back(&mut self) -> Option<()> {
        if self.len == 0 {
            return None;
        }
        // shrink first so a panicking destructor leaks instead of double dropping
        self.len -= 1;
        unsafe { ptr::drop_in_place(self.get_base().add(self.len)) };
        Some(())
    }

    /// Destroys the last `len` values, newest first.
    pub fn flush(&mut self, len: usize) -> Option<()> {
        if self.len < len {
            return None;
        }
        for _ in 0..len {
            self.destroy_back();
        }
        Some(())
    }

    /// Moves every live value, in order, to the insertion point of `dst`.
    ///
    /// The values are moved bitwise so no destructor runs and `self` is left with no live values.
    /// Returns `None` and moves nothing if `dst` does not have the room.
    pub fn relocate_into(&mut self, dst: &mut OwnedBlock<T>) -> Option<()> {
        if dst.room_left() < self.len {
            return None;
        }
        if self.len == 0 {
            return Some(());
        }
        unsafe {
            ptr::copy_nonoverlapping(self.get_base(), dst.get_base().add(dst.len), self.len);
        }
        log::trace!(
            "block: relocated {} values from {:?} to {:?}",
            self.len,
            self.base,
            dst.base
        );
        dst.len += self.len;
        self.len = 0;
        Some(())
    }
}

impl<T> Default for OwnedBlock<T> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
impl<T> OwnedBlock<T> {
    /// Wraps a block that did not come from [`OwnedBlock::acquire`].
    ///
    /// # Safety
    /// the first `len` slots behind `base` must hold live values and `len <= capacity`.
    /// if `base` is a real heap block it must have been allocated for `capacity` values.
    pub(crate) unsafe fn from_raw_parts(base: NonNull<T>, len: usize, capacity: usize) -> Self {
        Self {
            base: Some(base),
            len,
            capacity,
            _ph: PhantomData,
        }
    }
}

/*────────── Drop ──────────*/

impl<T> Drop for OwnedBlock<T> {
    fn drop(&mut self) {
        let capacity = self.capacity;
        if let Err(fault) = self.release() {
            log::error!(
                "block of {capacity} slots could not be released: {}",
                fault.at("drop")
            );
            std::process::abort();
        }
    }
}

/*──────────────────── tests ───────────────────────────*/
